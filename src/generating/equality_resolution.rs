//! Equality resolution
//!
//! From `s != t | C` with `σ = mgu(s, t)` and the inequality selected,
//! derive `σ(C)`.

use super::{collect_literals_except, dedup_literals};
use crate::engine::Generator;
use crate::fol::{Clause, Context, Derivation, Rule, Substitution, QUERY};
use crate::index::IndexManager;
use crate::saturation::arena::ClauseArena;
use std::collections::HashMap;

pub struct EqualityResolution;

impl Generator for EqualityResolution {
    fn name(&self) -> &'static str {
        "EqualityResolution"
    }

    fn generate(
        &self,
        given: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        _indices: &IndexManager,
    ) -> Vec<Clause> {
        let clause = arena.get(given);
        let mut results = Vec::new();

        for &li in &clause.selected {
            let lit = &clause.literals[li];
            if lit.polarity || !lit.is_equality(&ctx.syms) {
                continue;
            }

            let mut subst = Substitution::new();
            if !subst.unify(&ctx.bank, lit.args[0], QUERY, lit.args[1], QUERY) {
                continue;
            }

            let mut renaming = HashMap::new();
            let literals = dedup_literals(collect_literals_except(
                &subst,
                ctx,
                clause,
                &[li],
                QUERY,
                &mut renaming,
            ));

            results.push(Clause::derived(
                literals,
                &ctx.bank,
                Derivation::new(Rule::EqualityResolution, vec![given]),
            ));
        }

        results
    }
}

//! Binary resolution
//!
//! From `L | C` (given) and `~L' | D` (Active) with `σ = mgu(L, L')`,
//! derive `σ(C | D)`. Partners are found by unification retrieval of the
//! complemented literal key on the `ActiveLiterals` index; both literals
//! must be selected in their clauses.

use super::{collect_literals_except, dedup_literals};
use crate::engine::Generator;
use crate::fol::{Clause, Colour, Context, Derivation, Rule, QUERY, RESULT};
use crate::index::{complement_key, IndexKind, IndexManager};
use crate::saturation::arena::ClauseArena;
use std::collections::HashMap;

pub struct BinaryResolution;

impl Generator for BinaryResolution {
    fn name(&self) -> &'static str {
        "BinaryResolution"
    }

    fn attach(&mut self, indices: &mut IndexManager) {
        indices.request(IndexKind::ActiveLiterals);
    }

    fn detach(&mut self, indices: &mut IndexManager) {
        indices.release(IndexKind::ActiveLiterals);
    }

    fn generate(
        &self,
        given: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Vec<Clause> {
        let Some(index) = indices.get(IndexKind::ActiveLiterals) else {
            return vec![];
        };
        let clause = arena.get(given);
        let mut results = Vec::new();

        for &li in &clause.selected {
            let lit = clause.literals[li].clone();
            let key = complement_key(ctx, &lit);

            let mut retrieval = index.unifications(&ctx.bank, key);
            while let Some((entry, subst)) = retrieval.next(&ctx.bank) {
                let partner = arena.get(entry.clause);
                if !partner.selected.contains(&entry.literal) {
                    continue;
                }
                if !Colour::compatible(clause.colour, partner.colour) {
                    continue;
                }

                let subst = subst.clone();
                let mut renaming = HashMap::new();
                let mut literals =
                    collect_literals_except(&subst, ctx, clause, &[li], QUERY, &mut renaming);
                literals.extend(collect_literals_except(
                    &subst,
                    ctx,
                    partner,
                    &[entry.literal],
                    RESULT,
                    &mut renaming,
                ));
                let literals = dedup_literals(literals);

                results.push(Clause::derived(
                    literals,
                    &ctx.bank,
                    Derivation::new(Rule::BinaryResolution, vec![given, entry.clause]),
                ));
            }
        }

        results
    }
}

//! Equality factoring
//!
//! From `l = r | l' = r' | C` with `σ = mgu(l, l')` and `l = r` selected,
//! derive `σ(l' = r' | r != r' | C)`, provided `σl` is not smaller than
//! `σr`.

use super::{collect_literals_except, dedup_literals, not_smaller};
use crate::engine::Generator;
use crate::fol::{Clause, Context, Derivation, Literal, Rule, Substitution, TermId, QUERY};
use crate::index::IndexManager;
use crate::saturation::arena::ClauseArena;
use std::collections::HashMap;

pub struct EqualityFactoring;

/// Usable sides of a positive equality literal: the greater side when
/// oriented, both otherwise.
fn equality_sides(lit: &Literal) -> Vec<(TermId, TermId)> {
    if lit.oriented {
        vec![(lit.args[0], lit.args[1])]
    } else {
        vec![
            (lit.args[0], lit.args[1]),
            (lit.args[1], lit.args[0]),
        ]
    }
}

impl Generator for EqualityFactoring {
    fn name(&self) -> &'static str {
        "EqualityFactoring"
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
            if !lit.is_positive_equality(&ctx.syms) {
                continue;
            }

            for (lj, other) in clause.literals.iter().enumerate() {
                if lj == li || !other.is_positive_equality(&ctx.syms) {
                    continue;
                }

                for (l, r) in equality_sides(lit) {
                    for (l2, r2) in equality_sides(other) {
                        let mut subst = Substitution::new();
                        if !subst.unify(&ctx.bank, l, QUERY, l2, QUERY) {
                            continue;
                        }

                        let mut renaming = HashMap::new();
                        let l_s = subst.apply_renamed(
                            &mut ctx.bank,
                            &mut ctx.syms,
                            l,
                            QUERY,
                            &mut renaming,
                        );
                        let r_s = subst.apply_renamed(
                            &mut ctx.bank,
                            &mut ctx.syms,
                            r,
                            QUERY,
                            &mut renaming,
                        );
                        if !not_smaller(ctx, l_s, r_s) {
                            continue;
                        }

                        let r2_s = subst.apply_renamed(
                            &mut ctx.bank,
                            &mut ctx.syms,
                            r2,
                            QUERY,
                            &mut renaming,
                        );

                        // σ(C | l' = r') plus the disequation σ(r != r')
                        let mut literals = collect_literals_except(
                            &subst,
                            ctx,
                            clause,
                            &[li],
                            QUERY,
                            &mut renaming,
                        );
                        literals.push(Literal::negative(
                            ctx.syms.equality(),
                            vec![r_s, r2_s],
                        ));
                        let literals = dedup_literals(literals);

                        results.push(Clause::derived(
                            literals,
                            &ctx.bank,
                            Derivation::new(Rule::EqualityFactoring, vec![given]),
                        ));
                    }
                }
            }
        }

        results
    }
}

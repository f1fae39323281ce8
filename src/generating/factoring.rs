//! Factoring
//!
//! From `L | L' | C` with `σ = mgu(L, L')` and `L` selected, derive
//! `σ(L | C)`. Works entirely within the given clause; no index needed.

use super::{collect_literals_except, dedup_literals};
use crate::engine::Generator;
use crate::fol::{Clause, Context, Derivation, Rule, Substitution, QUERY};
use crate::index::IndexManager;
use crate::saturation::arena::ClauseArena;
use std::collections::HashMap;

pub struct Factoring;

impl Generator for Factoring {
    fn name(&self) -> &'static str {
        "Factoring"
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
            for (lj, other) in clause.literals.iter().enumerate() {
                if lj == li
                    || other.predicate != lit.predicate
                    || other.polarity != lit.polarity
                {
                    continue;
                }

                let mut subst = Substitution::new();
                let unified = lit
                    .args
                    .iter()
                    .zip(other.args.iter())
                    .all(|(&s, &t)| subst.unify(&ctx.bank, s, QUERY, t, QUERY));
                if !unified {
                    continue;
                }

                let mut renaming = HashMap::new();
                let literals = dedup_literals(collect_literals_except(
                    &subst,
                    ctx,
                    clause,
                    &[lj],
                    QUERY,
                    &mut renaming,
                ));

                results.push(Clause::derived(
                    literals,
                    &ctx.bank,
                    Derivation::new(Rule::Factoring, vec![given]),
                ));
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::{Literal, TermId};

    struct Setup {
        ctx: Context,
        arena: ClauseArena,
        indices: IndexManager,
    }

    impl Setup {
        fn new() -> Self {
            Setup {
                ctx: Context::new(),
                arena: ClauseArena::new(),
                indices: IndexManager::new(),
            }
        }

        fn var(&mut self, name: &str) -> TermId {
            let id = self.ctx.syms.intern_variable(name);
            self.ctx.bank.variable(id)
        }

        fn const_(&mut self, name: &str) -> TermId {
            let id = self.ctx.syms.intern_constant(name);
            self.ctx.bank.constant(id)
        }

        fn given(&mut self, mut clause: Clause) -> usize {
            clause.selected = (0..clause.literals.len()).collect();
            self.arena.add(clause)
        }
    }

    #[test]
    fn test_factor_collapses_unifiable_pair() {
        let mut s = Setup::new();
        let p = s.ctx.syms.intern_predicate("p");
        let x = s.var("X");
        let a = s.const_("a");

        // p(X) | p(a) factors to p(a)
        let given = s.given(Clause::input(
            vec![
                Literal::positive(p, vec![x]),
                Literal::positive(p, vec![a]),
            ],
            &s.ctx.bank,
        ));

        let results = Factoring.generate(given, &s.arena, &mut s.ctx, &s.indices);
        assert!(!results.is_empty());
        assert!(results.iter().any(|c| {
            c.literals.len() == 1 && c.literals[0].args == vec![a]
        }));
    }

    #[test]
    fn test_opposite_polarities_do_not_factor() {
        let mut s = Setup::new();
        let p = s.ctx.syms.intern_predicate("p");
        let x = s.var("X");
        let a = s.const_("a");

        let given = s.given(Clause::input(
            vec![
                Literal::positive(p, vec![x]),
                Literal::negative(p, vec![a]),
            ],
            &s.ctx.bank,
        ));

        assert!(Factoring.generate(given, &s.arena, &mut s.ctx, &s.indices).is_empty());
    }

    #[test]
    fn test_clashing_arguments_do_not_factor() {
        let mut s = Setup::new();
        let p = s.ctx.syms.intern_predicate("p");
        let a = s.const_("a");
        let b = s.const_("b");

        let given = s.given(Clause::input(
            vec![
                Literal::positive(p, vec![a]),
                Literal::positive(p, vec![b]),
            ],
            &s.ctx.bank,
        ));

        assert!(Factoring.generate(given, &s.arena, &mut s.ctx, &s.indices).is_empty());
    }
}

//! Immediate simplification rules
//!
//! These run on every clause entering the loop, never consult the search
//! state, and are idempotent: duplicate literal removal, trivial
//! inequality removal (`t != t`), and tautology deletion.

use crate::engine::{ImmediateSimplifier, Simplified};
use crate::fol::{Clause, Context, Derivation, Rule};

/// Collapse repeated literals. `p(a) | p(a) | q` becomes `p(a) | q`.
pub struct DuplicateLiteralRemoval;

impl ImmediateSimplifier for DuplicateLiteralRemoval {
    fn name(&self) -> &'static str {
        "DuplicateLiteralRemoval"
    }

    fn rule(&self) -> Rule {
        Rule::DuplicateLiteralRemoval
    }

    fn simplify(&self, clause: Clause, ctx: &Context) -> Simplified {
        let mut kept = Vec::with_capacity(clause.literals.len());
        for lit in &clause.literals {
            if !kept.contains(lit) {
                kept.push(lit.clone());
            }
        }
        if kept.len() == clause.literals.len() {
            return Simplified::Unchanged(clause);
        }

        let parent = clause.id.expect("clause must be stored before simplification");
        Simplified::Replaced(Clause::derived(
            kept,
            &ctx.bank,
            Derivation::new(Rule::DuplicateLiteralRemoval, vec![parent]),
        ))
    }
}

/// Drop literals of the form `t != t`: false in every interpretation, so
/// `C | t != t` is equivalent to `C`.
pub struct TrivialInequalityRemoval;

impl ImmediateSimplifier for TrivialInequalityRemoval {
    fn name(&self) -> &'static str {
        "TrivialInequalityRemoval"
    }

    fn rule(&self) -> Rule {
        Rule::TrivialInequalityRemoval
    }

    fn simplify(&self, clause: Clause, ctx: &Context) -> Simplified {
        let kept: Vec<_> = clause
            .literals
            .iter()
            .filter(|lit| {
                !(lit.is_equality(&ctx.syms) && !lit.polarity && lit.args[0] == lit.args[1])
            })
            .cloned()
            .collect();
        if kept.len() == clause.literals.len() {
            return Simplified::Unchanged(clause);
        }

        let parent = clause.id.expect("clause must be stored before simplification");
        Simplified::Replaced(Clause::derived(
            kept,
            &ctx.bank,
            Derivation::new(Rule::TrivialInequalityRemoval, vec![parent]),
        ))
    }
}

/// Discard tautologies: a complementary literal pair or a `t = t` literal.
pub struct TautologyDeletion;

impl ImmediateSimplifier for TautologyDeletion {
    fn name(&self) -> &'static str {
        "TautologyDeletion"
    }

    fn rule(&self) -> Rule {
        Rule::TautologyDeletion
    }

    fn simplify(&self, clause: Clause, ctx: &Context) -> Simplified {
        if clause.is_tautology(&ctx.syms) {
            Simplified::Redundant
        } else {
            Simplified::Unchanged(clause)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Literal;

    fn stored(mut clause: Clause, id: usize) -> Clause {
        clause.id = Some(id);
        clause
    }

    #[test]
    fn test_duplicate_removal() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let q = ctx.syms.intern_predicate("q");
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));

        let clause = stored(
            Clause::input(
                vec![
                    Literal::positive(p, vec![a]),
                    Literal::positive(q, vec![a]),
                    Literal::positive(p, vec![a]),
                ],
                &ctx.bank,
            ),
            0,
        );

        match DuplicateLiteralRemoval.simplify(clause, &ctx) {
            Simplified::Replaced(c) => {
                assert_eq!(c.literals.len(), 2);
                assert_eq!(c.derivation.rule, Rule::DuplicateLiteralRemoval);
                assert_eq!(c.derivation.parents, vec![0]);
            }
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_removal_is_idempotent() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));

        let clause = stored(
            Clause::input(vec![Literal::positive(p, vec![a])], &ctx.bank),
            0,
        );
        assert!(matches!(
            DuplicateLiteralRemoval.simplify(clause, &ctx),
            Simplified::Unchanged(_)
        ));
    }

    #[test]
    fn test_trivial_inequality_removed() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));
        let eq = ctx.syms.equality();

        let clause = stored(
            Clause::input(
                vec![
                    Literal::negative(eq, vec![a, a]),
                    Literal::positive(p, vec![a]),
                ],
                &ctx.bank,
            ),
            3,
        );

        match TrivialInequalityRemoval.simplify(clause, &ctx) {
            Simplified::Replaced(c) => {
                assert_eq!(c.literals.len(), 1);
                assert_eq!(c.derivation.parents, vec![3]);
            }
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn test_tautology_discarded() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));

        let clause = stored(
            Clause::input(
                vec![
                    Literal::positive(p, vec![a]),
                    Literal::negative(p, vec![a]),
                ],
                &ctx.bank,
            ),
            0,
        );
        assert!(matches!(
            TautologyDeletion.simplify(clause, &ctx),
            Simplified::Redundant
        ));
    }
}

//! Literal selection strategies
//!
//! The literal ordering extends the term ordering to atoms: the variable
//! condition and weight comparison run over whole literals, ties fall back
//! to predicate precedence, then polarity (negative above positive), then
//! lexicographic argument comparison.
//!
//! Completeness: selecting all literals or all maximal literals preserves
//! refutational completeness of the calculus; the greedy negative-first
//! selection does not, and the driver reports `Unknown` instead of
//! `Satisfiable` when saturating under it.

use crate::fol::{Clause, Context, Literal, TermOrdering, VariableId};
use std::collections::HashMap;

/// Strategy choosing the inference-eligible literals of a clause.
pub trait LiteralSelector {
    fn name(&self) -> &'static str;

    /// Indices of the selected literals, ascending.
    fn select(&self, clause: &Clause, ctx: &Context) -> Vec<usize>;

    /// Whether saturation under this selector is refutationally complete.
    fn preserves_completeness(&self) -> bool;
}

fn count_literal_variables(lit: &Literal, ctx: &Context, counts: &mut HashMap<VariableId, u32>) {
    for &arg in &lit.args {
        ctx.bank.count_variables(arg, counts);
    }
}

/// Strict literal ordering: `a` above `b` in the atom extension of the
/// term ordering.
fn literal_greater(a: &Literal, b: &Literal, ctx: &Context) -> bool {
    let mut vars_a = HashMap::new();
    let mut vars_b = HashMap::new();
    count_literal_variables(a, ctx, &mut vars_a);
    count_literal_variables(b, ctx, &mut vars_b);

    let covers = vars_b
        .iter()
        .all(|(v, n)| vars_a.get(v).copied().unwrap_or(0) >= *n);
    if !covers {
        return false;
    }

    let weight_a = a.weight(&ctx.bank);
    let weight_b = b.weight(&ctx.bank);
    if weight_a != weight_b {
        return weight_a > weight_b;
    }

    if a.predicate != b.predicate {
        return a.predicate > b.predicate;
    }

    // Same atom shape: a negative literal is above its positive twin
    if a.args == b.args {
        return !a.polarity && b.polarity;
    }

    for (&s, &t) in a.args.iter().zip(b.args.iter()) {
        match ctx.ordering.compare(&ctx.bank, s, t) {
            TermOrdering::Greater => return true,
            TermOrdering::Less => return false,
            TermOrdering::Equal | TermOrdering::Incomparable => continue,
        }
    }
    false
}

/// Indices of the literals no other literal is strictly above.
fn maximal_literals(clause: &Clause, ctx: &Context) -> Vec<usize> {
    let n = clause.literals.len();
    (0..n)
        .filter(|&i| {
            (0..n).all(|j| i == j || !literal_greater(&clause.literals[j], &clause.literals[i], ctx))
        })
        .collect()
}

/// COMPLETE: select every literal.
pub struct SelectAll;

impl LiteralSelector for SelectAll {
    fn name(&self) -> &'static str {
        "SelectAll"
    }

    fn select(&self, clause: &Clause, _ctx: &Context) -> Vec<usize> {
        (0..clause.literals.len()).collect()
    }

    fn preserves_completeness(&self) -> bool {
        true
    }
}

/// MAXIMAL: select all ordering-maximal literals.
pub struct SelectMaximal;

impl LiteralSelector for SelectMaximal {
    fn name(&self) -> &'static str {
        "SelectMaximal"
    }

    fn select(&self, clause: &Clause, ctx: &Context) -> Vec<usize> {
        maximal_literals(clause, ctx)
    }

    fn preserves_completeness(&self) -> bool {
        true
    }
}

/// BEST: the unique maximal literal if there is one, else the heaviest
/// negative literal, else all maximal literals.
pub struct SelectBest;

impl LiteralSelector for SelectBest {
    fn name(&self) -> &'static str {
        "SelectBest"
    }

    fn select(&self, clause: &Clause, ctx: &Context) -> Vec<usize> {
        let maximal = maximal_literals(clause, ctx);
        if maximal.len() == 1 {
            return maximal;
        }

        let heaviest_negative = clause
            .literals
            .iter()
            .enumerate()
            .filter(|(_, lit)| !lit.polarity)
            .max_by_key(|(i, lit)| (lit.weight(&ctx.bank), std::cmp::Reverse(*i)));
        if let Some((i, _)) = heaviest_negative {
            return vec![i];
        }

        maximal
    }

    fn preserves_completeness(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::{Clause, Literal, TermId};

    struct Ctx {
        ctx: Context,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                ctx: Context::new(),
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

        fn func(&mut self, name: &str, args: Vec<TermId>) -> TermId {
            let id = self.ctx.syms.intern_function(name);
            self.ctx.bank.function(id, args)
        }
    }

    #[test]
    fn test_select_all() {
        let mut t = Ctx::new();
        let p = t.ctx.syms.intern_predicate("p");
        let a = t.const_("a");
        let clause = Clause::input(
            vec![
                Literal::positive(p, vec![a]),
                Literal::negative(p, vec![a]),
            ],
            &t.ctx.bank,
        );
        assert_eq!(SelectAll.select(&clause, &t.ctx), vec![0, 1]);
    }

    #[test]
    fn test_heavier_literal_is_maximal() {
        let mut t = Ctx::new();
        let p = t.ctx.syms.intern_predicate("p");
        let a = t.const_("a");
        let fa = t.func("f", vec![a]);
        let ffa = t.func("f", vec![fa]);

        let clause = Clause::input(
            vec![
                Literal::positive(p, vec![a]),
                Literal::positive(p, vec![ffa]),
            ],
            &t.ctx.bank,
        );
        assert_eq!(SelectMaximal.select(&clause, &t.ctx), vec![1]);
    }

    #[test]
    fn test_negative_above_positive_twin() {
        let mut t = Ctx::new();
        let p = t.ctx.syms.intern_predicate("p");
        let a = t.const_("a");

        let clause = Clause::input(
            vec![
                Literal::positive(p, vec![a]),
                Literal::negative(p, vec![a]),
            ],
            &t.ctx.bank,
        );
        assert_eq!(SelectMaximal.select(&clause, &t.ctx), vec![1]);
    }

    #[test]
    fn test_best_prefers_heaviest_negative() {
        let mut t = Ctx::new();
        let p = t.ctx.syms.intern_predicate("p");
        let q = t.ctx.syms.intern_predicate("q");
        let x = t.var("X");
        let y = t.var("Y");
        let fy = t.func("f", vec![y]);

        // ~p(X) | ~q(f(Y)): two incomparable maximal literals, pick the
        // heavier negative one
        let clause = Clause::input(
            vec![
                Literal::negative(p, vec![x]),
                Literal::negative(q, vec![fy]),
            ],
            &t.ctx.bank,
        );
        assert_eq!(SelectBest.select(&clause, &t.ctx), vec![1]);
    }

    #[test]
    fn test_completeness_flags() {
        assert!(SelectAll.preserves_completeness());
        assert!(SelectMaximal.preserves_completeness());
        assert!(!SelectBest.preserves_completeness());
    }
}

//! Forward demodulation
//!
//! Rewrites a candidate clause with oriented instances of unit equalities
//! from Active: for a subterm `t` of the clause and an Active equality
//! `u = v` with `σu = t` and `t > σv`, the clause is replaced by its
//! rewrite at `t`. Candidates come from generalization retrieval on the
//! `DemodulationLhs` index.
//!
//! Subterms are attempted once per call: when a subterm has been attempted
//! and failed, its proper subterms are skipped — they were attempted
//! transitively in an earlier call or are irrelevant under the ordering.
//! Exactly one successful rewrite is consumed per call; the driver restarts
//! the chain on the replacement.

use crate::config::{DemodulationMode, RedundancyCheck};
use crate::engine::{ForwardSimplifier, FwSimplification};
use crate::fol::{
    Clause, Colour, Context, Derivation, Literal, Rule, Substitution, TermData, TermId,
    TermOrdering, RESULT,
};
use crate::index::{IndexKind, IndexManager};
use crate::saturation::arena::ClauseArena;
use std::collections::HashSet;

pub struct ForwardDemodulation {
    preordered_only: bool,
    redundancy: RedundancyCheck,
}

impl ForwardDemodulation {
    pub fn new(mode: DemodulationMode, redundancy: RedundancyCheck) -> Self {
        debug_assert_ne!(mode, DemodulationMode::Off);
        ForwardDemodulation {
            preordered_only: mode == DemodulationMode::Preordered,
            redundancy,
        }
    }
}

/// The redundancy criterion can only fail when the rewritten clause is a
/// unit equality and the rewrite happens at the top of one of its sides:
/// everywhere else the rewritten clause is strictly smaller than the
/// original in the clause ordering.
fn redundancy_check_needed(
    ctx: &Context,
    clause: &Clause,
    lit: &Literal,
    trm: TermId,
    redundancy: RedundancyCheck,
) -> bool {
    redundancy != RedundancyCheck::Off
        && clause.literals.len() == 1
        && lit.is_equality(&ctx.syms)
        && (trm == lit.args[0] || trm == lit.args[1])
}

/// Is the rewriting premise `σu = σv` small enough that replacing the
/// clause keeps it redundant? `rhs_s` is `σv`, `other` the untouched side
/// of the rewritten equality. In encompassment mode a proper instantiation
/// (non-renaming matcher) counts as smaller outright.
fn premise_is_redundant(
    ctx: &Context,
    rhs_s: TermId,
    other: TermId,
    subst: &Substitution,
    redundancy: RedundancyCheck,
) -> bool {
    if ctx.ordering.compare(&ctx.bank, rhs_s, other) == TermOrdering::Less {
        return true;
    }
    redundancy == RedundancyCheck::Encompass && !subst.is_renaming(&ctx.bank)
}

impl ForwardSimplifier for ForwardDemodulation {
    fn name(&self) -> &'static str {
        "ForwardDemodulation"
    }

    fn attach(&mut self, indices: &mut IndexManager) {
        indices.request(IndexKind::DemodulationLhs);
    }

    fn detach(&mut self, indices: &mut IndexManager) {
        indices.release(IndexKind::DemodulationLhs);
    }

    fn perform(
        &self,
        clause: &Clause,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Option<FwSimplification> {
        let index = indices.get(IndexKind::DemodulationLhs)?;

        let mut attempted: HashSet<TermId> = HashSet::new();

        for (li, lit) in clause.literals.iter().enumerate() {
            for &arg in &lit.args {
                let order = ctx.bank.subterm_spans(arg);
                let mut pos = 0;
                while pos < order.len() {
                    let (trm, span) = order[pos];
                    if matches!(ctx.bank.data(trm), TermData::Variable(_)) {
                        pos += 1;
                        continue;
                    }
                    if !attempted.insert(trm) {
                        // Already attempted without success; its subterms
                        // were covered transitively.
                        pos += span;
                        continue;
                    }
                    pos += 1;

                    let mut needs_check =
                        redundancy_check_needed(ctx, clause, lit, trm, self.redundancy);

                    let mut retrieval = index.generalizations(&ctx.bank, trm);
                    while let Some((entry, subst)) = retrieval.next(&ctx.bank) {
                        let eq_clause = arena.get(entry.clause);
                        debug_assert_eq!(eq_clause.literals.len(), 1);

                        if !Colour::compatible(clause.colour, eq_clause.colour) {
                            continue;
                        }

                        let eq_lit = &eq_clause.literals[0];
                        let rhs = eq_lit.other_equality_side(entry.term);
                        let preordered = eq_lit.oriented;

                        if !preordered && self.preordered_only {
                            continue;
                        }

                        let rhs_s = subst.apply(&mut ctx.bank, rhs, RESULT);

                        // The rewrite is sound only if trm > σv. Preordered
                        // equalities inherit it from u > v by stability.
                        if !preordered && !ctx.ordering.is_greater(&ctx.bank, trm, rhs_s) {
                            continue;
                        }

                        // Encompassing demodulation tolerates rewriting the
                        // strictly smaller side of an equality literal.
                        if needs_check && self.redundancy == RedundancyCheck::Encompass {
                            let lit_order = ctx.ordering.equality_argument_order(&ctx.bank, lit);
                            if (trm == lit.args[0] && lit_order == TermOrdering::Less)
                                || (trm == lit.args[1] && lit_order == TermOrdering::Greater)
                            {
                                needs_check = false;
                            }
                        }

                        if needs_check {
                            let other = lit.other_equality_side(trm);
                            if !premise_is_redundant(ctx, rhs_s, other, subst, self.redundancy) {
                                continue;
                            }
                        }

                        // Build L' = L[trm -> σv]
                        let new_args: Vec<TermId> = lit
                            .args
                            .iter()
                            .map(|&a| ctx.bank.replace(a, trm, rhs_s))
                            .collect();

                        // L' of the form s = s: the clause became an
                        // equality tautology and is deleted outright.
                        if lit.polarity
                            && lit.is_equality(&ctx.syms)
                            && new_args[0] == new_args[1]
                        {
                            return Some(FwSimplification {
                                rule: Rule::ForwardDemodulation,
                                replacement: None,
                                premises: vec![entry.clause],
                            });
                        }

                        let mut literals = clause.literals.clone();
                        literals[li] = Literal {
                            predicate: lit.predicate,
                            args: new_args,
                            polarity: lit.polarity,
                            oriented: false,
                        };

                        let parent = clause.id.expect("stored clause");
                        let replacement = Clause::derived(
                            literals,
                            &ctx.bank,
                            Derivation::new(Rule::ForwardDemodulation, vec![parent, entry.clause]),
                        );

                        return Some(FwSimplification {
                            rule: Rule::ForwardDemodulation,
                            replacement: Some(replacement),
                            premises: vec![entry.clause],
                        });
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::TermId;

    struct Setup {
        ctx: Context,
        arena: ClauseArena,
        indices: IndexManager,
    }

    impl Setup {
        fn new() -> Self {
            let mut indices = IndexManager::new();
            indices.request(IndexKind::DemodulationLhs);
            Setup {
                ctx: Context::new(),
                arena: ClauseArena::new(),
                indices,
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

        /// Store a unit equality and index it as Active.
        fn active_equality(&mut self, lhs: TermId, rhs: TermId) -> usize {
            let eq = self.ctx.syms.equality();
            let mut clause =
                Clause::input(vec![Literal::positive(eq, vec![lhs, rhs])], &self.ctx.bank);
            self.ctx.normalize_clause(&mut clause);
            let id = self.arena.add(clause);
            let snapshot = self.arena.get(id).clone();
            self.indices.insert_clause(&mut self.ctx, id, &snapshot);
            id
        }

        fn store(&mut self, mut clause: Clause) -> usize {
            self.ctx.normalize_clause(&mut clause);
            self.arena.add(clause)
        }

        fn rule(&self) -> ForwardDemodulation {
            ForwardDemodulation::new(DemodulationMode::All, RedundancyCheck::On)
        }
    }

    #[test]
    fn test_basic_rewrite() {
        let mut s = Setup::new();
        let a = s.const_("a");
        let b = s.const_("b");
        let fa = s.func("f", vec![a]);

        // Active: f(a) = b.  Candidate: p(f(a)).
        let eq_id = s.active_equality(fa, b);
        let p = s.ctx.syms.intern_predicate("p");
        let cand = Clause::input(vec![Literal::positive(p, vec![fa])], &s.ctx.bank);
        let cand_id = s.store(cand);

        let rule = s.rule();
        let clause = s.arena.get(cand_id).clone();
        let result = rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .expect("should rewrite");

        assert_eq!(result.premises, vec![eq_id]);
        let replacement = result.replacement.expect("replacement clause");
        assert_eq!(replacement.literals[0].args, vec![b]);
        assert_eq!(replacement.derivation.rule, Rule::ForwardDemodulation);
        assert_eq!(replacement.derivation.parents, vec![cand_id, eq_id]);
    }

    #[test]
    fn test_general_equality_instantiates() {
        let mut s = Setup::new();
        let x = s.var("X");
        let a = s.const_("a");
        let fx = s.func("f", vec![x]);

        // Active: f(X) = X.  Candidate: p(f(f(a))).
        s.active_equality(fx, x);
        let p = s.ctx.syms.intern_predicate("p");
        let fa = s.func("f", vec![a]);
        let ffa = s.func("f", vec![fa]);
        let cand_id = s.store(Clause::input(
            vec![Literal::positive(p, vec![ffa])],
            &s.ctx.bank,
        ));

        let rule = s.rule();
        let clause = s.arena.get(cand_id).clone();
        let result = rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .expect("should rewrite");

        // The outermost occurrence f(f(a)) rewrites to f(a)
        let replacement = result.replacement.unwrap();
        assert_eq!(replacement.literals[0].args, vec![fa]);
    }

    #[test]
    fn test_unoriented_equality_checks_instance_order() {
        let mut s = Setup::new();
        let x = s.var("X");
        let y = s.var("Y");
        let fxy = s.func("f", vec![x, y]);
        let fyx = s.func("f", vec![y, x]);

        // Commutativity is incomparable; instances decide per hit.
        s.active_equality(fxy, fyx);

        let p = s.ctx.syms.intern_predicate("p");
        let a = s.const_("a");
        let b = s.const_("b");
        let fba = s.func("f", vec![b, a]);
        let fab = s.func("f", vec![a, b]);

        // With default precedence (a before b), f(b,a) > f(a,b): the
        // rewrite must go f(b,a) -> f(a,b) and not the other way.
        assert!(s.ctx.ordering.is_greater(&s.ctx.bank, fba, fab));

        let good_id = s.store(Clause::input(
            vec![Literal::positive(p, vec![fba])],
            &s.ctx.bank,
        ));
        let rule = s.rule();
        let clause = s.arena.get(good_id).clone();
        let result = rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .expect("descending instance should rewrite");
        assert_eq!(result.replacement.unwrap().literals[0].args, vec![fab]);

        let bad_id = s.store(Clause::input(
            vec![Literal::positive(p, vec![fab])],
            &s.ctx.bank,
        ));
        let clause = s.arena.get(bad_id).clone();
        assert!(
            rule.perform(&clause, &s.arena, &mut s.ctx, &s.indices)
                .is_none(),
            "ascending instance must be rejected"
        );
    }

    #[test]
    fn test_preordered_only_skips_unoriented() {
        let mut s = Setup::new();
        let x = s.var("X");
        let y = s.var("Y");
        let fxy = s.func("f", vec![x, y]);
        let fyx = s.func("f", vec![y, x]);
        s.active_equality(fxy, fyx);

        let p = s.ctx.syms.intern_predicate("p");
        let a = s.const_("a");
        let b = s.const_("b");
        let fba = s.func("f", vec![b, a]);
        let cand_id = s.store(Clause::input(
            vec![Literal::positive(p, vec![fba])],
            &s.ctx.bank,
        ));

        let rule = ForwardDemodulation::new(DemodulationMode::Preordered, RedundancyCheck::On);
        let clause = s.arena.get(cand_id).clone();
        assert!(rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .is_none());
    }

    #[test]
    fn test_equality_tautology_outcome() {
        let mut s = Setup::new();
        let a = s.const_("a");
        let b = s.const_("b");
        let fa = s.func("f", vec![a]);

        // Active: f(a) = b.  Candidate: f(a) = b rewrites to b = b.
        let eq_id = s.active_equality(fa, b);
        let eq = s.ctx.syms.equality();
        let cand_id = s.store(Clause::input(
            vec![Literal::positive(eq, vec![fa, b])],
            &s.ctx.bank,
        ));

        // The premise check would reject this self-rewrite (σv equals the
        // other side); switch it off to observe the tautology outcome.
        let rule = ForwardDemodulation::new(DemodulationMode::All, RedundancyCheck::Off);
        let clause = s.arena.get(cand_id).clone();
        let result = rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .expect("tautology outcome");
        assert!(result.replacement.is_none());
        assert_eq!(result.premises, vec![eq_id]);
    }

    #[test]
    fn test_redundancy_check_blocks_self_rewrite() {
        let mut s = Setup::new();
        let a = s.const_("a");
        let b = s.const_("b");
        let fa = s.func("f", vec![a]);

        // Active: f(a) = b. Candidate: the identical unit equality.
        // Rewriting its left side at the top would replace the clause by
        // b = b using an equal (not smaller) premise instance; the
        // redundancy check must reject that.
        s.active_equality(fa, b);
        let eq = s.ctx.syms.equality();
        let cand_id = s.store(Clause::input(
            vec![Literal::positive(eq, vec![fa, b])],
            &s.ctx.bank,
        ));

        let rule = s.rule();
        let clause = s.arena.get(cand_id).clone();
        assert!(rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .is_none());
    }

    #[test]
    fn test_attempted_subterms_are_skipped() {
        let mut s = Setup::new();
        let a = s.const_("a");
        let b = s.const_("b");
        let ga = s.func("g", vec![a]);

        // Active: g(a) = b. Candidate: p(g(a), g(a)) — the second
        // occurrence is the same shared term; one rewrite call touches the
        // first occurrence found and replaces all its occurrences in the
        // literal it fires on.
        s.active_equality(ga, b);
        let p = s.ctx.syms.intern_predicate("p");
        let cand_id = s.store(Clause::input(
            vec![Literal::positive(p, vec![ga, ga])],
            &s.ctx.bank,
        ));

        let rule = s.rule();
        let clause = s.arena.get(cand_id).clone();
        let result = rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .expect("rewrite");
        assert_eq!(result.replacement.unwrap().literals[0].args, vec![b, b]);
    }

    #[test]
    fn test_incompatible_colours_skip() {
        let mut s = Setup::new();
        let a = s.const_("a");
        let b = s.const_("b");
        let fa = s.func("f", vec![a]);

        let eq_id = s.active_equality(fa, b);
        s.arena.get_mut(eq_id).colour = Colour::Left;
        // Re-index is unnecessary: colour is read from the arena at hit time.

        let p = s.ctx.syms.intern_predicate("p");
        let cand_id = s.store(Clause::input(
            vec![Literal::positive(p, vec![fa])],
            &s.ctx.bank,
        ));
        s.arena.get_mut(cand_id).colour = Colour::Right;

        let rule = s.rule();
        let clause = s.arena.get(cand_id).clone();
        assert!(rule
            .perform(&clause, &s.arena, &mut s.ctx, &s.indices)
            .is_none());
    }
}

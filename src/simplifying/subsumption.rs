//! Clause subsumption
//!
//! A clause D subsumes C when some substitution maps D's literals
//! injectively onto a sub-multiset of C's. Subsumed clauses are redundant
//! and deleted: forward subsumption drops a candidate subsumed by Active,
//! backward subsumption drops Active/Passive clauses subsumed by a newly
//! activated one.
//!
//! Candidates come from the `ActiveLiterals` index: if D subsumes C, every
//! literal of D generalises a literal of C, so generalization (forward) or
//! instance (backward) retrieval on any literal surfaces the pair. The
//! full multiset check then runs with a trail-backtracking matcher.

use crate::engine::{BackwardSimplifier, BwSimplification, ForwardSimplifier, FwSimplification};
use crate::fol::{Clause, Colour, Context, Literal, Rule, Substitution, QUERY, RESULT};
use crate::index::{literal_key, IndexKind, IndexManager};
use crate::saturation::arena::ClauseArena;
use indexmap::IndexSet;

/// Match one literal of the subsumer against one of the subsumee. Equality
/// literals match in either argument order.
fn literal_matches(
    ctx: &Context,
    subst: &mut Substitution,
    sub_lit: &Literal,
    sup_lit: &Literal,
) -> bool {
    if sub_lit.predicate != sup_lit.predicate
        || sub_lit.polarity != sup_lit.polarity
        || sub_lit.args.len() != sup_lit.args.len()
    {
        return false;
    }

    let straight = |subst: &mut Substitution| {
        let mark = subst.mark();
        for (&p, &i) in sub_lit.args.iter().zip(sup_lit.args.iter()) {
            if !subst.match_(&ctx.bank, p, RESULT, i, QUERY) {
                subst.undo_to(mark);
                return false;
            }
        }
        true
    };

    if straight(subst) {
        return true;
    }

    // Equality is symmetric: try the swapped argument order
    if sub_lit.is_equality(&ctx.syms) {
        let mark = subst.mark();
        if subst.match_(&ctx.bank, sub_lit.args[0], RESULT, sup_lit.args[1], QUERY)
            && subst.match_(&ctx.bank, sub_lit.args[1], RESULT, sup_lit.args[0], QUERY)
        {
            return true;
        }
        subst.undo_to(mark);
    }

    false
}

fn subsumes_rec(
    ctx: &Context,
    subst: &mut Substitution,
    subsumer: &Clause,
    subsumee: &Clause,
    next: usize,
    used: &mut [bool],
) -> bool {
    if next == subsumer.literals.len() {
        return true;
    }
    let lit = &subsumer.literals[next];
    for (j, target) in subsumee.literals.iter().enumerate() {
        if used[j] {
            continue;
        }
        let mark = subst.mark();
        if literal_matches(ctx, subst, lit, target) {
            used[j] = true;
            if subsumes_rec(ctx, subst, subsumer, subsumee, next + 1, used) {
                return true;
            }
            used[j] = false;
        }
        subst.undo_to(mark);
    }
    false
}

/// Does `subsumer` subsume `subsumee`? Multiset semantics: each subsumer
/// literal consumes a distinct subsumee literal, so a clause does not
/// subsume its own factors.
pub fn subsumes(ctx: &Context, subsumer: &Clause, subsumee: &Clause) -> bool {
    if subsumer.literals.len() > subsumee.literals.len() {
        return false;
    }
    let mut subst = Substitution::new();
    let mut used = vec![false; subsumee.literals.len()];
    subsumes_rec(ctx, &mut subst, subsumer, subsumee, 0, &mut used)
}

/// Index keys under which a literal's subsumption partners can hide: its
/// own key, and for equalities the swapped-argument key as well.
fn candidate_keys(ctx: &mut Context, lit: &Literal) -> Vec<crate::fol::TermId> {
    let mut keys = vec![literal_key(ctx, lit)];
    if lit.is_equality(&ctx.syms) {
        let swapped = Literal {
            predicate: lit.predicate,
            args: vec![lit.args[1], lit.args[0]],
            polarity: lit.polarity,
            oriented: false,
        };
        let key = literal_key(ctx, &swapped);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

pub struct ForwardSubsumption;

impl ForwardSimplifier for ForwardSubsumption {
    fn name(&self) -> &'static str {
        "ForwardSubsumption"
    }

    fn attach(&mut self, indices: &mut IndexManager) {
        indices.request(IndexKind::ActiveLiterals);
    }

    fn detach(&mut self, indices: &mut IndexManager) {
        indices.release(IndexKind::ActiveLiterals);
    }

    fn perform(
        &self,
        clause: &Clause,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Option<FwSimplification> {
        let index = indices.get(IndexKind::ActiveLiterals)?;
        let own_id = clause.id;

        let mut candidates: IndexSet<usize> = IndexSet::new();
        for lit in &clause.literals {
            for key in candidate_keys(ctx, lit) {
                let mut retrieval = index.generalizations(&ctx.bank, key);
                while let Some((entry, _)) = retrieval.next(&ctx.bank) {
                    if Some(entry.clause) != own_id {
                        candidates.insert(entry.clause);
                    }
                }
            }
        }

        for cand_id in candidates {
            let cand = arena.get(cand_id);
            if cand.literals.len() > clause.literals.len() {
                continue;
            }
            if !Colour::compatible(clause.colour, cand.colour) {
                continue;
            }
            if subsumes(ctx, cand, clause) {
                return Some(FwSimplification {
                    rule: Rule::ForwardSubsumption,
                    replacement: None,
                    premises: vec![cand_id],
                });
            }
        }
        None
    }
}

pub struct BackwardSubsumption;

impl BackwardSimplifier for BackwardSubsumption {
    fn name(&self) -> &'static str {
        "BackwardSubsumption"
    }

    fn attach(&mut self, indices: &mut IndexManager) {
        indices.request(IndexKind::ActiveLiterals);
    }

    fn detach(&mut self, indices: &mut IndexManager) {
        indices.release(IndexKind::ActiveLiterals);
    }

    fn perform(
        &self,
        activated: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Vec<BwSimplification> {
        let Some(index) = indices.get(IndexKind::ActiveLiterals) else {
            return vec![];
        };
        let clause = arena.get(activated);
        if clause.literals.is_empty() {
            return vec![];
        }

        // Any victim must contain an instance of the first literal
        let first = clause.literals[0].clone();
        let mut candidates: IndexSet<usize> = IndexSet::new();
        for key in candidate_keys(ctx, &first) {
            let mut retrieval = index.instances(&ctx.bank, key);
            while let Some((entry, _)) = retrieval.next(&ctx.bank) {
                if entry.clause != activated {
                    candidates.insert(entry.clause);
                }
            }
        }

        let clause = arena.get(activated);
        let mut results = Vec::new();
        for victim_id in candidates {
            let victim = arena.get(victim_id);
            if victim.literals.len() < clause.literals.len() {
                continue;
            }
            if !Colour::compatible(clause.colour, victim.colour) {
                continue;
            }
            if subsumes(ctx, clause, victim) {
                results.push(BwSimplification {
                    rule: Rule::BackwardSubsumption,
                    victim: victim_id,
                    replacement: None,
                    premises: vec![activated],
                });
            }
        }
        results
    }
}

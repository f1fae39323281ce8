//! Backward demodulation
//!
//! When a unit equality is activated, clauses already in Active or Passive
//! that contain an instance of its greater side are rewritten and
//! re-enter the loop through Unprocessed. Victims come from instance
//! retrieval on the `RewritableSubterms` index.

use crate::config::DemodulationMode;
use crate::engine::{BackwardSimplifier, BwSimplification};
use crate::fol::{Clause, Colour, Derivation, Literal, Rule, TermData, TermId, QUERY};
use crate::fol::Context;
use crate::index::{IndexKind, IndexManager};
use crate::saturation::arena::ClauseArena;
use std::collections::HashSet;

pub struct BackwardDemodulation {
    preordered_only: bool,
}

impl BackwardDemodulation {
    pub fn new(mode: DemodulationMode) -> Self {
        debug_assert_ne!(mode, DemodulationMode::Off);
        BackwardDemodulation {
            preordered_only: mode == DemodulationMode::Preordered,
        }
    }
}

impl BackwardSimplifier for BackwardDemodulation {
    fn name(&self) -> &'static str {
        "BackwardDemodulation"
    }

    fn attach(&mut self, indices: &mut IndexManager) {
        indices.request(IndexKind::RewritableSubterms);
    }

    fn detach(&mut self, indices: &mut IndexManager) {
        indices.release(IndexKind::RewritableSubterms);
    }

    fn perform(
        &self,
        activated: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Vec<BwSimplification> {
        let clause = arena.get(activated);
        if !clause.is_unit_equality(&ctx.syms) {
            return vec![];
        }
        let Some(index) = indices.get(IndexKind::RewritableSubterms) else {
            return vec![];
        };

        let lit = clause.literals[0].clone();
        let oriented = lit.oriented;
        if !oriented && self.preordered_only {
            return vec![];
        }

        // Oriented: only the greater side rewrites. Unoriented: either side
        // may, subject to the per-instance ordering check.
        let mut directions: Vec<(TermId, TermId)> = vec![(lit.args[0], lit.args[1])];
        if !oriented {
            directions.push((lit.args[1], lit.args[0]));
        }

        let mut results = Vec::new();
        let mut rewritten: HashSet<usize> = HashSet::new();

        for (lhs, rhs) in directions {
            if matches!(ctx.bank.data(lhs), TermData::Variable(_)) {
                continue;
            }

            // Buffer the hits: applying substitutions grows the bank, and
            // the victims are rewritten only after retrieval finishes.
            let mut hits: Vec<(usize, TermId, TermId)> = Vec::new();
            {
                let mut retrieval = index.instances(&ctx.bank, lhs);
                while let Some((entry, subst)) = retrieval.next(&ctx.bank) {
                    if entry.clause == activated || rewritten.contains(&entry.clause) {
                        continue;
                    }
                    let victim = arena.get(entry.clause);
                    if !Colour::compatible(clause.colour, victim.colour) {
                        continue;
                    }

                    // entry.term = σ(lhs); materialise σ(rhs) on the same
                    // instantiation
                    let rhs_s = subst.apply(&mut ctx.bank, rhs, QUERY);
                    if !oriented && !ctx.ordering.is_greater(&ctx.bank, entry.term, rhs_s) {
                        continue;
                    }

                    rewritten.insert(entry.clause);
                    hits.push((entry.clause, entry.term, rhs_s));
                }
            }

            for (victim_id, target, replacement_term) in hits {
                let victim = arena.get(victim_id);
                let literals: Vec<Literal> = victim
                    .literals
                    .iter()
                    .map(|l| Literal {
                        predicate: l.predicate,
                        args: l
                            .args
                            .iter()
                            .map(|&a| ctx.bank.replace(a, target, replacement_term))
                            .collect(),
                        polarity: l.polarity,
                        oriented: false,
                    })
                    .collect();

                let replacement = Clause::derived(
                    literals,
                    &ctx.bank,
                    Derivation::new(Rule::BackwardDemodulation, vec![victim_id, activated]),
                );

                results.push(BwSimplification {
                    rule: Rule::BackwardDemodulation,
                    victim: victim_id,
                    replacement: Some(replacement),
                    premises: vec![activated],
                });
            }
        }

        results
    }
}

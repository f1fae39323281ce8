//! The given-clause saturation loop
//!
//! The driver owns the clause arena, the three containers, the engine
//! chains, the index manager, and the `Context`. Each `step` either moves
//! one clause from Unprocessed through immediate simplification into
//! Passive, or selects a given clause, simplifies it forward to a fixed
//! point, simplifies Active/Passive backward with it, activates and
//! indexes it, and runs every generator on it.
//!
//! Budgets (wall clock, memory, clause and activation counts) and the
//! cancellation flag are checked between steps only: in-flight inferences
//! complete, and no partial clause state is ever observable.

use super::arena::ClauseArena;
use super::containers::{ActiveSet, PassiveQueue, UnprocessedQueue};
use super::events::{ClauseEvent, EventLog};
use super::statistics::Statistics;
use crate::config::{
    process_memory_mb, BackwardKind, DemodulationMode, ForwardKind, GeneratorKind, ImmediateKind,
    Strategy, StrategyError,
};
use crate::engine::{
    BackwardSimplifier, BwSimplification, ForwardSimplifier, Generator, ImmediateSimplifier,
    Simplified,
};
use crate::fol::{Clause, ClauseStore, Colour, Context, Rule};
use crate::generating::{
    BinaryResolution, EqualityFactoring, EqualityResolution, Factoring, Superposition,
};
use crate::index::IndexManager;
use crate::proof::Proof;
use crate::selection::{selector_for, LiteralSelector};
use crate::simplifying::{
    BackwardDemodulation, BackwardSubsumption, DuplicateLiteralRemoval, ForwardDemodulation,
    ForwardSubsumption, TautologyDeletion, TrivialInequalityRemoval,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a saturation run.
#[derive(Debug)]
pub enum SaturationResult {
    /// The empty clause was derived
    Refutation(Proof),
    /// Passive drained under a complete strategy
    Satisfiable,
    /// Passive drained, but the strategy is incomplete
    Unknown,
    TimeLimit,
    MemoryLimit,
}

pub struct SaturationDriver {
    strategy: Strategy,
    pub ctx: Context,
    arena: ClauseArena,
    unprocessed: UnprocessedQueue,
    passive: PassiveQueue,
    active: ActiveSet,
    indices: IndexManager,
    immediate: Vec<Box<dyn ImmediateSimplifier>>,
    forward: Vec<Box<dyn ForwardSimplifier>>,
    backward: Vec<Box<dyn BackwardSimplifier>>,
    generators: Vec<Box<dyn Generator>>,
    selector: Box<dyn LiteralSelector>,
    events: EventLog,
    stats: Statistics,
    start: Instant,
    baseline_rss_mb: usize,
    /// Activation counter; doubles as the age of derived clauses
    iteration: u32,
    budget_tick: u32,
    /// Set to true to stop the loop at the next safe point
    pub cancel: Arc<AtomicBool>,
}

impl SaturationDriver {
    /// Build a driver for one problem. The strategy is validated here;
    /// nothing is checked inside the loop.
    pub fn new(
        input: Vec<Clause>,
        strategy: Strategy,
        ctx: Context,
    ) -> Result<Self, StrategyError> {
        strategy.validate()?;

        let mut indices = IndexManager::new();

        let immediate: Vec<Box<dyn ImmediateSimplifier>> = strategy
            .immediate_simplifiers
            .iter()
            .map(|kind| -> Box<dyn ImmediateSimplifier> {
                match kind {
                    ImmediateKind::DuplicateLiteralRemoval => Box::new(DuplicateLiteralRemoval),
                    ImmediateKind::TrivialInequalityRemoval => Box::new(TrivialInequalityRemoval),
                    ImmediateKind::TautologyDeletion => Box::new(TautologyDeletion),
                }
            })
            .collect();

        let mut forward: Vec<Box<dyn ForwardSimplifier>> = Vec::new();
        for kind in &strategy.forward_simplifiers {
            match kind {
                ForwardKind::Subsumption => {
                    let mut engine = ForwardSubsumption;
                    engine.attach(&mut indices);
                    forward.push(Box::new(engine));
                }
                ForwardKind::Demodulation => {
                    if strategy.forward_demodulation != DemodulationMode::Off {
                        let mut engine = ForwardDemodulation::new(
                            strategy.forward_demodulation,
                            strategy.demodulation_redundancy_check,
                        );
                        engine.attach(&mut indices);
                        forward.push(Box::new(engine));
                    }
                }
            }
        }

        let mut backward: Vec<Box<dyn BackwardSimplifier>> = Vec::new();
        for kind in &strategy.backward_simplifiers {
            match kind {
                BackwardKind::Subsumption => {
                    let mut engine = BackwardSubsumption;
                    engine.attach(&mut indices);
                    backward.push(Box::new(engine));
                }
                BackwardKind::Demodulation => {
                    if strategy.backward_demodulation != DemodulationMode::Off {
                        let mut engine = BackwardDemodulation::new(strategy.backward_demodulation);
                        engine.attach(&mut indices);
                        backward.push(Box::new(engine));
                    }
                }
            }
        }

        let mut generators: Vec<Box<dyn Generator>> = Vec::new();
        for kind in &strategy.generators {
            let mut engine: Box<dyn Generator> = match kind {
                GeneratorKind::BinaryResolution => Box::new(BinaryResolution),
                GeneratorKind::Factoring => Box::new(Factoring),
                GeneratorKind::EqualityResolution => Box::new(EqualityResolution),
                GeneratorKind::EqualityFactoring => Box::new(EqualityFactoring),
                GeneratorKind::Superposition => Box::new(Superposition),
            };
            engine.attach(&mut indices);
            generators.push(engine);
        }

        let selector = selector_for(strategy.literal_selection);
        let ratio = strategy.age_weight_ratio;

        let mut driver = SaturationDriver {
            strategy,
            ctx,
            arena: ClauseArena::new(),
            unprocessed: UnprocessedQueue::new(),
            passive: PassiveQueue::new(ratio),
            active: ActiveSet::new(),
            indices,
            immediate,
            forward,
            backward,
            generators,
            selector,
            events: EventLog::new(),
            stats: Statistics::default(),
            start: Instant::now(),
            baseline_rss_mb: process_memory_mb().unwrap_or(0),
            iteration: 0,
            budget_tick: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        };

        driver.stats.initial_clauses = input.len();
        for mut clause in input {
            driver.ctx.normalize_clause(&mut clause);
            let id = driver.record_clause(clause);
            driver.unprocessed.add(id, &mut driver.events);
            driver.arena.get_mut(id).store = ClauseStore::Unprocessed;
        }

        Ok(driver)
    }

    /// Run to completion.
    pub fn run(&mut self) -> SaturationResult {
        self.start = Instant::now();
        let result = loop {
            if let Some(result) = self.step() {
                break result;
            }
        };
        self.stats.final_active = self.active.len();
        self.stats.final_passive = self.passive.len();
        self.stats.final_unprocessed = self.unprocessed.len();
        self.stats.set_elapsed(self.start.elapsed());
        result
    }

    /// One step of the loop; `Some` means the run is over.
    pub fn step(&mut self) -> Option<SaturationResult> {
        if let Some(result) = self.check_budget() {
            return Some(result);
        }

        // Step 1: one clause out of Unprocessed, through the immediate
        // chain, into Passive.
        if let Some(id) = self.unprocessed.pop_selected(&mut self.events) {
            self.arena.get_mut(id).store = ClauseStore::None;
            let Some(kept) = self.immediate_simplify(id) else {
                return None;
            };
            if self.arena.get(kept).is_empty() {
                return Some(SaturationResult::Refutation(Proof::extract(&self.arena, kept)));
            }
            let (age, weight) = {
                let clause = self.arena.get(kept);
                (clause.age, clause.weight)
            };
            self.passive.add(kept, age, weight, &mut self.events);
            self.arena.get_mut(kept).store = ClauseStore::Passive;
            return None;
        }

        // Steps 2-3: select the given clause, or conclude.
        let Some(selected) = self.passive.pop_selected(&mut self.events) else {
            return Some(
                if self.selector.preserves_completeness() && self.strategy.has_complete_generators()
                {
                    SaturationResult::Satisfiable
                } else {
                    SaturationResult::Unknown
                },
            );
        };
        self.arena.get_mut(selected).store = ClauseStore::None;

        // Step 4: forward simplification, restarting the chain on each
        // replacement until a fixed point.
        let mut given = selected;
        'forward: loop {
            for i in 0..self.forward.len() {
                let outcome = self.forward[i].perform(
                    self.arena.get(given),
                    &self.arena,
                    &mut self.ctx,
                    &self.indices,
                );
                let Some(simp) = outcome else { continue };

                self.stats.forward_simplified += 1;
                match simp.rule {
                    Rule::ForwardDemodulation => {
                        self.stats.forward_demodulations += 1;
                        if simp.replacement.is_none() {
                            self.stats.forward_demodulations_to_eq_taut += 1;
                        }
                    }
                    Rule::ForwardSubsumption => self.stats.forward_subsumed += 1,
                    _ => {}
                }

                match simp.replacement {
                    Some(mut replacement) => {
                        self.ctx.normalize_clause(&mut replacement);
                        replacement.age = self.arena.get(given).age;
                        replacement.colour = self.colour_of_parents(&replacement.derivation.parents);
                        let new_id = self.record_clause(replacement);
                        self.events.push(ClauseEvent::Simplified {
                            clause: given,
                            replacement: Some(new_id),
                            rule: simp.rule,
                            premises: simp.premises,
                        });
                        self.arena.get_mut(given).store = ClauseStore::Rewritten;
                        given = new_id;
                        continue 'forward;
                    }
                    None => {
                        self.events.push(ClauseEvent::Simplified {
                            clause: given,
                            replacement: None,
                            rule: simp.rule,
                            premises: simp.premises,
                        });
                        self.arena.get_mut(given).store = ClauseStore::None;
                        return None;
                    }
                }
            }
            break;
        }

        // Step 5: refutation?
        if self.arena.get(given).is_empty() {
            return Some(SaturationResult::Refutation(Proof::extract(&self.arena, given)));
        }

        self.iteration += 1;
        self.stats.activations += 1;
        if self.strategy.max_activations > 0
            && self.stats.activations as usize > self.strategy.max_activations
        {
            return Some(SaturationResult::TimeLimit);
        }

        // Step 6: backward simplification by the given clause.
        for i in 0..self.backward.len() {
            let simps =
                self.backward[i].perform(given, &self.arena, &mut self.ctx, &self.indices);
            for simp in simps {
                self.apply_backward(simp);
            }
        }

        // Step 7: activate and index.
        let selected_literals = self.selector.select(self.arena.get(given), &self.ctx);
        {
            let clause = self.arena.get_mut(given);
            clause.selected = selected_literals;
            clause.store = ClauseStore::Active;
        }
        self.active.add(given, &mut self.events);
        self.indices
            .insert_clause(&mut self.ctx, given, self.arena.get(given));

        // Step 8: generate.
        let mut conclusions: Vec<Clause> = Vec::new();
        for i in 0..self.generators.len() {
            conclusions.extend(self.generators[i].generate(
                given,
                &self.arena,
                &mut self.ctx,
                &self.indices,
            ));
        }

        for mut conclusion in conclusions {
            self.stats.record_generated(conclusion.derivation.rule.name());
            self.ctx.normalize_clause(&mut conclusion);
            conclusion.age = self.iteration;
            conclusion.colour = self.colour_of_parents(&conclusion.derivation.parents);
            let id = self.record_clause(conclusion);
            if self.arena.get(id).is_empty() {
                return Some(SaturationResult::Refutation(Proof::extract(&self.arena, id)));
            }
            self.unprocessed.add(id, &mut self.events);
            self.arena.get_mut(id).store = ClauseStore::Unprocessed;

            if self.strategy.max_clauses > 0 && self.arena.len() >= self.strategy.max_clauses {
                return Some(SaturationResult::MemoryLimit);
            }
        }

        None
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn arena(&self) -> &ClauseArena {
        &self.arena
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn active_ids(&self) -> Vec<usize> {
        self.active.iter().copied().collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Store a clause and record its derivation event.
    fn record_clause(&mut self, clause: Clause) -> usize {
        let rule = clause.derivation.rule;
        let parents = clause.derivation.parents.clone();
        let id = self.arena.add(clause);
        self.events.push(ClauseEvent::Derived { clause: id, rule, parents });
        id
    }

    /// Run the immediate chain to a fixed point. Returns the surviving
    /// clause id, or None when the clause was discarded as redundant.
    fn immediate_simplify(&mut self, id: usize) -> Option<usize> {
        let mut current = id;
        loop {
            let mut changed = false;
            for i in 0..self.immediate.len() {
                let clause = self.arena.get(current).clone();
                match self.immediate[i].simplify(clause, &self.ctx) {
                    Simplified::Unchanged(_) => {}
                    Simplified::Replaced(mut replacement) => {
                        self.ctx.normalize_clause(&mut replacement);
                        replacement.age = self.arena.get(current).age;
                        replacement.colour = self.arena.get(current).colour;
                        let rule = self.immediate[i].rule();
                        let new_id = self.record_clause(replacement);
                        self.events.push(ClauseEvent::Simplified {
                            clause: current,
                            replacement: Some(new_id),
                            rule,
                            premises: vec![],
                        });
                        self.arena.get_mut(current).store = ClauseStore::Rewritten;
                        current = new_id;
                        changed = true;
                    }
                    Simplified::Redundant => {
                        self.stats.immediate_discards += 1;
                        self.events.push(ClauseEvent::Simplified {
                            clause: current,
                            replacement: None,
                            rule: self.immediate[i].rule(),
                            premises: vec![],
                        });
                        self.arena.get_mut(current).store = ClauseStore::None;
                        return None;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        Some(current)
    }

    /// Remove one backward-simplification victim and enqueue its
    /// replacement. Victims already removed this round are skipped.
    fn apply_backward(&mut self, simp: BwSimplification) {
        let victim = simp.victim;
        let removed = match self.arena.get(victim).store {
            ClauseStore::Active => {
                self.active.remove(victim, &mut self.events);
                let clause = self.arena.get(victim).clone();
                self.indices.remove_clause(&mut self.ctx, victim, &clause);
                true
            }
            ClauseStore::Passive => self.passive.remove(victim, &mut self.events),
            _ => false,
        };
        if !removed {
            return;
        }
        self.stats.backward_simplified += 1;

        let replacement_id = simp.replacement.map(|mut replacement| {
            self.ctx.normalize_clause(&mut replacement);
            replacement.age = self.arena.get(victim).age;
            replacement.colour = self.colour_of_parents(&replacement.derivation.parents);
            let id = self.record_clause(replacement);
            self.unprocessed.add(id, &mut self.events);
            self.arena.get_mut(id).store = ClauseStore::Unprocessed;
            id
        });

        self.events.push(ClauseEvent::Simplified {
            clause: victim,
            replacement: replacement_id,
            rule: simp.rule,
            premises: simp.premises,
        });
        self.arena.get_mut(victim).store = if replacement_id.is_some() {
            ClauseStore::Rewritten
        } else {
            ClauseStore::None
        };
    }

    /// Conclusions inherit the first non-transparent parent colour; the
    /// rules have already checked compatibility.
    fn colour_of_parents(&self, parents: &[usize]) -> Colour {
        parents
            .iter()
            .map(|&p| self.arena.get(p).colour)
            .find(|&c| c != Colour::Transparent)
            .unwrap_or(Colour::Transparent)
    }

    fn check_budget(&mut self) -> Option<SaturationResult> {
        if self.cancel.load(Ordering::Relaxed) {
            return Some(SaturationResult::TimeLimit);
        }
        if self.start.elapsed() > self.strategy.time_limit {
            return Some(SaturationResult::TimeLimit);
        }
        self.budget_tick = self.budget_tick.wrapping_add(1);
        // Amortize the /proc read
        if self.budget_tick % 64 == 0 {
            if let Some(limit) = self.strategy.memory_limit_mb {
                if let Some(rss) = process_memory_mb() {
                    if rss.saturating_sub(self.baseline_rss_mb) >= limit {
                        return Some(SaturationResult::MemoryLimit);
                    }
                }
            }
        }
        None
    }

    /// Check the store-tag and index-coherence invariants. Test support;
    /// a violation here is a driver bug, never a user error.
    pub fn verify_invariants(&mut self) -> Result<(), String> {
        for id in 0..self.arena.len() {
            let store = self.arena.get(id).store;
            let in_unprocessed = self.unprocessed.contains(id);
            let in_passive = self.passive.contains(id);
            let in_active = self.active.contains(id);

            let expected = match store {
                ClauseStore::Unprocessed => (true, false, false),
                ClauseStore::Passive => (false, true, false),
                ClauseStore::Active => (false, false, true),
                ClauseStore::Rewritten | ClauseStore::None => (false, false, false),
            };
            if (in_unprocessed, in_passive, in_active) != expected {
                return Err(format!(
                    "clause {} tagged {:?} but containment is (U:{}, P:{}, A:{})",
                    id, store, in_unprocessed, in_passive, in_active
                ));
            }
        }

        // Every index entry must belong to an Active clause, and every
        // Active clause must have exactly its computed entries.
        for kind in [
            crate::index::IndexKind::DemodulationLhs,
            crate::index::IndexKind::SuperpositionLhs,
            crate::index::IndexKind::SuperpositionSubterms,
            crate::index::IndexKind::ActiveLiterals,
            crate::index::IndexKind::RewritableSubterms,
        ] {
            let Some(tree) = self.indices.get(kind) else { continue };
            for entry in tree.all_entries() {
                if self.arena.get(entry.clause).store != ClauseStore::Active {
                    return Err(format!(
                        "{:?} holds an entry for non-active clause {}",
                        kind, entry.clause
                    ));
                }
            }
        }

        for id in self.active_ids() {
            let clause = self.arena.get(id).clone();
            let expected = self.indices.entry_count(&mut self.ctx, id, &clause);
            let mut found = 0;
            for kind in [
                crate::index::IndexKind::DemodulationLhs,
                crate::index::IndexKind::SuperpositionLhs,
                crate::index::IndexKind::SuperpositionSubterms,
                crate::index::IndexKind::ActiveLiterals,
                crate::index::IndexKind::RewritableSubterms,
            ] {
                if let Some(tree) = self.indices.get(kind) {
                    found += tree.all_entries().iter().filter(|e| e.clause == id).count();
                }
            }
            if found != expected {
                return Err(format!(
                    "active clause {} has {} index entries, expected {}",
                    id, found, expected
                ));
            }
        }

        Ok(())
    }
}

impl Drop for SaturationDriver {
    /// Pair every engine's `attach` with its `release`.
    fn drop(&mut self) {
        for engine in &mut self.forward {
            engine.detach(&mut self.indices);
        }
        for engine in &mut self.backward {
            engine.detach(&mut self.indices);
        }
        for engine in &mut self.generators {
            engine.detach(&mut self.indices);
        }
    }
}

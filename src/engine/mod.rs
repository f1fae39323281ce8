//! Inference engine framework
//!
//! Four narrow capability roles, composed into ordered chains by the
//! driver. An engine implements exactly the roles it advertises:
//!
//! - immediate simplification runs once when a clause enters the loop and
//!   never consults the search state;
//! - forward simplification may consult Active through the indices and
//!   replaces or deletes the candidate clause;
//! - backward simplification removes Active/Passive clauses made redundant
//!   by a newly activated clause;
//! - generation derives new clauses from the given clause and Active.
//!
//! Engines acquire the indices they need in `attach` and release them in
//! `detach`; each `request` is paired with exactly one `release` over the
//! engine's attached lifetime.

use crate::fol::{Clause, Context, Rule};
use crate::index::IndexManager;
use crate::saturation::arena::ClauseArena;

/// Outcome of an immediate simplification step.
#[derive(Debug)]
pub enum Simplified {
    /// The clause was not touched
    Unchanged(Clause),
    /// The clause was replaced by an entailed, subsuming clause
    Replaced(Clause),
    /// The clause is redundant (e.g. a tautology) and is discarded
    Redundant,
}

/// Result of a successful forward simplification: the replacement (None
/// means plain deletion) and the Active premises used, for proof
/// accounting. The replacement must be entailed by the clause together
/// with the premises.
#[derive(Debug)]
pub struct FwSimplification {
    pub rule: Rule,
    pub replacement: Option<Clause>,
    pub premises: Vec<usize>,
}

/// One victim of a backward simplification: a clause currently in Active
/// or Passive that is removed, with an optional replacement to re-enter
/// the loop through Unprocessed.
#[derive(Debug)]
pub struct BwSimplification {
    pub rule: Rule,
    pub victim: usize,
    pub replacement: Option<Clause>,
    pub premises: Vec<usize>,
}

/// Simplification applied once on entry to the loop. Must be sound and
/// idempotent; does not consult the search state.
pub trait ImmediateSimplifier {
    fn name(&self) -> &'static str;

    /// The rule recorded when this simplifier discards or replaces a clause.
    fn rule(&self) -> Rule;

    fn simplify(&self, clause: Clause, ctx: &Context) -> Simplified;
}

/// Simplification of a candidate clause by the Active set.
pub trait ForwardSimplifier {
    fn name(&self) -> &'static str;

    fn attach(&mut self, _indices: &mut IndexManager) {}
    fn detach(&mut self, _indices: &mut IndexManager) {}

    /// Try to simplify `clause`. `Some` means the clause is replaced (or
    /// deleted, when the replacement is None); `None` means no change.
    fn perform(
        &self,
        clause: &Clause,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Option<FwSimplification>;
}

/// Simplification of Active/Passive clauses by a newly activated clause.
pub trait BackwardSimplifier {
    fn name(&self) -> &'static str;

    fn attach(&mut self, _indices: &mut IndexManager) {}
    fn detach(&mut self, _indices: &mut IndexManager) {}

    fn perform(
        &self,
        activated: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Vec<BwSimplification>;
}

/// Generating inference: new clauses from the given clause and Active.
pub trait Generator {
    fn name(&self) -> &'static str;

    fn attach(&mut self, _indices: &mut IndexManager) {}
    fn detach(&mut self, _indices: &mut IndexManager) {}

    fn generate(
        &self,
        given: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Vec<Clause>;
}

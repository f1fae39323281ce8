//! Term indexing for the saturation loop
//!
//! Indices are owned by an `IndexManager` and identified by `IndexKind`.
//! Engines acquire the indices they need with `request` in `attach` and
//! give them back with `release` in `detach`; an index is built lazily on
//! its first request and destroyed when its refcount reaches zero.
//!
//! The driver routes Active-container transitions to every live index, so
//! a clause has index entries exactly while its store tag is Active.

pub mod literal_index;
pub mod subst_tree;

pub use literal_index::{atom_key, complement_key, literal_key};
pub use subst_tree::{LeafEntry, Retrieval, RetrievalMode, SubstitutionTree};

use crate::fol::{Clause, Context, TermData, TermId, TermOrdering};
use indexmap::IndexSet;
use std::collections::HashMap;

/// The indices an engine can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Rewriting sides of unit positive equalities (forward demodulation)
    DemodulationLhs,
    /// Positive-equality sides of selected literals (superposition "from")
    SuperpositionLhs,
    /// Non-variable subterms of selected literals (superposition "into")
    SuperpositionSubterms,
    /// All literals, literal-keyed (resolution, subsumption)
    ActiveLiterals,
    /// Non-variable subterms of all literals (backward demodulation)
    RewritableSubterms,
}

struct IndexSlot {
    tree: SubstitutionTree,
    refcount: usize,
}

/// Owner of all indices, keyed by kind and refcounted.
#[derive(Default)]
pub struct IndexManager {
    slots: HashMap<IndexKind, IndexSlot>,
}

impl IndexManager {
    pub fn new() -> Self {
        IndexManager::default()
    }

    /// Acquire the index of the given kind, creating it on first request.
    /// Must be paired with exactly one `release` per caller.
    pub fn request(&mut self, kind: IndexKind) {
        let slot = self.slots.entry(kind).or_insert_with(|| IndexSlot {
            tree: SubstitutionTree::new(),
            refcount: 0,
        });
        slot.refcount += 1;
    }

    /// Give back an index acquired with `request`; the index is destroyed
    /// when its last holder releases it.
    pub fn release(&mut self, kind: IndexKind) {
        let slot = self
            .slots
            .get_mut(&kind)
            .expect("release without matching request");
        debug_assert!(slot.refcount > 0);
        slot.refcount -= 1;
        if slot.refcount == 0 {
            self.slots.remove(&kind);
        }
    }

    /// The index of the given kind, if any engine holds it.
    pub fn get(&self, kind: IndexKind) -> Option<&SubstitutionTree> {
        self.slots.get(&kind).map(|s| &s.tree)
    }

    pub fn refcount(&self, kind: IndexKind) -> usize {
        self.slots.get(&kind).map_or(0, |s| s.refcount)
    }

    /// Insert a newly activated clause into every live index.
    pub fn insert_clause(&mut self, ctx: &mut Context, id: usize, clause: &Clause) {
        let kinds: Vec<IndexKind> = self.slots.keys().copied().collect();
        for kind in kinds {
            for entry in entries_for(kind, ctx, id, clause) {
                self.slots
                    .get_mut(&kind)
                    .unwrap()
                    .tree
                    .insert(&ctx.bank, entry);
            }
        }
    }

    /// Remove a deactivated clause from every live index. Entry sets are
    /// recomputed; they only depend on the clause, which is immutable while
    /// Active.
    pub fn remove_clause(&mut self, ctx: &mut Context, id: usize, clause: &Clause) {
        let kinds: Vec<IndexKind> = self.slots.keys().copied().collect();
        for kind in kinds {
            for entry in entries_for(kind, ctx, id, clause) {
                let removed = self.slots.get_mut(&kind).unwrap().tree.remove(
                    &ctx.bank,
                    entry.term,
                    entry.clause,
                    entry.literal,
                );
                debug_assert!(removed, "index entry missing on removal");
            }
        }
    }

    /// Total number of entries a clause has across all live indices.
    pub fn entry_count(&self, ctx: &mut Context, id: usize, clause: &Clause) -> usize {
        self.slots
            .keys()
            .copied()
            .collect::<Vec<_>>()
            .into_iter()
            .map(|kind| entries_for(kind, ctx, id, clause).len())
            .sum()
    }
}

/// The index entries a clause contributes to one index kind.
fn entries_for(kind: IndexKind, ctx: &mut Context, id: usize, clause: &Clause) -> Vec<LeafEntry> {
    match kind {
        IndexKind::DemodulationLhs => demodulation_sides(ctx, id, clause),
        IndexKind::SuperpositionLhs => superposition_sides(ctx, id, clause),
        IndexKind::SuperpositionSubterms => subterm_entries(ctx, id, clause, true),
        IndexKind::RewritableSubterms => subterm_entries(ctx, id, clause, false),
        IndexKind::ActiveLiterals => clause
            .literals
            .iter()
            .enumerate()
            .map(|(li, lit)| LeafEntry {
                clause: id,
                literal: li,
                term: literal_key(ctx, lit),
            })
            .collect(),
    }
}

/// Rewriting sides of a unit positive equality. The oriented (greater)
/// side alone when the equality is preordered; both sides when the sides
/// are incomparable. Variable sides are never inserted: a variable cannot
/// be greater than its instance's image under any simplification ordering.
fn demodulation_sides(ctx: &mut Context, id: usize, clause: &Clause) -> Vec<LeafEntry> {
    if !clause.is_unit_equality(&ctx.syms) {
        return vec![];
    }
    let lit = &clause.literals[0];
    let mut sides: Vec<TermId> = Vec::new();
    if lit.oriented {
        sides.push(lit.args[0]);
    } else {
        sides.push(lit.args[0]);
        sides.push(lit.args[1]);
    }
    sides
        .into_iter()
        .filter(|&s| !matches!(ctx.bank.data(s), TermData::Variable(_)))
        .map(|term| LeafEntry {
            clause: id,
            literal: 0,
            term,
        })
        .collect()
}

/// Sides of positive equalities among the selected literals that may act
/// as the "from" side of a superposition: non-variable and not known to be
/// the smaller side.
fn superposition_sides(ctx: &mut Context, id: usize, clause: &Clause) -> Vec<LeafEntry> {
    let mut entries = Vec::new();
    for &li in &clause.selected {
        let lit = &clause.literals[li];
        if !lit.is_positive_equality(&ctx.syms) {
            continue;
        }
        let keep_right = !lit.oriented
            && ctx
                .ordering
                .compare(&ctx.bank, lit.args[0], lit.args[1])
                != TermOrdering::Equal;
        let mut sides = vec![lit.args[0]];
        if keep_right {
            sides.push(lit.args[1]);
        }
        for side in sides {
            if matches!(ctx.bank.data(side), TermData::Variable(_)) {
                continue;
            }
            entries.push(LeafEntry {
                clause: id,
                literal: li,
                term: side,
            });
        }
    }
    entries
}

/// Non-variable subterms, one entry per distinct (literal, subterm) pair.
/// `selected_only` restricts to the selection mask (superposition) as
/// opposed to all literals (backward demodulation).
fn subterm_entries(
    ctx: &mut Context,
    id: usize,
    clause: &Clause,
    selected_only: bool,
) -> Vec<LeafEntry> {
    let mut entries = Vec::new();
    let literal_indices: Vec<usize> = if selected_only {
        clause.selected.clone()
    } else {
        (0..clause.literals.len()).collect()
    };

    for li in literal_indices {
        let lit = &clause.literals[li];
        let mut seen: IndexSet<TermId> = IndexSet::new();
        for &arg in &lit.args {
            let mut it = ctx.bank.subterms(arg);
            while let Some(t) = it.next() {
                if matches!(ctx.bank.data(t), TermData::Variable(_)) {
                    continue;
                }
                seen.insert(t);
            }
        }
        for term in seen {
            entries.push(LeafEntry {
                clause: id,
                literal: li,
                term,
            });
        }
    }
    entries
}

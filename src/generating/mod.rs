//! Generating inference rules
//!
//! The five rules of the superposition calculus with equality: binary
//! resolution, factoring, equality resolution, equality factoring, and
//! superposition. Partners come from the Active indices; conclusions are
//! built with the two-bank substitution, the given clause on the `QUERY`
//! bank and retrieved clauses on the `RESULT` bank.

pub mod equality_factoring;
pub mod equality_resolution;
pub mod factoring;
pub mod resolution;
pub mod superposition;

pub use equality_factoring::EqualityFactoring;
pub use equality_resolution::EqualityResolution;
pub use factoring::Factoring;
pub use resolution::BinaryResolution;
pub use superposition::Superposition;

use crate::fol::{
    Bank, BankVar, Clause, Context, Literal, Substitution, TermOrdering, VariableId,
};
use std::collections::HashMap;

/// Substitute into a literal, renaming stray non-query variables through
/// the shared per-conclusion map.
pub(crate) fn apply_literal(
    subst: &Substitution,
    ctx: &mut Context,
    lit: &Literal,
    bank: Bank,
    renaming: &mut HashMap<BankVar, VariableId>,
) -> Literal {
    let Context { syms, bank: terms, .. } = ctx;
    Literal {
        predicate: lit.predicate,
        args: lit
            .args
            .iter()
            .map(|&a| subst.apply_renamed(terms, syms, a, bank, renaming))
            .collect(),
        polarity: lit.polarity,
        oriented: false,
    }
}

/// Substituted side literals of a clause, skipping `exclude`.
pub(crate) fn collect_literals_except(
    subst: &Substitution,
    ctx: &mut Context,
    clause: &Clause,
    exclude: &[usize],
    bank: Bank,
    renaming: &mut HashMap<BankVar, VariableId>,
) -> Vec<Literal> {
    clause
        .literals
        .iter()
        .enumerate()
        .filter(|(i, _)| !exclude.contains(i))
        .map(|(_, lit)| apply_literal(subst, ctx, lit, bank, renaming))
        .collect()
}

/// Drop repeated literals, keeping first occurrences.
pub(crate) fn dedup_literals(literals: Vec<Literal>) -> Vec<Literal> {
    let mut out: Vec<Literal> = Vec::with_capacity(literals.len());
    for lit in literals {
        if !out.contains(&lit) {
            out.push(lit);
        }
    }
    out
}

/// The "not smaller" ordering gate of the calculus: rewriting may proceed
/// when the instantiated left side is greater than or incomparable with
/// the right one.
pub(crate) fn not_smaller(ctx: &Context, s: crate::fol::TermId, t: crate::fol::TermId) -> bool {
    matches!(
        ctx.ordering.compare(&ctx.bank, s, t),
        TermOrdering::Greater | TermOrdering::Incomparable
    )
}

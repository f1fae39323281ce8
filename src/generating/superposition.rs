//! Superposition
//!
//! From `l = r | C` and `L[l'] | D` with `σ = mgu(l, l')`, `l'` not a
//! variable, and `σl` not smaller than `σr`, derive
//! `σ(L[r] | C | D)`. When `L` is itself an equality, the rewritten side
//! must additionally not be smaller than the other side under `σ`.
//!
//! Both directions run for every given clause: the given clause's
//! equalities rewrite into Active clauses (partners from the
//! `SuperpositionSubterms` index), and Active equalities rewrite into the
//! given clause (partners from the `SuperpositionLhs` index). The given
//! clause is indexed before generation, so self-overlaps come out of the
//! first direction.

use super::{collect_literals_except, dedup_literals, not_smaller};
use crate::engine::Generator;
use crate::fol::{
    Bank, BankVar, Clause, Colour, Context, Derivation, Literal, Rule, Substitution, TermData,
    TermId, VariableId, QUERY, RESULT,
};
use crate::index::{IndexKind, IndexManager};
use crate::saturation::arena::ClauseArena;
use std::collections::HashMap;

pub struct Superposition;

/// Non-variable subterms of a literal, each with the path that reaches it
/// (`path[0]` is the argument index).
fn subterm_positions(ctx: &Context, lit: &Literal) -> Vec<(Vec<usize>, TermId)> {
    let mut out = Vec::new();
    for (i, &arg) in lit.args.iter().enumerate() {
        collect_positions(ctx, arg, vec![i], &mut out);
    }
    out
}

fn collect_positions(ctx: &Context, term: TermId, path: Vec<usize>, out: &mut Vec<(Vec<usize>, TermId)>) {
    match ctx.bank.data(term) {
        TermData::Variable(_) => {}
        TermData::Constant(_) => out.push((path, term)),
        TermData::Function(_, args) => {
            let args = args.clone();
            out.push((path.clone(), term));
            for (i, a) in args.into_iter().enumerate() {
                let mut child = path.clone();
                child.push(i);
                collect_positions(ctx, a, child, out);
            }
        }
    }
}

/// σ-image of `term` with the subterm at `path` replaced by
/// `replacement` (already materialised).
fn apply_replacing_at(
    subst: &Substitution,
    ctx: &mut Context,
    term: TermId,
    bank: Bank,
    path: &[usize],
    replacement: TermId,
    renaming: &mut HashMap<BankVar, VariableId>,
) -> TermId {
    if path.is_empty() {
        return replacement;
    }
    match ctx.bank.data(term).clone() {
        TermData::Function(f, args) => {
            let new_args: Vec<TermId> = args
                .iter()
                .enumerate()
                .map(|(i, &a)| {
                    if i == path[0] {
                        apply_replacing_at(subst, ctx, a, bank, &path[1..], replacement, renaming)
                    } else {
                        let Context { syms, bank: terms, .. } = &mut *ctx;
                        subst.apply_renamed(terms, syms, a, bank, renaming)
                    }
                })
                .collect();
            ctx.bank.function(f, new_args)
        }
        _ => unreachable!("rewrite path leads through a non-function term"),
    }
}

/// σ-image of a literal with the subterm at `path` replaced.
fn literal_replacing_at(
    subst: &Substitution,
    ctx: &mut Context,
    lit: &Literal,
    bank: Bank,
    path: &[usize],
    replacement: TermId,
    renaming: &mut HashMap<BankVar, VariableId>,
) -> Literal {
    let args: Vec<TermId> = lit
        .args
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            if i == path[0] {
                apply_replacing_at(subst, ctx, a, bank, &path[1..], replacement, renaming)
            } else {
                let Context { syms, bank: terms, .. } = &mut *ctx;
                subst.apply_renamed(terms, syms, a, bank, renaming)
            }
        })
        .collect();
    Literal {
        predicate: lit.predicate,
        args,
        polarity: lit.polarity,
        oriented: false,
    }
}

/// Rewriting sides of a positive equality: the greater side when oriented,
/// both otherwise; variable sides are excluded.
fn rewrite_sides(ctx: &Context, lit: &Literal) -> Vec<(TermId, TermId)> {
    let mut sides = vec![(lit.args[0], lit.args[1])];
    if !lit.oriented {
        sides.push((lit.args[1], lit.args[0]));
    }
    sides
        .into_iter()
        .filter(|&(l, _)| !matches!(ctx.bank.data(l), TermData::Variable(_)))
        .collect()
}

/// When rewriting inside an equality literal, the rewritten side must not
/// come out smaller than the other side.
fn equality_side_ok(
    subst: &Substitution,
    ctx: &mut Context,
    lit: &Literal,
    bank: Bank,
    path: &[usize],
    renaming: &mut HashMap<BankVar, VariableId>,
) -> bool {
    if !lit.is_equality(&ctx.syms) {
        return true;
    }
    let this = lit.args[path[0]];
    let other = lit.args[1 - path[0]];
    let (this_s, other_s) = {
        let Context { syms, bank: terms, .. } = &mut *ctx;
        (
            subst.apply_renamed(terms, syms, this, bank, renaming),
            subst.apply_renamed(terms, syms, other, bank, renaming),
        )
    };
    not_smaller(ctx, this_s, other_s)
}

impl Generator for Superposition {
    fn name(&self) -> &'static str {
        "Superposition"
    }

    fn attach(&mut self, indices: &mut IndexManager) {
        indices.request(IndexKind::SuperpositionLhs);
        indices.request(IndexKind::SuperpositionSubterms);
    }

    fn detach(&mut self, indices: &mut IndexManager) {
        indices.release(IndexKind::SuperpositionLhs);
        indices.release(IndexKind::SuperpositionSubterms);
    }

    fn generate(
        &self,
        given: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
    ) -> Vec<Clause> {
        let mut results = Vec::new();
        self.from_given(given, arena, ctx, indices, &mut results);
        self.into_given(given, arena, ctx, indices, &mut results);
        results
    }
}

impl Superposition {
    /// The given clause's equalities rewrite into Active clauses.
    fn from_given(
        &self,
        given: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
        results: &mut Vec<Clause>,
    ) {
        let Some(index) = indices.get(IndexKind::SuperpositionSubterms) else {
            return;
        };
        let clause = arena.get(given);

        for &li in &clause.selected {
            let lit = clause.literals[li].clone();
            if !lit.is_positive_equality(&ctx.syms) {
                continue;
            }

            for (l, r) in rewrite_sides(ctx, &lit) {
                let mut retrieval = index.unifications(&ctx.bank, l);
                while let Some((entry, subst)) = retrieval.next(&ctx.bank) {
                    let partner = arena.get(entry.clause);
                    if !Colour::compatible(clause.colour, partner.colour) {
                        continue;
                    }
                    let subst = subst.clone();
                    let target_lit = partner.literals[entry.literal].clone();

                    // One inference per occurrence of the unified subterm
                    let positions: Vec<Vec<usize>> = subterm_positions(ctx, &target_lit)
                        .into_iter()
                        .filter(|(_, t)| *t == entry.term)
                        .map(|(p, _)| p)
                        .collect();

                    for path in positions {
                        let mut renaming = HashMap::new();
                        let (l_s, r_s) = {
                            let Context { syms, bank, .. } = &mut *ctx;
                            (
                                subst.apply_renamed(bank, syms, l, QUERY, &mut renaming),
                                subst.apply_renamed(bank, syms, r, QUERY, &mut renaming),
                            )
                        };
                        if !not_smaller(ctx, l_s, r_s) {
                            continue;
                        }
                        if !equality_side_ok(&subst, ctx, &target_lit, RESULT, &path, &mut renaming)
                        {
                            continue;
                        }

                        let rewritten = literal_replacing_at(
                            &subst,
                            ctx,
                            &target_lit,
                            RESULT,
                            &path,
                            r_s,
                            &mut renaming,
                        );

                        let mut literals = vec![rewritten];
                        literals.extend(collect_literals_except(
                            &subst,
                            ctx,
                            partner,
                            &[entry.literal],
                            RESULT,
                            &mut renaming,
                        ));
                        literals.extend(collect_literals_except(
                            &subst,
                            ctx,
                            clause,
                            &[li],
                            QUERY,
                            &mut renaming,
                        ));
                        let literals = dedup_literals(literals);

                        results.push(Clause::derived(
                            literals,
                            &ctx.bank,
                            Derivation::new(Rule::Superposition, vec![entry.clause, given]),
                        ));
                    }
                }
            }
        }
    }

    /// Active equalities rewrite into the given clause.
    fn into_given(
        &self,
        given: usize,
        arena: &ClauseArena,
        ctx: &mut Context,
        indices: &IndexManager,
        results: &mut Vec<Clause>,
    ) {
        let Some(index) = indices.get(IndexKind::SuperpositionLhs) else {
            return;
        };
        let clause = arena.get(given);

        for &li in &clause.selected {
            let lit = clause.literals[li].clone();

            for (path, t) in subterm_positions(ctx, &lit) {
                let mut retrieval = index.unifications(&ctx.bank, t);
                while let Some((entry, subst)) = retrieval.next(&ctx.bank) {
                    // Self-overlap at the same position comes out of
                    // `from_given`; skip the mirror image.
                    if entry.clause == given {
                        continue;
                    }
                    let eq_clause = arena.get(entry.clause);
                    if !Colour::compatible(clause.colour, eq_clause.colour) {
                        continue;
                    }
                    let subst = subst.clone();
                    let eq_lit = &eq_clause.literals[entry.literal];
                    let r = eq_lit.other_equality_side(entry.term);

                    let mut renaming = HashMap::new();
                    let (l_s, r_s) = {
                        let Context { syms, bank, .. } = &mut *ctx;
                        (
                            subst.apply_renamed(bank, syms, entry.term, RESULT, &mut renaming),
                            subst.apply_renamed(bank, syms, r, RESULT, &mut renaming),
                        )
                    };
                    if !not_smaller(ctx, l_s, r_s) {
                        continue;
                    }
                    if !equality_side_ok(&subst, ctx, &lit, QUERY, &path, &mut renaming) {
                        continue;
                    }

                    let rewritten =
                        literal_replacing_at(&subst, ctx, &lit, QUERY, &path, r_s, &mut renaming);

                    let mut literals = vec![rewritten];
                    literals.extend(collect_literals_except(
                        &subst,
                        ctx,
                        clause,
                        &[li],
                        QUERY,
                        &mut renaming,
                    ));
                    literals.extend(collect_literals_except(
                        &subst,
                        ctx,
                        eq_clause,
                        &[entry.literal],
                        RESULT,
                        &mut renaming,
                    ));
                    let literals = dedup_literals(literals);

                    results.push(Clause::derived(
                        literals,
                        &ctx.bank,
                        Derivation::new(Rule::Superposition, vec![given, entry.clause]),
                    ));
                }
            }
        }
    }
}

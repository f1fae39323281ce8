//! Two-bank substitutions
//!
//! A substitution binds `(variable, bank)` pairs to `(term, bank)` pairs.
//! The two conventional banks, `QUERY` (0) and `RESULT` (1), let a single
//! substitution describe the unifier of two terms drawn from
//! independently-numbered variable pools, without renaming either side
//! first: `X` in the query and `X` in an index entry are different
//! variables.
//!
//! Bindings are recorded on an undo trail, so a failed unification restores
//! the substitution to its pre-call state and backtracking matchers
//! (subsumption) can roll back to a checkpoint.

use super::symbols::{Symbols, VariableId};
use super::term::{TermBank, TermData, TermId};
use std::collections::HashMap;

/// Variable namespace tag.
pub type Bank = u8;

/// Bank of the querying side (a clause being simplified, a given clause).
pub const QUERY: Bank = 0;
/// Bank of the retrieved side (index entries, partner clauses).
pub const RESULT: Bank = 1;

/// A variable within a bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BankVar {
    pub var: VariableId,
    pub bank: Bank,
}

/// A term within a bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BankTerm {
    pub term: TermId,
    pub bank: Bank,
}

impl BankTerm {
    pub fn new(term: TermId, bank: Bank) -> Self {
        BankTerm { term, bank }
    }
}

/// A finite partial mapping from bank variables to bank terms.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: HashMap<BankVar, BankTerm>,
    trail: Vec<BankVar>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    /// Remove all bindings.
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.trail.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Trail checkpoint for later rollback.
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Undo every binding recorded after `mark`.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let bv = self.trail.pop().unwrap();
            self.bindings.remove(&bv);
        }
    }

    fn bind(&mut self, bv: BankVar, value: BankTerm) {
        debug_assert!(!self.bindings.contains_key(&bv));
        self.bindings.insert(bv, value);
        self.trail.push(bv);
    }

    pub fn lookup(&self, var: VariableId, bank: Bank) -> Option<BankTerm> {
        self.bindings.get(&BankVar { var, bank }).copied()
    }

    /// Chase variable bindings until an unbound variable or a non-variable
    /// term is reached.
    fn resolve(&self, bank: &TermBank, t: BankTerm) -> BankTerm {
        let mut current = t;
        loop {
            match bank.data(current.term) {
                TermData::Variable(v) => {
                    match self.bindings.get(&BankVar {
                        var: *v,
                        bank: current.bank,
                    }) {
                        Some(&next) => current = next,
                        None => return current,
                    }
                }
                _ => return current,
            }
        }
    }

    /// Occurs check modulo the current bindings.
    fn occurs(&self, bank: &TermBank, v: BankVar, t: BankTerm) -> bool {
        let t = self.resolve(bank, t);
        match bank.data(t.term) {
            TermData::Variable(w) => BankVar {
                var: *w,
                bank: t.bank,
            } == v,
            TermData::Constant(_) => false,
            TermData::Function(_, args) => args
                .iter()
                .any(|&a| self.occurs(bank, v, BankTerm::new(a, t.bank))),
        }
    }

    /// Robinson unification of `s` (in bank `sb`) and `t` (in bank `tb`).
    ///
    /// On success the substitution is extended; on failure it is restored.
    pub fn unify(&mut self, bank: &TermBank, s: TermId, sb: Bank, t: TermId, tb: Bank) -> bool {
        let mark = self.mark();
        if self.unify_rec(bank, BankTerm::new(s, sb), BankTerm::new(t, tb)) {
            true
        } else {
            self.undo_to(mark);
            false
        }
    }

    fn unify_rec(&mut self, bank: &TermBank, s: BankTerm, t: BankTerm) -> bool {
        let s = self.resolve(bank, s);
        let t = self.resolve(bank, t);

        if s == t {
            return true;
        }

        match (bank.data(s.term), bank.data(t.term)) {
            (TermData::Variable(v), _) => {
                let bv = BankVar {
                    var: *v,
                    bank: s.bank,
                };
                if self.occurs(bank, bv, t) {
                    false
                } else {
                    self.bind(bv, t);
                    true
                }
            }
            (_, TermData::Variable(w)) => {
                let bv = BankVar {
                    var: *w,
                    bank: t.bank,
                };
                if self.occurs(bank, bv, s) {
                    false
                } else {
                    self.bind(bv, s);
                    true
                }
            }
            (TermData::Constant(c), TermData::Constant(d)) => c == d,
            (TermData::Function(f, args_s), TermData::Function(g, args_t)) => {
                if f != g || args_s.len() != args_t.len() {
                    return false;
                }
                // Clone the argument ids out so the bank borrow is released
                let pairs: Vec<(TermId, TermId)> = args_s
                    .iter()
                    .copied()
                    .zip(args_t.iter().copied())
                    .collect();
                pairs.into_iter().all(|(a, b)| {
                    self.unify_rec(bank, BankTerm::new(a, s.bank), BankTerm::new(b, t.bank))
                })
            }
            _ => false,
        }
    }

    /// One-sided matching: extend the substitution so that the pattern
    /// (in bank `pb`) becomes the instance (in bank `ib`). Only variables of
    /// the pattern bank are bound; the instance side is rigid.
    ///
    /// On failure the substitution is restored.
    pub fn match_(
        &mut self,
        bank: &TermBank,
        pattern: TermId,
        pb: Bank,
        instance: TermId,
        ib: Bank,
    ) -> bool {
        let mark = self.mark();
        if self.match_rec(bank, BankTerm::new(pattern, pb), BankTerm::new(instance, ib)) {
            true
        } else {
            self.undo_to(mark);
            false
        }
    }

    fn match_rec(&mut self, bank: &TermBank, pattern: BankTerm, instance: BankTerm) -> bool {
        match bank.data(pattern.term) {
            TermData::Variable(v) => {
                let bv = BankVar {
                    var: *v,
                    bank: pattern.bank,
                };
                match self.bindings.get(&bv) {
                    Some(&bound) => bound == instance,
                    None => {
                        self.bind(bv, instance);
                        true
                    }
                }
            }
            TermData::Constant(c) => match bank.data(instance.term) {
                TermData::Constant(d) => c == d,
                _ => false,
            },
            TermData::Function(f, args_p) => match bank.data(instance.term) {
                TermData::Function(g, args_i) if f == g && args_p.len() == args_i.len() => {
                    let pairs: Vec<(TermId, TermId)> = args_p
                        .iter()
                        .copied()
                        .zip(args_i.iter().copied())
                        .collect();
                    pairs.into_iter().all(|(p, i)| {
                        self.match_rec(
                            bank,
                            BankTerm::new(p, pattern.bank),
                            BankTerm::new(i, instance.bank),
                        )
                    })
                }
                _ => false,
            },
        }
    }

    /// Materialise the fully dereferenced image of `t` (in bank `b`) in the
    /// arena. Unbound variables keep their identity, so this is only safe
    /// when the result cannot capture variables of another bank (e.g. the
    /// right-hand side of a demodulator, whose variables are all bound).
    pub fn apply(&self, bank: &mut TermBank, t: TermId, b: Bank) -> TermId {
        let resolved = self.resolve(bank, BankTerm::new(t, b));
        match bank.data(resolved.term).clone() {
            TermData::Variable(_) => resolved.term,
            TermData::Constant(_) => resolved.term,
            TermData::Function(f, args) => {
                let new_args = args
                    .into_iter()
                    .map(|a| self.apply(bank, a, resolved.bank))
                    .collect();
                bank.function(f, new_args)
            }
        }
    }

    /// Like `apply`, but unbound variables outside the query bank are
    /// renamed to fresh variables. The renaming map is shared across the
    /// literals of one conclusion so a result-bank variable keeps a single
    /// fresh name.
    pub fn apply_renamed(
        &self,
        bank: &mut TermBank,
        syms: &mut Symbols,
        t: TermId,
        b: Bank,
        renaming: &mut HashMap<BankVar, VariableId>,
    ) -> TermId {
        let resolved = self.resolve(bank, BankTerm::new(t, b));
        match bank.data(resolved.term).clone() {
            TermData::Variable(v) => {
                if resolved.bank == QUERY {
                    resolved.term
                } else {
                    let bv = BankVar {
                        var: v,
                        bank: resolved.bank,
                    };
                    let fresh = *renaming.entry(bv).or_insert_with(|| syms.fresh_variable());
                    bank.variable(fresh)
                }
            }
            TermData::Constant(_) => resolved.term,
            TermData::Function(f, args) => {
                let new_args = args
                    .into_iter()
                    .map(|a| self.apply_renamed(bank, syms, a, resolved.bank, renaming))
                    .collect();
                bank.function(f, new_args)
            }
        }
    }

    /// Is this substitution a variable renaming (every binding maps to a
    /// distinct variable)? Used for variant confirmation and encompassment.
    pub fn is_renaming(&self, bank: &TermBank) -> bool {
        let mut seen = Vec::with_capacity(self.bindings.len());
        for value in self.bindings.values() {
            match bank.data(value.term) {
                TermData::Variable(v) => {
                    let key = (*v, value.bank);
                    if seen.contains(&key) {
                        return false;
                    }
                    seen.push(key);
                }
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx {
        syms: Symbols,
        bank: TermBank,
    }

    impl Ctx {
        fn new() -> Self {
            Ctx {
                syms: Symbols::new(),
                bank: TermBank::new(),
            }
        }

        fn var(&mut self, name: &str) -> TermId {
            let id = self.syms.intern_variable(name);
            self.bank.variable(id)
        }

        fn const_(&mut self, name: &str) -> TermId {
            let id = self.syms.intern_constant(name);
            self.bank.constant(id)
        }

        fn func(&mut self, name: &str, args: Vec<TermId>) -> TermId {
            let id = self.syms.intern_function(name);
            self.bank.function(id, args)
        }
    }

    #[test]
    fn test_unify_same_name_across_banks() {
        // f(X, a) at QUERY vs f(a, X) at RESULT: the two X's are distinct
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");
        let t1 = ctx.func("f", vec![x, a]);
        let t2 = ctx.func("f", vec![a, x]);

        let mut subst = Substitution::new();
        assert!(subst.unify(&ctx.bank, t1, QUERY, t2, RESULT));

        assert_eq!(subst.apply(&mut ctx.bank, x, QUERY), a);
        assert_eq!(subst.apply(&mut ctx.bank, x, RESULT), a);
    }

    #[test]
    fn test_unify_failure_restores_bindings() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        // f(X, a) vs f(b, b): X binds to b, then a vs b fails
        let t1 = ctx.func("f", vec![x, a]);
        let t2 = ctx.func("f", vec![b, b]);

        let mut subst = Substitution::new();
        assert!(!subst.unify(&ctx.bank, t1, QUERY, t2, RESULT));
        assert!(subst.is_empty());
    }

    #[test]
    fn test_occurs_check_same_bank() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let fx = ctx.func("f", vec![x]);

        let mut subst = Substitution::new();
        assert!(!subst.unify(&ctx.bank, x, QUERY, fx, QUERY));
    }

    #[test]
    fn test_self_overlap_across_banks_is_fine() {
        // X@0 against f(X)@1 unifies: the occurrence is in the other bank
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let fx = ctx.func("f", vec![x]);

        let mut subst = Substitution::new();
        assert!(subst.unify(&ctx.bank, x, QUERY, fx, RESULT));
    }

    #[test]
    fn test_match_binds_pattern_side_only() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");
        let fx = ctx.func("f", vec![x]);
        let fa = ctx.func("f", vec![a]);

        let mut subst = Substitution::new();
        assert!(subst.match_(&ctx.bank, fx, RESULT, fa, QUERY));
        assert_eq!(subst.apply(&mut ctx.bank, fx, RESULT), fa);

        // The reverse direction must not bind the instance variable
        subst.reset();
        assert!(!subst.match_(&ctx.bank, fa, RESULT, fx, QUERY));
        assert!(subst.is_empty());
    }

    #[test]
    fn test_match_repeated_variable_consistency() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let fxx = ctx.func("f", vec![x, x]);
        let fab = ctx.func("f", vec![a, b]);
        let faa = ctx.func("f", vec![a, a]);

        let mut subst = Substitution::new();
        assert!(!subst.match_(&ctx.bank, fxx, RESULT, fab, QUERY));
        assert!(subst.is_empty());
        assert!(subst.match_(&ctx.bank, fxx, RESULT, faa, QUERY));
    }

    #[test]
    fn test_apply_renamed_freshens_result_variables() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let y = ctx.var("Y");
        let gy = ctx.func("g", vec![y]);
        // X@0 := g(Y)@1; applying X@0 must rename Y
        let mut subst = Substitution::new();
        assert!(subst.unify(&ctx.bank, x, QUERY, gy, RESULT));

        let mut renaming = HashMap::new();
        let result = subst.apply_renamed(&mut ctx.bank, &mut ctx.syms, x, QUERY, &mut renaming);

        match ctx.bank.data(result).clone() {
            TermData::Function(_, args) => {
                let v = ctx.bank.as_variable(args[0]).expect("renamed variable");
                assert_ne!(Some(v), ctx.bank.as_variable(y));
            }
            other => panic!("expected g(fresh), got {:?}", other),
        }

        // The same result variable gets the same fresh name on reuse
        let again = subst.apply_renamed(&mut ctx.bank, &mut ctx.syms, x, QUERY, &mut renaming);
        assert_eq!(result, again);
    }

    #[test]
    fn test_mark_and_undo() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let y = ctx.var("Y");
        let a = ctx.const_("a");
        let b = ctx.const_("b");

        let mut subst = Substitution::new();
        assert!(subst.unify(&ctx.bank, x, QUERY, a, RESULT));
        let mark = subst.mark();
        assert!(subst.unify(&ctx.bank, y, QUERY, b, RESULT));
        assert_eq!(subst.len(), 2);

        subst.undo_to(mark);
        assert_eq!(subst.len(), 1);
        assert!(subst.lookup(ctx.bank.as_variable(x).unwrap(), QUERY).is_some());
        assert!(subst.lookup(ctx.bank.as_variable(y).unwrap(), QUERY).is_none());
    }

    #[test]
    fn test_is_renaming() {
        let mut ctx = Ctx::new();
        let x = ctx.var("X");
        let y = ctx.var("Y");
        let z = ctx.var("Z");
        let a = ctx.const_("a");

        let mut subst = Substitution::new();
        assert!(subst.unify(&ctx.bank, x, RESULT, y, QUERY));
        assert!(subst.is_renaming(&ctx.bank));

        // Two pattern variables collapsing onto one target is not a renaming
        assert!(subst.unify(&ctx.bank, z, RESULT, y, QUERY));
        assert!(!subst.is_renaming(&ctx.bank));

        subst.reset();
        assert!(subst.unify(&ctx.bank, x, RESULT, a, QUERY));
        assert!(!subst.is_renaming(&ctx.bank));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum TermDesc {
            Var(u8),
            Const(u8),
            Func(u8, Vec<TermDesc>),
        }

        fn arb_desc(max_depth: u32) -> BoxedStrategy<TermDesc> {
            if max_depth == 0 {
                prop_oneof![
                    (0..3u8).prop_map(TermDesc::Var),
                    (0..3u8).prop_map(TermDesc::Const),
                ]
                .boxed()
            } else {
                prop_oneof![
                    2 => (0..3u8).prop_map(TermDesc::Var),
                    2 => (0..3u8).prop_map(TermDesc::Const),
                    3 => (0..2u8, proptest::collection::vec(arb_desc(max_depth - 1), 1..=2))
                        .prop_map(|(f, args)| TermDesc::Func(f, args)),
                ]
                .boxed()
            }
        }

        fn build(desc: &TermDesc, ctx: &mut Ctx) -> TermId {
            match desc {
                TermDesc::Var(i) => ctx.var(&format!("V{}", i)),
                TermDesc::Const(i) => ctx.const_(&format!("c{}", i)),
                TermDesc::Func(f, args) => {
                    let name = format!("f{}", f);
                    let built: Vec<TermId> = args.iter().map(|a| build(a, ctx)).collect();
                    ctx.func(&name, built)
                }
            }
        }

        proptest! {
            /// A successful unifier really equalises the two sides.
            #[test]
            fn unifier_equalises(d1 in arb_desc(3), d2 in arb_desc(3)) {
                let mut ctx = Ctx::new();
                let t1 = build(&d1, &mut ctx);
                let t2 = build(&d2, &mut ctx);

                let mut subst = Substitution::new();
                if subst.unify(&ctx.bank, t1, QUERY, t2, RESULT) {
                    let mut renaming = HashMap::new();
                    let s1 = subst.apply_renamed(&mut ctx.bank, &mut ctx.syms, t1, QUERY, &mut renaming);
                    let s2 = subst.apply_renamed(&mut ctx.bank, &mut ctx.syms, t2, RESULT, &mut renaming);
                    prop_assert_eq!(s1, s2);
                }
            }

            /// Matching instantiates the pattern to exactly the instance.
            #[test]
            fn match_instantiates_pattern(d1 in arb_desc(3), d2 in arb_desc(3)) {
                let mut ctx = Ctx::new();
                let pattern = build(&d1, &mut ctx);
                let instance = build(&d2, &mut ctx);

                let mut subst = Substitution::new();
                if subst.match_(&ctx.bank, pattern, RESULT, instance, QUERY) {
                    let image = subst.apply(&mut ctx.bank, pattern, RESULT);
                    prop_assert_eq!(image, instance);
                }
            }
        }
    }
}

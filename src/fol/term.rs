//! Hash-consed terms
//!
//! Terms live in a per-run arena (`TermBank`) and are addressed by 32-bit
//! `TermId` handles. Structurally equal terms get the same handle, so term
//! equality is handle equality everywhere in the prover. Each stored term
//! caches its weight, variable counts, and ground flag; subterms of a stored
//! term are themselves stored.
//!
//! The arena only grows within a run; individual terms are never released.

use super::symbols::{ConstantId, FunctionId, Symbols, VariableId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Handle of a term stored in a `TermBank`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Serialize for TermId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TermId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(TermId)
    }
}

/// Structure of a stored term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermData {
    Variable(VariableId),
    Constant(ConstantId),
    Function(FunctionId, Vec<TermId>),
}

/// One arena slot: structure plus cached measures.
#[derive(Debug, Clone)]
struct TermRecord {
    data: TermData,
    /// Symbol count (variables count 1), cached at interning time
    weight: u32,
    /// Total variable occurrences
    var_occurrences: u32,
    /// Number of distinct variables
    distinct_vars: u32,
    ground: bool,
}

/// Arena of hash-consed terms.
#[derive(Debug, Clone, Default)]
pub struct TermBank {
    records: Vec<TermRecord>,
    lookup: HashMap<TermData, TermId>,
}

impl TermBank {
    pub fn new() -> Self {
        TermBank::default()
    }

    /// Number of distinct terms stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Intern a variable term.
    pub fn variable(&mut self, v: VariableId) -> TermId {
        self.intern(TermData::Variable(v))
    }

    /// Intern a constant term.
    pub fn constant(&mut self, c: ConstantId) -> TermId {
        self.intern(TermData::Constant(c))
    }

    /// Intern an applied function term. All arguments must already be stored
    /// in this bank.
    pub fn function(&mut self, f: FunctionId, args: Vec<TermId>) -> TermId {
        debug_assert!(args.iter().all(|a| (a.0 as usize) < self.records.len()));
        self.intern(TermData::Function(f, args))
    }

    fn intern(&mut self, data: TermData) -> TermId {
        if let Some(&id) = self.lookup.get(&data) {
            return id;
        }

        let (weight, var_occurrences, distinct_vars, ground) = match &data {
            TermData::Variable(_) => (1, 1, 1, false),
            TermData::Constant(_) => (1, 0, 0, true),
            TermData::Function(_, args) => {
                let weight = 1 + args.iter().map(|&a| self.weight(a)).sum::<u32>();
                let occurrences: u32 = args.iter().map(|&a| self.var_occurrences(a)).sum();
                let ground = args.iter().all(|&a| self.is_ground(a));
                let distinct = if ground {
                    0
                } else {
                    let mut vars = HashSet::new();
                    for &a in args {
                        self.collect_variables(a, &mut vars);
                    }
                    vars.len() as u32
                };
                (weight, occurrences, distinct, ground)
            }
        };

        let id = TermId(self.records.len() as u32);
        self.records.push(TermRecord {
            data: data.clone(),
            weight,
            var_occurrences,
            distinct_vars,
            ground,
        });
        self.lookup.insert(data, id);
        id
    }

    /// Structure of a stored term.
    pub fn data(&self, t: TermId) -> &TermData {
        &self.records[t.0 as usize].data
    }

    /// Cached symbol count.
    pub fn weight(&self, t: TermId) -> u32 {
        self.records[t.0 as usize].weight
    }

    /// Cached total variable occurrences.
    pub fn var_occurrences(&self, t: TermId) -> u32 {
        self.records[t.0 as usize].var_occurrences
    }

    /// Cached number of distinct variables.
    pub fn distinct_var_count(&self, t: TermId) -> u32 {
        self.records[t.0 as usize].distinct_vars
    }

    /// Cached ground flag.
    pub fn is_ground(&self, t: TermId) -> bool {
        self.records[t.0 as usize].ground
    }

    /// The variable id if `t` is a variable term.
    pub fn as_variable(&self, t: TermId) -> Option<VariableId> {
        match self.data(t) {
            TermData::Variable(v) => Some(*v),
            _ => None,
        }
    }

    /// Collect the distinct variables of `t` into `vars`.
    pub fn collect_variables(&self, t: TermId, vars: &mut HashSet<VariableId>) {
        match self.data(t) {
            TermData::Variable(v) => {
                vars.insert(*v);
            }
            TermData::Constant(_) => {}
            TermData::Function(_, args) => {
                for &a in args {
                    if !self.is_ground(a) {
                        self.collect_variables(a, vars);
                    }
                }
            }
        }
    }

    /// Count occurrences of each variable in `t`.
    pub fn count_variables(&self, t: TermId, counts: &mut HashMap<VariableId, u32>) {
        match self.data(t) {
            TermData::Variable(v) => {
                *counts.entry(*v).or_insert(0) += 1;
            }
            TermData::Constant(_) => {}
            TermData::Function(_, args) => {
                for &a in args {
                    if !self.is_ground(a) {
                        self.count_variables(a, counts);
                    }
                }
            }
        }
    }

    /// Does variable `v` occur in `t`?
    pub fn occurs(&self, v: VariableId, t: TermId) -> bool {
        match self.data(t) {
            TermData::Variable(w) => *w == v,
            TermData::Constant(_) => false,
            TermData::Function(_, args) => {
                args.iter().any(|&a| !self.is_ground(a) && self.occurs(v, a))
            }
        }
    }

    /// Rebuild `t` with every occurrence of `target` replaced by
    /// `replacement`. Sharing makes untouched subtrees free.
    pub fn replace(&mut self, t: TermId, target: TermId, replacement: TermId) -> TermId {
        if t == target {
            return replacement;
        }
        match self.data(t).clone() {
            TermData::Variable(_) | TermData::Constant(_) => t,
            TermData::Function(f, args) => {
                let new_args: Vec<TermId> = args
                    .iter()
                    .map(|&a| self.replace(a, target, replacement))
                    .collect();
                if new_args == args {
                    t
                } else {
                    self.function(f, new_args)
                }
            }
        }
    }

    /// Preorder iterator over `t` and all its subterms.
    pub fn subterms(&self, t: TermId) -> SubtermIter<'_> {
        SubtermIter {
            bank: self,
            stack: vec![t],
        }
    }

    /// Preorder listing of `t` and its subterms, each with the length of
    /// its subtree in the listing. Lets a caller walk subterms while
    /// mutating the bank, and skip a whole subtree by jumping its span
    /// (forward demodulation skips the subterms of positions it has
    /// already attempted).
    pub fn subterm_spans(&self, t: TermId) -> Vec<(TermId, usize)> {
        let mut out = Vec::new();
        self.spans_rec(t, &mut out);
        out
    }

    fn spans_rec(&self, t: TermId, out: &mut Vec<(TermId, usize)>) -> usize {
        let idx = out.len();
        out.push((t, 1));
        let mut span = 1;
        if let TermData::Function(_, args) = self.data(t) {
            for &a in args {
                span += self.spans_rec(a, out);
            }
        }
        out[idx].1 = span;
        span
    }

    /// Display wrapper resolving symbol names through `syms`.
    pub fn display<'a>(&'a self, t: TermId, syms: &'a Symbols) -> TermDisplay<'a> {
        TermDisplay {
            bank: self,
            syms,
            term: t,
        }
    }
}

/// Preorder subterm traversal.
pub struct SubtermIter<'a> {
    bank: &'a TermBank,
    stack: Vec<TermId>,
}

impl<'a> Iterator for SubtermIter<'a> {
    type Item = TermId;

    fn next(&mut self) -> Option<TermId> {
        let t = self.stack.pop()?;
        if let TermData::Function(_, args) = self.bank.data(t) {
            for &a in args.iter().rev() {
                self.stack.push(a);
            }
        }
        Some(t)
    }
}

pub struct TermDisplay<'a> {
    bank: &'a TermBank,
    syms: &'a Symbols,
    term: TermId,
}

impl<'a> fmt::Display for TermDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bank.data(self.term) {
            TermData::Variable(v) => write!(f, "{}", self.syms.resolve_variable(*v)),
            TermData::Constant(c) => write!(f, "{}", self.syms.resolve_constant(*c)),
            TermData::Function(func, args) => {
                write!(f, "{}(", self.syms.resolve_function(*func))?;
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", self.bank.display(arg, self.syms))?;
                }
                write!(f, ")")
            }
        }
    }
}

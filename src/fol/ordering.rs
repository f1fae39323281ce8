//! Term ordering (Knuth-Bendix)
//!
//! A simplification ordering over stored terms: well-founded, stable under
//! substitution, total on ground terms. Rules that rely on `>` for
//! soundness (demodulation, superposition) must go through `compare` or
//! `is_greater`; `Incomparable` is a normal outcome on non-ground terms.
//!
//! Symbol weights are uniform (1, variables included), so the bank's cached
//! term weights double as KBO weights. Ties are broken by symbol precedence,
//! configurable per symbol and defaulting to interning order.

use super::literal::Literal;
use super::symbols::{ConstantId, FunctionId};
use super::term::{TermBank, TermData, TermId};
use std::collections::HashMap;

/// Result of comparing two terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrdering {
    Greater,
    Less,
    Equal,
    Incomparable,
}

impl TermOrdering {
    /// Swap the roles of the compared terms.
    pub fn reversed(self) -> TermOrdering {
        match self {
            TermOrdering::Greater => TermOrdering::Less,
            TermOrdering::Less => TermOrdering::Greater,
            other => other,
        }
    }
}

/// Precedence configuration. Higher value = higher precedence; symbols not
/// listed fall back to their interning order.
#[derive(Debug, Clone, Default)]
pub struct KBOConfig {
    pub function_precedence: HashMap<FunctionId, usize>,
    pub constant_precedence: HashMap<ConstantId, usize>,
}

/// Knuth-Bendix ordering over bank terms.
#[derive(Debug, Clone, Default)]
pub struct KBO {
    config: KBOConfig,
}

impl KBO {
    pub fn new(config: KBOConfig) -> Self {
        KBO { config }
    }

    fn function_precedence(&self, id: FunctionId) -> (usize, u32) {
        (
            self.config.function_precedence.get(&id).copied().unwrap_or(0),
            id.as_u32(),
        )
    }

    fn constant_precedence(&self, id: ConstantId) -> (usize, u32) {
        (
            self.config.constant_precedence.get(&id).copied().unwrap_or(0),
            id.as_u32(),
        )
    }

    /// Compare two stored terms.
    pub fn compare(&self, bank: &TermBank, s: TermId, t: TermId) -> TermOrdering {
        // Handle equality is term equality
        if s == t {
            return TermOrdering::Equal;
        }

        // Variable condition: for s > t every variable must occur at least
        // as often in s as in t (and dually).
        let mut vars_s = HashMap::new();
        let mut vars_t = HashMap::new();
        bank.count_variables(s, &mut vars_s);
        bank.count_variables(t, &mut vars_t);

        let s_covers_t = vars_t
            .iter()
            .all(|(v, n)| vars_s.get(v).copied().unwrap_or(0) >= *n);
        let t_covers_s = vars_s
            .iter()
            .all(|(v, n)| vars_t.get(v).copied().unwrap_or(0) >= *n);

        let weight_s = bank.weight(s);
        let weight_t = bank.weight(t);

        if weight_s > weight_t {
            if s_covers_t {
                TermOrdering::Greater
            } else {
                TermOrdering::Incomparable
            }
        } else if weight_t > weight_s {
            if t_covers_s {
                TermOrdering::Less
            } else {
                TermOrdering::Incomparable
            }
        } else {
            match self.compare_lex(bank, s, t) {
                TermOrdering::Greater if s_covers_t => TermOrdering::Greater,
                TermOrdering::Less if t_covers_s => TermOrdering::Less,
                TermOrdering::Equal => TermOrdering::Equal,
                _ => TermOrdering::Incomparable,
            }
        }
    }

    /// Precedence-then-arguments comparison for equal-weight terms.
    fn compare_lex(&self, bank: &TermBank, s: TermId, t: TermId) -> TermOrdering {
        match (bank.data(s), bank.data(t)) {
            (TermData::Variable(v), TermData::Variable(w)) => {
                if v == w {
                    TermOrdering::Equal
                } else {
                    TermOrdering::Incomparable
                }
            }
            // A variable never compares under precedence
            (TermData::Variable(_), _) | (_, TermData::Variable(_)) => TermOrdering::Incomparable,
            (TermData::Constant(c), TermData::Constant(d)) => {
                if c == d {
                    TermOrdering::Equal
                } else if self.constant_precedence(*c) > self.constant_precedence(*d) {
                    TermOrdering::Greater
                } else {
                    TermOrdering::Less
                }
            }
            // With uniform weights a function term always outweighs a
            // constant, so these pairs only show up through nesting
            (TermData::Function(_, _), TermData::Constant(_)) => TermOrdering::Greater,
            (TermData::Constant(_), TermData::Function(_, _)) => TermOrdering::Less,
            (TermData::Function(f, args_s), TermData::Function(g, args_t)) => {
                if f != g {
                    if self.function_precedence(*f) > self.function_precedence(*g) {
                        TermOrdering::Greater
                    } else {
                        TermOrdering::Less
                    }
                } else {
                    for (&a, &b) in args_s.iter().zip(args_t.iter()) {
                        match self.compare(bank, a, b) {
                            TermOrdering::Equal => continue,
                            other => return other,
                        }
                    }
                    TermOrdering::Equal
                }
            }
        }
    }

    pub fn is_greater(&self, bank: &TermBank, s: TermId, t: TermId) -> bool {
        self.compare(bank, s, t) == TermOrdering::Greater
    }

    /// Ordering of the two sides of an equality literal. The cheap path is
    /// the `oriented` flag set at normalisation; otherwise compare directly.
    pub fn equality_argument_order(&self, bank: &TermBank, lit: &Literal) -> TermOrdering {
        debug_assert_eq!(lit.args.len(), 2);
        if lit.oriented {
            TermOrdering::Greater
        } else {
            self.compare(bank, lit.args[0], lit.args[1])
        }
    }
}

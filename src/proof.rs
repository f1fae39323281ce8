//! Proof extraction
//!
//! Clauses carry their derivation records, so a refutation is the DAG of
//! records reachable backwards from the empty clause. Steps are listed in
//! ascending clause id, which respects derivation order.

use crate::fol::{Clause, Context, Literal, Rule};
use crate::saturation::arena::ClauseArena;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct ProofStep {
    pub clause: usize,
    pub rule: Rule,
    pub parents: Vec<usize>,
    pub literals: Vec<Literal>,
}

/// A refutation: derivation steps ending in the empty clause.
#[derive(Debug, Clone, Serialize)]
pub struct Proof {
    pub steps: Vec<ProofStep>,
    pub empty_clause: usize,
}

impl Proof {
    /// Walk derivation records backwards from `empty_clause`.
    pub fn extract(arena: &ClauseArena, empty_clause: usize) -> Proof {
        let mut reached: HashSet<usize> = HashSet::new();
        let mut to_visit = vec![empty_clause];
        while let Some(id) = to_visit.pop() {
            if !reached.insert(id) {
                continue;
            }
            to_visit.extend(&arena.get(id).derivation.parents);
        }

        let mut ids: Vec<usize> = reached.into_iter().collect();
        ids.sort_unstable();

        Proof {
            steps: ids
                .into_iter()
                .map(|id| {
                    let clause: &Clause = arena.get(id);
                    ProofStep {
                        clause: id,
                        rule: clause.derivation.rule,
                        parents: clause.derivation.parents.clone(),
                        literals: clause.literals.clone(),
                    }
                })
                .collect(),
            empty_clause,
        }
    }

    /// Ids of the input clauses the refutation depends on.
    pub fn input_clauses(&self) -> Vec<usize> {
        self.steps
            .iter()
            .filter(|s| s.rule == Rule::Input)
            .map(|s| s.clause)
            .collect()
    }

    pub fn display<'a>(&'a self, ctx: &'a Context) -> ProofDisplay<'a> {
        ProofDisplay { proof: self, ctx }
    }
}

pub struct ProofDisplay<'a> {
    proof: &'a Proof,
    ctx: &'a Context,
}

impl<'a> fmt::Display for ProofDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.proof.steps {
            write!(f, "{}. ", step.clause)?;
            if step.literals.is_empty() {
                write!(f, "$false")?;
            } else {
                for (i, lit) in step.literals.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", lit.display(&self.ctx.bank, &self.ctx.syms))?;
                }
            }
            write!(f, "  [{}", step.rule.name())?;
            for (i, p) in step.parents.iter().enumerate() {
                write!(f, "{}{}", if i == 0 { " " } else { "," }, p)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

//! Strategy configuration
//!
//! The strategy record fixes everything the saturation loop may consult:
//! passive selection ratio, literal selection, demodulation modes, and
//! resource budgets. Malformed combinations are rejected by `validate` at
//! construction time; nothing is checked inside the loop.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Literal selection strategies (see `selection::literal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralSelection {
    /// Select every literal; preserves completeness
    Complete,
    /// Select all maximal literals; preserves completeness
    Maximal,
    /// Unique maximal, else heaviest negative; incomplete but fast
    Best,
}

/// When demodulation may rewrite with an equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemodulationMode {
    Off,
    /// Only equalities whose orientation was decided at creation
    Preordered,
    /// Any equality whose instantiated sides order correctly
    All,
}

/// Strength of the demodulation redundancy discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedundancyCheck {
    Off,
    /// Encompassment demodulation: proper instantiations count as smaller
    Encompass,
    On,
}

/// Immediate simplification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImmediateKind {
    DuplicateLiteralRemoval,
    TrivialInequalityRemoval,
    TautologyDeletion,
}

/// Forward simplification rules (beyond the immediate chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardKind {
    Subsumption,
    Demodulation,
}

/// Backward simplification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackwardKind {
    Subsumption,
    Demodulation,
}

/// Generating inference rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorKind {
    BinaryResolution,
    Factoring,
    EqualityResolution,
    EqualityFactoring,
    Superposition,
}

impl GeneratorKind {
    /// The full rule set of the superposition calculus.
    pub const ALL: [GeneratorKind; 5] = [
        GeneratorKind::BinaryResolution,
        GeneratorKind::Factoring,
        GeneratorKind::EqualityResolution,
        GeneratorKind::EqualityFactoring,
        GeneratorKind::Superposition,
    ];
}

/// Everything the saturation loop may consult; read-only once validated.
#[derive(Debug, Clone)]
pub struct Strategy {
    /// Passive selection alternation: `(age picks, weight picks)` per cycle
    pub age_weight_ratio: (u32, u32),
    pub literal_selection: LiteralSelection,
    pub forward_demodulation: DemodulationMode,
    pub backward_demodulation: DemodulationMode,
    pub demodulation_redundancy_check: RedundancyCheck,
    /// Chains, tried in list order
    pub immediate_simplifiers: Vec<ImmediateKind>,
    pub forward_simplifiers: Vec<ForwardKind>,
    pub backward_simplifiers: Vec<BackwardKind>,
    pub generators: Vec<GeneratorKind>,
    pub time_limit: Duration,
    /// Memory budget over the process baseline, in MB
    pub memory_limit_mb: Option<usize>,
    /// 0 means no limit
    pub max_clauses: usize,
    /// 0 means no limit
    pub max_activations: usize,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            age_weight_ratio: (1, 4),
            literal_selection: LiteralSelection::Maximal,
            forward_demodulation: DemodulationMode::All,
            backward_demodulation: DemodulationMode::All,
            demodulation_redundancy_check: RedundancyCheck::On,
            immediate_simplifiers: vec![
                ImmediateKind::DuplicateLiteralRemoval,
                ImmediateKind::TrivialInequalityRemoval,
                ImmediateKind::TautologyDeletion,
            ],
            forward_simplifiers: vec![ForwardKind::Subsumption, ForwardKind::Demodulation],
            backward_simplifiers: vec![BackwardKind::Subsumption, BackwardKind::Demodulation],
            generators: GeneratorKind::ALL.to_vec(),
            time_limit: Duration::from_secs(60),
            memory_limit_mb: None,
            max_clauses: 0,
            max_activations: 0,
        }
    }
}

/// Strategy combinations rejected before the loop starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("age-weight ratio must have a non-zero component")]
    ZeroAgeWeightRatio,

    #[error("demodulation redundancy check configured with demodulation off")]
    RedundancyCheckWithoutDemodulation,

    #[error("time limit must be non-zero")]
    ZeroTimeLimit,
}

impl Strategy {
    /// Whether saturation without a refutation justifies `Satisfiable`:
    /// the full generating rule set must be active (simplifications only
    /// remove redundant clauses and cannot lose completeness). The literal
    /// selector contributes its own completeness flag.
    pub fn has_complete_generators(&self) -> bool {
        GeneratorKind::ALL.iter().all(|k| self.generators.contains(k))
    }

    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.age_weight_ratio == (0, 0) {
            return Err(StrategyError::ZeroAgeWeightRatio);
        }
        if self.demodulation_redundancy_check != RedundancyCheck::Off
            && self.forward_demodulation == DemodulationMode::Off
            && self.backward_demodulation == DemodulationMode::Off
        {
            return Err(StrategyError::RedundancyCheckWithoutDemodulation);
        }
        if self.time_limit.is_zero() {
            return Err(StrategyError::ZeroTimeLimit);
        }
        Ok(())
    }
}

/// Current process RSS in MB; None where unavailable.
pub fn process_memory_mb() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        let page_size = 4096usize;
        Some(rss_pages * page_size / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_valid() {
        assert_eq!(Strategy::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_ratio_rejected() {
        let strategy = Strategy {
            age_weight_ratio: (0, 0),
            ..Default::default()
        };
        assert_eq!(strategy.validate(), Err(StrategyError::ZeroAgeWeightRatio));
    }

    #[test]
    fn test_redundancy_check_requires_demodulation() {
        let strategy = Strategy {
            forward_demodulation: DemodulationMode::Off,
            backward_demodulation: DemodulationMode::Off,
            demodulation_redundancy_check: RedundancyCheck::Encompass,
            ..Default::default()
        };
        assert_eq!(
            strategy.validate(),
            Err(StrategyError::RedundancyCheckWithoutDemodulation)
        );

        let strategy = Strategy {
            forward_demodulation: DemodulationMode::Off,
            backward_demodulation: DemodulationMode::Off,
            demodulation_redundancy_check: RedundancyCheck::Off,
            ..Default::default()
        };
        assert_eq!(strategy.validate(), Ok(()));
    }
}

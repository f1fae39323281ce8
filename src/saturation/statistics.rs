//! Run statistics
//!
//! Counters accumulated by the driver and handed to the embedder after a
//! run; serialisable as JSON for downstream tooling.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub initial_clauses: usize,
    /// Clauses produced by generating inferences
    pub generated: u64,
    /// Given-clause selections
    pub activations: u64,
    pub immediate_discards: u64,
    pub forward_simplified: u64,
    pub backward_simplified: u64,
    pub forward_demodulations: u64,
    pub forward_demodulations_to_eq_taut: u64,
    pub forward_subsumed: u64,
    /// Conclusions per generating rule
    pub generated_by_rule: BTreeMap<String, u64>,
    pub final_active: usize,
    pub final_passive: usize,
    pub final_unprocessed: usize,
    /// Wall-clock time of the run in seconds
    pub time_seconds: f64,
}

impl Statistics {
    pub fn record_generated(&mut self, rule: &str) {
        self.generated += 1;
        *self.generated_by_rule.entry(rule.to_string()).or_insert(0) += 1;
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.time_seconds = elapsed.as_secs_f64();
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("statistics serialize")
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "initial clauses:        {}", self.initial_clauses)?;
        writeln!(f, "activations:            {}", self.activations)?;
        writeln!(f, "generated clauses:      {}", self.generated)?;
        for (rule, count) in &self.generated_by_rule {
            writeln!(f, "  {:<22}{}", format!("{}:", rule), count)?;
        }
        writeln!(f, "immediate discards:     {}", self.immediate_discards)?;
        writeln!(f, "forward simplified:     {}", self.forward_simplified)?;
        writeln!(f, "backward simplified:    {}", self.backward_simplified)?;
        writeln!(f, "forward demodulations:  {}", self.forward_demodulations)?;
        writeln!(f, "  to equality tautology: {}", self.forward_demodulations_to_eq_taut)?;
        writeln!(f, "forward subsumed:       {}", self.forward_subsumed)?;
        write!(f, "time:                   {:.3}s", self.time_seconds)
    }
}

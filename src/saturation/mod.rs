//! Saturation: the given-clause proof-search engine

pub mod arena;
pub mod containers;
pub mod driver;
pub mod events;
pub mod statistics;

pub use arena::ClauseArena;
pub use containers::{ActiveSet, PassiveQueue, UnprocessedQueue};
pub use driver::{SaturationDriver, SaturationResult};
pub use events::{ClauseEvent, EventLog};
pub use statistics::Statistics;

use crate::config::{Strategy, StrategyError};
use crate::fol::{Clause, Context};

/// Run saturation on a set of clauses (already clausified by the caller).
///
/// Returns the result together with the driver, which keeps the clause
/// arena, event log, statistics, and context accessible for inspection.
pub fn saturate(
    clauses: Vec<Clause>,
    strategy: Strategy,
    ctx: Context,
) -> Result<(SaturationResult, SaturationDriver), StrategyError> {
    let mut driver = SaturationDriver::new(clauses, strategy, ctx)?;
    let result = driver.run();
    Ok((result, driver))
}

//! Literal selection
//!
//! A literal selector picks the literals of a clause that are eligible for
//! generating inferences. The mask is fixed when a clause is activated and
//! stored on the clause.

pub mod literal;

pub use literal::{LiteralSelector, SelectAll, SelectBest, SelectMaximal};

use crate::config::LiteralSelection;

/// Build the selector an option value names.
pub fn selector_for(selection: LiteralSelection) -> Box<dyn LiteralSelector> {
    match selection {
        LiteralSelection::Complete => Box::new(SelectAll),
        LiteralSelection::Maximal => Box::new(SelectMaximal),
        LiteralSelection::Best => Box::new(SelectBest),
    }
}

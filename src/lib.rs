//! sabre: a saturation-based theorem prover core for first-order logic
//! with equality
//!
//! The crate implements the given-clause algorithm of the superposition
//! calculus: hash-consed terms, a Knuth-Bendix ordering, two-bank
//! substitutions, a multi-mode discrimination index, refcounted index
//! management, the Unprocessed/Passive/Active containers, a four-role
//! inference-engine framework, and the standard rule set with forward
//! demodulation as the flagship simplifier.
//!
//! Entry point: [`saturate`] with a clause set built against a
//! [`Context`] and a validated [`Strategy`].

pub mod config;
pub mod engine;
pub mod fol;
pub mod generating;
pub mod index;
pub mod proof;
pub mod saturation;
pub mod selection;
pub mod simplifying;

// Term model
pub use fol::{
    Clause, ClauseStore, Colour, Context, Derivation, KBOConfig, Literal, Rule, Substitution,
    Symbols, TermBank, TermData, TermId, TermOrdering, KBO, QUERY, RESULT,
};

// Strategy surface
pub use config::{
    BackwardKind, DemodulationMode, ForwardKind, GeneratorKind, ImmediateKind, LiteralSelection,
    RedundancyCheck, Strategy, StrategyError,
};

// Indexing
pub use index::{IndexKind, IndexManager, LeafEntry, RetrievalMode, SubstitutionTree};

// Engines
pub use engine::{
    BackwardSimplifier, BwSimplification, ForwardSimplifier, FwSimplification, Generator,
    ImmediateSimplifier, Simplified,
};

// Saturation
pub use proof::{Proof, ProofStep};
pub use saturation::{
    saturate, ClauseArena, ClauseEvent, EventLog, SaturationDriver, SaturationResult, Statistics,
};

// Selection
pub use selection::{LiteralSelector, SelectAll, SelectBest, SelectMaximal};

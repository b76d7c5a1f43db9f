//! Analysis core: parsing, scoring, assembly and aggregation.
//!
//! Everything in here is pure and performs no I/O.

pub mod aggregator;
pub mod assembler;
pub mod parser;
pub mod scorer;

pub use aggregator::*;
pub use assembler::PaperAnalysisAssembler;

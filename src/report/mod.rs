//! Report rendering: Markdown, JSON and CSV.

pub mod generator;

pub use generator::*;

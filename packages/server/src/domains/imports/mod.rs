//! Imports - bring claims in from spreadsheets exported elsewhere

pub mod actions;
pub mod columns;
pub mod dedup;
pub mod parser;

pub use columns::ColumnMapping;

//! Exports - claim lists as CSV for fulfillment

pub mod actions;
pub mod sheet;

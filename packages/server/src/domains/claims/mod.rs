//! Claims - address submissions and their fulfillment

pub mod actions;
pub mod capacity;
pub mod models;
pub mod shipping;
pub mod validation;

pub use models::{Claim, ClaimSource, ClaimStatus};

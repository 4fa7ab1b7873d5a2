//! Claim actions
//!
//! - `submit`: public form submissions
//! - `pre_created`: admin-reserved slots completed through a token link
//! - `manage`: admin listing, edits, fulfillment and deletion

pub mod manage;
pub mod pre_created;
pub mod submit;

pub use manage::*;
pub use pre_created::*;
pub use submit::{submit_claim, SubmitClaimInput, SubmittedClaim};

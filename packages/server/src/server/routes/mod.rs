// HTTP routes
pub mod admin;
pub mod campaigns;
pub mod claims;
pub mod health;
pub mod public;

pub use health::*;

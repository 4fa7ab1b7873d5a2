// Cognitive Kin - API Core
//
// Backend for "Claim Your Cognitive Kin" campaigns: public claim forms,
// gift links and the admin side that manages campaigns and their claims.
// Each domain keeps its models (SQL) and actions (business rules) under
// domains/*; the HTTP layer in server/ only maps requests onto actions.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;

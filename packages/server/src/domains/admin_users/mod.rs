//! Admin users - global roles and gifter profiles

pub mod actions;
pub mod models;

pub use models::{AdminUser, UpdateProfile};

//! Custom per-campaign questions and their option rules

pub mod actions;
pub mod models;
pub mod rules;

pub use models::{CampaignQuestion, QuestionType};

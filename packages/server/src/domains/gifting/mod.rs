//! Gifting - admin gift codes that personalize a claim page with the
//! gifter's profile

pub mod actions;
pub mod disclosure;
pub mod models;

pub use models::AdminGiftCode;

// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod pagination;
pub mod text_enum;
pub mod utils;

pub use auth::{Actor, AuthError, CampaignCapability, GlobalCapability, GlobalRole, MemberRole};
pub use entity_ids::*;
pub use error::{AppError, AppResult, FieldError};
pub use id::Id;
pub use pagination::{Page, PageInfo, PaginationArgs, ValidatedPaginationArgs};

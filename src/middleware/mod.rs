pub mod auth;
pub mod response;

pub use auth::{verify_access, AuthUser};
pub use response::{ApiMessage, ApiResponse};

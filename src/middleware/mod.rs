pub mod auth;
pub mod response;

pub use auth::{session_auth_middleware, SessionUser};
pub use response::{ApiResponse, ApiResult};

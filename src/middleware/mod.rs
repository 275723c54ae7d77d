pub mod auth;
pub mod guard;
pub mod response;

pub use auth::{jwt_auth_middleware, Principal};
pub use guard::{capability_middleware, Capability};
pub use response::{ApiResponse, ApiResult};

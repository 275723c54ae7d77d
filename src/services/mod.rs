pub mod access_service;
pub mod error;
pub mod validation;

pub use access_service::{AccessService, AccountInput, ClientInput, PayloadInput, QueryReport};
pub use error::ServiceError;

// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// The router puts each resource's routes behind `capability_middleware`, so
// handlers only run once the caller's roles grant the needed access.
pub mod accounts;
pub mod auth;
pub mod clients;
pub mod payloads;
pub mod permissions;
pub mod reports;

// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition only. Everything else lives under /api and goes through
// jwt_auth_middleware.
pub mod auth;

// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token + per-handler capability guard)
pub mod public;    // /, /health, /auth/*
pub mod protected; // /api/*

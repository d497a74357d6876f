// handlers/public/mod.rs - Public handlers (no authentication)
pub mod auth;

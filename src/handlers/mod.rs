// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token verified by jwt_auth_middleware)
pub mod public;    // /auth/* - token acquisition via the auth provider
pub mod protected; // /notes/* - requires a verified Identity

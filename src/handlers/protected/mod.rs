// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here runs behind jwt_auth_middleware and receives the
// caller's Identity. All note access is scoped by that identity.
pub mod notes;
pub mod session;

pub use session::whoami;

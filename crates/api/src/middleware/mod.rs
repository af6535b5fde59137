// API Middleware
//
// Bearer-token authentication for the gateway routes.

pub mod auth;

pub use auth::{auth_middleware, AuthState, AuthenticatedUser};

//! The API endpoint URIs.

/// The root route, which responds with a plain greeting so deployments can
/// check that the server is up.
pub const ROOT: &str = "/";
/// The route for registering a new account.
pub const REGISTER: &str = "/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/login";

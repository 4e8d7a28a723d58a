/// State management module
///
/// This module handles all application state, including:
/// - Domain data structures shared between the API and UI layers (data.rs)
/// - Session token persistence and the routing guard (session.rs)

pub mod data;
pub mod session;

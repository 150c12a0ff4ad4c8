//! Session-related types.

/// Session keys for visitor state.
pub mod keys {
    /// Key for the opaque per-browser visitor token.
    pub const VISITOR_TOKEN: &str = "visitor_token";
}

//! Instruction argument structures and their validation

/// Create action arguments
pub mod create_action;
/// Snapshot holder input and sanitization
pub mod take_snapshot;

// Re-export all public types for easy access
pub use create_action::*;
pub use take_snapshot::*;

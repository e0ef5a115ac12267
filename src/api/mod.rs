//! API Lambda handler and request processing

pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod signature;
pub mod sqs;
pub mod summarize_handler;
pub mod webhook_handler;

// Re-export the main handler for convenience
pub use handler::handler;

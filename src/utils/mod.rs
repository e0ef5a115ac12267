pub mod filters;

pub use filters::{MessageFilter, format_for_summarization};

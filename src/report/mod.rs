//! Report rendering: Markdown and JSON documents plus the intelligence
//! prompt.

pub mod generator;
pub mod prompt;

pub use generator::{generate_json_report, generate_markdown_report};
pub use prompt::render_intelligence_prompt;

//! Report rendering.
//!
//! Turns computed tables into Markdown (with text charts) or JSON.

pub mod charts;
pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};

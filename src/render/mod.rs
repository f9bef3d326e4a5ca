//! Rendering check results as a text report or JSON.

mod json;
mod options;
mod text;

pub use json::{to_json, to_json_with_issues, JsonFormat};
pub use options::RenderOptions;
pub use text::{render_text, to_text};

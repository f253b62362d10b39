//! Template domain - `${var:name}` substitution for keys, URLs and prompts

mod render;

pub use render::{render_template, Template, TemplateError, TemplateVariable};

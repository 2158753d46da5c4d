//! # sockgen-renderer
//!
//! Tera-based template engine that renders the output file from discovered
//! host data.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sockgen_renderer::{TemplateEngine, TemplateInput};
//!
//! fn render_once(template: &Path, input: &TemplateInput) {
//!     if let Ok(engine) = TemplateEngine::load(template) {
//!         if let Ok(rendered) = engine.render(input) {
//!             println!("{} bytes", rendered.len());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::TemplateInput;
pub use engine::TemplateEngine;
pub use error::RenderError;

//! Tera rendering engine for the output template.
//!
//! The template file is read and parsed fresh on every reconciliation cycle
//! (it is itself watched for changes), so [`TemplateEngine::load`] is cheap
//! to call per cycle. Three helper functions are registered alongside the
//! template:
//!
//! | Function          | Arguments               | Behavior                          |
//! |-------------------|-------------------------|-----------------------------------|
//! | `map_index`       | `map`, `key`, `default` | Map lookup with fallback          |
//! | `index_if_exists` | `list`, `index`, `default` | List lookup with fallback      |
//! | `file_exists`     | `path`                  | `true` if the path exists on disk |

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tera::{Tera, Value};

use crate::context::TemplateInput;
use crate::error::RenderError;

const OUTPUT_TEMPLATE: &str = "output";

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn map_index(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let key = args
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("map_index: `key` must be a string"))?;
    let default = args.get("default").cloned().unwrap_or(Value::Null);
    let found = args
        .get("map")
        .and_then(Value::as_object)
        .and_then(|map| map.get(key))
        .cloned();
    Ok(found.unwrap_or(default))
}

fn index_if_exists(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let index = args
        .get("index")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg("index_if_exists: `index` must be a non-negative integer"))?;
    let default = args.get("default").cloned().unwrap_or(Value::Null);
    let found = args
        .get("list")
        .and_then(Value::as_array)
        .and_then(|list| list.get(index as usize))
        .cloned();
    Ok(found.unwrap_or(default))
}

fn file_exists(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let path = args
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("file_exists: `path` must be a string"))?;
    Ok(Value::Bool(Path::new(path).exists()))
}

fn register_functions(tera: &mut Tera) {
    tera.register_function("map_index", map_index);
    tera.register_function("index_if_exists", index_if_exists);
    tera.register_function("file_exists", file_exists);
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for a single output template.
#[derive(Debug)]
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Read and parse the template file at `path`.
    ///
    /// A missing file or a syntax error surfaces here, before anything is
    /// rendered or written.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let text = fs::read_to_string(path).map_err(|e| RenderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_template_text(&text)
    }

    /// Parse template text directly (used by [`TemplateEngine::load`] and
    /// tests).
    pub fn from_template_text(text: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(OUTPUT_TEMPLATE, text)?;
        register_functions(&mut tera);
        Ok(TemplateEngine { tera })
    }

    /// Render the template against `input` into an in-memory buffer.
    pub fn render(&self, input: &TemplateInput) -> Result<String, RenderError> {
        let ctx = input.to_tera_context()?;
        Ok(self.tera.render(OUTPUT_TEMPLATE, &ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

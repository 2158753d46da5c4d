//! Template context — the serializable rendering payload for one cycle.

use std::collections::BTreeMap;

use serde::Serialize;

use sockgen_core::types::HostMap;

use crate::error::RenderError;

/// The full data handed to the renderer per reconciliation cycle.
///
/// `listen_addrs` and `env` are computed once at startup and stay constant
/// for the process lifetime; `hosts` is rebuilt from scratch every cycle and
/// discarded after rendering. Serialized field names are PascalCase so
/// templates read `ListenAddrs`, `Env`, and `Hosts`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateInput {
    /// Listen addresses resolved from socket activation or `LISTEN_ADDR`.
    pub listen_addrs: Vec<String>,
    /// Environment variables selected by the fixed prefix, prefix stripped.
    pub env: BTreeMap<String, String>,
    /// Discovered hosts keyed by their final `config["host"]` value.
    pub hosts: HostMap,
}

impl TemplateInput {
    /// Build the static part of the input; `hosts` starts empty.
    pub fn new(listen_addrs: Vec<String>, env: BTreeMap<String, String>) -> Self {
        TemplateInput {
            listen_addrs,
            env,
            hosts: HostMap::new(),
        }
    }

    /// A copy of the static input carrying this cycle's freshly-built hosts.
    pub fn with_hosts(&self, hosts: HostMap) -> Self {
        TemplateInput {
            listen_addrs: self.listen_addrs.clone(),
            env: self.env.clone(),
            hosts,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

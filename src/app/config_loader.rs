use once_cell::sync::OnceCell;
use serde_json::error::Category;
use std::sync::Arc;

use crate::{
    app::{mcp_config::McpConfig, ports::ConfigSourcePort},
    domain::{
        descriptor::ConfigSnapshot,
        errors::{DomainError, Result},
    },
};

pub fn parse_config(bytes: &[u8]) -> Result<ConfigSnapshot> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DomainError::ConfigLoad(format!("config is not valid UTF-8: {}", e)))?;
    // Straight from text: an intermediate `Value` would reorder parameters.
    let snapshot: ConfigSnapshot = serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Data => DomainError::ConfigSchema(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => {
            DomainError::ConfigLoad(format!("config is not valid JSON: {}", e))
        }
    })?;
    snapshot.check_invariants()?;
    Ok(snapshot)
}

pub fn load_from(source: &dyn ConfigSourcePort) -> Result<ConfigSnapshot> {
    let bytes = source.read()?;
    parse_config(&bytes)
}

/// First successful load wins; later calls reuse it without reading their
/// source. A failed load leaves the loader empty.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    cell: OnceCell<Arc<McpConfig>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, source: &dyn ConfigSourcePort) -> Result<Arc<McpConfig>> {
        if let Some(config) = self.cell.get() {
            tracing::debug!(source = %source.describe(), "config already loaded; reusing snapshot");
            return Ok(Arc::clone(config));
        }

        self.cell
            .get_or_try_init(|| {
                let snapshot = load_from(source)?;
                tracing::info!(
                    source = %source.describe(),
                    name = %snapshot.name,
                    version = %snapshot.version,
                    tools = snapshot.tools.len(),
                    "config loaded"
                );
                Ok::<_, DomainError>(Arc::new(McpConfig::new(snapshot)))
            })
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<McpConfig>> {
        self.cell.get().cloned()
    }
}

//! Server registry: the catalog of MCP server definitions.
//!
//! The registry is a read-only collaborator from the core's perspective: the
//! draft builder looks definitions up by id and resolves them into client
//! configuration entries. Definitions come from the built-in catalog
//! ([`defaults::default_catalog`]) and from caller-registered additions.

pub mod defaults;
pub mod models;

pub use models::{
    HttpAuthType, PackageManager, ParameterDefinition, ParameterType, ServerDefinition,
    TransportType,
};

use crate::core::{OrchestratorError, Result};
use std::collections::BTreeMap;

/// Registry of known MCP servers with lookup and search.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: BTreeMap<String, ServerDefinition>,
}

impl ServerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-loaded with the built-in catalog.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for server in defaults::default_catalog() {
            registry.register(server).expect("catalog ids are unique");
        }
        registry
    }

    /// Register a server definition.
    ///
    /// # Errors
    ///
    /// Fails if the server id is already registered.
    pub fn register(&mut self, server: ServerDefinition) -> Result<()> {
        if self.servers.contains_key(&server.server_id) {
            return Err(OrchestratorError::DuplicateServer {
                server_id: server.server_id.clone(),
            });
        }
        self.servers.insert(server.server_id.clone(), server);
        Ok(())
    }

    /// Look up a server definition by id.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ServerNotFound`] if the id is unknown.
    pub fn lookup(&self, server_id: &str) -> Result<&ServerDefinition> {
        self.servers.get(server_id).ok_or_else(|| OrchestratorError::ServerNotFound {
            server_id: server_id.to_string(),
        })
    }

    /// Check whether a server id is registered.
    #[must_use]
    pub fn has(&self, server_id: &str) -> bool {
        self.servers.contains_key(server_id)
    }

    /// All registered definitions, sorted by server id.
    pub fn list_all(&self) -> impl Iterator<Item = &ServerDefinition> {
        self.servers.values()
    }

    /// Search definitions by substring over id, display name, description,
    /// and tags (case-insensitive).
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&ServerDefinition> {
        let query = query.to_lowercase();
        self.servers
            .values()
            .filter(|s| {
                s.server_id.to_lowercase().contains(&query)
                    || s.display_name.to_lowercase().contains(&query)
                    || s.description.to_lowercase().contains(&query)
                    || s.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Number of registered servers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.servers.len()
    }
}

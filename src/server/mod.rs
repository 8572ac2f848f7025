//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state management

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::agents::AgentClient;
use crate::config::Config;
use crate::memory::SqliteStorage;
use crate::service::ResearchService;

/// Application state shared across handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Research service facade.
    pub service: ResearchService,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: SqliteStorage, client: AgentClient) -> Self {
        let service = ResearchService::new(&config, storage, client);
        Self { config, service }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;

//! # MCP Research Crew Server
//!
//! A Model Context Protocol (MCP) server that runs a four-agent research
//! pipeline (coordinator, researcher, analyst, writer) with an adaptive
//! quality-feedback retry loop.
//!
//! ## Features
//!
//! - **Sequential crew pipeline**: four role pipes executed strictly in order
//! - **Deterministic quality scoring**: completeness, structure, and
//!   evidence-ratio metrics computed from the report text alone
//! - **Retry with feedback**: below-threshold reports are regenerated with
//!   corrective instructions injected into every stage, up to a bounded
//!   number of retries
//! - **Query history**: completed runs persisted to SQLite with claim and
//!   source counts
//! - **Semantic search**: reports indexed by embedding and searched by
//!   cosine distance
//! - **Performance tracking**: per-process record of quality improvement
//!   across queries
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (Rust) → Langbase Pipes (HTTP)
//!                    ↓
//!              SQLite (History + Index)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mcp_research_crew::{Config, AppState, McpServer};
//! use mcp_research_crew::agents::AgentClient;
//! use mcp_research_crew::memory::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let client = AgentClient::from_config(&config)?;
//!     let state = Arc::new(AppState::new(config, storage, client));
//!     let server = McpServer::new(state);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Langbase agent client backing the crew role pipes.
pub mod agents;
/// Configuration management for the MCP server.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// SQLite persistence for query history and the semantic index.
pub mod memory;
/// The adaptive quality-feedback pipeline core.
pub mod pipeline;
/// System prompts for the crew role pipes.
pub mod prompts;
/// MCP server implementation and request handling.
pub mod server;
/// Research service facade tying the pipeline to persistence.
pub mod service;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};

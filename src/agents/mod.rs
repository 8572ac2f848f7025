//! Langbase-backed agent client for the crew role pipes.
//!
//! Each crew role (coordinator, researcher, analyst, writer) is a Langbase
//! pipe; this module provides the HTTP client, wire types, and the
//! [`StageRunner`](crate::pipeline::StageRunner) implementation the pipeline
//! executor depends on.

mod client;
mod types;

pub use client::AgentClient;
pub use types::{
    CreatePipeRequest, CreatePipeResponse, EmbedRequest, Message, MessageRole, PipeRequest,
    PipeResponse, RawResponse, Usage,
};

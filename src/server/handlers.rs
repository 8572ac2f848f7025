use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use super::SharedState;
use crate::error::{McpError, McpResult};

/// Queries shorter than this are rejected before the pipeline runs.
const MIN_QUERY_LEN: usize = 3;
/// Queries longer than this are rejected before the pipeline runs.
const MAX_QUERY_LEN: usize = 500;

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "research_run" => handle_research_run(state, arguments).await,
        "research_history" => handle_research_history(state, arguments).await,
        "research_search" => handle_research_search(state, arguments).await,
        "research_semantic_search" => handle_research_semantic_search(state, arguments).await,
        "research_performance_stats" => handle_performance_stats(state).await,
        "research_performance_history" => handle_performance_history(state).await,
        "research_memory_stats" => handle_memory_stats(state).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Parse tool arguments into a typed parameter struct
fn parse_arguments<T: DeserializeOwned>(tool_name: &str, arguments: Option<Value>) -> McpResult<T> {
    let arguments = arguments.ok_or_else(|| McpError::InvalidParameters {
        tool_name: tool_name.to_string(),
        message: "Missing arguments".to_string(),
    })?;

    serde_json::from_value(arguments).map_err(|e| McpError::InvalidParameters {
        tool_name: tool_name.to_string(),
        message: e.to_string(),
    })
}

/// Validate a research query at the transport boundary.
///
/// Boundary concern only: the retry controller never sees invalid input.
fn validate_query(tool_name: &str, query: &str) -> McpResult<String> {
    let trimmed = query.trim();
    if trimmed.len() < MIN_QUERY_LEN {
        return Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: format!("query must be at least {} characters", MIN_QUERY_LEN),
        });
    }
    if trimmed.len() > MAX_QUERY_LEN {
        return Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: format!("query must be at most {} characters", MAX_QUERY_LEN),
        });
    }
    Ok(trimmed.to_string())
}

/// Handle research_run tool call
async fn handle_research_run(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct RunParams {
        query: String,
    }

    let params: RunParams = parse_arguments("research_run", arguments)?;
    let query = validate_query("research_run", &params.query)?;

    // Pipeline failures surface in the documented result shape rather than
    // as a protocol error: {success: false, error}.
    match state.service.run(&query).await {
        Ok(result) => serde_json::to_value(result).map_err(McpError::Json),
        Err(e) => {
            error!(error = %e, "Research run failed");
            Ok(serde_json::json!({
                "success": false,
                "error": e.to_string(),
            }))
        }
    }
}

/// Handle research_history tool call
async fn handle_research_history(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct HistoryParams {
        #[serde(default = "default_history_limit")]
        limit: u32,
    }

    fn default_history_limit() -> u32 {
        10
    }

    let params: HistoryParams = match arguments {
        Some(_) => parse_arguments("research_history", arguments)?,
        None => HistoryParams {
            limit: default_history_limit(),
        },
    };

    let history = state
        .service
        .history(params.limit)
        .await
        .map_err(McpError::from)?;

    let count = history.len();
    Ok(serde_json::json!({
        "success": true,
        "history": history,
        "count": count,
    }))
}

/// Handle research_search tool call
async fn handle_research_search(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct SearchParams {
        term: String,
        #[serde(default = "default_search_limit")]
        limit: u32,
    }

    fn default_search_limit() -> u32 {
        5
    }

    let params: SearchParams = parse_arguments("research_search", arguments)?;

    let results = state
        .service
        .search(&params.term, params.limit)
        .await
        .map_err(McpError::from)?;

    let count = results.len();
    Ok(serde_json::json!({
        "success": true,
        "results": results,
        "count": count,
    }))
}

/// Handle research_semantic_search tool call
async fn handle_research_semantic_search(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct SemanticParams {
        query: String,
        #[serde(default = "default_top_k")]
        top_k: usize,
    }

    fn default_top_k() -> usize {
        5
    }

    let params: SemanticParams = parse_arguments("research_semantic_search", arguments)?;

    let hits = state
        .service
        .semantic_search(&params.query, params.top_k)
        .await
        .map_err(McpError::from)?;

    let count = hits.len();
    Ok(serde_json::json!({
        "success": true,
        "hits": hits,
        "count": count,
    }))
}

/// Handle research_performance_stats tool call
async fn handle_performance_stats(state: &SharedState) -> McpResult<Value> {
    let stats = state.service.performance_stats().await;
    serde_json::to_value(stats).map_err(McpError::Json)
}

/// Handle research_performance_history tool call
async fn handle_performance_history(state: &SharedState) -> McpResult<Value> {
    let history = state.service.performance_history().await;

    let total = history.len();
    Ok(serde_json::json!({
        "success": true,
        "performance_history": history,
        "total_queries": total,
    }))
}

/// Handle research_memory_stats tool call
async fn handle_memory_stats(state: &SharedState) -> McpResult<Value> {
    let stats = state.service.memory_stats().await.map_err(McpError::from)?;
    serde_json::to_value(stats).map_err(McpError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query_trims_and_accepts() {
        let query = validate_query("research_run", "  why is the sky blue  ").unwrap();
        assert_eq!(query, "why is the sky blue");
    }

    #[test]
    fn test_validate_query_rejects_short() {
        let err = validate_query("research_run", " a ").unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters { .. }));

        let err = validate_query("research_run", "   ").unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[test]
    fn test_validate_query_rejects_long() {
        let long = "x".repeat(MAX_QUERY_LEN + 1);
        let err = validate_query("research_run", &long).unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn test_parse_arguments_missing() {
        #[derive(Deserialize, Debug)]
        struct Params {
            #[allow(dead_code)]
            query: String,
        }

        let err = parse_arguments::<Params>("research_run", None).unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters { .. }));
    }

    #[test]
    fn test_parse_arguments_wrong_shape() {
        #[derive(Deserialize, Debug)]
        struct Params {
            #[allow(dead_code)]
            query: String,
        }

        let err =
            parse_arguments::<Params>("research_run", Some(serde_json::json!({"q": 1}))).unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters { .. }));
    }
}

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{CreatePipeRequest, CreatePipeResponse, EmbedRequest, Message, PipeRequest, PipeResponse};
use crate::config::{Config, LangbaseConfig, PipeConfig, RequestConfig};
use crate::error::{AgentError, AgentResult};
use crate::pipeline::{StageRole, StageRunner};
use crate::prompts::prompt_for_role;

/// Client for the Langbase Pipes API backing the crew roles
#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
    pipes: PipeConfig,
}

impl AgentClient {
    /// Create a new agent client
    pub fn new(config: &LangbaseConfig, request_config: RequestConfig, pipes: PipeConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(AgentError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
            pipes,
        })
    }

    /// Create a client from full application config
    pub fn from_config(config: &Config) -> AgentResult<Self> {
        Self::new(&config.langbase, config.request.clone(), config.pipes.clone())
    }

    /// Pipe name configured for a crew role
    pub fn pipe_for_role(&self, role: StageRole) -> &str {
        match role {
            StageRole::Coordinator => &self.pipes.coordinator,
            StageRole::Researcher => &self.pipes.researcher,
            StageRole::Analyst => &self.pipes.analyst,
            StageRole::Writer => &self.pipes.writer,
        }
    }

    /// Call a Langbase pipe with the given request
    pub async fn call_pipe(&self, request: PipeRequest) -> AgentResult<PipeResponse> {
        let url = format!("{}/v1/pipes/run", self.base_url);
        let pipe_name = request.name.clone();

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    pipe = %pipe_name,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying Langbase request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, &request).await {
                Ok(response) => {
                    let latency = start.elapsed();
                    info!(
                        pipe = %pipe_name,
                        latency_ms = latency.as_millis(),
                        "Langbase pipe call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    let latency = start.elapsed();
                    error!(
                        pipe = %pipe_name,
                        error = %e,
                        latency_ms = latency.as_millis(),
                        retry = retries,
                        "Langbase pipe call failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(AgentError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(&self, url: &str, request: &PipeRequest) -> AgentResult<PipeResponse> {
        debug!(
            pipe = %request.name,
            messages = request.messages.len(),
            "Calling Langbase pipe"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    AgentError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let pipe_response: PipeResponse =
            response
                .json()
                .await
                .map_err(|e| AgentError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Ok(pipe_response)
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Embed text chunks, returning one vector per chunk
    pub async fn embed(&self, chunks: Vec<String>) -> AgentResult<Vec<Vec<f64>>> {
        let url = format!("{}/v1/embed", self.base_url);
        let request = EmbedRequest::new(chunks);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(AgentError::Http)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let vectors: Vec<Vec<f64>> =
            response
                .json()
                .await
                .map_err(|e| AgentError::InvalidResponse {
                    message: format!("Failed to parse embed response: {}", e),
                })?;

        Ok(vectors)
    }

    /// Create a new pipe
    pub async fn create_pipe(&self, request: CreatePipeRequest) -> AgentResult<CreatePipeResponse> {
        let url = format!("{}/v1/pipes", self.base_url);

        info!(pipe = %request.name, "Creating Langbase pipe");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(AgentError::Http)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let pipe_response: CreatePipeResponse =
            response
                .json()
                .await
                .map_err(|e| AgentError::InvalidResponse {
                    message: format!("Failed to parse create pipe response: {}", e),
                })?;

        info!(
            pipe = %pipe_response.name,
            url = %pipe_response.url,
            "Pipe created successfully"
        );

        Ok(pipe_response)
    }

    /// Ensure all four role pipes exist, creating them if needed
    pub async fn ensure_role_pipes(&self) -> AgentResult<()> {
        for role in StageRole::ALL {
            let pipe_name = self.pipe_for_role(role).to_string();
            let request = CreatePipeRequest::new(&pipe_name)
                .with_description(format!("{} role for the research crew", role))
                .with_model("openai:gpt-4o-mini")
                .with_upsert(true)
                .with_temperature(0.7)
                .with_max_tokens(2000)
                .with_messages(vec![Message::system(prompt_for_role(role))]);

            match self.create_pipe(request).await {
                Ok(_) => {
                    info!(pipe = %pipe_name, role = %role, "Role pipe ready");
                }
                Err(AgentError::Api { status: 409, .. }) => {
                    // Pipe already exists, that's fine
                    info!(pipe = %pipe_name, role = %role, "Pipe already exists");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StageRunner for AgentClient {
    /// Run one crew stage through the role's pipe.
    ///
    /// The stage's system prompt comes from the role; the upstream stage's
    /// output (when present) and the task instructions are passed as user
    /// messages. The pipe's completion text is the stage output.
    async fn run_stage(
        &self,
        role: StageRole,
        instructions: &str,
        query: &str,
        context: &str,
    ) -> AgentResult<String> {
        let pipe_name = self.pipe_for_role(role).to_string();

        let mut messages = vec![Message::system(prompt_for_role(role))];
        if !context.is_empty() {
            messages.push(Message::user(format!(
                "Output of the previous stage:\n{}",
                context
            )));
        }
        messages.push(Message::user(format!(
            "{}\n\nUser query: \"{}\"",
            instructions, query
        )));

        let request = PipeRequest::new(&pipe_name, messages);
        let response = self.call_pipe(request).await.map_err(|e| AgentError::Stage {
            role: role.to_string(),
            message: e.to_string(),
        })?;

        Ok(response.completion)
    }
}

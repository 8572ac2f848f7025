//! One sequential pass through the four crew stages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::AgentResult;

/// Crew role executing one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageRole {
    /// Plans the research and sets expectations for the final answer.
    Coordinator,
    /// Gathers relevant findings and sources.
    Researcher,
    /// Extracts claims and supporting evidence from the findings.
    Analyst,
    /// Produces the final Markdown report.
    Writer,
}

impl StageRole {
    /// All roles in pipeline execution order.
    pub const ALL: [StageRole; 4] = [
        StageRole::Coordinator,
        StageRole::Researcher,
        StageRole::Analyst,
        StageRole::Writer,
    ];
}

impl std::fmt::Display for StageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageRole::Coordinator => write!(f, "coordinator"),
            StageRole::Researcher => write!(f, "researcher"),
            StageRole::Analyst => write!(f, "analyst"),
            StageRole::Writer => write!(f, "writer"),
        }
    }
}

/// Capability interface for executing a single stage.
///
/// One operation per stage role; the production implementation calls the
/// role's Langbase pipe. Injected at construction so the executor never
/// needs to know about transports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Run one stage and return its raw text output.
    async fn run_stage(
        &self,
        role: StageRole,
        instructions: &str,
        query: &str,
        context: &str,
    ) -> AgentResult<String>;
}

const COORDINATOR_TASK: &str = "Make a short plan for how the team should answer the query: \
research, then analysis, then writing. Note what to look for during research and what a good \
final answer should contain.";

const RESEARCHER_TASK: &str = "Gather 3-7 relevant findings for the query, following the plan. \
Focus on authority, clarity, and diversity of sources. Include titles, short excerpts, and URLs \
when possible.";

const ANALYST_TASK: &str = "From the research results: 1) produce a concise summary \
(4-6 sentences); 2) extract 2-5 key claims; 3) for each claim, identify the supporting evidence; \
4) rate a confidence level for each claim. Return structured text with sections: Summary, Claims, \
Evidence.";

const WRITER_TASK: &str = "Using the structured analysis, write the final answer in Markdown with \
sections: Overview, Key Claims, Sources. Present each claim with its supporting evidence. Use \
headers and bullet points.";

/// Task instructions for a stage, with the enhancement context prepended
/// when a retry carries corrective feedback.
fn stage_instructions(role: StageRole, enhancement: &str) -> String {
    let task = match role {
        StageRole::Coordinator => COORDINATOR_TASK,
        StageRole::Researcher => RESEARCHER_TASK,
        StageRole::Analyst => ANALYST_TASK,
        StageRole::Writer => WRITER_TASK,
    };
    if enhancement.is_empty() {
        task.to_string()
    } else {
        format!("{}\n{}", enhancement, task)
    }
}

/// Executes the four-stage pipeline once per call.
///
/// Stages run strictly in order; each stage receives the prior stage's
/// output as context. Any stage failure aborts the whole execution; a
/// partial pipeline result is not usable.
#[derive(Clone)]
pub struct PipelineExecutor<R> {
    runner: R,
}

impl<R: StageRunner> PipelineExecutor<R> {
    /// Create an executor over the given stage runner.
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run all four stages and return the writer's report text.
    ///
    /// `enhancement` is prepended to every stage's instructions when
    /// non-empty; an empty enhancement leaves the prompts untouched.
    pub async fn execute(&self, query: &str, enhancement: &str) -> AgentResult<String> {
        let start = Instant::now();
        let mut context = String::new();

        for role in StageRole::ALL {
            let instructions = stage_instructions(role, enhancement);
            debug!(role = %role, "Running pipeline stage");
            context = self
                .runner
                .run_stage(role, &instructions, query, &context)
                .await?;
        }

        info!(
            latency_ms = start.elapsed().as_millis() as i64,
            enhanced = !enhancement.is_empty(),
            "Pipeline execution completed"
        );
        Ok(context)
    }
}

//! Top-level per-query orchestration.
//!
//! `RagSystem` wires the answer generator, the retrieval tools, and the
//! session store together: it wraps the raw question in the instruction
//! template, threads conversation history into the generator, collects the
//! provenance sources the tools recorded, and logs the exchange back into
//! the session.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::{AnswerGenerator, GenerateError};
use crate::config::Config;
use crate::llm::{AnthropicClient, CompletionClient, LlmError};
use crate::session::SessionManager;
use crate::store::VectorStore;
use crate::tools::{CourseOutlineTool, CourseSearchTool, Source, ToolManager};

/// Aggregate catalog statistics for the API layer.
#[derive(Debug, Clone)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

pub struct RagSystem {
    store: Arc<dyn VectorStore>,
    generator: AnswerGenerator,
    session_manager: SessionManager,
    max_results: usize,
}

impl RagSystem {
    /// Build against the hosted completion service.
    pub fn new(config: &Config, store: Arc<dyn VectorStore>) -> Result<Self, LlmError> {
        let client = AnthropicClient::new(
            &config.api_key,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_client(config, Arc::new(client), store))
    }

    /// Build with an explicit completion client. Tests inject a scripted one.
    pub fn with_client(
        config: &Config,
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            generator: AnswerGenerator::new(client, config.model.clone()),
            session_manager: SessionManager::new(config.max_history),
            max_results: config.max_results,
            store,
        }
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    /// Answer one question, returning the text and the sources it drew upon.
    ///
    /// A fresh `ToolManager` is built per query so that no source buffer is
    /// ever shared between in-flight requests.
    pub async fn query(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<(String, Vec<Source>), GenerateError> {
        let prompt = format!("Answer this question about course materials: {}", text);

        let history = match session_id {
            Some(id) => self.session_manager.conversation_history(id).await,
            None => None,
        };

        let mut tool_manager = ToolManager::new();
        tool_manager.register(Arc::new(CourseSearchTool::new(
            self.store.clone(),
            self.max_results,
        )));
        tool_manager.register(Arc::new(CourseOutlineTool::new(self.store.clone())));
        let definitions = tool_manager.definitions();

        let answer = self
            .generator
            .generate(
                &prompt,
                history.as_deref(),
                Some(&definitions),
                Some(&tool_manager),
            )
            .await?;

        let sources = tool_manager.last_sources();
        tool_manager.reset_sources();

        if let Some(id) = session_id {
            self.session_manager.add_exchange(id, text, &answer).await;
        }

        Ok((answer, sources))
    }

    /// Catalog statistics for the courses endpoint.
    pub async fn get_course_analytics(&self) -> anyhow::Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.store.course_count().await?,
            course_titles: self.store.course_titles().await?,
        })
    }
}

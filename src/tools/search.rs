//! Course-content search tool.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Source, Tool};
use crate::store::VectorStore;

/// Searches indexed course content with optional course and lesson filters,
/// recording the provenance of everything it returns.
pub struct CourseSearchTool {
    store: Arc<dyn VectorStore>,
    max_results: usize,
    sources: Mutex<Vec<Source>>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn VectorStore>, max_results: usize) -> Self {
        Self {
            store,
            max_results,
            sources: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        "search_course_content"
    }

    fn description(&self) -> &str {
        "Search course materials with smart course name matching and lesson filtering. Returns matching content chunks labeled with their course and lesson."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for in the course content"
                },
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial matches work, e.g. 'MCP')"
                },
                "lesson_number": {
                    "type": "integer",
                    "description": "Specific lesson number to search within (e.g. 3)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let course_name = args["course_name"].as_str();
        let lesson_number = args["lesson_number"].as_u64().map(|n| n as u32);

        let mut results = self
            .store
            .search(query, course_name, lesson_number, self.max_results)
            .await;

        // Terminal retrieval failure: report it verbatim, leave sources alone.
        if let Some(error) = results.error.take() {
            return Ok(error);
        }

        if results.is_empty() {
            let mut message = String::from("No relevant content found");
            if let Some(course) = course_name {
                message.push_str(&format!(" in course '{}'", course));
            }
            // Presence check, not truthiness: lesson 0 is a valid filter.
            if let Some(lesson) = lesson_number {
                message.push_str(&format!(" in lesson {}", lesson));
            }
            message.push('.');
            return Ok(message);
        }

        let mut blocks = Vec::with_capacity(results.documents.len());
        let mut seen: Vec<(String, Option<u32>)> = Vec::new();
        let mut sources = Vec::new();

        for (document, meta) in results.documents.iter().zip(results.metadata.iter()) {
            let header = match meta.lesson_number {
                Some(n) => format!("[{} - Lesson {}]", meta.course_title, n),
                None => format!("[{}]", meta.course_title),
            };
            blocks.push(format!("{}\n{}", header, document));

            // One source per unique (course, lesson) pair; first occurrence wins.
            let key = (meta.course_title.clone(), meta.lesson_number);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            let url = match meta.lesson_number {
                Some(n) => match self.store.get_lesson_link(&meta.course_title, n).await {
                    Some(link) => Some(link),
                    None => self.store.get_course_link(&meta.course_title).await,
                },
                None => self.store.get_course_link(&meta.course_title).await,
            };
            let text = match meta.lesson_number {
                Some(n) => format!("{} - Lesson {}", meta.course_title, n),
                None => meta.course_title.clone(),
            };
            sources.push(Source { text, url });
        }

        *self.sources.lock().unwrap() = sources;

        Ok(blocks.join("\n\n"))
    }

    fn last_sources(&self) -> Vec<Source> {
        self.sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.sources.lock().unwrap().clear();
    }
}

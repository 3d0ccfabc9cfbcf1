//! Course-outline tool.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Source, Tool};
use crate::store::VectorStore;

/// Returns the structure of a course: title, link, and its lesson list.
pub struct CourseOutlineTool {
    store: Arc<dyn VectorStore>,
    sources: Mutex<Vec<Source>>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            sources: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        "get_course_outline"
    }

    fn description(&self) -> &str {
        "Get the complete outline of a course: its title, link, and every lesson number and title."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial matches work, e.g. 'MCP')"
                }
            },
            "required": ["course_name"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let course_name = args["course_name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'course_name' argument"))?;

        let Some(outline) = self.store.get_course_outline(course_name).await else {
            return Ok(format!("No course found matching '{}'.", course_name));
        };

        let mut lines = vec![format!("Course: {}", outline.title)];
        if let Some(link) = &outline.course_link {
            lines.push(format!("Course Link: {}", link));
        }
        lines.push(format!("Lessons ({}):", outline.lessons.len()));
        for lesson in &outline.lessons {
            lines.push(format!("  {}. {}", lesson.number, lesson.title));
        }

        *self.sources.lock().unwrap() = vec![Source {
            text: outline.title.clone(),
            url: outline.course_link.clone(),
        }];

        Ok(lines.join("\n"))
    }

    fn last_sources(&self) -> Vec<Source> {
        self.sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.sources.lock().unwrap().clear();
    }
}

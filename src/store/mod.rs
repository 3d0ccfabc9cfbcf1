//! Retrieval collaborator boundary: the vector-store trait and its result
//! types.

pub mod memory;

pub use memory::InMemoryVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata attached to one indexed content chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: String,
    pub lesson_number: Option<u32>,
}

/// Ranked results of one retrieval query.
///
/// The three vectors are parallel unless `error` is set, in which case they
/// are empty and the error is a terminal tool-level failure rather than an
/// empty result.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// One lesson in a course outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    pub lesson_link: Option<String>,
}

/// Course-level metadata captured at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOutline {
    pub title: String,
    pub course_link: Option<String>,
    pub lessons: Vec<Lesson>,
}

/// One indexed chunk of course content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseChunk {
    pub lesson_number: Option<u32>,
    pub text: String,
}

/// The retrieval collaborator the search tools delegate to.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Rank indexed chunks against `query`, optionally filtered by course
    /// name (fuzzy) and lesson number. A filter that resolves to nothing is
    /// reported through `SearchResults::error`, not as an empty result.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: usize,
    ) -> SearchResults;

    /// Link for a specific lesson, if one was recorded.
    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String>;

    /// Course-level link, if one was recorded.
    async fn get_course_link(&self, course_title: &str) -> Option<String>;

    /// Resolve a (possibly partial) course name to its outline.
    async fn get_course_outline(&self, course_name: &str) -> Option<CourseOutline>;

    async fn course_count(&self) -> anyhow::Result<usize>;

    async fn course_titles(&self) -> anyhow::Result<Vec<String>>;
}

//! In-memory vector store (non-persistent).
//!
//! Chunks are ranked by case-insensitive token overlap with the query. This
//! keeps the retrieval collaborator self-contained; a deployment that wants
//! semantic ranking can provide its own `VectorStore` implementation.

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ChunkMetadata, CourseChunk, CourseOutline, SearchResults, VectorStore};

struct CourseEntry {
    outline: CourseOutline,
    chunks: Vec<CourseChunk>,
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    courses: RwLock<Vec<CourseEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a course and its content chunks.
    pub async fn add_course(&self, outline: CourseOutline, chunks: Vec<CourseChunk>) {
        self.courses
            .write()
            .await
            .push(CourseEntry { outline, chunks });
    }

    /// Resolve a partial, case-insensitive course name to the stored title.
    async fn resolve_title(&self, course_name: &str) -> Option<String> {
        let needle = course_name.to_lowercase();
        self.courses
            .read()
            .await
            .iter()
            .map(|entry| &entry.outline.title)
            .find(|title| title.to_lowercase().contains(&needle))
            .cloned()
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: usize,
    ) -> SearchResults {
        let resolved = match course_name {
            Some(name) => match self.resolve_title(name).await {
                Some(title) => Some(title),
                None => {
                    return SearchResults::error(format!("No course found matching '{}'", name))
                }
            },
            None => None,
        };

        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return SearchResults::empty();
        }

        let courses = self.courses.read().await;
        let mut scored: Vec<(f32, String, ChunkMetadata)> = Vec::new();
        for entry in courses.iter() {
            if let Some(title) = &resolved {
                if &entry.outline.title != title {
                    continue;
                }
            }
            for chunk in &entry.chunks {
                if let Some(wanted) = lesson_number {
                    if chunk.lesson_number != Some(wanted) {
                        continue;
                    }
                }
                let overlap = query_tokens.intersection(&tokenize(&chunk.text)).count();
                if overlap == 0 {
                    continue;
                }
                let distance = 1.0 - overlap as f32 / query_tokens.len() as f32;
                scored.push((
                    distance,
                    chunk.text.clone(),
                    ChunkMetadata {
                        course_title: entry.outline.title.clone(),
                        lesson_number: chunk.lesson_number,
                    },
                ));
            }
        }
        drop(courses);

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        let mut results = SearchResults::empty();
        for (distance, document, metadata) in scored {
            results.documents.push(document);
            results.metadata.push(metadata);
            results.distances.push(distance);
        }
        results
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        self.courses
            .read()
            .await
            .iter()
            .find(|entry| entry.outline.title == course_title)
            .and_then(|entry| {
                entry
                    .outline
                    .lessons
                    .iter()
                    .find(|lesson| lesson.number == lesson_number)
                    .and_then(|lesson| lesson.lesson_link.clone())
            })
    }

    async fn get_course_link(&self, course_title: &str) -> Option<String> {
        self.courses
            .read()
            .await
            .iter()
            .find(|entry| entry.outline.title == course_title)
            .and_then(|entry| entry.outline.course_link.clone())
    }

    async fn get_course_outline(&self, course_name: &str) -> Option<CourseOutline> {
        let title = self.resolve_title(course_name).await?;
        self.courses
            .read()
            .await
            .iter()
            .find(|entry| entry.outline.title == title)
            .map(|entry| entry.outline.clone())
    }

    async fn course_count(&self) -> anyhow::Result<usize> {
        Ok(self.courses.read().await.len())
    }

    async fn course_titles(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .courses
            .read()
            .await
            .iter()
            .map(|entry| entry.outline.title.clone())
            .collect())
    }
}

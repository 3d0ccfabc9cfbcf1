//! # Course Assistant
//!
//! A backend that answers natural-language questions about indexed course
//! material.
//!
//! This library provides:
//! - An HTTP API for submitting questions and browsing the course catalog
//! - A bounded tool-use loop that lets the completion model search course
//!   content before answering
//! - Per-session conversation history for follow-up questions
//!
//! ## Architecture
//!
//! Answering a query follows the "tools in a loop" pattern:
//! 1. Receive a question via the API
//! 2. Build the request with the system prompt and the retrieval tools
//! 3. Call the completion API; if it requests a tool, execute it and feed
//!    the result back
//! 4. Repeat for at most two tool rounds, then force a final text answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use course_assistant::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod rag;
pub mod session;
pub mod store;
pub mod tools;

pub use config::Config;

//! Model adapters used by agents.
//!
//! [`traits::ModelAdapter`] is the boundary between the dispatch loop and a
//! model endpoint; [`ollama`] implements it against a local Ollama daemon.

#![warn(missing_docs, clippy::pedantic)]

pub mod ollama;
pub mod traits;

mod http_client;

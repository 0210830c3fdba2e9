//! Event Search Module
//!
//! Ranks upcoming events against a free-text query.
//!
//! ## Pipeline
//! - **Date gate**: only events dated now or later are candidates.
//! - **Lexical filter**: substring containment of query tokens in the event's
//!   searchable text. An empty match set widens to every candidate, so a
//!   non-empty pool never produces an empty answer.
//! - **Relevance model**: a small dense network re-ranks the survivors when it
//!   loaded at startup. Load or inference failures degrade to date ordering.
//!
//! ## Submodules
//! - **`tokenizer`**: shared lower-case / non-word split.
//! - **`filter`**: the lexical stage.
//! - **`model`**: vocabulary, weights, and inference.
//! - **`engine`**: the orchestrator combining both stages.
//! - **`handlers`**: the HTTP endpoint.
//! - **`types`**: response DTOs.

pub mod engine;
pub mod filter;
pub mod handlers;
pub mod model;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;

//! Volunteer Hub Backend Library
//!
//! Core services behind the volunteer matching platform. The binary
//! (`main.rs`) wires them together and serves them over HTTP.
//!
//! ## Modules
//! - **`accounts`**: volunteer and NGO records, identity resolution.
//! - **`auth`**: bearer token signing and verification, HTTP extractor.
//! - **`events`**: the event catalogue and its endpoints.
//! - **`search`**: lexical filtering plus neural re-ranking of upcoming events.
//! - **`chat`**: room-based real-time chat with a persisted log and roster.
//! - **`storage`**: in-process document collections and seed loading.
//! - **`app`**: shared state and router assembly.
//! - **`config`** / **`error`**: configuration and the error taxonomy.

pub mod accounts;
pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod events;
pub mod search;
pub mod storage;

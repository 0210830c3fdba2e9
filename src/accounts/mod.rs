//! Account Directory Module
//!
//! Holds the volunteer and NGO account records that bearer credentials
//! resolve to. Account management (signup, login, profile edits) lives
//! outside this crate; the directory only answers "who is this id".

pub mod directory;
pub mod types;

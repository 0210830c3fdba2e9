//! Event Catalogue Module
//!
//! Stores volunteering events and exposes the listing, manual creation, and
//! volunteer registration endpoints. Search over this catalogue lives in
//! `crate::search`.

pub mod handlers;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_pub_crate)]

//! HTTP backend for Curator list sessions.
//!
//! [`HttpBackend`] implements [`curator_session::Backend`] over reqwest using
//! configurable route templates.
//!
//! Layout:
//! - `config.rs`: base URL, entity, route templates, CSRF token
//! - `backend.rs`: request shapes and response decoding
//! - `fragment.rs`: row ids and statistics embedded in list markup
//! - `problem.rs`: error classification
//! - `stream.rs`: server-sent events body decoding

pub mod backend;
pub mod config;
pub mod fragment;
mod problem;
mod stream;

pub use backend::HttpBackend;
pub use config::{
    CSRF_FORM_FIELD, DEFAULT_TIMEOUT_MS, Endpoints, HEADER_CSRF, HEADER_REQUESTED_WITH, HttpConfig,
    HttpConfigError,
};
pub use fragment::parse_fragment;

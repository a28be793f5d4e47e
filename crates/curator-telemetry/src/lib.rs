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

//! Logging bootstrap shared by Curator binaries.
//!
//! Installs a `tracing` subscriber (pretty or JSON, `RUST_LOG`-aware) and
//! provides the per-command span used by the CLI.

pub mod context;
pub mod init;

pub use context::{command_span, record_entity};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, UnknownLogFormat, build_sha, init_logging,
    log_format_from_config,
};

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
#![allow(clippy::redundant_pub_crate)]

//! Command-line front end for Curator entity lists.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: search, action, inspection, and watch handlers
//! - `client.rs`: session wiring, error classification, and URL parsing
//! - `profile.rs`: optional JSON profile with session and route overrides
//! - `prompt.rs`: terminal confirmation
//! - `output.rs`: renderers and formatting helpers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod profile;
pub(crate) mod prompt;

pub use cli::run;

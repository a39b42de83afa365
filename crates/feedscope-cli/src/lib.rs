#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line dashboard for the feedback-insights service.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `client.rs`: REST client, API errors, and CLI error classification
//! - `auth.rs`: bearer token sources
//! - `prompt.rs`: confirmation prompts
//! - `views/`: list, form, and dashboard controllers driving `feedscope-core` state
//! - `commands/`: command handlers grouped by concern
//! - `output.rs`: renderers and formatting helpers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod auth;
pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod prompt;
pub(crate) mod views;

pub use cli::run;

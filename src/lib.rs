//! # skonsole
//!
//! Generates commit messages, pull request descriptions and review feedback
//! from git diff output of any size.
//!
//! Raw `git diff` / `git show` text is segmented into commits and file
//! diffs, packed into bounded chunks that carry their headers forward, run
//! through a text-generation model chunk by chunk, and condensed back into a
//! single answer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use skonsole::ai::AiClient;
//! use skonsole::git::GitRepository;
//! use skonsole::skills::PullRequestSkill;
//!
//! async fn describe(client: Arc<dyn AiClient>) -> anyhow::Result<String> {
//!     let repo = GitRepository::open()?;
//!     let diff = repo.pull_request_input("origin/main")?;
//!     PullRequestSkill::new(client).generate_pr_description(&diff).await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod chunk;
pub mod config;
pub mod git;
pub mod pipeline;
pub mod plan;
pub mod skills;
pub mod utils;

pub use crate::config::PipelineConfig;

/// The current version of skonsole.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

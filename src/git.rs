//! Git diff acquisition and segmentation.

pub mod diff_split;
pub mod repository;

pub use diff_split::{split_commits, CommitUnit, FileDiffUnit};
pub use repository::GitRepository;

//! Skills that wire prompts to the chunk-and-condense pipeline.

pub mod prompts;
pub mod pull_request;

pub use pull_request::{
    PullRequestSkill, COMMIT_MESSAGE_RESULT_TAG, DYNAMIC_RESULT_TAG,
    PULL_REQUEST_DESCRIPTION_RESULT_TAG,
};

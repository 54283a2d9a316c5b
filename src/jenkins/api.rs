use async_trait::async_trait;

use crate::error::Result;

use super::types::{BuildParameters, JobRef, LastBuild, QueueItem};

/// The Jenkins calls a launch session depends on.
#[async_trait]
pub trait JenkinsApi: Send + Sync {
    /// Triggers a build and returns the queue item URL from the `Location`
    /// header, or an empty string when the server sent none.
    ///
    /// Uses `buildWithParameters` when `params` is non-empty, `build` otherwise.
    async fn submit_build(&self, job: &JobRef, params: &BuildParameters) -> Result<String>;

    async fn queue_item(&self, queue_url: &str) -> Result<QueueItem>;

    async fn last_build(&self, job: &JobRef) -> Result<LastBuild>;
}

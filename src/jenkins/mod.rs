mod api;
mod client;
pub mod links;
mod types;

pub use api::JenkinsApi;
pub use client::JenkinsClient;
pub use types::{BuildParameters, JobHealth, JobRef, JobStatus, JobSummary};

#[cfg(test)]
pub use types::{Executable, LastBuild, ParameterDefinition, QueueItem};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JLaunchError {
    #[error("Jenkins API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Build submission returned no queue location")]
    MissingQueueLocation,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JLaunchError>;

/// Reasons a launch session ends without a finished build.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("A launch is already running for job '{job}'")]
    AlreadyRunning { job: String },

    #[error("Error launching job: {0}")]
    Submission(#[source] JLaunchError),

    #[error("Error polling build status: {0}")]
    Poll(#[source] JLaunchError),
}

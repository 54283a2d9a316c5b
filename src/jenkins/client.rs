use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Credentials;
use crate::error::{JLaunchError, Result};

use super::api::JenkinsApi;
use super::types::{
    BuildParameters, JobDetail, JobRef, JobSummary, JobsResponse, LastBuild, QueueItem,
};

const USER_AGENT: &str = concat!("jlaunch/", env!("CARGO_PKG_VERSION"));
const ERROR_PREVIEW_CHARS: usize = 300;

/// Jenkins REST client. Every request carries Basic credentials when configured.
pub struct JenkinsClient {
    client: Client,
    /// Submission must see the `Location` header, so it never follows redirects
    submit_client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl JenkinsClient {
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| JLaunchError::Config(format!("Failed to create HTTP client: {e}")))?;

        let submit_client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| JLaunchError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&with_trailing_slash(base_url))
            .map_err(|e| JLaunchError::Config(format!("Invalid Jenkins URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            submit_client,
            base_url,
            credentials,
        })
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => credentials.apply(request),
            None => request,
        }
    }

    /// Resolves a server-supplied URL. Absolute URLs are kept as-is, relative
    /// ones are joined onto the base URL.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .join(target.trim_start_matches('/'))
                .map_err(|e| JLaunchError::Config(format!("Invalid URL '{target}': {e}"))),
            Err(e) => Err(JLaunchError::Config(format!("Invalid URL '{target}': {e}"))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");
        let response = self.auth_request(self.client.get(url)).send().await?;
        let body = checked_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Lists the jobs on the Jenkins root.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        let url = self.resolve("api/json")?;
        let response: JobsResponse = self.get_json(url).await?;
        debug!("Fetched {} jobs", response.jobs.len());
        Ok(response.jobs)
    }

    /// Fetches a job's detail, including its parameter definitions.
    ///
    /// `name` may be a folder path such as `team/app`.
    pub async fn job(&self, name: &str) -> Result<JobRef> {
        let url = self.resolve(&format!("{}api/json", job_path(name)))?;

        match self.get_json::<JobDetail>(url).await {
            Ok(detail) => Ok(JobRef::from(detail)),
            Err(JLaunchError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(JLaunchError::JobNotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl JenkinsApi for JenkinsClient {
    async fn submit_build(&self, job: &JobRef, params: &BuildParameters) -> Result<String> {
        let endpoint = if params.is_empty() {
            "build"
        } else {
            "buildWithParameters"
        };
        let url = self.resolve(&format!("{}{endpoint}", with_trailing_slash(&job.url)))?;
        debug!("POST {url} ({} parameters)", params.len());

        let mut request = self.submit_client.post(url);
        if !params.is_empty() {
            let form: Vec<(&str, &str)> = params.iter().collect();
            request = request.form(&form);
        }

        let response = self.auth_request(request).send().await?;
        let status = response.status();

        if !(status.is_success() || status.is_redirection()) {
            return Err(api_error(response).await);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if location.is_empty() {
            warn!("Build for '{}' was accepted without a queue location", job.name);
        }

        Ok(location)
    }

    async fn queue_item(&self, queue_url: &str) -> Result<QueueItem> {
        if queue_url.is_empty() {
            return Err(JLaunchError::MissingQueueLocation);
        }
        let url = self.resolve(&format!("{}api/json", with_trailing_slash(queue_url)))?;
        self.get_json(url).await
    }

    async fn last_build(&self, job: &JobRef) -> Result<LastBuild> {
        let url = self.resolve(&format!("{}lastBuild/api/json", with_trailing_slash(&job.url)))?;
        self.get_json(url).await
    }
}

/// Maps `team/app` to `job/team/job/app/`.
pub fn job_path(name: &str) -> String {
    name.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("job/{}/", urlencoding::encode(segment)))
        .collect()
}

pub fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

async fn checked_body(response: Response) -> Result<String> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }

    Ok(response.text().await?)
}

async fn api_error(response: Response) -> JLaunchError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    JLaunchError::Api {
        status: status.as_u16(),
        message: error_preview(&text),
    }
}

fn error_preview(text: &str) -> String {
    if text.contains("<html") || text.contains("<!DOCTYPE html>") {
        return "Jenkins returned an HTML error page".to_string();
    }

    let trimmed = text.trim();
    if trimmed.chars().count() > ERROR_PREVIEW_CHARS {
        let preview: String = trimmed.chars().take(ERROR_PREVIEW_CHARS).collect();
        format!("{preview}...")
    } else {
        trimmed.to_string()
    }
}

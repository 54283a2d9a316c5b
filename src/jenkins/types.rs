use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JLaunchError, Result};

/// `_class` of the job property that carries parameter definitions.
pub const PARAMETERS_PROPERTY_CLASS: &str = "hudson.model.ParametersDefinitionProperty";

/// Response of `GET {base}/api/json`.
#[derive(Debug, Deserialize)]
pub(super) struct JobsResponse {
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

/// A job as listed on the Jenkins root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub url: String,
    /// Ball colour, e.g. "blue", "red_anime"
    #[serde(default)]
    pub color: Option<String>,
}

impl JobSummary {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_color(self.color.as_deref())
    }
}

/// Health of the last completed build, derived from the ball colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobHealth {
    Success,
    Failed,
    Unstable,
    Aborted,
    NotBuilt,
    Disabled,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub health: JobHealth,
    pub building: bool,
}

impl JobStatus {
    /// Jenkins appends `_anime` to the colour while a build is running.
    pub fn from_color(color: Option<&str>) -> Self {
        let color = color.unwrap_or_default();
        let (base, building) = match color.strip_suffix("_anime") {
            Some(base) => (base, true),
            None => (color, false),
        };

        let health = match base {
            "blue" | "green" => JobHealth::Success,
            "red" => JobHealth::Failed,
            "yellow" => JobHealth::Unstable,
            "aborted" => JobHealth::Aborted,
            "notbuilt" | "nobuilt" => JobHealth::NotBuilt,
            "disabled" | "grey" => JobHealth::Disabled,
            _ => JobHealth::Unknown,
        };

        Self { health, building }
    }
}

/// Response of `GET {jobURL}api/json`.
#[derive(Debug, Deserialize)]
pub struct JobDetail {
    pub name: String,
    pub url: String,
    #[serde(default, rename = "property")]
    pub properties: Vec<JobProperty>,
}

#[derive(Debug, Deserialize)]
pub struct JobProperty {
    #[serde(default, rename = "_class")]
    pub class: String,
    #[serde(default, rename = "parameterDefinitions")]
    pub parameter_definitions: Vec<RawParameterDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct RawParameterDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "defaultParameterValue")]
    pub default_parameter_value: Option<DefaultParameterValue>,
}

#[derive(Debug, Deserialize)]
pub struct DefaultParameterValue {
    #[serde(default)]
    pub value: Value,
}

/// A build parameter declared by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub description: String,
    pub default_value: Option<String>,
}

impl From<RawParameterDefinition> for ParameterDefinition {
    fn from(raw: RawParameterDefinition) -> Self {
        let default_value = raw
            .default_parameter_value
            .and_then(|default| value_to_string(default.value));

        Self {
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            default_value,
        }
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// A job resolved for launching: its URL and declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRef {
    pub name: String,
    pub url: String,
    pub parameters: Vec<ParameterDefinition>,
}

impl JobRef {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            parameters: Vec::new(),
        }
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl From<JobDetail> for JobRef {
    fn from(detail: JobDetail) -> Self {
        let parameters = detail
            .properties
            .into_iter()
            .find(|property| property.class == PARAMETERS_PROPERTY_CLASS)
            .map(|property| {
                property
                    .parameter_definitions
                    .into_iter()
                    .map(ParameterDefinition::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: detail.name,
            url: detail.url,
            parameters,
        }
    }
}

/// Parameter values submitted with a build. Empty means a parameterless build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildParameters(IndexMap<String, String>);

impl BuildParameters {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills every declared parameter with its default (or an empty string).
    pub fn from_defaults(job: &JobRef) -> Self {
        job.parameters
            .iter()
            .map(|p| (p.name.clone(), p.default_value.clone().unwrap_or_default()))
            .collect()
    }

    /// Overlays `NAME=VALUE` assignments, rejecting names the job does not declare.
    pub fn with_assignments(mut self, job: &JobRef, assignments: &[String]) -> Result<Self> {
        for assignment in assignments {
            let (name, value) = parse_assignment(assignment)?;

            if job.parameter(&name).is_none() {
                return Err(if job.has_parameters() {
                    JLaunchError::Config(format!(
                        "Job '{}' has no parameter named '{name}'",
                        job.name
                    ))
                } else {
                    JLaunchError::Config(format!("Job '{}' takes no parameters", job.name))
                });
            }

            self.0.insert(name, value);
        }

        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for BuildParameters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Splits `NAME=VALUE`. The value may itself contain `=`.
pub fn parse_assignment(assignment: &str) -> Result<(String, String)> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(JLaunchError::Config(format!(
            "Invalid parameter '{assignment}', expected NAME=VALUE"
        ))),
    }
}

/// Response of `GET {queueURL}api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItem {
    #[serde(default)]
    pub executable: Option<Executable>,
    /// Why the item is still waiting, e.g. "Waiting for next available executor"
    #[serde(default)]
    pub why: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Executable {
    pub number: u64,
    #[serde(default)]
    pub url: String,
}

/// Response of `GET {jobURL}lastBuild/api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LastBuild {
    #[serde(default)]
    pub number: u64,
    pub building: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameterized_job() -> JobRef {
        let detail: JobDetail = serde_json::from_str(
            r#"{
                "name": "deploy",
                "url": "https://ci/job/deploy/",
                "property": [
                    {"_class": "jenkins.model.BuildDiscarderProperty"},
                    {
                        "_class": "hudson.model.ParametersDefinitionProperty",
                        "parameterDefinitions": [
                            {
                                "name": "ENV",
                                "description": "Target environment",
                                "defaultParameterValue": {"_class": "hudson.model.StringParameterValue", "value": "staging"}
                            },
                            {
                                "name": "DRY_RUN",
                                "defaultParameterValue": {"value": true}
                            },
                            {"name": "TAG"}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();
        JobRef::from(detail)
    }

    #[test]
    fn test_job_ref_extracts_parameter_definitions() {
        let job = parameterized_job();

        assert_eq!(job.name, "deploy");
        assert_eq!(job.parameters.len(), 3);
        assert_eq!(job.parameters[0].description, "Target environment");
        assert_eq!(job.parameters[0].default_value.as_deref(), Some("staging"));
        assert_eq!(job.parameters[1].default_value.as_deref(), Some("true"));
        assert_eq!(job.parameters[2].default_value, None);
    }

    #[test]
    fn test_job_ref_without_parameters_property() {
        let detail: JobDetail = serde_json::from_str(
            r#"{"name": "lint", "url": "https://ci/job/lint/", "property": [{"_class": "x.Other"}]}"#,
        )
        .unwrap();
        let job = JobRef::from(detail);

        assert!(!job.has_parameters());
        assert!(BuildParameters::from_defaults(&job).is_empty());
    }

    #[test]
    fn test_build_parameters_defaults_and_overrides() {
        let job = parameterized_job();
        let params = BuildParameters::from_defaults(&job)
            .with_assignments(&job, &["TAG=v1.2=rc".to_string()])
            .unwrap();

        let collected: Vec<_> = params.iter().collect();
        assert_eq!(
            collected,
            vec![("ENV", "staging"), ("DRY_RUN", "true"), ("TAG", "v1.2=rc")]
        );
    }

    #[test]
    fn test_build_parameters_reject_unknown_name() {
        let job = parameterized_job();
        let err = BuildParameters::from_defaults(&job)
            .with_assignments(&job, &["NOPE=1".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("no parameter named 'NOPE'"));

        let plain = JobRef::new("lint", "https://ci/job/lint/");
        let err = BuildParameters::new()
            .with_assignments(&plain, &["A=1".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("takes no parameters"));
    }

    #[test]
    fn test_parse_assignment_requires_name() {
        assert!(parse_assignment("=value").is_err());
        assert!(parse_assignment("novalue").is_err());
        assert_eq!(
            parse_assignment("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
    }

    #[test]
    fn test_job_status_from_color() {
        let running = JobStatus::from_color(Some("red_anime"));
        assert_eq!(running.health, JobHealth::Failed);
        assert!(running.building);

        assert_eq!(
            JobStatus::from_color(Some("blue")).health,
            JobHealth::Success
        );
        assert_eq!(
            JobStatus::from_color(Some("notbuilt")).health,
            JobHealth::NotBuilt
        );
        assert_eq!(JobStatus::from_color(None).health, JobHealth::Unknown);
    }

    #[test]
    fn test_queue_item_null_executable() {
        let item: QueueItem =
            serde_json::from_str(r#"{"executable": null, "why": "Waiting"}"#).unwrap();
        assert!(item.executable.is_none());
        assert_eq!(item.why.as_deref(), Some("Waiting"));

        let item: QueueItem = serde_json::from_str(
            r#"{"executable": {"number": 7, "url": "https://ci/job/x/7/"}}"#,
        )
        .unwrap();
        assert_eq!(item.executable.map(|e| e.number), Some(7));
    }
}

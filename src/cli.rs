use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, JenkinsSettings, OutputFormat};
use crate::jenkins::links::quick_links;
use crate::jenkins::{BuildParameters, JenkinsClient};
use crate::launcher::{LaunchOutcome, Launcher};
use crate::output::{self, LaunchProgress};

#[derive(Parser)]
#[command(name = "jlaunch")]
#[command(author, version, about = "Jenkins Build Launcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./jlaunch.toml or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Jenkins base URL
    #[arg(long, global = true, env = "JENKINS_URL")]
    url: Option<String>,

    /// Jenkins username
    #[arg(short, long, global = true, env = "JENKINS_USER")]
    user: Option<String>,

    /// Jenkins API token
    #[arg(long, global = true, env = "JENKINS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    /// Write JSON output to this file
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List jobs with their last known status
    Jobs,

    /// Show the parameters a job accepts
    Params {
        /// Job name or folder path (e.g., 'team/app')
        job: String,
    },

    /// Trigger a build and follow it until it finishes
    Launch {
        /// Job name or folder path (e.g., 'team/app')
        job: String,

        /// Parameter override, repeatable
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Give up following the build after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Print handy Jenkins pages
    Links,
}

/// Where and how command results are rendered.
struct View<'a> {
    format: OutputFormat,
    pretty: bool,
    output: Option<&'a Path>,
}

impl View<'_> {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json || self.output.is_some()
    }

    fn emit<T: serde::Serialize>(&self, value: &T, print_table: impl FnOnce(&T)) -> Result<()> {
        if self.json() {
            output::export_json(value, self.pretty, self.output)
        } else {
            print_table(value);
            Ok(())
        }
    }
}

impl Cli {
    fn client(settings: &JenkinsSettings) -> Result<JenkinsClient> {
        Ok(JenkinsClient::new(
            &settings.url,
            settings.credentials.clone(),
        )?)
    }

    async fn execute_jobs(&self, settings: &JenkinsSettings, view: &View<'_>) -> Result<()> {
        info!("Fetching jobs from {}", settings.url);

        let jobs = Self::client(settings)?
            .list_jobs()
            .await
            .context("Error fetching jobs")?;

        view.emit(&jobs, |jobs| output::print_jobs(jobs))
    }

    async fn execute_params(
        &self,
        settings: &JenkinsSettings,
        view: &View<'_>,
        job: &str,
    ) -> Result<()> {
        let job = Self::client(settings)?
            .job(job)
            .await
            .with_context(|| format!("Error fetching job properties for '{job}'"))?;

        view.emit(&job, output::print_parameters)
    }

    fn execute_links(&self, settings: &JenkinsSettings, view: &View<'_>) -> Result<()> {
        let username = settings
            .credentials
            .as_ref()
            .map(|credentials| credentials.username.as_str());
        let links = quick_links(&settings.url, username);

        view.emit(&links, |links| output::print_links(links))
    }

    async fn execute_launch(
        &self,
        settings: &JenkinsSettings,
        view: &View<'_>,
        job: &str,
        assignments: &[String],
        timeout: Option<u64>,
    ) -> Result<()> {
        let client = Arc::new(Self::client(settings)?);

        let job = client
            .job(job)
            .await
            .with_context(|| format!("Error fetching job properties for '{job}'"))?;
        let params = BuildParameters::from_defaults(&job).with_assignments(&job, assignments)?;

        info!(
            "Launching '{}' with {} parameter(s), polling every {:?}",
            job.name,
            params.len(),
            settings.poll_interval
        );

        let cancel = CancellationToken::new();
        cancel_on_ctrl_c(cancel.clone());
        if let Some(secs) = timeout {
            cancel_after(cancel.clone(), Duration::from_secs(secs));
        }

        let launcher = Launcher::with_poll_interval(client, settings.poll_interval);
        let session = launcher.launch(job.clone(), params, cancel.clone())?;

        let progress = LaunchProgress::start(&job.name);
        let outcome = session.follow(|event| progress.update(event)).await;
        // Releases the Ctrl-C and timeout watchers.
        cancel.cancel();

        match outcome {
            LaunchOutcome::Finished(build) => {
                progress.finish_done(&build);
                view.emit(&build, output::print_outcome)?;

                if !build.is_success() {
                    bail!(
                        "Build #{} of '{}' finished with {}",
                        build.number,
                        build.job,
                        build.result
                    );
                }
                Ok(())
            }
            LaunchOutcome::Failed(error) => {
                progress.finish_failed(&error);
                Err(error.into())
            }
            LaunchOutcome::Cancelled => {
                progress.finish_cancelled();
                bail!("Launch of '{}' cancelled", job.name)
            }
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let settings = config.resolve_jenkins(
            self.url.as_deref(),
            self.user.as_deref(),
            self.token.as_deref(),
        )?;

        let view = View {
            format: self.format.unwrap_or(config.output.format),
            pretty: self.pretty || config.output.pretty,
            output: self.output.as_deref(),
        };

        match &self.command {
            Commands::Jobs => self.execute_jobs(&settings, &view).await,
            Commands::Params { job } => self.execute_params(&settings, &view, job).await,
            Commands::Launch {
                job,
                params,
                timeout,
            } => {
                self.execute_launch(&settings, &view, job, params, *timeout)
                    .await
            }
            Commands::Links => self.execute_links(&settings, &view),
        }
    }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    info!("Interrupted, cancelling launch");
                    cancel.cancel();
                }
                Err(e) => warn!("Unable to listen for Ctrl-C: {e}"),
            },
        }
    });
}

fn cancel_after(cancel: CancellationToken, timeout: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                warn!("No result after {}s, cancelling launch", timeout.as_secs());
                cancel.cancel();
            }
        }
    });
}

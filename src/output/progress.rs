use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::error::LaunchError;
use crate::launcher::{BuildOutcome, StatusEvent};

use super::styling::{bright, bright_green, bright_red, bright_yellow, dim};

/// Spinner that follows a launch session's status events
pub struct LaunchProgress {
    pb: ProgressBar,
}

impl LaunchProgress {
    pub fn start(job: &str) -> Self {
        eprintln!("{}  {}", bright("🚀"), bright(format!("Launch: {job}")).underlined());
        let pb = create_spinner(bright_yellow(format!("Launching job: {job}...")).to_string());
        Self { pb }
    }

    pub fn update(&self, event: &StatusEvent) {
        let message = match event {
            StatusEvent::Submitted { queue_url } => format!(
                "{} {}",
                bright_yellow("Job queued"),
                dim(queue_url)
            ),
            StatusEvent::InQueue { why } => match why {
                Some(why) => format!("{} {}", bright_yellow("Job in queue..."), dim(why)),
                None => bright_yellow("Job in queue...").to_string(),
            },
            StatusEvent::Building { number } => {
                bright_yellow(format!("Building #{number}...")).to_string()
            }
            StatusEvent::Done(_) | StatusEvent::Failed(_) => return,
        };
        self.pb.set_message(message);
    }

    pub fn finish_done(self, outcome: &BuildOutcome) {
        let message = format!("Build #{} finished with {}", outcome.number, outcome.result);
        if outcome.is_success() {
            self.pb
                .finish_with_message(bright_green(format!("{message} ✓")).to_string());
        } else {
            self.pb
                .finish_with_message(bright_red(format!("{message} ✗")).to_string());
        }
    }

    pub fn finish_failed(self, error: &LaunchError) {
        self.pb
            .finish_with_message(bright_red(format!("{error} ✗")).to_string());
    }

    pub fn finish_cancelled(self) {
        self.pb.abandon_with_message(dim("Launch cancelled").to_string());
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner} {elapsed:.dim}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_json;
pub use progress::LaunchProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{print_jobs, print_links, print_outcome, print_parameters};

/// Prints the `jlaunch` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🛠  jlaunch"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins Build Launcher")
    );
}

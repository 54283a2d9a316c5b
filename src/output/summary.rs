use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::jenkins::links::QuickLink;
use crate::jenkins::{JobRef, JobSummary};
use crate::launcher::BuildOutcome;

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim};
use super::tables::{color_coded_status_cell, create_table, cyan_header};

/// Prints the job list as a table of name, status and URL.
pub fn print_jobs(jobs: &[JobSummary]) {
    println!("{}", render_jobs(jobs));
}

/// Prints a job's parameter definitions with their defaults.
pub fn print_parameters(job: &JobRef) {
    println!("{}", render_parameters(job));
}

/// Prints the result of a finished build and where to read its console.
pub fn print_outcome(outcome: &BuildOutcome) {
    println!("{}", render_outcome(outcome));
}

pub fn print_links(links: &[QuickLink]) {
    println!("{}", render_links(links));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_jobs(jobs: &[JobSummary]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "📋", "Jobs");

    if jobs.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No jobs found."));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Job", "Status", "URL"]));

    for job in jobs {
        table.add_row(vec![
            Cell::new(&job.name),
            color_coded_status_cell(job.status()),
            Cell::new(&job.url).fg(TableColor::DarkGrey),
        ]);
    }

    let _ = writeln!(output, "{table}");
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Total:"),
        bright_yellow(jobs.len())
    );
    output
}

fn render_parameters(job: &JobRef) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🧩", &format!("Parameters: {}", job.name));

    if !job.has_parameters() {
        let _ = writeln!(
            output,
            "  {}",
            dim("This job takes no parameters; it is launched with a plain build request.")
        );
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Name", "Default", "Description"]));

    for parameter in &job.parameters {
        table.add_row(vec![
            Cell::new(&parameter.name),
            Cell::new(parameter.default_value.as_deref().unwrap_or("")),
            Cell::new(&parameter.description).fg(TableColor::DarkGrey),
        ]);
    }

    let _ = writeln!(output, "{table}");
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Override with:"),
        cyan(format!("jlaunch launch {} -p NAME=VALUE", job.name))
    );
    output
}

fn render_outcome(outcome: &BuildOutcome) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🏁", "Result");

    let result = if outcome.is_success() {
        bright_green(&outcome.result)
    } else {
        bright_red(&outcome.result)
    };

    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}",
        dim("Job:"),
        cyan(&outcome.job),
        dim("Build:"),
        bright_yellow(format!("#{}", outcome.number)),
        dim("Result:"),
        result,
        dim("Finished:"),
        dim(outcome.completed_at.format("%Y-%m-%d %H:%M:%S UTC")),
        dim("See output:"),
        cyan(&outcome.console_url),
    );
    output
}

fn render_links(links: &[QuickLink]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🔗", "Links");

    for link in links {
        let _ = writeln!(output, "  {} {}", dim(format!("{}:", link.label)), cyan(&link.url));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jenkins::ParameterDefinition;
    use chrono::Utc;

    #[test]
    fn test_render_jobs_lists_every_job() {
        let jobs = vec![
            JobSummary {
                name: "build-app".to_string(),
                url: "https://ci/job/build-app/".to_string(),
                color: Some("blue".to_string()),
            },
            JobSummary {
                name: "deploy".to_string(),
                url: "https://ci/job/deploy/".to_string(),
                color: Some("red_anime".to_string()),
            },
        ];

        let rendered = render_jobs(&jobs);
        assert!(rendered.contains("build-app"));
        assert!(rendered.contains("deploy"));
        assert!(rendered.contains("failed (building)"));
    }

    #[test]
    fn test_render_jobs_empty() {
        assert!(render_jobs(&[]).contains("No jobs found."));
    }

    #[test]
    fn test_render_parameters() {
        let mut job = JobRef::new("deploy", "https://ci/job/deploy/");
        assert!(render_parameters(&job).contains("takes no parameters"));

        job.parameters.push(ParameterDefinition {
            name: "ENV".to_string(),
            description: "Target environment".to_string(),
            default_value: Some("staging".to_string()),
        });
        let rendered = render_parameters(&job);
        assert!(rendered.contains("ENV"));
        assert!(rendered.contains("staging"));
    }

    #[test]
    fn test_render_outcome_includes_console_link() {
        let outcome = BuildOutcome {
            job: "x".to_string(),
            number: 7,
            result: "SUCCESS".to_string(),
            url: "https://ci/job/x/7/".to_string(),
            console_url: "https://ci/job/x/7/consoleText".to_string(),
            completed_at: Utc::now(),
        };

        let rendered = render_outcome(&outcome);
        assert!(rendered.contains("#7"));
        assert!(rendered.contains("SUCCESS"));
        assert!(rendered.contains("https://ci/job/x/7/consoleText"));
    }
}

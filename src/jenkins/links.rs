use serde::Serialize;

use super::client::with_trailing_slash;

pub const PIPELINE_SYNTAX_DOCS: &str = "https://www.jenkins.io/doc/book/pipeline/syntax/";

/// Console output for a build.
///
/// # Arguments
///
/// * `build_url` - Build URL as reported by Jenkins (e.g., <https://ci/job/x/7/>)
///
/// # Returns
///
/// Plain-text console URL (e.g., <https://ci/job/x/7/consoleText>)
pub fn console_url(build_url: &str) -> String {
    if build_url.is_empty() {
        return String::new();
    }
    format!("{}consoleText", with_trailing_slash(build_url))
}

/// A named Jenkins page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickLink {
    pub label: &'static str,
    pub url: String,
}

/// Pages worth opening next to a launch: job creation, nodes, management,
/// the user's API token page and the pipeline syntax reference.
pub fn quick_links(base_url: &str, username: Option<&str>) -> Vec<QuickLink> {
    let base = base_url.trim_end_matches('/');

    let mut links = vec![
        QuickLink {
            label: "New job",
            url: format!("{base}/view/all/newJob"),
        },
        QuickLink {
            label: "Nodes",
            url: format!("{base}/computer"),
        },
        QuickLink {
            label: "Manage Jenkins",
            url: format!("{base}/manage"),
        },
    ];

    if let Some(username) = username.filter(|u| !u.is_empty()) {
        links.push(QuickLink {
            label: "API token",
            url: format!("{base}/user/{}/security/", urlencoding::encode(username)),
        });
    }

    links.push(QuickLink {
        label: "Pipeline syntax",
        url: PIPELINE_SYNTAX_DOCS.to_string(),
    });

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_url() {
        assert_eq!(
            console_url("https://ci/job/x/7/"),
            "https://ci/job/x/7/consoleText"
        );
        assert_eq!(
            console_url("https://ci/job/x/7"),
            "https://ci/job/x/7/consoleText"
        );
        assert_eq!(console_url(""), "");
    }

    #[test]
    fn test_quick_links_with_user() {
        let links = quick_links("https://ci.example.com/", Some("alice"));

        assert_eq!(links.len(), 5);
        assert_eq!(links[0].url, "https://ci.example.com/view/all/newJob");
        assert_eq!(links[3].url, "https://ci.example.com/user/alice/security/");
        assert_eq!(links[4].url, PIPELINE_SYNTAX_DOCS);
    }

    #[test]
    fn test_quick_links_without_user() {
        let links = quick_links("https://ci.example.com", None);
        assert!(links.iter().all(|l| l.label != "API token"));
    }
}

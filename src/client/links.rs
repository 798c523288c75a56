use regex::Regex;
use std::sync::LazyLock;

/// Query string appended to every list request before any extra options.
pub const PAGINATION_QUERY: &str = "?simple=yes&per_page=100&page=1";

/// Repository endpoints the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Stargazers,
    Issues,
    Contributors,
    CommunityProfile,
    TrafficClones,
    TrafficViews,
    Participation,
}

impl Endpoint {
    pub fn suffix(&self) -> &'static str {
        match self {
            Endpoint::Stargazers => "stargazers",
            Endpoint::Issues => "issues",
            Endpoint::Contributors => "contributors",
            Endpoint::CommunityProfile => "community/profile",
            Endpoint::TrafficClones => "traffic/clones",
            Endpoint::TrafficViews => "traffic/views",
            Endpoint::Participation => "stats/participation",
        }
    }
}

/// `/repos/<owner>/<repo>/<endpoint>`
pub fn repo_path(owner: &str, repo: &str, endpoint: Endpoint) -> String {
    format!("/repos/{}/{}/{}", owner, repo, endpoint.suffix())
}

/// Normalize the configured API root into an absolute base URL without a
/// trailing slash. A bare host is promoted to https.
pub fn normalize_root(root: &str) -> Option<String> {
    let root = root.trim().trim_end_matches('/');
    if root.is_empty() {
        return None;
    }

    let candidate = if root.contains("://") {
        root.to_string()
    } else {
        format!("https://{}", root)
    };

    let parsed = url::Url::parse(&candidate).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }

    Some(candidate)
}

/// First page URL of a list endpoint.
pub fn list_url(root: &str, path: &str, options: &str) -> String {
    format!("{}{}{}{}", root, path, PAGINATION_QUERY, options)
}

/// URL of a single-resource endpoint. Extra options use the same
/// `&key=value` form as list requests.
pub fn resource_url(root: &str, path: &str, options: &str) -> String {
    let options = options.trim_start_matches('&');
    if options.is_empty() {
        format!("{}{}", root, path)
    } else {
        format!("{}{}?{}", root, path, options)
    }
}

// <https://host/path?page=2>; rel="next"
static LINK_RELATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel\s*=\s*"?([^",;]+)"?"#).ok());

/// Extract the `rel="next"` target from a `Link` response header.
pub fn next_page_url(link_header: &str) -> Option<String> {
    let re = LINK_RELATION.as_ref()?;

    let next = re
        .captures_iter(link_header)
        .find(|captures| {
            captures
                .get(2)
                .map(|rel| rel.as_str().split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        })
        .and_then(|captures| captures.get(1))
        .map(|url| url.as_str().to_string());
    next
}

//! Link resolvers: turn a platform identifier into `{artifact_id, url}`.
//!
//! [`PageLinkResolver`] reads the vendor download page and picks the first
//! anchor tagged for the platform, e.g.
//!
//! ```text
//! <a href="https://host/bin-linux/bedrock-server-1.21.zip"
//!    data-platform="serverBedrockLinux">Download</a>
//! ```
//!
//! When several anchors match, the first in document order wins so the
//! result is deterministic for the same page.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use updraft_core::{ArtifactId, LinkResolver, Resolved, ResolutionError};

const PLATFORM_ATTR: &str = "data-platform";

fn anchor_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b[^>]*>").expect("anchor pattern compiles"))
}

fn attribute_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("attribute pattern compiles")
    })
}

// ---------------------------------------------------------------------------
// Page scraping
// ---------------------------------------------------------------------------

/// Resolves by scraping an HTML download page over HTTP.
#[derive(Debug, Clone)]
pub struct PageLinkResolver {
    agent: ureq::Agent,
    page_url: String,
}

impl PageLinkResolver {
    pub fn new(page_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: crate::agent(timeout),
            page_url: page_url.into(),
        }
    }

    fn fetch_page(&self) -> Result<String, ResolutionError> {
        let http_err = |detail: String| ResolutionError::Http {
            url: self.page_url.clone(),
            detail,
        };
        self.agent
            .get(&self.page_url)
            .set("Accept", "text/html")
            .call()
            .map_err(|e| http_err(crate::describe(e)))?
            .into_string()
            .map_err(|e| http_err(e.to_string()))
    }
}

impl LinkResolver for PageLinkResolver {
    fn resolve(&self, platform: &str) -> Result<Resolved, ResolutionError> {
        tracing::debug!(page = %self.page_url, platform, "resolving download link");
        let html = self.fetch_page()?;

        let href = find_platform_link(&html, platform).ok_or_else(|| {
            ResolutionError::PlatformNotFound {
                platform: platform.to_owned(),
                page: self.page_url.clone(),
            }
        })?;
        let url = absolutize(&self.page_url, &href);
        let artifact_id =
            ArtifactId::from_url(&url).ok_or_else(|| ResolutionError::InvalidUrl { url: url.clone() })?;

        Ok(Resolved { artifact_id, url })
    }
}

/// `href` of the first anchor whose `data-platform` equals `platform`.
///
/// Anchors carrying the attribute but no `href` are skipped.
pub fn find_platform_link(html: &str, platform: &str) -> Option<String> {
    anchor_pattern().find_iter(html).find_map(|tag| {
        let mut platform_matches = false;
        let mut href = None;
        for caps in attribute_pattern().captures_iter(tag.as_str()) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if name.eq_ignore_ascii_case(PLATFORM_ATTR) {
                platform_matches = value == platform;
            } else if name.eq_ignore_ascii_case("href") && !value.trim().is_empty() {
                href = Some(decode_entities(value.trim()));
            }
        }
        if platform_matches {
            href
        } else {
            None
        }
    })
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&quot;", "\"")
}

/// Resolve `href` against the page it was found on.
fn absolutize(page: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_owned();
    }
    let (scheme, rest) = page.split_once("://").unwrap_or(("https", page));
    if let Some(stripped) = href.strip_prefix("//") {
        return format!("{scheme}://{stripped}");
    }
    let host = rest.split('/').next().unwrap_or(rest);
    if href.starts_with('/') {
        return format!("{scheme}://{host}{href}");
    }
    let base = match rest.rfind('/') {
        Some(idx) => &rest[..idx],
        None => host,
    };
    format!("{scheme}://{base}/{href}")
}

// ---------------------------------------------------------------------------
// Pinned URL
// ---------------------------------------------------------------------------

/// Resolves every platform to one configured URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLinkResolver {
    url: String,
}

impl StaticLinkResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl LinkResolver for StaticLinkResolver {
    fn resolve(&self, _platform: &str) -> Result<Resolved, ResolutionError> {
        let artifact_id = ArtifactId::from_url(&self.url).ok_or_else(|| {
            ResolutionError::InvalidUrl {
                url: self.url.clone(),
            }
        })?;
        Ok(Resolved {
            artifact_id,
            url: self.url.clone(),
        })
    }
}

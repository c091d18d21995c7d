//! # updraft-fetch
//!
//! Network- and archive-facing collaborators for the update orchestrator:
//!
//! - [`resolver`]: [`PageLinkResolver`] scrapes a download page,
//!   [`StaticLinkResolver`] pins a fixed URL
//! - [`fetcher`]: [`HttpFetcher`] downloads into staging and extracts
//! - [`extract`]: zip / tar.gz unpacking into a fresh directory
//! - [`checksum`]: SHA-256 verification of a staged archive

pub mod checksum;
pub mod extract;
pub mod fetcher;
pub mod resolver;

use std::time::Duration;

pub use checksum::{sha256_file, verify_sha256};
pub use extract::{extract_archive, ArchiveFormat};
pub use fetcher::HttpFetcher;
pub use resolver::{find_platform_link, PageLinkResolver, StaticLinkResolver};

/// Browser-like user agent; some download pages refuse bare HTTP clients.
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) updraft/",
    env!("CARGO_PKG_VERSION")
);

/// Agent for small page fetches: `timeout` bounds the whole request.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Agent for archive downloads. `timeout` bounds connecting and each read,
/// so a large body arriving steadily is never cut off part way.
pub(crate) fn download_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Flatten a ureq error into the transport detail carried by our errors.
pub(crate) fn describe(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            format!("HTTP {code} {}", response.status_text())
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

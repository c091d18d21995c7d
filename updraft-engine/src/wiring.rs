//! Production wiring: build an [`Orchestrator`] from an [`UpdaterConfig`].

use updraft_core::{
    FileVersionStore, LinkResolver, ServiceControlError, ServiceController, ServiceManager,
    UpdaterConfig,
};
use updraft_fetch::{HttpFetcher, PageLinkResolver, StaticLinkResolver};
use updraft_service::{LaunchdController, SystemdController};

use crate::orchestrator::Orchestrator;

/// Real collaborators for `config`.
///
/// A pinned `artifact_url` replaces page scraping. Fails only when the
/// configured service manager is unusable on this host.
pub fn from_config(config: UpdaterConfig) -> Result<Orchestrator, ServiceControlError> {
    let resolver: Box<dyn LinkResolver> = match &config.artifact_url {
        Some(url) => Box::new(StaticLinkResolver::new(url.clone())),
        None => Box::new(PageLinkResolver::new(
            config.download_page.clone(),
            config.http_timeout,
        )),
    };
    let service: Box<dyn ServiceController> = match config.service_manager {
        ServiceManager::Systemd => Box::new(SystemdController::default()),
        ServiceManager::Launchd => Box::new(LaunchdController::for_current_user()?),
    };
    let fetcher = Box::new(HttpFetcher::new(config.http_timeout));
    let store = Box::new(FileVersionStore::new(config.version_file.clone()));

    tracing::debug!(
        manager = %config.service_manager,
        service = %config.service_name,
        pinned = config.artifact_url.is_some(),
        "orchestrator wired"
    );
    Ok(Orchestrator::new(config, resolver, fetcher, service, store))
}

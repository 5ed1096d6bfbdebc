pub mod inspect;
pub mod once;
pub mod run;

use anyhow::{Context, Result};
use std::sync::Arc;

use repoint::cloud::LightsailClient;
use repoint::config::Config;
use repoint::dns::CloudflareClient;
use repoint::metrics::Metrics;
use repoint::reconcile::Reconciler;

// Re-export command functions for convenience
pub use inspect::{check, inventory};
pub use once::once;
pub use run::run;

/// Wire the production providers into a reconciler
pub fn build_reconciler(config: &Config) -> Result<Arc<Reconciler>> {
    config.validate()?;
    config.validate_credentials()?;

    let dns = CloudflareClient::new(config.cloudflare.clone())
        .context("Failed to create Cloudflare client")?;
    let addresses = LightsailClient::new(config.lightsail.clone())
        .context("Failed to create Lightsail client")?;
    let metrics = Arc::new(Metrics::new().context("Failed to create metrics registry")?);

    let reconciler = Reconciler::new(config, Arc::new(dns), Arc::new(addresses), metrics)
        .context("Failed to create reconciler")?;

    Ok(Arc::new(reconciler))
}

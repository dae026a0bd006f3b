//! One-shot check command: resolve the product and run a single cycle.

use crate::amazon::resolver::Resolver;
use crate::config::Config;
use crate::domain::Threshold;
use crate::tracker::session::run_check;
use anyhow::{bail, Result};
use tracing::info;

/// Resolves a query and runs exactly one fetch-parse-evaluate pass.
pub struct CheckCommand {
    config: Config,
    json: bool,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }

    pub async fn execute(
        &self,
        query: &str,
        target_price: f64,
        recipient: &str,
        no_email: bool,
    ) -> Result<()> {
        let threshold = Threshold::new(target_price, recipient);
        if !threshold.is_valid() {
            bail!("target price must be greater than zero");
        }

        let deps = super::build_deps(&self.config, no_email)?;
        let resolver = Resolver::new(deps.fetcher.clone(), deps.base_url.clone());

        let product = resolver.resolve(query).await?;
        info!("Resolved {:?} to {}", query, product.url);

        let outcome =
            run_check(deps.fetcher.as_ref(), deps.notifier.as_ref(), &product.url, &threshold)
                .await;

        if self.json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else {
            println!("{outcome}");
        }

        Ok(())
    }
}

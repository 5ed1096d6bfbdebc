use anyhow::{Context, Result};

use repoint::config::Config;

use super::build_reconciler;

/// Resolve and print the managed inventory
pub async fn inventory(config: Config) -> Result<()> {
    let reconciler = build_reconciler(&config)?;
    let records = reconciler
        .inventory()
        .await
        .context("Failed to resolve inventory")?;

    println!("Managed records ({})", records.len());
    println!("========================");
    for record in records.iter() {
        let region = config
            .region_for(&record.location)
            .map(|p| p.region.as_str())
            .unwrap_or("?");
        println!("  {:<40} {:<4} {:<16} {}", record.name, record.location, region, record.id);
    }

    Ok(())
}

/// Probe every managed record and print the outcomes; repairs nothing
pub async fn check(config: Config) -> Result<()> {
    let reconciler = build_reconciler(&config)?;
    let outcomes = reconciler
        .probe_all()
        .await
        .context("Failed to resolve inventory")?;

    let unhealthy = outcomes.iter().filter(|(_, o)| !o.is_healthy()).count();

    println!("Probe results");
    println!("========================");
    for (record, outcome) in &outcomes {
        println!("  {:<40} {}", record.name, outcome);
    }
    println!();
    println!("  {} of {} unreachable", unhealthy, outcomes.len());

    Ok(())
}

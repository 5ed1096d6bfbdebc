use anyhow::Result;

use repoint::config::Config;

use super::build_reconciler;

/// Run exactly one reconciliation cycle and print its report
pub async fn once(config: Config) -> Result<()> {
    let reconciler = build_reconciler(&config)?;
    let report = reconciler.run_cycle().await;

    println!("Reconciliation cycle {}", report.cycle);
    println!("========================");
    println!("  Inventory available: {}", report.inventory_available);
    println!("  Records:  {}", report.records);
    println!("  Healthy:  {}", report.healthy);
    println!("  Repaired: {}", report.repaired);
    println!("  Failed:   {}", report.failed);
    println!("  Outcome:  {}", report.outcome());

    Ok(())
}

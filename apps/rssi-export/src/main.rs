use anyhow::Result;
use clap::Parser;
use rssi_export::{cli, config, dashboard, pipeline};

fn init_tracing() -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rssi_export=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing()?;

    let config = config::ExportConfig::from_env(&args)?;
    tracing::info!(
        mode = %config.mode,
        organization = %config.organization_name,
        network = %config.network_name,
        output_dir = %config.output_dir.display(),
        "starting RSSI export"
    );

    let client = dashboard::DashboardClient::new(&config)?;
    let summary = pipeline::run(&client, &config).await?;
    tracing::info!(
        access_points = summary.access_points,
        clients = summary.clients,
        clients_with_history = summary.clients_with_history,
        rows = summary.rows,
        "export complete"
    );
    for path in &summary.files {
        println!("{}", path.display());
    }
    Ok(())
}

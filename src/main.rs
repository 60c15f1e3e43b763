use anyhow::Result;
use reportsink::{config::Config, pipeline};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) resolve configuration ────────────────────────────────────
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    info!(
        bucket = %config.bucket,
        prefix = %config.prefix,
        database = %config.target.database,
        table = %config.target.table,
        "configured"
    );

    // ─── 3) run one ingestion cycle ──────────────────────────────────
    let summary = pipeline::run(&config).await?;
    info!(object = %summary.object, rows = summary.rows, "all done");
    Ok(())
}

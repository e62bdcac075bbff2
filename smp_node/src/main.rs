use smp_core::{config, SmpCore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = config::get_or_init().await?;
    let core = SmpCore::start(config).await?;

    info!(addr = ?core.server.endpoint.addr(), "serving SMP requests; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    core.shutdown().await
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smp_core=info,smp_node=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

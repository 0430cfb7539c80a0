use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use trip_planner::{
    AppState, ChatCompletionClient, PlanSigner, SmtpMailer, TravelResearcher, TripPlanner, TripPlannerConfig,
    WebResearcher, telemetry, web,
};

#[derive(Debug, Parser)]
#[command(name = "trip-planner", version, about = "AI trip planner web service")]
struct Cli {
    /// Configuration file, defaults to the user config directory
    #[arg(short, long, env = "TRIP_PLANNER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TripPlannerConfig::load_from_path(cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _telemetry = telemetry::init(&config.logging)?;

    let generator = ChatCompletionClient::from_config(&config.llm)?;
    let mailer = SmtpMailer::from_config(&config.email)?;
    let researcher: Option<Arc<dyn TravelResearcher>> = if config.research.enabled {
        Some(Arc::new(WebResearcher::from_config(&config.research)?))
    } else {
        tracing::info!("destination research disabled");
        None
    };

    if config.server.signing_key.is_none() {
        tracing::warn!("server.signing_key not set, emailed plans must come from this process");
    }
    let planner = TripPlanner::new(Arc::new(generator), Arc::new(mailer), researcher)
        .with_signer(PlanSigner::from_config(&config.server));
    web::run(&config.server, AppState::new(planner)).await
}

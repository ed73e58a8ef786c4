#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! REST API for sending templated email to a list of recipients

use anyhow::Result;
use bulk_mailer::infrastructure::{
    email::{BackendConfig, SelectedBackend},
    http::{AppState, CampaignDefaults, HttpServer, HttpServerConfig},
};
use clap::Parser;
use tracing::info;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The HTTP server configuration
    #[clap(flatten)]
    pub server: HttpServerConfig,

    /// Defaults for sends
    #[clap(flatten)]
    pub campaigns: CampaignDefaults,

    /// The delivery backend
    #[clap(flatten)]
    pub backend: BackendConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!(backend = ?args.backend.kind, "starting bulk mailer");

    let backend = SelectedBackend::from_config(&args.backend);
    let state = AppState::new(args.campaigns, backend);

    HttpServer::new(state, &args.server)?.run().await
}

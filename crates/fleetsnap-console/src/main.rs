use std::io;

use clap::Parser;
use tracing::error;

use fleetsnap_client::HttpEndpointConnector;
use fleetsnap_console::config::ConsoleConfig;
use fleetsnap_console::resolve::{parse_guest_batch, GuestBatch};
use fleetsnap_console::session::{SessionController, SetupError};

/// Interactive console for batch VM snapshot management.
///
/// Connects to one management endpoint, resolves the requested guests,
/// then serves snapshot commands until EXIT.
#[derive(Parser, Debug)]
#[command(name = "fleetsnap", version, about)]
struct Args {
    /// Comma-separated guest names to manage as one batch.
    #[arg(value_parser = parse_guest_batch)]
    guests: GuestBatch,

    /// Management endpoint host to connect to.
    #[arg(value_parser = clap::builder::NonEmptyStringValueParser::new())]
    host: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = ConsoleConfig::from_env();
    let connector = HttpEndpointConnector::with_options(
        config.base_url(&args.host),
        config.timeout,
        config.accept_invalid_certs,
    );

    let stdin = io::stdin().lock();
    let stdout = io::stdout();
    let mut controller = SessionController::new(connector, stdin, stdout);

    if let Err(e) = controller
        .run(&args.host, &args.guests.0, config.credentials.clone())
        .await
    {
        error!("{e:#}");
        let code = e
            .downcast_ref::<SetupError>()
            .map(SetupError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use mcvouchy::application::errors::BotError;
use mcvouchy::application::services::BotSession;
use mcvouchy::application::AppContext;
use mcvouchy::infrastructure::adapters::ConsoleGateway;
use mcvouchy::infrastructure::config::{ConfigStore, McVouchySettings, SecretToken};
use mcvouchy::infrastructure::logging::LogRouter;

#[derive(Parser)]
#[command(name = "mcvouchy")]
#[command(version, about = "Invitation and vouching bot", long_about = None)]
struct Cli {
    /// Config file path (overrides the search path)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let context = AppContext::new(Arc::new(ConfigStore::default()), LogRouter::new());
    if let Err(e) = context.logs().install() {
        eprintln!("Failed to install logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli, context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(critical = true, "Startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, context: AppContext) -> Result<(), BotError> {
    context.logs().reconfigure(&context.snapshot())?;
    context.loader().load(cli.config.as_deref())?;

    let snapshot = context.snapshot();
    let settings = McVouchySettings::from_snapshot(&snapshot)?;
    let token = SecretToken::from_snapshot(&snapshot)?;
    tracing::debug!("Settings: {:?}", settings);

    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(async {
        let gateway = Arc::new(ConsoleGateway::new(token));
        let session = BotSession::new(&context, gateway.clone())?;

        tracing::info!("Starting mcvouchy v{}", env!("CARGO_PKG_VERSION"));
        let events = gateway.connect()?;
        session.run(events).await
    })
}

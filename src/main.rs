use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use volunteer_hub::accounts::directory::AccountDirectory;
use volunteer_hub::app::{AppState, router};
use volunteer_hub::auth::token::TokenService;
use volunteer_hub::chat::store::MemoryChatRepository;
use volunteer_hub::config::Cli;
use volunteer_hub::events::store::EventStore;
use volunteer_hub::search::model::RelevanceModel;
use volunteer_hub::storage::seed::{apply_seed, load_seed};

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("VOLUNTEER_HUB_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::info!("Starting volunteer hub on {}", cli.bind);

    // 1. Stores:
    let accounts = Arc::new(AccountDirectory::new());
    let events = Arc::new(EventStore::new());

    if let Some(path) = &cli.seed_file {
        let seed = load_seed(path)?;
        let summary = apply_seed(seed, &accounts, &events);
        tracing::info!(
            "Seeded {} volunteers, {} NGOs, {} events from {}",
            summary.volunteers,
            summary.ngos,
            summary.events,
            path.display()
        );
    }
    tracing::info!(
        "Account directory ready: {} volunteers, {} NGOs",
        accounts.volunteer_count(),
        accounts.ngo_count()
    );

    // 2. Relevance model (never fatal):
    let model_dir = cli.model_dir.clone();
    let model = tokio::task::spawn_blocking(move || RelevanceModel::load(&model_dir)).await?;
    if !model.is_loaded() {
        tracing::warn!("Search will rank by date only");
    }

    // 3. Services:
    let state = AppState::new(
        accounts,
        events,
        model,
        TokenService::new(cli.jwt_secret()),
        Arc::new(MemoryChatRepository::new()),
        cli.chat_config(),
    );

    // 4. HTTP Router:
    let app = router(&state);

    // 5. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!("HTTP server listening on {}", cli.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app).await?;

    Ok(())
}

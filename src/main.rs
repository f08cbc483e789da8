use budget_flow::api::{self, AppState};
use budget_flow::config::{database, settings, workflow};
use budget_flow::errors::Result;
use budget_flow::notify::LogNotifier;
use budget_flow::storage::FileStore;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    // 3. Load the application configuration and the workflow definition
    let app_config = settings::load_default_config()?;
    let flow = workflow::load_workflow(&app_config.server.workflow_file)?;
    info!(
        nodes = flow.nodes().len(),
        transitions = flow.transitions().len(),
        "Loaded workflow definition."
    );

    // 4. Initialize the database
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url).await?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Open the media store for uploaded step files
    let store = FileStore::open(app_config.server.media_root.clone()).await?;

    // 6. Serve the API
    let state = AppState {
        db,
        workflow: Arc::new(flow),
        users: Arc::new(settings::UserDirectory::new(app_config.users)),
        store,
        notifier: Arc::new(LogNotifier),
    };
    let listener = TcpListener::bind(&app_config.server.bind).await?;
    info!(bind = %app_config.server.bind, "Listening.");
    axum::serve(listener, api::router(state)).await?;

    Ok(())
}

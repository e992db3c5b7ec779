use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dataaudit::config::Config;
use dataaudit::db::{self, AppState, queries};
use dataaudit::models::CreateUser;

#[derive(Parser)]
#[command(name = "dataaudit", version, about = "Read-only audit log API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user allowed to read audit history and print its API key
    Bootstrap {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Revoke every active API key of a user
    RevokeKeys {
        #[arg(long)]
        username: String,
    },
    /// Remove a user's permission to read audit history
    Revoke {
        #[arg(long)]
        username: String,
    },
}

fn cors_layer(config: &Config) -> Option<CorsLayer> {
    if !config.cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        return Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .expose_headers([dataaudit::pagination::TOTAL_COUNT_HEADER]),
        );
    }
    if config.dev_mode {
        return Some(CorsLayer::permissive());
    }
    None
}

async fn serve(config: Config, state: AppState) -> anyhow::Result<()> {
    let mut app = dataaudit::app(state);
    if let Some(cors) = cors_layer(&config) {
        app = app.layer(cors);
    }

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);
    if config.dev_mode {
        tracing::warn!("Running in dev mode");
    }

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dataaudit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let pool = db::create_pool(&config.database_path)
        .with_context(|| format!("failed to open database {}", config.database_path))?;
    {
        let conn = pool.get()?;
        db::init_db(&conn).context("failed to initialize schema")?;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState::new(pool, config.paging());
            serve(config, state).await
        }
        Command::Bootstrap { username, email } => {
            let mut conn = pool.get()?;
            let (user, api_key) =
                queries::bootstrap_reader(&mut conn, &CreateUser { username, email })?;
            tracing::info!(user_id = user.id, "Created audit reader '{}'", user.username);
            println!("API key for {} (shown once): {}", user.username, api_key);
            Ok(())
        }
        Command::RevokeKeys { username } => {
            let mut conn = pool.get()?;
            let revoked = queries::revoke_user_api_keys(&mut conn, &username)?;
            for key in &revoked {
                tracing::info!(key_id = key.id, "Revoked API key {}...", key.prefix);
            }
            println!("Revoked {} API key(s) for {}", revoked.len(), username);
            Ok(())
        }
        Command::Revoke { username } => {
            let conn = pool.get()?;
            if queries::revoke_reader(&conn, &username)? {
                println!("{} can no longer read audit history", username);
            } else {
                println!("{} did not have audit history access", username);
            }
            Ok(())
        }
    }
}

use anyhow::Result;
use axum::{Router, extract::State, response::Redirect, routing::get};
use clap::Parser;
use state::{AppState, SharedState};
use std::{path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::filter::EnvFilter;

mod config;
mod error;
mod graphql;
mod state;
#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,
    /// Name of the environment to load from the configuration file
    #[arg(short, long, default_value = "dev")]
    pub env: String,
    /// Print the GraphQL schema and exit
    #[arg(long)]
    pub print_schema: bool,
}

pub(crate) fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(graphql::router(state.config.playground))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("LOCWEB_LOG"))
        .init();
    let args = Cli::parse();

    if args.print_schema {
        println!("{}", graphql::sdl()?);
        return Ok(());
    }

    let config_file = args.config_file.unwrap_or_else(config::default_config_file);
    debug!("using config file '{}'", config_file.display());
    let env = config::load(&config_file, &args.env)?;
    let listen = env.listen.clone();

    let shared_state = Arc::new(SharedState::new(env).await?);
    let listener = tokio::net::TcpListener::bind((listen.host.as_str(), listen.port)).await?;
    info!(
        "Listening on http://{}{}",
        listener.local_addr()?,
        graphql::GRAPHQL_PATH
    );
    axum::serve(listener, app(shared_state)).await?;
    Ok(())
}

async fn root(State(state): State<AppState>) -> Redirect {
    if state.config.playground {
        Redirect::permanent(graphql::PLAYGROUND_PATH)
    } else {
        Redirect::permanent(graphql::GRAPHQL_PATH)
    }
}

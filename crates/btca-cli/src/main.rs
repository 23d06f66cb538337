#[cfg(feature = "mongodb")]
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use btca_cli::{Config, PersistenceBackend, ServerClient, TerminalRenderer};
use btca_persist::{InMemoryPersistenceClient, PersistenceClient};
use btca_session::{AskInput, Session, SessionError, TurnOutcome};
use btca_types::QuestionStatus;

#[derive(Parser)]
#[command(name = "btca")]
#[command(about = "Ask questions about the libraries and frameworks you use")]
#[command(version)]
struct Cli {
    /// btca server URL (overrides configuration)
    #[arg(long, global = true, env = "BTCA_SERVER_URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about configured resources
    Ask {
        /// Question to ask; `@name` mentions select resources
        #[arg(short, long)]
        question: String,

        /// Resources to search (can specify multiple)
        #[arg(short, long = "resource")]
        resource: Vec<String>,

        /// Single resource alias (same as -r)
        #[arg(short, long)]
        tech: Option<String>,
    },
    /// Interactive session: every question goes to the same thread
    Chat {
        /// Resources added to every question
        #[arg(short, long = "resource")]
        resource: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    let server_url = cli.server.clone().unwrap_or_else(|| config.server.url.clone());
    tracing::info!(server = %server_url, "Starting btca");

    let client = Arc::new(ServerClient::new(server_url)?);
    let persistence = build_persistence(&config).await?;

    let mut session =
        Session::new(client.clone(), client.clone(), persistence).with_retry_policy(config.persistence.retry_policy());
    let model = session.load_model(client.as_ref(), config.model.clone().into()).await;
    tracing::info!(model = %model, "Session ready");

    spawn_cancel_listener(&session);

    match cli.command {
        Commands::Ask {
            question,
            resource,
            tech,
        } => {
            let mut input = AskInput::new(question).with_resources(resource);
            input.tech = tech;
            run_ask(&mut session, input).await
        }
        Commands::Chat { resource } => run_chat(&mut session, resource).await,
    }
}

async fn run_ask(session: &mut Session, input: AskInput) -> anyhow::Result<()> {
    let mut renderer = TerminalRenderer::stdio();
    renderer.loading();

    let outcome = session.ask(input, &mut renderer).await?;
    renderer.finish()?;
    report(session, &outcome);

    Ok(())
}

async fn run_chat(session: &mut Session, resources: Vec<String>) -> anyhow::Result<()> {
    if let Some(welcome) = session.messages().first() {
        println!("{}\n", welcome.answer_text());
    }

    let mut renderer = TerminalRenderer::stdio();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                session.clear_messages();
                println!("cleared\n");
                continue;
            }
            _ => {}
        }

        renderer.loading();
        let input = AskInput::new(line).with_resources(resources.clone());
        match session.ask(input, &mut renderer).await {
            Ok(outcome) => {
                renderer.finish()?;
                report(session, &outcome);
            }
            // nothing to ask against, no later turn can succeed
            Err(e @ SessionError::EmptyResourceSet) => return Err(e.into()),
            Err(e) => {
                renderer.finish()?;
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}

fn report(session: &Session, outcome: &TurnOutcome) {
    if outcome.status == QuestionStatus::Canceled {
        eprintln!("[canceled]");
    }

    let unsynced = session.lifecycle().unsynced_questions().count();
    if unsynced > 0 {
        tracing::warn!(unsynced, "Some questions were not saved");
    }
}

/// Ctrl-C cancels the answer in flight; with nothing left to cancel it exits.
fn spawn_cancel_listener(session: &Session) {
    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !cancel.request() {
                std::process::exit(130);
            }
        }
    });
}

async fn build_persistence(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.persistence.backend {
        PersistenceBackend::Memory => Ok(Arc::new(InMemoryPersistenceClient::new())),
        #[cfg(feature = "mongodb")]
        PersistenceBackend::Mongodb => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .context("MONGODB_URI environment variable is required for the mongodb backend")?;

            tracing::info!("Connecting to MongoDB");
            let client = btca_persist::MongoPersistenceClient::connect(uri, &config.persistence.database).await?;
            tracing::info!("MongoDB connected");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "mongodb"))]
        PersistenceBackend::Mongodb => {
            anyhow::bail!("btca was built without MongoDB support, rebuild with `--features mongodb`")
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries the answer only
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

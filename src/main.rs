use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use inquire::InquireError;
use tracing_subscriber::EnvFilter;

use quote_maker::config::{self, AppSettings};
use quote_maker::export::{open_path, TypstExporter};
use quote_maker::notify::ConsoleNotifier;
use quote_maker::{wizard, DocumentRenderer, Session};

#[derive(Parser)]
#[command(name = "quote-maker", version, about = "Quotes and payment receipts as PDF")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new quote (edit, review, export)
    New,
    /// Configure data directory and storage backend
    Config,
    /// Set the company details pre-filled on new quotes
    Company,
    /// Open the output folder
    Open,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match run(command) {
        Err(e) if is_interrupt(&e) => {
            println!("Cancelled");
            Ok(())
        }
        other => other,
    }
}

/// `RUST_LOG` wins whole; without it (or if it does not parse) only warnings show.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn is_interrupt(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<InquireError>(),
        Some(InquireError::OperationInterrupted | InquireError::OperationCanceled)
    )
}

fn load_or_setup() -> Result<AppSettings> {
    match config::load_settings_from(&config::config_path())? {
        Some(settings) => Ok(settings),
        None => wizard::setup_config_wizard(),
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Config => {
            wizard::setup_config_wizard()?;
        }
        Commands::Company => {
            let settings = load_or_setup()?;
            wizard::company_wizard(&settings)?;
        }
        Commands::Open => {
            let settings = load_or_setup()?;
            let output = settings.output_dir();
            std::fs::create_dir_all(&output)?;
            println!("🚀 Opening: {}", output.display());
            open_path(&output);
        }
        Commands::New => {
            let settings = load_or_setup()?;
            let store = settings.open_store()?;
            let exporter =
                TypstExporter::new(settings.output_dir(), &settings.typst).reveal(settings.reveal);
            let renderer = DocumentRenderer::load(&settings.template_dir())?;

            let mut session = Session::new(store, exporter, ConsoleNotifier, renderer);
            if let Some(company) = config::load_company_profile(&settings.company_path())? {
                session = session.with_default_company(company);
            }

            wizard::run_session(&mut session)?;
        }
    }
    Ok(())
}

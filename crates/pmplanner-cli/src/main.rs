use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "pmplanner", version, about = "Preventive-maintenance planner CLI")]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly draft generation and listing
    Draft {
        #[command(subcommand)]
        action: commands::draft::DraftAction,
    },
    /// Manual authoring of draft blocks
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Publish the drafts of a period
    Publish(commands::publish::PublishArgs),
    /// Machinery delivery/pickup agenda for a month
    Agenda(commands::agenda::AgendaArgs),
    /// Import a JSON fixture into the database
    Import(commands::import::ImportArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,pmplanner_core=debug,pmplanner=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,pmplanner_core=info,pmplanner=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Draft { action } => commands::draft::run(action),
        Commands::Block { action } => commands::block::run(action),
        Commands::Publish(args) => commands::publish::run(args),
        Commands::Agenda(args) => commands::agenda::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

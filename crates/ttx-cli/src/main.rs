use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ttx")]
#[command(about = "Federal and state return computation with provenance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a return and print the federal and per-state summary
    Compute {
        /// Taxpayer model JSON
        return_path: String,

        /// Tax table overlays, merged over the built-in tables in order
        #[arg(long = "tables")]
        tables: Vec<String>,

        /// Keep zero-amount traced values in the printed view
        #[arg(long, default_value_t = false)]
        show_zero: bool,

        /// Write the complete provenance graph as a hash-chained trail
        #[arg(long)]
        trail: Option<String>,

        /// Print one JSON document instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show how one traced value was derived
    Explain {
        /// Taxpayer model JSON
        return_path: String,

        /// Traced value id, e.g. ga500.tax
        #[arg(long)]
        node: String,

        #[arg(long = "tables")]
        tables: Vec<String>,
    },

    /// Compute the merged tax-table hash and print canonical JSON
    TablesHash {
        /// Overlays in merge order (the built-in tables are always first)
        paths: Vec<String>,

        /// Fail on table keys no registered module consumes
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// List registered state modules
    States,

    /// Verify a provenance trail written by `compute --trail`
    VerifyTrail { path: String },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Compute {
            return_path,
            tables,
            show_zero,
            trail,
            json,
        } => commands::compute::compute(commands::compute::ComputeArgs {
            return_path,
            tables,
            show_zero,
            trail,
            json,
        }),
        Commands::Explain {
            return_path,
            node,
            tables,
        } => commands::compute::explain(&return_path, &node, &tables),
        Commands::TablesHash { paths, strict } => commands::tables::tables_hash(&paths, strict),
        Commands::States => commands::tables::states(),
        Commands::VerifyTrail { path } => commands::trail::verify(&path),
    }
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

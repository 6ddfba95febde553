//! Dynadd Command-Line Interface
//!
//! Inserts dynamical-decoupling sequences into the idle windows of a
//! serialized circuit.
//!
//! ```text
//! dynadd apply -i circuit.json -b backend.yaml -s xy4 -r 2
//! dynadd schemes
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::apply::ApplyArgs;
use commands::{apply, schemes, version};

/// Dynadd - dynamical-decoupling insertion for timed quantum circuits
#[derive(Parser)]
#[command(name = "dynadd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert a decoupling sequence into every idle window of a circuit
    Apply {
        /// Input circuit record (JSON)
        #[arg(short, long)]
        input: String,

        /// Backend properties (YAML or JSON)
        #[arg(short, long, env = "DYNADD_BACKEND")]
        backend: String,

        /// Decoupling scheme (see `dynadd schemes`)
        #[arg(short, long, default_value = "xy4")]
        scheme: String,

        /// Pulses (CP, CPMG, Uhrig) or cycles (XY4, KDD)
        #[arg(short, long, default_value = "1")]
        repetitions: usize,

        /// Wrap CP/CPMG/Uhrig in sx ... sxdg
        #[arg(long)]
        rotations: bool,

        /// Use the asymmetric XY4/KDD variant
        #[arg(long)]
        asymmetric: bool,

        /// Scheduling method (alap, asap)
        #[arg(long, default_value = "alap")]
        scheduling: String,

        /// Output file (defaults to <input>_dd.json)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List available decoupling schemes
    Schemes,

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Apply {
            input,
            backend,
            scheme,
            repetitions,
            rotations,
            asymmetric,
            scheduling,
            output,
        } => apply::execute(&ApplyArgs {
            input,
            backend,
            scheme,
            repetitions,
            rotations,
            asymmetric,
            scheduling,
            output,
        }),

        Commands::Schemes => {
            schemes::execute();
            Ok(())
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::annualize::AnnualizeArgs;
use commands::cash_flow::CashFlowArgs;
use commands::irr::IrrArgs;

/// Verify advertised loan rates against the repayment schedule
#[derive(Parser)]
#[command(
    name = "rte",
    version,
    about = "Verify advertised loan rates against the repayment schedule",
    long_about = "Computes the exact APR implied by a loan's cash flows, cross-checks it \
                  against an externally estimated APR, and normalises advertised rates \
                  quoted per day, month or year. All arithmetic uses decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine policy file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Log solver and reconciliation decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile an estimated APR with the extracted loan schedule
    Analyze(AnalyzeArgs),
    /// Solve the periodic internal rate of return of a cash-flow list
    Irr(IrrArgs),
    /// Build the signed cash-flow schedule from loan parameters
    CashFlow(CashFlowArgs),
    /// Annualize an advertised rate, inferring its unit when missing
    Annualize(AnnualizeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let policy = match input::file::load_policy(cli.policy.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args, &policy),
        Commands::Irr(args) => commands::irr::run_irr(args, &policy),
        Commands::CashFlow(args) => commands::cash_flow::run_cash_flow(args),
        Commands::Annualize(args) => commands::annualize::run_annualize(args, &policy),
        Commands::Version => {
            println!("rte {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use wealthpath::api;
use wealthpath::core::{Parameters, SolverConfig, optimize, preview};

#[derive(Parser, Debug)]
#[command(
    name = "wealthpath",
    about = "Lifetime consumption-path optimizer (CRRA utility, Euler-equation growth, bequest target)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run a single optimization from flags and print the result as JSON
    Optimize {
        #[arg(long)]
        initial_capital: Option<Decimal>,
        #[arg(long)]
        annual_return: Option<Decimal>,
        #[arg(long)]
        discount_rate: Option<Decimal>,
        #[arg(long)]
        risk_aversion: Option<Decimal>,
        #[arg(long)]
        current_age: Option<u32>,
        #[arg(long)]
        life_expectancy: Option<u32>,
        #[arg(long)]
        inheritance_target: Option<Decimal>,
        /// Skip the series and print only the preview fields
        #[arg(long)]
        preview: bool,
    },
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { port } => {
            if let Err(e) = api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Optimize {
            initial_capital,
            annual_return,
            discount_rate,
            risk_aversion,
            current_age,
            life_expectancy,
            inheritance_target,
            preview: preview_only,
        } => {
            let mut params = Parameters::defaults();
            if let Some(v) = initial_capital {
                params.initial_capital = v;
            }
            if let Some(v) = annual_return {
                params.annual_return = v;
            }
            if let Some(v) = discount_rate {
                params.discount_rate = v;
            }
            if let Some(v) = risk_aversion {
                params.risk_aversion = v;
            }
            if let Some(v) = current_age {
                params.current_age = v;
            }
            if let Some(v) = life_expectancy {
                params.life_expectancy = v;
            }
            if let Some(v) = inheritance_target {
                params.inheritance_target = v;
            }

            let config = SolverConfig::default();
            if preview_only {
                match preview(&params, &config) {
                    Ok(result) => print_json(&result),
                    Err(e) => {
                        eprintln!("Optimization error: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                match optimize(&params, &config) {
                    Ok(result) => print_json(&result),
                    Err(e) => {
                        eprintln!("Optimization error: {e}");
                        std::process::exit(1);
                    }
                }
            }
        }
    }
}

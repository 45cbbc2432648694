use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bracket-cli")]
#[command(about = "Command-line client for the bracket validation service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "BRACKET_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a bracket string
    Validate {
        /// The string to check, e.g. "(())"
        input: String,
    },
    /// Show cache cluster health
    Status,
    /// Show validation statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Validate { input } => {
            client
                .post(format!("{}/validate", base))
                .json(&json!({ "string": input }))
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
        Commands::Stats => client.get(format!("{}/stats", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Service returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }

    println!("{}", body);
    Ok(())
}

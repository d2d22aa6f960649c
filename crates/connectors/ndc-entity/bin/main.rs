use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use ndc_entity::connector;
use ndc_entity::executor::QueryRequest;

/// Resolve selection requests over an entity model.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a request and print the result tree.
    Query(RequestArgs),
    /// Print the query plan of every root field of a request.
    Explain(RequestArgs),
    /// Print the JSON schema of the configuration.
    Schema,
}

#[derive(Args)]
struct RequestArgs {
    /// The configuration directory.
    #[arg(long, env = "NDC_ENTITY_CONFIGURATION", default_value = ".")]
    configuration: PathBuf,
    /// A JSON file holding the request.
    #[arg(long)]
    request: PathBuf,
    /// A JSON file holding the variables of the request.
    #[arg(long)]
    variables: Option<PathBuf>,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Schema => {
            let schema = ndc_entity_configuration::generate_latest_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Query(args) => {
            let configuration = connector::parse_configuration(&args.configuration).await?;
            let mut metrics = prometheus::Registry::new();
            let state = connector::try_init_state(&configuration, &mut metrics).await?;
            let request = read_request(&args).await?;

            let response = connector::query(&configuration, &state, &request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Explain(args) => {
            let configuration = connector::parse_configuration(&args.configuration).await?;
            let mut metrics = prometheus::Registry::new();
            let state = connector::try_init_state(&configuration, &mut metrics).await?;
            let request = read_request(&args).await?;

            for (field, plan) in connector::explain(&configuration, &state, &request)? {
                println!("-- {field}\n{plan}\n");
            }
        }
    }
    Ok(())
}

async fn read_request(args: &RequestArgs) -> anyhow::Result<QueryRequest> {
    let contents = tokio::fs::read_to_string(&args.request)
        .await
        .with_context(|| format!("unable to read {}", args.request.display()))?;
    let mut request: QueryRequest = serde_json::from_str(&contents)
        .with_context(|| format!("unable to parse {}", args.request.display()))?;

    if let Some(variables) = &args.variables {
        let contents = tokio::fs::read_to_string(variables)
            .await
            .with_context(|| format!("unable to read {}", variables.display()))?;
        request.variables = serde_json::from_str(&contents)
            .with_context(|| format!("unable to parse {}", variables.display()))?;
    }

    Ok(request)
}

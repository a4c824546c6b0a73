//! queryrun CLI - submit company-finder queries and collect their results.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use queryrun_client::{ClientConfig, KubectlGateway, QueryClient};
use queryrun_core::{Region, RequestId, ResultPayload, WaitOutcome, WorkRequest};

/// queryrun CLI - Control plane query tool
#[derive(Parser)]
#[command(name = "queryrun")]
#[command(about = "Submit queries to the control plane and collect their results", long_about = None)]
struct Cli {
    /// Namespace the queries live in
    #[arg(short = 'N', long, default_value = "default", global = true)]
    namespace: String,

    /// kubectl executable
    #[arg(long, default_value = "kubectl", global = true)]
    kubectl: String,

    /// kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Upper bound for a single kubectl call, in seconds
    #[arg(long, default_value_t = 30, global = true)]
    command_timeout_secs: u64,

    /// Delay between two status reads, in seconds
    #[arg(long, default_value_t = 2, global = true)]
    poll_interval_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a query, wait for it, print the result and delete it
    Run {
        #[command(flatten)]
        request: RequestArgs,

        /// How long to wait for the query, in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit a query without waiting
    Submit {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the manifest a request would submit
    Manifest {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Get the phase of a query
    Status {
        /// Query name
        name: String,
    },

    /// Wait for a query to finish
    Wait {
        /// Query name
        name: String,

        /// How long to wait, in seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },

    /// Print the result of a finished query
    Results {
        /// Query name
        name: String,

        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a query
    Delete {
        /// Query name
        name: String,
    },

    /// List available agents
    Agents,

    /// List available tools
    Tools,
}

#[derive(Args)]
struct RequestArgs {
    /// Free-text project description
    #[arg(short, long, required_unless_present = "document", conflicts_with = "document")]
    description: Option<String>,

    /// Text file with content extracted from a project document
    #[arg(long)]
    document: Option<PathBuf>,

    /// Region to source companies from
    #[arg(short, long, default_value = "global")]
    region: Region,

    /// Query name (generated when omitted)
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout only carries command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::default()
        .with_kubectl_path(&cli.kubectl)
        .with_namespace(&cli.namespace)
        .with_command_timeout(Duration::from_secs(cli.command_timeout_secs))
        .with_poll_interval(Duration::from_secs(cli.poll_interval_secs));
    if let Some(context) = &cli.context {
        config = config.with_global_arg(format!("--context={}", context));
    }

    let client = QueryClient::new(KubectlGateway::new(&config), config);

    match cli.command {
        Commands::Run {
            request,
            timeout_secs,
            json,
        } => {
            let request = build_request(request).await?;
            let payload = client
                .run_with_deadline(&request, Duration::from_secs(timeout_secs))
                .await?;
            print_payload(&payload, json)?;
        }
        Commands::Submit { request } => {
            let request = build_request(request).await?;
            let id = client.submit(&request).await?;
            println!("Query submitted: {} (namespace {})", id, client.gateway().namespace());
        }
        Commands::Manifest { request } => {
            let request = build_request(request).await?;
            print!("{}", client.manifest(&request).to_yaml()?);
        }
        Commands::Status { name } => {
            let phase = client.status(&RequestId::new(name)).await?;
            println!("{}", phase);
        }
        Commands::Wait { name, timeout_secs } => {
            let id = RequestId::new(name);
            match client.wait(&id, Duration::from_secs(timeout_secs)).await {
                WaitOutcome::Done => println!("Query {} done", id),
                WaitOutcome::Failed => return Err(format!("query {} failed", id).into()),
                WaitOutcome::TimedOut => {
                    return Err(format!("query {} did not finish in {}s", id, timeout_secs).into())
                }
            }
        }
        Commands::Results { name, json } => {
            let payload = client.results(&RequestId::new(name)).await?;
            print_payload(&payload, json)?;
        }
        Commands::Delete { name } => {
            let id = RequestId::new(name);
            if !client.delete(&id).await {
                return Err(format!("failed to delete query {}", id).into());
            }
            println!("Query deleted: {}", id);
        }
        Commands::Agents => {
            print_names("Agents", &client.available_agents().await?);
        }
        Commands::Tools => {
            print_names("Tools", &client.available_tools().await?);
        }
    }

    Ok(())
}

async fn build_request(args: RequestArgs) -> Result<WorkRequest, Box<dyn std::error::Error>> {
    let request = match (args.description, args.document) {
        (Some(description), _) => WorkRequest::describe(description, args.region)?,
        (None, Some(path)) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            WorkRequest::from_document(&file_name, &text, args.region)?
        }
        (None, None) => return Err("either --description or --document is required".into()),
    };

    Ok(match args.name {
        Some(name) => request.with_id(RequestId::parse(name)?),
        None => request,
    })
}

fn print_payload(payload: &ResultPayload, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(payload)?);
        return Ok(());
    }

    if let Some(summary) = payload.summary() {
        println!("Summary:");
        println!("  {}", summary);
    }

    let requirements = payload.requirements();
    if !requirements.is_empty() {
        println!("Requirements:");
        for (i, requirement) in requirements.iter().enumerate() {
            println!("  {}. {}", i + 1, requirement);
        }
    }

    let companies = payload.companies();
    println!("Companies ({}):", companies.len());
    println!(
        "{:<4}  {:<32}  {:<6}  {:<8}  {}",
        "RANK", "NAME", "RATING", "FIT", "LOCATION"
    );
    println!("{}", "-".repeat(80));

    for (i, company) in companies.iter().enumerate() {
        let rank = company.rank.map(|r| r as usize).unwrap_or(i + 1);
        let rating = company
            .rating
            .map(|r| format!("{}/10", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4}  {:<32}  {:<6}  {:<8}  {}",
            rank,
            company.name,
            rating,
            company.project_fit.as_deref().unwrap_or("-"),
            company.location.as_deref().unwrap_or("-")
        );
    }

    if let Some(methodology) = payload.methodology() {
        println!("Methodology:");
        println!("  {}", methodology);
    }

    Ok(())
}

fn print_names(title: &str, names: &[String]) {
    println!("{} ({}):", title, names.len());
    for name in names {
        println!("  {}", name);
    }
}

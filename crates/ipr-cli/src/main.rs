use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipr_audit::ChainCheck;
use ipr_config::Settings;
use ipr_gate::JsonFileApprovalStore;
use ipr_probe::{EosCollector, GatherOptions, SshTransport};
use ipr_registry::{HttpRegistry, RegistryClient};
use ipr_runtime::ReclaimService;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ipr")]
#[command(about = "Address reclamation desk CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Registry connectivity / auth smoke test
    Status,

    /// Audit a prefix: reconcile registry allocations against live evidence
    Audit {
        /// CIDR prefix to audit, e.g. 10.0.1.0/24
        #[arg(long)]
        prefix: String,

        /// Device to probe; repeat for multiple devices
        #[arg(long = "device", required = true)]
        devices: Vec<String>,

        /// Write the report JSON to a file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },

    /// Propose marking addresses deprecated (creates a PENDING request)
    Propose {
        /// Address to reclaim; repeat for multiple addresses
        #[arg(long = "address", required = true)]
        addresses: Vec<String>,
    },

    /// Approve or reject a pending proposal
    Decide {
        /// Approval token from `ipr propose`
        #[arg(long)]
        token: String,

        /// Approve the proposal
        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Reject the proposal
        #[arg(long)]
        reject: bool,
    },

    /// Abandon a pending or approved proposal
    Cancel {
        #[arg(long)]
        token: String,
    },

    /// Execute an approved proposal against the registry
    Execute {
        #[arg(long)]
        token: String,
    },

    /// Show a proposal's current state
    Show {
        #[arg(long)]
        token: String,
    },

    /// Verify the audit trail's hash chain
    TrailVerify,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if .env does not exist; production injects env vars directly.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    info!("settings: {settings}");

    match cli.cmd {
        Commands::Status => {
            let registry = HttpRegistry::new(&settings.registry_url, &settings.registry_token)?;
            let version = registry.version().await?;
            println!("registry_url={}", settings.registry_url);
            println!("registry_version={version}");
        }

        Commands::Audit {
            prefix,
            devices,
            out,
        } => {
            let service = build_service(&settings)?;
            let report = service.reconcile(&prefix, &devices).await?;

            let rendered =
                serde_json::to_string_pretty(&report).context("render report JSON")?;
            match out {
                Some(path) => {
                    fs::write(&path, &rendered)
                        .with_context(|| format!("write report to {path}"))?;
                    println!("report_id={} written={path}", report.report_id);
                }
                None => println!("{rendered}"),
            }
            println!(
                "total_allocated={} total_stale={} reclamation_rate={}",
                report.summary.total_allocated,
                report.summary.total_stale,
                report.summary.reclamation_rate
            );
        }

        Commands::Propose { addresses } => {
            let service = build_service(&settings)?;
            let request = service.propose_reclamation(&addresses)?;
            println!("token={}", request.token);
            println!("state={}", request.state);
            println!("addresses={}", request.addresses.join(","));
        }

        Commands::Decide {
            token,
            approve,
            reject,
        } => {
            if approve == reject {
                anyhow::bail!("pass exactly one of --approve or --reject");
            }
            let service = build_service(&settings)?;
            let request = service.decide_reclamation(parse_token(&token)?, approve)?;
            println!("token={} state={}", request.token, request.state);
        }

        Commands::Cancel { token } => {
            let service = build_service(&settings)?;
            let request = service.cancel_reclamation(parse_token(&token)?)?;
            println!("token={} state={}", request.token, request.state);
        }

        Commands::Execute { token } => {
            let service = build_service(&settings)?;
            let outcome = service.execute_reclamation(parse_token(&token)?).await?;

            for result in &outcome.results {
                println!(
                    "address={} success={} previous={} new={} error={}",
                    result.address,
                    result.success,
                    opt(result.previous_status.map(|s| s.to_string())),
                    opt(result.new_status.map(|s| s.to_string())),
                    opt(result.error.clone()),
                );
            }
            println!(
                "executed={} failed={} state={}",
                outcome.succeeded(),
                outcome.failed(),
                outcome.request.state
            );
        }

        Commands::Show { token } => {
            let service = build_service(&settings)?;
            let request = service.approval_status(parse_token(&token)?)?;
            println!("token={}", request.token);
            println!("state={}", request.state);
            println!("addresses={}", request.addresses.join(","));
            println!("created_at={}", request.created_at.to_rfc3339());
        }

        Commands::TrailVerify => {
            let path = settings.state_dir.join("audit.jsonl");
            match ipr_audit::verify(&path)? {
                ChainCheck::Valid { records } => {
                    println!("chain_valid=true records={records}");
                }
                ChainCheck::Broken { line, reason } => {
                    println!("chain_valid=false line={line} reason={reason}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(settings: &Settings) -> Result<ReclaimService> {
    let registry: Arc<dyn RegistryClient> = Arc::new(HttpRegistry::new(
        &settings.registry_url,
        &settings.registry_token,
    )?);

    let transport = SshTransport::new(settings.device_username.as_str(), settings.probe_timeout)
        .with_extra_opts(settings.device_ssh_opts.clone());
    let collector = Arc::new(EosCollector::new(Arc::new(transport)));

    let store = Arc::new(JsonFileApprovalStore::open(
        settings.state_dir.join("approvals.json"),
    )?);
    let audit = ipr_audit::AuditLog::open(settings.state_dir.join("audit.jsonl"))?;

    Ok(ReclaimService::new(registry, collector, store)
        .with_audit(audit)
        .with_gather_options(GatherOptions {
            per_device_timeout: settings.probe_timeout,
            max_in_flight: settings.probe_max_in_flight,
        }))
}

fn parse_token(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).context("invalid approval token (expected a UUID)")
}

fn opt(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

//! pve-storage-info
//!
//! Reports guest disks and storage capacity across a Proxmox VE cluster.
//! Data goes to stdout, diagnostics to stderr.

use clap::{ArgGroup, Parser, ValueEnum};
use std::io::{self, Write};
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pve_storage_info::{
    DEFAULT_COROSYNC_CONF, Filter, InventoryError, InventoryResult, OutputFormat, ProxmoxClient,
    RateLimitConfig, RenderOptions, RunConfig, View, run,
};

// =============================================================================
// CLI Arguments
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    Table,
    Csv,
    Json,
}

impl From<Output> for OutputFormat {
    fn from(output: Output) -> Self {
        match output {
            Output::Table => OutputFormat::Table,
            Output::Csv => OutputFormat::Csv,
            Output::Json => OutputFormat::Json,
        }
    }
}

/// Cluster-wide disk and storage inventory for Proxmox VE
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").multiple(false)))]
struct Args {
    /// Only these VMIDs (comma separated)
    #[arg(long, value_name = "CSV")]
    vmid: Option<String>,

    /// Only these nodes (comma separated)
    #[arg(long, value_name = "CSV")]
    node: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Output::Table)]
    output: Output,

    /// Suppress the header line (table and CSV)
    #[arg(long)]
    no_header: bool,

    /// Human readable sizes in table mode
    #[arg(long)]
    human: bool,

    /// Concurrent API requests (default: min(8, work items))
    #[arg(long, value_name = "N")]
    workers: Option<NonZeroUsize>,

    /// CSV field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// List cluster nodes
    #[arg(long, group = "mode")]
    list_nodes: bool,

    /// List guests
    #[arg(long, group = "mode")]
    list_vmids: bool,

    /// List storages with capacity per node
    #[arg(long, group = "mode")]
    list_storages: bool,

    /// Total disk size per guest
    #[arg(long, group = "mode")]
    total_per_vm: bool,

    /// Total disk size per node
    #[arg(long, group = "mode")]
    total_per_node: bool,

    /// Disk size per guest and storage
    #[arg(long, group = "mode")]
    vm_per_storage: bool,

    /// Cluster name, ring0 and external addresses per node
    #[arg(long, group = "mode")]
    cluster_info: bool,

    /// API host
    #[arg(long, env = "PROXMOX_HOST", default_value = "localhost")]
    host: String,

    /// API port
    #[arg(long, env = "PROXMOX_PORT", default_value_t = 8006)]
    port: u16,

    /// User name for ticket login
    #[arg(long, env = "PROXMOX_USERNAME")]
    username: Option<String>,

    /// Password for ticket login
    #[arg(long, env = "PROXMOX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Authentication realm
    #[arg(long, env = "PROXMOX_REALM", default_value = "pam")]
    realm: String,

    /// API token id (USER@REALM!TOKENID)
    #[arg(long, env = "PROXMOX_TOKEN_ID", requires = "token_secret")]
    token_id: Option<String>,

    /// API token secret
    #[arg(long, env = "PROXMOX_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Use plain HTTP
    #[arg(long)]
    insecure: bool,

    /// Accept self-signed certificates
    #[arg(long, env = "PROXMOX_ACCEPT_INVALID_CERTS")]
    accept_invalid_certs: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Client side request limit per second
    #[arg(long, value_name = "REQ_PER_SEC")]
    rate_limit: Option<NonZeroU32>,

    /// Local corosync configuration used when the API hides ring0 addresses
    #[arg(long, default_value = DEFAULT_COROSYNC_CONF)]
    corosync_conf: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn view(&self) -> View {
        if self.list_nodes {
            View::ListNodes
        } else if self.list_vmids {
            View::ListVmids
        } else if self.list_storages {
            View::ListStorages
        } else if self.total_per_vm {
            View::TotalPerVm
        } else if self.total_per_node {
            View::TotalPerNode
        } else if self.vm_per_storage {
            View::VmPerStorage
        } else if self.cluster_info {
            View::ClusterInfo
        } else {
            View::Disks
        }
    }

    fn run_config(&self) -> InventoryResult<RunConfig> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(InventoryError::Argument(format!(
                "invalid delimiter {:?}",
                self.delimiter
            )));
        }

        Ok(RunConfig {
            view: self.view(),
            filter: Filter::parse(self.vmid.as_deref(), self.node.as_deref())?,
            output: RenderOptions {
                format: self.output.into(),
                no_header: self.no_header,
                human: self.human,
                delimiter: self.delimiter,
            },
            workers: self.workers.map(NonZeroUsize::get),
            corosync_conf: Some(self.corosync_conf.clone()),
        })
    }

    fn client(&self) -> InventoryResult<ProxmoxClient> {
        let mut builder = ProxmoxClient::builder()
            .host(&self.host)
            .port(self.port)
            .secure(!self.insecure)
            .accept_invalid_certs(self.accept_invalid_certs)
            .timeout(Duration::from_secs(self.timeout))
            .rate_limit(self.rate_limit.map(RateLimitConfig::per_second));

        builder = match (&self.token_id, &self.token_secret) {
            (Some(id), Some(secret)) => builder.token(id, secret),
            _ => match (&self.username, &self.password) {
                (Some(username), Some(password)) => {
                    builder.credentials(username, password, &self.realm)
                }
                _ => {
                    return Err(InventoryError::Argument(
                        "either --token-id/--token-secret or --username/--password is required"
                            .to_string(),
                    ));
                }
            },
        };

        builder.build()
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logging(&args);

    match execute(&args).await {
        Ok(output) => write_output(&output),
        Err(e) => {
            debug!(error = ?e, "run failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn execute(args: &Args) -> InventoryResult<String> {
    let config = args.run_config()?;
    let client = args.client()?;

    // fail on bad credentials before any fan-out starts
    client.login().await?;
    info!(
        host = %args.host,
        view = ?config.view,
        filter = %config.filter.describe(),
        "authenticated"
    );

    run(Arc::new(client), &config).await
}

fn write_output(output: &str) -> ExitCode {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            error!("cannot write output: {}", e);
            eprintln!("error: cannot write output: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_modes_are_exclusive() {
        let result = Args::try_parse_from(["pve-storage-info", "--list-nodes", "--total-per-vm"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_view_and_filter() {
        let args = Args::try_parse_from([
            "pve-storage-info",
            "--total-per-node",
            "--vmid",
            "100, 101",
            "--node",
            "pve01",
            "--output",
            "csv",
            "--delimiter",
            ";",
            "--workers",
            "3",
        ])
        .unwrap();

        let config = args.run_config().unwrap();
        assert_eq!(config.view, View::TotalPerNode);
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.output.delimiter, ';');
        assert_eq!(config.workers, Some(3));
        assert!(config.filter.admits_vmid(101));
        assert!(!config.filter.admits_node("pve02"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Args::try_parse_from(["pve-storage-info", "--workers", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        for delimiter in ["é", "§", "\""] {
            let args =
                Args::try_parse_from(["pve-storage-info", "--output", "csv", "--delimiter", delimiter])
                    .unwrap();
            let error = args.run_config().unwrap_err();
            assert!(matches!(error, InventoryError::Argument(_)));
            assert_eq!(error.exit_code(), 2);
        }
    }

    #[test]
    fn test_bad_vmid_is_argument_error() {
        let args = Args::try_parse_from(["pve-storage-info", "--vmid", "10x"]).unwrap();
        let error = args.run_config().unwrap_err();
        assert_eq!(error.exit_code(), 2);
    }
}

// Configuration management for netcheck
// Supports CLI arguments, config file (TOML), and environment variables

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Review network interfaces, routes and DNS, and run connectivity tests
#[derive(Parser, Debug, Clone)]
#[command(name = "netcheck")]
#[command(author, about, long_about = None, disable_version_flag = true)]
pub struct CliArgs {
    /// Run connectivity tests instead of listing interfaces
    #[arg(short, long)]
    pub test: bool,

    /// Emit JSON instead of tables
    #[arg(short, long)]
    pub json: bool,

    /// Print the version and exit
    #[arg(short, long)]
    pub version: bool,

    /// Only show interfaces that are UP
    #[arg(short, long)]
    pub up: bool,

    /// Fewer interface columns
    #[arg(short, long)]
    pub summary: bool,

    /// Plain output without borders or color
    #[arg(short, long)]
    pub barebones: bool,

    /// Show every table
    #[arg(short, long)]
    pub all: bool,

    /// Clear the screen before printing
    #[arg(short, long)]
    pub clear: bool,

    /// Show the physical interface table
    #[arg(short = 'I', long)]
    pub interfaces: bool,

    /// Show the VLAN table
    #[arg(short = 'V', long)]
    pub vlans: bool,

    /// Show the DNS table
    #[arg(short = 'D', long)]
    pub dns: bool,

    /// Show the route table
    #[arg(short = 'R', long)]
    pub routes: bool,

    /// Show the PCIe device table
    #[arg(short = 'P', long)]
    pub pcie: bool,

    /// Path to configuration file
    #[arg(long, env = "NETCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "NETCHECK_LOG")]
    pub log_level: Option<String>,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub probes: ProbeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    #[serde(default)]
    pub barebones: bool,

    #[serde(default)]
    pub summary: bool,

    #[serde(default)]
    pub up_only: bool,
}

/// Targets and ping timing for the connectivity tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Pinged without name resolution
    #[serde(default = "default_public_ip")]
    pub public_ip: String,

    #[serde(default = "default_public_host")]
    pub public_host: String,

    #[serde(default = "default_webpage_url")]
    pub webpage_url: String,

    #[serde(default = "default_throughput_url")]
    pub throughput_url: String,

    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    #[serde(default = "default_gateway_ping_count")]
    pub gateway_ping_count: u32,

    /// Seconds between echo requests, passed through to ping
    #[serde(default = "default_ping_interval")]
    pub ping_interval: String,

    /// Seconds to wait per reply, passed through to ping
    #[serde(default = "default_ping_wait")]
    pub ping_wait: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_public_ip() -> String {
    "1.1.1.1".to_string()
}
fn default_public_host() -> String {
    "www.cloudflare.com".to_string()
}
fn default_webpage_url() -> String {
    "https://www.cloudflare.com/".to_string()
}
fn default_throughput_url() -> String {
    "https://aka.azureedge.net/probe/test10mb.jpg".to_string()
}
fn default_ping_count() -> u32 {
    5
}
fn default_gateway_ping_count() -> u32 {
    4
}
fn default_ping_interval() -> String {
    "0.25".to_string()
}
fn default_ping_wait() -> String {
    "0.5".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            public_ip: default_public_ip(),
            public_host: default_public_host(),
            webpage_url: default_webpage_url(),
            throughput_url: default_throughput_url(),
            ping_count: default_ping_count(),
            gateway_ping_count: default_gateway_ping_count(),
            ping_interval: default_ping_interval(),
            ping_wait: default_ping_wait(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// What to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Version,
    Test,
    Inventory,
}

/// Which inventory tables to print
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSelection {
    pub interfaces: bool,
    pub vlans: bool,
    pub dns: bool,
    pub routes: bool,
    pub pcie: bool,
}

impl TableSelection {
    fn from_args(args: &CliArgs) -> Self {
        if args.all {
            return TableSelection {
                interfaces: true,
                vlans: true,
                dns: true,
                routes: true,
                pcie: true,
            };
        }

        let requested = TableSelection {
            interfaces: args.interfaces,
            vlans: args.vlans,
            dns: args.dns,
            routes: args.routes,
            pcie: args.pcie,
        };

        if requested == TableSelection::default() {
            TableSelection {
                interfaces: true,
                vlans: true,
                ..TableSelection::default()
            }
        } else {
            requested
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub json: bool,
    pub clear: bool,
    pub barebones: bool,
    pub summary: bool,
    pub up_only: bool,
    pub tables: TableSelection,
    pub probes: ProbeConfig,
    pub log_level: Level,
}

const DEFAULT_CONFIG_PATHS: &[&str] = &["netcheck.toml", "/etc/netcheck.toml"];

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> anyhow::Result<Self> {
        let cli_args = CliArgs::parse();
        let config_file = load_config_file(cli_args.config.as_deref())?;
        Config::merge(cli_args, config_file)
    }

    pub fn merge(cli_args: CliArgs, config_file: ConfigFile) -> anyhow::Result<Self> {
        let mode = if cli_args.version {
            Mode::Version
        } else if cli_args.test {
            Mode::Test
        } else {
            Mode::Inventory
        };

        let level = cli_args
            .log_level
            .as_deref()
            .unwrap_or(&config_file.logging.level);
        let log_level = parse_log_level(level)?;

        Ok(Config {
            mode,
            json: cli_args.json,
            clear: cli_args.clear,
            barebones: cli_args.barebones || config_file.display.barebones,
            summary: cli_args.summary || config_file.display.summary,
            up_only: cli_args.up || config_file.display.up_only,
            tables: TableSelection::from_args(&cli_args),
            probes: config_file.probes,
            log_level,
        })
    }
}

fn load_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    if let Some(config_path) = explicit {
        return read_config_file(config_path);
    }

    // Try loading from default locations
    match DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
        Some(path) => read_config_file(path),
        None => Ok(ConfigFile::default()),
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    tracing::debug!("Loading configuration from: {}", path.display());
    let config_content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    toml::from_str::<ConfigFile>(&config_content)
        .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))
}

fn parse_log_level(level_str: &str) -> anyhow::Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(anyhow::anyhow!("Invalid log level: {}", level_str)),
    }
}

//! portpub CLI.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use portpub_common::PublishConfig;
use portpub_network::{PortMapping, PortPublisher, PublishRequest, parse_port_mappings};
use tabled::{Table, Tabled};

/// portpub - Container port publishing
#[derive(Parser)]
#[command(name = "portpub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML publish configuration
    #[arg(long, global = true, env = "PORTPUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// portpub commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Compute the full port mapping table of a container
    Compute {
        /// Publish request (YAML or JSON)
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Check explicit port mappings for conflicts
    Check {
        /// Publish request (YAML or JSON)
        file: PathBuf,
    },
}

/// Output format for mapping tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table.
    Table,
    /// JSON array.
    Json,
    /// YAML sequence.
    Yaml,
}

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "HOST IP")]
    host_ip: String,
    #[tabled(rename = "HOST PORT")]
    host_port: u16,
    #[tabled(rename = "CONTAINER PORT")]
    container_port: u16,
    #[tabled(rename = "PROTOCOL")]
    protocol: String,
}

impl From<&PortMapping> for MappingRow {
    fn from(mapping: &PortMapping) -> Self {
        let host_ip = if mapping.host_ip.is_empty() {
            "*".to_string()
        } else {
            mapping.host_ip.clone()
        };
        Self {
            host_ip,
            host_port: mapping.host_port,
            container_port: mapping.container_port,
            protocol: mapping.protocol.to_string(),
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    pub fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Compute { file, format } => {
                let request = PublishRequest::from_file(&file)?;
                let mappings = PortPublisher::new(config).publish(&request)?;
                tracing::info!(
                    file = %file.display(),
                    mappings = mappings.len(),
                    "Computed port mappings"
                );
                println!("{}", render(&mappings, format)?);
            }
            Commands::Check { file } => {
                let request = PublishRequest::from_file(&file)?;
                let validated = parse_port_mappings(&request.port_mappings, &config)?;
                println!(
                    "{} port mappings, no conflicts",
                    validated.mappings.len()
                );
            }
        }

        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<PublishConfig> {
    let config = match path {
        Some(path) => PublishConfig::from_file(path)?,
        None => PublishConfig::default(),
    };
    Ok(config)
}

/// Render a mapping table in the requested format.
pub fn render(mappings: &[PortMapping], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Table if mappings.is_empty() => "No ports published".to_string(),
        OutputFormat::Table => {
            let rows: Vec<MappingRow> = mappings.iter().map(MappingRow::from).collect();
            Table::new(rows).to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(mappings)?,
        OutputFormat::Yaml => serde_yaml::to_string(mappings)?,
    };
    Ok(rendered)
}

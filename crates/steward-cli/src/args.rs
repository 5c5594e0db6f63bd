//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use steward_core::TagMode;
use steward_core::domain::{DesiredTags, Parameters, WaitSpec};

#[derive(Parser)]
#[command(name = "steward")]
#[command(about = "Wait for cloud resources and reconcile their tags", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(long, global = true, env = "STEWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Provider region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Access key
    #[arg(long, global = true, visible_aliases = ["aws-access-key", "ec2-access-key"])]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long, global = true, visible_aliases = ["aws-secret-key", "ec2-secret-key"])]
    pub secret_key: Option<String>,

    /// Fixture document backing the provider
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll a waiter until the resource reaches the target state
    Wait(WaitArgs),
    /// List, add or remove tags on a load balancer
    Tags(TagsArgs),
    /// Call a service operation and print its response
    Call(CallArgs),
}

#[derive(Args)]
pub struct WaitArgs {
    /// Resource kind / service name (e.g. emr, ec2, rds)
    #[arg(long, visible_alias = "service")]
    pub name: String,

    /// Waiter name
    #[arg(long)]
    pub until: String,

    /// Waiter parameters as a JSON object
    #[arg(long, value_parser = parse_parameters, default_value = "{}")]
    pub parameters: Parameters,

    /// Seconds between attempts
    #[arg(long)]
    pub delay: Option<u64>,

    /// Maximum number of attempts
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl WaitArgs {
    pub fn into_spec(self) -> WaitSpec {
        WaitSpec {
            resource_kind: self.name,
            waiter_name: self.until,
            parameters: self.parameters,
            delay: self.delay.map(Duration::from_secs),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Args)]
pub struct TagsArgs {
    /// Load balancer name
    #[arg(long)]
    pub name: String,

    /// present, absent or list
    #[arg(long, default_value_t = TagMode::Present)]
    pub state: TagMode,

    /// Tags as a JSON object, e.g. '{"env":"prod","port":80}'
    #[arg(long, value_parser = parse_tags)]
    pub tags: Option<DesiredTags>,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub struct CallArgs {
    /// Service name
    #[arg(long, visible_alias = "service")]
    pub name: String,

    /// Operation name
    #[arg(long)]
    pub operation: String,

    /// Operation parameters as a JSON object
    #[arg(long, value_parser = parse_parameters, default_value = "{}")]
    pub parameters: Parameters,
}

fn parse_parameters(s: &str) -> Result<Parameters, String> {
    serde_json::from_str(s).map_err(|e| format!("expected a JSON object: {e}"))
}

fn parse_tags(s: &str) -> Result<DesiredTags, String> {
    serde_json::from_str(s).map_err(|e| format!("expected a JSON object of scalar values: {e}"))
}

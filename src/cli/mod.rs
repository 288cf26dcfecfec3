//! The `gocd` command-line client.
//!
//! Each subcommand validates its flags locally, builds a [`GocdClient`] from
//! the layered [`Config`], issues one request and renders an [`Outcome`].

mod agents;
mod jobs;
pub mod output;
mod pipeline_config;
mod pipelines;
mod templates;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error};

pub use output::{Outcome, OutputFormat};

use crate::client::GocdClient;
use crate::config::{Config, DEFAULT_PROFILE};
use crate::error::{Error, Result};

/// Command-line client for the GoCD REST API.
#[derive(Debug, Parser)]
#[command(name = "gocd", version, about = "Command-line client for the GoCD REST API", long_about = None)]
pub struct Cli {
    /// GoCD server URL, with or without the trailing /go
    #[arg(long, global = true, env = "GOCD_SERVER")]
    pub server: Option<String>,

    #[arg(long, global = true, env = "GOCD_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "GOCD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept invalid TLS certificates (also GOCD_SKIP_SSL_CHECK)
    #[arg(long, global = true)]
    pub skip_ssl_check: bool,

    /// Profile to read from the config file, `default` unless given
    #[arg(long, global = true, env = "GOCD_PROFILE")]
    pub profile: Option<String>,

    /// Config file, ~/.gocd.conf unless given
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a pipeline config in a group
    CreatePipelineConfig(pipeline_config::CreateArgs),
    /// Replace a pipeline config
    UpdatePipelineConfig(pipeline_config::UpdateArgs),
    /// Delete a pipeline config
    DeletePipelineConfig(NameArgs),
    /// Show a pipeline config
    GetPipelineConfig(NameArgs),
    /// List jobs waiting for an agent
    ListScheduledJobs,
    /// List agents
    ListAgents,
    /// Show one agent
    GetAgent(agents::GetArgs),
    /// Show whether a pipeline is paused, locked and schedulable
    GetPipelineStatus(NameArgs),
    /// Pause a pipeline
    PausePipeline(pipelines::PauseArgs),
    /// Unpause a pipeline
    UnpausePipeline(NameArgs),
    /// List pipeline templates
    ListPipelineTemplates,
    /// Show a pipeline template
    GetPipelineTemplate(NameArgs),
}

/// `--name` for commands that address one entity.
#[derive(Debug, Clone, clap::Args)]
pub struct NameArgs {
    #[arg(long)]
    pub name: Option<String>,
}

impl NameArgs {
    pub(crate) fn name(&self) -> Result<&str> {
        required("--name", self.name.as_deref())
    }
}

impl Commands {
    /// Name reported in the rendered outcome.
    pub fn request_name(&self) -> &'static str {
        match self {
            Self::CreatePipelineConfig(_) => "CreatePipelineConfig",
            Self::UpdatePipelineConfig(_) => "UpdatePipelineConfig",
            Self::DeletePipelineConfig(_) => "DeletePipelineConfig",
            Self::GetPipelineConfig(_) => "GetPipelineConfig",
            Self::ListScheduledJobs => "ListScheduledJobs",
            Self::ListAgents => "ListAgents",
            Self::GetAgent(_) => "GetAgent",
            Self::GetPipelineStatus(_) => "GetPipelineStatus",
            Self::PausePipeline(_) => "PausePipeline",
            Self::UnpausePipeline(_) => "UnpausePipeline",
            Self::ListPipelineTemplates => "ListPipelineTemplates",
            Self::GetPipelineTemplate(_) => "GetPipelineTemplate",
        }
    }
}

/// Connection settings gathered from the command line.
///
/// The client is only built once a command has validated its own flags,
/// so flag errors are reported without touching the config file or network.
pub struct Context {
    profile: Option<String>,
    config_file: Option<PathBuf>,
    flags: Config,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            profile: cli.profile.clone().filter(|p| !p.trim().is_empty()),
            config_file: cli.config_file.clone(),
            flags: Config {
                server: cli.server.clone(),
                username: cli.username.clone(),
                password: cli.password.clone(),
                skip_ssl_check: cli.skip_ssl_check,
                timeout_secs: None,
            },
        }
    }

    /// Resolve settings (file profile, then environment, then flags) and build a client.
    pub fn client(&self) -> Result<GocdClient> {
        let config = Config::load(self.config_file.as_deref(), self.profile.as_deref())?
            .with_env()
            .merge(self.flags.clone());
        let client = GocdClient::new(&config)?;
        debug!(
            base_url = %client.base_url(),
            profile = %self.profile.as_deref().unwrap_or(DEFAULT_PROFILE),
            "Resolved GoCD server"
        );
        Ok(client)
    }
}

/// Run `cli`, writing the rendered outcome to `out`. Returns the exit code.
pub async fn run(cli: Cli, out: &mut impl Write) -> u8 {
    let ctx = Context::from_cli(&cli);
    let request = cli.command.request_name();

    let outcome = match cli.command {
        Commands::CreatePipelineConfig(args) => {
            Outcome::from_result(request, pipeline_config::create(&args, &ctx).await)
        },
        Commands::UpdatePipelineConfig(args) => {
            Outcome::from_result(request, pipeline_config::update(&args, &ctx).await)
        },
        Commands::DeletePipelineConfig(args) => {
            Outcome::from_result(request, pipeline_config::delete(&args, &ctx).await)
        },
        Commands::GetPipelineConfig(args) => {
            Outcome::from_result(request, pipeline_config::get(&args, &ctx).await)
        },
        Commands::ListScheduledJobs => Outcome::from_result(request, jobs::list_scheduled(&ctx).await),
        Commands::ListAgents => Outcome::from_result(request, agents::list(&ctx).await),
        Commands::GetAgent(args) => Outcome::from_result(request, agents::get(&args, &ctx).await),
        Commands::GetPipelineStatus(args) => {
            Outcome::from_result(request, pipelines::status(&args, &ctx).await)
        },
        Commands::PausePipeline(args) => Outcome::from_result(request, pipelines::pause(&args, &ctx).await),
        Commands::UnpausePipeline(args) => {
            Outcome::from_result(request, pipelines::unpause(&args, &ctx).await)
        },
        Commands::ListPipelineTemplates => Outcome::from_result(request, templates::list(&ctx).await),
        Commands::GetPipelineTemplate(args) => {
            Outcome::from_result(request, templates::get(&args, &ctx).await)
        },
    };

    if let Err(err) = output::render(out, cli.format, &outcome) {
        error!(error = %err, "Failed to write output");
        return 1;
    }
    outcome.exit_code()
}

/// A flag value that must be present and non-blank.
pub(crate) fn required<'a>(flag: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::validation(format!("'{}' is missing", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_required() {
        assert_eq!(required("--name", Some(" build ")).unwrap(), "build");

        let err = required("--name", None).unwrap_err();
        assert_eq!(err.to_string(), "'--name' is missing");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = required("--group", Some("")).unwrap_err();
        assert_eq!(err.to_string(), "'--group' is missing");
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gocd",
            "get-pipeline-config",
            "--name",
            "build",
            "--server",
            "https://ci.example.com",
            "--format",
            "yaml",
        ])
        .unwrap();

        assert_eq!(cli.server.as_deref(), Some("https://ci.example.com"));
        assert_eq!(cli.format, OutputFormat::Yaml);
        assert_eq!(cli.command.request_name(), "GetPipelineConfig");
    }

    fn context(extra: &[&str]) -> Context {
        let mut argv = vec!["gocd", "--server", "https://ci.example.com"];
        argv.extend_from_slice(extra);
        argv.push("list-agents");
        Context::from_cli(&Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_named_config_sources_must_exist() {
        let err = context(&["--config-file", "/nonexistent/.gocd.conf"]).client().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{:?}", err);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "staging:\n  username: deployer").unwrap();
        let path = file.path().to_str().unwrap();

        assert!(context(&["--config-file", path]).client().is_ok());
        assert!(context(&["--config-file", path, "--profile", ""]).client().is_ok());
        assert!(context(&["--config-file", path, "--profile", "staging"]).client().is_ok());

        let err = context(&["--config-file", path, "--profile", "prod"]).client().unwrap_err();
        assert!(err.to_string().contains("profile 'prod' not found"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

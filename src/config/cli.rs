use crate::config::ConsoleConfig;
use crate::domain::model::{ProjectQuery, SortOrder};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "console-proxy.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "console-proxy")]
#[command(about = "Project console backend proxy and command-line client")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to the TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (proxy and settings endpoints)
    Serve(ServeArgs),
    /// Work with projects on the backend
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },
    /// Show backend health
    Health,
    /// Read or change the backend API URL override
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Socket address to listen on, e.g. 0.0.0.0:8080")]
    pub listen: Option<String>,

    #[arg(long, help = "Path prefix the proxy is mounted under")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectsCommand {
    /// List projects, one page at a time
    List(ListArgs),
    /// Show a single project
    Show { id: String },
    /// Show project counters
    Stats,
    /// Import projects from an .xlsx/.xls file
    Import { file: PathBuf },
    /// Export projects to a spreadsheet
    Export {
        #[arg(long)]
        query: Option<String>,

        #[arg(long, short, help = "Output file or directory")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long, default_value = "1")]
    pub page: u64,

    #[arg(long, default_value = "10")]
    pub limit: u64,

    #[arg(long, default_value = "createdAt")]
    pub sort_by: String,

    #[arg(long, value_enum, default_value = "desc")]
    pub sort_order: SortOrder,
}

impl From<&ListArgs> for ProjectQuery {
    fn from(args: &ListArgs) -> Self {
        ProjectQuery {
            query: args.query.clone().filter(|q| !q.is_empty()),
            page: Some(args.page),
            limit: Some(args.limit),
            sort_by: Some(args.sort_by.clone()),
            sort_order: Some(args.sort_order),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum SettingsCommand {
    /// Show the stored override and the URL currently in effect
    Get,
    /// Store a new backend API URL
    Set { url: String },
}

impl CliConfig {
    /// The config path and whether it was given explicitly.
    pub fn config_path(&self) -> (&Path, bool) {
        match &self.config {
            Some(path) => (path.as_path(), true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Flags given to `serve` take precedence over the file.
    pub fn apply_overrides(&self, config: &mut ConsoleConfig) {
        if let Command::Serve(args) = &self.command {
            if let Some(listen) = &args.listen {
                config.server.listen = listen.clone();
            }
            if let Some(prefix) = &args.prefix {
                config.server.proxy_prefix = prefix.clone();
            }
        }
    }
}

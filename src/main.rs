use anyhow::Context;
use clap::Parser;
use console_proxy::app::{self, server};
use console_proxy::config::cli::{Command, ProjectsCommand, SettingsCommand};
use console_proxy::core::ProjectApi;
use console_proxy::domain::model::ProjectQuery;
use console_proxy::utils::{logger, validation::Validate};
use console_proxy::{BackendClient, BaseUrlResolver, CliConfig, ConsoleConfig, ConsoleError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let (config_path, explicit) = cli.config_path();
    let mut config = ConsoleConfig::load(config_path, explicit)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    // 初始化日誌
    logger::init_logger(&config.logging.format, cli.verbose);
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let resolver = app::build_resolver(&config);

    if let Err(e) = run(&cli.command, &config, resolver).await {
        tracing::error!("❌ Command failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(
    command: &Command,
    config: &ConsoleConfig,
    resolver: Arc<BaseUrlResolver>,
) -> Result<(), ConsoleError> {
    match command {
        Command::Serve(_) => server::serve(config, resolver).await,
        Command::Projects { command } => {
            let api = BackendClient::new(resolver);
            run_projects(command, &api).await
        }
        Command::Health => {
            let api = BackendClient::new(resolver);
            print_json(&api.health().await?)
        }
        Command::Settings { command } => match command {
            SettingsCommand::Get => print_json(&serde_json::json!({
                "apiUrl": resolver.get_override()?,
                "resolvedUrl": resolver.resolve(),
            })),
            SettingsCommand::Set { url } => {
                resolver.set_override(url)?;
                println!("✅ API URL saved: {}", resolver.resolve());
                Ok(())
            }
        },
    }
}

async fn run_projects(command: &ProjectsCommand, api: &dyn ProjectApi) -> Result<(), ConsoleError> {
    match command {
        ProjectsCommand::List(args) => print_json(&api.list_projects(&ProjectQuery::from(args)).await?),
        ProjectsCommand::Show { id } => print_json(&api.get_project(id).await?),
        ProjectsCommand::Stats => print_json(&api.project_stats().await?),
        ProjectsCommand::Import { file } => {
            let summary = api.import_projects(file).await?;
            println!(
                "✅ Imported {} projects ({} failed)",
                summary.success_count, summary.fail_count
            );
            Ok(())
        }
        ProjectsCommand::Export { query, output } => {
            let export = api.export_projects(query.as_deref()).await?;
            let target = export_target(output.as_deref(), &export.filename);
            tokio::fs::write(&target, &export.content).await?;
            println!("📁 Exported {} bytes to {}", export.content.len(), target.display());
            Ok(())
        }
    }
}

/// Explicit file paths win; directories receive the server-provided file name.
fn export_target(output: Option<&Path>, filename: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(filename),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ConsoleError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

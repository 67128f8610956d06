//! Play Publisher CLI
//!
//! Uploads a release APK to Google Play through one edit session

use anyhow::{Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use play_publisher::logging;
use play_publisher::{
    AndroidPublisherClient, ApiConfig, ApkPublisher, CONFIG_FILENAME, ConfigLoadOptions,
    ConfigLoader, CredentialSource, CredentialsConfig, PublishConfig, PublishError,
    PublishRequest, PublishState, resolve_artifact,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

/// Google Play APK upload assistant
#[derive(Parser)]
#[command(name = "play-publisher")]
#[command(version)]
#[command(about = "Upload a release APK to Google Play", long_about = None)]
struct Cli {
    /// Increase diagnostic output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the commands that resolve a publish target
#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Project path (defaults to current directory)
    #[arg(value_name = "PROJECT_PATH")]
    project_path: Option<PathBuf>,

    /// Application id of the target app
    #[arg(short, long)]
    package_name: Option<String>,

    /// Glob pattern locating the APK
    #[arg(short, long)]
    artifact: Option<String>,

    /// Service account JSON key file
    #[arg(short, long)]
    credentials: Option<String>,

    /// Release track (internal, alpha, beta, production, ...)
    #[arg(short, long)]
    track: Option<String>,

    /// Android Publisher API base URL
    #[arg(long)]
    api_base_url: Option<String>,
}

impl TargetArgs {
    fn project_path(&self) -> PathBuf {
        self.project_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn to_config(&self) -> PublishConfig {
        PublishConfig {
            package_name: self.package_name.clone(),
            credentials: self.credentials.as_ref().map(|path| CredentialsConfig {
                path: Some(path.clone()),
                env: None,
            }),
            artifact: self.artifact.clone(),
            track: self.track.clone(),
            api: self.api_base_url.as_ref().map(|url| ApiConfig {
                base_url: Some(url.clone()),
                upload_base_url: None,
            }),
            ..PublishConfig::overrides()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the APK and commit the edit
    Upload {
        #[command(flatten)]
        target: TargetArgs,

        /// Validate the edit on the server and discard it instead of committing
        #[arg(long)]
        dry_run: bool,

        /// Print the publish report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration, credentials and artifact without contacting Google Play
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Write a default .play-publish.yaml
    Init {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli.command).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            report_error(&e);
            process::exit(1);
        }
    }
}

async fn run(command: Commands) -> Result<i32> {
    let env: HashMap<String, String> = std::env::vars().collect();

    match command {
        Commands::Upload {
            target,
            dry_run,
            json,
        } => upload_command(target, dry_run, json, &env).await,
        Commands::Check { target } => check_command(target, &env).await,
        Commands::Init {
            project_path,
            force,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            init_command(&path, force).await
        }
    }
}

fn report_error(error: &anyhow::Error) {
    eprintln!("{}", error);

    if let Some(publish_error) = error.downcast_ref::<PublishError>() {
        eprintln!("  code: {}", publish_error.code());
        if let PublishError::AmbiguousArtifact { candidates, .. } = publish_error {
            for candidate in candidates {
                eprintln!("    - {}", candidate.display());
            }
        }
        for action in publish_error.suggested_actions() {
            eprintln!("  💡 {}", action);
        }
    }
}

/// Load the layered configuration and reject invalid values
async fn load_config(
    target: &TargetArgs,
    project_path: &Path,
    env: &HashMap<String, String>,
) -> Result<PublishConfig> {
    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path: project_path.to_path_buf(),
        cli_args: Some(target.to_config()),
        env: env.clone(),
    })
    .await?;

    let validation = ConfigLoader::validate(&config);
    for warning in &validation.warnings {
        println!("  ⚠️  [{}] {}", warning.field, warning.message);
        if let Some(ref suggestion) = warning.suggestion {
            println!("      {}", suggestion);
        }
    }
    if !validation.valid {
        for error in &validation.errors {
            eprintln!("  ❌ [{}] {}", error.field, error.message);
        }
        bail!(PublishError::ConfigError(format!(
            "{} invalid configuration value(s)",
            validation.errors.len()
        )));
    }

    Ok(config)
}

async fn upload_command(
    target: TargetArgs,
    dry_run: bool,
    json: bool,
    env: &HashMap<String, String>,
) -> Result<i32> {
    let project_path = target.project_path();
    if !json {
        println!("\n📦 play-publisher\n");
    }

    let config = load_config(&target, &project_path, env).await?;
    let (key, source) = CredentialSource::load(&config, &project_path, env)?;
    let artifact = resolve_artifact(config.artifact_pattern(), &project_path)?;

    if !json {
        println!("  Package:     {}", config.package_name());
        println!("  Credentials: {} ({})", source, key.client_email);
        println!(
            "  Artifact:    {} ({})",
            artifact.path.display(),
            artifact.display_size()
        );
        if let Some(track) = config.track() {
            println!("  Track:       {}", track);
        }
        println!();
    }

    let client = AndroidPublisherClient::connect(&config, &key).await?;
    let publisher = ApkPublisher::new(client);

    let request = PublishRequest {
        package_name: config.package_name().to_string(),
        artifact,
        track: config.track().map(str::to_string),
        dry_run,
    };
    let report = publisher.publish(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    match report.state {
        PublishState::Committed => {
            println!("APK successfully uploaded to Google Play!");
        }
        PublishState::Validated => {
            println!(
                "✅ Dry run: versionCode {} validated in edit {} (discarded)",
                report.version_code, report.edit_id
            );
        }
    }

    Ok(0)
}

async fn check_command(target: TargetArgs, env: &HashMap<String, String>) -> Result<i32> {
    println!("\n🔍 Upload Check\n");

    let project_path = target.project_path();
    let config = load_config(&target, &project_path, env).await?;
    let mut ready = true;

    println!("  ✅ Package: {}", config.package_name());

    match CredentialSource::load(&config, &project_path, env) {
        Ok((key, source)) => {
            println!("  ✅ Credentials: {} ({})", source, key.client_email);
        }
        Err(e) => {
            println!("  ❌ Credentials: {}", e);
            ready = false;
        }
    }

    match resolve_artifact(config.artifact_pattern(), &project_path) {
        Ok(artifact) => {
            println!(
                "  ✅ Artifact: {} ({})",
                artifact.path.display(),
                artifact.display_size()
            );
        }
        Err(e) => {
            println!("  ❌ Artifact: {}", e);
            if let PublishError::AmbiguousArtifact { candidates, .. } = &e {
                for candidate in candidates {
                    println!("    - {}", candidate.display());
                }
            }
            ready = false;
        }
    }

    match config.track() {
        Some(track) => println!("  ✅ Track: {}", track),
        None => println!("  ✅ Track: (unchanged)"),
    }

    println!();
    Ok(if ready { 0 } else { 1 })
}

async fn init_command(project_path: &Path, force: bool) -> Result<i32> {
    println!("\n🎯 Initialize play-publisher\n");

    let config_path = project_path.join(CONFIG_FILENAME);
    if config_path.exists() && !force {
        eprintln!(
            "⚠️  {} already exists (use --force to overwrite)",
            config_path.display()
        );
        return Ok(1);
    }

    let yaml = serde_yaml::to_string(&PublishConfig::template())?;
    tokio::fs::write(&config_path, yaml).await?;

    println!("  ✅ Created {}", config_path.display());
    Ok(0)
}

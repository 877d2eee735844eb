//! Keystroke Biometrics CLI
//!
//! Enroll and verify typing sessions against a local profile store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use keystroke_biometrics::{
    audit::create_shared_log_with_persistence, BiometricService, BiometricsError, Config,
    JsonFileProfileStore, KeystrokeEvent, SessionRequest, SECURITY_NOTICE, VERSION,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystroke-auth")]
#[command(version = VERSION)]
#[command(about = "Keystroke dynamics enrollment and verification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a training session for a user
    Enroll {
        /// User to enroll
        #[arg(long)]
        user: String,

        /// Text that was typed (overrides the value in the input file)
        #[arg(long)]
        text: Option<String>,

        /// JSON file with a session payload or a bare keystroke array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Verify a typing sample against every enrolled profile
    Verify {
        /// Claimed identity
        #[arg(long)]
        user: String,

        /// JSON file with a session payload or a bare keystroke array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show training progress for a user
    Stats {
        #[arg(long)]
        user: String,
    },

    /// Show enrollment and verification counters
    Audit,

    /// Show configuration
    Config,

    /// Display the security notice
    Notice,

    /// Serve the HTTP API (requires server feature)
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,

        /// Comma-separated list of allowed CORS origins (falls back to CORS_ORIGINS)
        #[arg(long)]
        cors_origins: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {}", e);
        Config::default()
    });

    match cli.command {
        Commands::Enroll { user, text, input } => cmd_enroll(&config, user, text, &input),
        Commands::Verify { user, input } => cmd_verify(&config, user, &input),
        Commands::Stats { user } => cmd_stats(&config, &user),
        Commands::Audit => cmd_audit(&config),
        Commands::Config => cmd_config(&config),
        Commands::Notice => {
            println!("{SECURITY_NOTICE}");
            Ok(())
        }
        #[cfg(feature = "server")]
        Commands::Serve { port, cors_origins } => cmd_serve(config, port, cors_origins),
    }
}

fn open_service(config: &Config) -> anyhow::Result<BiometricService<JsonFileProfileStore>> {
    config.ensure_directories()?;
    let store = JsonFileProfileStore::open(config.profiles_path())
        .with_context(|| format!("opening profile store {:?}", config.profiles_path()))?;
    let audit = create_shared_log_with_persistence(config.audit_path());
    Ok(BiometricService::from_config(store, config).with_audit_log(audit))
}

/// Read a session payload, accepting either a full request or a bare keystroke list.
fn read_request(input: &Path, user: String, text: Option<String>) -> anyhow::Result<SessionRequest> {
    let content = if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input:?}"))?
    };

    let mut request = match serde_json::from_str::<Vec<KeystrokeEvent>>(&content) {
        Ok(keystrokes) => SessionRequest::new(user.clone(), String::new(), keystrokes),
        Err(_) => SessionRequest::from_json(&content)?,
    };

    request.user_id = user;
    if let Some(text) = text {
        request.text = text;
    }
    Ok(request)
}

fn cmd_enroll(config: &Config, user: String, text: Option<String>, input: &Path) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let request = read_request(input, user, text)?;

    let outcome = service.enroll(&request);
    service.audit().save()?;

    match outcome {
        Ok(receipt) => {
            let progress = service.user_stats(&receipt.user_id)?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            println!();
            println!(
                "Enrolled session {} for {} ({} sessions total)",
                receipt.id, receipt.user_id, progress.session_count
            );
            Ok(())
        }
        Err(e @ BiometricsError::InconsistentPattern { .. }) => {
            anyhow::bail!("session rejected: {e}")
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_verify(config: &Config, user: String, input: &Path) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let request = read_request(input, user, None)?;

    let result = service.verify(&request)?;
    service.audit().save()?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    println!();
    if result.verified {
        println!("Verified: {} is the closest profile", result.claimed_user);
    } else if let Some(best) = result.best_match() {
        println!(
            "Not verified: closest profile is {} (score {})",
            best.user_id, best.score
        );
    } else {
        println!("Not verified: no enrolled profiles");
    }
    Ok(())
}

fn cmd_stats(config: &Config, user: &str) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let stats = service.user_stats(user)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn cmd_audit(config: &Config) -> anyhow::Result<()> {
    let audit = create_shared_log_with_persistence(config.audit_path());
    println!("{}", audit.summary());
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(config: Config, port: Option<u16>, cors_origins: Option<String>) -> anyhow::Result<()> {
    use keystroke_biometrics::server::{run, ServerConfig};
    use keystroke_biometrics::ServerSettings;

    config.ensure_directories()?;

    let mut server_config = ServerConfig::from_config(&config);
    if let Some(port) = port {
        server_config.port = port;
    }
    if let Some(origins) = cors_origins.or_else(|| std::env::var("CORS_ORIGINS").ok()) {
        server_config.cors_origins = ServerSettings::origins_from_csv(&origins);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (_addr, shutdown_tx) = run(server_config).await?;
        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        Ok::<(), anyhow::Error>(())
    })
}

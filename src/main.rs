//! ETA document signer CLI.
//!
//! Canonicalizes and signs JSON documents or batch envelopes with the key
//! configured in `config.toml`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tokio_util::sync::CancellationToken;

use eta_signer::adapters::http::server::sha256_hex;
use eta_signer::infra::config::{validate_config, ConfigManager, SignerConfiguration};
use eta_signer::infra::logging;
use eta_signer::{canonicalize, signer_from_config, BatchOrchestrator};

#[derive(Parser)]
#[command(name = "eta-signer")]
#[command(about = "CAdES-BES signing of e-invoice JSON documents")]
#[command(long_about = "
ETA Document Signer - canonicalize and sign JSON e-invoice documents

EXAMPLES:
    # Show the canonical form a signature would cover
    eta-signer canonicalize invoice.json

    # Sign one document
    eta-signer sign invoice.json -o invoice.signed.json

    # Sign a batch envelope {\"documents\": [...]}
    eta-signer sign --batch batch.json

    # Create a configuration file
    eta-signer config init

ENVIRONMENT VARIABLES:
    ETA_SIGNER_CONFIG               Configuration file path
    ETA_SIGNER_KEYSTORE_PASSWORD    Keystore password or PIV PIN
    RUST_LOG                        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true, env = "ETA_SIGNER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical string of a document ('-' reads stdin)
    Canonicalize {
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,
    },

    /// Sign a document or a batch envelope ('-' reads stdin)
    Sign {
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Input is a batch envelope {"documents": [...]}
        #[arg(short, long)]
        batch: bool,

        /// Output file path (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Print the configuration file path
    Path,

    /// Set a configuration value (section.key)
    Set {
        /// Configuration key, e.g. keystore.path
        key: String,
        /// Configuration value
        value: String,
    },

    /// Print the value to put in server.password_sha256
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    match cli.command {
        Commands::Canonicalize { input_file } => {
            let document = read_input(&input_file)?;
            println!("{}", canonicalize(&document)?);
        }
        Commands::Sign {
            input_file,
            batch,
            output,
        } => {
            let config = config_manager.load()?;
            handle_sign_command(&config, &input_file, batch, output.as_deref()).await?;
        }
        Commands::Config(config_cmd) => handle_config_command(&config_manager, config_cmd)?,
    }
    Ok(())
}

async fn handle_sign_command(
    config: &SignerConfiguration,
    input_file: &Path,
    batch: bool,
    output: Option<&Path>,
) -> Result<()> {
    let input = read_input(input_file)?;
    let signer = signer_from_config(config)?;

    let (rendered, failed) = if batch {
        let orchestrator = BatchOrchestrator::new(Arc::new(signer), &config.batch);
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted; no further documents will be dispatched");
                on_interrupt.cancel();
            }
        });
        let report = orchestrator.sign_batch(&input, cancel).await?;
        let failed = report.failures().len();
        let rendered = serde_json::to_string(&report.into_envelope()).into_diagnostic()?;
        (rendered, failed)
    } else {
        (signer.sign_text(&input)?, 0)
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered).into_diagnostic()?;
            eprintln!("✅ Signed output written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if failed > 0 {
        return Err(miette::miette!("{failed} document(s) could not be signed"));
    }
    Ok(())
}

fn handle_config_command(config_manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => {
            let mut config = config_manager.load_or_create_default()?;
            if config.keystore.password.is_some() {
                config.keystore.password = Some("********".to_string());
            }
            println!("📋 Configuration file: {}", config_manager.config_path().display());
            println!("{}", toml::to_string_pretty(&config).into_diagnostic()?);
            if let Err(e) = validate_config(&config) {
                println!("⚠️  {e}");
            }
        }

        ConfigCommands::Init => {
            if config_manager.config_path().exists() {
                println!(
                    "📋 Configuration already exists: {}",
                    config_manager.config_path().display()
                );
                return Ok(());
            }
            config_manager.load_or_create_default()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to customize settings, or use 'config set' commands.");
        }

        ConfigCommands::Path => println!("{}", config_manager.config_path().display()),

        ConfigCommands::Set { key, value } => {
            config_manager.update_value(&key, &value)?;
            println!("✅ Configuration updated: {key}");
        }

        ConfigCommands::HashPassword { password } => println!("{}", sha256_hex(password.as_bytes())),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .into_diagnostic()?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .into_diagnostic()
            .map_err(|e| e.wrap_err(format!("Failed to read {}", path.display())))
    }
}

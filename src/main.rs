use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkdrop::config::ServerConfig;
use linkdrop::server::{self, AppState};
use linkdrop::startup::StartupValidator;

#[derive(Parser)]
#[command(name = "linkdropd")]
#[command(about = "Signed-link file drop server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, help = "Config file path")]
    config: Option<String>,

    #[arg(long, help = "Data directory path (overrides config)")]
    data: Option<String>,

    #[arg(long, help = "Listen address (overrides config)")]
    listen: Option<String>,

    #[arg(long, help = "Base URL of issued links (overrides config)")]
    base_url: Option<String>,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show configuration and object count
    Status,
    /// List stored objects with signed links
    List,
    /// Print the signed download link of a stored object
    Link { id: String },
    /// Audit the data directory
    VerifyStore,
    /// Write the effective configuration as TOML
    GenerateConfig {
        #[arg(long, default_value = linkdrop::config::DEFAULT_CONFIG_FILE, help = "Config file path")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("linkdrop=debug,linkdropd=debug,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = ServerConfig::load(cli.config.as_deref())?;

    // Override config with CLI args if provided
    if let Some(data) = cli.data {
        config.data_directory = data.into();
    }
    if let Some(listen) = cli.listen {
        config.listen_address = listen;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        config.save(output)?;
        if cli.json {
            println!("{}", serde_json::json!({"success": true, "output": output}));
        } else {
            println!("✅ Wrote configuration to {}", output);
        }
        return Ok(());
    }

    if let Err(e) = config.ensure_directories() {
        if cli.json {
            println!("{}", serde_json::json!({"error": format!("Failed to create directories: {}", e)}));
        } else {
            eprintln!("❌ Failed to create directories: {}", e);
        }
        return Err(e);
    }

    match cli.command {
        Some(Commands::Status) => {
            let state = AppState::new(config)?;
            let objects = state.store.list().await.map(|o| o.len());
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                    "status": if objects.is_ok() { "ready" } else { "unreadable" },
                    "data_directory": state.config.data_directory,
                    "listen_address": state.config.listen_address,
                    "base_url": state.config.link_prefix(),
                    "objects": objects.as_ref().ok(),
                }))?);
            } else {
                println!("📊 linkdrop status");
                println!("==================");
                match &objects {
                    Ok(count) => {
                        println!("✅ Status: Ready");
                        println!("   Objects: {}", count);
                    }
                    Err(e) => println!("❌ Status: {}", e),
                }
                println!("   Data directory: {:?}", state.config.data_directory);
                println!("   Listen address: {}", state.config.listen_address);
                println!("   Base URL: {}", state.config.link_prefix());
                if state.config.uses_dev_secret() {
                    println!("⚠️  Using the development token secret");
                }
            }
            Ok(())
        }
        Some(Commands::List) => {
            let state = AppState::new(config)?;
            let objects = state.store.list().await?;
            if cli.json {
                let entries: Vec<_> = objects
                    .iter()
                    .map(|o| linkdrop::api::listing::FileEntry::new(o, state.link_for(o)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("📋 Stored objects");
                println!("=================");
                if objects.is_empty() {
                    println!("   No objects found");
                }
                for object in &objects {
                    println!(
                        "   {}  {:>10}  {}  {}",
                        object.id,
                        object.size_bytes,
                        object.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
                        object.original_name
                    );
                    println!("      {}", state.link_for(object));
                }
            }
            Ok(())
        }
        Some(Commands::Link { id }) => {
            let state = AppState::new(config)?;
            match state.store.load(&id).await {
                Some(object) => {
                    let url = state.link_for(&object);
                    if cli.json {
                        println!("{}", serde_json::json!({"id": id, "url": url}));
                    } else {
                        println!("{}", url);
                    }
                    Ok(())
                }
                None => {
                    if cli.json {
                        println!("{}", serde_json::json!({"error": "Object not found"}));
                    } else {
                        eprintln!("❌ Object not found: {}", id);
                    }
                    anyhow::bail!("object {} not found", id)
                }
            }
        }
        Some(Commands::VerifyStore) => {
            let report = StartupValidator::new(&config.data_directory).validate_and_start()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("🔍 Verifying store");
                println!("==================");
                println!("   Objects: {} ({} bytes)", report.objects, report.bytes);
                for id in &report.incomplete {
                    println!("   ⚠️  incomplete: {}", id);
                }
                for id in &report.missing_blobs {
                    println!("   ⚠️  missing blob: {}", id);
                }
                for name in &report.foreign_entries {
                    println!("   ℹ️  ignored entry: {}", name);
                }
                if report.is_clean() {
                    println!("✅ Store verification PASSED");
                } else {
                    println!("❌ Store verification found problems");
                }
            }
            if report.is_clean() {
                Ok(())
            } else {
                anyhow::bail!("store verification found problems")
            }
        }
        Some(Commands::GenerateConfig { .. }) => Ok(()),
        None => {
            info!("Starting linkdrop on {}", config.listen_address);

            StartupValidator::new(&config.data_directory).validate_and_start()?;

            server::run_on(config).await
        }
    }
}

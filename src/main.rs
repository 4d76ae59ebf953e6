//! wristlink
//!
//! Host-side companion for syncing a wrist-worn GPS fitness watch over
//! Bluetooth Low Energy: pairing, preferences, activity recordings, and
//! GPS assistance data.

use std::io::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use wristlink_protocol::{pair, BleTransport, FileId, PairingMode, Session, Transport};
use wristlink_sync::{run_full_sync, SyncSink, Watch};

mod cli;
mod config;

use cli::{Cli, Commands};
use config::Config;

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "wristlink=info",
        1 => "wristlink=debug,wristlink_protocol=debug,wristlink_sync=debug",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// A plain file handle, wrapped locally so [`wristlink_protocol::ByteSink`]
/// (defined in another crate) can be implemented for it.
struct FileHandle(std::fs::File);

#[async_trait::async_trait]
impl wristlink_protocol::ByteSink for FileHandle {
    async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        std::io::Write::write_all(&mut self.0, bytes)
    }
}

struct FileSyncSink {
    out_dir: std::path::PathBuf,
    preferences: FileHandle,
    activity_handle: Option<FileHandle>,
}

impl FileSyncSink {
    fn new(out_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(out_dir)?;
        let preferences = std::fs::File::create(out_dir.join("preferences.xml"))?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            preferences: FileHandle(preferences),
            activity_handle: None,
        })
    }
}

impl SyncSink for FileSyncSink {
    fn preferences_sink(&mut self) -> &mut dyn wristlink_protocol::ByteSink {
        &mut self.preferences
    }

    fn activity_sink(&mut self, id: FileId) -> &mut dyn wristlink_protocol::ByteSink {
        let filetime = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .out_dir
            .join(format!("{:08x}_{}.ttbin", id.value(), filetime));
        let handle = std::fs::File::create(path).expect("activity directory is writable");
        self.activity_handle = Some(FileHandle(handle));
        self.activity_handle.as_mut().unwrap()
    }
}

async fn connect(address: &str) -> anyhow::Result<Session> {
    let transport = BleTransport::discover(address).await?;
    let transport: Arc<dyn Transport> = Arc::new(transport);
    let session = Session::new(transport);
    session.transport().connect().await?;
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    let mut config = Config::load()?;

    match cli.command {
        Commands::Pair => {
            let session = connect(&cli.address).await?;
            print!("Code? ");
            std::io::stdout().flush().ok();
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            let code: u32 = line.trim().parse()?;

            pair(&session, PairingMode::New, code).await?;
            config.remember_device(&cli.address, code);
            config.save()?;
            info!(code, "paired and saved pairing code");
            session.transport().disconnect().await.ok();
        }

        Commands::Connect { code } => {
            let code = resolve_code(&config, &cli.address, code)?;
            let session = connect(&cli.address).await?;
            pair(&session, PairingMode::Existing, code).await?;
            info!("authenticated");
            session.transport().disconnect().await.ok();
        }

        Commands::Sync { code, out_dir, offline } => {
            let code = resolve_code(&config, &cli.address, code)?;
            let session = connect(&cli.address).await?;
            pair(&session, PairingMode::Existing, code).await?;

            if !running.load(Ordering::SeqCst) {
                session.transport().disconnect().await.ok();
                return Ok(());
            }

            let watch = Watch::new(&session);
            let mut sinks = FileSyncSink::new(&out_dir)?;

            #[cfg(feature = "assistance-fetch")]
            let assistance = if offline {
                None
            } else {
                match wristlink_sync::fetch_assistance_data().await {
                    Ok(data) => Some(data),
                    Err(e) => {
                        error!(error = %e, "could not fetch GPS assistance data, continuing without it");
                        None
                    }
                }
            };
            #[cfg(not(feature = "assistance-fetch"))]
            let assistance = {
                let _ = offline;
                None
            };

            let report = run_full_sync(&watch, &mut sinks, assistance.as_deref()).await?;
            info!(
                preferences_len = report.preferences_len,
                activities = report.synced_activities.len(),
                assistance_uploaded = report.assistance_uploaded,
                "sync complete"
            );

            session.transport().disconnect().await.ok();
        }
    }

    Ok(())
}

fn resolve_code(config: &Config, address: &str, explicit: Option<u32>) -> anyhow::Result<u32> {
    if let Some(code) = explicit {
        return Ok(code);
    }
    config
        .find_device(address)
        .map(|d| d.pairing_code)
        .ok_or_else(|| anyhow::anyhow!("no cached pairing code for {address}; run `wristlink {address} pair` first or pass --code"))
}

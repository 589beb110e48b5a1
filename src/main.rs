//! # PNG Batch Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento (o creazione) del file di configurazione
//! - Avvio del batch con Ctrl-C come segnale di interruzione
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, file di config, verbose)
//! 2. Configura il logging su stderr (INFO o DEBUG a seconda del flag verbose)
//! 3. Carica la configurazione, creando il file di default se manca
//! 4. Logga il riepilogo della configurazione
//! 5. Esegue il batch e stampa il report finale
//!
//! ## Esempio di utilizzo:
//! ```bash
//! png-optimizer /path/to/cards --config optimizer.toml --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use png_batch_optimizer::config::DEFAULT_CONFIG_FILE;
use png_batch_optimizer::{BatchOptimizer, ConfigStore, OxipngCodec, RunStatus, Settings};

#[derive(Parser)]
#[command(name = "png-optimizer")]
#[command(about = "Losslessly optimize every PNG in a directory, in parallel")]
struct Args {
    /// Directory containing the PNG files to optimize (not recursive)
    directory: PathBuf,

    /// Configuration file; created with defaults if missing
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for the JSON event stream
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let store = ConfigStore::load(&args.config).await;
    let settings = Settings::from_store(&store);

    let optimizer = BatchOptimizer::new(settings, Arc::new(OxipngCodec::new()));
    if !optimizer.settings().logging.json_output {
        optimizer.log_configuration(&args.config, &args.directory);
    }

    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler: never interrupt
            std::future::pending::<()>().await;
        }
    };

    let stats = optimizer.run_until(&args.directory, interrupted).await;

    match stats.status {
        RunStatus::Completed => info!("✅ All operations completed!"),
        RunStatus::Interrupted => warn!("Run interrupted before all files were processed"),
        RunStatus::NoFiles | RunStatus::CodecUnavailable | RunStatus::Running => {}
    }

    Ok(())
}

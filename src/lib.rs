//! # PNG Batch Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Store di configurazione a sezioni e `Settings` tipizzati
//! - `error`: Tipi di errore custom
//! - `codec`: Confine verso il codec PNG lossless (`oxipng`)
//! - `file_manager`: Discovery dei PNG e dimensioni file
//! - `utils`: Formattazione dimensioni, tempi e statistiche derivate
//! - `optimizer`: Dispatcher, worker per file e progress tracking
//! - `progress`: Progress bar, risultati dei job e `RunAggregate`
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use png_batch_optimizer::{BatchOptimizer, ConfigStore, OxipngCodec, Settings};
//!
//! let store = ConfigStore::load(Path::new("optimizer.toml")).await;
//! let optimizer = BatchOptimizer::new(Settings::from_store(&store), Arc::new(OxipngCodec::new()));
//! let stats = optimizer.run(Path::new("/path/to/cards")).await;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod optimizer;
pub mod progress;
pub mod utils;

pub use codec::{Codec, CodecParams, OxipngCodec};
pub use config::{ConfigStore, Settings};
pub use error::OptimizeError;
pub use optimizer::BatchOptimizer;
pub use progress::{JobOutcome, RunAggregate, RunStatus};

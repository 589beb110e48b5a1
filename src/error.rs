//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare gli errori del batch
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (dimensione file, listing directory)
//! - `CodecUnavailable`: Codec PNG non disponibile, il batch non parte
//! - `Codec`: Il codec ha fallito su un singolo file
//! - `InvalidParameter`: Parametro del codec fuori range (da config malformata)
//! - `Worker`: Un job è andato in panic o il pool non ha potuto eseguirlo
//!
//! Gli errori di configurazione non compaiono qui: vengono sempre risolti
//! sostituendo il valore di default.
//!
//! ## Esempio:
//! ```rust,ignore
//! if !codec_ready {
//!     return Err(OptimizeError::CodecUnavailable("oxipng".to_string()));
//! }
//! ```

/// Custom error types for PNG batch optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec unavailable: {0}")]
    CodecUnavailable(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Invalid codec parameter: {0}")]
    InvalidParameter(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl OptimizeError {
    /// True for failures that belong to a single file and never stop the batch
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Codec(_) | Self::InvalidParameter(_) | Self::Io(_))
    }
}

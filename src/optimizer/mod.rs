//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `batch_optimizer`: Orchestratore principale (discovery, pool, drain)
//! - `task_optimizer`: Worker per singoli file
//! - `progress_tracker`: Gestione progress unificata (barra + JSON)

pub mod batch_optimizer;
pub mod progress_tracker;
pub mod task_optimizer;

pub use batch_optimizer::BatchOptimizer;
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::TaskOptimizer;

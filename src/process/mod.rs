/*!
 * Process Module
 * Launching reaped children
 */

pub mod launcher;
pub mod types;

// Re-export for convenience
pub use launcher::ProcessLauncher;
pub use types::{CommandSpec, Worker, WorkerTask};

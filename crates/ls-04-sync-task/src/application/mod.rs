//! # Application Layer

pub mod handle;
pub mod task;

pub use handle::TickHandle;
pub use task::SyncTask;

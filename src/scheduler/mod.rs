// Public API
pub use reveal_sweep::start_reveal_sweep;
pub use task_scheduler::{TaskPurpose, TaskScheduler};

// Internal modules
mod reveal_sweep;
mod task_scheduler;

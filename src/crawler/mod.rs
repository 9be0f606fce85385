pub mod controller;
pub mod input;
pub mod task;

// Re-export common types
pub use controller::ScrapeController;
pub use input::load_tasks;

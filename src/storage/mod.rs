pub mod debug;
pub mod merge;
pub mod results;

// Re-export common types
pub use debug::FilesystemArtifactStore;
pub use merge::{merge_files, MERGED_FILE};
pub use results::{write_results, RESULTS_FILE};

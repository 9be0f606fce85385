pub mod behavior;
pub mod navigation;
pub mod readiness;
pub mod session;

// Re-export common types
pub use behavior::SettleSequence;
pub use navigation::NavigationController;
pub use session::BrowserSession;

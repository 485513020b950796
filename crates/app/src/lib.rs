// Library exports for the CLI and other consumers

// App state (configuration, paths, identity key)
pub mod state;

// Tracing setup shared by every entry point
pub mod logging;

// Build information captured by build.rs
pub mod version;

pub use state::{AppConfig, AppState, StateError};
pub use version::{build_info, BuildInfo};

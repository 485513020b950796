//! Build information captured at compile time by `build.rs`

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub build_target: &'static str,
    pub rust_version: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        repo_version: option_env!("REPO_VERSION").unwrap_or("unknown"),
        build_profile: option_env!("BUILD_PROFILE").unwrap_or("unknown"),
        build_timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        build_target: option_env!("BUILD_TARGET").unwrap_or("unknown"),
        rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ndn-share {} ({}, {} build for {}, built {} with {})",
            self.version,
            self.repo_version,
            self.build_profile,
            self.build_target,
            self.build_timestamp,
            self.rust_version
        )
    }
}

/// Log the build information once at startup
pub fn report_build_info() {
    let build = build_info();
    tracing::debug!(
        version = build.version,
        repo_version = build.repo_version,
        build_profile = build.build_profile,
        build_target = build.build_target,
        rust_version = build.rust_version,
        "build info"
    );
}

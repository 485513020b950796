use std::env;
use std::process::Command;

/// Trimmed stdout of a successful command
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8(output.stdout).ok())
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// CI ref, then git, then the package version
fn repo_version() -> Option<String> {
    env::var("CI_BUILD_REF")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| command_output("git", &["describe", "--always", "--dirty", "--long", "--tags"]))
        .or_else(|| command_output("git", &["rev-parse", "--short", "HEAD"]))
        .or_else(|| env::var("CARGO_PKG_VERSION").ok())
}

fn main() {
    for path in ["build.rs", ".git/HEAD", ".git/refs/heads"] {
        println!("cargo:rerun-if-changed={}", path);
    }

    let vars = [
        ("REPO_VERSION", repo_version()),
        ("BUILD_PROFILE", env::var("PROFILE").ok()),
        ("BUILD_TIMESTAMP", Some(chrono::Utc::now().to_rfc3339())),
        ("RUST_VERSION", command_output("rustc", &["--version"])),
        ("BUILD_TARGET", env::var("TARGET").ok()),
    ];
    // unset ones fall back to "unknown" in version.rs
    for (name, value) in vars {
        if let Some(value) = value {
            println!("cargo:rustc-env={}={}", name, value);
        }
    }
}

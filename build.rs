//! Build script for the VDOS dashboard
//!
//! Embeds build metadata (git revision, build time, target, rustc) so
//! `vdos-dashboard version` can report exactly which binary is talking to
//! the simulation server.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = command_stdout("git", &["rev-parse", "--short=8", "HEAD"]);
    let git_branch = command_stdout("git", &["rev-parse", "--abbrev-ref", "HEAD"]);
    let git_dirty = git_dirty();

    let build_timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let rustc_version = command_stdout("rustc", &["--version"]);

    let vars = [
        ("VDOS_GIT_HASH", git_hash.as_str()),
        ("VDOS_GIT_BRANCH", git_branch.as_str()),
        ("VDOS_GIT_DIRTY", git_dirty),
        ("VDOS_BUILD_TIMESTAMP", build_timestamp.as_str()),
        ("VDOS_TARGET", target.as_str()),
        ("VDOS_PROFILE", profile.as_str()),
        ("VDOS_RUSTC_VERSION", rustc_version.as_str()),
    ];
    for (key, value) in vars {
        println!("cargo:rustc-env={}={}", key, value);
    }
}

/// Trimmed stdout of a command, or "unknown" if it could not be run
fn command_stdout(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_dirty() -> &'static str {
    match Command::new("git").args(["status", "--porcelain"]).output() {
        Ok(output) if output.status.success() => {
            if output.stdout.is_empty() {
                "false"
            } else {
                "true"
            }
        }
        _ => "unknown",
    }
}

use std::process::Command;

/// Exposes `git describe` as GIT_VERSION for the startup log line.
fn main() {
    for path in [".git/HEAD", ".git/index"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let described = Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|version| !version.is_empty());

    println!(
        "cargo:rustc-env=GIT_VERSION={}",
        described.as_deref().unwrap_or("untracked")
    );
}

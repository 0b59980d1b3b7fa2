//! Build script: version stamp and GPU toolkit pre-flight checks.
//!
//! whisper-rs-sys fails deep inside cmake when a GPU toolkit is missing, so
//! check for it up front and fail with a short message instead.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    let checks: [(&str, bool, &str, &[&str], &str); 3] = [
        (
            "cuda",
            cfg!(feature = "cuda"),
            "nvcc",
            &["--version"],
            "https://developer.nvidia.com/cuda-downloads",
        ),
        (
            "vulkan",
            cfg!(feature = "vulkan"),
            "vulkaninfo",
            &["--summary"],
            "https://vulkan.lunarg.com/",
        ),
        (
            "hipblas",
            cfg!(feature = "hipblas"),
            "rocminfo",
            &[],
            "https://rocm.docs.amd.com/",
        ),
    ];

    for (feature, enabled, tool, args, install_url) in checks {
        if enabled && !tool_runs(tool, args) {
            panic!(
                "feature `{feature}` needs `{tool}` on PATH. Install: {install_url} \
                 or build without --features {feature}"
            );
        }
    }

    if cfg!(feature = "openblas") && !has_openblas() {
        panic!(
            "feature `openblas` needs libopenblas. Install: sudo apt install libopenblas-dev \
             or build without --features openblas"
        );
    }
}

fn tool_runs(tool: &str, args: &[&str]) -> bool {
    Command::new(tool)
        .args(args)
        .output()
        .is_ok_and(|out| out.status.success())
}

fn has_openblas() -> bool {
    let pkg_config_ok = Command::new("pkg-config")
        .args(["--exists", "openblas"])
        .status()
        .is_ok_and(|s| s.success());

    pkg_config_ok
        || [
            "/usr/lib/x86_64-linux-gnu/libopenblas.so",
            "/usr/lib/libopenblas.so",
            "/usr/lib64/libopenblas.so",
        ]
        .iter()
        .any(|p| std::path::Path::new(p).exists())
}

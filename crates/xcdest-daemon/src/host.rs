//! Host machine detection

/// Apple architecture name of the machine we were compiled for
///
/// Returns `None` on architectures Xcode cannot target.
pub fn host_architecture() -> Option<String> {
    apple_arch_name(std::env::consts::ARCH).map(str::to_string)
}

/// Map a Rust target arch to the name `xcodebuild -arch` expects
pub fn apple_arch_name(rust_arch: &str) -> Option<&'static str> {
    match rust_arch {
        "aarch64" => Some("arm64"),
        "x86_64" => Some("x86_64"),
        _ => None,
    }
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let git = |args: &[&str]| {
        std::process::Command::new("git")
            .args(args)
            .output()
            .ok()
            .filter(|o| o.status.success())
    };

    let hash = git(&["rev-parse", "--short", "HEAD"])
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();
    let released = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    // Baked into the feed `<generator>` and the page `generator` meta tag.
    let build_id = match (released, hash.is_empty()) {
        (true, _) => env!("CARGO_PKG_VERSION").to_string(),
        (false, true) => format!("{}-dev", env!("CARGO_PKG_VERSION")),
        (false, false) => format!("{}-dev+{hash}", env!("CARGO_PKG_VERSION")),
    };
    println!("cargo:rustc-env=TREESITE_BUILD_ID={build_id}");
}

//! Build metadata generated by `build.rs`

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

pub fn version() -> &'static str {
    PACKAGE_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// One-line description used by `--version`
pub fn long_version() -> String {
    format!("{} ({}, built {})", PACKAGE_VERSION, GIT_HASH, BUILD_TIME)
}

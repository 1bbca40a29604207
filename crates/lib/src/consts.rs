//! Shared literals for the on-disk deploy layout.

/// Directory under `deploy_to` holding one subdirectory per release.
pub const RELEASES_DIR: &str = "releases";

/// Name of the symlink under `deploy_to` pointing at the active release.
pub const CURRENT_LINK: &str = "current";

/// Directory under `deploy_to` for state shared across releases.
pub const SHARED_DIR: &str = "shared";

/// Side-car file written into a release after a successful deploy.
pub const MANIFEST_FILENAME: &str = "manifest.yaml";

/// Extension assumed for repository coordinates that omit one.
pub const DEFAULT_REPO_EXTENSION: &str = "jar";

/// Releases kept on disk when the request does not say otherwise.
pub const DEFAULT_KEEP: usize = 5;

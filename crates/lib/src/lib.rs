//! ardeploy-lib: core logic for convergent artifact deployment.
//!
//! The deployment workflow retrieves a versioned artifact from an HTTP,
//! repository-indexed, or local source, decides via a content-hash manifest
//! whether anything actually changed, extracts it into a
//! `releases/<version>` tree, flips the `current` symlink, and prunes old
//! releases beyond the retention count.
//!
//! Entry point: [`deploy::execute`] with a [`request::DeployRequest`] and
//! optional [`hooks::LifecycleHooks`].

pub mod consts;
pub mod deploy;
pub mod extract;
pub mod fetch;
pub mod fsops;
pub mod hooks;
pub mod manifest;
pub mod paths;
pub mod request;
pub mod retention;
pub mod source;

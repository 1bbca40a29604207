//! Lifecycle hooks: optional callbacks invoked at named points of the
//! deploy pipeline.
//!
//! An absent hook is a no-op; a hook error aborts the rest of the run.

use tracing::{debug, info};

use crate::deploy::DeployContext;

#[derive(Debug, thiserror::Error)]
#[error("hook '{name}' failed: {message}")]
pub struct HookError {
  pub name: String,
  pub message: String,
}

impl HookError {
  pub fn new(name: &str, message: impl Into<String>) -> Self {
    Self {
      name: name.to_string(),
      message: message.into(),
    }
  }
}

pub type Hook = Box<dyn Fn(&DeployContext) -> Result<(), HookError>>;

/// Extension points of the deploy pipeline, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
  BeforeDeploy,
  BeforeExtract,
  AfterExtract,
  BeforeSymlink,
  AfterSymlink,
  Configure,
  BeforeMigrate,
  Migrate,
  AfterMigrate,
  Restart,
  AfterDeploy,
}

impl HookPoint {
  pub const ALL: [HookPoint; 11] = [
    HookPoint::BeforeDeploy,
    HookPoint::BeforeExtract,
    HookPoint::AfterExtract,
    HookPoint::BeforeSymlink,
    HookPoint::AfterSymlink,
    HookPoint::Configure,
    HookPoint::BeforeMigrate,
    HookPoint::Migrate,
    HookPoint::AfterMigrate,
    HookPoint::Restart,
    HookPoint::AfterDeploy,
  ];

  pub fn name(self) -> &'static str {
    match self {
      HookPoint::BeforeDeploy => "before_deploy",
      HookPoint::BeforeExtract => "before_extract",
      HookPoint::AfterExtract => "after_extract",
      HookPoint::BeforeSymlink => "before_symlink",
      HookPoint::AfterSymlink => "after_symlink",
      HookPoint::Configure => "configure",
      HookPoint::BeforeMigrate => "before_migrate",
      HookPoint::Migrate => "migrate",
      HookPoint::AfterMigrate => "after_migrate",
      HookPoint::Restart => "restart",
      HookPoint::AfterDeploy => "after_deploy",
    }
  }
}

/// Named extension points, mirroring the deploy pipeline order.
#[derive(Default)]
pub struct LifecycleHooks {
  pub before_deploy: Option<Hook>,
  pub before_extract: Option<Hook>,
  pub after_extract: Option<Hook>,
  pub before_symlink: Option<Hook>,
  pub after_symlink: Option<Hook>,
  pub configure: Option<Hook>,
  pub before_migrate: Option<Hook>,
  pub migrate: Option<Hook>,
  pub after_migrate: Option<Hook>,
  pub restart: Option<Hook>,
  pub after_deploy: Option<Hook>,
}

impl LifecycleHooks {
  fn get(&self, point: HookPoint) -> &Option<Hook> {
    match point {
      HookPoint::BeforeDeploy => &self.before_deploy,
      HookPoint::BeforeExtract => &self.before_extract,
      HookPoint::AfterExtract => &self.after_extract,
      HookPoint::BeforeSymlink => &self.before_symlink,
      HookPoint::AfterSymlink => &self.after_symlink,
      HookPoint::Configure => &self.configure,
      HookPoint::BeforeMigrate => &self.before_migrate,
      HookPoint::Migrate => &self.migrate,
      HookPoint::AfterMigrate => &self.after_migrate,
      HookPoint::Restart => &self.restart,
      HookPoint::AfterDeploy => &self.after_deploy,
    }
  }

  /// Run one extension point's hook if registered.
  pub fn run(&self, point: HookPoint, context: &DeployContext) -> Result<(), HookError> {
    match self.get(point) {
      Some(callback) => {
        info!(hook = point.name(), "running lifecycle hook");
        callback(context)
      }
      None => {
        debug!(hook = point.name(), "hook not registered, skipping");
        Ok(())
      }
    }
  }
}

impl std::fmt::Debug for LifecycleHooks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let registered: Vec<&str> = HookPoint::ALL
      .iter()
      .filter(|point| self.get(**point).is_some())
      .map(|point| point.name())
      .collect();

    f.debug_struct("LifecycleHooks").field("registered", &registered).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hook_point_names_follow_pipeline_order() {
    let names: Vec<&str> = HookPoint::ALL.iter().map(|p| p.name()).collect();
    assert_eq!(
      names,
      vec![
        "before_deploy",
        "before_extract",
        "after_extract",
        "before_symlink",
        "after_symlink",
        "configure",
        "before_migrate",
        "migrate",
        "after_migrate",
        "restart",
        "after_deploy"
      ]
    );
  }

  #[test]
  fn debug_lists_only_registered_hooks() {
    let hooks = LifecycleHooks {
      restart: Some(Box::new(|_| Ok(()))),
      ..Default::default()
    };

    let rendered = format!("{hooks:?}");
    assert!(rendered.contains("restart"));
    assert!(!rendered.contains("before_deploy"));
  }
}

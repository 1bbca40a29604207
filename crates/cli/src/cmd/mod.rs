mod deploy;
mod preseed;
mod prune;
mod status;

pub use deploy::cmd_deploy;
pub use preseed::cmd_preseed;
pub use prune::cmd_prune;
pub use status::cmd_status;

mod batch_error;
mod config_error;
mod publish_error;
mod runner_error;
mod subject_error;

pub use batch_error::BatchError;
pub use config_error::ConfigError;
pub use publish_error::PublishError;
pub use runner_error::RunnerError;
pub use subject_error::SubjectError;

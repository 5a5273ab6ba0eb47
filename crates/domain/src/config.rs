mod errors;
mod log;
mod root;

pub use errors::ConfigError;
pub use log::{KafkaConfig, LogConfig, SinkKind};
pub use root::{CliOverrides, Config, DomainRedirect, DomainResolver};

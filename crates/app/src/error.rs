//! Application error type

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Net(#[from] colloquy_net::Error),

    #[error("Terminal IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("No username given; pass --username or set [user] username in the config")]
    MissingUsername,
}

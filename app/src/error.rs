use std::io;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid time zone {name:?}: {reason}")]
    TimeZone { name: String, reason: String },

    #[error("start termux-sensor: {0}")]
    SensorSpawn(#[source] io::Error),

    #[error("kill termux-sensor: {0}")]
    SensorKill(#[source] io::Error),

    #[error("termux-sensor -c: {0}")]
    SensorCleanup(#[source] io::Error),

    #[error("termux-sensor -c exited with {0}")]
    SensorCleanupStatus(ExitStatus),

    #[error("malformed sensor block: {0}")]
    Parse(String),

    #[error("exec termux-torch: {0}")]
    Torch(#[source] io::Error),

    #[error("termux-torch exited with {0}")]
    TorchStatus(ExitStatus),

    #[error("HTTP GET Telegram API sendMessage: max tries reached: {0}")]
    TelegramTransport(String),

    #[error("HTTP GET Telegram API sendMessage: HTTP error response code {0}")]
    TelegramStatus(u16),
}

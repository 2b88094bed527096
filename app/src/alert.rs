use std::thread;
use std::time::Duration;

use log::warn;

use crate::config::{self, Messages};
use crate::error::{Error, Result};

const API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Alert {
    DoorUsed,
    /// Open for a whole blocked-threshold worth of ticks.
    DoorBlocked,
}

impl Alert {
    pub fn message<'a>(&self, messages: &'a Messages) -> &'a str {
        match self {
            Alert::DoorUsed => &messages.door_used,
            Alert::DoorBlocked => &messages.door_blocked,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn send(&self, message: &str, silent: bool) -> Result<()>;
}

#[derive(Copy, Clone, Debug)]
pub struct Backoff {
    pub max_tries: u32,
    pub base: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            max_tries: 5,
            base: Duration::from_secs(2),
        }
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum Failure {
    /// Worth trying again, e.g. the connection could not be made.
    Transient(String),
    Terminal(Error),
}

/// Runs `attempt` until it succeeds, fails terminally, or `max_tries` is
/// reached. The delay starts at `base` and doubles after each retry.
pub fn with_backoff<F>(backoff: Backoff, mut attempt: F) -> Result<()>
where
    F: FnMut() -> std::result::Result<(), Failure>,
{
    let mut tries = 0;
    let mut delay = backoff.base;
    loop {
        tries += 1;
        match attempt() {
            Ok(()) => return Ok(()),
            Err(Failure::Terminal(err)) => return Err(err),
            Err(Failure::Transient(reason)) if tries >= backoff.max_tries => {
                return Err(Error::TelegramTransport(reason))
            }
            Err(Failure::Transient(reason)) => {
                warn!("Could not HTTP GET Telegram API, retrying in {:?}: {}", delay, reason);
                thread::sleep(delay);
                delay *= 2;
            }
        }
    }
}

/// Sends messages to a chat through the Telegram Bot API.
pub struct Telegram {
    agent: ureq::Agent,
    url: String,
    chat_id: String,
    backoff: Backoff,
}

impl Telegram {
    pub fn new(config: &config::Telegram) -> Self {
        Telegram {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            url: format!("{}/bot{}/sendMessage", API_URL, config.bot_token),
            chat_id: config.chat_id.clone(),
            backoff: Backoff::default(),
        }
    }
}

impl Notifier for Telegram {
    fn send(&self, message: &str, silent: bool) -> Result<()> {
        let silent = if silent { "true" } else { "false" };
        with_backoff(self.backoff, || {
            let response = self
                .agent
                .get(&self.url)
                .query("chat_id", &self.chat_id)
                .query("text", message)
                .query("parse_mode", "MarkdownV2")
                .query("disable_notification", silent)
                .call();
            match response {
                Ok(_) => Ok(()),
                Err(ureq::Error::Status(code, _)) => {
                    Err(Failure::Terminal(Error::TelegramStatus(code)))
                }
                Err(ureq::Error::Transport(transport)) => {
                    Err(Failure::Transient(transport.to_string()))
                }
            }
        })
    }
}

use std::env;
use std::time::Duration;

use crate::door_state::Calibration;
use crate::torch::TorchWindow;

/// Axis (0-2: [x, y, z]) used to decide whether the dog door is open.
pub const MAGNETOMETER_AXIS: usize = 1;

/// Expected field strength on `MAGNETOMETER_AXIS` while the door is closed.
pub const DOOR_CLOSED_FIELD_STRENGTH: f64 = -270.0;

/// Readings within this distance of `DOOR_CLOSED_FIELD_STRENGTH` count as closed.
pub const DOOR_CLOSED_FIELD_RANGE: f64 = 70.0;

pub const CHECK_INTERVAL: Duration = Duration::from_millis(3500);

/// Time given to put the phone back in place after starting.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

pub const TORCH_FEAT_ENABLED: bool = true;

/// IANA Time Zone database name for the local time zone.
pub const TIMEZONE: &str = "Australia/Melbourne";

// 0 <= hour <= 23. The window wraps past midnight when min > max.
pub const TORCH_HOUR_MIN: u32 = 18;
pub const TORCH_HOUR_MAX: u32 = 6;

pub const DOG_NAME_POSSESSIVE: &str = "Puppy's";

/// The light is switched off after this many ticks whatever the door is doing.
pub const LIGHT_MAX_TICKS: u32 = 7;

/// Once the door has closed, the light goes off after this many ticks.
pub const LIGHT_CLOSED_TICKS: u32 = 4;

/// Ticks of a single open-run before the door is reported as blocked.
pub const BLOCKED_TICKS: u32 = 14;

const TG_KEY_VAR: &str = "DETECTOR_TG_KEY";
const TG_CHAT_VAR: &str = "DETECTOR_TG_CHAT";
const MSG_PREFIX_VAR: &str = "DETECTOR_MSG_PREFIX";

#[derive(Clone, Debug, PartialEq)]
pub struct Messages {
    pub door_used: String,
    pub door_blocked: String,
}

impl Messages {
    /// Builds the MarkdownV2 message texts. `prefix` is joined with a single space.
    pub fn new(prefix: &str) -> Self {
        let prefix = format!("{} {}", prefix, DOG_NAME_POSSESSIVE);
        Messages {
            door_used: format!("{} dog door was used\\!", prefix),
            door_blocked: format!(
                "{} dog door has been open for over 45 seconds\\. \
                 It may be blocked or the detector may have malfunctioned\\.",
                prefix
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Telegram {
    pub bot_token: String,
    /// Negative for groups, and changes if the group is upgraded to a supergroup.
    pub chat_id: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub calibration: Calibration,
    pub check_interval: Duration,
    pub settle_delay: Duration,
    pub torch: TorchWindow,
    pub timezone: &'static str,
    pub messages: Messages,
    pub telegram: Telegram,
}

impl Config {
    /// The build-time constants plus credentials taken from the environment.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();
        Config {
            calibration: Calibration {
                axis: MAGNETOMETER_AXIS,
                closed_value: DOOR_CLOSED_FIELD_STRENGTH,
                range: DOOR_CLOSED_FIELD_RANGE,
            },
            check_interval: CHECK_INTERVAL,
            settle_delay: SETTLE_DELAY,
            torch: TorchWindow {
                enabled: TORCH_FEAT_ENABLED,
                hour_min: TORCH_HOUR_MIN,
                hour_max: TORCH_HOUR_MAX,
            },
            timezone: TIMEZONE,
            messages: Messages::new(&var(MSG_PREFIX_VAR)),
            telegram: Telegram {
                bot_token: var(TG_KEY_VAR),
                chat_id: var(TG_CHAT_VAR),
            },
        }
    }
}

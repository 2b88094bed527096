use chrono::{Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Local hours `[hour_min, hour_max)` in which the torch may be used.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TorchWindow {
    pub enabled: bool,
    pub hour_min: u32,
    pub hour_max: u32,
}

impl TorchWindow {
    pub fn allows(&self, hour: u32) -> bool {
        use_torch(self.enabled, self.hour_min, self.hour_max, hour)
    }
}

/// Whether the torch should be used at `hour` (local, 0-23). When
/// `hour_max <= hour_min` the window wraps past midnight.
pub fn use_torch(enabled: bool, hour_min: u32, hour_max: u32, hour: u32) -> bool {
    if !enabled {
        return false;
    }
    if hour_max > hour_min {
        hour >= hour_min && hour < hour_max
    } else {
        hour < hour_max || hour >= hour_min
    }
}

/// Source of the current wall clock hour in the local zone.
pub trait Clock {
    fn hour(&self) -> u32;
}

impl Clock for Tz {
    fn hour(&self) -> u32 {
        Utc::now().with_timezone(self).hour()
    }
}

pub fn load_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|err| Error::TimeZone {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

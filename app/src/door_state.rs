use std::fmt;

use crate::sensor::Reading;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DoorState {
    Open,
    Closed,
}

impl From<bool> for DoorState {
    fn from(open: bool) -> Self {
        if open {
            DoorState::Open
        } else {
            DoorState::Closed
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorState::Open => f.write_str("Open"),
            DoorState::Closed => f.write_str("Closed"),
        }
    }
}

/// Where the magnet sits relative to the sensor when the door is shut.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Calibration {
    /// 0-2: [x, y, z]
    pub axis: usize,
    pub closed_value: f64,
    pub range: f64,
}

impl Calibration {
    /// Closed only while the monitored axis is strictly inside the range, so a
    /// reading exactly on the boundary is open.
    pub fn evaluate(&self, reading: &Reading) -> DoorState {
        let value = reading.0[self.axis];
        let closed = (value - self.closed_value).abs() < self.range;
        DoorState::from(!closed)
    }
}

//! Per-tick decision logic.
//!
//! The controller owns the open and light counters and turns each reading
//! into a list of [`Effect`]s. It performs no I/O itself; the control loop
//! dispatches the effects.

use log::info;

use crate::alert::Alert;
use crate::config::{BLOCKED_TICKS, LIGHT_CLOSED_TICKS, LIGHT_MAX_TICKS};
use crate::door_state::DoorState;
use crate::sensor::Reading;
use crate::torch::TorchWindow;

/// A side effect requested by a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// First reading of the process has arrived.
    Ready,
    Notify(Alert),
    SetLight(bool),
}

pub struct Controller {
    torch: TorchWindow,
    open_count: u32,
    /// Ticks since the light was switched on, `None` while it is off.
    light_count: Option<u32>,
    has_received_data: bool,
}

impl Controller {
    pub fn new(torch: TorchWindow) -> Self {
        Controller {
            torch,
            open_count: 0,
            light_count: None,
            has_received_data: false,
        }
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }

    pub fn light_count(&self) -> Option<u32> {
        self.light_count
    }

    pub fn on_tick(&mut self, reading: &Reading, door: DoorState, hour: u32) -> Vec<Effect> {
        let mut effects = Vec::new();

        if !self.has_received_data {
            self.has_received_data = true;
            effects.push(Effect::Ready);
        }

        if let Some(count) = self.light_count.as_mut() {
            *count += 1;
            if *count >= LIGHT_MAX_TICKS {
                self.light_count = None;
                effects.push(Effect::SetLight(false));
            }
        }

        match door {
            DoorState::Closed => {
                self.open_count = 0;
                if self.light_count.map_or(false, |count| count >= LIGHT_CLOSED_TICKS) {
                    self.light_count = None;
                    effects.push(Effect::SetLight(false));
                }
            }
            DoorState::Open => {
                self.open_count += 1;
                info!(
                    "  OPEN: [{}, {}] {}",
                    self.open_count,
                    self.light_count.map_or(-1, i64::from),
                    reading
                );

                if self.open_count == 1 {
                    effects.push(Effect::Notify(Alert::DoorUsed));
                    if self.torch.allows(hour) {
                        self.light_count = Some(0);
                        effects.push(Effect::SetLight(true));
                    }
                }
                if self.open_count == BLOCKED_TICKS {
                    effects.push(Effect::Notify(Alert::DoorBlocked));
                }
            }
        }

        effects
    }
}

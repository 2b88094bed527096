//! Recording stand-ins for the sensor, notifier, light and clock.

use std::cell::Cell;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use dog_door_detector::alert::Notifier;
use dog_door_detector::light::Light;
use dog_door_detector::sensor::SensorFeed;
use dog_door_detector::torch::Clock;
use dog_door_detector::{Error, Result};

pub const CLOSED: f64 = -270.0;
pub const OPEN: f64 = -100.0;

pub fn block(y: f64) -> String {
    format!("{{\"AK8963 Magnetometer\": {{\"values\": [10.5, {}, -40.25]}}}}", y)
}

#[derive(Default)]
pub struct MockFeed {
    pub blocks: Vec<String>,
    pub fail_start: bool,
    pub fail_cleanup: bool,
    pub starts: usize,
    pub stops: usize,
    pub cleanups: usize,
}

impl MockFeed {
    pub fn with(values: &[f64]) -> Self {
        MockFeed {
            blocks: values.iter().map(|&y| block(y)).collect(),
            ..MockFeed::default()
        }
    }
}

impl SensorFeed for MockFeed {
    fn start(&mut self, _interval: Duration, _term: Arc<AtomicBool>) -> Result<Receiver<String>> {
        self.starts += 1;
        if self.fail_start {
            return Err(Error::SensorSpawn(io::ErrorKind::NotFound.into()));
        }
        let (tx, rx) = mpsc::channel();
        for block in self.blocks.drain(..) {
            tx.send(block).unwrap();
        }
        Ok(rx)
    }

    fn stop(&mut self) -> Result<()> {
        self.stops += 1;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.cleanups += 1;
        if self.fail_cleanup {
            return Err(Error::SensorCleanup(io::Error::new(io::ErrorKind::Other, "detach failed")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    /// How long each send takes.
    pub delay: Duration,
    pub sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &str, _silent: bool) -> Result<()> {
        self.sent.lock().unwrap().push(message.to_string());
        thread::sleep(self.delay);
        if self.fail {
            return Err(Error::TelegramStatus(500));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingLight {
    pub calls: Arc<Mutex<Vec<(bool, Instant)>>>,
    pub fail_on: bool,
    pub fail_off: bool,
    pub panic_on: bool,
}

impl RecordingLight {
    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().unwrap().iter().map(|&(on, _)| on).collect()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|&(_, at)| at).collect()
    }
}

impl Light for RecordingLight {
    fn set_state(&mut self, on: bool) -> Result<()> {
        self.calls.lock().unwrap().push((on, Instant::now()));
        if on && self.panic_on {
            panic!("torch driver crashed");
        }
        if (on && self.fail_on) || (!on && self.fail_off) {
            return Err(Error::Torch(io::Error::new(io::ErrorKind::Other, "no flash")));
        }
        Ok(())
    }
}

/// Reports a fixed hour and optionally raises `term` after a number of ticks.
pub struct TestClock {
    pub hour: u32,
    pub stop_after: Option<usize>,
    pub term: Arc<AtomicBool>,
    pub calls: Cell<usize>,
}

impl TestClock {
    pub fn new(hour: u32, term: &Arc<AtomicBool>) -> Self {
        TestClock {
            hour,
            stop_after: None,
            term: Arc::clone(term),
            calls: Cell::new(0),
        }
    }
}

impl Clock for TestClock {
    fn hour(&self) -> u32 {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        if self.stop_after == Some(calls) {
            self.term.store(true, Ordering::SeqCst);
        }
        self.hour
    }
}

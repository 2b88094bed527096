//! Magnetometer readings from `termux-sensor`.
//!
//! `termux-sensor` has no clean shutdown, so the feed kills it on stop and a
//! separate `termux-sensor -c` releases the sensor afterwards.

use std::fmt;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use json::JsonValue;
use log::{debug, error, info};

use crate::error::{Error, Result};

const BLOCK_BUFFER: usize = 2;

/// Field strength on each axis, i.e. [x, y, z].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reading(pub [f64; 3]);

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.0[0], self.0[1], self.0[2])
    }
}

/// Parses one JSON block of the form `{"<sensor>": {"values": [x, y, z]}}`.
pub fn parse_block(block: &str) -> Result<Reading> {
    let value = json::parse(block).map_err(|err| Error::Parse(err.to_string()))?;
    let (name, sensor) = value
        .entries()
        .next()
        .ok_or_else(|| Error::Parse(format!("no sensor in {:?}", block)))?;
    let values = sensor
        .entries()
        .find(|(key, _)| key.eq_ignore_ascii_case("values"))
        .map(|(_, values)| values)
        .ok_or_else(|| Error::Parse(format!("no values for {}", name)))?;

    let mut axes = values.members().map(JsonValue::as_f64);
    let mut reading = [0.0; 3];
    for (axis, slot) in reading.iter_mut().enumerate() {
        *slot = axes.next().flatten().ok_or_else(|| {
            Error::Parse(format!("{} axis {} missing or not a number", name, axis))
        })?;
    }
    Ok(Reading(reading))
}

/// Joins the pretty printed output of `termux-sensor` back into whole objects.
#[derive(Default)]
pub struct BlockAssembler {
    buffer: String,
    depth: usize,
    opened: bool,
}

impl BlockAssembler {
    pub fn push(&mut self, line: &str) -> Option<String> {
        if self.buffer.is_empty() && line.trim().is_empty() {
            return None;
        }
        for c in line.chars() {
            match c {
                '{' => {
                    self.depth += 1;
                    self.opened = true;
                }
                '}' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
        }
        self.buffer.push_str(line);

        if self.opened && self.depth == 0 {
            self.opened = false;
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }
}

pub trait SensorFeed {
    /// Starts sampling every `interval`. The returned stream ends once `term`
    /// is observed or the source exits. Drop it before calling [`stop`].
    ///
    /// [`stop`]: SensorFeed::stop
    fn start(&mut self, interval: Duration, term: Arc<AtomicBool>) -> Result<Receiver<String>>;

    /// Forcibly terminates the source. Safe to call more than once.
    fn stop(&mut self) -> Result<()>;

    /// Releases the sensor. Usable after `stop`.
    fn cleanup(&mut self) -> Result<()>;
}

#[derive(Default)]
pub struct TermuxSensor {
    child: Arc<Mutex<Option<Child>>>,
    reader: Option<JoinHandle<()>>,
}

impl TermuxSensor {
    pub fn new() -> Self {
        TermuxSensor::default()
    }
}

impl SensorFeed for TermuxSensor {
    fn start(&mut self, interval: Duration, term: Arc<AtomicBool>) -> Result<Receiver<String>> {
        let mut child = Command::new("termux-sensor")
            .args(&["-s", "magnet", "-d"])
            .arg(interval.as_millis().to_string())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(Error::SensorSpawn)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::SensorSpawn(std::io::ErrorKind::BrokenPipe.into()))?;
        *self.child.lock().unwrap_or_else(PoisonError::into_inner) = Some(child);

        let (tx, rx) = mpsc::sync_channel(BLOCK_BUFFER);
        let child = Arc::clone(&self.child);
        self.reader = Some(thread::spawn(move || {
            stream_blocks(stdout, tx, &term, &child);
            debug!("sensor reader exiting");
        }));
        Ok(rx)
    }

    fn stop(&mut self) -> Result<()> {
        kill(&self.child)?;
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        info!("Cleaning up sensors...");
        let status = Command::new("termux-sensor")
            .arg("-c")
            .status()
            .map_err(Error::SensorCleanup)?;
        if !status.success() {
            return Err(Error::SensorCleanupStatus(status));
        }
        Ok(())
    }
}

fn stream_blocks(
    stdout: ChildStdout,
    tx: SyncSender<String>,
    term: &AtomicBool,
    child: &Mutex<Option<Child>>,
) {
    let mut assembler = BlockAssembler::default();
    for line in BufReader::new(stdout).lines() {
        if term.load(Ordering::Relaxed) {
            if let Err(err) = kill(child) {
                error!("{}", err);
            }
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("read termux-sensor output: {}", err);
                break;
            }
        };
        if let Some(block) = assembler.push(&line) {
            debug!("sensor block: {}", block);
            if tx.send(block).is_err() {
                break;
            }
        }
    }
}

fn kill(child: &Mutex<Option<Child>>) -> Result<()> {
    let mut guard = child.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(mut child) = guard.take() {
        child.kill().map_err(Error::SensorKill)?;
        // Reap it so no zombie is left behind.
        let _ = child.wait();
    }
    Ok(())
}

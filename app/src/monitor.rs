//! The polling loop and its shutdown sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::alert::Notifier;
use crate::config::{Config, Messages};
use crate::controller::{Controller, Effect};
use crate::error::{Error, Result};
use crate::light::Light;
use crate::sensor::{parse_block, SensorFeed};
use crate::torch::Clock;

/// How often the loop checks for a stop request while waiting on the sensor.
const STOP_POLL: Duration = Duration::from_millis(250);

/// Runs until `term` is set or the feed ends, then turns the light off and
/// releases the sensor. A failure of either final step is returned even when
/// the loop itself ended cleanly. Notifications still being sent are only
/// waited for once the light is off and the sensor released.
pub fn run<F, L, C>(
    config: &Config,
    feed: &mut F,
    notifier: Arc<dyn Notifier>,
    light: L,
    clock: &C,
    term: &Arc<AtomicBool>,
) -> Result<()>
where
    F: SensorFeed,
    L: Light + Clone + 'static,
    C: Clock,
{
    info!("Waiting {:?} to allow time for positioning...", config.settle_delay);
    thread::sleep(config.settle_delay);
    info!("Starting");

    let blocks = feed.start(config.check_interval, Arc::clone(term))?;
    let mut dispatcher = Dispatcher::new(&config.messages, notifier, light);
    let mut controller = Controller::new(config.torch);

    let result = poll(config, blocks, &mut controller, &mut dispatcher, clock, term);

    info!("Stopping sensor");
    let stopped = feed.stop().map_err(log_err);
    let (mut light, notifications) = dispatcher.finish();
    info!("Turning torch off");
    let light_off = light.set_state(false).map_err(log_err);
    let cleanup = feed.cleanup().map_err(log_err);

    if !notifications.is_empty() {
        info!("Waiting for {} notification(s) to finish", notifications.len());
    }
    for handle in notifications {
        let _ = handle.join();
    }

    result.and(stopped).and(light_off).and(cleanup)
}

fn poll<C: Clock>(
    config: &Config,
    blocks: Receiver<String>,
    controller: &mut Controller,
    dispatcher: &mut Dispatcher<'_>,
    clock: &C,
    term: &AtomicBool,
) -> Result<()> {
    while !term.load(Ordering::Relaxed) {
        let block = match blocks.recv_timeout(STOP_POLL) {
            Ok(block) => block,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("Sensor stream ended");
                return Ok(());
            }
        };
        // A block that arrives after the stop request is dropped unprocessed.
        if term.load(Ordering::Relaxed) {
            break;
        }

        let reading = parse_block(&block)?;
        let door = config.calibration.evaluate(&reading);
        debug!("{}: {}", door, reading);
        for effect in controller.on_tick(&reading, door, clock.hour()) {
            dispatcher.dispatch(effect);
        }
    }
    info!("Stop requested");
    Ok(())
}

fn log_err(err: Error) -> Error {
    error!("{}", err);
    err
}

/// Carries out effects without holding up the loop.
///
/// Notifications each get their own thread. Light changes go through a
/// single worker so requests for the one torch are applied in tick order.
struct Dispatcher<'a> {
    messages: &'a Messages,
    notifier: Arc<dyn Notifier>,
    notifications: Vec<JoinHandle<()>>,
    light_tx: Sender<bool>,
    light_worker: JoinHandle<Box<dyn Light>>,
    /// Stands in for the light if the worker dies with it.
    spare_light: Box<dyn Light>,
}

impl<'a> Dispatcher<'a> {
    fn new<L>(messages: &'a Messages, notifier: Arc<dyn Notifier>, light: L) -> Self
    where
        L: Light + Clone + 'static,
    {
        let spare_light = Box::new(light.clone());
        let (light_tx, light_rx) = mpsc::channel();
        let light_worker = thread::spawn(move || drive_light(Box::new(light), light_rx));
        Dispatcher {
            messages,
            notifier,
            notifications: Vec::new(),
            light_tx,
            light_worker,
            spare_light,
        }
    }

    fn dispatch(&mut self, effect: Effect) {
        match effect {
            Effect::Ready => info!("Ready"),
            Effect::Notify(alert) => {
                let notifier = Arc::clone(&self.notifier);
                let message = alert.message(self.messages).to_string();
                self.notifications.retain(|handle| !handle.is_finished());
                self.notifications.push(thread::spawn(move || {
                    if let Err(err) = notifier.send(&message, false) {
                        error!("send telegram message: {}", err);
                    }
                }));
            }
            Effect::SetLight(on) => {
                if self.light_tx.send(on).is_err() {
                    error!("light worker has gone away");
                }
            }
        }
    }

    /// Stops the light worker once it has applied every queued request and
    /// hands back the light, along with the notifications still in flight.
    fn finish(self) -> (Box<dyn Light>, Vec<JoinHandle<()>>) {
        let Dispatcher {
            notifications,
            light_tx,
            light_worker,
            spare_light,
            ..
        } = self;
        drop(light_tx);
        let light = light_worker.join().unwrap_or_else(|_| {
            error!("light worker panicked, switching off through a fresh handle");
            spare_light
        });
        (light, notifications)
    }
}

fn drive_light(mut light: Box<dyn Light>, requests: Receiver<bool>) -> Box<dyn Light> {
    for on in requests {
        if let Err(err) = light.set_state(on) {
            let action = if on { "on" } else { "off" };
            error!("turn {} torch: {}", action, err);
        }
    }
    light
}

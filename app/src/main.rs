use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::{env, process, thread};

use log::{error, info, LevelFilter};
use signal_hook::consts::{SIGINT, SIGTERM};
use syslog::Facility;

use dog_door_detector::alert::Telegram;
use dog_door_detector::config::Config;
use dog_door_detector::light::TermuxTorch;
use dog_door_detector::sensor::TermuxSensor;
use dog_door_detector::{monitor, term_on_err, torch};

const SYSLOG_VAR: &str = "DETECTOR_SYSLOG";
const PROCESS_NAME: &str = "dog-door-detector";

fn main() {
    init_logging();
    info!("Dog Door Detector version {} - starting", env!("CARGO_PKG_VERSION"));
    info!("Press Ctrl+D to exit");

    let config = Config::from_env();
    let tz = match torch::load_timezone(config.timezone) {
        Ok(tz) => tz,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    let term = Arc::new(AtomicBool::new(false));
    for &signal in &[SIGINT, SIGTERM] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&term)) {
            error!("Unable to register signal {}: {}", signal, err);
            process::exit(1);
        }
    }
    watch_stdin(Arc::clone(&term));

    let notifier = Arc::new(Telegram::new(&config.telegram));
    let mut sensor = TermuxSensor::new();
    match monitor::run(&config, &mut sensor, notifier, TermuxTorch, &tz, &term) {
        Ok(()) => info!("Process completed"),
        Err(err) => {
            error!("Exiting after error: {}", err);
            process::exit(1);
        }
    }
}

fn init_logging() {
    if env::var_os(SYSLOG_VAR).is_some() {
        match syslog::init(Facility::LOG_DAEMON, LevelFilter::Info, Some(PROCESS_NAME)) {
            Ok(()) => return,
            Err(err) => eprintln!("Unable to connect to syslog, logging to stderr: {}", err),
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Requests termination once stdin reaches end of input.
fn watch_stdin(term: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let _ = term_on_err!(line, &term);
        }
        info!("EOF received, process ending");
        term.store(true, Ordering::SeqCst);
    });
}

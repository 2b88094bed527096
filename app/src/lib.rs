pub mod alert;
pub mod config;
pub mod controller;
mod door_state;
pub mod error;
pub mod light;
pub mod monitor;
pub mod sensor;
pub mod torch;

pub use door_state::{Calibration, DoorState};
pub use error::{Error, Result};

/// Unwraps `$expr`, or logs the error, requests termination and breaks out of
/// the enclosing loop.
#[macro_export]
macro_rules! term_on_err {
    ($expr:expr, $term:expr) => {
        match $expr {
            std::result::Result::Ok(val) => val,
            std::result::Result::Err(err) => {
                ::log::error!("setting term due to error: {}", err);
                $term.store(true, std::sync::atomic::Ordering::SeqCst);
                break;
            }
        }
    };
}

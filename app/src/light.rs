use std::process::Command;

use crate::error::{Error, Result};

pub trait Light: Send {
    /// Switches the light on or off. Repeating a state is harmless.
    fn set_state(&mut self, on: bool) -> Result<()>;
}

/// The phone's camera flash, driven through `termux-torch`.
#[derive(Clone, Default)]
pub struct TermuxTorch;

impl Light for TermuxTorch {
    fn set_state(&mut self, on: bool) -> Result<()> {
        let arg = if on { "on" } else { "off" };
        let status = Command::new("termux-torch")
            .arg(arg)
            .status()
            .map_err(Error::Torch)?;
        if !status.success() {
            return Err(Error::TorchStatus(status));
        }
        Ok(())
    }
}

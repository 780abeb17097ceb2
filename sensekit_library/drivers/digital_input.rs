//! Generic digital input (button, reed switch, PIR output...)

use sensekit_core::driver::DriverStatus;
use sensekit_core::error::{SenseError, SenseResult};

use crate::hal::{GpioHandle, Hal};
use crate::resources::Resources;

/// Digital input driver
#[derive(Debug)]
pub struct DigitalInput {
    gpio: GpioHandle,
    status: DriverStatus,
    /// Invert logic
    inverted: bool,
}

impl DigitalInput {
    /// Create from an init string; the first gpio clause is the input pin
    pub fn new(init: &str, hal: &Hal) -> SenseResult<Self> {
        let mut resources = Resources::from_init(hal, init)?;
        Ok(Self {
            gpio: resources.take_gpio(0)?,
            status: DriverStatus::Uninitialized,
            inverted: false,
        })
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn pin(&self) -> u32 {
        self.gpio.pin()
    }

    pub fn init(&mut self) -> SenseResult<()> {
        self.status = DriverStatus::Ready;
        Ok(())
    }

    pub fn shutdown(&mut self) -> SenseResult<()> {
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        true
    }

    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    pub fn read(&mut self) -> SenseResult<bool> {
        if !self.status.is_operational() {
            return Err(SenseError::driver("Driver not initialized"));
        }
        self.status = DriverStatus::Running;

        let value = self.gpio.read()?;
        Ok(if self.inverted { !value } else { value })
    }
}

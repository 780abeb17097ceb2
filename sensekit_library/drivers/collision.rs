//! Collision sensor
//!
//! A bumper switch on one GPIO input. The sensor holds the line high and
//! pulls it to 0 while a collision is detected.

use sensekit_core::driver::DriverStatus;
use sensekit_core::error::{SenseError, SenseResult};
use sensekit_core::init_string::{Descriptor, Direction, ParseResult};

use crate::hal::{GpioHandle, Hal};
use crate::resources::Resources;

/// Collision sensor driver
#[derive(Debug)]
pub struct CollisionSensor {
    gpio: GpioHandle,
    status: DriverStatus,
}

impl CollisionSensor {
    /// Create from an init string; the first gpio clause is the sensor pin
    pub fn new(init: &str, hal: &Hal) -> SenseResult<Self> {
        let mut resources = Resources::from_init(hal, init)?;
        let gpio = resources.take_gpio(0).map_err(|_| {
            SenseError::invalid_pin(format!(
                "collision sensor needs a gpio clause, got '{}'",
                init
            ))
        })?;
        Self::from_handle(gpio)
    }

    /// Create on a plain pin number
    pub fn on_pin(pin: u32, hal: &Hal) -> SenseResult<Self> {
        let descriptors = ParseResult::new(vec![Descriptor::gpio(pin)]);
        let mut resources = Resources::open(hal, &descriptors)?;
        Self::from_handle(resources.take_gpio(0)?)
    }

    fn from_handle(gpio: GpioHandle) -> SenseResult<Self> {
        if gpio.direction() != Direction::In {
            return Err(SenseError::config(format!(
                "collision sensor pin {} must be an input",
                gpio.pin()
            )));
        }
        Ok(Self {
            gpio,
            status: DriverStatus::Uninitialized,
        })
    }

    pub fn pin(&self) -> u32 {
        self.gpio.pin()
    }

    pub fn init(&mut self) -> SenseResult<()> {
        log::info!("collision sensor on gpio {} ready", self.gpio.pin());
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

    /// True while the line is pulled low
    pub fn is_colliding(&mut self) -> SenseResult<bool> {
        if !self.status.is_operational() {
            return Err(SenseError::driver("Driver not initialized"));
        }
        self.status = DriverStatus::Running;

        match self.gpio.read() {
            Ok(level) => Ok(!level),
            Err(e) => {
                self.status = DriverStatus::Error(e.to_string());
                Err(e)
            }
        }
    }
}

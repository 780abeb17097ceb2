//! Register-mapped I2C device
//!
//! Covers the common case of a chip that exposes byte registers behind a
//! register pointer: write the register index, then read or write data.

use sensekit_core::driver::DriverStatus;
use sensekit_core::error::{SenseError, SenseResult};

use crate::hal::{Hal, I2cHandle};
use crate::resources::Resources;

/// I2C register device driver
#[derive(Debug)]
pub struct I2cRegisterDevice {
    i2c: I2cHandle,
    status: DriverStatus,
}

impl I2cRegisterDevice {
    /// Create from an init string; the first i2c clause is the device
    pub fn new(init: &str, hal: &Hal) -> SenseResult<Self> {
        let mut resources = Resources::from_init(hal, init)?;
        Ok(Self {
            i2c: resources.take_i2c(0)?,
            status: DriverStatus::Uninitialized,
        })
    }

    pub fn bus(&self) -> u32 {
        self.i2c.bus()
    }

    pub fn address(&self) -> u8 {
        self.i2c.address()
    }

    pub fn init(&mut self) -> SenseResult<()> {
        log::info!(
            "i2c device 0x{:02X} on bus {} ready",
            self.i2c.address(),
            self.i2c.bus()
        );
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

    fn ensure_ready(&mut self) -> SenseResult<()> {
        if !self.status.is_operational() {
            return Err(SenseError::driver("Driver not initialized"));
        }
        self.status = DriverStatus::Running;
        Ok(())
    }

    pub fn read_register(&mut self, reg: u8) -> SenseResult<u8> {
        self.ensure_ready()?;
        self.i2c.read_register(reg)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> SenseResult<()> {
        self.ensure_ready()?;
        self.i2c.write_register(reg, value)
    }

    /// Read `len` consecutive registers starting at `reg`
    pub fn read_block(&mut self, reg: u8, len: usize) -> SenseResult<Vec<u8>> {
        self.ensure_ready()?;
        self.i2c.write_bytes(&[reg])?;
        self.i2c.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_access() {
        let hal = Hal::simulation();
        let sim = hal.as_simulation().unwrap();
        sim.set_register(1, 0x68, 0x75, 0x68);

        let mut dev = I2cRegisterDevice::new("i2c,1,0x68", &hal).unwrap();
        assert!(dev.read_register(0x75).is_err());
        dev.init().unwrap();

        assert_eq!(dev.read_register(0x75).unwrap(), 0x68);
        dev.write_register(0x6B, 0x00).unwrap();
        assert_eq!(sim.register(1, 0x68, 0x6B), Some(0x00));
    }

    #[test]
    fn test_read_block() {
        let hal = Hal::simulation();
        let sim = hal.as_simulation().unwrap();
        sim.set_register(0, 0x3C, 0x00, 1);
        sim.set_register(0, 0x3C, 0x01, 2);

        let mut dev = I2cRegisterDevice::new("i2c,0,0x3C", &hal).unwrap();
        dev.init().unwrap();
        assert_eq!(dev.read_block(0x00, 3).unwrap(), vec![1, 2, 0xFF]);
    }

    #[test]
    fn test_bus_out_of_range() {
        let hal = Hal::simulation();
        let err = I2cRegisterDevice::new("i2c,42,0x10", &hal).unwrap_err();
        assert!(matches!(err, SenseError::InvalidPin(_)));
    }
}

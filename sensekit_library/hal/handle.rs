//! Open pin and bus handles
//!
//! Each handle owns the claim on its resource. Dropping the handle closes the
//! resource in the backend and makes it available to the next caller.

use sensekit_core::error::{SenseError, SenseResult};
use sensekit_core::init_string::{
    AdcDescriptor, Direction, GpioDescriptor, I2cDescriptor, PwmDescriptor, SpiDescriptor,
    UartDescriptor, UartPort,
};

use super::Claim;

/// Open GPIO pin
#[derive(Debug)]
pub struct GpioHandle {
    claim: Claim,
    pin: u32,
    direction: Direction,
}

impl GpioHandle {
    pub(super) fn new(claim: Claim, desc: GpioDescriptor) -> Self {
        Self {
            claim,
            pin: desc.pin,
            direction: desc.direction,
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) -> SenseResult<()> {
        self.claim.hal.gpio_set_direction(self.pin, direction)?;
        self.direction = direction;
        Ok(())
    }

    /// Read the current level (true = high)
    pub fn read(&self) -> SenseResult<bool> {
        self.claim.hal.gpio_read(self.pin)
    }

    pub fn write(&mut self, value: bool) -> SenseResult<()> {
        if self.direction != Direction::Out {
            return Err(SenseError::driver(format!(
                "GPIO {} is not configured as output",
                self.pin
            )));
        }
        self.claim.hal.gpio_write(self.pin, value)
    }
}

/// Open I2C device endpoint (bus + address)
#[derive(Debug)]
pub struct I2cHandle {
    claim: Claim,
    bus: u32,
    address: u8,
}

impl I2cHandle {
    pub(super) fn new(claim: Claim, desc: I2cDescriptor) -> Self {
        Self {
            claim,
            bus: desc.bus,
            address: desc.address,
        }
    }

    pub fn bus(&self) -> u32 {
        self.bus
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read_bytes(&mut self, len: usize) -> SenseResult<Vec<u8>> {
        self.claim.hal.i2c_read(self.bus, self.address, len)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> SenseResult<()> {
        self.claim.hal.i2c_write(self.bus, self.address, data)
    }

    /// Set the register pointer, then read one byte
    pub fn read_register(&mut self, reg: u8) -> SenseResult<u8> {
        self.write_bytes(&[reg])?;
        let data = self.read_bytes(1)?;
        data.first()
            .copied()
            .ok_or_else(|| SenseError::driver(format!("Empty read from register 0x{:02X}", reg)))
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> SenseResult<()> {
        self.write_bytes(&[reg, value])
    }
}

/// Open SPI device (bus + chip select)
#[derive(Debug)]
pub struct SpiHandle {
    claim: Claim,
    bus: u32,
    chip_select: u32,
}

impl SpiHandle {
    pub(super) fn new(claim: Claim, desc: SpiDescriptor) -> Self {
        Self {
            claim,
            bus: desc.bus,
            chip_select: desc.chip_select,
        }
    }

    pub fn bus(&self) -> u32 {
        self.bus
    }

    pub fn chip_select(&self) -> u32 {
        self.chip_select
    }

    /// Full-duplex transfer; returns as many bytes as were sent
    pub fn transfer(&mut self, tx: &[u8]) -> SenseResult<Vec<u8>> {
        self.claim.hal.spi_transfer(self.bus, self.chip_select, tx)
    }
}

/// Open UART port
#[derive(Debug)]
pub struct UartHandle {
    claim: Claim,
    port: UartPort,
    baud: u32,
}

impl UartHandle {
    pub(super) fn new(claim: Claim, desc: UartDescriptor) -> Self {
        Self {
            claim,
            port: desc.port,
            baud: desc.baud,
        }
    }

    pub fn port(&self) -> &UartPort {
        &self.port
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Read up to `max` pending bytes without blocking
    pub fn read(&mut self, max: usize) -> SenseResult<Vec<u8>> {
        self.claim.hal.uart_read(&self.port, max)
    }

    pub fn write(&mut self, data: &[u8]) -> SenseResult<()> {
        self.claim.hal.uart_write(&self.port, data)
    }
}

/// Open analog input
#[derive(Debug)]
pub struct AdcHandle {
    claim: Claim,
    pin: u32,
}

impl AdcHandle {
    pub(super) fn new(claim: Claim, desc: AdcDescriptor) -> Self {
        Self {
            claim,
            pin: desc.pin,
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Raw conversion result
    pub fn read(&self) -> SenseResult<u16> {
        self.claim.hal.adc_read(self.pin)
    }

    /// Conversion result scaled to `0.0..=1.0`
    pub fn read_normalized(&self) -> SenseResult<f64> {
        let max = self.claim.hal.adc_max();
        if max == 0 {
            return Err(SenseError::driver("ADC resolution is unknown"));
        }
        Ok(self.read()? as f64 / max as f64)
    }
}

/// Open PWM output
#[derive(Debug)]
pub struct PwmHandle {
    claim: Claim,
    pin: u32,
    duty: f64,
}

impl PwmHandle {
    pub(super) fn new(claim: Claim, desc: PwmDescriptor) -> Self {
        Self {
            claim,
            pin: desc.pin,
            duty: desc.duty.unwrap_or(0.0),
        }
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn duty(&self) -> f64 {
        self.duty
    }

    pub fn set_duty(&mut self, duty: f64) -> SenseResult<()> {
        if !duty.is_finite() || !(0.0..=1.0).contains(&duty) {
            return Err(SenseError::invalid_input(format!(
                "PWM duty {} is outside 0.0..=1.0",
                duty
            )));
        }
        self.claim.hal.pwm_set_duty(self.pin, duty)?;
        self.duty = duty;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Hal, ResourceKey};
    use super::*;

    #[test]
    fn test_gpio_output_only_writes() {
        let hal = Hal::simulation();
        let mut input = hal
            .open_gpio(&GpioDescriptor {
                pin: 1,
                direction: Direction::In,
            })
            .unwrap();
        assert!(input.write(true).is_err());

        input.set_direction(Direction::Out).unwrap();
        input.write(false).unwrap();
        assert!(!input.read().unwrap());
    }

    #[test]
    fn test_i2c_registers() {
        let hal = Hal::simulation();
        let mut dev = hal
            .open_i2c(&I2cDescriptor {
                bus: 1,
                address: 0x68,
            })
            .unwrap();
        dev.write_register(0x6B, 0x01).unwrap();
        assert_eq!(dev.read_register(0x6B).unwrap(), 0x01);
        // Unwritten registers read as 0xFF
        assert_eq!(dev.read_register(0x10).unwrap(), 0xFF);
    }

    #[test]
    fn test_pwm_duty_validation() {
        let hal = Hal::simulation();
        let mut pwm = hal
            .open_pwm(&PwmDescriptor {
                pin: 9,
                duty: Some(0.5),
            })
            .unwrap();
        assert_eq!(pwm.duty(), 0.5);
        assert!(pwm.set_duty(1.5).is_err());
        assert!(pwm.set_duty(f64::NAN).is_err());
        pwm.set_duty(0.25).unwrap();
        assert_eq!(hal.as_simulation().unwrap().pwm_duty(9), Some(0.25));
    }

    #[test]
    fn test_uart_loopback() {
        let hal = Hal::simulation();
        let port = UartPort::Path("/dev/ttyS0".to_string());
        let mut uart = hal
            .open_uart(&UartDescriptor {
                port: port.clone(),
                baud: 9600,
            })
            .unwrap();

        uart.write(b"AT\r\n").unwrap();
        let sim = hal.as_simulation().unwrap();
        assert_eq!(sim.uart_tx(&port), b"AT\r\n".to_vec());

        sim.inject_uart_rx(&port, b"OK");
        assert_eq!(uart.read(1).unwrap(), b"O".to_vec());
        assert_eq!(uart.read(16).unwrap(), b"K".to_vec());
        assert!(uart.read(16).unwrap().is_empty());

        drop(uart);
        assert!(!hal.is_claimed(&ResourceKey::Uart(port)));
    }

    #[test]
    fn test_adc_normalized() {
        let hal = Hal::simulation();
        let adc = hal.open_adc(&AdcDescriptor { pin: 0 }).unwrap();
        let sim = hal.as_simulation().unwrap();
        sim.set_adc(0, sim.adc_max());
        assert_eq!(adc.read_normalized().unwrap(), 1.0);
    }

    #[test]
    fn test_spi_transfer() {
        let hal = Hal::simulation();
        let mut spi = hal
            .open_spi(&SpiDescriptor {
                bus: 0,
                chip_select: 1,
            })
            .unwrap();
        hal.as_simulation()
            .unwrap()
            .set_spi_response(0, 1, vec![0xAA, 0xBB]);
        assert_eq!(spi.transfer(&[1, 2, 3]).unwrap(), vec![0xAA, 0xBB, 0xAA]);
        assert_eq!(
            hal.as_simulation().unwrap().last_spi_write(0, 1),
            vec![1, 2, 3]
        );
    }
}

//! Hardware abstraction backends
//!
//! A [`Hal`] is a cheaply cloneable handle to one backend plus the set of
//! resources currently claimed through it. Opening a pin or bus claims it;
//! the claim is released when the returned handle is dropped.
//!
//! # Available Backends
//!
//! - `SimulationHal` - Always available, in-memory pins and buses
//! - `SysfsHal` - Linux sysfs GPIO (requires `gpio-hardware` feature)

mod handle;
mod simulation;

#[cfg(feature = "gpio-hardware")]
mod sysfs;

pub use handle::{AdcHandle, GpioHandle, I2cHandle, PwmHandle, SpiHandle, UartHandle};
pub use simulation::{SimulationConfig, SimulationHal};

#[cfg(feature = "gpio-hardware")]
pub use sysfs::SysfsHal;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use sensekit_core::error::{SenseError, SenseResult};
use sensekit_core::init_string::{
    AdcDescriptor, Direction, GpioDescriptor, I2cDescriptor, PwmDescriptor, SpiDescriptor,
    UartDescriptor, UartPort,
};

/// HAL backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HalBackend {
    #[default]
    Simulation,
    #[cfg(feature = "gpio-hardware")]
    Sysfs,
}

impl HalBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simulation => "simulation",
            #[cfg(feature = "gpio-hardware")]
            Self::Sysfs => "sysfs",
        }
    }
}

/// Identity of one claimable pin or bus endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Gpio(u32),
    I2c { bus: u32, address: u8 },
    Spi { bus: u32, chip_select: u32 },
    Uart(UartPort),
    Adc(u32),
    Pwm(u32),
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gpio(pin) => write!(f, "gpio {}", pin),
            Self::I2c { bus, address } => write!(f, "i2c bus {} address 0x{:02X}", bus, address),
            Self::Spi { bus, chip_select } => write!(f, "spi bus {} cs {}", bus, chip_select),
            Self::Uart(port) => write!(f, "uart {}", port),
            Self::Adc(pin) => write!(f, "adc {}", pin),
            Self::Pwm(pin) => write!(f, "pwm {}", pin),
        }
    }
}

/// Type-erased backend
enum HalDevice {
    Simulation(SimulationHal),
    #[cfg(feature = "gpio-hardware")]
    Sysfs(SysfsHal),
}

struct HalInner {
    device: HalDevice,
    claims: Mutex<HashSet<ResourceKey>>,
}

/// Shared handle to a HAL backend
#[derive(Clone)]
pub struct Hal {
    inner: Arc<HalInner>,
}

impl Hal {
    pub fn new(backend: HalBackend) -> SenseResult<Self> {
        match backend {
            HalBackend::Simulation => Ok(Self::simulation()),
            #[cfg(feature = "gpio-hardware")]
            HalBackend::Sysfs => Ok(Self::from_device(HalDevice::Sysfs(SysfsHal::new()?))),
        }
    }

    /// Simulation backend with default pin and bus counts
    pub fn simulation() -> Self {
        Self::with_simulation(SimulationHal::default())
    }

    pub fn with_simulation(sim: SimulationHal) -> Self {
        Self::from_device(HalDevice::Simulation(sim))
    }

    fn from_device(device: HalDevice) -> Self {
        Self {
            inner: Arc::new(HalInner {
                device,
                claims: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn backend(&self) -> HalBackend {
        match &self.inner.device {
            HalDevice::Simulation(_) => HalBackend::Simulation,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => HalBackend::Sysfs,
        }
    }

    pub fn name(&self) -> &'static str {
        self.backend().name()
    }

    pub fn is_available(&self) -> bool {
        match &self.inner.device {
            HalDevice::Simulation(_) => true,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(d) => d.is_available(),
        }
    }

    /// Simulation state, for tests and demos
    pub fn as_simulation(&self) -> Option<&SimulationHal> {
        match &self.inner.device {
            HalDevice::Simulation(sim) => Some(sim),
            #[cfg(feature = "gpio-hardware")]
            _ => None,
        }
    }

    pub fn is_claimed(&self, key: &ResourceKey) -> bool {
        self.inner.claims.lock().contains(key)
    }

    pub fn claimed_count(&self) -> usize {
        self.inner.claims.lock().len()
    }

    fn claim(&self, key: ResourceKey) -> SenseResult<Claim> {
        let mut claims = self.inner.claims.lock();
        if claims.contains(&key) {
            return Err(SenseError::busy(key.to_string()));
        }
        claims.insert(key.clone());
        log::trace!("{}: claimed {}", self.name(), key);
        Ok(Claim {
            hal: self.clone(),
            key,
        })
    }

    fn unsupported(&self, what: &str) -> SenseError {
        SenseError::hal(
            self.name(),
            format!("{} is not supported by this backend", what),
        )
    }

    // ========================================================================
    // Open
    // ========================================================================

    pub fn open_gpio(&self, desc: &GpioDescriptor) -> SenseResult<GpioHandle> {
        let claim = self.claim(ResourceKey::Gpio(desc.pin))?;
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_gpio(desc.pin, desc.direction)?,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(d) => d.open_gpio(desc.pin, desc.direction)?,
        }
        Ok(GpioHandle::new(claim, *desc))
    }

    pub fn open_i2c(&self, desc: &I2cDescriptor) -> SenseResult<I2cHandle> {
        let claim = self.claim(ResourceKey::I2c {
            bus: desc.bus,
            address: desc.address,
        })?;
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_i2c(desc.bus)?,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => return Err(self.unsupported("i2c")),
        }
        Ok(I2cHandle::new(claim, *desc))
    }

    pub fn open_spi(&self, desc: &SpiDescriptor) -> SenseResult<SpiHandle> {
        let claim = self.claim(ResourceKey::Spi {
            bus: desc.bus,
            chip_select: desc.chip_select,
        })?;
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_spi(desc.bus)?,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => return Err(self.unsupported("spi")),
        }
        Ok(SpiHandle::new(claim, *desc))
    }

    pub fn open_uart(&self, desc: &UartDescriptor) -> SenseResult<UartHandle> {
        let claim = self.claim(ResourceKey::Uart(desc.port.clone()))?;
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_uart(&desc.port)?,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => return Err(self.unsupported("uart")),
        }
        Ok(UartHandle::new(claim, desc.clone()))
    }

    pub fn open_adc(&self, desc: &AdcDescriptor) -> SenseResult<AdcHandle> {
        let claim = self.claim(ResourceKey::Adc(desc.pin))?;
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_adc(desc.pin)?,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => return Err(self.unsupported("adc")),
        }
        Ok(AdcHandle::new(claim, *desc))
    }

    pub fn open_pwm(&self, desc: &PwmDescriptor) -> SenseResult<PwmHandle> {
        let claim = self.claim(ResourceKey::Pwm(desc.pin))?;
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_pwm(desc.pin, desc.duty.unwrap_or(0.0))?,
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => return Err(self.unsupported("pwm")),
        }
        Ok(PwmHandle::new(claim, *desc))
    }

    // ========================================================================
    // I/O, routed from handles
    // ========================================================================

    fn gpio_read(&self, pin: u32) -> SenseResult<bool> {
        match &self.inner.device {
            HalDevice::Simulation(d) => Ok(d.gpio_read(pin)),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(d) => d.gpio_read(pin),
        }
    }

    fn gpio_write(&self, pin: u32, value: bool) -> SenseResult<()> {
        match &self.inner.device {
            HalDevice::Simulation(d) => {
                d.gpio_write(pin, value);
                Ok(())
            }
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(d) => d.gpio_write(pin, value),
        }
    }

    fn gpio_set_direction(&self, pin: u32, direction: Direction) -> SenseResult<()> {
        match &self.inner.device {
            HalDevice::Simulation(d) => d.open_gpio(pin, direction),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(d) => d.set_direction(pin, direction),
        }
    }

    fn i2c_read(&self, bus: u32, address: u8, len: usize) -> SenseResult<Vec<u8>> {
        match &self.inner.device {
            HalDevice::Simulation(d) => Ok(d.i2c_read(bus, address, len)),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("i2c")),
        }
    }

    fn i2c_write(&self, bus: u32, address: u8, data: &[u8]) -> SenseResult<()> {
        match &self.inner.device {
            HalDevice::Simulation(d) => {
                d.i2c_write(bus, address, data);
                Ok(())
            }
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("i2c")),
        }
    }

    fn spi_transfer(&self, bus: u32, chip_select: u32, tx: &[u8]) -> SenseResult<Vec<u8>> {
        match &self.inner.device {
            HalDevice::Simulation(d) => Ok(d.spi_transfer(bus, chip_select, tx)),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("spi")),
        }
    }

    fn uart_read(&self, port: &UartPort, max: usize) -> SenseResult<Vec<u8>> {
        match &self.inner.device {
            HalDevice::Simulation(d) => Ok(d.uart_read(port, max)),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("uart")),
        }
    }

    fn uart_write(&self, port: &UartPort, data: &[u8]) -> SenseResult<()> {
        match &self.inner.device {
            HalDevice::Simulation(d) => {
                d.uart_write(port, data);
                Ok(())
            }
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("uart")),
        }
    }

    fn adc_read(&self, pin: u32) -> SenseResult<u16> {
        match &self.inner.device {
            HalDevice::Simulation(d) => Ok(d.adc_read(pin)),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("adc")),
        }
    }

    fn adc_max(&self) -> u16 {
        match &self.inner.device {
            HalDevice::Simulation(d) => d.adc_max(),
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => 0,
        }
    }

    fn pwm_set_duty(&self, pin: u32, duty: f64) -> SenseResult<()> {
        match &self.inner.device {
            HalDevice::Simulation(d) => {
                d.pwm_set_duty(pin, duty);
                Ok(())
            }
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(_) => Err(self.unsupported("pwm")),
        }
    }

    fn release(&self, key: &ResourceKey) {
        match &self.inner.device {
            HalDevice::Simulation(_) => {}
            #[cfg(feature = "gpio-hardware")]
            HalDevice::Sysfs(d) => {
                if let ResourceKey::Gpio(pin) = key {
                    d.close_gpio(*pin);
                }
            }
        }
        self.inner.claims.lock().remove(key);
        log::trace!("{}: released {}", self.name(), key);
    }
}

impl Default for Hal {
    fn default() -> Self {
        Self::simulation()
    }
}

impl std::fmt::Debug for Hal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hal")
            .field("backend", &self.name())
            .field("claimed", &self.claimed_count())
            .finish()
    }
}

/// Ownership of one claimed resource, released on drop
#[derive(Debug)]
struct Claim {
    hal: Hal,
    key: ResourceKey,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.hal.release(&self.key);
    }
}

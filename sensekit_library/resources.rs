//! Scoped resource acquisition
//!
//! [`Resources`] turns a parsed init string into open handles, one per
//! descriptor. Opening is all or nothing: if any resource cannot be opened,
//! the handles acquired so far are dropped (and so released) before the
//! error is returned. Dropping `Resources` releases everything it holds.
//!
//! Handles are grouped by kind and keep clause order within a kind, so
//! `gpio(0)` is the first `gpio` clause of the init string.

use sensekit_core::error::{SenseError, SenseResult};
use sensekit_core::init_string::{self, Descriptor, ParseResult, ResourceKind};

use crate::hal::{AdcHandle, GpioHandle, Hal, I2cHandle, PwmHandle, SpiHandle, UartHandle};

/// Open handles for every clause of one init string
///
/// Slots keep their position after a `take_*`, so `gpio(1)` still names the
/// second gpio clause once `gpio(0)` has been taken.
#[derive(Default)]
pub struct Resources {
    gpios: Vec<Option<GpioHandle>>,
    i2cs: Vec<Option<I2cHandle>>,
    spis: Vec<Option<SpiHandle>>,
    uarts: Vec<Option<UartHandle>>,
    adcs: Vec<Option<AdcHandle>>,
    pwms: Vec<Option<PwmHandle>>,
}

impl Resources {
    /// Open a handle for each descriptor, in order
    pub fn open(hal: &Hal, descriptors: &ParseResult) -> SenseResult<Self> {
        let mut resources = Self::default();

        for (index, descriptor) in descriptors.iter().enumerate() {
            // On error `resources` drops here and releases earlier claims
            resources.push(hal, descriptor).map_err(|e| {
                log::debug!(
                    "{}: clause {} ({}) failed to open: {}",
                    hal.name(),
                    index,
                    descriptor,
                    e
                );
                e
            })?;
        }

        log::debug!(
            "{}: opened {} resource(s) for '{}'",
            hal.name(),
            resources.len(),
            descriptors
        );
        Ok(resources)
    }

    /// Parse an init string and open its resources
    pub fn from_init(hal: &Hal, init: &str) -> SenseResult<Self> {
        let descriptors = init_string::parse(init)?;
        Self::open(hal, &descriptors)
    }

    fn push(&mut self, hal: &Hal, descriptor: &Descriptor) -> SenseResult<()> {
        match descriptor {
            Descriptor::Gpio(d) => self.gpios.push(Some(hal.open_gpio(d)?)),
            Descriptor::I2c(d) => self.i2cs.push(Some(hal.open_i2c(d)?)),
            Descriptor::Spi(d) => self.spis.push(Some(hal.open_spi(d)?)),
            Descriptor::Uart(d) => self.uarts.push(Some(hal.open_uart(d)?)),
            Descriptor::Adc(d) => self.adcs.push(Some(hal.open_adc(d)?)),
            Descriptor::Pwm(d) => self.pwms.push(Some(hal.open_pwm(d)?)),
        }
        Ok(())
    }

    /// Number of handles still held
    pub fn len(&self) -> usize {
        ResourceKind::ALL.iter().map(|&kind| self.count(kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `kind` handles still held (taken slots are not counted)
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Gpio => held(&self.gpios),
            ResourceKind::I2c => held(&self.i2cs),
            ResourceKind::Spi => held(&self.spis),
            ResourceKind::Uart => held(&self.uarts),
            ResourceKind::Adc => held(&self.adcs),
            ResourceKind::Pwm => held(&self.pwms),
        }
    }

    pub fn gpio(&mut self, n: usize) -> Option<&mut GpioHandle> {
        self.gpios.get_mut(n).and_then(Option::as_mut)
    }

    pub fn i2c(&mut self, n: usize) -> Option<&mut I2cHandle> {
        self.i2cs.get_mut(n).and_then(Option::as_mut)
    }

    pub fn spi(&mut self, n: usize) -> Option<&mut SpiHandle> {
        self.spis.get_mut(n).and_then(Option::as_mut)
    }

    pub fn uart(&mut self, n: usize) -> Option<&mut UartHandle> {
        self.uarts.get_mut(n).and_then(Option::as_mut)
    }

    pub fn adc(&mut self, n: usize) -> Option<&mut AdcHandle> {
        self.adcs.get_mut(n).and_then(Option::as_mut)
    }

    pub fn pwm(&mut self, n: usize) -> Option<&mut PwmHandle> {
        self.pwms.get_mut(n).and_then(Option::as_mut)
    }

    /// Take ownership of the handle for the `n`th gpio clause. Fails if the
    /// init string had fewer gpio clauses or that slot was already taken.
    pub fn take_gpio(&mut self, n: usize) -> SenseResult<GpioHandle> {
        take(&mut self.gpios, n, ResourceKind::Gpio)
    }

    pub fn take_i2c(&mut self, n: usize) -> SenseResult<I2cHandle> {
        take(&mut self.i2cs, n, ResourceKind::I2c)
    }

    pub fn take_spi(&mut self, n: usize) -> SenseResult<SpiHandle> {
        take(&mut self.spis, n, ResourceKind::Spi)
    }

    pub fn take_uart(&mut self, n: usize) -> SenseResult<UartHandle> {
        take(&mut self.uarts, n, ResourceKind::Uart)
    }

    pub fn take_adc(&mut self, n: usize) -> SenseResult<AdcHandle> {
        take(&mut self.adcs, n, ResourceKind::Adc)
    }

    pub fn take_pwm(&mut self, n: usize) -> SenseResult<PwmHandle> {
        take(&mut self.pwms, n, ResourceKind::Pwm)
    }
}

fn held<T>(slots: &[Option<T>]) -> usize {
    slots.iter().filter(|slot| slot.is_some()).count()
}

fn take<T>(slots: &mut [Option<T>], n: usize, kind: ResourceKind) -> SenseResult<T> {
    let total = slots.len();
    match slots.get_mut(n) {
        None => Err(SenseError::invalid_pin(format!(
            "init string has {} {} clause(s), need at least {}",
            total,
            kind,
            n + 1
        ))),
        Some(slot) => slot.take().ok_or_else(|| {
            SenseError::invalid_pin(format!("{} clause {} was already taken", kind, n))
        }),
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("gpio", &held(&self.gpios))
            .field("i2c", &held(&self.i2cs))
            .field("spi", &held(&self.spis))
            .field("uart", &held(&self.uarts))
            .field("adc", &held(&self.adcs))
            .field("pwm", &held(&self.pwms))
            .finish()
    }
}

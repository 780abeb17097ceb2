//! # SenseKit Library
//!
//! Hardware side of SenseKit: HAL backends that open pins and buses,
//! scoped acquisition of everything an init string names, and the device
//! drivers built on top.
//!
//! ```rust,ignore
//! use sensekit_library::prelude::*;
//!
//! let hal = Hal::simulation();
//! let mut bumper = CollisionSensor::new("gpio,25", &hal)?;
//! bumper.init()?;
//! if bumper.is_colliding()? {
//!     // back off
//! }
//! ```

pub mod drivers;
pub mod hal;
pub mod resources;

pub use drivers::{CollisionSensor, DeviceDriver, DigitalInput, I2cRegisterDevice};
pub use hal::{Hal, HalBackend, ResourceKey, SimulationConfig, SimulationHal};
pub use resources::Resources;

// Core types callers need alongside the library
pub use sensekit_core::{
    Descriptor, DeviceConfig, DevicesConfig, DriverStatus, InitStringError, ParseResult,
    ResourceKind, SenseError, SenseResult,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::drivers::{
        create_driver, create_drivers_from_config, create_hal, CollisionSensor, DeviceDriver,
        DigitalInput, I2cRegisterDevice,
    };
    pub use crate::hal::{
        AdcHandle, GpioHandle, Hal, I2cHandle, PwmHandle, SpiHandle, UartHandle,
    };
    pub use crate::resources::Resources;
    pub use sensekit_core::init_string::{parse, Descriptor, Direction, ParseResult};
    pub use sensekit_core::{
        DeviceConfig, DevicesConfig, DriverStatus, InitStringError, SenseError, SenseResult,
    };
}

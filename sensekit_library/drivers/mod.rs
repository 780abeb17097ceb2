//! Device drivers for SenseKit
//!
//! Each driver is built from an init string: it parses the string, opens
//! the resources it needs through a [`Hal`](crate::hal::Hal) and holds them
//! until dropped.
//!
//! # Available Drivers
//!
//! - `collision` - Bumper switch, active low
//! - `digital_input` - Generic GPIO input
//! - `i2c_register` - Register-mapped I2C chip
//!
//! # Adding a New Driver
//!
//! 1. Create a module here with `new(init, hal)` and the lifecycle methods
//! 2. Add a variant to [`factory::DeviceDriver`]
//! 3. Register its name in [`factory::create_driver`]

pub mod collision;
pub mod digital_input;
pub mod factory;
pub mod i2c_register;

pub use collision::CollisionSensor;
pub use digital_input::DigitalInput;
pub use factory::{
    canonical_driver, create_driver, create_drivers_from_config, create_hal,
    list_available_backends, list_available_drivers, CreatedDrivers, DeviceDriver,
};
pub use i2c_register::I2cRegisterDevice;

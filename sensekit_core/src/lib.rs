//! # SenseKit Core
//!
//! Shared building blocks for SenseKit device drivers:
//!
//! - **Init strings**: parse `"gpio,25;i2c,0,0x3C"` style resource
//!   descriptions into typed, ordered descriptors
//! - **Errors**: the unified [`SenseError`] type and the parser's
//!   [`InitStringError`]
//! - **Driver configuration**: YAML/TOML device files mapping names to a
//!   driver and its init string
//!
//! ## Quick Start
//!
//! ```rust
//! use sensekit_core::init_string::parse;
//!
//! let resources = parse("gpio,25;i2c,0,0x3C").unwrap();
//! let irq = resources.gpio(0).unwrap();
//! assert_eq!(irq.pin, 25);
//! ```

pub mod driver;
pub mod error;
pub mod init_string;

pub use driver::{DeviceConfig, DevicesConfig, DriverStatus};
pub use error::{InitStringError, SenseError, SenseResult};
pub use init_string::{parse, Descriptor, ParseResult, ResourceKind};

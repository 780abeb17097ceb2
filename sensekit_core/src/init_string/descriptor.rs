//! Typed descriptors produced from validated clauses
//!
//! Every descriptor renders to a canonical clause via `Display`, and that
//! clause parses back to an equal descriptor. UART device paths only round
//! trip when built through [`UartPort::path`], which rejects the paths the
//! init string format cannot express: empty, starting with a digit or `-`
//! (those read back as an index), holding a delimiter, or with surrounding
//! whitespace.

use serde::{Deserialize, Serialize};

use super::kind::ResourceKind;

/// GPIO direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UART port: numeric index or device path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UartPort {
    Index(u32),
    Path(String),
}

impl UartPort {
    /// Device path port, or `None` if `path` would not parse back as a path
    pub fn path<S: Into<String>>(path: S) -> Option<Self> {
        let path = path.into();
        if Self::is_valid_path(&path) {
            Some(Self::Path(path))
        } else {
            None
        }
    }

    /// Whether `path` survives a render and parse as a device path
    pub fn is_valid_path(path: &str) -> bool {
        let Some(first) = path.chars().next() else {
            return false;
        };
        !first.is_ascii_digit()
            && first != '-'
            && path.trim() == path
            && !path.contains([super::CLAUSE_DELIMITER, super::PARAM_DELIMITER])
    }
}

impl std::fmt::Display for UartPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Path(path) => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpioDescriptor {
    pub pin: u32,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct I2cDescriptor {
    pub bus: u32,
    /// 7-bit device address
    pub address: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpiDescriptor {
    pub bus: u32,
    #[serde(default)]
    pub chip_select: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UartDescriptor {
    pub port: UartPort,
    pub baud: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdcDescriptor {
    pub pin: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PwmDescriptor {
    pub pin: u32,
    /// Initial duty cycle as a fraction in `0.0..=1.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty: Option<f64>,
}

/// Validated, typed result for one clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Descriptor {
    Gpio(GpioDescriptor),
    I2c(I2cDescriptor),
    Spi(SpiDescriptor),
    Uart(UartDescriptor),
    Adc(AdcDescriptor),
    Pwm(PwmDescriptor),
}

impl Descriptor {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Gpio(_) => ResourceKind::Gpio,
            Self::I2c(_) => ResourceKind::I2c,
            Self::Spi(_) => ResourceKind::Spi,
            Self::Uart(_) => ResourceKind::Uart,
            Self::Adc(_) => ResourceKind::Adc,
            Self::Pwm(_) => ResourceKind::Pwm,
        }
    }

    pub fn gpio(pin: u32) -> Self {
        Self::Gpio(GpioDescriptor {
            pin,
            direction: Direction::In,
        })
    }

    pub fn i2c(bus: u32, address: u8) -> Self {
        Self::I2c(I2cDescriptor { bus, address })
    }

    pub fn spi(bus: u32, chip_select: u32) -> Self {
        Self::Spi(SpiDescriptor { bus, chip_select })
    }

    pub fn uart(port: UartPort, baud: u32) -> Self {
        Self::Uart(UartDescriptor { port, baud })
    }

    pub fn adc(pin: u32) -> Self {
        Self::Adc(AdcDescriptor { pin })
    }

    pub fn pwm(pin: u32, duty: Option<f64>) -> Self {
        Self::Pwm(PwmDescriptor { pin, duty })
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gpio(d) => write!(f, "gpio,{},{}", d.pin, d.direction),
            Self::I2c(d) => write!(f, "i2c,{},0x{:02X}", d.bus, d.address),
            Self::Spi(d) => write!(f, "spi,{},{}", d.bus, d.chip_select),
            Self::Uart(d) => write!(f, "uart,{},{}", d.port, d.baud),
            Self::Adc(d) => write!(f, "adc,{}", d.pin),
            Self::Pwm(d) => match d.duty {
                Some(duty) => write!(f, "pwm,{},{}", d.pin, duty),
                None => write!(f, "pwm,{}", d.pin),
            },
        }
    }
}

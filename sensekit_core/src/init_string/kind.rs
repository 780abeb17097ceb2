//! Kind tags and per-kind parameter signatures

use serde::{Deserialize, Serialize};

/// Resource kind tag at the start of every clause
///
/// The literal tags are matched byte-for-byte and case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Gpio,
    I2c,
    Spi,
    Uart,
    Adc,
    Pwm,
}

impl ResourceKind {
    /// Every kind, in tag-table order
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Gpio,
        ResourceKind::I2c,
        ResourceKind::Spi,
        ResourceKind::Uart,
        ResourceKind::Adc,
        ResourceKind::Pwm,
    ];

    /// Literal tag used in init strings
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Gpio => "gpio",
            Self::I2c => "i2c",
            Self::Spi => "spi",
            Self::Uart => "uart",
            Self::Adc => "adc",
            Self::Pwm => "pwm",
        }
    }

    /// Look up a kind by its exact tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    /// Positional parameter signature for this kind
    ///
    /// Required parameters always precede optional ones.
    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            Self::Gpio => &GPIO_PARAMS,
            Self::I2c => &I2C_PARAMS,
            Self::Spi => &SPI_PARAMS,
            Self::Uart => &UART_PARAMS,
            Self::Adc => &ADC_PARAMS,
            Self::Pwm => &PWM_PARAMS,
        }
    }

    /// Accepted parameter count
    pub fn arity(&self) -> Arity {
        let params = self.params();
        Arity {
            min: params.iter().filter(|p| p.required).count(),
            max: params.len(),
        }
    }

    /// Human-readable clause template, e.g. `gpio,<pin>[,<direction>]`
    pub fn usage(&self) -> String {
        let mut usage = self.tag().to_string();
        for param in self.params() {
            if param.required {
                usage.push_str(&format!(",<{}>", param.name));
            } else {
                usage.push_str(&format!("[,<{}>]", param.name));
            }
        }
        usage
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Expected type of one clause parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Non-negative integer, decimal or `0x` hexadecimal
    Index,
    /// Finite decimal floating-point value
    Float,
    /// `in` or `out`
    Direction,
    /// Port index or device path
    Port,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index => write!(f, "non-negative integer"),
            Self::Float => write!(f, "decimal number"),
            Self::Direction => write!(f, "'in' or 'out'"),
            Self::Port => write!(f, "port index or device path"),
        }
    }
}

/// One positional parameter of a kind signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
}

const fn required(name: &'static str, ty: ParamType) -> ParamSpec {
    ParamSpec {
        name,
        ty,
        required: true,
    }
}

const fn optional(name: &'static str, ty: ParamType) -> ParamSpec {
    ParamSpec {
        name,
        ty,
        required: false,
    }
}

const GPIO_PARAMS: [ParamSpec; 2] = [
    required("pin", ParamType::Index),
    optional("direction", ParamType::Direction),
];

const I2C_PARAMS: [ParamSpec; 2] = [
    required("bus", ParamType::Index),
    required("address", ParamType::Index),
];

const SPI_PARAMS: [ParamSpec; 2] = [
    required("bus", ParamType::Index),
    optional("chip_select", ParamType::Index),
];

const UART_PARAMS: [ParamSpec; 2] = [
    required("port", ParamType::Port),
    required("baud", ParamType::Index),
];

const ADC_PARAMS: [ParamSpec; 1] = [required("pin", ParamType::Index)];

const PWM_PARAMS: [ParamSpec; 2] = [
    required("pin", ParamType::Index),
    optional("duty", ParamType::Float),
];

/// Inclusive range of accepted parameter counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} to {}", self.min, self.max)
        }
    }
}

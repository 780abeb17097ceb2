//! Init string parsing
//!
//! Drivers describe the hardware they need as a short string of clauses:
//!
//! ```text
//! gpio,25;i2c,0,0x3C
//! ```
//!
//! Clauses are separated by `;`, the values inside a clause by `,`. The first
//! value is the kind tag, the rest are positional parameters typed by the
//! kind's signature (see [`ResourceKind::params`]). Parsing is all or
//! nothing: the first bad clause aborts and nothing is returned.
//!
//! # Example
//!
//! ```rust
//! use sensekit_core::init_string::{parse, Descriptor, ResourceKind};
//!
//! let result = parse("gpio,25;i2c,0,0x3C").unwrap();
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.nth(ResourceKind::I2c, 0), Some(&Descriptor::i2c(0, 60)));
//! ```

mod descriptor;
mod kind;

pub use descriptor::{
    AdcDescriptor, Descriptor, Direction, GpioDescriptor, I2cDescriptor, PwmDescriptor,
    SpiDescriptor, UartDescriptor, UartPort,
};
pub use kind::{Arity, ParamSpec, ParamType, ResourceKind};

use serde::{Deserialize, Serialize};

use crate::error::InitStringError;

/// Separates clauses
pub const CLAUSE_DELIMITER: char = ';';

/// Separates the kind tag and parameters inside a clause
pub const PARAM_DELIMITER: char = ',';

/// Highest 7-bit I2C address
const MAX_I2C_ADDRESS: u64 = 0x7F;

/// Parse an init string into an ordered list of descriptors
pub fn parse(raw: &str) -> Result<ParseResult, InitStringError> {
    if raw.trim().is_empty() {
        return Ok(ParseResult::default());
    }

    // Clause by clause so the leftmost failure is the one reported
    let mut descriptors = Vec::new();
    for (index, text) in raw.split(CLAUSE_DELIMITER).enumerate() {
        let clause = ResourceClause::from_text(index, text)?;
        descriptors.push(clause.to_descriptor()?);
    }

    log::trace!("parsed {} clause(s) from '{}'", descriptors.len(), raw);
    Ok(ParseResult { descriptors })
}

/// Split an init string into kind-tagged clauses without typing parameters
///
/// Empty or whitespace-only input yields no clauses.
pub fn split_clauses(raw: &str) -> Result<Vec<ResourceClause>, InitStringError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(CLAUSE_DELIMITER)
        .enumerate()
        .map(|(index, text)| ResourceClause::from_text(index, text))
        .collect()
}

/// One clause of an init string, split but not yet typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceClause {
    pub index: usize,
    pub kind: ResourceKind,
    pub raw_parameters: Vec<String>,
}

impl ResourceClause {
    /// Split one clause's text into its kind and trimmed parameters
    pub fn from_text(index: usize, text: &str) -> Result<Self, InitStringError> {
        let mut tokens = text.split(PARAM_DELIMITER).map(str::trim);

        // split() always yields at least one item
        let tag = tokens.next().unwrap_or_default();
        if tag.is_empty() {
            return Err(InitStringError::EmptyToken {
                clause: index,
                param: None,
            });
        }

        let mut raw_parameters = Vec::new();
        for (param, token) in tokens.enumerate() {
            if token.is_empty() {
                return Err(InitStringError::EmptyToken {
                    clause: index,
                    param: Some(param),
                });
            }
            raw_parameters.push(token.to_string());
        }

        let kind =
            ResourceKind::from_tag(tag).ok_or_else(|| InitStringError::UnknownResourceKind {
                clause: index,
                token: tag.to_string(),
            })?;

        Ok(Self {
            index,
            kind,
            raw_parameters,
        })
    }

    /// Validate arity and parameter types, producing the typed descriptor
    pub fn to_descriptor(&self) -> Result<Descriptor, InitStringError> {
        let arity = self.kind.arity();
        if !arity.contains(self.raw_parameters.len()) {
            return Err(InitStringError::ArityMismatch {
                clause: self.index,
                kind: self.kind,
                expected: arity,
                actual: self.raw_parameters.len(),
            });
        }

        let params = Params {
            clause: self.index,
            tokens: &self.raw_parameters,
        };

        let descriptor = match self.kind {
            ResourceKind::Gpio => Descriptor::Gpio(GpioDescriptor {
                pin: params.u32_at(0)?,
                direction: match params.optional(1) {
                    Some(_) => params.direction_at(1)?,
                    None => Direction::default(),
                },
            }),
            ResourceKind::I2c => Descriptor::I2c(I2cDescriptor {
                bus: params.u32_at(0)?,
                address: params.i2c_address_at(1)?,
            }),
            ResourceKind::Spi => Descriptor::Spi(SpiDescriptor {
                bus: params.u32_at(0)?,
                chip_select: match params.optional(1) {
                    Some(_) => params.u32_at(1)?,
                    None => 0,
                },
            }),
            ResourceKind::Uart => Descriptor::Uart(UartDescriptor {
                port: params.port_at(0)?,
                baud: params.u32_at(1)?,
            }),
            ResourceKind::Adc => Descriptor::Adc(AdcDescriptor {
                pin: params.u32_at(0)?,
            }),
            ResourceKind::Pwm => Descriptor::Pwm(PwmDescriptor {
                pin: params.u32_at(0)?,
                duty: match params.optional(1) {
                    Some(_) => Some(params.fraction_at(1)?),
                    None => None,
                },
            }),
        };

        Ok(descriptor)
    }
}

/// Positional access to a clause's parameters with typed conversion
struct Params<'a> {
    clause: usize,
    tokens: &'a [String],
}

impl Params<'_> {
    fn token(&self, param: usize) -> &str {
        // Arity is checked before any typed access
        self.tokens.get(param).map(String::as_str).unwrap_or_default()
    }

    fn optional(&self, param: usize) -> Option<&str> {
        self.tokens.get(param).map(String::as_str)
    }

    fn type_mismatch(&self, param: usize, expected: ParamType) -> InitStringError {
        InitStringError::TypeMismatch {
            clause: self.clause,
            param,
            expected,
            token: self.token(param).to_string(),
        }
    }

    fn out_of_range(&self, param: usize, range: String) -> InitStringError {
        InitStringError::OutOfRange {
            clause: self.clause,
            param,
            token: self.token(param).to_string(),
            range,
        }
    }

    fn index_at(&self, param: usize) -> Result<u64, InitStringError> {
        let token = self.token(param);
        match parse_unsigned(token) {
            Unsigned::Value(value) => Ok(value),
            Unsigned::Overflow => Err(self.out_of_range(param, format!("0..={}", u64::MAX))),
            Unsigned::Invalid => {
                let negative = token
                    .strip_prefix('-')
                    .map(|rest| !matches!(parse_unsigned(rest), Unsigned::Invalid))
                    .unwrap_or(false);
                if negative {
                    Err(InitStringError::NegativeIndexNotAllowed {
                        clause: self.clause,
                        param,
                        token: token.to_string(),
                    })
                } else {
                    Err(self.type_mismatch(param, ParamType::Index))
                }
            }
        }
    }

    fn u32_at(&self, param: usize) -> Result<u32, InitStringError> {
        let value = self.index_at(param)?;
        u32::try_from(value).map_err(|_| self.out_of_range(param, format!("0..={}", u32::MAX)))
    }

    fn i2c_address_at(&self, param: usize) -> Result<u8, InitStringError> {
        let value = self.index_at(param)?;
        if value > MAX_I2C_ADDRESS {
            return Err(self.out_of_range(param, format!("0x00..=0x{:02X}", MAX_I2C_ADDRESS)));
        }
        Ok(value as u8)
    }

    fn direction_at(&self, param: usize) -> Result<Direction, InitStringError> {
        match self.token(param) {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            _ => Err(self.type_mismatch(param, ParamType::Direction)),
        }
    }

    fn port_at(&self, param: usize) -> Result<UartPort, InitStringError> {
        let token = self.token(param);
        let numeric = token
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || c == '-')
            .unwrap_or(false);

        if numeric {
            let index = self.index_at(param).map_err(|err| match err {
                InitStringError::TypeMismatch { .. } => self.type_mismatch(param, ParamType::Port),
                other => other,
            })?;
            let index = u32::try_from(index)
                .map_err(|_| self.out_of_range(param, format!("0..={}", u32::MAX)))?;
            Ok(UartPort::Index(index))
        } else {
            Ok(UartPort::Path(token.to_string()))
        }
    }

    fn fraction_at(&self, param: usize) -> Result<f64, InitStringError> {
        let value: f64 = self
            .token(param)
            .parse()
            .map_err(|_| self.type_mismatch(param, ParamType::Float))?;
        if !value.is_finite() {
            return Err(self.type_mismatch(param, ParamType::Float));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(self.out_of_range(param, "0.0..=1.0".to_string()));
        }
        Ok(value)
    }
}

enum Unsigned {
    Value(u64),
    Overflow,
    Invalid,
}

/// Decimal or `0x`-prefixed hexadecimal, digits only
fn parse_unsigned(token: &str) -> Unsigned {
    let (digits, radix) = match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (token, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Unsigned::Invalid;
    }

    match u64::from_str_radix(digits, radix) {
        Ok(value) => Unsigned::Value(value),
        // Only overflow remains once the digits are validated
        Err(_) => Unsigned::Overflow,
    }
}

/// Ordered descriptors parsed from one init string
///
/// Order matches the clauses of the input. Callers give meaning to position,
/// e.g. "the first gpio clause is the interrupt pin", so nothing is merged or
/// reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParseResult {
    descriptors: Vec<Descriptor>,
}

impl ParseResult {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        Self { descriptors }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<Descriptor> {
        self.descriptors
    }

    /// Descriptors of one kind, in input order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter().filter(move |d| d.kind() == kind)
    }

    /// Number of clauses of one kind
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).count()
    }

    /// The `n`th descriptor of `kind` (zero based)
    pub fn nth(&self, kind: ResourceKind, n: usize) -> Option<&Descriptor> {
        self.of_kind(kind).nth(n)
    }

    pub fn gpio(&self, n: usize) -> Option<&GpioDescriptor> {
        match self.nth(ResourceKind::Gpio, n) {
            Some(Descriptor::Gpio(d)) => Some(d),
            _ => None,
        }
    }

    pub fn i2c(&self, n: usize) -> Option<&I2cDescriptor> {
        match self.nth(ResourceKind::I2c, n) {
            Some(Descriptor::I2c(d)) => Some(d),
            _ => None,
        }
    }

    pub fn spi(&self, n: usize) -> Option<&SpiDescriptor> {
        match self.nth(ResourceKind::Spi, n) {
            Some(Descriptor::Spi(d)) => Some(d),
            _ => None,
        }
    }

    pub fn uart(&self, n: usize) -> Option<&UartDescriptor> {
        match self.nth(ResourceKind::Uart, n) {
            Some(Descriptor::Uart(d)) => Some(d),
            _ => None,
        }
    }

    pub fn adc(&self, n: usize) -> Option<&AdcDescriptor> {
        match self.nth(ResourceKind::Adc, n) {
            Some(Descriptor::Adc(d)) => Some(d),
            _ => None,
        }
    }

    pub fn pwm(&self, n: usize) -> Option<&PwmDescriptor> {
        match self.nth(ResourceKind::Pwm, n) {
            Some(Descriptor::Pwm(d)) => Some(d),
            _ => None,
        }
    }
}

impl std::str::FromStr for ParseResult {
    type Err = InitStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl std::fmt::Display for ParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", CLAUSE_DELIMITER)?;
            }
            write!(f, "{}", descriptor)?;
        }
        Ok(())
    }
}

impl From<Vec<Descriptor>> for ParseResult {
    fn from(descriptors: Vec<Descriptor>) -> Self {
        Self::new(descriptors)
    }
}

impl IntoIterator for ParseResult {
    type Item = Descriptor;
    type IntoIter = std::vec::IntoIter<Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseResult {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_gpio_and_i2c() {
        let result = parse("gpio,25;i2c,0,0x3C").unwrap();
        assert_eq!(
            result.descriptors(),
            &[Descriptor::gpio(25), Descriptor::i2c(0, 60)]
        );
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let result = parse(" gpio , 25 ; i2c ,0, 0x3c ").unwrap();
        assert_eq!(
            result.descriptors(),
            &[Descriptor::gpio(25), Descriptor::i2c(0, 0x3C)]
        );
    }

    #[test]
    fn test_negative_index() {
        let err = parse("gpio,-1").unwrap_err();
        assert_eq!(
            err,
            InitStringError::NegativeIndexNotAllowed {
                clause: 0,
                param: 0,
                token: "-1".to_string()
            }
        );
        assert!(matches!(
            parse("i2c,0,-0x10").unwrap_err(),
            InitStringError::NegativeIndexNotAllowed { param: 1, .. }
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let err = parse("gpio,1;foo,1").unwrap_err();
        assert_eq!(
            err,
            InitStringError::UnknownResourceKind {
                clause: 1,
                token: "foo".to_string()
            }
        );
        assert!(matches!(
            parse("GPIO,1").unwrap_err(),
            InitStringError::UnknownResourceKind { .. }
        ));
    }

    #[test]
    fn test_too_many_params() {
        let err = parse("gpio,1,2,3").unwrap_err();
        assert_eq!(
            err,
            InitStringError::ArityMismatch {
                clause: 0,
                kind: ResourceKind::Gpio,
                expected: Arity { min: 1, max: 2 },
                actual: 3
            }
        );
    }

    #[test]
    fn test_too_few_params() {
        assert!(matches!(
            parse("i2c,0").unwrap_err(),
            InitStringError::ArityMismatch { actual: 1, .. }
        ));
        assert!(matches!(
            parse("gpio").unwrap_err(),
            InitStringError::ArityMismatch { actual: 0, .. }
        ));
    }

    #[test]
    fn test_empty_tokens() {
        assert_eq!(
            parse("gpio,").unwrap_err(),
            InitStringError::EmptyToken {
                clause: 0,
                param: Some(0)
            }
        );
        assert_eq!(
            parse("gpio,1;;adc,2").unwrap_err(),
            InitStringError::EmptyToken {
                clause: 1,
                param: None
            }
        );
        assert_eq!(
            parse("gpio,1;").unwrap_err(),
            InitStringError::EmptyToken {
                clause: 1,
                param: None
            }
        );
        assert_eq!(
            parse("i2c,,0x3C").unwrap_err(),
            InitStringError::EmptyToken {
                clause: 0,
                param: Some(0)
            }
        );
    }

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            parse("gpio,abc").unwrap_err(),
            InitStringError::TypeMismatch {
                clause: 0,
                param: 0,
                expected: ParamType::Index,
                token: "abc".to_string()
            }
        );
        assert!(matches!(
            parse("gpio,+5").unwrap_err(),
            InitStringError::TypeMismatch { .. }
        ));
        assert!(matches!(
            parse("gpio,0x").unwrap_err(),
            InitStringError::TypeMismatch { .. }
        ));
        assert!(matches!(
            parse("gpio,1 2").unwrap_err(),
            InitStringError::TypeMismatch { .. }
        ));
        assert!(matches!(
            parse("gpio,4,sideways").unwrap_err(),
            InitStringError::TypeMismatch {
                expected: ParamType::Direction,
                ..
            }
        ));
        assert!(matches!(
            parse("gpio,1.5").unwrap_err(),
            InitStringError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_hex_and_decimal() {
        let result = parse("gpio,0x1F;adc,0X0a;spi,10").unwrap();
        assert_eq!(result.gpio(0).unwrap().pin, 31);
        assert_eq!(result.adc(0).unwrap().pin, 10);
        assert_eq!(result.spi(0).unwrap().bus, 10);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            parse("i2c,0,0x80").unwrap_err(),
            InitStringError::OutOfRange { param: 1, .. }
        ));
        assert!(matches!(
            parse("gpio,4294967296").unwrap_err(),
            InitStringError::OutOfRange { .. }
        ));
        assert!(matches!(
            parse("gpio,99999999999999999999999").unwrap_err(),
            InitStringError::OutOfRange { .. }
        ));
        assert!(matches!(
            parse("pwm,3,1.5").unwrap_err(),
            InitStringError::OutOfRange { .. }
        ));
        assert!(matches!(
            parse("pwm,3,-0.5").unwrap_err(),
            InitStringError::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_pwm_duty() {
        let result = parse("pwm,3,0.75;pwm,4").unwrap();
        assert_eq!(result.pwm(0).unwrap().duty, Some(0.75));
        assert_eq!(result.pwm(1).unwrap().duty, None);
        assert!(matches!(
            parse("pwm,3,nan").unwrap_err(),
            InitStringError::TypeMismatch {
                expected: ParamType::Float,
                ..
            }
        ));
        assert!(matches!(
            parse("pwm,3,inf").unwrap_err(),
            InitStringError::TypeMismatch { .. }
        ));
        assert!(matches!(
            parse("pwm,3,0,5").unwrap_err(),
            InitStringError::ArityMismatch { .. }
        ));
    }

    #[test]
    fn test_uart_ports() {
        let result = parse("uart,/dev/ttyUSB0,115200;uart,1,9600").unwrap();
        assert_eq!(
            result.uart(0).unwrap().port,
            UartPort::Path("/dev/ttyUSB0".to_string())
        );
        assert_eq!(result.uart(1).unwrap().port, UartPort::Index(1));
        assert_eq!(result.uart(1).unwrap().baud, 9600);

        assert!(matches!(
            parse("uart,-1,9600").unwrap_err(),
            InitStringError::NegativeIndexNotAllowed { .. }
        ));
        assert!(matches!(
            parse("uart,1x,9600").unwrap_err(),
            InitStringError::TypeMismatch {
                expected: ParamType::Port,
                ..
            }
        ));
    }

    #[test]
    fn test_defaults() {
        let result = parse("gpio,5;gpio,6,out;spi,0;spi,0,2").unwrap();
        assert_eq!(result.gpio(0).unwrap().direction, Direction::In);
        assert_eq!(result.gpio(1).unwrap().direction, Direction::Out);
        assert_eq!(result.spi(0).unwrap().chip_select, 0);
        assert_eq!(result.spi(1).unwrap().chip_select, 2);
    }

    #[test]
    fn test_positional_access() {
        let result = parse("gpio,2;i2c,1,0x68;gpio,3,out").unwrap();
        assert_eq!(result.count(ResourceKind::Gpio), 2);
        assert_eq!(result.gpio(0).unwrap().pin, 2);
        assert_eq!(result.gpio(1).unwrap().pin, 3);
        assert!(result.gpio(2).is_none());
        assert!(result.uart(0).is_none());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let result = parse("gpio,7;gpio,7").unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_first_failure_wins() {
        let err = parse("gpio,x;foo,1").unwrap_err();
        assert_eq!(err.clause_index(), 0);
    }

    #[test]
    fn test_display_round_trip() {
        let raw = "gpio,25;i2c,0,0x3C;spi,1,1;uart,/dev/ttyS1,57600;adc,0;pwm,9,0.5";
        let result = parse(raw).unwrap();
        let reparsed: ParseResult = result.to_string().parse().unwrap();
        assert_eq!(result, reparsed);
    }

    #[test]
    fn test_split_clauses() {
        let clauses = split_clauses("gpio,1;i2c,0,0x3C").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].kind, ResourceKind::I2c);
        assert_eq!(clauses[1].raw_parameters, vec!["0", "0x3C"]);
    }
}

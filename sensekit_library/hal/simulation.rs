//! Simulation HAL backend
//!
//! In-memory pins and buses for tests and for running drivers without
//! hardware. Test code drives inputs through the `set_*`/`inject_*` methods
//! and inspects outputs through the getters.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use rand::Rng;

use sensekit_core::error::{SenseError, SenseResult};
use sensekit_core::init_string::{Direction, UartPort};

/// Size of the simulated board
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// GPIO pins `0..gpio_count` exist
    pub gpio_count: u32,
    /// ADC channels `0..adc_count` exist
    pub adc_count: u32,
    /// PWM channels `0..pwm_count` exist
    pub pwm_count: u32,
    /// I2C and SPI buses `0..bus_count` exist
    pub bus_count: u32,
    /// Indexed UART ports `0..uart_count` exist; device paths always open
    pub uart_count: u32,
    /// ADC resolution in bits
    pub adc_bits: u8,
    /// Peak random noise added to ADC readings (raw counts)
    pub adc_noise: u16,
    /// Level read from an input pin nobody has driven
    pub idle_level: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gpio_count: 64,
            adc_count: 8,
            pwm_count: 16,
            bus_count: 4,
            uart_count: 4,
            adc_bits: 10,
            adc_noise: 0,
            idle_level: true,
        }
    }
}

#[derive(Default)]
struct SimulationState {
    gpio_levels: HashMap<u32, bool>,
    gpio_directions: HashMap<u32, Direction>,
    /// (bus, address) -> (register -> value)
    i2c_devices: HashMap<(u32, u8), HashMap<u8, u8>>,
    /// Current register pointer per device
    i2c_pointers: HashMap<(u32, u8), u8>,
    /// (bus, cs) -> bytes returned by transfers
    spi_responses: HashMap<(u32, u32), Vec<u8>>,
    spi_writes: HashMap<(u32, u32), Vec<u8>>,
    uart_rx: HashMap<UartPort, VecDeque<u8>>,
    uart_tx: HashMap<UartPort, Vec<u8>>,
    adc_values: HashMap<u32, u16>,
    pwm_duty: HashMap<u32, f64>,
}

/// Simulation HAL
pub struct SimulationHal {
    config: SimulationConfig,
    state: Mutex<SimulationState>,
}

impl SimulationHal {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SimulationState::default()),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn check(&self, what: &str, index: u32, count: u32) -> SenseResult<()> {
        if index >= count {
            return Err(SenseError::invalid_pin(format!(
                "{} {} does not exist (simulated board has {})",
                what, index, count
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Test hooks
    // ========================================================================

    /// Drive a GPIO level from outside (e.g. a sensor pulling the line)
    pub fn set_gpio(&self, pin: u32, level: bool) {
        self.state.lock().gpio_levels.insert(pin, level);
    }

    pub fn gpio_level(&self, pin: u32) -> Option<bool> {
        self.state.lock().gpio_levels.get(&pin).copied()
    }

    pub fn gpio_direction(&self, pin: u32) -> Option<Direction> {
        self.state.lock().gpio_directions.get(&pin).copied()
    }

    pub fn set_register(&self, bus: u32, address: u8, reg: u8, value: u8) {
        self.state
            .lock()
            .i2c_devices
            .entry((bus, address))
            .or_default()
            .insert(reg, value);
    }

    pub fn register(&self, bus: u32, address: u8, reg: u8) -> Option<u8> {
        self.state
            .lock()
            .i2c_devices
            .get(&(bus, address))
            .and_then(|regs| regs.get(&reg).copied())
    }

    pub fn set_spi_response(&self, bus: u32, chip_select: u32, data: Vec<u8>) {
        self.state
            .lock()
            .spi_responses
            .insert((bus, chip_select), data);
    }

    pub fn last_spi_write(&self, bus: u32, chip_select: u32) -> Vec<u8> {
        self.state
            .lock()
            .spi_writes
            .get(&(bus, chip_select))
            .cloned()
            .unwrap_or_default()
    }

    pub fn inject_uart_rx(&self, port: &UartPort, data: &[u8]) {
        self.state
            .lock()
            .uart_rx
            .entry(port.clone())
            .or_default()
            .extend(data.iter().copied());
    }

    pub fn uart_tx(&self, port: &UartPort) -> Vec<u8> {
        self.state
            .lock()
            .uart_tx
            .get(port)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_adc(&self, pin: u32, value: u16) {
        let value = value.min(self.adc_max());
        self.state.lock().adc_values.insert(pin, value);
    }

    pub fn pwm_duty(&self, pin: u32) -> Option<f64> {
        self.state.lock().pwm_duty.get(&pin).copied()
    }

    // ========================================================================
    // Backend operations
    // ========================================================================

    pub(super) fn open_gpio(&self, pin: u32, direction: Direction) -> SenseResult<()> {
        self.check("GPIO", pin, self.config.gpio_count)?;
        self.state.lock().gpio_directions.insert(pin, direction);
        Ok(())
    }

    pub(super) fn gpio_read(&self, pin: u32) -> bool {
        self.state
            .lock()
            .gpio_levels
            .get(&pin)
            .copied()
            .unwrap_or(self.config.idle_level)
    }

    pub(super) fn gpio_write(&self, pin: u32, value: bool) {
        self.state.lock().gpio_levels.insert(pin, value);
    }

    pub(super) fn open_i2c(&self, bus: u32) -> SenseResult<()> {
        self.check("I2C bus", bus, self.config.bus_count)
    }

    pub(super) fn i2c_read(&self, bus: u32, address: u8, len: usize) -> Vec<u8> {
        let state = self.state.lock();
        let key = (bus, address);
        let reg_ptr = state.i2c_pointers.get(&key).copied().unwrap_or(0);

        let mut result = Vec::with_capacity(len);
        match state.i2c_devices.get(&key) {
            Some(device) => {
                for i in 0..len {
                    let reg = reg_ptr.wrapping_add(i as u8);
                    result.push(device.get(&reg).copied().unwrap_or(0xFF));
                }
            }
            // No device answers: the bus floats high
            None => result.resize(len, 0xFF),
        }
        result
    }

    pub(super) fn i2c_write(&self, bus: u32, address: u8, data: &[u8]) {
        let Some((&reg, values)) = data.split_first() else {
            return;
        };

        let mut state = self.state.lock();
        let key = (bus, address);
        state.i2c_pointers.insert(key, reg);

        if !values.is_empty() {
            let device = state.i2c_devices.entry(key).or_default();
            for (i, &byte) in values.iter().enumerate() {
                device.insert(reg.wrapping_add(i as u8), byte);
            }
        }
    }

    pub(super) fn open_spi(&self, bus: u32) -> SenseResult<()> {
        self.check("SPI bus", bus, self.config.bus_count)
    }

    pub(super) fn spi_transfer(&self, bus: u32, chip_select: u32, tx: &[u8]) -> Vec<u8> {
        let mut state = self.state.lock();
        let key = (bus, chip_select);
        state.spi_writes.insert(key, tx.to_vec());

        match state.spi_responses.get(&key) {
            Some(response) if !response.is_empty() => (0..tx.len())
                .map(|i| response[i % response.len()])
                .collect(),
            _ => vec![0xFF; tx.len()],
        }
    }

    pub(super) fn open_uart(&self, port: &UartPort) -> SenseResult<()> {
        match port {
            UartPort::Index(index) => self.check("UART", *index, self.config.uart_count),
            UartPort::Path(_) => Ok(()),
        }
    }

    pub(super) fn uart_read(&self, port: &UartPort, max: usize) -> Vec<u8> {
        let mut state = self.state.lock();
        match state.uart_rx.get_mut(port) {
            Some(queue) => {
                let n = max.min(queue.len());
                queue.drain(..n).collect()
            }
            None => Vec::new(),
        }
    }

    pub(super) fn uart_write(&self, port: &UartPort, data: &[u8]) {
        self.state
            .lock()
            .uart_tx
            .entry(port.clone())
            .or_default()
            .extend_from_slice(data);
    }

    pub(super) fn open_adc(&self, pin: u32) -> SenseResult<()> {
        self.check("ADC channel", pin, self.config.adc_count)
    }

    pub(super) fn adc_max(&self) -> u16 {
        let bits = self.config.adc_bits.clamp(1, 16) as u32;
        ((1u32 << bits) - 1) as u16
    }

    pub(super) fn adc_read(&self, pin: u32) -> u16 {
        let base = self.state.lock().adc_values.get(&pin).copied().unwrap_or(0);
        if self.config.adc_noise == 0 {
            return base;
        }

        let noise = self.config.adc_noise as i32;
        let offset = rand::thread_rng().gen_range(-noise..=noise);
        (base as i32 + offset).clamp(0, self.adc_max() as i32) as u16
    }

    pub(super) fn open_pwm(&self, pin: u32, duty: f64) -> SenseResult<()> {
        self.check("PWM channel", pin, self.config.pwm_count)?;
        self.state.lock().pwm_duty.insert(pin, duty);
        Ok(())
    }

    pub(super) fn pwm_set_duty(&self, pin: u32, duty: f64) {
        self.state.lock().pwm_duty.insert(pin, duty);
    }
}

impl Default for SimulationHal {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

//! Serial port identity and configuration types.

use bitflags::bitflags;

use crate::error::ConfigError;

/// Identifies one physical serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(u8);

impl PortId {
    /// Port number `n`, counting from zero.
    pub const fn new(n: u8) -> Self {
        PortId(n)
    }

    /// The port number as an index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    /// Five data bits.
    Five,
    /// Six data bits.
    Six,
    /// Seven data bits.
    Seven,
    /// Eight data bits.
    Eight,
}

/// Parity bit generation and checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

/// Character framing on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Data bits per character.
    pub data_bits: DataBits,
    /// Parity mode.
    pub parity: Parity,
    /// Stop bits per character.
    pub stop_bits: StopBits,
}

impl FrameFormat {
    /// Eight data bits, no parity, one stop bit.
    pub const EIGHT_N_ONE: FrameFormat = FrameFormat {
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat::EIGHT_N_ONE
    }
}

bitflags! {
    /// Enable bits for a serial port.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PortFlags: u8 {
        /// Enable the receiver.
        const RX_ENABLE = 1 << 0;
        /// Enable the transmitter.
        const TX_ENABLE = 1 << 1;
        /// Raise an interrupt for every received character.
        const RX_INTERRUPT = 1 << 2;
    }
}

/// Configuration of one serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    /// Baud rate in bits per second.
    pub baud: u32,
    /// Character framing.
    pub frame: FrameFormat,
    /// Receiver/transmitter/interrupt enables.
    pub flags: PortFlags,
    /// Byte that terminates a logical record in the receive stream.
    pub terminator: u8,
    /// Buffered-byte count above which mainline attention is requested
    /// even without a complete line. `usize::MAX` disables the check.
    pub high_water: usize,
}

impl PortConfig {
    /// Interrupt-driven 8N1 port at `baud`, line-terminated by `\n`, with
    /// the high-water check disabled.
    pub const fn new(baud: u32) -> Self {
        PortConfig {
            baud,
            frame: FrameFormat::EIGHT_N_ONE,
            flags: PortFlags::RX_ENABLE
                .union(PortFlags::TX_ENABLE)
                .union(PortFlags::RX_INTERRUPT),
            terminator: b'\n',
            high_water: usize::MAX,
        }
    }

    /// Checks the flag combination for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flags.contains(PortFlags::RX_INTERRUPT) && !self.flags.contains(PortFlags::RX_ENABLE)
        {
            return Err(ConfigError::InvalidFlags);
        }
        Ok(())
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig::new(9600)
    }
}

/// Computes the 16x-oversampling baud divisor for a peripheral clocked at
/// `clock_hz`: `clock / (16 * baud) - 1`, rounded to nearest.
///
/// The divisor register is 12 bits wide; rates that need a larger divisor
/// (or a zero one) are rejected.
pub fn baud_divisor(baud: u32, clock_hz: u32) -> Result<u16, ConfigError> {
    if baud == 0 {
        return Err(ConfigError::BaudOutOfRange { baud });
    }
    let denom = 16 * u64::from(baud);
    let scaled = (u64::from(clock_hz) + denom / 2) / denom;
    if scaled == 0 || scaled - 1 > 0x0FFF {
        return Err(ConfigError::BaudOutOfRange { baud });
    }
    Ok((scaled - 1) as u16)
}

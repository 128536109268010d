//! External interrupt line types.

/// Number of physical external interrupt lines (INT0..INT7).
pub const EXTERNAL_LINES: usize = 8;

/// Triggering condition for an external interrupt line.
///
/// The discriminants match the hardware's 2-bit sense-control encoding, so
/// a register-level implementation can shift them into place directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerMode {
    /// Trigger continuously while the line is held low.
    LevelLow = 0,
    /// Trigger on any logic change.
    AnyEdge = 1,
    /// Trigger on a falling edge.
    FallingEdge = 2,
    /// Trigger on a rising edge.
    RisingEdge = 3,
}

impl TriggerMode {
    /// Returns the raw 2-bit sense-control value.
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

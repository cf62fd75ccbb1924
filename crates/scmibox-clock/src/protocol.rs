//! Clock management protocol identifiers.

/// Clock management protocol.
pub const PROTOCOL_CLOCK: u8 = 0x14;

/// Read the current clock rate. Response: status, rate low word, rate high word.
pub const CLOCK_RATE_GET: u8 = 0x06;

/// Set clock configuration. Payload: clock id, attributes (bit0 = enable).
pub const CLOCK_CONFIG_SET: u8 = 0x07;

/// `CLOCK_CONFIG_SET` attribute bit enabling the clock.
pub const CONFIG_ENABLE: u32 = 1 << 0;

/// Response words requested for every clock command.
pub const RESPONSE_WORDS: usize = 4;

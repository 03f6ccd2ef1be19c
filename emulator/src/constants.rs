/// A memory cell, as seen by the CPU
pub type Word = u8;

/// A location in the address space, as seen by the CPU
pub type Address = u16;

/// Value carried by the memory address register.
///
/// It is wider than [`Address`] so that out-of-range locations can be
/// represented, and reported, instead of being silently truncated.
pub type BusAddress = u32;

/// Value carried by the memory data register.
///
/// Wider than [`Word`] for the same reason as [`BusAddress`].
pub type BusWord = u16;

/// Total size of the computer memory
pub const MEMORY_SIZE: usize = 0x1_0000;

/// Highest valid address
pub const MAX_ADDRESS: BusAddress = 0xFFFF;

/// Highest value a memory cell can hold
pub const MAX_WORD: BusWord = 0xFF;

/// Default interval between two clock pulses, in milliseconds
pub const CLOCK_INTERVAL_MS: u64 = 200;

/// Width of an address in hex dumps
pub const ADDRESS_FMT_LEN: usize = 4;

/// Width of a word in hex dumps
pub const WORD_FMT_LEN: usize = 2;

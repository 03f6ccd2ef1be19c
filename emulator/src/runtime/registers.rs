use bitflags::bitflags;
use parse_display::Display;

use crate::constants::{Address, Word};
use crate::util::{hex_address, hex_word};

bitflags! {
    /// Phases still to run for the current instruction.
    ///
    /// An empty schedule means the next pulse fetches a new instruction.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Schedule: u8 {
        const DECODE1         = 0b10_0000;
        const DECODE2         = 0b01_0000;
        const EXECUTE1        = 0b00_1000;
        const EXECUTE2        = 0b00_0100;
        const WRITE_BACK      = 0b00_0010;
        const INTERRUPT_CHECK = 0b00_0001;
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08b}", self.bits())
    }
}

/// One micro-step of the instruction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "kebab-case")]
pub enum Phase {
    Fetch,
    Decode1,
    Decode2,
    Execute1,
    Execute2,
    WriteBack,
    InterruptCheck,
}

impl Phase {
    /// Phases which have a bit in the schedule, in the order they run
    pub const SCHEDULED: [Phase; 6] = [
        Phase::Decode1,
        Phase::Decode2,
        Phase::Execute1,
        Phase::Execute2,
        Phase::WriteBack,
        Phase::InterruptCheck,
    ];

    /// The schedule bit of this phase. Fetch has none.
    #[must_use]
    pub const fn flag(self) -> Schedule {
        match self {
            Phase::Fetch => Schedule::empty(),
            Phase::Decode1 => Schedule::DECODE1,
            Phase::Decode2 => Schedule::DECODE2,
            Phase::Execute1 => Schedule::EXECUTE1,
            Phase::Execute2 => Schedule::EXECUTE2,
            Phase::WriteBack => Schedule::WRITE_BACK,
            Phase::InterruptCheck => Schedule::INTERRUPT_CHECK,
        }
    }
}

/// Outcome of looking at the schedule before a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPhase {
    Run(Phase),

    /// Only unknown bits are set
    Invalid(u8),
}

impl Schedule {
    /// The phase the next pulse runs, tested in the fixed priority order
    #[must_use]
    pub fn next_phase(self) -> NextPhase {
        if self.bits() == 0 {
            return NextPhase::Run(Phase::Fetch);
        }

        Phase::SCHEDULED
            .into_iter()
            .find(|phase| self.contains(phase.flag()))
            .map_or(NextPhase::Invalid(self.bits()), NextPhase::Run)
    }
}

/// The CPU register file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// Program counter
    pub pc: Address,

    /// Instruction register
    pub ir: Word,

    /// Accumulator
    pub acc: Word,

    /// General purpose
    pub x: Word,

    /// General purpose
    pub y: Word,

    /// Set by comparisons
    pub zero: bool,

    /// First operand byte, low half of an operand address
    pub operand_low: Word,

    /// Second operand byte, high half of an operand address
    pub operand_high: Word,

    /// Remaining phases of the current instruction
    pub schedule: Schedule,
}

impl Registers {
    /// The two operand bytes, as a little-endian address
    #[must_use]
    pub fn operand_address(&self) -> Address {
        Address::from_le_bytes([self.operand_low, self.operand_high])
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PC: {} | IR: {} | ACC: {} | X: {} | Y: {} | Z: {}",
            hex_address(self.pc),
            hex_word(self.ir),
            hex_word(self.acc),
            hex_word(self.x),
            hex_word(self.y),
            u8::from(self.zero),
        )
    }
}

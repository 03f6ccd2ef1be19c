use parse_display::Display;

use super::registers::Schedule;
use crate::constants::Word;

/// System call printing the Y register as a number
pub const SYSCALL_PRINT_Y: Word = 0x01;

/// System call printing the string starting at address Y
pub const SYSCALL_PRINT_AT_Y: Word = 0x02;

/// System call printing the string starting at the operand address
pub const SYSCALL_PRINT_AT_OPERAND: Word = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Opcode {
    /// Stop the clock
    #[display("BRK")]
    Halt,

    /// No-op
    #[display("NOP")]
    Nop,

    /// Load the accumulator with a constant
    #[display("LDA #")]
    LoadAccImmediate,

    /// Load X with a constant
    #[display("LDX #")]
    LoadXImmediate,

    /// Load Y with a constant
    #[display("LDY #")]
    LoadYImmediate,

    /// Copy X to the accumulator
    #[display("TXA")]
    TransferXToAcc,

    /// Copy Y to the accumulator
    #[display("TYA")]
    TransferYToAcc,

    /// Copy the accumulator to X
    #[display("TAX")]
    TransferAccToX,

    /// Copy the accumulator to Y
    #[display("TAY")]
    TransferAccToY,

    /// Load the accumulator from memory
    #[display("LDA")]
    LoadAcc,

    /// Load X from memory
    #[display("LDX")]
    LoadX,

    /// Load Y from memory
    #[display("LDY")]
    LoadY,

    /// Store the accumulator in memory
    #[display("STA")]
    StoreAcc,

    /// Add a memory cell to the accumulator
    #[display("ADC")]
    AddWithCarry,

    /// Increment a memory cell
    #[display("INC")]
    Increment,

    /// Compare a memory cell with X, setting the zero flag
    #[display("CPX")]
    CompareX,

    /// Relative branch when the zero flag is clear
    #[display("BNE")]
    BranchNotEqual,

    /// System call, selected by X
    #[display("SYS")]
    SystemCall,
}

impl Opcode {
    /// Decode an instruction register value
    #[must_use]
    pub const fn decode(code: Word) -> Option<Self> {
        let opcode = match code {
            0x00 => Self::Halt,
            0xEA => Self::Nop,
            0xA9 => Self::LoadAccImmediate,
            0xA2 => Self::LoadXImmediate,
            0xA0 => Self::LoadYImmediate,
            0x8A => Self::TransferXToAcc,
            0x98 => Self::TransferYToAcc,
            0xAA => Self::TransferAccToX,
            0xA8 => Self::TransferAccToY,
            0xAD => Self::LoadAcc,
            0xAE => Self::LoadX,
            0xAC => Self::LoadY,
            0x8D => Self::StoreAcc,
            0x6D => Self::AddWithCarry,
            0xEE => Self::Increment,
            0xEC => Self::CompareX,
            0xD0 => Self::BranchNotEqual,
            0xFF => Self::SystemCall,
            _ => return None,
        };
        Some(opcode)
    }

    #[must_use]
    pub const fn code(self) -> Word {
        match self {
            Self::Halt => 0x00,
            Self::Nop => 0xEA,
            Self::LoadAccImmediate => 0xA9,
            Self::LoadXImmediate => 0xA2,
            Self::LoadYImmediate => 0xA0,
            Self::TransferXToAcc => 0x8A,
            Self::TransferYToAcc => 0x98,
            Self::TransferAccToX => 0xAA,
            Self::TransferAccToY => 0xA8,
            Self::LoadAcc => 0xAD,
            Self::LoadX => 0xAE,
            Self::LoadY => 0xAC,
            Self::StoreAcc => 0x8D,
            Self::AddWithCarry => 0x6D,
            Self::Increment => 0xEE,
            Self::CompareX => 0xEC,
            Self::BranchNotEqual => 0xD0,
            Self::SystemCall => 0xFF,
        }
    }

    /// Number of operand bytes following the opcode.
    ///
    /// The system call depends on the X register, so it is given here.
    #[must_use]
    pub const fn operand_len(self, x: Word) -> u8 {
        match self {
            Self::Halt
            | Self::Nop
            | Self::TransferXToAcc
            | Self::TransferYToAcc
            | Self::TransferAccToX
            | Self::TransferAccToY => 0,
            Self::LoadAccImmediate
            | Self::LoadXImmediate
            | Self::LoadYImmediate
            | Self::BranchNotEqual => 1,
            Self::LoadAcc
            | Self::LoadX
            | Self::LoadY
            | Self::StoreAcc
            | Self::AddWithCarry
            | Self::Increment
            | Self::CompareX => 2,
            Self::SystemCall => {
                if x == SYSCALL_PRINT_AT_OPERAND {
                    2
                } else {
                    0
                }
            }
        }
    }

    /// Phases to run after the first decode tick
    #[must_use]
    pub fn schedule(self, x: Word) -> Schedule {
        let tail = Schedule::WRITE_BACK | Schedule::INTERRUPT_CHECK;
        let decode = if self.operand_len(x) == 2 {
            Schedule::DECODE2
        } else {
            Schedule::empty()
        };
        let execute = match self {
            // Those are done by the time decoding is over
            Self::Halt
            | Self::Nop
            | Self::LoadAccImmediate
            | Self::LoadXImmediate
            | Self::LoadYImmediate => Schedule::empty(),
            // Load, then increment
            Self::Increment => Schedule::EXECUTE1 | Schedule::EXECUTE2,
            _ => Schedule::EXECUTE1,
        };
        decode | execute | tail
    }
}

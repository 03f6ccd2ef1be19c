use thiserror::Error;

use super::memory::MemoryError;
use crate::constants::Word;

/// Conditions reported by the CPU while running an instruction.
///
/// None of them stop the machine: the faulting micro-step is skipped, the
/// fault is reported, and the next pulse proceeds normally.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("invalid memory access ({0})")]
    Memory(#[from] MemoryError),

    #[error("signed overflow adding {lhs:#04X} and {rhs:#04X}")]
    ArithmeticOverflow { lhs: Word, rhs: Word },

    #[error("unknown opcode {0:#04X}")]
    UnknownOpcode(Word),

    #[error("unknown system call {0:#04X}")]
    UnknownSystemCall(Word),

    #[error("invalid schedule state {0:#010b}")]
    InvalidScheduleState(u8),
}

impl Fault {
    /// Short name of the fault kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Fault::Memory(MemoryError::AddressOutOfRange(_)) => "AddressOutOfRange",
            Fault::Memory(MemoryError::WordOverflow(_)) => "WordOverflow",
            Fault::Memory(MemoryError::EmptyDataRegister) => "EmptyDataRegister",
            Fault::ArithmeticOverflow { .. } => "ArithmeticOverflow",
            Fault::UnknownOpcode(_) => "UnknownOpcode",
            Fault::UnknownSystemCall(_) => "UnknownSystemCall",
            Fault::InvalidScheduleState(_) => "InvalidScheduleState",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_test() {
        let fault: Fault = MemoryError::AddressOutOfRange(0x1_0000).into();
        assert_eq!(fault.kind(), "AddressOutOfRange");
        assert_eq!(
            Fault::ArithmeticOverflow { lhs: 0x7F, rhs: 1 }.kind(),
            "ArithmeticOverflow"
        );
    }

    #[test]
    fn display_test() {
        assert_eq!(
            Fault::ArithmeticOverflow { lhs: 0x7F, rhs: 0x01 }.to_string(),
            "signed overflow adding 0x7F and 0x01"
        );
        assert_eq!(
            Fault::UnknownOpcode(0x42).to_string(),
            "unknown opcode 0x42"
        );
        assert_eq!(
            Fault::Memory(MemoryError::WordOverflow(0x100)).to_string(),
            "invalid memory access (value 0x100 does not fit in a memory word)"
        );
    }
}

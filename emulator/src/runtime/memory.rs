use thiserror::Error;

use super::clock::ClockListener;
use super::hardware::Hardware;
use crate::constants::{BusAddress, BusWord, Word, MAX_ADDRESS, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The address register points outside of the address space
    #[error("address {0:#06X} is out of range")]
    AddressOutOfRange(BusAddress),

    /// The data register holds a value that does not fit in a cell
    #[error("value {0:#X} does not fit in a memory word")]
    WordOverflow(BusWord),

    /// The data register holds no value, after a failed read
    #[error("data register is empty")]
    EmptyDataRegister,
}

/// The two registers mediating every access to the memory cells
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegisters {
    /// Memory address register
    pub mar: BusAddress,

    /// Memory data register.
    ///
    /// This is `None` after a failed read.
    pub mdr: Option<BusWord>,
}

/// Holds the memory cells of the computer.
///
/// It has 65536 cells, all starting at zero. Cells are only ever accessed
/// through the address and data registers: set the address, then either
/// [`read`](Memory::read) into the data register or [`write`](Memory::write)
/// the data register out.
pub struct Memory {
    hardware: Hardware,
    registers: MemoryRegisters,
    inner: Box<[Word]>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Memory {{ registers: {:?}, cells: [...] }}",
            self.registers
        )
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Memory {
    #[must_use]
    pub fn new(debug: bool) -> Self {
        let memory = Self {
            hardware: Hardware::new(0, "RAM").with_debug(debug),
            registers: MemoryRegisters::default(),
            inner: vec![0; MEMORY_SIZE].into_boxed_slice(),
        };
        memory.hardware.log(format_args!("created - Addressable space : {MEMORY_SIZE}"));
        memory
    }

    #[must_use]
    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    #[must_use]
    pub fn registers(&self) -> MemoryRegisters {
        self.registers
    }

    #[must_use]
    pub fn address_register(&self) -> BusAddress {
        self.registers.mar
    }

    pub fn set_address_register(&mut self, address: BusAddress) {
        self.registers.mar = address;
    }

    #[must_use]
    pub fn data_register(&self) -> Option<BusWord> {
        self.registers.mdr
    }

    pub fn set_data_register(&mut self, word: BusWord) {
        self.registers.mdr = Some(word);
    }

    fn index(&self) -> Result<usize, MemoryError> {
        let address = self.registers.mar;
        if address > MAX_ADDRESS {
            return Err(MemoryError::AddressOutOfRange(address));
        }

        usize::try_from(address).map_err(|_| MemoryError::AddressOutOfRange(address))
    }

    /// Load the cell pointed by the address register into the data register
    ///
    /// # Errors
    ///
    /// Fails if the address register is out of range. The data register is
    /// cleared in that case.
    pub fn read(&mut self) -> Result<Word, MemoryError> {
        match self.index() {
            Ok(index) => {
                let word = self.inner[index];
                self.registers.mdr = Some(word.into());
                Ok(word)
            }
            Err(e) => {
                self.registers.mdr = None;
                self.hardware.report(&e);
                Err(e)
            }
        }
    }

    /// Store the data register in the cell pointed by the address register
    ///
    /// # Errors
    ///
    /// Fails if the address register is out of range or if the data register
    /// does not hold a valid word. Memory is left untouched in both cases.
    pub fn write(&mut self) -> Result<(), MemoryError> {
        let result = self.index().and_then(|index| {
            let data = self.registers.mdr.ok_or(MemoryError::EmptyDataRegister)?;
            let word = Word::try_from(data).map_err(|_| MemoryError::WordOverflow(data))?;
            self.inner[index] = word;
            Ok(())
        });

        if let Err(e) = &result {
            self.hardware.report(e);
        }

        result
    }

    /// Zero every cell
    pub fn reset(&mut self) {
        self.inner.fill(0);
        self.hardware.log("memory reset");
    }

    /// Direct view on the cells, for inspection purposes only
    #[must_use]
    pub fn cells(&self) -> &[Word] {
        &self.inner
    }
}

impl ClockListener for Memory {
    fn pulse(&mut self) {
        self.hardware.log("received clock pulse");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_WORD;

    fn write_at(
        memory: &mut Memory,
        address: BusAddress,
        word: BusWord,
    ) -> Result<(), MemoryError> {
        memory.set_address_register(address);
        memory.set_data_register(word);
        memory.write()
    }

    fn read_at(memory: &mut Memory, address: BusAddress) -> Result<Word, MemoryError> {
        memory.set_address_register(address);
        memory.read()
    }

    #[test]
    fn starts_zeroed_test() {
        let memory = Memory::default();
        assert_eq!(memory.cells().len(), MEMORY_SIZE);
        assert!(memory.cells().iter().all(|&c| c == 0));
        assert_eq!(memory.registers(), MemoryRegisters::default());
    }

    #[test]
    fn write_then_read_test() {
        let mut memory = Memory::default();
        for (address, word) in [(0x0000, 0x00), (0x0040, 0x2A), (0x8000, 0x80), (0xFFFF, 0xFF)] {
            write_at(&mut memory, address, word).unwrap();
            assert_eq!(read_at(&mut memory, address), Ok(Word::try_from(word).unwrap()));
            assert_eq!(memory.data_register(), Some(word));
        }
    }

    #[test]
    fn every_word_round_trips_test() {
        let mut memory = Memory::default();
        for word in 0..=MAX_WORD {
            write_at(&mut memory, 0x1234, word).unwrap();
            assert_eq!(memory.data_register(), Some(word));
            memory.set_data_register(0);
            assert_eq!(u16::from(read_at(&mut memory, 0x1234).unwrap()), word);
        }
    }

    #[test]
    fn out_of_range_address_test() {
        let mut memory = Memory::default();
        let before = memory.cells().to_vec();

        assert_eq!(
            write_at(&mut memory, 0x1_0000, 0x12),
            Err(MemoryError::AddressOutOfRange(0x1_0000))
        );
        assert_eq!(
            read_at(&mut memory, 0x1_0000),
            Err(MemoryError::AddressOutOfRange(0x1_0000))
        );
        assert_eq!(memory.data_register(), None);

        assert_eq!(
            read_at(&mut memory, BusAddress::MAX),
            Err(MemoryError::AddressOutOfRange(BusAddress::MAX))
        );
        assert_eq!(memory.cells(), before.as_slice());
    }

    #[test]
    fn word_overflow_test() {
        let mut memory = Memory::default();
        write_at(&mut memory, 0x0010, 0x42).unwrap();

        for word in [0x100, 0x1FF, BusWord::MAX] {
            assert_eq!(
                write_at(&mut memory, 0x0010, word),
                Err(MemoryError::WordOverflow(word))
            );
            assert_eq!(read_at(&mut memory, 0x0010), Ok(0x42));
        }
    }

    #[test]
    fn empty_data_register_test() {
        let mut memory = Memory::default();
        write_at(&mut memory, 0x0010, 0x42).unwrap();

        // A failed read leaves nothing to write
        assert!(read_at(&mut memory, 0x1_0000).is_err());
        memory.set_address_register(0x0010);
        assert_eq!(memory.write(), Err(MemoryError::EmptyDataRegister));
        assert_eq!(memory.cells()[0x0010], 0x42);
    }

    #[test]
    fn single_cell_side_effect_test() {
        let mut memory = Memory::default();
        write_at(&mut memory, 0x0100, 0x99).unwrap();
        let touched: Vec<_> = memory
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != 0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(touched, vec![0x0100]);
    }

    #[test]
    fn reset_test() {
        let mut memory = Memory::default();
        write_at(&mut memory, 0x0000, 0x01).unwrap();
        write_at(&mut memory, 0xFFFF, 0xFF).unwrap();

        memory.reset();
        assert!(memory.cells().iter().all(|&c| c == 0));

        memory.reset();
        assert!(memory.cells().iter().all(|&c| c == 0));
    }
}

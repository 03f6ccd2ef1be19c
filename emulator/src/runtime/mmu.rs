use std::cell::RefCell;
use std::rc::Rc;

use super::hardware::Hardware;
use super::memory::{Memory, MemoryError};
use crate::constants::{Address, BusAddress, BusWord, Word, MAX_ADDRESS};
use crate::util::{hex_address, hex_word};

/// Which half of a two-byte address is being set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressHalf {
    /// Bits 8 to 15
    High,

    /// Bits 0 to 7
    Low,
}

/// Mediates every access from the CPU to the memory.
///
/// The MMU holds no state of its own: it translates addressing requests into
/// operations on the memory address and data registers.
#[derive(Debug)]
pub struct Mmu {
    hardware: Hardware,
    memory: Rc<RefCell<Memory>>,
}

impl Mmu {
    #[must_use]
    pub fn new(memory: Rc<RefCell<Memory>>, debug: bool) -> Self {
        let hardware = Hardware::new(0, "MMU").with_debug(debug);
        hardware.log("created");
        Self { hardware, memory }
    }

    #[must_use]
    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    /// The memory this MMU is in front of
    #[must_use]
    pub fn memory(&self) -> &Rc<RefCell<Memory>> {
        &self.memory
    }

    /// Set the whole memory address register
    pub fn set_address(&self, address: BusAddress) {
        self.memory.borrow_mut().set_address_register(address);
    }

    /// Set one half of the memory address register, keeping the other half
    pub fn set_address_byte(&self, byte: Word, half: AddressHalf) {
        let mut memory = self.memory.borrow_mut();
        let current = memory.address_register();
        let byte = BusAddress::from(byte);
        let address = match half {
            AddressHalf::High => (byte << 8) | (current & 0x00FF),
            AddressHalf::Low => byte | (current & 0xFF00),
        };
        memory.set_address_register(address);
    }

    /// Read the cell at the address previously set
    ///
    /// # Errors
    ///
    /// Fails if the address register is out of range
    pub fn read(&self) -> Result<Word, MemoryError> {
        self.memory.borrow_mut().read()
    }

    /// Write a word at the address previously set
    ///
    /// # Errors
    ///
    /// Fails if the address register is out of range
    pub fn write(&self, word: Word) -> Result<(), MemoryError> {
        self.write_raw(word.into())
    }

    /// Write an unchecked value at the address previously set
    ///
    /// # Errors
    ///
    /// Fails if the address register is out of range or if `word` does not
    /// fit in a memory cell
    pub fn write_raw(&self, word: BusWord) -> Result<(), MemoryError> {
        let mut memory = self.memory.borrow_mut();
        memory.set_data_register(word);
        memory.write()
    }

    /// Set the address, then write a word there, outside of any instruction
    /// cycle. Used to flash programs at boot time.
    ///
    /// # Errors
    ///
    /// Fails if the address is out of range
    pub fn write_immediate(&self, address: Address, word: Word) -> Result<(), MemoryError> {
        self.set_address(address.into());
        self.write(word)
    }

    /// Read every cell in `[from, to]`, logging them as a table.
    ///
    /// Nothing is read if either bound is out of range.
    ///
    /// # Errors
    ///
    /// Fails if one of the bounds is out of range
    pub fn memory_dump(
        &self,
        from: BusAddress,
        to: BusAddress,
    ) -> Result<Vec<(Address, Word)>, MemoryError> {
        for bound in [from, to] {
            if bound > MAX_ADDRESS {
                let error = MemoryError::AddressOutOfRange(bound);
                self.hardware.report(&error);
                return Err(error);
            }
        }

        self.hardware.log("Memory Dump: Debug");
        self.hardware.log("------------------------------------");
        let mut cells = Vec::new();
        for address in from..=to {
            self.set_address(address);
            let word = self.read()?;
            let address = Address::try_from(address)
                .map_err(|_| MemoryError::AddressOutOfRange(address))?;
            self.hardware.log(format_args!(
                "Addr {}  |  {}",
                hex_address(address),
                hex_word(word)
            ));
            cells.push((address, word));
        }
        self.hardware.log("------------------------------------");
        self.hardware.log("Memory Dump: Complete");

        Ok(cells)
    }
}

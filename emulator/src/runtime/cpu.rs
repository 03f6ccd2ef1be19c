use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use super::clock::{ClockListener, StopHandle};
use super::exception::Fault;
use super::hardware::Hardware;
use super::instructions::{
    Opcode, SYSCALL_PRINT_AT_OPERAND, SYSCALL_PRINT_AT_Y, SYSCALL_PRINT_Y,
};
use super::interrupt::InterruptController;
use super::mmu::{AddressHalf, Mmu};
use super::registers::{NextPhase, Phase, Registers, Schedule};
use crate::constants::{Address, Word, MEMORY_SIZE};
use crate::util::{hex_address, hex_word};

type Result<T> = std::result::Result<T, Fault>;

/// Add two words, failing on signed overflow
fn signed_add(lhs: Word, rhs: Word) -> Result<Word> {
    i8::from_ne_bytes([lhs])
        .checked_add(i8::from_ne_bytes([rhs]))
        .map(|sum| sum.to_ne_bytes()[0])
        .ok_or(Fault::ArithmeticOverflow { lhs, rhs })
}

/// Offset `pc` by a two's-complement byte
fn branch_target(pc: Address, offset: Word) -> Address {
    pc.wrapping_add_signed(i16::from(i8::from_ne_bytes([offset])))
}

/// The processor.
///
/// Each clock pulse advances the current instruction by exactly one phase:
/// fetch, decode (one or two pulses), execute (zero to two pulses),
/// write-back, then interrupt check.
pub struct Cpu {
    hardware: Hardware,
    registers: Registers,
    mmu: Mmu,
    interrupts: Option<Rc<RefCell<InterruptController>>>,
    halt: Option<StopHandle>,
    console: Box<dyn Write>,

    /// Opcode decoded for the current instruction, if it was a known one
    current: Option<Opcode>,

    /// Value loaded by the first execute step, for two-step instructions
    loaded: Word,

    /// Value committed to memory on write-back
    staged: Option<Word>,

    clock_count: u64,
    halted: bool,
    last_fault: Option<Fault>,
    fault_count: u64,
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("registers", &self.registers)
            .field("current", &self.current)
            .field("staged", &self.staged)
            .field("clock_count", &self.clock_count)
            .field("halted", &self.halted)
            .field("last_fault", &self.last_fault)
            .finish_non_exhaustive()
    }
}

impl Cpu {
    #[must_use]
    pub fn new(mmu: Mmu, debug: bool) -> Self {
        let hardware = Hardware::new(0, "CPU").with_debug(debug);
        hardware.log("created");
        Self {
            hardware,
            registers: Registers::default(),
            mmu,
            interrupts: None,
            halt: None,
            console: Box::new(std::io::stdout()),
            current: None,
            loaded: 0,
            staged: None,
            clock_count: 0,
            halted: false,
            last_fault: None,
            fault_count: 0,
        }
    }

    /// Poll `controller` during the interrupt check phase
    pub fn attach_interrupts(&mut self, controller: Rc<RefCell<InterruptController>>) {
        self.interrupts = Some(controller);
    }

    /// Stop this handle when a halt instruction is decoded
    pub fn attach_halt(&mut self, handle: StopHandle) {
        self.halt = Some(handle);
    }

    /// Where system calls print
    pub fn set_console(&mut self, console: Box<dyn Write>) {
        self.console = console;
    }

    #[must_use]
    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    #[must_use]
    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    /// Number of pulses received
    #[must_use]
    pub fn clock_count(&self) -> u64 {
        self.clock_count
    }

    /// Whether a halt instruction was decoded
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }

    #[must_use]
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    /// The phase the next pulse will run
    #[must_use]
    pub fn next_phase(&self) -> NextPhase {
        self.registers.schedule.next_phase()
    }

    /// Put every register back to zero. Memory is left untouched.
    pub fn reset(&mut self) {
        self.registers = Registers::default();
        self.current = None;
        self.loaded = 0;
        self.staged = None;
        self.halted = false;
        self.last_fault = None;
        self.fault_count = 0;
        self.hardware.log("reset");
    }

    fn fault(&mut self, fault: Fault) {
        self.hardware.report(&fault);
        self.last_fault = Some(fault);
        self.fault_count += 1;
    }

    fn run_phase(&mut self, phase: Phase) -> Result<()> {
        match phase {
            Phase::Fetch => self.fetch(),
            Phase::Decode1 => self.decode1(),
            Phase::Decode2 => self.decode2(),
            Phase::Execute1 => self.execute1(),
            Phase::Execute2 => self.execute2(),
            Phase::WriteBack => self.write_back(),
            Phase::InterruptCheck => {
                self.interrupt_check();
                Ok(())
            }
        }
    }

    /// Read the byte at `pc`, then move `pc` past it
    fn next_byte(&mut self) -> Result<Word> {
        self.mmu.set_address(self.registers.pc.into());
        let word = self.mmu.read()?;
        self.registers.pc = self.registers.pc.wrapping_add(1);
        Ok(word)
    }

    /// Point the address register at the operand address, one half at a time
    fn address_operand(&self) {
        self.mmu
            .set_address_byte(self.registers.operand_high, AddressHalf::High);
        self.mmu
            .set_address_byte(self.registers.operand_low, AddressHalf::Low);
    }

    fn read_operand(&self) -> Result<Word> {
        self.address_operand();
        Ok(self.mmu.read()?)
    }

    fn fetch(&mut self) -> Result<()> {
        let pc = self.registers.pc;
        self.registers.ir = self.next_byte()?;
        self.registers.schedule = Schedule::DECODE1;
        self.hardware.log(format_args!(
            "fetch - {} at {}",
            hex_word(self.registers.ir),
            hex_address(pc)
        ));
        Ok(())
    }

    fn decode1(&mut self) -> Result<()> {
        let code = self.registers.ir;
        let Some(opcode) = Opcode::decode(code) else {
            // Treated as a no-op: the cycle still goes through write-back
            // and interrupt check
            self.current = None;
            self.registers.schedule = Schedule::WRITE_BACK | Schedule::INTERRUPT_CHECK;
            return Err(Fault::UnknownOpcode(code));
        };

        let x = self.registers.x;
        self.current = Some(opcode);
        self.staged = None;
        self.registers.schedule = opcode.schedule(x);
        self.hardware.log(format_args!("decode - {opcode}"));

        if opcode.operand_len(x) > 0 {
            self.registers.operand_low = self.next_byte()?;
        }

        match opcode {
            Opcode::Halt => self.halt(),
            Opcode::LoadAccImmediate => self.registers.acc = self.registers.operand_low,
            Opcode::LoadXImmediate => self.registers.x = self.registers.operand_low,
            Opcode::LoadYImmediate => self.registers.y = self.registers.operand_low,
            _ => {}
        }

        Ok(())
    }

    fn decode2(&mut self) -> Result<()> {
        self.registers.operand_high = self.next_byte()?;
        self.hardware.log(format_args!(
            "decode - operand {}",
            hex_address(self.registers.operand_address())
        ));
        Ok(())
    }

    fn execute1(&mut self) -> Result<()> {
        let Some(opcode) = self.current else {
            return Ok(());
        };

        match opcode {
            Opcode::TransferXToAcc => self.registers.acc = self.registers.x,
            Opcode::TransferYToAcc => self.registers.acc = self.registers.y,
            Opcode::TransferAccToX => self.registers.x = self.registers.acc,
            Opcode::TransferAccToY => self.registers.y = self.registers.acc,
            Opcode::LoadAcc => self.registers.acc = self.read_operand()?,
            Opcode::LoadX => self.registers.x = self.read_operand()?,
            Opcode::LoadY => self.registers.y = self.read_operand()?,
            Opcode::StoreAcc => self.staged = Some(self.registers.acc),
            Opcode::AddWithCarry => {
                let value = self.read_operand()?;
                self.registers.acc = signed_add(self.registers.acc, value)?;
            }
            Opcode::Increment => self.loaded = self.read_operand()?,
            Opcode::CompareX => {
                let value = self.read_operand()?;
                self.registers.zero = self.registers.x == value;
            }
            Opcode::BranchNotEqual => {
                if !self.registers.zero {
                    let target = branch_target(self.registers.pc, self.registers.operand_low);
                    self.hardware
                        .log(format_args!("branching to {}", hex_address(target)));
                    self.registers.pc = target;
                }
            }
            Opcode::SystemCall => self.system_call()?,
            Opcode::Halt
            | Opcode::Nop
            | Opcode::LoadAccImmediate
            | Opcode::LoadXImmediate
            | Opcode::LoadYImmediate => {}
        }

        self.hardware.log(format_args!("execute - {opcode}"));
        Ok(())
    }

    fn execute2(&mut self) -> Result<()> {
        if self.current == Some(Opcode::Increment) {
            // Nothing is staged on overflow, so the cell keeps its value
            self.staged = Some(signed_add(self.loaded, 1)?);
        }

        Ok(())
    }

    fn write_back(&mut self) -> Result<()> {
        if let Some(word) = self.staged.take() {
            // The address register may have moved since execute
            self.address_operand();
            self.mmu.write(word)?;
        }

        self.hardware
            .log(format_args!("write back - {}", self.registers));
        Ok(())
    }

    fn interrupt_check(&mut self) {
        let Some(controller) = &self.interrupts else {
            return;
        };

        let pending = controller.borrow().has_pending_interrupt();
        let Some(priority) = pending else {
            return;
        };
        self.hardware
            .log(format_args!("interrupt pending with priority {priority}"));

        let mut controller = controller.borrow_mut();
        if let Some(request) = controller.dequeue_interrupt() {
            controller.service(&request);
        }
    }

    fn halt(&mut self) {
        self.hardware.log("halt instruction, stopping the clock");
        self.halted = true;
        if let Some(handle) = &self.halt {
            handle.stop();
        }
    }

    fn system_call(&mut self) -> Result<()> {
        let registers = &self.registers;
        let text = match registers.x {
            SYSCALL_PRINT_Y => registers.y.to_string(),
            SYSCALL_PRINT_AT_Y => self.read_string(Address::from(registers.y))?,
            SYSCALL_PRINT_AT_OPERAND => self.read_string(registers.operand_address())?,
            other => return Err(Fault::UnknownSystemCall(other)),
        };

        if let Err(e) = self
            .console
            .write_all(text.as_bytes())
            .and_then(|()| self.console.flush())
        {
            self.hardware.report(&e);
        }

        Ok(())
    }

    /// Read a zero-terminated string
    fn read_string(&self, start: Address) -> Result<String> {
        let mut text = String::new();
        let mut address = start;
        for _ in 0..MEMORY_SIZE {
            self.mmu.set_address(address.into());
            let word = self.mmu.read()?;
            if word == 0 {
                break;
            }
            text.push(char::from(word));
            address = address.wrapping_add(1);
        }
        Ok(text)
    }
}

impl ClockListener for Cpu {
    #[tracing::instrument(skip(self), level = "trace")]
    fn pulse(&mut self) {
        self.clock_count += 1;
        self.hardware.log(format_args!(
            "received clock pulse - CPU Clock Count: {}",
            self.clock_count
        ));

        match self.registers.schedule.next_phase() {
            NextPhase::Run(phase) => {
                self.registers.schedule.remove(phase.flag());
                if let Err(fault) = self.run_phase(phase) {
                    self.fault(fault);
                }
            }
            NextPhase::Invalid(bits) => {
                self.fault(Fault::InvalidScheduleState(bits));
                self.registers.schedule = Schedule::empty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::memory::Memory;
    use pretty_assertions::assert_eq;

    fn cpu_with(program: &[(Address, Word)]) -> Cpu {
        let memory = Rc::new(RefCell::new(Memory::default()));
        let mmu = Mmu::new(memory, false);
        for &(address, word) in program {
            mmu.write_immediate(address, word).unwrap();
        }
        Cpu::new(mmu, false)
    }

    fn cpu_with_bytes(bytes: &[Word]) -> Cpu {
        let program: Vec<_> = (0..).zip(bytes.iter().copied()).collect();
        cpu_with(&program)
    }

    fn pulse(cpu: &mut Cpu, count: usize) {
        for _ in 0..count {
            cpu.pulse();
        }
    }

    fn cell(cpu: &Cpu, address: Address) -> Word {
        cpu.mmu().memory().borrow().cells()[usize::from(address)]
    }

    #[test]
    fn signed_add_test() {
        assert_eq!(signed_add(0x01, 0x02), Ok(0x03));
        assert_eq!(signed_add(0xFF, 0x01), Ok(0x00));
        assert_eq!(signed_add(0x80, 0x7F), Ok(0xFF));
        assert_eq!(
            signed_add(0x7F, 0x01),
            Err(Fault::ArithmeticOverflow { lhs: 0x7F, rhs: 0x01 })
        );
        assert_eq!(
            signed_add(0x80, 0xFF),
            Err(Fault::ArithmeticOverflow { lhs: 0x80, rhs: 0xFF })
        );
    }

    #[test]
    fn branch_target_test() {
        assert_eq!(branch_target(0x0010, 0x02), 0x0012);
        assert_eq!(branch_target(0x0010, 0xFE), 0x000E);
        assert_eq!(branch_target(0x0000, 0xFF), 0xFFFF);
        assert_eq!(branch_target(0x002F, 0xD6), 0x0005);
    }

    #[test]
    fn fetch_test() {
        let mut cpu = cpu_with_bytes(&[0xEA]);
        cpu.pulse();
        assert_eq!(cpu.registers().ir, 0xEA);
        assert_eq!(cpu.registers().pc, 1);
        assert_eq!(cpu.registers().schedule, Schedule::DECODE1);
        assert_eq!(cpu.next_phase(), NextPhase::Run(Phase::Decode1));
    }

    #[test]
    fn load_immediate_cycle_test() {
        let mut cpu = cpu_with_bytes(&[0xA9, 0x2A]);

        let mut phases = Vec::new();
        for _ in 0..4 {
            if let NextPhase::Run(phase) = cpu.next_phase() {
                phases.push(phase);
            }
            cpu.pulse();
        }
        assert_eq!(
            phases,
            vec![Phase::Fetch, Phase::Decode1, Phase::WriteBack, Phase::InterruptCheck]
        );
        assert_eq!(cpu.registers().acc, 0x2A);
        assert_eq!(cpu.registers().pc, 2);
        assert_eq!(cpu.registers().schedule, Schedule::empty());

        // The next pulse fetches the following instruction
        cpu.pulse();
        assert_eq!(cpu.registers().acc, 0x2A);
        assert_eq!(cpu.registers().pc, 3);
        assert_eq!(cpu.last_fault(), None);
        // Write-back left the program alone
        assert_eq!(cell(&cpu, 1), 0x2A);
    }

    #[test]
    fn load_xy_immediate_test() {
        let mut cpu = cpu_with_bytes(&[0xA2, 0x11, 0xA0, 0x22]);
        pulse(&mut cpu, 8);
        assert_eq!(cpu.registers().x, 0x11);
        assert_eq!(cpu.registers().y, 0x22);
        assert_eq!(cpu.registers().acc, 0x00);
        // Operands are not overwritten by write-back
        assert_eq!(cell(&cpu, 1), 0x11);
        assert_eq!(cell(&cpu, 3), 0x22);
    }

    #[test]
    fn transfers_test() {
        // LDX #5, TXA, LDY #9, TAX (x = 5), TYA, TAY
        let mut cpu = cpu_with_bytes(&[0xA2, 0x05, 0x8A, 0xA0, 0x09, 0xAA, 0x98, 0xA8]);
        pulse(&mut cpu, 4 + 5);
        assert_eq!(cpu.registers().acc, 0x05);

        pulse(&mut cpu, 4 + 5);
        assert_eq!(cpu.registers().y, 0x09);
        assert_eq!(cpu.registers().x, 0x05);

        pulse(&mut cpu, 5);
        assert_eq!(cpu.registers().acc, 0x09);

        pulse(&mut cpu, 5);
        assert_eq!(cpu.registers().y, 0x09);
        assert_eq!(cpu.registers().x, 0x05);
    }

    #[test]
    fn load_absolute_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xAD),
            (0x0001, 0x40),
            (0x0002, 0x12),
            (0x0003, 0xAE),
            (0x0004, 0x41),
            (0x0005, 0x12),
            (0x0006, 0xAC),
            (0x0007, 0x42),
            (0x0008, 0x12),
            (0x1240, 0x0A),
            (0x1241, 0x0B),
            (0x1242, 0x0C),
        ]);

        // fetch, decode1, decode2, execute1, write-back, interrupt check
        pulse(&mut cpu, 6 * 3);
        assert_eq!(cpu.registers().acc, 0x0A);
        assert_eq!(cpu.registers().x, 0x0B);
        assert_eq!(cpu.registers().y, 0x0C);
        assert_eq!(cpu.registers().pc, 9);
        assert_eq!(cpu.registers().operand_address(), 0x1242);
    }

    #[test]
    fn store_test() {
        let mut cpu = cpu_with_bytes(&[0xA9, 0x2A, 0x8D, 0x40, 0x00]);
        pulse(&mut cpu, 4);

        // Nothing is written before write-back
        pulse(&mut cpu, 4);
        assert_eq!(cpu.next_phase(), NextPhase::Run(Phase::WriteBack));
        assert_eq!(cell(&cpu, 0x0040), 0x00);

        pulse(&mut cpu, 1);
        assert_eq!(cell(&cpu, 0x0040), 0x2A);
        pulse(&mut cpu, 1);
        assert_eq!(cpu.registers().schedule, Schedule::empty());
    }

    #[test]
    fn add_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xA9),
            (0x0001, 0x05),
            (0x0002, 0x6D),
            (0x0003, 0x40),
            (0x0004, 0x00),
            (0x0040, 0x03),
        ]);
        pulse(&mut cpu, 4 + 6);
        assert_eq!(cpu.registers().acc, 0x08);
        assert_eq!(cpu.last_fault(), None);
        // The operand is not written back
        assert_eq!(cell(&cpu, 0x0040), 0x03);
    }

    #[test]
    fn add_overflow_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xA9),
            (0x0001, 0x7F),
            (0x0002, 0x6D),
            (0x0003, 0x40),
            (0x0004, 0x00),
            (0x0040, 0x01),
        ]);
        pulse(&mut cpu, 4 + 6);
        assert_eq!(cpu.registers().acc, 0x7F);
        assert_eq!(
            cpu.last_fault(),
            Some(Fault::ArithmeticOverflow { lhs: 0x7F, rhs: 0x01 })
        );
        assert_eq!(cpu.last_fault().unwrap().kind(), "ArithmeticOverflow");
        // The cycle carried on
        assert_eq!(cpu.registers().schedule, Schedule::empty());
        assert_eq!(cpu.registers().pc, 5);
    }

    #[test]
    fn increment_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xEE),
            (0x0001, 0x40),
            (0x0002, 0x00),
            (0x0040, 0x41),
        ]);

        // fetch, decode1, decode2, execute1
        pulse(&mut cpu, 4);
        assert_eq!(cpu.next_phase(), NextPhase::Run(Phase::Execute2));
        pulse(&mut cpu, 1);
        assert_eq!(cell(&cpu, 0x0040), 0x41);

        // Write-back commits the incremented value
        pulse(&mut cpu, 1);
        assert_eq!(cell(&cpu, 0x0040), 0x42);
        pulse(&mut cpu, 1);
        assert_eq!(cpu.registers().schedule, Schedule::empty());
        assert_eq!(cpu.registers().acc, 0x00);
        assert_eq!(cpu.last_fault(), None);
    }

    #[test]
    fn increment_overflow_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xEE),
            (0x0001, 0x40),
            (0x0002, 0x00),
            (0x0040, 0x7F),
        ]);
        pulse(&mut cpu, 7);
        assert_eq!(cell(&cpu, 0x0040), 0x7F);
        assert_eq!(
            cpu.last_fault(),
            Some(Fault::ArithmeticOverflow { lhs: 0x7F, rhs: 0x01 })
        );
    }

    #[test]
    fn increment_wraps_unsigned_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xEE),
            (0x0001, 0x40),
            (0x0002, 0x00),
            (0x0040, 0xFF),
        ]);
        pulse(&mut cpu, 7);
        assert_eq!(cell(&cpu, 0x0040), 0x00);
        assert_eq!(cpu.last_fault(), None);
    }

    #[test]
    fn compare_test() {
        let mut cpu = cpu_with(&[
            (0x0000, 0xA2),
            (0x0001, 0x07),
            (0x0002, 0xEC),
            (0x0003, 0x40),
            (0x0004, 0x00),
            (0x0005, 0xEC),
            (0x0006, 0x41),
            (0x0007, 0x00),
            (0x0040, 0x07),
            (0x0041, 0x08),
        ]);
        pulse(&mut cpu, 4 + 6);
        assert!(cpu.registers().zero);
        pulse(&mut cpu, 6);
        assert!(!cpu.registers().zero);
    }

    #[test]
    fn branch_backwards_test() {
        let mut cpu = cpu_with(&[(0x0010, 0xD0), (0x0011, 0xFE)]);
        cpu.registers_mut().pc = 0x0010;

        // fetch, decode1
        pulse(&mut cpu, 2);
        assert_eq!(cpu.registers().pc, 0x0012);
        // execute1
        pulse(&mut cpu, 1);
        assert_eq!(cpu.registers().pc, 0x0010);
    }

    #[test]
    fn branch_not_taken_test() {
        let mut cpu = cpu_with(&[(0x0000, 0xD0), (0x0001, 0x10)]);
        cpu.registers_mut().zero = true;
        pulse(&mut cpu, 5);
        assert_eq!(cpu.registers().pc, 0x0002);
    }

    #[test]
    fn halt_test() {
        let clock = crate::runtime::clock::Clock::new(std::time::Duration::ZERO, false);
        let mut cpu = cpu_with_bytes(&[0xEA, 0x00]);
        cpu.attach_halt(clock.stop_handle());

        pulse(&mut cpu, 4);
        assert!(!cpu.is_halted());
        assert!(clock.is_running());

        pulse(&mut cpu, 2);
        assert!(cpu.is_halted());
        assert!(!clock.is_running());
    }

    #[test]
    fn unknown_opcode_test() {
        let mut cpu = cpu_with_bytes(&[0x42, 0xA9, 0x01]);
        cpu.registers_mut().acc = 0x33;

        pulse(&mut cpu, 2);
        assert_eq!(cpu.last_fault(), Some(Fault::UnknownOpcode(0x42)));
        assert_eq!(cpu.registers().acc, 0x33);
        assert_eq!(cpu.registers().pc, 1);

        // The machine carries on with the next instruction
        pulse(&mut cpu, 2 + 4);
        assert_eq!(cpu.registers().acc, 0x01);
        assert_eq!(cpu.fault_count(), 1);
    }

    #[test]
    fn invalid_schedule_test() {
        let mut cpu = cpu_with_bytes(&[0xA9, 0x05]);
        cpu.registers_mut().schedule = Schedule::from_bits_retain(0b1100_0000);

        cpu.pulse();
        assert_eq!(cpu.last_fault(), Some(Fault::InvalidScheduleState(0b1100_0000)));
        assert_eq!(cpu.registers().schedule, Schedule::empty());

        // Back on track, fetching
        pulse(&mut cpu, 4);
        assert_eq!(cpu.registers().acc, 0x05);
    }

    #[derive(Clone, Default)]
    struct Console(Rc<RefCell<Vec<u8>>>);

    impl Write for Console {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn system_calls_test() {
        let mut cpu = cpu_with(&[
            // LDY #42, LDX #1, SYS
            (0x0000, 0xA0),
            (0x0001, 0x2A),
            (0x0002, 0xA2),
            (0x0003, 0x01),
            (0x0004, 0xFF),
            // LDY #50, LDX #2, SYS
            (0x0005, 0xA0),
            (0x0006, 0x50),
            (0x0007, 0xA2),
            (0x0008, 0x02),
            (0x0009, 0xFF),
            // LDX #3, SYS 0060
            (0x000A, 0xA2),
            (0x000B, 0x03),
            (0x000C, 0xFF),
            (0x000D, 0x60),
            (0x000E, 0x00),
            (0x0050, b'h'),
            (0x0051, b'i'),
            (0x0060, b'!'),
        ]);
        let console = Console::default();
        cpu.set_console(Box::new(console.clone()));

        pulse(&mut cpu, 4 + 4 + 5);
        assert_eq!(console.0.borrow().as_slice(), b"42");

        pulse(&mut cpu, 4 + 4 + 5);
        assert_eq!(console.0.borrow().as_slice(), b"42hi");

        pulse(&mut cpu, 4 + 6);
        assert_eq!(console.0.borrow().as_slice(), b"42hi!");
        assert_eq!(cpu.registers().pc, 0x000F);
        assert_eq!(cpu.last_fault(), None);
    }

    #[test]
    fn unknown_system_call_test() {
        let mut cpu = cpu_with_bytes(&[0xA2, 0x09, 0xFF]);
        pulse(&mut cpu, 4 + 3);
        assert_eq!(cpu.last_fault(), Some(Fault::UnknownSystemCall(0x09)));
    }
}

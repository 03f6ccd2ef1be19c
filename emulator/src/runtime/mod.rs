use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use parse_display::{Display, FromStr};
use tracing::debug;

use crate::constants::{Address, BusAddress, Word, CLOCK_INTERVAL_MS};
use crate::loader::Program;

mod clock;
mod cpu;
mod exception;
mod hardware;
mod instructions;
mod interrupt;
mod memory;
mod mmu;
mod registers;

pub use self::clock::{Clock, ClockListener, SharedListener, StopHandle};
pub use self::cpu::Cpu;
pub use self::exception::Fault;
pub use self::hardware::Hardware;
pub use self::instructions::{
    Opcode, SYSCALL_PRINT_AT_OPERAND, SYSCALL_PRINT_AT_Y, SYSCALL_PRINT_Y,
};
pub use self::interrupt::{
    InterruptController, InterruptDevice, InterruptLine, InterruptRequest, Priority,
};
pub use self::memory::{Memory, MemoryError, MemoryRegisters};
pub use self::mmu::{AddressHalf, Mmu};
pub use self::registers::{NextPhase, Phase, Registers, Schedule};

/// Hardware components which can have their trace output enabled
#[derive(Debug, Display, FromStr, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display(style = "lowercase")]
pub enum Component {
    Cpu,
    Memory,
    Mmu,
    Clock,
    Ic,
    System,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Cpu,
        Component::Memory,
        Component::Mmu,
        Component::Clock,
        Component::Ic,
        Component::System,
    ];
}

/// Boot parameters of a [`System`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Time between two clock pulses
    pub interval: Duration,

    /// Components with their trace output enabled
    pub debug: BTreeSet<Component>,

    /// Stop running after that many pulses
    pub max_ticks: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(CLOCK_INTERVAL_MS),
            debug: BTreeSet::new(),
            max_ticks: None,
        }
    }
}

impl SystemConfig {
    #[must_use]
    pub fn debugs(&self, component: Component) -> bool {
        self.debug.contains(&component)
    }

    /// Enable the trace output of every component
    #[must_use]
    pub fn with_all_debug(mut self) -> Self {
        self.debug.extend(Component::ALL);
        self
    }
}

/// A whole computer: memory, CPU, clock and interrupt controller, wired
/// together.
///
/// The CPU then the memory are registered on the clock, so every pulse
/// advances the CPU by one phase before memory sees it.
pub struct System {
    hardware: Hardware,
    clock: Clock,
    memory: Rc<RefCell<Memory>>,
    cpu: Rc<RefCell<Cpu>>,
    interrupts: Rc<RefCell<InterruptController>>,
    max_ticks: Option<u64>,
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("clock", &self.clock)
            .field("cpu", &self.cpu.borrow())
            .field("interrupts", &self.interrupts.borrow())
            .finish_non_exhaustive()
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new(&SystemConfig::default())
    }
}

impl System {
    #[must_use]
    pub fn new(config: &SystemConfig) -> Self {
        let hardware = Hardware::new(0, "System").with_debug(config.debugs(Component::System));
        hardware.log("created");

        let memory = Rc::new(RefCell::new(Memory::new(config.debugs(Component::Memory))));
        let mmu = Mmu::new(Rc::clone(&memory), config.debugs(Component::Mmu));
        let interrupts = Rc::new(RefCell::new(InterruptController::new(
            config.debugs(Component::Ic),
        )));
        let mut clock = Clock::new(config.interval, config.debugs(Component::Clock));

        let mut cpu = Cpu::new(mmu, config.debugs(Component::Cpu));
        cpu.attach_halt(clock.stop_handle());
        cpu.attach_interrupts(Rc::clone(&interrupts));
        let cpu = Rc::new(RefCell::new(cpu));

        clock.register(cpu.clone());
        clock.register(memory.clone());

        Self {
            hardware,
            clock,
            memory,
            cpu,
            interrupts,
            max_ticks: config.max_ticks,
        }
    }

    #[must_use]
    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    /// Flash a program into memory
    ///
    /// # Errors
    ///
    /// Fails if a cell could not be written
    pub fn load(&mut self, program: &Program) -> Result<(), MemoryError> {
        self.hardware
            .log(format_args!("loading {} bytes", program.len()));
        program.load(self.cpu.borrow().mmu())
    }

    /// Write a single cell, outside of any instruction cycle
    ///
    /// # Errors
    ///
    /// Fails if the memory refuses the write
    pub fn write_immediate(&mut self, address: Address, word: Word) -> Result<(), MemoryError> {
        self.cpu.borrow().mmu().write_immediate(address, word)
    }

    /// Add an interrupt-capable device. It only starts listening once
    /// [`System::start`] is called.
    pub fn register_device(&mut self, device: Box<dyn InterruptDevice>) {
        self.interrupts.borrow_mut().register_device(device);
    }

    /// Make every registered device listen, and allow the clock to pulse
    pub fn start(&mut self) {
        self.hardware.log("starting");
        self.interrupts.borrow_mut().start_listening();
        self.clock.start();
    }

    /// Deliver a single pulse. Returns `false` if the clock is stopped.
    pub fn step(&mut self) -> bool {
        self.clock.pulse()
    }

    /// Pulse until the current instruction completed.
    ///
    /// Returns the number of pulses delivered.
    pub fn step_instruction(&mut self) -> u64 {
        let mut delivered = 0;
        loop {
            if !self.clock.pulse() {
                break;
            }
            delivered += 1;

            if self.cpu.borrow().registers().schedule.is_empty() {
                break;
            }
        }

        debug!(pulses = delivered, "Stepped one instruction");
        delivered
    }

    /// Run the clock at its interval, until halted or the configured tick
    /// limit is reached.
    ///
    /// Returns the number of pulses delivered.
    pub fn run(&mut self) -> u64 {
        self.hardware.log("running");
        let delivered = self.clock.run(self.max_ticks);
        self.hardware
            .log(format_args!("stopped after {delivered} pulses"));
        delivered
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Handle stopping the clock, usable from another thread
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.clock.stop_handle()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Clear memory and registers, and allow the clock to pulse again
    pub fn reset(&mut self) {
        self.hardware.log("reset");
        self.cpu.borrow_mut().reset();
        self.memory.borrow_mut().reset();
        self.clock.start();
    }

    /// Dump the memory cells in `[from, to]`
    ///
    /// # Errors
    ///
    /// Fails without dumping anything if either bound is out of range
    pub fn memory_dump(
        &self,
        from: BusAddress,
        to: BusAddress,
    ) -> Result<Vec<(Address, Word)>, MemoryError> {
        self.cpu.borrow().mmu().memory_dump(from, to)
    }

    /// Queue an interrupt request, as a device would
    pub fn raise(&self, request: InterruptRequest) {
        self.interrupts.borrow().accept_interrupt(request);
    }

    /// Where system calls print
    pub fn set_console(&mut self, console: Box<dyn std::io::Write>) {
        self.cpu.borrow_mut().set_console(console);
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn cpu(&self) -> Ref<'_, Cpu> {
        self.cpu.borrow()
    }

    pub fn cpu_mut(&mut self) -> RefMut<'_, Cpu> {
        self.cpu.borrow_mut()
    }

    #[must_use]
    pub fn memory(&self) -> Ref<'_, Memory> {
        self.memory.borrow()
    }

    #[must_use]
    pub fn interrupts(&self) -> Ref<'_, InterruptController> {
        self.interrupts.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn system_with(bytes: &[Word]) -> System {
        let mut system = System::default();
        system.load(&Program::from_bytes(0, bytes)).unwrap();
        system
    }

    #[test]
    fn component_parse_test() {
        assert_eq!("ic".parse::<Component>().unwrap(), Component::Ic);
        assert_eq!("cpu".parse::<Component>().unwrap(), Component::Cpu);
        assert_eq!(Component::Memory.to_string(), "memory");
        assert!("CPU".parse::<Component>().is_err());
        assert!("disk".parse::<Component>().is_err());
    }

    #[test]
    fn config_test() {
        let config = SystemConfig::default();
        assert_eq!(config.interval, Duration::from_millis(200));
        assert!(!config.debugs(Component::Cpu));
        assert_eq!(config.max_ticks, None);

        let config = config.with_all_debug();
        assert!(Component::ALL.iter().all(|c| config.debugs(*c)));
    }

    #[test]
    fn step_instruction_test() {
        // LDA #2A, STA 0040, NOP
        let mut system = system_with(&[0xA9, 0x2A, 0x8D, 0x40, 0x00, 0xEA]);
        assert_eq!(system.step_instruction(), 4);
        assert_eq!(system.cpu().registers().acc, 0x2A);

        assert_eq!(system.step_instruction(), 6);
        assert_eq!(system.memory().cells()[0x40], 0x2A);
        assert_eq!(system.clock().ticks(), 10);
    }

    #[test]
    fn inspection_between_phases_test() {
        // LDA #2A, STA 0040, then INC 0041 holding 05
        let mut system = system_with(&[0xA9, 0x2A, 0x8D, 0x40, 0x00, 0xEE, 0x41, 0x00]);
        system.write_immediate(0x0041, 0x05).unwrap();

        // Up to STA's execute, write-back is next
        for _ in 0..8 {
            system.step();
        }
        assert_eq!(system.memory_dump(0x10, 0x10).unwrap(), vec![(0x10, 0x00)]);
        system.write_immediate(0x20, 0x11).unwrap();
        system.step();
        system.step();

        // Through INC's second execute
        for _ in 0..5 {
            system.step();
        }
        assert_eq!(system.memory_dump(0x30, 0x30).unwrap(), vec![(0x30, 0x00)]);
        system.step();
        system.step();
        assert_eq!(system.cpu().last_fault(), None);

        let memory = system.memory();
        let cells = memory.cells();
        assert_eq!(cells[0x40], 0x2A);
        assert_eq!(cells[0x41], 0x06);
        assert_eq!(cells[0x10], 0x00);
        assert_eq!(cells[0x20], 0x11);
        assert_eq!(cells[0x30], 0x00);
    }

    #[test]
    fn halt_stops_clock_test() {
        let mut system = system_with(&[0xEA, 0x00, 0xEA]);
        assert_eq!(system.step_instruction(), 4);

        // Fetch and decode the halt, the clock stops right after
        assert_eq!(system.step_instruction(), 2);
        assert!(!system.is_running());
        assert!(system.cpu().is_halted());
        assert!(!system.step());
        assert_eq!(system.cpu().registers().pc, 2);
    }

    #[test]
    fn run_limit_test() {
        let mut system = System::new(&SystemConfig {
            interval: Duration::ZERO,
            max_ticks: Some(7),
            ..SystemConfig::default()
        });
        system.load(&Program::from_bytes(0, &[0xEA; 8])).unwrap();
        assert_eq!(system.run(), 7);
        assert_eq!(system.cpu().clock_count(), 7);
    }

    #[test]
    fn reset_test() {
        let mut system = system_with(&[0xA9, 0x2A, 0x00]);
        system.step_instruction();
        system.step_instruction();
        assert!(!system.is_running());

        system.reset();
        assert!(system.is_running());
        assert_eq!(system.cpu().registers(), &Registers::default());
        assert!(system.memory().cells().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn memory_dump_test() {
        let system = system_with(&[0xA9, 0x2A]);
        assert_eq!(
            system.memory_dump(0, 2).unwrap(),
            vec![(0, 0xA9), (1, 0x2A), (2, 0x00)]
        );
        assert_eq!(
            system.memory_dump(0xFFFF, 0x1_0000),
            Err(MemoryError::AddressOutOfRange(0x1_0000))
        );
    }
}

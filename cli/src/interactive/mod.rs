//! This module implements the TTY interactive interface.
//!
//! It is mainly based on two crates:
//!   - rustyline, to handle the line-editting logic
//!   - clap, to handle the parsing of those interactive commands

use clap::Parser;
use pulse8_emulator::constants::{Address, BusAddress, Word};
use pulse8_emulator::runtime::{
    InterruptDevice, InterruptLine, InterruptRequest, NextPhase, Priority,
};
use pulse8_emulator::util::{hex_address, hex_word};
use pulse8_emulator::{Program, System};
use rustyline::history::DefaultHistory;
use rustyline::{Behavior, CompletionType, Config, EditMode, Editor};
use tracing::{debug, info, warn};

mod helper;
pub mod parse;
use self::helper::RunHelper;

static HELP: &str = r#"
Run "help [command]" for command-specific help.
An empty line re-runs the last valid command."#;

#[derive(Parser, Clone, Debug)]
#[clap(
    help_template = "{about}\n\nCOMMANDS:\n{subcommands}\n{after-help}",
    after_help = HELP,
    disable_version_flag = true,
    infer_subcommands = true,
    no_binary_name = true,
)]
/// Interactive mode commands
enum Command {
    /// Deliver clock pulses, each one running a single phase
    #[command(alias = "t")]
    Tick {
        /// Number of pulses
        #[arg(default_value = "1")]
        number: u64,
    },

    /// Pulse until the current instructions completed
    #[command(alias = "i")]
    Instruction {
        /// Number of instructions
        #[arg(default_value = "1")]
        number: u64,
    },

    /// Show the state of the CPU
    Registers,

    /// Show the content of a block in memory
    Memory {
        /// First address to show
        #[arg(value_parser = parse::address)]
        from: BusAddress,

        /// Last address to show, defaults to the first one
        #[arg(value_parser = parse::address)]
        to: Option<BusAddress>,
    },

    /// Set a value in memory
    Set {
        /// The address to set
        #[arg(value_parser = parse::address)]
        address: BusAddress,

        /// The value to set
        #[arg(value_parser = parse::word)]
        value: Word,
    },

    /// Raise an interrupt from the doorbell device
    Interrupt {
        /// Priority of the request
        #[arg(default_value = "1")]
        priority: Priority,
    },

    /// Clear the machine and flash the program again
    Reset,

    /// Exit the emulator
    Exit,
}

/// A device which only rings when asked to from the interactive mode
struct Doorbell;

impl Doorbell {
    const IRQ: u8 = 2;
}

impl InterruptDevice for Doorbell {
    fn irq(&self) -> u8 {
        Self::IRQ
    }

    fn name(&self) -> &str {
        "Doorbell"
    }

    fn priority(&self) -> Priority {
        1
    }

    fn listen(&mut self, _line: InterruptLine) {}

    fn execute(&mut self) {
        info!("Doorbell interrupt serviced");
    }
}

fn describe(next: NextPhase) -> String {
    match next {
        NextPhase::Run(phase) => phase.to_string(),
        NextPhase::Invalid(bits) => format!("invalid schedule {bits:#08b}"),
    }
}

fn display_registers(system: &System) {
    let cpu = system.cpu();
    info!("{}", cpu.registers());
    info!(
        pulses = cpu.clock_count(),
        next = %describe(cpu.next_phase()),
        "Schedule {:?}",
        cpu.registers().schedule
    );
    match cpu.last_fault() {
        Some(fault) => info!(faults = cpu.fault_count(), "Last fault: {fault}"),
        None => info!("No faults"),
    }
}

fn display_memory(system: &System, from: BusAddress, to: BusAddress) {
    match system.memory_dump(from, to) {
        Ok(cells) => {
            for (address, word) in cells {
                info!("{}  |  {}", hex_address(address), hex_word(word));
            }
        }
        Err(error) => warn!(%error, "Could not dump memory"),
    }
}

/// Pulse `number` times, stopping early if the clock stops
fn tick(system: &mut System, number: u64) {
    for _ in 0..number {
        if !system.step() {
            break;
        }
    }
    info!(next = %describe(system.cpu().next_phase()), "{}", system.cpu().registers());
}

fn step(system: &mut System, number: u64) {
    for _ in 0..number {
        if system.step_instruction() == 0 {
            break;
        }
    }
    info!("{}", system.cpu().registers());
}

/// Run the interactive debugger until the user exits
///
/// # Errors
///
/// Fails if the terminal can't be set up
pub(crate) fn run_interactive(system: &mut System, program: &Program) -> anyhow::Result<()> {
    info!("Running in interactive mode. Type \"help\" to list available commands.");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .behavior(Behavior::PreferTerm)
        .auto_add_history(true)
        .build();

    let mut rl: Editor<RunHelper<Command>, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(RunHelper::new()));

    system.register_device(Box::new(Doorbell));
    system.start();

    let mut last_command: Option<Command> = None;

    loop {
        let Ok(readline) = rl.readline(">> ") else {
            info!("EOF, exiting");
            return Ok(());
        };

        let command = if readline.trim().is_empty() {
            if let Some(command) = &last_command {
                command.clone()
            } else {
                info!("Type \"help\" to get the list of available commands");
                continue;
            }
        } else {
            let Ok(words) = shell_words::split(readline.as_str()) else {
                warn!("Invalid input");
                continue;
            };

            match Command::try_parse_from(words) {
                Ok(command) => {
                    last_command = Some(command.clone());
                    command
                }
                Err(error) => {
                    // Help and usage errors are rendered by clap
                    let _ = error.print();
                    continue;
                }
            }
        };

        debug!("Executing command: {:?}", command);

        let halted = !system.is_running();
        match command {
            Command::Exit => return Ok(()),

            Command::Tick { .. } | Command::Instruction { .. } | Command::Interrupt { .. }
                if halted =>
            {
                warn!("Machine is halted. Use \"reset\" to start over, or \"exit\" to quit");
            }

            Command::Tick { number } => tick(system, number),

            Command::Instruction { number } => step(system, number),

            Command::Registers => display_registers(system),

            Command::Memory { from, to } => display_memory(system, from, to.unwrap_or(from)),

            Command::Set { address, value } => {
                let Ok(address) = Address::try_from(address) else {
                    warn!("Address {address:#X} is out of range");
                    continue;
                };

                info!("Setting memory at address {} to {}", hex_address(address), hex_word(value));
                if let Err(error) = system.write_immediate(address, value) {
                    warn!(%error, "Could not write memory");
                }
            }

            Command::Interrupt { priority } => {
                info!(priority, "Raising an interrupt");
                system.raise(InterruptRequest::new(Doorbell::IRQ, "Doorbell", priority));
            }

            Command::Reset => {
                system.reset();
                if let Err(error) = system.load(program) {
                    warn!(%error, "Could not flash the program");
                }
                info!("Machine reset");
            }
        }
    }
}

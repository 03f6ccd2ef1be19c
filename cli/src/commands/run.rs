use std::io::IsTerminal;
use std::time::Duration;

use clap::{ArgAction, Parser};
use pulse8_emulator::constants::{BusAddress, CLOCK_INTERVAL_MS};
use pulse8_emulator::runtime::Component;
use pulse8_emulator::util::{hex_address, hex_word};
use pulse8_emulator::{System, SystemConfig};
use tracing::{info, warn};

use super::ProgramSource;
use crate::interactive::parse;
use crate::keyboard::{Keyboard, RawStdout};

#[derive(Parser, Debug)]
pub struct RunOpt {
    #[command(flatten)]
    source: ProgramSource,

    /// Milliseconds between two clock pulses
    #[arg(long, default_value_t = CLOCK_INTERVAL_MS)]
    interval: u64,

    /// Enable the trace output of a component. Can be used multiple times.
    #[arg(short, long, value_parser = parse::component, action = ArgAction::Append)]
    debug: Vec<Component>,

    /// Enable the trace output of every component
    #[arg(long, conflicts_with = "debug")]
    debug_all: bool,

    /// Stop after that many clock pulses
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Dump a memory range once the machine stopped, as `<from>:<to>`
    #[arg(long, value_parser = parse::address_range)]
    dump: Option<(BusAddress, BusAddress)>,

    /// Do not capture the keyboard, even when running in a terminal
    #[arg(long, action = ArgAction::SetTrue)]
    no_keyboard: bool,
}

impl RunOpt {
    fn config(&self) -> SystemConfig {
        let config = SystemConfig {
            interval: Duration::from_millis(self.interval),
            debug: self.debug.iter().copied().collect(),
            max_ticks: self.max_ticks,
        };

        if self.debug_all {
            config.with_all_debug()
        } else {
            config
        }
    }

    pub fn exec(self) -> anyhow::Result<()> {
        let program = self.source.load()?;

        let mut system = System::new(&self.config());
        system.load(&program)?;

        if !self.no_keyboard && std::io::stdin().is_terminal() {
            system.register_device(Box::new(Keyboard::new(system.stop_handle())));
            system.set_console(Box::new(RawStdout));
            info!("Press Ctrl-C to stop the machine");
        }

        system.start();
        let pulses = system.run();

        let cpu = system.cpu();
        info!(pulses, registers = %cpu.registers(), "Machine stopped");
        if let Some(fault) = cpu.last_fault() {
            warn!(
                faults = cpu.fault_count(),
                kind = fault.kind(),
                "Last fault: {fault}"
            );
        }
        drop(cpu);

        let dump = match self.dump {
            Some((from, to)) => system.memory_dump(from, to)?,
            None => Vec::new(),
        };

        // Gives the terminal back before printing
        drop(system);
        for (address, word) in dump {
            println!("{}  |  {}", hex_address(address), hex_word(word));
        }

        Ok(())
    }
}

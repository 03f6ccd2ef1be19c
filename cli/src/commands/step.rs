use clap::{ArgAction, Parser};
use pulse8_emulator::runtime::Component;
use pulse8_emulator::{System, SystemConfig};
use tracing::info;

use super::ProgramSource;
use crate::interactive::{parse, run_interactive};

#[derive(Parser, Debug)]
pub struct StepOpt {
    #[command(flatten)]
    source: ProgramSource,

    /// Enable the trace output of a component. Can be used multiple times.
    #[arg(short, long, value_parser = parse::component, action = ArgAction::Append)]
    debug: Vec<Component>,
}

impl StepOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = self.source.load()?;

        let config = SystemConfig {
            debug: self.debug.into_iter().collect(),
            ..SystemConfig::default()
        };
        let mut system = System::new(&config);
        system.load(&program)?;

        info!("Running program");
        run_interactive(&mut system, &program)?;
        info!(registers = %system.cpu().registers(), "End of program");

        Ok(())
    }
}

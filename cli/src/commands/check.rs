use clap::Parser;
use tracing::info;

use super::ProgramSource;

#[derive(Parser, Debug)]
pub struct CheckOpt {
    #[command(flatten)]
    source: ProgramSource,
}

impl CheckOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        let program = self.source.load()?;
        info!(bytes = program.len(), "Program is valid");
        print!("{program}");
        Ok(())
    }
}

use clap::Parser;
use pulse8_emulator::demos::{Demo, DEMOS};

#[derive(Parser, Debug)]
pub struct DemosOpt {
    /// Print the image of this program
    #[arg(value_parser = super::demo_name)]
    show: Option<&'static Demo>,
}

impl DemosOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        if let Some(demo) = self.show {
            print!("{}", demo.source);
            return Ok(());
        }

        let width = DEMOS.iter().map(|demo| demo.name.len()).max().unwrap_or(0);
        for demo in DEMOS {
            println!("{:width$}  {}", demo.name, demo.description);
        }

        Ok(())
    }
}

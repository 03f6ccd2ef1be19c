use camino::Utf8PathBuf;
use clap::{Args, ValueHint};
use pulse8_emulator::demos::{Demo, DEMOS};
use pulse8_emulator::{Program, ProgramError};
use tracing::{debug, info};

mod check;
mod completion;
mod demos;
mod run;
mod step;

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Boot the computer with a program and run it until it halts
    Run(self::run::RunOpt),

    /// Run a program interactively, one pulse or instruction at a time
    Step(self::step::StepOpt),

    /// Parse a program image and list its bytes
    Check(self::check::CheckOpt),

    /// List the built-in programs
    Demos(self::demos::DemosOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Step(opt) => opt.exec(),
            Self::Check(opt) => opt.exec(),
            Self::Demos(opt) => opt.exec(),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

fn demo_name(name: &str) -> Result<&'static Demo, String> {
    Demo::find(name).ok_or_else(|| {
        let names: Vec<_> = DEMOS.iter().map(|demo| demo.name).collect();
        format!("expected one of {}", names.join(", "))
    })
}

/// Where to read the program from
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ProgramSource {
    /// Program image
    #[arg(value_hint = ValueHint::FilePath)]
    image: Option<Utf8PathBuf>,

    /// Use a built-in program instead of an image
    #[arg(long, value_parser = demo_name)]
    demo: Option<&'static Demo>,
}

impl ProgramSource {
    /// Read and parse the program.
    ///
    /// Parse errors are printed with the offending part of the source.
    pub fn load(&self) -> anyhow::Result<Program> {
        let (name, source) = match (&self.image, self.demo) {
            (_, Some(demo)) => {
                info!(demo = demo.name, "Using built-in program");
                (demo.name.to_owned(), demo.source.to_owned())
            }
            (Some(path), None) => {
                info!(%path, "Reading program");
                let source = std::fs::read_to_string(path).map_err(|inner| ProgramError::Io {
                    path: path.to_string(),
                    inner,
                })?;
                (path.to_string(), source)
            }
            (None, None) => anyhow::bail!("no program given"),
        };

        debug!("Parsing program");
        match Program::parse(&source) {
            Ok(program) => Ok(program),
            Err(e) => {
                let report =
                    miette::Report::new(e).with_source_code(miette::NamedSource::new(name, source));
                eprintln!("{report:?}");
                anyhow::bail!("invalid program image")
            }
        }
    }
}

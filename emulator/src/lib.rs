pub mod constants;
pub mod demos;
pub mod loader;
pub mod runtime;
pub mod util;

pub use self::loader::{Program, ProgramError};
pub use self::runtime::{System, SystemConfig};

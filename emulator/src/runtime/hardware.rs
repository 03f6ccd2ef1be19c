use std::fmt::Display;

use tracing::{info, warn};

/// Identity shared by every hardware component.
///
/// It carries the data needed to tag diagnostic lines with the emitting
/// component, and the debug flag gating its trace output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hardware {
    id: u32,
    name: &'static str,
    debug: bool,
}

impl Hardware {
    #[must_use]
    pub const fn new(id: u32, name: &'static str) -> Self {
        Self {
            id,
            name,
            debug: false,
        }
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Emit a trace line, only if this component has debugging enabled
    pub fn log(&self, message: impl Display) {
        if self.debug {
            info!(component = self.name, id = self.id, "{message}");
        }
    }

    /// Report an error condition. Those are never gated by the debug flag.
    pub fn report(&self, error: &dyn std::error::Error) {
        warn!(component = self.name, id = self.id, "[ERROR] {error}");
    }
}

//! Programs shipped with the emulator

use crate::loader::{Program, ProgramError};

/// A built-in program image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "powers",
        description: "print the powers of two until the accumulator overflows",
        source: include_str!("../programs/powers.hex"),
    },
    Demo {
        name: "hello",
        description: "print a string with a system call",
        source: include_str!("../programs/hello.hex"),
    },
    Demo {
        name: "even-odd",
        description: "tell whether a number is even or odd",
        source: include_str!("../programs/even-odd.hex"),
    },
    Demo {
        name: "compare",
        description: "compare X with memory, load the accumulator on a match",
        source: include_str!("../programs/compare.hex"),
    },
];

impl Demo {
    /// Look a demo up by name
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Demo> {
        DEMOS.iter().find(|demo| demo.name == name)
    }

    /// Parse the image of this demo
    ///
    /// # Errors
    ///
    /// Fails if the image is malformed
    pub fn program(&self) -> Result<Program, ProgramError> {
        Program::parse(self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demos_parse_test() {
        for demo in DEMOS {
            let program = demo.program().unwrap();
            assert!(!program.is_empty(), "{} is empty", demo.name);
        }
    }

    #[test]
    fn find_test() {
        assert_eq!(Demo::find("hello").map(|d| d.name), Some("hello"));
        assert!(Demo::find("snake").is_none());
    }

    #[test]
    fn hello_listing_test() {
        let program = Demo::find("hello").unwrap().program().unwrap();
        insta::assert_snapshot!(program.to_string(), @r###"
        0000: A9 FF 8D 40 00 AC 40 00
        0008: A2 02 FF 00
        00FF: 0A 48 65 6C 6C 6F 20 57
        0107: 6F 72 6C 64 21 0A 00
        "###);
    }
}

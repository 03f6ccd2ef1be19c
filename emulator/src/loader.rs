//! Program images, flashed into memory before the clock starts.
//!
//! An image is a text file listing bytes as pairs of hex digits. A line may
//! start with an `ADDR:` origin, otherwise its bytes follow the last one
//! written. Everything after a `#` is a comment.
//!
//! ```text
//! # load constant 0, store it in 0040
//! 0000: A9 00
//!       8D 40 00
//! 0050: 2C
//! ```

use std::fmt;

use camino::Utf8Path;
use miette::SourceSpan;
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, space0, space1},
    combinator::{all_consuming, map_res, opt},
    multi::separated_list0,
    sequence::{delimited, pair, terminated},
    Finish, IResult, Offset,
};
use thiserror::Error;
use tracing::debug;

use crate::constants::{Address, Word};
use crate::runtime::{MemoryError, Mmu};
use crate::util::{hex_address, hex_bytes};

/// Bytes per line when listing a program
const LISTING_WIDTH: usize = 8;

#[derive(Debug, Error, miette::Diagnostic)]
pub enum ProgramError {
    #[error("invalid token on line {line}")]
    #[diagnostic(help(
        "bytes are two hex digits, origins are up to four hex digits followed by ':'"
    ))]
    Syntax {
        line: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("byte on line {line} does not fit in the address space")]
    Overflow {
        line: usize,
        #[label("this byte would land past FFFF")]
        span: SourceSpan,
    },

    #[error("could not read program image {path}")]
    Io {
        path: String,
        #[source]
        inner: std::io::Error,
    },
}

/// A program to flash, as a list of memory cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    cells: Vec<(Address, Word)>,
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn parse_origin(input: &str) -> IResult<&str, Address> {
    terminated(
        map_res(take_while_m_n(1, 4, is_hex_digit), |s| {
            Address::from_str_radix(s, 16)
        }),
        char(':'),
    )(input)
}

fn parse_byte(input: &str) -> IResult<&str, Word> {
    map_res(take_while_m_n(2, 2, is_hex_digit), |s| {
        Word::from_str_radix(s, 16)
    })(input)
}

fn parse_line(input: &str) -> IResult<&str, (Option<Address>, Vec<Word>)> {
    all_consuming(delimited(
        space0,
        pair(
            opt(terminated(parse_origin, space0)),
            separated_list0(space1, parse_byte),
        ),
        space0,
    ))(input)
}

impl Program {
    /// A program made of consecutive bytes starting at `origin`
    #[must_use]
    pub fn from_bytes(origin: Address, bytes: &[Word]) -> Self {
        let cells = (origin..=Address::MAX)
            .zip(bytes.iter().copied())
            .collect();
        Self { cells }
    }

    /// Parse a program image
    ///
    /// # Errors
    ///
    /// Fails on malformed tokens, or if bytes would be placed past the end of
    /// the address space
    pub fn parse(source: &str) -> Result<Self, ProgramError> {
        let mut cells = Vec::new();
        let mut cursor: Option<Address> = Some(0);
        let mut line_start = 0;

        for (index, raw_line) in source.split('\n').enumerate() {
            let line_number = index + 1;
            let offset = line_start;
            line_start += raw_line.len() + 1;

            let content = raw_line
                .split_once('#')
                .map_or(raw_line, |(before, _)| before)
                .trim_end_matches('\r');

            let (origin, bytes) = match parse_line(content).finish() {
                Ok((_, parsed)) => parsed,
                Err(e) => {
                    let start = offset + content.len() - e.input.len();
                    let len = e
                        .input
                        .find(char::is_whitespace)
                        .unwrap_or(e.input.len())
                        .max(1);
                    return Err(ProgramError::Syntax {
                        line: line_number,
                        span: (start, len).into(),
                    });
                }
            };

            if let Some(origin) = origin {
                cursor = Some(origin);
            }

            for (position, word) in bytes.into_iter().enumerate() {
                let Some(address) = cursor else {
                    // Point at the first byte which does not fit
                    let token = content
                        .split_whitespace()
                        .filter(|t| !t.ends_with(':'))
                        .nth(position)
                        .unwrap_or(content);
                    let start = offset + content.offset(token);
                    return Err(ProgramError::Overflow {
                        line: line_number,
                        span: (start, token.len()).into(),
                    });
                };
                cells.push((address, word));
                cursor = address.checked_add(1);
            }
        }

        debug!(cells = cells.len(), "Parsed program image");
        Ok(Self { cells })
    }

    /// Read and parse a program image from a file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read, or on invalid images
    pub fn from_file(path: &Utf8Path) -> Result<Self, ProgramError> {
        let source = std::fs::read_to_string(path).map_err(|inner| ProgramError::Io {
            path: path.to_string(),
            inner,
        })?;
        Self::parse(&source)
    }

    #[must_use]
    pub fn cells(&self) -> &[(Address, Word)] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flash every cell through the MMU, outside of any instruction cycle
    ///
    /// # Errors
    ///
    /// Fails if the MMU refuses a write
    pub fn load(&self, mmu: &Mmu) -> Result<(), MemoryError> {
        for &(address, word) in &self.cells {
            mmu.write_immediate(address, word)?;
        }
        debug!(cells = self.cells.len(), "Program loaded");
        Ok(())
    }
}

impl fmt::Display for Program {
    /// Lists the program as contiguous runs of at most eight bytes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(Address, Vec<Word>)> = Vec::new();
        for &(address, word) in &self.cells {
            if let Some((start, bytes)) = runs.last_mut() {
                if bytes.len() < LISTING_WIDTH
                    && usize::from(*start) + bytes.len() == usize::from(address)
                {
                    bytes.push(word);
                    continue;
                }
            }
            runs.push((address, vec![word]));
        }

        for (start, bytes) in runs {
            writeln!(f, "{}: {}", hex_address(start), hex_bytes(bytes))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_line_test() {
        assert_eq!(parse_line("0040: A9 2A"), Ok(("", (Some(0x40), vec![0xA9, 0x2A]))));
        assert_eq!(parse_line("  a9  2a  "), Ok(("", (None, vec![0xA9, 0x2A]))));
        assert_eq!(parse_line("ffff:"), Ok(("", (Some(0xFFFF), vec![]))));
        assert_eq!(parse_line(""), Ok(("", (None, vec![]))));
        assert!(parse_line("A92A").is_err());
        assert!(parse_line("A9 2").is_err());
        assert!(parse_line("12345: 00").is_err());
        assert!(parse_line("ZZ").is_err());
    }

    #[test]
    fn parse_program_test() {
        let program = Program::parse(indoc::indoc! {"
            # load constant 0
            0000: A9 00
            # write acc to 0040
                  8D 40 00   # trailing comment

            0050: 2C
        "})
        .unwrap();

        assert_eq!(
            program.cells(),
            &[
                (0x0000, 0xA9),
                (0x0001, 0x00),
                (0x0002, 0x8D),
                (0x0003, 0x40),
                (0x0004, 0x00),
                (0x0050, 0x2C),
            ]
        );
    }

    #[test]
    fn syntax_error_location_test() {
        let source = "0000: A9 00\nA9 XY 00\n";
        let Err(ProgramError::Syntax { line, span }) = Program::parse(source) else {
            panic!("expected a syntax error");
        };
        assert_eq!(line, 2);
        assert_eq!(span.offset(), 15);
        assert_eq!(span.len(), 2);
    }

    #[test]
    fn overflow_test() {
        let source = "FFFE: 01 02 03";
        let Err(ProgramError::Overflow { line, span }) = Program::parse(source) else {
            panic!("expected an overflow error");
        };
        assert_eq!(line, 1);
        assert_eq!(span.offset(), 12);
        assert_eq!(span.len(), 2);

        // Ending exactly on the last cell is fine
        assert_eq!(Program::parse("FFFE: 01 02").unwrap().len(), 2);
    }

    #[test]
    fn missing_file_test() {
        let path = Utf8Path::new("/nonexistent/program.hex");
        let Err(ProgramError::Io { path: reported, .. }) = Program::from_file(path) else {
            panic!("expected an IO error");
        };
        assert_eq!(reported, "/nonexistent/program.hex");
    }

    #[test]
    fn from_bytes_test() {
        let program = Program::from_bytes(0xFFFE, &[1, 2, 3]);
        assert_eq!(program.cells(), &[(0xFFFE, 1), (0xFFFF, 2)]);
    }

    #[test]
    fn listing_test() {
        let program = Program::parse(
            "0000: A9 00 8D 40 00 A9 01 6D 40 00\n0050: 2C\n0052: 00",
        )
        .unwrap();
        insta::assert_snapshot!(program.to_string(), @r###"
        0000: A9 00 8D 40 00 A9 01 6D
        0008: 40 00
        0050: 2C
        0052: 00
        "###);
    }
}

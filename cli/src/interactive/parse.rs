//! Parsers for the numbers typed on the command line and in the interactive
//! mode. Numbers are hexadecimal, with an optional `0x` or `$` prefix.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, hex_digit1, space0};
use nom::combinator::{all_consuming, map_res, opt};
use nom::sequence::{delimited, preceded, separated_pair};
use nom::{Finish, IResult};
use pulse8_emulator::constants::{BusAddress, Word};
use pulse8_emulator::runtime::Component;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid number {0:?}, expected hex digits")]
    Number(String),

    #[error("invalid range {0:?}, expected <from>:<to>")]
    Range(String),

    #[error("{0:#04X} does not fit in a byte")]
    WordOverflow(BusAddress),

    #[error("unknown component {0:?}, expected one of cpu, memory, mmu, clock, ic, system")]
    Component(String),
}

fn hex_number(input: &str) -> IResult<&str, BusAddress> {
    preceded(
        opt(alt((tag("0x"), tag("0X"), tag("$")))),
        map_res(hex_digit1, |digits| BusAddress::from_str_radix(digits, 16)),
    )(input)
}

fn range(input: &str) -> IResult<&str, (BusAddress, BusAddress)> {
    separated_pair(hex_number, delimited(space0, char(':'), space0), hex_number)(input)
}

/// Parse an address. Out-of-range values are accepted, the memory reports
/// them.
pub fn address(input: &str) -> Result<BusAddress, ParseError> {
    all_consuming(hex_number)(input.trim())
        .finish()
        .map(|(_, number)| number)
        .map_err(|_| ParseError::Number(input.to_owned()))
}

pub fn word(input: &str) -> Result<Word, ParseError> {
    let number = address(input)?;
    Word::try_from(number).map_err(|_| ParseError::WordOverflow(number))
}

/// Parse an inclusive `from:to` address range
pub fn address_range(input: &str) -> Result<(BusAddress, BusAddress), ParseError> {
    all_consuming(range)(input.trim())
        .finish()
        .map(|(_, range)| range)
        .map_err(|_| ParseError::Range(input.to_owned()))
}

pub fn component(input: &str) -> Result<Component, ParseError> {
    input
        .parse()
        .map_err(|_| ParseError::Component(input.to_owned()))
}

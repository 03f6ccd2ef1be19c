use std::borrow::Cow;
use std::collections::HashSet;
use std::marker::PhantomData;

use anstyle::{Effects, Style};
use clap::{Command, CommandFactory};
use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context,
};
use rustyline_derive::Helper;

/// Line editor helper, completing and hinting the interactive commands
#[derive(Helper, Debug)]
pub(crate) struct RunHelper<T: CommandFactory> {
    app: PhantomData<T>,
}

impl<T: CommandFactory> RunHelper<T> {
    pub fn new() -> Self {
        RunHelper { app: PhantomData }
    }
}

fn suggest(command: &Command, input: &[String]) -> (usize, HashSet<String>) {
    // Built even when only a nested subcommand is completed
    let mut suggestions: HashSet<_> = command
        .get_subcommands()
        .flat_map(|cmd| {
            std::iter::once(cmd.get_name().to_string())
                .chain(cmd.get_visible_aliases().map(ToString::to_string))
        })
        .collect();

    // If the app has subcommands, it has a `help` command
    if command.has_subcommands() {
        suggestions.insert("help".to_string());
    }

    let index = input.len().saturating_sub(1);

    // Suggest the possible values of the positional argument being typed
    if let Some(arg) = command.get_positionals().nth(index) {
        suggestions.extend(
            arg.get_possible_values()
                .into_iter()
                .map(|value| value.get_name().to_string()),
        );
    }

    match input {
        [last] => (
            last.len(),
            suggestions
                .into_iter()
                .filter(|alias| alias.starts_with(last))
                .collect(),
        ),

        [head, tail @ ..] => command
            .find_subcommand(head)
            .map(|sub: &Command| suggest(sub, tail))
            .unwrap_or_default(),

        [] => (0, suggestions),
    }
}

/// Split the line up to the cursor in words. A trailing blank starts a new,
/// empty word.
fn words_before(line: &str, pos: usize) -> Option<Vec<String>> {
    let line = line.get(..pos)?;
    let mut words = shell_words::split(line).ok()?;
    if line.ends_with([' ', '\t']) {
        words.push(String::new());
    }
    Some(words)
}

impl<T: CommandFactory> RunHelper<T> {
    fn candidates(line: &str, pos: usize) -> Option<(usize, HashSet<String>)> {
        let words = words_before(line, pos)?;
        Some(suggest(&T::command(), &words))
    }
}

impl<T: CommandFactory> Completer for RunHelper<T> {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        Ok(Self::candidates(line, pos).map_or((0, Vec::new()), |(offset, candidates)| {
            let mut candidates: Vec<_> = candidates.into_iter().collect();
            candidates.sort_unstable();
            (pos - offset, candidates)
        }))
    }
}

impl<T: CommandFactory> Highlighter for RunHelper<T> {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        let style = Style::new().effects(Effects::DIMMED);
        Cow::Owned(format!("{}{hint}{}", style.render(), style.render_reset()))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        let style = Style::new().bold();
        Cow::Owned(format!("{}{prompt}{}", style.render(), style.render_reset()))
    }
}

impl<T: CommandFactory> Hinter for RunHelper<T> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let (offset, candidates) = Self::candidates(line, pos)?;
        if candidates.len() != 1 {
            return None;
        }

        candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.get(offset..).map(ToString::to_string))
    }
}

impl<T: CommandFactory> Validator for RunHelper<T> {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        // Unbalanced quotes continue on the next line
        match shell_words::split(ctx.input()) {
            Ok(_) => Ok(ValidationResult::Valid(None)),
            Err(_) => Ok(ValidationResult::Incomplete),
        }
    }
}

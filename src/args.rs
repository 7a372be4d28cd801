// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

use std::collections::{HashMap, VecDeque};
use std::env;
use std::fmt;

use ansi_term::{Colour, Style};

use crate::error::{Error, Result};
use crate::store::FlagStore;

/// Prefix that introduces a long flag (`--name`).
const LONG_PREFIX: &str = "--";

/// Prefix that introduces a short flag (`-m`).
const SHORT_PREFIX: &str = "-";

/// Separator joining a flag to its value (`--name=value`).
const KV_SEP: char = '=';

/// Marker shown in descriptions of value-taking flags.
const VALUE_MARKER: &str = "<VALUE>";

/// Continuation marker prefixed to every entry of a help block.
const HELP_CONT: &str = "│ ";

/// Final line of the generated help text.
const HELP_END: &str = "└ END OF HELP";

/// Used to specify whether a [Flag] is a "stand-alone" boolean switch
/// (needs no value), or whether it requires a value.
#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Copy)]
pub enum Need {
    /// Flag is stand-alone (no value required).
    Nothing,
    /// Flag needs a value.
    Argument,
}

impl Default for Need {
    fn default() -> Self {
        Need::Nothing
    }
}

impl Need {
    /// Create a new default requirement for a [Flag].
    pub fn new() -> Self {
        Need::default()
    }
}

/// Callback invoked when an [Argument] matches; receives the store and
/// exactly `arity` tokens, in order.
pub type ArgTrigger<'a> = Box<dyn FnMut(&mut FlagStore, &[String]) -> Result<()> + 'a>;

/// Callback invoked when a [Flag] bound to [Binding::Trigger] matches;
/// receives the resolved value for value-taking flags, [None] otherwise.
pub type FlagTrigger<'a> = Box<dyn FnMut(&mut FlagStore, Option<&str>) -> Result<()> + 'a>;

/// A multi-token argument, consumed either by position or by exact-name
/// match, bound to a trigger callback.
///
/// The number of display labels defines the arity: an argument always
/// consumes exactly `labels.len()` tokens.
pub struct Argument<'a> {
    name: String,
    labels: Vec<String>,
    help: String,
    positional: bool,
    trigger: ArgTrigger<'a>,
}

impl<'a> Argument<'a> {
    /// Create a new argument consuming one token per entry in `labels`.
    pub fn new<F>(name: &str, labels: &[&str], trigger: F) -> Self
    where
        F: FnMut(&mut FlagStore, &[String]) -> Result<()> + 'a,
    {
        debug_assert!(!labels.is_empty());

        Argument {
            name: name.into(),
            labels: labels.iter().map(|l| (*l).into()).collect(),
            help: String::new(),
            positional: false,
            trigger: Box::new(trigger),
        }
    }

    /// Mark the argument as consumed by position rather than by name.
    pub fn positional(self) -> Self {
        Argument {
            positional: true,
            ..self
        }
    }

    /// Specify the help text for the argument.
    pub fn help(self, help: &str) -> Self {
        Argument {
            help: help.into(),
            ..self
        }
    }

    /// The argument name (and, for named arguments, its matching token).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tokens the argument consumes.
    pub fn arity(&self) -> usize {
        self.labels.len()
    }

    /// Whether the argument is consumed by position.
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Long-form description used in the help blocks.
    pub fn describe(&self) -> String {
        if self.arity() < 2 {
            format!("{} | {}", self.name, self.help)
        } else {
            format!("{} => {} | {}", self.name, self.labels.join(" "), self.help)
        }
    }

    /// Short form used on the usage line.
    pub fn short_form(&self) -> String {
        if self.arity() < 2 {
            format!("[{}]", self.name)
        } else {
            format!("[{} {}]", self.name, self.labels.join(" "))
        }
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("positional", &self.positional)
            .finish()
    }
}

/// What invoking a [Flag] does, matched explicitly at invocation time.
pub enum Binding<'a> {
    /// Write the resolved value (or boolean true for stand-alone flags)
    /// under a store key.
    Store(String),
    /// Invoke an arbitrary callback.
    Trigger(FlagTrigger<'a>),
    /// Print the parser's generated help text.
    Help,
    /// Print the parser's version line.
    Version,
}

impl fmt::Debug for Binding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Binding::Store(key) => write!(f, "Store({:?})", key),
            Binding::Trigger(_) => write!(f, "Trigger(..)"),
            Binding::Help => write!(f, "Help"),
            Binding::Version => write!(f, "Version"),
        }
    }
}

/// A `--name` / `-mini` switch, optionally value-taking.
///
/// Values are only recognised in the joined form (`--name=value`,
/// `-m=value`); a following bare token is never consumed as a value.
#[derive(Debug)]
pub struct Flag<'a> {
    name: String,
    mini: String,
    needs: Need,
    binding: Binding<'a>,
    allow_exit: bool,
    help: String,
}

impl<'a> Flag<'a> {
    /// Create a new flag from its long name, short name, value requirement
    /// and binding.
    pub fn new(name: &str, mini: &str, needs: Need, binding: Binding<'a>) -> Self {
        Flag {
            name: name.into(),
            mini: mini.into(),
            needs,
            binding,
            allow_exit: false,
            help: String::new(),
        }
    }

    /// Specify the help text for the flag.
    pub fn help(self, help: &str) -> Self {
        Flag {
            help: help.into(),
            ..self
        }
    }

    /// Mark the flag as satisfying the parse on its own: once it fires,
    /// missing positional/named arguments no longer fail the parse.
    pub fn allow_exit(self) -> Self {
        Flag {
            allow_exit: true,
            ..self
        }
    }

    /// The long name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short name.
    pub fn mini(&self) -> &str {
        &self.mini
    }

    /// Whether the flag requires a value.
    pub fn takes_value(&self) -> bool {
        self.needs == Need::Argument
    }

    /// Long-form description used in the help blocks.
    pub fn describe(&self) -> String {
        if self.takes_value() {
            format!(
                "--{} / -{} => {} | {}",
                self.name, self.mini, VALUE_MARKER, self.help
            )
        } else {
            format!("--{} / -{} | {}", self.name, self.mini, self.help)
        }
    }

    /// Short form used on the usage line.
    pub fn short_form(&self) -> String {
        if self.takes_value() {
            format!("[--{} / -{} {}]", self.name, self.mini, VALUE_MARKER)
        } else {
            format!("[--{} / -{}]", self.name, self.mini)
        }
    }
}

/// A flag-shaped token found while scanning, before any matching happens.
#[derive(Debug)]
struct Candidate {
    /// Index of the originating token.
    index: usize,
    /// Key with prefix (and any `=value` part) stripped.
    key: String,
    /// Whether the token used the long (`--`) prefix.
    long: bool,
}

/// The parser: owns the registered [Argument] and [Flag] descriptors and
/// implements token classification and dispatch.
///
/// Parsing mutates the supplied [FlagStore] and invokes triggers as a side
/// effect; nothing is rolled back when a later phase fails.
#[derive(Debug)]
pub struct Parser<'a> {
    prog: String,
    version: String,
    description: String,

    positionals: Vec<Argument<'a>>,
    named: Vec<Argument<'a>>,
    flags: Vec<Flag<'a>>,

    satisfied: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser for the named program.
    pub fn new(prog: &str, version: &str, description: &str) -> Self {
        Parser {
            prog: prog.into(),
            version: version.into(),
            description: description.into(),
            positionals: Vec::new(),
            named: Vec::new(),
            flags: Vec::new(),
            satisfied: false,
        }
    }

    /// Register an argument, routing it to the positional or named
    /// collection.
    pub fn add_argument(&mut self, arg: Argument<'a>) -> &mut Self {
        if arg.is_positional() {
            self.positionals.push(arg);
        } else {
            self.named.push(arg);
        }

        self
    }

    /// Register a flag.
    pub fn add_flag(&mut self, flag: Flag<'a>) -> &mut Self {
        self.flags.push(flag);

        self
    }

    /// Register the standard `--help` / `-h` flag.
    pub fn add_help(&mut self) -> &mut Self {
        self.add_flag(
            Flag::new("help", "h", Need::Nothing, Binding::Help)
                .help("Get help")
                .allow_exit(),
        )
    }

    /// Register the standard `--version` / `-v` flag.
    pub fn add_version(&mut self) -> &mut Self {
        self.add_flag(
            Flag::new("version", "v", Need::Nothing, Binding::Version)
                .help("Get version")
                .allow_exit(),
        )
    }

    /// Whether an early-exit flag has fired: remaining required arguments
    /// need not be present.
    pub fn satisfied(&self) -> bool {
        self.satisfied
    }

    /// Parse a token sequence (without the program-invocation token).
    ///
    /// Phases run in a fixed order: flags anywhere in the stream, then
    /// positional arguments from the front of the remainder, then named
    /// arguments, then a completion check. Triggers invoked before a
    /// failure stay invoked.
    pub fn parse(&mut self, store: &mut FlagStore, tokens: Vec<String>) -> Result<()> {
        let rest = self.take_flags(store, tokens)?;
        let rest = self.take_positionals(store, rest)?;
        let rest = self.take_named(store, rest)?;

        if !rest.is_empty() {
            return Err(Error::TooManyArguments(rest.len()));
        }

        Ok(())
    }

    /// Flag phase: match registered flags against `--`/`-` prefixed tokens
    /// anywhere in the stream and return the residual tokens.
    ///
    /// A single scan collects flag-shaped candidates and a scratch map of
    /// `key=value` splits (last occurrence wins); matching then walks the
    /// registered flags and rebuilds the residual by exclusion, so the
    /// token list is never mutated while being scanned.
    fn take_flags(&mut self, store: &mut FlagStore, tokens: Vec<String>) -> Result<Vec<String>> {
        let mut values = HashMap::<String, String>::new();
        let mut candidates = Vec::<Candidate>::new();

        for (index, token) in tokens.iter().enumerate() {
            let (body, long) = if let Some(rest) = token.strip_prefix(LONG_PREFIX) {
                (rest, true)
            } else if let Some(rest) = token.strip_prefix(SHORT_PREFIX) {
                (rest, false)
            } else {
                continue;
            };

            let key = match body.find(KV_SEP) {
                Some(pos) => {
                    values.insert(body[..pos].into(), body[pos + 1..].into());
                    &body[..pos]
                }
                None => body,
            };

            candidates.push(Candidate {
                index,
                key: key.into(),
                long,
            });
        }

        let mut consumed = vec![false; tokens.len()];

        // Meta outputs are rendered up front; rendering is pure, so this
        // costs nothing observable when no meta flag fires.
        let help_text = self.render_help();
        let version_text = self.render_version();

        for fi in 0..self.flags.len() {
            // Long and short forms match independently; both may fire.
            for &long in &[true, false] {
                let form = if long {
                    self.flags[fi].name.clone()
                } else {
                    self.flags[fi].mini.clone()
                };

                let hits: Vec<usize> = candidates
                    .iter()
                    .filter(|c| c.long == long && c.key == form)
                    .map(|c| c.index)
                    .collect();

                if hits.is_empty() {
                    continue;
                }

                let value = if self.flags[fi].takes_value() {
                    match values.get(&form) {
                        Some(v) => Some(v.clone()),
                        None => {
                            return Err(Error::MissingFlagValue {
                                name: self.flags[fi].name.clone(),
                            })
                        }
                    }
                } else {
                    None
                };

                // Every occurrence of this form is consumed, but the flag
                // fires once with the last value seen.
                for index in hits {
                    consumed[index] = true;
                }

                self.fire_flag(fi, store, value, &help_text, &version_text)?;
            }
        }

        let rest = tokens
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !consumed[*i])
            .map(|(_, t)| t)
            .collect();

        Ok(rest)
    }

    /// Invoke one matched flag with its resolved value.
    fn fire_flag(
        &mut self,
        fi: usize,
        store: &mut FlagStore,
        value: Option<String>,
        help_text: &str,
        version_text: &str,
    ) -> Result<()> {
        let allow_exit = {
            let flag = &mut self.flags[fi];

            match &mut flag.binding {
                Binding::Store(key) => match &value {
                    Some(v) => store.set(key, v),
                    None => store.set_bool(key, true),
                },
                Binding::Trigger(trigger) => trigger(store, value.as_deref())?,
                Binding::Help => println!("{}", help_text),
                Binding::Version => println!("{}", version_text),
            }

            flag.allow_exit
        };

        if allow_exit {
            self.satisfied = true;
        }

        Ok(())
    }

    /// Positional phase: bind registered positionals, in registration
    /// order, to tokens popped off the front of the remainder.
    fn take_positionals(
        &mut self,
        store: &mut FlagStore,
        tokens: Vec<String>,
    ) -> Result<Vec<String>> {
        let mut rest: VecDeque<String> = tokens.into();

        for pi in 0..self.positionals.len() {
            let wanted = self.positionals[pi].arity();

            if rest.len() < wanted {
                if self.satisfied {
                    break;
                }

                return Err(Error::ArityMismatch {
                    name: self.positionals[pi].name.clone(),
                    wanted,
                    got: rest.len(),
                });
            }

            let taken: Vec<String> = rest.drain(..wanted).collect();

            let arg = &mut self.positionals[pi];
            (arg.trigger)(store, &taken)?;
        }

        Ok(rest.into_iter().collect())
    }

    /// Named phase: scan the remainder left to right, consuming each
    /// name-token plus its following `arity` tokens. Unmatched tokens
    /// survive in their original relative order.
    fn take_named(&mut self, store: &mut FlagStore, tokens: Vec<String>) -> Result<Vec<String>> {
        let mut rest: VecDeque<String> = tokens.into();
        let mut leftover = Vec::<String>::new();

        while let Some(head) = rest.pop_front() {
            let ni = match self.named.iter().position(|a| a.name == head) {
                Some(ni) => ni,
                None => {
                    leftover.push(head);
                    continue;
                }
            };

            let wanted = self.named[ni].arity();

            if rest.len() < wanted {
                if self.satisfied {
                    // Stop the phase; hand the remainder back untouched.
                    leftover.push(head);
                    leftover.extend(rest);

                    return Ok(leftover);
                }

                return Err(Error::ArityMismatch {
                    name: self.named[ni].name.clone(),
                    wanted,
                    got: rest.len(),
                });
            }

            let taken: Vec<String> = rest.drain(..wanted).collect();

            let arg = &mut self.named[ni];
            (arg.trigger)(store, &taken)?;
        }

        Ok(leftover)
    }

    /// Render the full help text.
    ///
    /// Layout: a usage header (positional, named, then flag short forms),
    /// the program description, then one block per non-empty descriptor
    /// collection, then a terminator line. Pure: calling it twice yields
    /// identical output.
    pub fn render_help(&self) -> String {
        let mut shorts: Vec<String> = self.positionals.iter().map(Argument::short_form).collect();
        shorts.extend(self.named.iter().map(Argument::short_form));
        shorts.extend(self.flags.iter().map(Flag::short_form));

        let mut lines = Vec::<String>::new();

        lines.push(format!("┏  {} => {}", self.prog, shorts.join(" ")));
        lines.push(format!("┡  {}", self.description));

        push_block(
            &mut lines,
            "Named Arguments",
            self.named.iter().map(Argument::describe),
        );
        push_block(
            &mut lines,
            "Positional Arguments",
            self.positionals.iter().map(Argument::describe),
        );
        push_block(&mut lines, "Flags", self.flags.iter().map(Flag::describe));

        lines.push(HELP_END.into());

        lines.join("\n")
    }

    /// Render the single-line version text.
    pub fn render_version(&self) -> String {
        format!(
            "{} - {}{}",
            self.prog,
            Colour::Yellow.paint("V"),
            Colour::Green.paint(self.version.as_str())
        )
    }
}

/// Append one help block: a bold title line plus one continuation-marked
/// line per entry. Empty blocks are omitted entirely.
fn push_block<I>(lines: &mut Vec<String>, title: &str, entries: I)
where
    I: Iterator<Item = String>,
{
    let entries: Vec<String> = entries.collect();

    if entries.is_empty() {
        return;
    }

    lines.push(format!("├ {}", Style::new().bold().paint(title)));

    for entry in entries {
        lines.push(format!("{}{}", HELP_CONT, entry));
    }
}

/// Get a list of all command-line arguments specified to the program with
/// the program name (the first argument) removed.
pub fn cli_tokens() -> Vec<String> {
    let mut args: Vec<String> = env::args().collect();

    // Remove program name
    let _ = args.remove(0);

    args
}

// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

#![deny(missing_docs)]
#![forbid(unsafe_code)]

//! Batch data-file processor with a simple command-line parser.
//!
//! The crate has two halves:
//!
//! * a small argument/flag parsing engine ([Parser], [Argument], [Flag])
//!   built around an explicit configuration store ([FlagStore]), and
//! * the processing pipeline the `datproc` binary runs with it: glob
//!   expansion ([discover]), a per-file cointegration score ([compute]),
//!   a sized worker pool ([pipeline]) and table/CSV output ([report]).
//!
//! # Overview
//!
//! The parser classifies raw command-line tokens in a fixed phase order:
//! flags first (matched by identity anywhere in the stream), then
//! positional arguments (bound from the front of the remainder), then
//! named arguments (matched by exact token), then a completion check that
//! rejects anything left over. Each matched descriptor dispatches to its
//! binding: a store write or a trigger callback.
//!
//! All store writes happen during the single-threaded parse. Freezing the
//! store ([FlagStore::freeze]) then yields a read-only [FlagView] that the
//! concurrent worker phase can share safely.
//!
//! # Quickstart
//!
//! ```rust
//! use datproc::{Argument, Binding, Flag, FlagStore, Need, Parser};
//!
//! let mut store = FlagStore::new();
//! let mut parser = Parser::new("demo", "1.0.0", "A demo program");
//!
//! // One required positional argument...
//! parser.add_argument(
//!     Argument::new("input", &["input"], |store, tokens| {
//!         store.set("INPUT", &tokens[0]);
//!         Ok(())
//!     })
//!     .positional()
//!     .help("Input a dir pattern and start processing"),
//! );
//!
//! // ...one value-taking flag bound straight to a store key...
//! parser.add_flag(
//!     Flag::new("threads", "t", Need::Argument, Binding::Store("N_THREADS".into()))
//!         .help("Set amounts of threads to use"),
//! );
//!
//! // ...and the standard meta flags.
//! parser.add_help();
//! parser.add_version();
//!
//! let tokens = vec!["--threads=4".to_string(), "data/*.dat".to_string()];
//! parser.parse(&mut store, tokens)?;
//!
//! assert_eq!(store.get("INPUT"), Some("data/*.dat"));
//! assert_eq!(store.get("N_THREADS"), Some("4"));
//! # Ok::<(), datproc::Error>(())
//! ```
//!
//! # Flag values
//!
//! Flag values use the joined form only: `--threads=4` or `-t=4`. A
//! following bare token (`-t 4`) is *not* consumed as a value and fails
//! with [Error::MissingFlagValue]. Repeating a flag stores the last value.
//!
//! # Early exit
//!
//! Flags registered with [Flag::allow_exit] (such as the built-in help and
//! version flags) mark the parse as satisfied: missing positional or named
//! arguments no longer fail, so `prog --help` works without the otherwise
//! required inputs.
//!
//! # Limitations
//!
//! * No nested subcommands.
//! * No grouped short flags (`-te` is one flag named `te`, not two).
//! * Argument values are not validated beyond presence and arity; triggers
//!   see plain strings.

mod args;
mod error;
mod store;

pub mod compute;
pub mod discover;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};

pub use args::{cli_tokens, ArgTrigger, Argument, Binding, Flag, FlagTrigger, Need, Parser};

pub use store::{FlagStore, FlagView};

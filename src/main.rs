// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

//! The `datproc` binary: register the command-line surface, parse, then
//! hand the frozen configuration to the worker phase.

use std::process;

use ansi_term::Colour;

use datproc::pipeline::{self, KEY_EXIT_ON_ERR, KEY_INPUT, KEY_OUTPUT, KEY_SELECT, KEY_THREADS};
use datproc::{cli_tokens, Argument, Binding, Flag, FlagStore, Need, Parser, Result};

const PROG_NAME: &str = "datproc";

const DESCRIPTION: &str = "Score pairs of numeric rows across a set of data files";

fn build_parser<'a>(threads_help: &str) -> Parser<'a> {
    let mut parser = Parser::new(PROG_NAME, env!("CARGO_PKG_VERSION"), DESCRIPTION);

    parser.add_argument(
        Argument::new(
            "input",
            &["input"],
            |store: &mut FlagStore, tokens: &[String]| -> Result<()> {
                store.set(KEY_INPUT, &tokens[0]);
                Ok(())
            },
        )
        .positional()
        .help("Input a dir pattern and start processing"),
    );

    parser.add_flag(
        Flag::new(
            "threads",
            "t",
            Need::Argument,
            Binding::Store(KEY_THREADS.into()),
        )
        .help(threads_help),
    );
    parser.add_flag(
        Flag::new(
            "output",
            "o",
            Need::Argument,
            Binding::Store(KEY_OUTPUT.into()),
        )
        .help("Set output file (defaults to out.csv)"),
    );
    parser.add_flag(
        Flag::new(
            "exit",
            "e",
            Need::Nothing,
            Binding::Store(KEY_EXIT_ON_ERR.into()),
        )
        .help("Set whether to exit on error in a worker (defaults to false)"),
    );
    parser.add_flag(
        Flag::new(
            "select",
            "s",
            Need::Argument,
            Binding::Store(KEY_SELECT.into()),
        )
        .help("If provided, limit the amount of files being processed"),
    );

    parser.add_help();
    parser.add_version();

    parser
}

fn fail(err: &datproc::Error, code: i32) -> ! {
    eprintln!("{} {}", Colour::Red.paint("error:"), err);
    process::exit(code);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut store = FlagStore::new();
    store.set_bool(KEY_EXIT_ON_ERR, false);

    let threads_help = format!(
        "Set amounts of threads to use (defaults to {})",
        pipeline::default_threads()
    );

    let mut parser = build_parser(&threads_help);

    if let Err(e) = parser.parse(&mut store, cli_tokens()) {
        fail(&e, 1);
    }

    let view = store.freeze();

    // Nothing to do when only meta flags ran (e.g. `datproc --help`).
    if view.get(KEY_INPUT).is_none() {
        return;
    }

    if let Err(e) = pipeline::run(&view) {
        // EX_SOFTWARE: the worker phase failed.
        fail(&e, 70);
    }
}

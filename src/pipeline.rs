// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

//! The worker phase: expand the input pattern, score every file on a
//! sized thread pool, and write the collected table.
//!
//! All configuration comes from a frozen [FlagView]; nothing here writes
//! to the store.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::compute;
use crate::discover;
use crate::error::{Error, Result};
use crate::report::{ResultTable, Row};
use crate::store::FlagView;

/// Store key: input glob pattern.
pub const KEY_INPUT: &str = "INPUT";

/// Store key: worker pool width.
pub const KEY_THREADS: &str = "N_THREADS";

/// Store key: output file path.
pub const KEY_OUTPUT: &str = "OUTPUT";

/// Store key: abort the run on the first worker failure.
pub const KEY_EXIT_ON_ERR: &str = "EXIT_ON_ERR";

/// Store key: limit on the number of files processed.
pub const KEY_SELECT: &str = "SELECT_NUM";

/// Output path used when `OUTPUT` is unset.
pub const DEFAULT_OUTPUT: &str = "out.csv";

/// Default worker pool width when `N_THREADS` is unset.
pub fn default_threads() -> usize {
    num_cpus::get().saturating_sub(4).max(1)
}

/// Pool width from the store, falling back to [default_threads] when the
/// key is unset or unusable.
fn worker_count(view: &FlagView) -> usize {
    match view.get(KEY_THREADS) {
        None => default_threads(),
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => {
                log::warn!("ignoring unusable {} value {:?}", KEY_THREADS, raw);
                default_threads()
            }
        },
    }
}

/// Optional file-count limit from the store.
fn select_limit(view: &FlagView) -> Option<usize> {
    let raw = view.get(KEY_SELECT)?;

    match raw.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("ignoring unusable {} value {:?}", KEY_SELECT, raw);
            None
        }
    }
}

/// Score one input file.
fn process_item(path: &Path) -> Result<Row> {
    let score = compute::score_file(path)?;

    Ok(Row {
        id: discover::item_id(path),
        t_stat: score.t_stat,
        p_value: score.p_value,
    })
}

/// Run the full worker phase against a frozen configuration view.
///
/// Per-file failures are logged; with `EXIT_ON_ERR` set the first failure
/// aborts the run, otherwise the item is skipped.
pub fn run(view: &FlagView) -> Result<()> {
    let pattern = view
        .get(KEY_INPUT)
        .ok_or_else(|| Error::Pattern("no input pattern".into()))?;

    let mut files = discover::expand(pattern)?;

    if let Some(limit) = select_limit(view) {
        files.truncate(limit);
    }

    let threads = worker_count(view);
    let out_path = view.get(KEY_OUTPUT).unwrap_or(DEFAULT_OUTPUT);
    let exit_on_err = view.get_bool(KEY_EXIT_ON_ERR);

    println!(
        "Processing {} ({}) with {} threads",
        pattern,
        files.len(),
        threads
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Io(e.to_string()))?;

    let started = Instant::now();
    let total = files.len();
    let done = AtomicUsize::new(0);

    let scored: Vec<Option<Row>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let row = process_item(path);

                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!("processed {} ({}/{})", path.display(), n, total);

                match row {
                    Ok(row) => Ok(Some(row)),
                    Err(e) => {
                        log::error!("{}: {}", path.display(), e);

                        if exit_on_err {
                            Err(e)
                        } else {
                            log::info!("Continuing...");
                            Ok(None)
                        }
                    }
                }
            })
            .collect::<Result<Vec<Option<Row>>>>()
    })?;

    let table = ResultTable::new(scored.into_iter().flatten().collect());

    println!("Time taken: {:.4}", started.elapsed().as_secs_f64());
    println!("{}", table);

    println!("Writing result to {}", out_path);
    table.save(Path::new(out_path))?;

    Ok(())
}

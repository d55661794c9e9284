//! Automatic checkpoints driven by trace events
//!
//! Installing wraps whatever callback was already present for a granularity:
//! the composed callback runs it first, then checkpoints when the event comes
//! from the chosen source unit. The checkpoint uses the engine's configured
//! `default_retries` budget. Uninstalling puts the remembered callback back.

use crate::hook::{self, Granularity, TraceEvent, TraceFn};
use parking_lot::{const_mutex, Mutex};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Callbacks that were installed before checkpointing was turned on
static PRIOR: Mutex<BTreeMap<Granularity, Option<TraceFn>>> = const_mutex(BTreeMap::new());

/// Turn checkpointing on or off for every `granularity` event in `source_unit`
pub fn checkpoint_each(on: bool, granularity: Granularity, source_unit: &str) {
    let mut prior = PRIOR.lock();

    if !on {
        match prior.remove(&granularity) {
            Some(previous) => {
                hook::set_hook(granularity, previous);
                debug!(?granularity, "restored previous trace hook");
            }
            None => debug!(?granularity, "checkpointing was not on"),
        }
        return;
    }

    // Re-installing composes over the callback from before the first install
    let previous = prior
        .entry(granularity)
        .or_insert_with(|| hook::current_hook(granularity))
        .clone();
    hook::set_hook(granularity, Some(compose(previous, source_unit.to_string())));
    debug!(?granularity, source_unit, "checkpointing each event");
}

/// Checkpoint after every executed statement in `source_unit`
pub fn checkpoint_each_statement(on: bool, source_unit: &str) {
    checkpoint_each(on, Granularity::Statement, source_unit)
}

/// Checkpoint at every function call in `source_unit`
pub fn checkpoint_each_call(on: bool, source_unit: &str) {
    checkpoint_each(on, Granularity::Call, source_unit)
}

fn compose(previous: Option<TraceFn>, source_unit: String) -> TraceFn {
    Arc::new(move |event: &TraceEvent<'_>| {
        if let Some(previous) = &previous {
            previous(event);
        }
        if event.source_unit != source_unit {
            return;
        }
        // A trace macro site has nowhere to return an error to. Exiting normally
        // would hand ancestors a status they read as a rewind distance, so
        // end on a signal: every ancestor then fails with GenerationKilled
        if let Err(err) = rew_engine::checkpoint_default() {
            error!(%event, %err, "automatic checkpoint failed");
            eprintln!("rew: automatic checkpoint at {} failed: {}", event, err);
            std::process::abort();
        }
    })
}

//! Checkpoint/rewind scenarios across real generations
//!
//! Every scenario starts and finishes in the root generation. Descendants
//! only record what they observe and then rewind; the root checks the tape.

mod common;

use anyhow::{ensure, Result};
use common::{run, Tape};
use nix::sys::signal::{raise, Signal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rew_engine::{
    checkpoint, depth, is_root, named_checkpoint, named_checkpoints, named_rewind, rewind,
    rewind_all, Distance, RewError,
};

fn main() -> Result<()> {
    run("rewind_restores_rng_state", rewind_restores_rng_state)?;
    run("rewind_zero_is_noop", rewind_zero_is_noop)?;
    run("rewind_all_reaches_root", rewind_all_reaches_root)?;
    run("rewind_lands_at_exact_distance", rewind_lands_at_exact_distance)?;
    run("excess_distance_absorbed_by_root", excess_distance_absorbed_by_root)?;
    run("forwarding_does_not_rearm", forwarding_does_not_rearm)?;
    run("named_rewind_frees_name", named_rewind_frees_name)?;
    run("named_conflict_creates_no_generation", named_conflict_creates_no_generation)?;
    run("named_rewind_passes_inner_checkpoint", named_rewind_passes_inner_checkpoint)?;
    run("named_rewind_unknown_name_continues", named_rewind_unknown_name_continues)?;
    run("killed_generation_frees_name", killed_generation_frees_name)?;
    run("scoped_cleanup_skipped_on_rewind", scoped_cleanup_skipped_on_rewind)?;
    ensure!(is_root(), "scenarios must finish in the root generation");
    Ok(())
}

fn rewind_restores_rng_state() -> Result<()> {
    let tape = Tape::new()?;
    // An RNG held in process memory; ThreadRng reseeds itself after fork
    let mut rng = StdRng::from_entropy();

    tape.record(rng.gen::<u64>())?;
    checkpoint(1)?;
    tape.record(rng.gen::<u64>())?;
    rewind(Distance::ONE);
    tape.record(rng.gen::<u64>())?;

    let v: Vec<u64> = tape.values()?;
    ensure!(v.len() == 4, "expected 4 draws, got {:?}", v);
    ensure!(v[1] == v[2], "draw after rewind differs: {:?}", v);
    ensure!(v[0] != v[1], "draws collided: {:?}", v);
    ensure!(v[2] != v[3], "draws collided: {:?}", v);
    ensure!(v[0] != v[3], "draws collided: {:?}", v);
    Ok(())
}

fn rewind_zero_is_noop() -> Result<()> {
    for retries in [0u32, 1, 3] {
        let tape = Tape::new()?;
        let root_pid = std::process::id();

        checkpoint(retries)?;
        rewind(Distance::ZERO);
        tape.record(format!("{}:{}", std::process::id(), depth()))?;
        // Ends each descendant; absorbed once the budget is spent
        rewind(Distance::ONE);

        let entries = tape.entries()?;
        ensure!(
            entries.len() == retries as usize + 1,
            "retries={} gave {:?}",
            retries,
            entries
        );
        let (last, descendants) = entries.split_last().expect("at least the root entry");
        ensure!(*last == format!("{}:0", root_pid), "root entry wrong: {:?}", entries);
        for entry in descendants {
            ensure!(entry.ends_with(":1"), "descendant not one level deep: {:?}", entries);
            ensure!(!entry.starts_with(&format!("{}:", root_pid)), "root ran early: {:?}", entries);
        }
    }
    Ok(())
}

fn rewind_all_reaches_root() -> Result<()> {
    let tape = Tape::new()?;

    checkpoint(1)?;
    if is_root() {
        tape.record("root")?;
    } else {
        checkpoint(1)?;
        checkpoint(1)?;
        tape.record(format!("depth={}", depth()))?;
        rewind_all();
        tape.record("unreachable")?;
    }

    ensure!(tape.entries()? == ["depth=3", "root"], "got {:?}", tape.entries()?);
    Ok(())
}

fn rewind_lands_at_exact_distance() -> Result<()> {
    let tape = Tape::new()?;

    checkpoint(1)?;
    if is_root() {
        tape.record("landed=0")?;
        return check_tape(&tape, &["depth=3", "landed=1", "landed=0"]);
    }
    checkpoint(1)?;
    if depth() == 1 {
        tape.record("landed=1")?;
        rewind(Distance::ONE);
    }
    checkpoint(1)?;
    tape.record(format!("depth={}", depth()))?;
    // Discards this generation and its parent; lands in the depth 1 generation
    rewind(Distance::Levels(2));
    tape.record("unreachable")?;
    Ok(())
}

fn excess_distance_absorbed_by_root() -> Result<()> {
    let tape = Tape::new()?;

    checkpoint(1)?;
    if is_root() {
        tape.record("root")?;
        return check_tape(&tape, &["depth=2", "root"]);
    }
    checkpoint(1)?;
    tape.record(format!("depth={}", depth()))?;
    rewind(Distance::Levels(10));
    tape.record("unreachable")?;
    Ok(())
}

fn forwarding_does_not_rearm() -> Result<()> {
    let tape = Tape::new()?;

    checkpoint(1)?;
    if is_root() {
        tape.record("root")?;
        return check_tape(&tape, &["d4", "root"]);
    }
    checkpoint(1)?;
    // Budget left here must not start a new descendant while the rewind
    // passes through
    checkpoint(2)?;
    checkpoint(1)?;
    tape.record(format!("d{}", depth()))?;
    rewind(Distance::Levels(4));
    tape.record("unreachable")?;
    Ok(())
}

fn named_rewind_frees_name() -> Result<()> {
    let tape = Tape::new()?;

    named_checkpoint("n")?;
    if !is_root() {
        tape.record(format!("child:{}", named_checkpoints().join(",")))?;
        named_rewind("n")?;
    }
    tape.record(format!("root:{}", named_checkpoints().join(",")))?;

    // The name is free again
    named_checkpoint("n")?;
    if !is_root() {
        named_rewind("n")?;
    }
    tape.record("reused")?;

    check_tape(&tape, &["child:n", "root:", "reused"])?;
    ensure!(named_checkpoints().is_empty());
    Ok(())
}

fn named_conflict_creates_no_generation() -> Result<()> {
    let tape = Tape::new()?;
    let root_pid = std::process::id();

    named_checkpoint("dup")?;
    if !is_root() {
        let conflict = matches!(named_checkpoint("dup"), Err(RewError::NameConflict(_)));
        tape.record(format!("{}:{}", std::process::id(), conflict))?;
        named_rewind("dup")?;
    }
    tape.record(format!("{}:root", std::process::id()))?;

    let entries = tape.entries()?;
    ensure!(entries.len() == 2, "extra generation ran: {:?}", entries);
    ensure!(entries[0].ends_with(":true"), "no conflict reported: {:?}", entries);
    ensure!(!entries[0].starts_with(&format!("{}:", root_pid)));
    ensure!(entries[1] == format!("{}:root", root_pid));
    Ok(())
}

fn named_rewind_passes_inner_checkpoint() -> Result<()> {
    let tape = Tape::new()?;

    named_checkpoint("outer")?;
    if is_root() {
        tape.record(format!("root:{}", named_checkpoints().len()))?;
        return check_tape(&tape, &["deep:outer,inner", "root:0"]);
    }
    named_checkpoint("inner")?;
    tape.record(format!("deep:{}", named_checkpoints().join(",")))?;
    named_rewind("outer")?;
    tape.record("unreachable")?;
    Ok(())
}

fn named_rewind_unknown_name_continues() -> Result<()> {
    let tape = Tape::new()?;

    let from_root = named_rewind("ghost");
    ensure!(matches!(from_root, Err(RewError::UnknownCheckpoint(_))));

    checkpoint(1)?;
    if !is_root() {
        let reported = matches!(named_rewind("ghost"), Err(RewError::UnknownCheckpoint(_)));
        tape.record(format!("reported:{}", reported))?;
        rewind(Distance::ONE);
    }
    check_tape(&tape, &["reported:true"])
}

fn killed_generation_frees_name() -> Result<()> {
    let outcome = named_checkpoint("k");
    if !is_root() {
        let _ = raise(Signal::SIGKILL);
        rewind_all();
    }
    ensure!(
        matches!(outcome, Err(RewError::GenerationKilled { ref signal, .. }) if signal == "SIGKILL"),
        "got {:?}",
        outcome
    );
    ensure!(named_checkpoints().is_empty(), "name leaked: {:?}", named_checkpoints());

    named_checkpoint("k")?;
    if !is_root() {
        let _ = named_rewind("k");
    }
    ensure!(named_checkpoints().is_empty());
    Ok(())
}

/// Records when dropped
struct Witness<'a>(&'a Tape);

impl Drop for Witness<'_> {
    fn drop(&mut self) {
        let _ = self.0.record("dropped");
    }
}

fn scoped_cleanup_skipped_on_rewind() -> Result<()> {
    let tape = Tape::new()?;

    checkpoint(1)?;
    if !is_root() {
        let _witness = Witness(&tape);
        tape.record("descendant")?;
        rewind(Distance::ONE);
    }
    tape.record("root")?;

    check_tape(&tape, &["descendant", "root"])
}

fn check_tape(tape: &Tape, expected: &[&str]) -> Result<()> {
    let entries = tape.entries()?;
    ensure!(entries == expected, "expected {:?}, got {:?}", expected, entries);
    Ok(())
}

//! Anonymous checkpoints addressed by rewind distance

use crate::process::{self, Split};
use crate::Timeline;
use rew_core::{Distance, Result};
use tracing::{debug, trace};

/// What a waiting parent does with the distance its descendant reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Landing {
    /// The rewind stops at this checkpoint; re-arm it with the remaining budget
    Here,
    /// Root swallows a rewind aimed past it
    Absorbed,
    /// Keep unwinding towards the ancestor
    Forward(Distance),
}

pub(crate) fn settle(distance: Distance, is_root: bool) -> Landing {
    if distance.is_zero() {
        Landing::Here
    } else if is_root {
        Landing::Absorbed
    } else {
        Landing::Forward(distance)
    }
}

impl Timeline {
    /// Establish a point this generation can be rewound to
    ///
    /// With `retries == 0` this is a no-op, which lets a rewind pass this call
    /// site once its budget is spent. Otherwise the process is duplicated:
    /// the descendant returns at once and carries on, while this generation
    /// blocks until the descendant terminates. When the rewind lands here the
    /// checkpoint is re-armed with `retries - 1` and the call returns, so
    /// execution continues as if `checkpoint` had just returned. A rewind
    /// aimed further back terminates this generation too.
    ///
    /// Scoped guards and `Drop` impls alive in a generation that gets rewound
    /// away never run.
    pub fn checkpoint(&mut self, retries: u32) -> Result<()> {
        let pid = std::process::id();
        if retries == 0 {
            trace!(pid, depth = self.depth(), "checkpoint budget exhausted");
            return Ok(());
        }

        self.ensure_capacity()?;
        debug!(pid, depth = self.depth(), retries, "checkpoint");

        match process::split(self.config.flush_stdio)? {
            Split::Child => {
                self.generation.descend();
                Ok(())
            }
            Split::Parent(child) => {
                let status = process::await_generation(child)?;
                let distance = Distance::from_status(status);

                match settle(distance, self.is_root()) {
                    Landing::Here => {
                        debug!(pid, depth = self.depth(), "rewind landed");
                        self.checkpoint(retries - 1)
                    }
                    Landing::Absorbed => {
                        debug!(pid, %distance, "root absorbed rewind");
                        Ok(())
                    }
                    Landing::Forward(distance) => self.forward(distance),
                }
            }
        }
    }

    /// Revert to the checkpoint `distance` levels back
    ///
    /// Returns normally in the root generation or for a zero distance.
    /// Anywhere else this call does not return: the generation terminates
    /// abruptly and the ancestor resumes inside its `checkpoint` call.
    pub fn rewind(&self, distance: Distance) {
        if self.is_root() || distance.is_zero() {
            debug!(pid = std::process::id(), %distance, "rewind absorbed");
            return;
        }
        self.forward(distance)
    }

    /// Rewind every generation down to the root
    pub fn rewind_all(&self) {
        self.rewind(Distance::All)
    }

    fn forward(&self, distance: Distance) -> ! {
        debug!(
            pid = std::process::id(),
            depth = self.depth(),
            %distance,
            "rewinding"
        );
        self.terminate(distance.next_hop())
    }
}

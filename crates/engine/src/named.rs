//! Named checkpoints resolved through the registry

use crate::process::{self, Split};
use crate::Timeline;
use rew_core::{CheckpointName, Result, RewError};
use tracing::{debug, warn};

impl Timeline {
    /// Establish a checkpoint that [`named_rewind`](Timeline::named_rewind)
    /// can target by `name`
    ///
    /// Fails with [`RewError::NameConflict`] before duplicating anything when
    /// `name` is already live in this generation. The parent side lands when
    /// the descendant's code maps back to `name`, frees the name for reuse and
    /// returns; a code for an older name keeps the unwind going upward.
    pub fn named_checkpoint(&mut self, name: &CheckpointName) -> Result<()> {
        self.ensure_capacity()?;
        let pid = std::process::id();
        let code = self.generation.registry_mut().register(name)?;
        debug!(pid, depth = self.depth(), %name, code = code.get(), "named checkpoint");

        let child = match process::split(self.config.flush_stdio) {
            Ok(Split::Child) => {
                self.generation.descend();
                return Ok(());
            }
            Ok(Split::Parent(child)) => child,
            Err(err) => {
                self.generation.registry_mut().remove(code);
                return Err(err);
            }
        };

        let status = match process::await_generation(child) {
            Ok(status) => status,
            Err(err) => {
                self.generation.registry_mut().remove(code);
                return Err(err);
            }
        };
        match self.generation.registry().name_of(status) {
            Some(target) if target == name => {
                debug!(pid, %name, "named rewind landed");
            }
            Some(target) if !self.is_root() => {
                debug!(pid, %target, "passing named rewind upward");
                self.terminate(status)
            }
            Some(target) => {
                warn!(pid, %target, "root cannot pass named rewind further; absorbing");
            }
            // Normal exit or an anonymous distance: nothing addressed by name
            None => {
                debug!(pid, status = status.get(), %name, "landing on unregistered status");
            }
        }

        self.generation.registry_mut().remove(code);
        Ok(())
    }

    /// Rewind to the live checkpoint called `name`
    ///
    /// Only returns when no such checkpoint is reachable from this generation
    /// (the root, or a name missing from this generation's registry). That
    /// case is logged and reported as [`RewError::UnknownCheckpoint`].
    pub fn named_rewind(&self, name: &CheckpointName) -> Result<()> {
        let pid = std::process::id();
        match self.generation.registry().code_of(name) {
            Some(code) if !self.is_root() => {
                debug!(pid, depth = self.depth(), %name, code = code.get(), "named rewind");
                self.terminate(code)
            }
            _ => {
                warn!(pid, %name, "can't find checkpoint");
                Err(RewError::UnknownCheckpoint(name.to_string()))
            }
        }
    }
}

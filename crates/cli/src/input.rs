//! Shell input handling
//!
//! Lines are read straight from fd 0 one byte at a time. A buffered reader
//! would hold bytes the user has not submitted yet, and every generation
//! forked afterwards would replay them.

use nix::errno::Errno;
use rew_core::{Distance, Result, RewError};
use std::os::fd::AsRawFd;

/// What a submitted line asks the shell to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// Empty line or end of input
    Quit,
    /// Revert this many submitted lines
    Undo(Distance),
    /// Code for the evaluator
    Code(&'a str),
}

impl Input<'_> {
    /// Rewind distance that reverts the requested lines
    ///
    /// The generation reading the `undo` line has not changed anything yet,
    /// so reverting `n` lines discards `n + 1` generations.
    pub fn undo_distance(lines: Distance) -> Distance {
        match lines {
            Distance::All => Distance::All,
            Distance::Levels(n) => n.checked_add(1).map_or(Distance::All, Distance::from),
        }
    }
}

/// Interpret one line of shell input
pub fn classify(line: Option<&str>) -> Result<Input<'_>> {
    let line = match line.map(str::trim) {
        None | Some("") => return Ok(Input::Quit),
        Some(line) => line,
    };

    let mut words = line.split_whitespace();
    if words.next() != Some("undo") {
        return Ok(Input::Code(line));
    }
    let lines = match (words.next(), words.next()) {
        (None, _) => Distance::ONE,
        (Some(count), None) => count.parse()?,
        (Some(_), Some(extra)) => return Err(RewError::UnparsableDistance(extra.to_string())),
    };
    Ok(Input::Undo(Input::undo_distance(lines)))
}

/// Read one line from stdin without buffering past its newline
///
/// Returns `None` at end of input.
pub fn read_line() -> Result<Option<String>> {
    let fd = std::io::stdin().as_raw_fd();
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match nix::unistd::read(fd, &mut byte) {
            Ok(0) if line.is_empty() => return Ok(None),
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => line.push(byte[0]),
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                return Err(RewError::Io {
                    context: "reading stdin".to_string(),
                    source: errno.into(),
                })
            }
        }
    }

    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

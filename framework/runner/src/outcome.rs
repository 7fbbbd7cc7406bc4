//! Deciding whether the tracked player won, from the tail of the engine client log.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;

use vcmi_autotest_core::prelude::PlayerColor;

/// Bytes at the end of the log that are scanned for an outcome.
pub const DEFAULT_TAIL_WINDOW: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
}

/// How often, and how far apart, the log is checked before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub attempts: u32,
    /// Slept before every attempt.
    pub interval: Duration,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}

impl PollBudget {
    /// Worst case time spent polling one scenario. Saturates at [`Duration::MAX`].
    pub fn total(&self) -> Duration {
        self.interval
            .checked_mul(self.attempts)
            .unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogAccessError {
    #[error("Log file is locked by another process")]
    Locked,
    #[error("Failed to read log file: {0}")]
    Io(#[from] std::io::Error),
}

pub trait LogReader: Read + Seek {}

impl<T: Read + Seek> LogReader for T {}

/// Somewhere the engine client log can be opened for reading while nobody else holds it.
pub trait LogSource {
    fn open_exclusive(&self) -> Result<Box<dyn LogReader>, LogAccessError>;
}

/// The client log on disk.
///
/// The file is locked exclusively for the duration of a read. On Windows it is also opened
/// without sharing, so a client still writing to it makes the open fail. Elsewhere the lock is
/// advisory.
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for FileLogSource {
    fn open_exclusive(&self) -> Result<Box<dyn LogReader>, LogAccessError> {
        let file = open_unshared(&self.path)?;
        match file.try_lock() {
            Ok(()) => Ok(Box::new(file)),
            Err(std::fs::TryLockError::WouldBlock) => Err(LogAccessError::Locked),
            Err(std::fs::TryLockError::Error(e)) => Err(e.into()),
        }
    }
}

#[cfg(windows)]
fn open_unshared(path: &std::path::Path) -> Result<File, LogAccessError> {
    use std::os::windows::fs::OpenOptionsExt;

    const ERROR_SHARING_VIOLATION: i32 = 32;

    OpenOptions::new()
        .read(true)
        .share_mode(0)
        .open(path)
        .map_err(|e| match e.raw_os_error() {
            Some(ERROR_SHARING_VIOLATION) => LogAccessError::Locked,
            _ => e.into(),
        })
}

#[cfg(not(windows))]
fn open_unshared(path: &std::path::Path) -> Result<File, LogAccessError> {
    Ok(OpenOptions::new().read(true).open(path)?)
}

/// Polls the client log for the tracked player's win or loss line.
pub struct OutcomeDetector {
    source: Box<dyn LogSource>,
    budget: PollBudget,
    tail_window: u64,
}

impl OutcomeDetector {
    pub fn new(source: Box<dyn LogSource>, budget: PollBudget) -> Self {
        Self {
            source,
            budget,
            tail_window: DEFAULT_TAIL_WINDOW,
        }
    }

    pub fn with_tail_window(mut self, tail_window: u64) -> Self {
        self.tail_window = tail_window;
        self
    }

    /// Never fails. A log that cannot be read, or that holds no outcome for `player`, once the
    /// budget is spent resolves to [`Verdict::Lost`].
    pub fn detect(&self, player: PlayerColor) -> Verdict {
        for attempt in 1..=self.budget.attempts {
            std::thread::sleep(self.budget.interval);

            match self.scan(player) {
                Ok(Some(verdict)) => {
                    log::debug!("Outcome for player {player} on poll {attempt}: {verdict:?}");
                    return verdict;
                }
                Ok(None) => {
                    log::trace!("No outcome for player {player} in the log yet (poll {attempt})");
                }
                Err(LogAccessError::Locked) => {
                    log::debug!("Client log is still locked (poll {attempt})");
                }
                Err(e) => {
                    log::warn!("Poll {attempt} of the client log failed: {e}");
                }
            }
        }

        log::warn!(
            "No outcome for player {player} after {} polls over {:?}, counting it as lost",
            self.budget.attempts,
            self.budget.total()
        );
        Verdict::Lost
    }

    fn scan(&self, player: PlayerColor) -> Result<Option<Verdict>, LogAccessError> {
        let mut reader = self.source.open_exclusive()?;

        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(len.saturating_sub(self.tail_window)))?;

        Ok(find_outcome(BufReader::new(reader), player)?)
    }
}

/// Outcome of the first line, in file order, that ends with one of `player`'s markers.
fn find_outcome<R: BufRead>(
    mut reader: R,
    player: PlayerColor,
) -> std::io::Result<Option<Verdict>> {
    let loss_marker = player.loss_marker();
    let win_marker = player.win_marker();

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            continue;
        }

        if line.ends_with(&loss_marker) {
            return Ok(Some(Verdict::Lost));
        }
        if line.ends_with(&win_marker) {
            return Ok(Some(Verdict::Won));
        }
    }
}

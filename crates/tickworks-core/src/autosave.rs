//! Periodic, non-blocking session persistence.
//!
//! The snapshot is encoded on the caller's thread (a copy of the state at a
//! tick boundary), then written on a background thread with the
//! write-temp-then-rename pattern. A save that falls due while the previous
//! write is still running is skipped; the simulation never waits on disk.

use crate::engine::Engine;
use crate::serialize::SerializeError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What [`Autosaver::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveOutcome {
    NotDue,
    /// A write was handed to the background thread.
    Started,
    /// Due, but the previous write has not finished.
    SkippedInFlight,
}

#[derive(Debug)]
pub struct Autosaver {
    path: PathBuf,
    interval: Duration,
    last_save: Option<Instant>,
    in_flight: Option<JoinHandle<io::Result<()>>>,
}

impl Autosaver {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            last_save: None,
            in_flight: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a background save if the interval has elapsed. The first poll
    /// only starts the interval.
    pub fn poll(&mut self, engine: &Engine, now: Instant) -> Result<AutosaveOutcome, SerializeError> {
        self.reap();
        let Some(last) = self.last_save else {
            self.last_save = Some(now);
            return Ok(AutosaveOutcome::NotDue);
        };
        if now.saturating_duration_since(last) < self.interval {
            return Ok(AutosaveOutcome::NotDue);
        }
        if self.in_flight.is_some() {
            debug!(path = %self.path.display(), "previous autosave still running, skipping");
            return Ok(AutosaveOutcome::SkippedInFlight);
        }
        self.save_now(engine)?;
        self.last_save = Some(now);
        Ok(AutosaveOutcome::Started)
    }

    /// Encode now and write in the background, regardless of the interval.
    /// A write already in flight is waited for first.
    pub fn save_now(&mut self, engine: &Engine) -> Result<(), SerializeError> {
        let data = engine.snapshot_bytes()?;
        if let Err(err) = self.wait() {
            warn!(error = %err, "previous autosave failed");
        }
        let path = self.path.clone();
        let tick = engine.tick_count();
        self.in_flight = Some(thread::spawn(move || {
            let result = atomic_write(&path, &data);
            match &result {
                Ok(()) => info!(path = %path.display(), tick, bytes = data.len(), "autosaved"),
                Err(err) => warn!(path = %path.display(), error = %err, "autosave write failed"),
            }
            result
        }));
        Ok(())
    }

    /// Block until the in-flight write, if any, completes.
    pub fn wait(&mut self) -> io::Result<()> {
        match self.in_flight.take() {
            Some(handle) => join(handle),
            None => Ok(()),
        }
    }

    pub fn is_writing(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn reap(&mut self) {
        if self.in_flight.as_ref().is_some_and(JoinHandle::is_finished) {
            // Outcome already logged by the writer thread.
            let _ = self.wait();
        }
    }

    /// Restore `engine` from the save file, or reset it to a fresh session if
    /// the file is missing or unreadable. Returns whether a save was loaded.
    pub fn load_or_default(&self, engine: &mut Engine) -> bool {
        match fs::read(&self.path) {
            Ok(data) => engine.restore_bytes_or_default(&data),
            Err(err) => {
                if err.kind() == io::ErrorKind::NotFound {
                    info!(path = %self.path.display(), "no save file, starting a fresh session");
                } else {
                    warn!(path = %self.path.display(), error = %err, "cannot read save file, starting a fresh session");
                }
                engine.reset();
                false
            }
        }
    }
}

fn join(handle: JoinHandle<io::Result<()>>) -> io::Result<()> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("autosave thread panicked")))
}

/// Write `data` to `{path}.tmp`, flush it to disk, then rename over `path`.
/// A crash mid-write leaves the previous file intact.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

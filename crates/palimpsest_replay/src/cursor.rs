//! Cursor for scrubbing through a file's history.
//!
//! The cursor keeps the content at its current position so that small
//! moves replay only the records in between.

use crate::engine::{ReplayEngine, ReplayError};
use crate::patch::Direction;
use palimpsest_core::Timestamp;

/// Position and content of a scrub through one log
#[derive(Debug, Clone)]
pub struct Scrubber<'a> {
    engine: ReplayEngine<'a>,
    position: usize,
    content: String,
    direction: Direction,
}

impl<'a> Scrubber<'a> {
    /// Start at record `index`
    ///
    /// # Errors
    ///
    /// Returns error if the content at `index` cannot be restored
    pub fn at(engine: ReplayEngine<'a>, index: usize) -> Result<Self, ReplayError> {
        let content = engine.restore(index)?;
        Ok(Self {
            engine,
            position: index,
            content,
            direction: Direction::Forward,
        })
    }

    /// Start at the first record
    ///
    /// # Errors
    ///
    /// Returns error if the log does not start with a restoration point
    pub fn new(engine: ReplayEngine<'a>) -> Result<Self, ReplayError> {
        Self::at(engine, 0)
    }

    /// Current record index
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.position
    }

    /// Content after the current record
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Direction of the last move
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Move to record `index`
    ///
    /// On failure the cursor stays where it was.
    ///
    /// # Errors
    ///
    /// Returns error if replay between the positions fails
    pub fn seek(&mut self, index: usize) -> Result<&str, ReplayError> {
        let content = self
            .engine
            .restore_from(&self.content, self.position, index)?;
        if index != self.position {
            self.direction = if index > self.position {
                Direction::Forward
            } else {
                Direction::Backward
            };
        }
        self.position = index;
        self.content = content;
        Ok(&self.content)
    }

    /// Move to the record visible at `time`
    ///
    /// # Errors
    ///
    /// Returns error if `time` is outside the log or replay fails
    pub fn seek_time(&mut self, time: Timestamp) -> Result<&str, ReplayError> {
        let index = self
            .engine
            .log()
            .find_by_time(time)
            .ok_or(ReplayError::NotInSpan { time })?;
        self.seek(index)
    }

    /// Move `count` records forward, stopping at the last record
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn step_forward(&mut self, count: usize) -> Result<&str, ReplayError> {
        let last = self.engine.log().len().saturating_sub(1);
        self.seek(self.position.saturating_add(count).min(last))
    }

    /// Move `count` records backward, stopping at the first record
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn step_backward(&mut self, count: usize) -> Result<&str, ReplayError> {
        self.seek(self.position.saturating_sub(count))
    }

    /// Return to the first record
    ///
    /// # Errors
    ///
    /// Returns error if replay fails
    pub fn reset(&mut self) -> Result<&str, ReplayError> {
        self.seek(0)?;
        self.direction = Direction::Forward;
        Ok(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palimpsest_log::{FileAction, OperationLog, OperationRecord as R};

    fn log() -> OperationLog {
        OperationLog::new(
            "f.rs",
            vec![
                R::file(0, 0, "f.rs", FileAction::Open, "ab"),
                R::edit(1, 10, "f.rs", 1, "X", ""),
                R::edit(2, 20, "f.rs", 0, "", "a"),
                R::edit(3, 30, "f.rs", 2, "!", ""),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_scrubber_new() {
        let log = log();
        let scrubber = Scrubber::new(ReplayEngine::new(&log)).unwrap();
        assert_eq!(scrubber.pos(), 0);
        assert_eq!(scrubber.content(), "ab");
    }

    #[test]
    fn test_scrubber_step_forward_and_back() {
        let log = log();
        let mut scrubber = Scrubber::new(ReplayEngine::new(&log)).unwrap();
        assert_eq!(scrubber.step_forward(1).unwrap(), "aXb");
        assert_eq!(scrubber.step_forward(2).unwrap(), "Xb!");
        assert_eq!(scrubber.direction(), Direction::Forward);

        assert_eq!(scrubber.step_backward(1).unwrap(), "Xb");
        assert_eq!(scrubber.direction(), Direction::Backward);
        assert_eq!(scrubber.pos(), 2);
    }

    #[test]
    fn test_scrubber_clamps_at_ends() {
        let log = log();
        let mut scrubber = Scrubber::at(ReplayEngine::new(&log), 2).unwrap();
        assert_eq!(scrubber.step_forward(10).unwrap(), "Xb!");
        assert_eq!(scrubber.pos(), 3);
        assert_eq!(scrubber.step_backward(10).unwrap(), "ab");
        assert_eq!(scrubber.pos(), 0);
    }

    #[test]
    fn test_scrubber_seek_time() {
        let log = log();
        let mut scrubber = Scrubber::new(ReplayEngine::new(&log)).unwrap();
        assert_eq!(scrubber.seek_time(Timestamp::from_millis(25)).unwrap(), "Xb");
        assert!(scrubber.seek_time(Timestamp::from_millis(99)).is_err());
        assert_eq!(scrubber.pos(), 2);
    }

    #[test]
    fn test_scrubber_reset() {
        let log = log();
        let mut scrubber = Scrubber::at(ReplayEngine::new(&log), 3).unwrap();
        assert_eq!(scrubber.reset().unwrap(), "ab");
        assert_eq!(scrubber.pos(), 0);
        assert_eq!(scrubber.direction(), Direction::Forward);
    }

    #[test]
    fn test_scrubber_seek_out_of_bounds_keeps_position() {
        let log = log();
        let mut scrubber = Scrubber::at(ReplayEngine::new(&log), 1).unwrap();
        assert!(scrubber.seek(4).is_err());
        assert_eq!(scrubber.pos(), 1);
        assert_eq!(scrubber.content(), "aXb");
    }
}

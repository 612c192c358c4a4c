//! PALIMPSEST Replay Engine
//!
//! Reconstructs the text of a file at any point of its history.
//! Patches are checked against the buffer before they are applied, and
//! logs with gaps between a close and the next open can be healed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod engine;
pub mod heal;
pub mod patch;

pub use cursor::Scrubber;
pub use engine::{Divergence, ReplayConfig, ReplayEngine, ReplayError, VerifyReport};
pub use heal::{HealReport, HealedGap, heal};
pub use patch::{Direction, PatchError, apply, apply_backward, apply_forward};

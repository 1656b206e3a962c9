//! Pure policies that keep a turn log valid and bounded.
//!
//! A *logical group* starts at a plain user turn and runs through the next
//! model answer, covering any call/response turns in between.
//!
//! ```rust
//! use tchat::history::{HistoryLimits, group_ranges, prepare};
//! use tprovider::Turn;
//!
//! let history = vec![
//!     Turn::user("q1"),
//!     Turn::model("a1"),
//!     Turn::user("q2"),
//!     Turn::model("a2"),
//!     Turn::user("dangling"),
//! ];
//!
//! assert_eq!(group_ranges(&history), vec![0..2, 2..4, 4..5]);
//!
//! let prepared = prepare(history, &HistoryLimits::default());
//! assert_eq!(prepared.len(), 4);
//! ```

mod media;
mod sanitize;
mod trim;

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tprovider::Turn;

pub use media::{MEDIA_PLACEHOLDER, evict_media};
pub use sanitize::{sanitize, strip_tool_exchanges};
pub use trim::{limit_groups, trim_to_budget};

/// Index ranges of the logical groups in `history`, oldest first.
pub fn group_ranges(history: &[Turn]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;

    for (index, turn) in history.iter().enumerate() {
        if turn.is_user_plain() && index > start {
            groups.push(start..index);
            start = index;
        }

        if turn.is_model_answer() {
            groups.push(start..index + 1);
            start = index + 1;
        }
    }

    if start < history.len() {
        groups.push(start..history.len());
    }

    groups
}

/// Start index of the newest logical group, if any.
pub fn last_group_start(history: &[Turn]) -> Option<usize> {
    group_ranges(history).last().map(|range| range.start)
}

fn default_char_budget() -> usize {
    60_000
}

fn default_max_groups() -> usize {
    30
}

fn default_media_window() -> usize {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLimits {
    #[serde(default = "default_char_budget")]
    pub char_budget: usize,
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,
    /// Groups from the end within which the newest media turn keeps its bytes.
    #[serde(default = "default_media_window")]
    pub media_window: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            char_budget: default_char_budget(),
            max_groups: default_max_groups(),
            media_window: default_media_window(),
        }
    }
}

/// Media eviction, then sanitizing, then the char budget, then the group cap.
pub fn prepare(history: Vec<Turn>, limits: &HistoryLimits) -> Vec<Turn> {
    let history = evict_media(history, limits.media_window);
    let history = sanitize(history);
    let history = trim_to_budget(history, limits.char_budget);
    limit_groups(history, limits.max_groups)
}

//! Binary payload retention for turn logs.

use tprovider::{Part, Turn};

use super::group_ranges;

pub const MEDIA_PLACEHOLDER: &str = "[media omitted]";

/// Keeps media bytes only in the newest media-carrying turn, and only while
/// that turn lies within `window` logical groups of the end (its own group
/// counts as one).
pub fn evict_media(mut history: Vec<Turn>, window: usize) -> Vec<Turn> {
    let media_turns = history
        .iter()
        .enumerate()
        .filter(|(_, turn)| turn.has_media())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let Some(&newest) = media_turns.last() else {
        return history;
    };

    let groups = group_ranges(&history);
    let groups_from_end = groups
        .iter()
        .position(|range| range.contains(&newest))
        .map(|position| groups.len() - position)
        .unwrap_or(usize::MAX);
    let keep_newest = groups_from_end <= window;

    for index in media_turns {
        if index == newest && keep_newest {
            continue;
        }

        strip_media(&mut history[index]);
    }

    history
}

fn strip_media(turn: &mut Turn) {
    turn.parts.retain(|part| !part.is_media());
    if turn.parts.is_empty() {
        turn.parts.push(Part::text(MEDIA_PLACEHOLDER));
    }
}

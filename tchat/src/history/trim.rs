//! Group-aligned size bounds for turn logs.

use tprovider::{Turn, history_text_chars};

use super::group_ranges;

/// Keeps the newest groups whose combined text fits `budget` characters.
///
/// The newest group survives on its own as long as none of its turns alone
/// exceeds `budget`; otherwise the result is empty. Partial groups are never kept.
///
/// This deliberately departs from clearing the log whenever the newest group as a
/// whole is over budget: a long question with a long answer, each within budget,
/// stays as the only context.
pub fn trim_to_budget(mut history: Vec<Turn>, budget: usize) -> Vec<Turn> {
    let groups = group_ranges(&history);
    let Some(newest) = groups.last() else {
        return history;
    };

    if history[newest.clone()]
        .iter()
        .any(|turn| turn.text_chars() > budget)
    {
        return Vec::new();
    }

    let mut total = history_text_chars(&history[newest.clone()]);
    let mut cutoff = newest.start;

    for range in groups.iter().rev().skip(1) {
        let chars = history_text_chars(&history[range.clone()]);
        if total + chars > budget {
            break;
        }

        total += chars;
        cutoff = range.start;
    }

    history.split_off(cutoff)
}

/// Keeps only the newest `max_groups` logical groups.
pub fn limit_groups(mut history: Vec<Turn>, max_groups: usize) -> Vec<Turn> {
    let groups = group_ranges(&history);
    if groups.len() <= max_groups {
        return history;
    }

    if max_groups == 0 {
        return Vec::new();
    }

    let cutoff = groups[groups.len() - max_groups].start;
    history.split_off(cutoff)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tprovider::{Part, Role, history_text_chars};

    use super::*;
    use crate::history::sanitize;

    fn text(len: usize) -> String {
        "x".repeat(len)
    }

    fn call(name: &str) -> Turn {
        Turn::new(Role::Model, vec![Part::function_call(name, json!({}))])
    }

    fn response(name: &str) -> Turn {
        Turn::new(Role::User, vec![Part::function_response(name, json!("ok"))])
    }

    #[test]
    fn trimming_tool_exchanges_keeps_whole_groups() {
        let history = sanitize(vec![
            Turn::user(text(10)),
            call("a"),
            response("a"),
            Turn::model(text(10)),
            Turn::user(text(10)),
            Turn::model(text(10)),
            Turn::user(text(5)),
            call("b"),
            response("b"),
            call("c"),
            response("c"),
            Turn::model(text(15)),
        ]);
        assert_eq!(history.len(), 12);
        let starts = group_ranges(&history)
            .iter()
            .map(|range| range.start)
            .collect::<Vec<_>>();
        assert_eq!(starts, vec![0, 4, 6]);

        let cases = [
            (60, Some(0)),
            (59, Some(4)),
            (45, Some(4)),
            (40, Some(4)),
            (39, Some(6)),
            (25, Some(6)),
            (19, Some(6)),
            (14, None),
        ];

        for (budget, cutoff) in cases {
            let trimmed = trim_to_budget(history.clone(), budget);

            match cutoff {
                Some(cutoff) => {
                    assert!(starts.contains(&cutoff));
                    assert_eq!(trimmed, history[cutoff..].to_vec(), "budget {budget}");
                    assert!(
                        history_text_chars(&trimmed) <= budget || cutoff == starts[2],
                        "budget {budget}"
                    );
                }
                None => assert!(trimmed.is_empty(), "budget {budget}"),
            }
        }
    }

    #[test]
    fn small_history_is_unchanged() {
        let history = vec![Turn::user("hi"), Turn::model("hello")];

        assert_eq!(trim_to_budget(history.clone(), 10_000), history);
    }

    #[test]
    fn oversized_history_keeps_newest_group_or_nothing() {
        let history = vec![
            Turn::user(text(1000)),
            Turn::model(text(1000)),
            Turn::user(text(1000)),
            Turn::model(text(1000)),
        ];

        assert_eq!(trim_to_budget(history.clone(), 1500), history[2..].to_vec());
        assert!(trim_to_budget(history, 500).is_empty());
    }

    #[test]
    fn older_groups_are_kept_while_they_fit() {
        let history = vec![
            Turn::user(text(10)),
            Turn::model(text(10)),
            Turn::user(text(10)),
            Turn::model(text(10)),
            Turn::user(text(10)),
            Turn::model(text(10)),
        ];

        let trimmed = trim_to_budget(history.clone(), 45);
        assert_eq!(trimmed, history[2..].to_vec());
        assert!(history_text_chars(&trimmed) <= 45);
    }

    #[test]
    fn media_does_not_count_toward_the_budget() {
        let history = vec![
            Turn::user("look").with_part(Part::media(vec![0; 4096], "image/png")),
            Turn::model("nice"),
        ];

        assert_eq!(trim_to_budget(history.clone(), 8), history);
    }

    #[test]
    fn limit_groups_keeps_newest_groups() {
        let history = vec![
            Turn::user("q1"),
            Turn::model("a1"),
            Turn::user("q2"),
            Turn::model("a2"),
            Turn::user("q3"),
            Turn::model("a3"),
        ];

        assert_eq!(limit_groups(history.clone(), 2), history[2..].to_vec());
        assert_eq!(limit_groups(history.clone(), 5), history);
        assert!(limit_groups(history, 0).is_empty());
    }
}

//! Serde-loadable request driver configuration.
//!
//! ```rust
//! use tchat::DriverConfig;
//!
//! let config: DriverConfig =
//!     serde_json::from_str(r#"{"history": {"char_budget": 1000}, "retry": {"max_attempts": 2}}"#)
//!         .expect("config should parse");
//!
//! assert_eq!(config.history.char_budget, 1000);
//! assert_eq!(config.history.max_groups, 30);
//! assert_eq!(config.retry.max_attempts, 2);
//! assert_eq!(config.max_query_chars, 300_000);
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tprovider::RetryPolicy;

use crate::history::HistoryLimits;

pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 2.0);
pub const MAX_TOKENS_RANGE: (u32, u32) = (10, 8000);

fn default_max_query_chars() -> usize {
    300_000
}

fn default_malformed_history_repairs() -> u32 {
    1
}

fn default_leaked_tool_prefixes() -> Vec<String> {
    [
        "```python\nprint(default_api.",
        "```tool_code\nprint(default_api.",
        "```json\n{\n  \"tool_code\":",
        "```python\nprint(telegram_bot_api.",
        "```\nprint(default_api.",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_repeat_collapse() -> Option<RepeatCollapse> {
    Some(RepeatCollapse::default())
}

const LONG_SPACE_RUN: usize = 1000;
const SPACE_RUN_KEEP: usize = 10;

/// Shortening of degenerate answers that loop on the same fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatCollapse {
    /// Longest fragment, in chars, checked for repetition.
    pub max_unit_chars: usize,
    /// Consecutive copies needed before a run is shortened.
    pub min_repetitions: usize,
    /// Copies left in place of a shortened run.
    pub keep_repetitions: usize,
    /// The shortened answer is used only when it saves more chars than this.
    pub min_savings: usize,
}

impl Default for RepeatCollapse {
    fn default() -> Self {
        Self {
            max_unit_chars: 100,
            min_repetitions: 20,
            keep_repetitions: 5,
            min_savings: 100,
        }
    }
}

impl RepeatCollapse {
    /// Collapses space runs of 1000+ to ten spaces, then cuts every long run of a
    /// repeated fragment down to `keep_repetitions` copies.
    pub fn collapse(&self, text: &str) -> String {
        let chars = collapse_space_runs(text);
        let mut collapsed = String::with_capacity(text.len());
        let mut index = 0;

        while index < chars.len() {
            match self.repeated_unit(&chars, index) {
                Some((unit, count)) => {
                    for _ in 0..self.keep_repetitions {
                        collapsed.extend(&chars[index..index + unit]);
                    }
                    index += unit * count;
                }
                None => {
                    collapsed.push(chars[index]);
                    index += 1;
                }
            }
        }

        collapsed
    }

    // Shortest fragment starting at `start` that repeats at least `min_repetitions` times.
    fn repeated_unit(&self, chars: &[char], start: usize) -> Option<(usize, usize)> {
        let min_repetitions = self.min_repetitions.max(2);
        let rest = &chars[start..];
        let max_unit = self.max_unit_chars.min(rest.len() / min_repetitions);

        (1..=max_unit).find_map(|unit| {
            let pattern = &rest[..unit];
            let count = rest
                .chunks_exact(unit)
                .take_while(|chunk| *chunk == pattern)
                .count();
            (count >= min_repetitions).then_some((unit, count))
        })
    }
}

fn collapse_space_runs(text: &str) -> Vec<char> {
    let mut chars = Vec::with_capacity(text.len());
    let mut spaces = 0;

    for ch in text.chars() {
        if ch == ' ' {
            spaces += 1;
            continue;
        }

        push_spaces(&mut chars, spaces);
        spaces = 0;
        chars.push(ch);
    }

    push_spaces(&mut chars, spaces);
    chars
}

fn push_spaces(chars: &mut Vec<char>, run: usize) {
    let keep = if run >= LONG_SPACE_RUN { SPACE_RUN_KEEP } else { run };
    chars.extend(std::iter::repeat_n(' ', keep));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub history: HistoryLimits,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    /// Local repairs allowed per exchange that do not consume an attempt.
    #[serde(default = "default_malformed_history_repairs")]
    pub malformed_history_repairs: u32,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Answers starting with one of these are tool invocations leaked as text.
    #[serde(default = "default_leaked_tool_prefixes")]
    pub leaked_tool_prefixes: Vec<String>,
    /// `None` returns answers as the model wrote them.
    #[serde(default = "default_repeat_collapse")]
    pub repeat_collapse: Option<RepeatCollapse>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            history: HistoryLimits::default(),
            max_query_chars: default_max_query_chars(),
            malformed_history_repairs: default_malformed_history_repairs(),
            retry: RetryPolicy::default(),
            leaked_tool_prefixes: default_leaked_tool_prefixes(),
            repeat_collapse: default_repeat_collapse(),
        }
    }
}

impl DriverConfig {
    pub fn is_leaked_tool_call(&self, answer: &str) -> bool {
        self.leaked_tool_prefixes
            .iter()
            .any(|prefix| answer.starts_with(prefix.as_str()))
    }

    /// `answer` with repeated runs collapsed, when that shortens it enough.
    pub fn shorten_answer<'a>(&self, answer: &'a str) -> Cow<'a, str> {
        let Some(rule) = &self.repeat_collapse else {
            return Cow::Borrowed(answer);
        };

        let collapsed = rule.collapse(answer);
        if collapsed.chars().count() + rule.min_savings < answer.chars().count() {
            Cow::Owned(collapsed)
        } else {
            Cow::Borrowed(answer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: DriverConfig = serde_json::from_str("{}").expect("config should parse");

        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.history.char_budget, 60_000);
        assert_eq!(config.malformed_history_repairs, 1);
    }

    #[test]
    fn leaked_tool_prefixes_are_detected() {
        let config = DriverConfig::default();

        assert!(config.is_leaked_tool_call("```tool_code\nprint(default_api.search(q='x'))"));
        assert!(!config.is_leaked_tool_call("```python\nprint('hello')\n```"));
    }

    #[test]
    fn looping_answers_are_shortened() {
        let config = DriverConfig::default();
        let answer = format!("Sure.{}Done.", "na ".repeat(200));

        let shortened = config.shorten_answer(&answer);

        assert_eq!(shortened, format!("Sure.{}Done.", "na ".repeat(5)));
    }

    #[test]
    fn long_space_runs_collapse_to_ten_spaces() {
        let rule = RepeatCollapse {
            min_repetitions: 5_000,
            ..RepeatCollapse::default()
        };

        assert_eq!(
            rule.collapse(&format!("a{}b  c", " ".repeat(1_500))),
            format!("a{}b  c", " ".repeat(10))
        );
        assert_eq!(rule.collapse(&" ".repeat(999)), " ".repeat(999));
    }

    #[test]
    fn small_savings_keep_the_original_answer() {
        let config = DriverConfig::default();
        let table = format!("| a | b |\n|{}|", "-".repeat(40));

        assert!(matches!(config.shorten_answer(&table), Cow::Borrowed(_)));
        assert_eq!(config.shorten_answer(&table), table);
    }

    #[test]
    fn repeat_collapse_can_be_disabled() {
        let config: DriverConfig =
            serde_json::from_str(r#"{"repeat_collapse": null}"#).expect("config should parse");
        let answer = "x".repeat(1_000);

        assert!(config.repeat_collapse.is_none());
        assert_eq!(config.shorten_answer(&answer), answer);
    }
}

//! Frequency summaries of submitted answers.
//!
//! [`summarize`] folds the raw answer values of one question into a top-N
//! breakdown. It does no I/O; [`AnalyticsService`](crate::services::AnalyticsService)
//! loads the data and calls it once per question.

use std::collections::HashMap;
use std::hash::Hash;

use formkit_db::entities::{answer::AnswerValue, question::QuestionType};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Number of ranked entries kept per question.
pub const TOP_N: usize = 5;

/// Shortest word, in characters, counted for text questions.
pub const MIN_WORD_CHARS: usize = 5;

/// A word and how often it appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// A checkbox selection, sorted, and how often it was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboCount {
    pub combination: Vec<String>,
    pub count: u64,
}

/// A dropdown option and how often it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionCount {
    pub option: String,
    pub count: u64,
}

/// Summary for one question, serialized as `{"type": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum QuestionAnalytics {
    Text {
        top_words: Vec<WordCount>,
        others: u64,
    },
    Dropdown {
        top_options: Vec<OptionCount>,
        others: u64,
    },
    Checkbox {
        top_combos: Vec<ComboCount>,
        others: u64,
    },
}

impl QuestionAnalytics {
    /// Occurrences outside the top entries.
    #[must_use]
    pub const fn others(&self) -> u64 {
        match self {
            Self::Text { others, .. }
            | Self::Dropdown { others, .. }
            | Self::Checkbox { others, .. } => *others,
        }
    }
}

/// Per-question summaries of one form, in question order.
///
/// Serializes as a JSON object keyed by question id. Keys keep question order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormAnalytics {
    entries: Vec<(String, QuestionAnalytics)>,
}

impl FormAnalytics {
    /// Empty summary.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append the summary of the next question.
    pub fn push(&mut self, question_id: String, analytics: QuestionAnalytics) {
        self.entries.push((question_id, analytics));
    }

    /// Summary for one question.
    #[must_use]
    pub fn get(&self, question_id: &str) -> Option<&QuestionAnalytics> {
        self.entries
            .iter()
            .find(|(id, _)| id == question_id)
            .map(|(_, analytics)| analytics)
    }

    /// Question ids in order.
    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FormAnalytics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (question_id, analytics) in &self.entries {
            map.serialize_entry(question_id, analytics)?;
        }
        map.end()
    }
}

/// Occurrence counter that remembers first-seen order.
struct Tally<K> {
    counts: Vec<(K, u64)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    fn new() -> Self {
        Self {
            counts: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, key: K) {
        if let Some(&slot) = self.index.get(&key) {
            self.counts[slot].1 += 1;
        } else {
            self.index.insert(key.clone(), self.counts.len());
            self.counts.push((key, 1));
        }
    }

    /// Top `n` by count, ties in first-seen order, plus the sum of the rest.
    fn into_ranked(self, n: usize) -> (Vec<(K, u64)>, u64) {
        let mut counts = self.counts;
        // Stable sort keeps insertion order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let rest = if counts.len() > n {
            counts.split_off(n)
        } else {
            Vec::new()
        };
        let others = rest.iter().map(|(_, count)| count).sum();
        (counts, others)
    }
}

/// Fold the stored answer values of one question into its summary.
///
/// Values whose shape does not fit `kind` are skipped.
#[must_use]
pub fn summarize(kind: QuestionType, values: &[JsonValue]) -> QuestionAnalytics {
    let decoded = values.iter().filter_map(|raw| {
        let value = AnswerValue::from_json(raw);
        if value.is_none() {
            debug!(question_type = kind.as_str(), value = %raw, "Skipping undecodable answer");
        }
        value
    });

    match kind {
        QuestionType::Text => {
            let mut tally = Tally::new();
            for value in decoded {
                let AnswerValue::Text(text) = value else {
                    debug!("Skipping list value on text question");
                    continue;
                };
                for token in text.split_whitespace() {
                    if token.chars().count() >= MIN_WORD_CHARS {
                        tally.add(token.to_lowercase());
                    }
                }
            }
            let (top, others) = tally.into_ranked(TOP_N);
            QuestionAnalytics::Text {
                top_words: top
                    .into_iter()
                    .map(|(word, count)| WordCount { word, count })
                    .collect(),
                others,
            }
        }
        QuestionType::Dropdown => {
            let mut tally = Tally::new();
            for value in decoded {
                let option = match value {
                    AnswerValue::Text(option) => option,
                    AnswerValue::Choices(mut choices) if choices.len() == 1 => choices.remove(0),
                    AnswerValue::Choices(_) => {
                        debug!("Skipping multi-choice value on dropdown question");
                        continue;
                    }
                };
                tally.add(option);
            }
            let (top, others) = tally.into_ranked(TOP_N);
            QuestionAnalytics::Dropdown {
                top_options: top
                    .into_iter()
                    .map(|(option, count)| OptionCount { option, count })
                    .collect(),
                others,
            }
        }
        QuestionType::Checkbox => {
            let mut tally = Tally::new();
            for value in decoded {
                let AnswerValue::Choices(mut combination) = value else {
                    debug!("Skipping text value on checkbox question");
                    continue;
                };
                combination.sort();
                tally.add(combination);
            }
            let (top, others) = tally.into_ranked(TOP_N);
            QuestionAnalytics::Checkbox {
                top_combos: top
                    .into_iter()
                    .map(|(combination, count)| ComboCount { combination, count })
                    .collect(),
                others,
            }
        }
    }
}

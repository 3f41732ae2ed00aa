//! Keyword matching of voice utterances into record-creation intents.
//!
//! Matching is plain case-insensitive substring containment. Every kind is
//! checked independently, so one utterance can yield several intents. There
//! is no tokenisation, negation handling or scoring.

use serde::{Deserialize, Serialize};

use crate::record::{NewRecord, RecordKind, START_MARKER};

/// A phrase whose presence in an utterance signals `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
  #[serde(rename = "type")]
  pub kind:   RecordKind,
  pub phrase: String,
}

impl Trigger {
  pub fn new(kind: RecordKind, phrase: impl Into<String>) -> Self {
    Self { kind, phrase: phrase.into() }
  }
}

/// A record the utterance asks to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
  pub kind: RecordKind,
  pub note: String,
}

impl Intent {
  pub fn into_record(self, user_id: impl Into<String>) -> NewRecord {
    NewRecord::new(user_id, self.kind, self.note)
  }
}

#[derive(Debug, Clone)]
pub struct Interpreter {
  triggers: Vec<Trigger>,
}

impl Default for Interpreter {
  fn default() -> Self { Self::english() }
}

impl Interpreter {
  pub fn new(triggers: impl IntoIterator<Item = Trigger>) -> Self {
    let triggers = triggers
      .into_iter()
      .map(|t| Trigger { phrase: t.phrase.to_lowercase(), ..t })
      .collect();
    Self { triggers }
  }

  pub fn english() -> Self {
    Self::new([
      Trigger::new(RecordKind::Sleep, "sleep"),
      Trigger::new(RecordKind::Awake, "awake"),
      Trigger::new(RecordKind::Feeding, "feed"),
    ])
  }

  /// Stems cover the common verb endings ("уснул", "уснула", "покормили").
  pub fn russian() -> Self {
    Self::new([
      Trigger::new(RecordKind::Sleep, "уснул"),
      Trigger::new(RecordKind::Awake, "проснул"),
      Trigger::new(RecordKind::Feeding, "покорм"),
    ])
  }

  /// Trigger set for a language code; unknown codes fall back to English.
  pub fn for_language(code: &str) -> Self {
    match code.trim().to_lowercase().as_str() {
      "ru" | "rus" | "russian" => Self::russian(),
      _ => Self::english(),
    }
  }

  pub fn triggers(&self) -> &[Trigger] { &self.triggers }

  /// Extract intents from `utterance`, at most one per kind, in
  /// sleep/awake/feeding order.
  pub fn interpret(&self, utterance: &str) -> Vec<Intent> {
    let haystack = utterance.to_lowercase();

    RecordKind::ALL
      .into_iter()
      .filter(|kind| {
        self
          .triggers
          .iter()
          .any(|t| t.kind == *kind && haystack.contains(&t.phrase))
      })
      .map(|kind| Intent { kind, note: note_for(kind, utterance) })
      .collect()
  }
}

fn note_for(kind: RecordKind, utterance: &str) -> String {
  match kind {
    RecordKind::Sleep | RecordKind::Awake => START_MARKER.to_owned(),
    RecordKind::Feeding => utterance.trim().to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_trigger_yields_start_intent() {
    let intents = Interpreter::english().interpret("please add sleep");
    assert_eq!(intents, vec![Intent {
      kind: RecordKind::Sleep,
      note: "start".into(),
    }]);
  }

  #[test]
  fn matching_ignores_case() {
    let intents = Interpreter::english().interpret("Baby is AWAKE now");
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].kind, RecordKind::Awake);
  }

  #[test]
  fn two_triggers_yield_two_intents() {
    let intents =
      Interpreter::english().interpret("feed her and then put to sleep");
    let kinds: Vec<_> = intents.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![RecordKind::Sleep, RecordKind::Feeding]);
  }

  #[test]
  fn feeding_note_keeps_the_utterance() {
    let intents = Interpreter::english().interpret("  feeding, 120 ml  ");
    assert_eq!(intents, vec![Intent {
      kind: RecordKind::Feeding,
      note: "feeding, 120 ml".into(),
    }]);
  }

  #[test]
  fn unrecognised_utterance_yields_nothing() {
    assert!(Interpreter::english().interpret("what time is it").is_empty());
  }

  #[test]
  fn russian_triggers_match_cyrillic_in_any_case() {
    let intents = Interpreter::russian().interpret("Малыш Уснул");
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].kind, RecordKind::Sleep);

    let intents = Interpreter::for_language("ru").interpret("покормили");
    assert_eq!(intents[0].kind, RecordKind::Feeding);
  }

  #[test]
  fn custom_triggers_are_lowercased() {
    let interp = Interpreter::new([Trigger::new(RecordKind::Awake, "Woke Up")]);
    assert_eq!(interp.triggers()[0].phrase, "woke up");
    assert_eq!(interp.interpret("she WOKE UP").len(), 1);
  }
}

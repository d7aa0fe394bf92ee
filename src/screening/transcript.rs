//! Append-only interaction log and the dialogue memory handed to
//! collaborators for conversational context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit line in the interaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Ordered, append-only record of everything that happened in a session.
///
/// Entries follow a `Label: payload` convention (`User:`, `Assistant:`,
/// `System:`, `Sentiment:`) that the sentiment aggregator mines later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionLog {
    entries: Vec<LogEntry>,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(LogEntry {
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Iterate over the entry texts.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single (input, output) exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPair {
    pub input: String,
    pub output: String,
}

/// Ordered turn pairs for the whole conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogueMemory {
    turns: Vec<TurnPair>,
}

impl DialogueMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a turn with an empty output.
    pub fn begin_turn(&mut self, input: impl Into<String>) {
        self.turns.push(TurnPair {
            input: input.into(),
            output: String::new(),
        });
    }

    /// Fill in the output of the most recent turn.
    ///
    /// Must follow `begin_turn`. Release builds open a turn with an empty
    /// input if none exists.
    pub fn complete_turn(&mut self, output: impl Into<String>) {
        debug_assert!(!self.turns.is_empty(), "complete_turn called before begin_turn");
        match self.turns.last_mut() {
            Some(turn) => turn.output = output.into(),
            None => self.turns.push(TurnPair {
                input: String::new(),
                output: output.into(),
            }),
        }
    }

    /// Record a full exchange in one step.
    pub fn record(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.turns.push(TurnPair {
            input: input.into(),
            output: output.into(),
        });
    }

    pub fn turns(&self) -> &[TurnPair] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the last `n` turns as a `Human:`/`AI:` transcript.
    pub fn render_recent(&self, n: usize) -> String {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..]
            .iter()
            .flat_map(|t| {
                let mut lines = Vec::with_capacity(2);
                if !t.input.is_empty() {
                    lines.push(format!("Human: {}", t.input));
                }
                if !t.output.is_empty() {
                    lines.push(format!("AI: {}", t.output));
                }
                lines
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_append_only_and_ordered() {
        let mut log = InteractionLog::new();
        log.push("User: hi");
        log.push("Assistant: hello");
        let msgs: Vec<&str> = log.messages().collect();
        assert_eq!(msgs, ["User: hi", "Assistant: hello"]);
        assert_eq!(log.len(), 2);
        assert!(log.entries()[0].at <= log.entries()[1].at);
    }

    #[test]
    fn turn_is_opened_then_completed() {
        let mut memory = DialogueMemory::new();
        memory.begin_turn("Start");
        assert_eq!(memory.turns()[0].output, "");
        memory.complete_turn("What is your full name?");
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.turns()[0].input, "Start");
        assert_eq!(memory.turns()[0].output, "What is your full name?");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "complete_turn called before begin_turn")]
    fn complete_without_open_turn_is_a_bug() {
        let mut memory = DialogueMemory::new();
        memory.complete_turn("Hello!");
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn complete_without_open_turn_creates_one() {
        let mut memory = DialogueMemory::new();
        memory.complete_turn("Hello!");
        assert_eq!(
            memory.turns(),
            [TurnPair {
                input: String::new(),
                output: "Hello!".to_string()
            }]
        );
    }

    #[test]
    fn render_recent_skips_empty_sides() {
        let mut memory = DialogueMemory::new();
        memory.record("", "Hello!");
        memory.record("Start", "What is your full name?");
        memory.record("Ada", "What is your email address?");
        assert_eq!(
            memory.render_recent(2),
            "Human: Start\nAI: What is your full name?\nHuman: Ada\nAI: What is your email address?"
        );
        assert_eq!(memory.render_recent(10).lines().count(), 5);
    }
}

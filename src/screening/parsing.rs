//! Pure text helpers: model-output cleaning, question extraction, tech
//! stack parsing and the deterministic fallback question set.

use std::sync::LazyLock;

use regex::Regex;

use super::state::QUESTION_COUNT;

/// Minimum length of a question body before it counts as a real question.
const MIN_QUESTION_CHARS: usize = 20;

static CHAT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\|im_start\|>.*?<\|im_end\|>").expect("valid regex"));
static CHAT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\|.*?\|>").expect("valid regex"));
static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static ASSISTANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)assistant").expect("valid regex"));
static LEADING_ENUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)\s]*").expect("valid regex"));
static NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").expect("valid regex"));

static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.?\s*(.*)$").expect("valid regex"));
static LOOSE_QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*([^\n?]+\??)").expect("valid regex"));
static QUESTION_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

/// Normalize raw model output into a single clean utterance.
///
/// Drops chat-template blocks and `<think>` spans, keeps only what follows
/// the last "assistant" marker, strips a leading enumeration and collapses
/// blank lines.
pub fn clean_response(raw: &str) -> String {
    let text = CHAT_BLOCK_RE.replace_all(raw, "");
    let text = CHAT_MARKER_RE.replace_all(&text, "");
    let text = THINK_RE.replace_all(&text, "");

    let text = if text.to_lowercase().contains("assistant") {
        ASSISTANT_RE
            .split(&text)
            .last()
            .unwrap_or_default()
            .trim()
            .to_string()
    } else {
        text.into_owned()
    };

    let text = LEADING_ENUM_RE.replace(&text, "");
    let text = NEWLINES_RE.replace_all(text.trim(), "\n");
    text.trim().to_string()
}

fn looks_like_question(text: &str) -> bool {
    text.chars().count() > MIN_QUESTION_CHARS && text.contains('?')
}

/// Pull up to five numbered questions out of cleaned generator output.
///
/// Lines of the form `N. text` are kept when the text is long enough and
/// contains a `?`. The generation prompt primes the model with `1.`, and
/// cleaning strips a leading numeral, so an unnumbered first line is taken
/// as question 1 only when it passes the same check and the numbered lines
/// that follow start at 2. When that yields fewer than five, a looser scan
/// for `N. ...?` spans anywhere in the text replaces the result, renumbered
/// from 1.
pub fn extract_questions(cleaned: &str) -> Vec<String> {
    let mut lines = cleaned.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();

    let unnumbered_first = lines.next_if(|first| !NUMBERED_LINE_RE.is_match(first));

    let numbered: Vec<(&str, &str)> = lines
        .filter_map(|line| NUMBERED_LINE_RE.captures(line))
        .filter_map(|caps| {
            let number = caps.get(1)?.as_str();
            let text = caps.get(2)?.as_str().trim();
            looks_like_question(text).then_some((number, text))
        })
        .collect();

    let mut questions = Vec::with_capacity(QUESTION_COUNT);
    let continues_at_two = numbered.first().is_some_and(|(number, _)| *number == "2");
    if let Some(first) = unnumbered_first.filter(|line| looks_like_question(line)) {
        if continues_at_two {
            questions.push(format!("1. {first}"));
        }
    }
    questions.extend(numbered.iter().map(|(number, text)| format!("{number}. {text}")));

    if questions.len() < QUESTION_COUNT {
        questions = LOOSE_QUESTION_RE
            .captures_iter(cleaned)
            .take(QUESTION_COUNT)
            .enumerate()
            .map(|(i, caps)| format!("{}. {}", i + 1, caps[1].trim()))
            .collect();
    }

    questions.truncate(QUESTION_COUNT);
    questions
}

/// Where an interview's questions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Generated,
    Template,
}

/// Turn cleaned generator output into exactly five questions, falling back
/// to the template set when extraction comes up short.
pub fn build_question_set(
    cleaned: &str,
    tech_stack: &[String],
    desired_position: Option<&str>,
) -> (Vec<String>, QuestionSource) {
    let extracted = extract_questions(cleaned);
    if extracted.len() == QUESTION_COUNT {
        (extracted, QuestionSource::Generated)
    } else {
        (
            fallback_questions(tech_stack.first().map(String::as_str), desired_position),
            QuestionSource::Template,
        )
    }
}

/// Deterministic question set used when generation fails.
pub fn fallback_questions(primary_tech: Option<&str>, desired_position: Option<&str>) -> Vec<String> {
    let tech = primary_tech
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("your primary technology");
    let position = desired_position
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("this position");
    vec![
        format!("1. What experience do you have with {tech}?"),
        format!("2. Describe a challenging project you've worked on using {tech}."),
        format!("3. How would you debug a performance issue in a {tech} application?"),
        format!("4. What best practices do you follow when working with {tech}?"),
        format!("5. How does your experience align with the requirements for {position}?"),
    ]
}

/// Split a comma-separated technology list, trimming and dropping blanks.
pub fn format_tech_stack(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Question text without its leading `N.` numeral.
pub fn question_text(question: &str) -> &str {
    match QUESTION_NUMBER_RE.find(question) {
        Some(m) => question[m.end()..].trim(),
        None => question.trim(),
    }
}

/// Replace a question's text, keeping its leading numeral.
///
/// Questions without a numeral get `fallback_number`.
pub fn renumber_question(original: &str, text: &str, fallback_number: usize) -> String {
    let number = NUMBERED_LINE_RE
        .captures(original.trim())
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| fallback_number.to_string());
    format!("{number}. {}", text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_QUESTIONS: &str = "\
1. How does Rust's ownership model prevent data races at compile time?
2. Explain how you would structure error handling across a large async Rust service?
3. What trade-offs do you weigh when choosing between Arc<Mutex<T>> and message passing?
4. How would you profile and fix a latency regression in a tokio-based HTTP server?
5. Describe how you would design a plugin system using trait objects in Rust?";

    #[test]
    fn clean_strips_template_markers_and_think_spans() {
        let raw = "<|im_start|>system\nYou are TalentBot<|im_end|>\n<think>planning...</think>\nHello there";
        assert_eq!(clean_response(raw), "Hello there");
    }

    #[test]
    fn clean_keeps_text_after_last_assistant_marker() {
        let raw = "user: hi\nassistant: draft\nASSISTANT\nFinal answer";
        assert_eq!(clean_response(raw), "Final answer");
    }

    #[test]
    fn clean_strips_leading_enumeration_and_blank_lines() {
        assert_eq!(clean_response("3) What is a lifetime?"), "What is a lifetime?");
        assert_eq!(clean_response("line one\n\n\nline two"), "line one\nline two");
    }

    #[test]
    fn extracts_five_numbered_questions() {
        let questions = extract_questions(FIVE_QUESTIONS);
        assert_eq!(questions.len(), 5);
        assert!(questions[0].starts_with("1. How does Rust's ownership"));
        assert!(questions[4].starts_with("5. Describe how"));
    }

    #[test]
    fn unnumbered_first_line_counts_as_question_one() {
        let cleaned = clean_response(FIVE_QUESTIONS);
        assert!(cleaned.starts_with("How does"));
        let questions = extract_questions(&cleaned);
        assert_eq!(questions.len(), 5);
        assert!(questions[0].starts_with("1. How does Rust's ownership"));
    }

    #[test]
    fn unnumbered_preamble_is_not_a_question() {
        let raw = "Ready to dig into some Rust and PostgreSQL questions?\n".to_string() + FIVE_QUESTIONS;
        let questions = extract_questions(&clean_response(&raw));
        assert_eq!(questions.len(), 5);
        assert!(questions[0].starts_with("1. How does Rust's ownership"));
        assert!(questions[4].starts_with("5. Describe how you would design a plugin system"));
        assert!(questions.iter().all(|q| !q.contains("Ready to dig")));
    }

    #[test]
    fn unnumbered_first_line_needs_question_two_to_follow() {
        let text = "How does Rust's ownership model prevent data races at compile time?\n\
                    3. What trade-offs do you weigh when choosing between Arc and channels?";
        let questions = extract_questions(text);
        assert!(questions.iter().all(|q| !q.starts_with("1. How does")));
    }

    #[test]
    fn short_or_non_questions_are_skipped() {
        let text = "1. What is Rust?\n2. Tell me about your background in systems programming.\nNot numbered at all, is it?";
        // Nothing passes the strict pass; the loose scan finds two spans.
        let questions = extract_questions(text);
        assert_eq!(questions, ["1. What is Rust?", "2. Tell me about your background in systems programming."]);
    }

    #[test]
    fn loose_scan_renumbers_inline_questions() {
        let text = "Here you go: 3. Why use Rust? 7. What is Cargo? 9. What is a crate? 11. What is a trait? 12. What is borrowck?";
        let questions = extract_questions(text);
        assert_eq!(
            questions,
            [
                "1. Why use Rust?",
                "2. What is Cargo?",
                "3. What is a crate?",
                "4. What is a trait?",
                "5. What is borrowck?"
            ]
        );
    }

    #[test]
    fn shortfall_falls_back_to_templates() {
        let tech = vec!["Python".to_string(), "Go".to_string()];
        let (questions, source) =
            build_question_set("1. What is Python?\n2. Too short?", &tech, Some("Backend Engineer"));
        assert_eq!(source, QuestionSource::Template);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0], "1. What experience do you have with Python?");
        assert_eq!(
            questions[4],
            "5. How does your experience align with the requirements for Backend Engineer?"
        );
    }

    #[test]
    fn full_generation_is_used_as_is() {
        let (questions, source) = build_question_set(FIVE_QUESTIONS, &["Rust".into()], Some("SRE"));
        assert_eq!(source, QuestionSource::Generated);
        assert_eq!(questions.len(), 5);
    }

    #[test]
    fn fallback_defaults_when_profile_is_thin() {
        let questions = fallback_questions(None, None);
        assert!(questions[0].contains("your primary technology"));
        assert!(questions[4].contains("this position"));
    }

    #[test]
    fn tech_stack_drops_empty_segments() {
        assert_eq!(format_tech_stack("Python, Go, , Rust"), ["Python", "Go", "Rust"]);
        assert!(format_tech_stack(" , ,").is_empty());
    }

    #[test]
    fn question_text_strips_numeral() {
        assert_eq!(question_text("3. How would you debug it?"), "How would you debug it?");
        assert_eq!(question_text("Already bare?"), "Already bare?");
    }

    #[test]
    fn renumber_keeps_original_index() {
        assert_eq!(
            renumber_question("3. How would you debug it?", "How would you debug a slow query?", 9),
            "3. How would you debug a slow query?"
        );
        assert_eq!(renumber_question("Unnumbered?", "Revised?", 2), "2. Revised?");
    }
}

//! Recovers a [`Quiz`] from free-form model output.
//!
//! The model is asked for raw JSON but routinely wraps it in markdown fences,
//! adds commentary, stops mid-structure, uses typographic quotes or forgets
//! commas between sibling objects. Each repair below is a small pure function
//! that only rewrites text outside string literals, so clean input passes
//! through unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::SanitizeError;
use crate::models::domain::{Quiz, QuizQuestion};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```[a-z0-9_+\-]*").expect("CODE_FENCE is a valid regex pattern"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("TRAILING_COMMA is a valid regex pattern"));

static MISSING_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([}\]])\s*([{\[])").expect("MISSING_COMMA is a valid regex pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    Object,
    Array,
}

impl StructureKind {
    fn closer(self) -> char {
        match self {
            StructureKind::Object => '}',
            StructureKind::Array => ']',
        }
    }
}

/// The outermost JSON-looking region of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isolated<'a> {
    pub kind: StructureKind,
    pub text: &'a str,
    /// No closing delimiter followed the opener, so the text runs to the end.
    pub truncated: bool,
}

pub fn extract_quiz(raw: &str) -> Result<Quiz, SanitizeError> {
    let cleaned = strip_code_fences(raw);
    let isolated = isolate_structure(&cleaned)?;
    if isolated.truncated {
        log::warn!("JSON appears truncated, capturing partial structure");
    }

    let repaired = repair_text(isolated.text);
    let value = parse_with_repair(&repaired)?;
    let quiz = normalize_shape(value)?;

    log::info!(
        "Recovered quiz '{}' with {} questions",
        quiz.title(),
        quiz.len()
    );
    Ok(quiz)
}

pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// A run of response text: either JSON structure or one string literal,
/// delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Structure(&'a str),
    Literal(&'a str),
}

impl<'a> Segment<'a> {
    fn text(self) -> &'a str {
        match self {
            Segment::Structure(s) | Segment::Literal(s) => s,
        }
    }
}

fn is_curly_double(c: char) -> bool {
    matches!(c, '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}')
}

fn straighten(c: char) -> char {
    match c {
        c if is_curly_double(c) => '"',
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
        other => other,
    }
}

/// Splits `text` into structure and string literals. A literal opened with a
/// typographic quote may also be closed by one; an unterminated literal runs
/// to the end.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices();

    while let Some((open, c)) = chars.next() {
        if c != '"' && !is_curly_double(c) {
            continue;
        }
        if open > start {
            segments.push(Segment::Structure(&text[start..open]));
        }

        let curly = c != '"';
        let mut end = text.len();
        let mut escaped = false;
        for (i, d) in chars.by_ref() {
            if escaped {
                escaped = false;
            } else if d == '\\' {
                escaped = true;
            } else if d == '"' || (curly && is_curly_double(d)) {
                end = i + d.len_utf8();
                break;
            }
        }
        segments.push(Segment::Literal(&text[open..end]));
        start = end;
    }

    if start < text.len() {
        segments.push(Segment::Structure(&text[start..]));
    }
    segments
}

fn rewrite_structure(text: &str, rewrite: impl Fn(&str) -> String) -> String {
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Structure(s) => rewrite(s),
            Segment::Literal(s) => s.to_string(),
        })
        .collect()
}

fn last_structural(text: &str, closer: char) -> Option<usize> {
    let mut offset = 0;
    let mut last = None;
    for segment in segments(text) {
        if let Segment::Structure(s) = segment {
            if let Some(i) = s.rfind(closer) {
                last = Some(offset + i);
            }
        }
        offset += segment.text().len();
    }
    last
}

/// Finds the first `{` or `[` and slices through the last matching closer
/// outside any string literal.
pub fn isolate_structure(text: &str) -> Result<Isolated<'_>, SanitizeError> {
    let (start, kind) = match (text.find('{'), text.find('[')) {
        (None, None) => return Err(SanitizeError::NoJsonFound),
        (Some(brace), Some(bracket)) if bracket < brace => (bracket, StructureKind::Array),
        (Some(brace), _) => (brace, StructureKind::Object),
        (None, Some(bracket)) => (bracket, StructureKind::Array),
    };

    let end = last_structural(&text[start..], kind.closer()).map(|offset| start + offset);
    let (slice, truncated) = match end {
        Some(end) => (&text[start..=end], false),
        None => (&text[start..], true),
    };

    Ok(Isolated {
        kind,
        text: slice.trim(),
        truncated,
    })
}

pub fn remove_trailing_commas(text: &str) -> String {
    rewrite_structure(text, |s| TRAILING_COMMA.replace_all(s, "$1").into_owned())
}

pub fn insert_missing_commas(text: &str) -> String {
    rewrite_structure(text, |s| MISSING_COMMA.replace_all(s, "$1, $2").into_owned())
}

/// Straightens typographic quotes used as JSON punctuation. Literals that
/// already open with `"` are valid JSON and keep their contents.
pub fn normalize_quotes(text: &str) -> String {
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(s) if s.starts_with('"') => s.to_string(),
            other => other.text().chars().map(straighten).collect(),
        })
        .collect()
}

pub fn repair_text(text: &str) -> String {
    let text = remove_trailing_commas(text);
    let text = insert_missing_commas(&text);
    normalize_quotes(&text)
}

/// Closes whatever a truncated response left open: an unterminated string
/// first, then every open array/object, innermost first. Delimiters inside
/// strings are ignored and a dangling comma is dropped.
pub fn balance_delimiters(text: &str) -> String {
    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.last() == Some(&c) {
                    open.pop();
                }
            }
            _ => {}
        }
    }

    let mut repaired = text.to_string();
    if in_string {
        if escaped {
            repaired.pop();
        }
        repaired.push('"');
    }

    let kept = repaired.trim_end().trim_end_matches(',').trim_end().len();
    repaired.truncate(kept);

    repaired.extend(open.iter().rev());
    repaired
}

/// Strict parse, then one retry after [`balance_delimiters`].
pub fn parse_with_repair(text: &str) -> Result<Value, SanitizeError> {
    let original = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    log::warn!("Initial JSON parse failed ({}), attempting auto-repair", original);
    let balanced = balance_delimiters(text);

    match serde_json::from_str::<Value>(&balanced) {
        Ok(value) => {
            log::info!("Auto-repair successful");
            Ok(value)
        }
        Err(_) => {
            log::debug!("Failed string: {}", text);
            Err(SanitizeError::MalformedJson {
                message: original.to_string(),
                fragment: text.to_string(),
            })
        }
    }
}

/// Accepts either a bare question array or `{quiz_title?, questions}`.
pub fn normalize_shape(value: Value) -> Result<Quiz, SanitizeError> {
    let (title, items) = match value {
        Value::Array(items) => (None, items),
        Value::Object(mut map) => {
            let title = ["quiz_title", "title"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find(|t| !t.trim().is_empty())
                .map(str::to_string);
            let items = match map.remove("questions") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            (title, items)
        }
        _ => (None, Vec::new()),
    };

    if items.is_empty() {
        return Err(SanitizeError::EmptyQuiz);
    }

    let total = items.len();
    let questions: Vec<QuizQuestion> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match question_from_value(item) {
            Ok(question) => Some(question),
            Err(reason) => {
                log::warn!("Dropping question {} of {}: {}", index + 1, total, reason);
                None
            }
        })
        .collect();

    Quiz::with_derived_title(title, questions)
}

fn question_from_value(item: &Value) -> Result<QuizQuestion, String> {
    let question = item
        .get("question")
        .and_then(Value::as_str)
        .ok_or("missing question text")?;

    // Positions matter: `correct` indexes into this list.
    let options = item
        .get("options")
        .and_then(Value::as_array)
        .ok_or("missing options")?
        .iter()
        .enumerate()
        .map(|(i, option)| option_text(option).ok_or_else(|| format!("option {} is null", i + 1)))
        .collect::<Result<Vec<String>, String>>()?;

    let correct = match item.get("correct") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
    .ok_or("missing or non-numeric correct index")?;

    let explanation = ["explanation", "reference"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    QuizQuestion::new(question, options, correct, explanation)
}

fn option_text(option: &Value) -> Option<String> {
    match option {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => Some(
            map.get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| option.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

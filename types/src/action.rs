//! Document-editing actions ("MCP actions") returned by the model.
//!
//! On the wire an action is a loosely-typed record:
//!
//! ```json
//! { "type": "insertHeading", "payload": { "text": "Intro", "level": 2 }, "explain": "..." }
//! ```
//!
//! [`ActionRecord::from_value`] is the only place that looks at that shape.
//! It coerces payload fields the way a permissive JSON consumer would and
//! produces an [`Action`] sum type where each variant carries exactly the
//! fields it needs. Nothing downstream re-inspects the raw payload.

use std::fmt;

use serde_json::Value;

pub const INSERT_TEXT: &str = "insertText";
pub const REPLACE_SELECTION: &str = "replaceSelection";
pub const INSERT_HEADING: &str = "insertHeading";

/// Heading level clamped into the range the host styles support.
///
/// Invariant: `1 <= level <= 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    #[must_use]
    pub const fn new(level: u8) -> Self {
        if level < Self::MIN {
            Self(Self::MIN)
        } else if level > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(level)
        }
    }

    /// Clamp an arbitrary number: floor first, NaN and anything below one
    /// become 1, anything above three (including +inf) becomes 3.
    #[must_use]
    pub fn from_number(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(Self::MIN);
        }
        let floored = raw.floor();
        if floored <= f64::from(Self::MIN) {
            Self(Self::MIN)
        } else if floored >= f64::from(Self::MAX) {
            Self(Self::MAX)
        } else {
            Self(floored as u8)
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Host paragraph style name for this level.
    #[must_use]
    pub const fn style_name(self) -> &'static str {
        match self.0 {
            1 => "Heading 1",
            2 => "Heading 2",
            _ => "Heading 3",
        }
    }
}

impl Default for HeadingLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a paragraph at the end of the body.
    InsertText { text: String },
    /// Replace the current selection (or insert at the caret).
    ReplaceSelection { text: String },
    /// Append a paragraph styled as a heading.
    InsertHeading { text: String, level: HeadingLevel },
    /// Anything else the model sent. Kept so it can be logged, never applied.
    Unknown { kind: String },
}

impl Action {
    /// Wire name of the action type.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Action::InsertText { .. } => INSERT_TEXT,
            Action::ReplaceSelection { .. } => REPLACE_SELECTION,
            Action::InsertHeading { .. } => INSERT_HEADING,
            Action::Unknown { kind } => kind,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Action::InsertText { text }
            | Action::ReplaceSelection { text }
            | Action::InsertHeading { text, .. } => Some(text),
            Action::Unknown { .. } => None,
        }
    }
}

/// One action as received, with the model's optional explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    action: Action,
    explain: Option<String>,
}

impl ActionRecord {
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            explain: None,
        }
    }

    #[must_use]
    pub fn with_explain(mut self, explain: impl Into<String>) -> Self {
        self.explain = Some(explain.into());
        self
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    #[must_use]
    pub fn explain(&self) -> Option<&str> {
        self.explain.as_deref()
    }

    #[must_use]
    pub fn into_action(self) -> Action {
        self.action
    }

    /// Parse a single wire record. Never fails: malformed records become
    /// [`Action::Unknown`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::new(Action::Unknown {
                kind: "undefined".to_string(),
            });
        };

        let kind = match object.get("type") {
            None | Some(Value::Null) => "undefined".to_string(),
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => other.to_string(),
        };

        let payload = object.get("payload");
        let field = |name: &str| payload.and_then(|p| p.get(name));

        let action = match kind.as_str() {
            INSERT_TEXT => Action::InsertText {
                text: coerce_text(field("text")),
            },
            REPLACE_SELECTION => Action::ReplaceSelection {
                text: coerce_text(field("text")),
            },
            INSERT_HEADING => Action::InsertHeading {
                text: coerce_text(field("text")),
                level: HeadingLevel::from_number(coerce_number(field("level"), 1.0)),
            },
            _ => Action::Unknown { kind },
        };

        let explain = object
            .get("explain")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        Self { action, explain }
    }

    /// Parse an `mcp_actions` field. Returns `None` when the value is not an array.
    #[must_use]
    pub fn parse_batch(value: &Value) -> Option<Vec<Self>> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_value).collect())
    }
}

impl From<Action> for ActionRecord {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}

/// String coercion for payload text. Absent and `null` become empty.
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(value) => stringify(value),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    // f64 Display already drops a trailing ".0"
    n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
}

/// Numeric coercion for payload numbers. Absent and `null` use `default`;
/// values with no numeric reading become NaN.
fn coerce_number(value: Option<&Value>, default: f64) -> f64 {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(_) | Value::Object(_)) => f64::NAN,
    }
}

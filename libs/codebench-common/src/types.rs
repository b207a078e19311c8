use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Languages the judge accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    #[serde(alias = "c++")]
    Cpp,
    Java,
}

impl Language {
    /// Menu order
    pub const ALL: [Language; 3] = [Language::Python, Language::Cpp, Language::Java];

    /// Wire name, also the key used in per-language maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Cpp => "C++",
            Language::Java => "Java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "cpp" | "c++" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            other => Err(format!("Unknown language '{}' (expected python, cpp or java)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    #[serde(alias = "easy")]
    Easy,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "hard")]
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: String,
    #[serde(
        rename = "output",
        alias = "expected_output",
        default,
        deserialize_with = "null_as_default"
    )]
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// A problem as served by the problem service.
///
/// The per-language maps stay raw: the service stores them as JSON text and
/// may hand back an object, a JSON-encoded string, or garbage. Interpreting
/// them is the boilerplate store's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub owner_id: Option<u64>,
    #[serde(default)]
    pub owner_username: Option<String>,
    #[serde(default, deserialize_with = "embedded_test_cases")]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub templates: Value,
    #[serde(default)]
    pub drivers: Value,
    #[serde(default)]
    pub time_limits: Value,
}

impl Problem {
    /// Server-supplied boilerplate overrides carried by this problem
    pub fn overrides(&self) -> LanguageOverrides {
        LanguageOverrides {
            templates: self.templates.clone(),
            drivers: self.drivers.clone(),
            time_limits: self.time_limits.clone(),
        }
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner_username.as_deref() == Some(username)
    }
}

/// Raw per-language override maps (templates, drivers, time limits).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageOverrides {
    #[serde(default)]
    pub templates: Value,
    #[serde(default)]
    pub drivers: Value,
    #[serde(default)]
    pub time_limits: Value,
}

/// Create/update payload for the problem service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub templates: BTreeMap<Language, String>,
    #[serde(default)]
    pub drivers: BTreeMap<Language, String>,
    #[serde(default)]
    pub time_limits: BTreeMap<Language, f64>,
}

/// Run against a single visible test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(skip)]
    pub problem_id: u64,
    pub language: Language,
    pub code: String,
    pub input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    /// The judge reports compile/runtime/timeout failures through `error`
    pub fn is_failure(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Text to show in the result panel
    pub fn display_text(&self) -> &str {
        match self.error.as_deref() {
            Some(error) if !error.is_empty() => error,
            _ => &self.output,
        }
    }
}

/// Full evaluation against the hidden suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(skip)]
    pub problem_id: u64,
    pub language: Language,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: SubmissionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStatus {
    Accepted,
    WrongAnswer,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    Error,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Accepted => "Accepted",
            SubmissionStatus::WrongAnswer => "Wrong Answer",
            SubmissionStatus::CompileError => "Compile Error",
            SubmissionStatus::RuntimeError => "Runtime Error",
            SubmissionStatus::TimeLimitExceeded => "Time Limit Exceeded",
            SubmissionStatus::Error => "Error",
        }
    }

    /// Normalize the judge's free-form status text. Unknown text is `Error`.
    pub fn from_wire(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "accepted" | "ac" => SubmissionStatus::Accepted,
            "wronganswer" | "wa" => SubmissionStatus::WrongAnswer,
            "compileerror" | "compilationerror" | "ce" => SubmissionStatus::CompileError,
            "runtimeerror" | "re" => SubmissionStatus::RuntimeError,
            "timelimitexceeded" | "tle" => SubmissionStatus::TimeLimitExceeded,
            _ => SubmissionStatus::Error,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionStatus::Accepted)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubmissionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_wire).unwrap_or(SubmissionStatus::Error))
    }
}

/// One evaluated attempt. `id` is `None` for attempts synthesized locally
/// because the judge could not be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub id: Option<u64>,
    pub problem_id: u64,
    pub language: Language,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    pub status: SubmissionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub user_id: u64,
    pub username: String,
    pub solved_problems: u32,
    pub total_submissions: u32,
    pub acceptance_rate: f64,
}

/// Decode a value the service may have stored as JSON text.
///
/// Accepts the structure itself or a string containing it. Returns `None`
/// (after logging) for null, blank or malformed input.
pub fn decode_embedded<T: DeserializeOwned>(raw: &Value, field: &str) -> Option<T> {
    let parsed;
    let value = match raw {
        Value::Null => return None,
        Value::String(text) if text.trim().is_empty() => return None,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(e) => {
                warn!(field = field, error = %e, "Malformed embedded JSON, ignoring");
                return None;
            }
        },
        other => other,
    };

    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(field = field, error = %e, "Unexpected shape, ignoring");
            None
        }
    }
}

fn embedded_test_cases<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TestCase>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(decode_embedded(&raw, "test_cases").unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 out; RFC 3339 or naive ISO-8601 (taken as UTC) in
mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

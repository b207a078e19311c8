// Per-language starter code, driver code and time limits
use anyhow::{Context, Result};
use codebench_common::types::{decode_embedded, Language, LanguageOverrides};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Boilerplate {
    /// Starter code shown in the editor
    pub template: String,
    /// Harness appended by the judge after the user's code
    pub driver: String,
    /// Time limit in seconds
    pub timeout: f64,
}

/// One field of one language's entry
#[derive(Debug, Clone, PartialEq)]
pub enum BoilerplateField {
    Template(String),
    Driver(String),
    Timeout(f64),
}

/// Built-in seed for a language
pub fn default_boilerplate(language: Language) -> Boilerplate {
    match language {
        Language::Python => Boilerplate {
            template: "class Solution:\n    def solve(self, args):\n        pass".to_string(),
            driver: "import sys\nimport json\n\nif __name__ == \"__main__\":\n    # read from sys.stdin\n    pass"
                .to_string(),
            timeout: 2.0,
        },
        Language::Cpp => Boilerplate {
            template: "class Solution {\npublic:\n    void solve() {\n        \n    }\n};".to_string(),
            driver: "using namespace std;\n\nint main() {\n    return 0;\n}".to_string(),
            timeout: 1.0,
        },
        Language::Java => Boilerplate {
            template: "class Solution {\n    public void solve() {\n        \n    }\n}".to_string(),
            driver: "class Driver {\n    public static void main(String[] args) {\n        \n    }\n}".to_string(),
            timeout: 2.0,
        },
    }
}

#[derive(Debug, Clone)]
pub struct LanguageBoilerplateStore {
    entries: HashMap<Language, Boilerplate>,
}

impl Default for LanguageBoilerplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageBoilerplateStore {
    pub fn new() -> Self {
        let entries = Language::ALL
            .iter()
            .map(|lang| (*lang, default_boilerplate(*lang)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, language: Language) -> Boilerplate {
        self.entries
            .get(&language)
            .cloned()
            .unwrap_or_else(|| default_boilerplate(language))
    }

    /// Restore the built-in defaults for every language
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Merge server overrides over the current entries, field by field.
    ///
    /// Each map may be an object or a JSON-encoded object. A malformed map is
    /// skipped as a whole; a malformed entry inside a good map is skipped on
    /// its own. Whatever is skipped keeps its current value.
    pub fn apply_overrides(&mut self, overrides: &LanguageOverrides) -> usize {
        let mut applied = 0;

        for (language, raw) in language_entries(&overrides.templates, "templates") {
            match raw.as_str() {
                Some(text) if !text.is_empty() => {
                    self.set_field(language, BoilerplateField::Template(text.to_string()));
                    applied += 1;
                }
                _ => debug!(language = %language, "Ignoring empty or non-text template"),
            }
        }

        for (language, raw) in language_entries(&overrides.drivers, "drivers") {
            match raw.as_str() {
                Some(text) if !text.is_empty() => {
                    self.set_field(language, BoilerplateField::Driver(text.to_string()));
                    applied += 1;
                }
                _ => debug!(language = %language, "Ignoring empty or non-text driver"),
            }
        }

        for (language, raw) in language_entries(&overrides.time_limits, "time_limits") {
            match parse_timeout(&raw) {
                Some(seconds) => {
                    self.set_field(language, BoilerplateField::Timeout(seconds));
                    applied += 1;
                }
                None => warn!(language = %language, value = %raw, "Ignoring invalid time limit"),
            }
        }

        debug!(applied = applied, "Boilerplate overrides merged");
        applied
    }

    /// Mutate exactly one field of one language
    pub fn set_field(&mut self, language: Language, field: BoilerplateField) {
        let entry = self
            .entries
            .entry(language)
            .or_insert_with(|| default_boilerplate(language));
        match field {
            BoilerplateField::Template(text) => entry.template = text,
            BoilerplateField::Driver(text) => entry.driver = text,
            BoilerplateField::Timeout(seconds) => entry.timeout = seconds,
        }
    }

    /// Apply overrides stored in a JSON file shaped like
    /// `{"templates": {...}, "drivers": {...}, "time_limits": {...}}`
    pub fn load_overrides_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let overrides: LanguageOverrides = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(self.apply_overrides(&overrides))
    }

    /// Per-language maps for a create/update payload
    pub fn to_maps(
        &self,
    ) -> (
        BTreeMap<Language, String>,
        BTreeMap<Language, String>,
        BTreeMap<Language, f64>,
    ) {
        let mut templates = BTreeMap::new();
        let mut drivers = BTreeMap::new();
        let mut time_limits = BTreeMap::new();
        for language in Language::ALL {
            let entry = self.get(language);
            templates.insert(language, entry.template);
            drivers.insert(language, entry.driver);
            time_limits.insert(language, entry.timeout);
        }
        (templates, drivers, time_limits)
    }
}

/// Known-language entries of one override map
fn language_entries(raw: &Value, field: &str) -> Vec<(Language, Value)> {
    let Some(map) = decode_embedded::<serde_json::Map<String, Value>>(raw, field) else {
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| match key.parse::<Language>() {
            Ok(language) => Some((language, value)),
            Err(_) => {
                debug!(field = field, language = %key, "Skipping override for unsupported language");
                None
            }
        })
        .collect()
}

fn parse_timeout(raw: &Value) -> Option<f64> {
    let seconds = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

use codebench_common::types::Language;

/// Source being edited and the language it is written in
#[derive(Debug, Clone, PartialEq)]
pub struct EditorBuffer {
    language: Language,
    source: String,
}

impl EditorBuffer {
    pub fn new(language: Language, template: impl Into<String>) -> Self {
        Self {
            language,
            source: template.into(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the buffer with a fresh template; unsaved edits are discarded
    pub fn reset(&mut self, language: Language, template: impl Into<String>) {
        self.language = language;
        self.source = template.into();
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.source = text.into();
    }
}

// Create/edit form state for a problem
use crate::boilerplate::{BoilerplateField, LanguageBoilerplateStore};
use crate::testcases::TestCaseTabset;
use anyhow::{bail, Context, Result};
use codebench_common::types::{Difficulty, Language, Problem, ProblemDraft};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ProblemAuthoring {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub tags: Option<String>,
    pub boilerplate: LanguageBoilerplateStore,
    pub test_cases: TestCaseTabset,
}

impl ProblemAuthoring {
    /// Blank form with one empty test case to fill in
    pub fn new() -> Self {
        let mut form = Self::default();
        form.test_cases.add_case();
        form
    }

    /// Seed the form from an existing problem, for editing
    pub fn from_problem(problem: &Problem) -> Self {
        let mut boilerplate = LanguageBoilerplateStore::new();
        boilerplate.apply_overrides(&problem.overrides());
        Self {
            title: problem.title.clone(),
            description: problem.description.clone(),
            difficulty: problem.difficulty,
            tags: problem.tags.clone(),
            boilerplate,
            test_cases: TestCaseTabset::from_cases(problem.test_cases.clone()),
        }
    }

    /// Seed the form from a draft file, as written by hand or exported
    pub fn from_draft(draft: ProblemDraft) -> Self {
        let mut boilerplate = LanguageBoilerplateStore::new();
        for (language, template) in draft.templates {
            boilerplate.set_field(language, BoilerplateField::Template(template));
        }
        for (language, driver) in draft.drivers {
            boilerplate.set_field(language, BoilerplateField::Driver(driver));
        }
        for (language, timeout) in draft.time_limits {
            if timeout > 0.0 {
                boilerplate.set_field(language, BoilerplateField::Timeout(timeout));
            }
        }
        Self {
            title: draft.title,
            description: draft.description,
            difficulty: draft.difficulty,
            tags: draft.tags,
            boilerplate,
            test_cases: TestCaseTabset::from_cases(draft.test_cases),
        }
    }

    pub fn load_draft_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read draft {}", path.display()))?;
        let draft: ProblemDraft = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse draft {}", path.display()))?;
        Ok(Self::from_draft(draft))
    }

    pub fn set_boilerplate(&mut self, language: Language, field: BoilerplateField) {
        self.boilerplate.set_field(language, field);
    }

    /// Payload for create/update. Title and description are required.
    pub fn to_draft(&self) -> Result<ProblemDraft> {
        if self.title.trim().is_empty() {
            bail!("Problem title is required");
        }
        if self.description.trim().is_empty() {
            bail!("Problem description is required");
        }

        let (templates, drivers, time_limits) = self.boilerplate.to_maps();
        Ok(ProblemDraft {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            difficulty: self.difficulty,
            tags: self.tags.clone().filter(|t| !t.trim().is_empty()),
            test_cases: self.test_cases.cases(),
            templates,
            drivers,
            time_limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boilerplate::default_boilerplate;
    use crate::testing::sample_problem;
    use codebench_common::types::TestCase;
    use serde_json::json;

    #[test]
    fn test_from_problem_merges_overrides() {
        let mut problem = sample_problem(3);
        problem.time_limits = json!("{\"java\": 5}");

        let form = ProblemAuthoring::from_problem(&problem);

        assert_eq!(form.boilerplate.get(Language::Java).timeout, 5.0);
        assert_eq!(form.boilerplate.get(Language::Python), default_boilerplate(Language::Python));
        assert_eq!(form.test_cases.len(), 2);
    }

    #[test]
    fn test_to_draft_carries_every_language() {
        let mut form = ProblemAuthoring::new();
        form.title = "  Reverse  ".to_string();
        form.description = "Reverse a string".to_string();
        form.tags = Some(" ".to_string());
        form.test_cases.add_case();
        form.set_boilerplate(Language::Cpp, BoilerplateField::Timeout(1.5));

        let draft = form.to_draft().unwrap();

        assert_eq!(draft.title, "Reverse");
        assert_eq!(draft.tags, None);
        assert_eq!(draft.test_cases.len(), 2);
        assert_eq!(draft.templates.len(), 3);
        assert_eq!(draft.time_limits[&Language::Cpp], 1.5);
    }

    #[test]
    fn test_blank_form_starts_with_one_empty_case() {
        let form = ProblemAuthoring::new();

        assert_eq!(form.test_cases.len(), 1);
        assert_eq!(form.test_cases.active_index(), Some(0));
        assert_eq!(form.test_cases.active_case(), Some(&TestCase::new("", "")));
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let mut form = ProblemAuthoring::new();
        form.description = "x".to_string();
        assert!(form.to_draft().is_err());
    }

    #[test]
    fn test_from_draft_keeps_unset_defaults() {
        let mut draft = ProblemDraft {
            title: "T".to_string(),
            description: "D".to_string(),
            ..ProblemDraft::default()
        };
        draft.drivers.insert(Language::Python, "main()".to_string());

        let form = ProblemAuthoring::from_draft(draft);
        let python = form.boilerplate.get(Language::Python);

        assert_eq!(python.driver, "main()");
        assert_eq!(python.template, default_boilerplate(Language::Python).template);
    }
}

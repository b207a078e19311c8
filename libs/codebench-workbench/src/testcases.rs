use codebench_common::types::TestCase;

/// Stable identity of a case within one tabset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum CaseField {
    Input,
    ExpectedOutput,
}

#[derive(Debug, Clone)]
struct Entry {
    id: CaseId,
    case: TestCase,
}

/// Ordered, editable test cases with one active tab
#[derive(Debug, Clone, Default)]
pub struct TestCaseTabset {
    entries: Vec<Entry>,
    active: Option<usize>,
    next_id: u64,
}

impl TestCaseTabset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cases(cases: impl IntoIterator<Item = TestCase>) -> Self {
        let mut tabset = Self::new();
        for case in cases {
            let id = tabset.allocate();
            tabset.entries.push(Entry { id, case });
        }
        if !tabset.entries.is_empty() {
            tabset.active = Some(0);
        }
        tabset
    }

    fn allocate(&mut self) -> CaseId {
        let id = CaseId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<CaseId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn cases(&self) -> Vec<TestCase> {
        self.entries.iter().map(|e| e.case.clone()).collect()
    }

    pub fn get(&self, id: CaseId) -> Option<&TestCase> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.case)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_case(&self) -> Option<&TestCase> {
        self.active.and_then(|i| self.entries.get(i)).map(|e| &e.case)
    }

    /// Out-of-range indices are ignored
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.active = Some(index);
        true
    }

    pub fn add_case(&mut self) -> CaseId {
        let id = self.allocate();
        self.entries.push(Entry {
            id,
            case: TestCase::new("", ""),
        });
        if self.active.is_none() {
            self.active = Some(0);
        }
        id
    }

    pub fn update_case(&mut self, id: CaseId, field: CaseField, value: impl Into<String>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        match field {
            CaseField::Input => entry.case.input = value.into(),
            CaseField::ExpectedOutput => entry.case.expected_output = value.into(),
        }
        true
    }

    /// Remove by identity. The active tab keeps pointing at the same case
    /// unless that case is the one removed, in which case it falls back to
    /// the first tab.
    pub fn remove_case(&mut self, id: CaseId) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        self.entries.remove(position);

        self.active = match self.active {
            _ if self.entries.is_empty() => None,
            Some(active) if active == position => Some(0),
            Some(active) if active > position => Some(active - 1),
            other => other,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> TestCaseTabset {
        TestCaseTabset::from_cases(vec![
            TestCase::new("1", "a"),
            TestCase::new("2", "b"),
            TestCase::new("3", "c"),
        ])
    }

    #[test]
    fn test_first_case_active_on_load() {
        let tabs = three();
        assert_eq!(tabs.active_index(), Some(0));
        assert!(TestCaseTabset::from_cases(Vec::new()).active_case().is_none());
    }

    #[test]
    fn test_set_active_out_of_bounds_is_noop() {
        let mut tabs = three();
        assert!(tabs.set_active(2));
        assert!(!tabs.set_active(3));
        assert_eq!(tabs.active_index(), Some(2));
    }

    #[test]
    fn test_remove_active_falls_back_to_first() {
        let mut tabs = three();
        tabs.set_active(1);
        let id = tabs.ids()[1];

        assert!(tabs.remove_case(id));
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs.active_index(), Some(0));
        assert_eq!(tabs.active_case().unwrap().input, "1");
    }

    #[test]
    fn test_remove_before_active_keeps_same_case() {
        let mut tabs = three();
        tabs.set_active(2);
        let first = tabs.ids()[0];

        tabs.remove_case(first);
        assert_eq!(tabs.active_index(), Some(1));
        assert_eq!(tabs.active_case().unwrap().input, "3");
    }

    #[test]
    fn test_remove_last_case_leaves_empty() {
        let mut tabs = TestCaseTabset::from_cases(vec![TestCase::new("only", "x")]);
        let id = tabs.ids()[0];

        assert!(tabs.remove_case(id));
        assert!(tabs.is_empty());
        assert_eq!(tabs.active_index(), None);
        assert!(tabs.active_case().is_none());
        assert!(!tabs.remove_case(id));
    }

    #[test]
    fn test_add_and_update_by_id() {
        let mut tabs = TestCaseTabset::new();
        let id = tabs.add_case();
        assert_eq!(tabs.active_index(), Some(0));

        assert!(tabs.update_case(id, CaseField::Input, "4 5"));
        assert!(tabs.update_case(id, CaseField::ExpectedOutput, "9"));
        assert_eq!(tabs.get(id), Some(&TestCase::new("4 5", "9")));

        let second = tabs.add_case();
        assert_ne!(id, second);
        assert_eq!(tabs.active_index(), Some(0));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut tabs = three();
        let removed = tabs.ids()[2];
        tabs.remove_case(removed);
        let added = tabs.add_case();
        assert_ne!(removed, added);
        assert!(!tabs.update_case(removed, CaseField::Input, "x"));
    }
}

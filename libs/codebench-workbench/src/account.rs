// Progress summary over a user's submissions
use codebench_common::types::Submission;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountStats {
    pub total_submissions: usize,
    pub accepted_submissions: usize,
    /// Distinct problems with at least one accepted submission
    pub solved_problems: usize,
}

impl AccountStats {
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let accepted: Vec<&Submission> = submissions.iter().filter(|s| s.status.is_accepted()).collect();
        let solved: HashSet<u64> = accepted.iter().map(|s| s.problem_id).collect();

        Self {
            total_submissions: submissions.len(),
            accepted_submissions: accepted.len(),
            solved_problems: solved.len(),
        }
    }

    /// Accepted share of all submissions, in percent
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_submissions == 0 {
            return 0.0;
        }
        self.accepted_submissions as f64 * 100.0 / self.total_submissions as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stored_submission;
    use codebench_common::types::SubmissionStatus;

    #[test]
    fn test_problem_accepted_twice_is_solved_once() {
        let submissions = vec![
            stored_submission(1, 7, SubmissionStatus::Accepted),
            stored_submission(2, 7, SubmissionStatus::Accepted),
            stored_submission(3, 8, SubmissionStatus::WrongAnswer),
            stored_submission(4, 9, SubmissionStatus::Accepted),
        ];

        let stats = AccountStats::from_submissions(&submissions);

        assert_eq!(
            stats,
            AccountStats {
                total_submissions: 4,
                accepted_submissions: 3,
                solved_problems: 2,
            }
        );
        assert_eq!(stats.acceptance_rate(), 75.0);
    }

    #[test]
    fn test_failed_attempts_solve_nothing() {
        let submissions = vec![
            stored_submission(1, 7, SubmissionStatus::CompileError),
            stored_submission(2, 7, SubmissionStatus::TimeLimitExceeded),
        ];

        let stats = AccountStats::from_submissions(&submissions);

        assert_eq!(stats.solved_problems, 0);
        assert_eq!(stats.accepted_submissions, 0);
        assert_eq!(stats.total_submissions, 2);
    }

    #[test]
    fn test_no_submissions() {
        let stats = AccountStats::from_submissions(&[]);
        assert_eq!(stats, AccountStats::default());
        assert_eq!(stats.acceptance_rate(), 0.0);
    }
}

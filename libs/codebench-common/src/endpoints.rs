/// Problem service routes - defines only naming, not transport
/// Keeps the HTTP client and its test doubles from drifting apart

pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";

pub const PROBLEMS_PREFIX: &str = "/problems";

/// Problem listing and creation (trailing slash is significant to the service)
pub fn problem_list() -> String {
    format!("{}/", PROBLEMS_PREFIX)
}

/// Single problem: fetch, update, delete
pub fn problem(id: u64) -> String {
    format!("{}/{}", PROBLEMS_PREFIX, id)
}

/// Problems owned by the caller (all problems for an admin)
pub fn my_problems() -> String {
    format!("{}/mine", PROBLEMS_PREFIX)
}

pub fn run(problem_id: u64) -> String {
    format!("{}/{}/run", PROBLEMS_PREFIX, problem_id)
}

pub fn submit(problem_id: u64) -> String {
    format!("{}/{}/submit", PROBLEMS_PREFIX, problem_id)
}

/// The caller's submissions for one problem, newest first
pub fn problem_submissions(problem_id: u64) -> String {
    format!("{}/{}/submissions", PROBLEMS_PREFIX, problem_id)
}

/// Every submission the caller has made, across problems
pub fn all_submissions() -> String {
    format!("{}/submissions", PROBLEMS_PREFIX)
}

pub fn ranking() -> String {
    format!("{}/ranking", PROBLEMS_PREFIX)
}

/// Join a base URL and a route without doubling the slash
pub fn url(base: &str, route: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), route)
}

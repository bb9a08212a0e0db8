pub const RECORDS_URL: &str = "/records";
pub const RECORD_URL: &str = "/records/{id}";
pub const CONTESTS_URL: &str = "/contests";

pub fn record_url(id: &str) -> String {
    format!("/records/{id}")
}

pub const BASIC_AUTH_CHALLENGE: &str = r#"Basic realm="MCQ Admin Panel""#;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:1414";
pub const DEFAULT_LOG_FILTER: &str = "tracing=info,mcq_admin=debug";

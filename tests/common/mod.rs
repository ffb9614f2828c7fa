//! Common test utilities

use std::fs;
use std::sync::Arc;

use whisker::store::StatusLog;

/// Load the mixed-format sample log
#[allow(dead_code)]
pub fn load_fixture() -> String {
    let path = "tests/fixtures/status_log.txt";
    fs::read_to_string(path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

/// Build one piped-format line
#[allow(dead_code)]
pub fn piped_line(port: u16, id: u64, duration: &str, state: &str) -> String {
    format!("Port {port} | ID {id} | Message: {duration}, Cat state: {state}")
}

/// Create a status log in a temp dir seeded with the given lines
#[allow(dead_code)]
pub async fn seeded_log(lines: &[&str]) -> (tempfile::TempDir, Arc<StatusLog>) {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(StatusLog::new(dir.path().join("status.log")));
    for line in lines {
        log.append_line(line).await.unwrap();
    }
    (dir, log)
}

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn root(base: &str) -> String {
    base_join(base, &format!("{}/", API_PREFIX))
}
pub fn health(base: &str) -> String {
    base_join(base, &format!("{}/health", API_PREFIX))
}
pub fn reminders(base: &str) -> String {
    base_join(base, &format!("{}/reminders", API_PREFIX))
}
pub fn reminder(base: &str, id: &str) -> String {
    base_join(base, &format!("{}/reminders/{}", API_PREFIX, enc(id)))
}
pub fn status(base: &str) -> String {
    base_join(base, &format!("{}/status", API_PREFIX))
}
pub fn manifest(base: &str) -> String {
    base_join(base, "/manifest.json")
}

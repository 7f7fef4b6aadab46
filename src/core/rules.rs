// src/core/rules.rs

use regex::RegexBuilder;
use tracing::warn;

use crate::core::catalog::DetectionRule;

/// Decides whether a completed HTTP response indicates that the probed
/// account exists. Pure function: same inputs, same answer.
///
/// Patterns come from untrusted catalog data, so a pattern that fails to
/// compile is logged and treated as non-matching rather than aborting the
/// scan.
pub fn evaluate(
    rule: &DetectionRule,
    status: u16,
    body: Option<&str>,
    final_url: &str,
    request_url: &str,
) -> bool {
    match rule {
        DetectionRule::StatusCode => status == 200,
        DetectionRule::Message { absence_text } => {
            // The site shows `absence_text` on its "no such user" page; if
            // the text is absent, the account exists.
            !absence_text.is_empty() && !body.unwrap_or("").contains(absence_text.as_str())
        }
        DetectionRule::ResponseUrl => final_url == request_url,
        DetectionRule::Regex { pattern } => {
            if pattern.is_empty() {
                return status == 200;
            }
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => re.is_match(body.unwrap_or("")),
                Err(error) => {
                    warn!(%pattern, %error, "Invalid detection pattern, treating as no match.");
                    false
                }
            }
        }
    }
}

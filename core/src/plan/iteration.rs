use std::path::PathBuf;

use serde_json::Value;

use crate::context::RunContext;
use crate::subject::Subject;

/// Variable carrying the API base URL, both in iteration data and injected vars.
pub const BASE_URL_VAR: &str = "base_url";
/// Variable carrying the JSON-encoded credential.
pub const AUTH_TOKEN_VAR: &str = "Auth-Token";

/// Where a run's iteration data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationData {
    /// Payload written to the descriptor's path before the run and removed after.
    Generated(Value),
    /// Existing file owned by the caller; never written or removed.
    Shared(PathBuf),
}

/// Single-iteration payload: subject attributes overlaid with the shared
/// context fields.
pub fn iteration_payload(subject: &Subject, ctx: &RunContext) -> Value {
    let mut entry = subject.attributes.clone();
    entry.insert(
        BASE_URL_VAR.to_string(),
        Value::String(ctx.base_url().to_string()),
    );
    entry.insert(AUTH_TOKEN_VAR.to_string(), Value::String(ctx.auth().to_json()));
    Value::Array(vec![Value::Object(entry)])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::AuthCredential;

    #[test]
    fn payload_is_one_element_with_context_overriding_attributes() {
        let ctx = RunContext::new(
            "https://api.example.test",
            AuthCredential::new("qa@example.test", "tok"),
            "collection.json",
            "results",
        );
        let attrs = json!({"companyName": "Acme", "base_url": "stale"});
        let subject = Subject::with_attributes("Acme", attrs.as_object().unwrap().clone());

        let payload = iteration_payload(&subject, &ctx);
        let items = payload.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["companyName"], "Acme");
        assert_eq!(items[0]["base_url"], "https://api.example.test");

        let token: Value = serde_json::from_str(items[0]["Auth-Token"].as_str().unwrap()).unwrap();
        assert_eq!(token, json!({"email": "qa@example.test", "webToken": "tok"}));
    }
}

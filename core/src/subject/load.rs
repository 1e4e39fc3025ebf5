use std::path::Path;

use serde_json::Value;

use crate::error::BatchError;

use super::Subject;

/// Joins the values of several name keys into one subject name.
pub const NAME_SEPARATOR: &str = " - ";

/// Reads a JSON array of objects and turns each entry into a [`Subject`].
pub fn load_subjects(path: &Path, name_keys: &[String]) -> Result<Vec<Subject>, BatchError> {
    let raw = std::fs::read_to_string(path).map_err(|e| BatchError::SubjectList {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| BatchError::SubjectList {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    subjects_from_value(&value, name_keys).map_err(|reason| BatchError::SubjectList {
        path: path.display().to_string(),
        reason,
    })
}

/// Builds subjects from an already decoded list.
///
/// Every entry keeps all of its fields as attributes. The first name key is
/// primary: when it is missing, blank or null the subject name is that raw
/// value so the subject is later skipped. Blank secondary parts are dropped.
pub fn subjects_from_value(value: &Value, name_keys: &[String]) -> Result<Vec<Subject>, String> {
    let Some(items) = value.as_array() else {
        return Err("expected a JSON array of objects".to_string());
    };
    let Some((primary, secondary)) = name_keys.split_first() else {
        return Err("no subject name keys configured".to_string());
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            return Err(format!("entry {idx} is not an object"));
        };

        let head = name_part(obj.get(primary));
        let name = if is_blank(&head) {
            head
        } else {
            let mut parts = vec![head];
            parts.extend(
                secondary
                    .iter()
                    .map(|k| name_part(obj.get(k)))
                    .filter(|p| !is_blank(p)),
            );
            parts.join(NAME_SEPARATOR)
        };

        out.push(Subject::with_attributes(name, obj.clone()));
    }
    Ok(out)
}

fn name_part(v: Option<&Value>) -> String {
    match v {
        None => String::new(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_blank(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("null")
}

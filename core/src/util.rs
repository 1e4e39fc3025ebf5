use std::path::PathBuf;

/// Expands `~` and `$VAR` in a configured path. Unknown variables leave the
/// input untouched.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Records route paths whose server-rendered output must be regenerated.
///
/// The rendering layer is an external collaborator; this registry is what it
/// polls to know which paths went stale. Every mutation bumps the counter for
/// the caller-supplied path.
#[derive(Clone, Default)]
pub struct Revalidator {
    entries: Arc<Mutex<HashMap<String, u64>>>,
}

impl Revalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a path's cached rendering as stale
    pub fn invalidate(&self, path: &str) {
        let mut entries = self.entries.lock().expect("revalidator lock poisoned");
        let count = entries.entry(path.to_string()).or_insert(0);
        *count += 1;
        tracing::debug!(path, revision = *count, "revalidated path");
    }

    /// How many times a path has been invalidated
    pub fn revision(&self, path: &str) -> u64 {
        let entries = self.entries.lock().expect("revalidator lock poisoned");
        entries.get(path).copied().unwrap_or(0)
    }

    /// All paths invalidated so far
    pub fn stale_paths(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("revalidator lock poisoned");
        entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_bumps_revision() {
        let revalidator = Revalidator::new();
        assert_eq!(revalidator.revision("/"), 0);

        revalidator.invalidate("/");
        revalidator.invalidate("/");
        revalidator.invalidate("/insight/42");

        assert_eq!(revalidator.revision("/"), 2);
        assert_eq!(revalidator.revision("/insight/42"), 1);

        let mut paths = revalidator.stale_paths();
        paths.sort();
        assert_eq!(paths, vec!["/".to_string(), "/insight/42".to_string()]);
    }

    #[test]
    fn test_clones_share_state() {
        let revalidator = Revalidator::new();
        let clone = revalidator.clone();

        clone.invalidate("/profile/alice");

        assert_eq!(revalidator.revision("/profile/alice"), 1);
    }
}

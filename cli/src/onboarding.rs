//! First-run flag: a marker file in the data directory.
//!
//! Read once at startup to pick the greeting; outside the auth core.

use std::path::Path;

const MARKER: &str = "onboarded";

pub fn has_completed_onboarding(data_dir: &Path) -> bool {
    data_dir.join(MARKER).exists()
}

pub fn mark_onboarding_complete(data_dir: &Path) {
    if let Err(e) = std::fs::write(data_dir.join(MARKER), b"1") {
        tracing::warn!("failed to write onboarding marker: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!has_completed_onboarding(dir.path()));

        mark_onboarding_complete(dir.path());
        assert!(has_completed_onboarding(dir.path()));
    }
}

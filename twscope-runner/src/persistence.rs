//! Watchlist persistence as a small JSON document.
//!
//! A missing or unreadable file is not an error: the dashboard starts from the
//! configured defaults and logs why.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::state::AppState;

/// Load the saved state, falling back to `defaults`.
pub fn load_state<S: AsRef<str>>(path: &Path, defaults: &[S]) -> AppState {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no saved watchlist, using defaults");
            return AppState::with_defaults(defaults);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read watchlist, using defaults");
            return AppState::with_defaults(defaults);
        }
    };

    match serde_json::from_str::<AppState>(&content) {
        Ok(mut state) => {
            // A selection pointing outside the list is dropped.
            if state.selected().is_some_and(|s| !state.watchlist.contains(s)) {
                state.clear_selection();
            }
            state
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt watchlist, using defaults");
            AppState::with_defaults(defaults)
        }
    }
}

/// Write the state, creating parent directories. The file is replaced atomically.
pub fn save_state(path: &Path, state: &AppState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state).context("failed to serialize watchlist")?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    debug!(path = %path.display(), codes = state.watchlist.len(), "watchlist saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::View;

    const DEFAULTS: [&str; 3] = ["2330", "2317", "2454"];

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_state(&dir.path().join("watchlist.json"), &DEFAULTS);
        assert_eq!(state.watchlist.codes(), DEFAULTS);
        assert_eq!(state.current_view, View::Overview);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_state(&path, &DEFAULTS).watchlist.codes(), DEFAULTS);
    }

    #[test]
    fn save_then_load_keeps_order_and_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("watchlist.json");

        let mut state = AppState::with_defaults(&["2454", "2330"]);
        state.add("3231").unwrap();
        state.select("3231").unwrap();
        save_state(&path, &state).unwrap();

        let loaded = load_state(&path, &DEFAULTS);
        assert_eq!(loaded, state);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn dangling_selection_is_cleared_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        std::fs::write(
            &path,
            r#"{"watchlist":["2330"],"current_view":{"view":"symbol","code":"2317"}}"#,
        )
        .unwrap();
        let state = load_state(&path, &DEFAULTS);
        assert_eq!(state.watchlist.codes(), ["2330"]);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn document_without_view_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        std::fs::write(&path, r#"{"watchlist":["2603"]}"#).unwrap();
        assert_eq!(load_state(&path, &DEFAULTS).watchlist.codes(), ["2603"]);
    }

    #[test]
    fn hand_edited_file_is_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        std::fs::write(&path, r#"{"watchlist":["2330","2330"," 2317","bad code"]}"#).unwrap();

        let mut state = load_state(&path, &DEFAULTS);
        assert_eq!(state.watchlist.codes(), ["2330", "2317"]);
        state.remove("2330").unwrap();
        assert!(!state.watchlist.contains("2330"));
        assert_eq!(state.watchlist.codes(), ["2317"]);
    }
}

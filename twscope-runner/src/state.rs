//! Dashboard state passed explicitly to every command handler.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid code '{0}': expected digits or an index symbol")]
    InvalidCode(String),

    #[error("'{0}' is not on the watchlist")]
    NotWatched(String),
}

/// Normalize user input: trimmed, upper-cased, no whitespace inside.
pub fn normalize_code(raw: &str) -> Result<String, StateError> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '^' | '.' | '-'));
    if valid {
        Ok(code)
    } else {
        Err(StateError::InvalidCode(raw.to_string()))
    }
}

/// Ordered, duplicate-free list of codes.
///
/// Serialized as a plain array; loading goes through [`Watchlist::new`] so
/// saved files get the same normalization as typed input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Watchlist {
    codes: Vec<String>,
}

impl From<Vec<String>> for Watchlist {
    fn from(codes: Vec<String>) -> Self {
        Self::new(codes)
    }
}

impl From<Watchlist> for Vec<String> {
    fn from(list: Watchlist) -> Self {
        list.codes
    }
}

impl Watchlist {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for code in codes {
            // Invalid defaults are skipped.
            let _ = list.add(code.as_ref());
        }
        list
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        normalize_code(code).is_ok_and(|c| self.codes.contains(&c))
    }

    /// Append a code. Returns `false` if it was already present.
    pub fn add(&mut self, code: &str) -> Result<bool, StateError> {
        let code = normalize_code(code)?;
        if self.codes.contains(&code) {
            return Ok(false);
        }
        self.codes.push(code);
        Ok(true)
    }

    pub fn remove(&mut self, code: &str) -> Result<(), StateError> {
        let code = normalize_code(code)?;
        let pos = self
            .codes
            .iter()
            .position(|c| *c == code)
            .ok_or(StateError::NotWatched(code))?;
        self.codes.remove(pos);
        Ok(())
    }
}

/// What the dashboard currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", content = "code", rename_all = "snake_case")]
pub enum View {
    /// Market pulse and hot picks.
    #[default]
    Overview,
    Symbol(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub watchlist: Watchlist,
    #[serde(default)]
    pub current_view: View,
}

impl AppState {
    pub fn with_defaults<S: AsRef<str>>(codes: &[S]) -> Self {
        Self {
            watchlist: Watchlist::new(codes),
            current_view: View::Overview,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.current_view {
            View::Symbol(code) => Some(code),
            View::Overview => None,
        }
    }

    /// Show a watched symbol.
    pub fn select(&mut self, code: &str) -> Result<(), StateError> {
        let code = normalize_code(code)?;
        if !self.watchlist.contains(&code) {
            return Err(StateError::NotWatched(code));
        }
        self.current_view = View::Symbol(code);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.current_view = View::Overview;
    }

    pub fn add(&mut self, code: &str) -> Result<bool, StateError> {
        self.watchlist.add(code)
    }

    /// Remove a code; removing the selected one returns to the overview.
    pub fn remove(&mut self, code: &str) -> Result<(), StateError> {
        self.watchlist.remove(code)?;
        if self.selected().is_some_and(|s| !self.watchlist.contains(s)) {
            self.clear_selection();
        }
        Ok(())
    }
}

//! Derived rendering state of the document list

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the renderer should show.
///
/// `InitialLoading` and `LoadingWithData` are transient; the others hold
/// until the next load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    /// Nothing displayed yet, fetch in flight: show a skeleton
    InitialLoading,
    /// Fetch in flight, previous results stay visible
    LoadingWithData,
    Success,
    /// Last fetch failed; previous results stay visible with a retry affordance
    Error,
    Empty,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::InitialLoading => "initial_loading",
            UiState::LoadingWithData => "loading_with_data",
            UiState::Success => "success",
            UiState::Error => "error",
            UiState::Empty => "empty",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::InitialLoading | UiState::LoadingWithData)
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the UI state from the loading flag and the document counts.
///
/// - `current_count`: documents in the latest successful result
/// - `previous_display_count`: documents currently on screen
///
/// Failures are not an input: the controller overrides the derived state
/// with [`UiState::Error`] when the authoritative fetch fails.
pub fn derive_ui_state(
    is_loading: bool,
    has_ever_loaded: bool,
    current_count: usize,
    previous_display_count: usize,
) -> UiState {
    if is_loading {
        if !has_ever_loaded || previous_display_count == 0 {
            UiState::InitialLoading
        } else {
            UiState::LoadingWithData
        }
    } else if current_count > 0 {
        UiState::Success
    } else {
        UiState::Empty
    }
}

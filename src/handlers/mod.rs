// src/handlers/mod.rs
use serde::Serialize;

use crate::error::FetchErrorKind;

pub mod error;
pub mod macro_view;
pub mod ticker;
pub mod valuation;
pub mod watchlist;

/// Body of every dashboard view: the data, or a warning to show in its place.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum View<T> {
    Ok(T),
    Unavailable {
        warning: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<FetchErrorKind>,
    },
}

impl<T> View<T> {
    pub fn unavailable(warning: impl Into<String>, reason: Option<FetchErrorKind>) -> Self {
        View::Unavailable {
            warning: warning.into(),
            reason,
        }
    }
}

//! Trait abstractions for runtime I/O
//!
//! The host page is reached only through these traits, so the executor can
//! be driven by a browser bridge, the terminal front end or test mocks.

use crate::contact::Dispatch;
use crate::persistence::StoreError;
use crate::render::{RowId, Sound, View};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Drawing target of the widget
pub trait Surface: Send + Sync {
    /// Replace the widget with a freshly built view
    fn render(&self, view: &View);

    /// Show the typing indicator in a new bubble
    fn show_pending(&self, row: RowId);

    /// Replace the visible text of a pending bubble
    fn reveal(&self, row: RowId, text: &str);

    /// Drop a pending bubble; committed text arrives with the next render
    fn remove_pending(&self, row: RowId);

    /// Update only the calculator result line
    fn show_duration(&self, line: Option<&str>);

    fn play_sound(&self, sound: Sound);

    /// Short confirmation message
    fn toast(&self, message: &str);

    /// Let the visitor copy a value by hand when the clipboard is unavailable
    fn offer_manual_copy(&self, value: &str);
}

/// Errors from the host page's navigation and clipboard APIs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Popup was blocked")]
    PopupBlocked,
    #[error("Navigation failed: {0}")]
    Failed(String),
}

/// Links, new tabs, clipboard and the address bar
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), NavigationError>;

    async fn copy(&self, value: &str) -> Result<(), NavigationError>;

    /// Rewrite the address bar without reloading
    async fn replace_url(&self, url: &str) -> Result<(), NavigationError>;
}

/// String key-value storage (session or long-lived)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: Surface + ?Sized> Surface for Arc<T> {
    fn render(&self, view: &View) {
        (**self).render(view);
    }

    fn show_pending(&self, row: RowId) {
        (**self).show_pending(row);
    }

    fn reveal(&self, row: RowId, text: &str) {
        (**self).reveal(row, text);
    }

    fn remove_pending(&self, row: RowId) {
        (**self).remove_pending(row);
    }

    fn show_duration(&self, line: Option<&str>) {
        (**self).show_duration(line);
    }

    fn play_sound(&self, sound: Sound) {
        (**self).play_sound(sound);
    }

    fn toast(&self, message: &str) {
        (**self).toast(message);
    }

    fn offer_manual_copy(&self, value: &str) {
        (**self).offer_manual_copy(value);
    }
}

#[async_trait]
impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    async fn dispatch(&self, dispatch: &Dispatch) -> Result<(), NavigationError> {
        (**self).dispatch(dispatch).await
    }

    async fn copy(&self, value: &str) -> Result<(), NavigationError> {
        (**self).copy(value).await
    }

    async fn replace_url(&self, url: &str) -> Result<(), NavigationError> {
        (**self).replace_url(url).await
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }
}

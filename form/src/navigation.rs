//! In-process browsing context.

use dynform_core::environment::Navigator;
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks where the page has been sent.
///
/// Clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct BrowsingContext {
    history: Arc<Mutex<Vec<String>>>,
}

impl BrowsingContext {
    /// Fresh context that has not navigated
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current location, if any navigation happened
    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.history().last().cloned()
    }

    /// All navigations in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for BrowsingContext {
    fn navigate(&self, target: &str) {
        tracing::info!(target_url = %target, "Navigating");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_follows_last_navigation() {
        let context = BrowsingContext::new();
        assert_eq!(context.location(), None);
        context.navigate("/thanks");
        context.clone().navigate("/done");
        assert_eq!(context.location(), Some("/done".to_string()));
        assert_eq!(context.history(), vec!["/thanks", "/done"]);
    }
}

//! Display regions the mini cart renders into.
//!
//! A [`Page`] hands out [`Region`] handles by element id. Handles are looked
//! up once when the mini cart attaches and dropped when it detaches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A writable display target.
pub trait Region: Send + Sync {
    /// Replace the text content.
    fn set_text(&self, text: &str);

    /// Replace the inner HTML.
    fn set_html(&self, html: &str);

    /// Show or hide the region.
    fn set_visible(&self, visible: bool);
}

/// Source of regions, keyed by element id.
pub trait Page {
    /// Region handle type.
    type Region: Region;

    /// Look up a region; `None` if the page has no element with this id.
    fn region(&self, id: &str) -> Option<Self::Region>;
}

/// Recorded state of one in-memory region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionState {
    /// Last text written.
    pub text: String,
    /// Last HTML written.
    pub html: String,
    /// Current visibility.
    pub visible: bool,
    /// Number of writes of any kind.
    pub writes: u64,
}

/// In-process page.
///
/// Only ids declared with [`MemoryPage::with_region`] exist. Cloning shares
/// the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    regions: Arc<Mutex<HashMap<String, RegionState>>>,
}

impl MemoryPage {
    /// An empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a region.
    #[must_use]
    pub fn with_region(self, id: &str) -> Self {
        self.lock().entry(id.to_string()).or_default();
        self
    }

    /// Current state of a region.
    #[must_use]
    pub fn state(&self, id: &str) -> Option<RegionState> {
        self.lock().get(id).cloned()
    }

    /// Current text of a region.
    #[must_use]
    pub fn text(&self, id: &str) -> Option<String> {
        self.state(id).map(|s| s.text)
    }

    /// Current HTML of a region.
    #[must_use]
    pub fn html(&self, id: &str) -> Option<String> {
        self.state(id).map(|s| s.html)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RegionState>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Page for MemoryPage {
    type Region = MemoryRegion;

    fn region(&self, id: &str) -> Option<MemoryRegion> {
        self.lock().contains_key(id).then(|| MemoryRegion {
            page: self.clone(),
            id: id.to_string(),
        })
    }
}

/// Handle to a region of a [`MemoryPage`].
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    page: MemoryPage,
    id: String,
}

impl MemoryRegion {
    fn update(&self, f: impl FnOnce(&mut RegionState)) {
        if let Some(state) = self.page.lock().get_mut(&self.id) {
            f(state);
            state.writes += 1;
        }
    }
}

impl Region for MemoryRegion {
    fn set_text(&self, text: &str) {
        self.update(|s| text.clone_into(&mut s.text));
    }

    fn set_html(&self, html: &str) {
        self.update(|s| html.clone_into(&mut s.html));
    }

    fn set_visible(&self, visible: bool) {
        self.update(|s| s.visible = visible);
    }
}

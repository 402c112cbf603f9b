//! Environment watchers.
//!
//! The host owns the viewport size, the theme attribute and page
//! visibility. Each watcher remembers the last value it saw and turns raw
//! notifications into [`EnvironmentEvent`]s only when something actually
//! changed.

use mazeglow_common::Theme;
use tracing::trace;

/// A change in the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentEvent {
    /// The container has new dimensions.
    Resized {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// The theme attribute resolved to a different theme.
    ThemeChanged(Theme),
    /// The page moved to the foreground (`true`) or background (`false`).
    VisibilityChanged(bool),
}

/// Filters container size notifications.
#[derive(Debug, Clone, Default)]
pub struct ResizeWatcher {
    last: Option<(u32, u32)>,
}

impl ResizeWatcher {
    /// Creates a watcher that has not seen any size yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a size. Repeats of the last seen size are ignored.
    pub fn observe(&mut self, width: u32, height: u32) -> Option<EnvironmentEvent> {
        if self.last == Some((width, height)) {
            trace!("Ignoring resize to unchanged {width}x{height}");
            return None;
        }
        self.last = Some((width, height));
        Some(EnvironmentEvent::Resized { width, height })
    }

    /// Last seen size.
    #[must_use]
    pub fn last(&self) -> Option<(u32, u32)> {
        self.last
    }
}

/// Tracks the resolved page theme.
#[derive(Debug, Clone, Copy)]
pub struct ThemeWatcher {
    current: Theme,
}

impl ThemeWatcher {
    /// Creates a watcher starting from the given theme.
    #[must_use]
    pub fn new(initial: Theme) -> Self {
        Self { current: initial }
    }

    /// Reports a mutation of the theme attribute.
    pub fn observe(&mut self, attribute: Option<&str>) -> Option<EnvironmentEvent> {
        let theme = Theme::from_attribute(attribute);
        if theme == self.current {
            return None;
        }
        self.current = theme;
        Some(EnvironmentEvent::ThemeChanged(theme))
    }

    /// Theme most recently observed.
    #[must_use]
    pub fn current(&self) -> Theme {
        self.current
    }
}

/// Tracks page visibility.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityWatcher {
    visible: bool,
}

impl Default for VisibilityWatcher {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl VisibilityWatcher {
    /// Creates a watcher for a visible page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports the page visibility.
    pub fn observe(&mut self, visible: bool) -> Option<EnvironmentEvent> {
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        Some(EnvironmentEvent::VisibilityChanged(visible))
    }

    /// Whether the page is in the foreground.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

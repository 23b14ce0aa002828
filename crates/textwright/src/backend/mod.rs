//! UI automation backends.
//!
//! The runner never talks to a browser directly. Everything it needs from
//! the page goes through [`UiBackend`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  UiBackend (async trait)                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐     ┌──────────────────────────┐  │
//! │  │  CdpBackend          │     │  MockBackend             │  │
//! │  │  (feature "browser") │     │  (in-memory document)    │  │
//! │  │  chromiumoxide + JS  │     │  tests and dry runs      │  │
//! │  └──────────────────────┘     └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Name and label matching follow Playwright's defaults: case-insensitive
//! substring, first match in document order.

#[cfg(feature = "browser")]
pub mod cdp;
pub mod mock;

#[cfg(feature = "browser")]
pub use cdp::{CdpBackend, CdpConfig};
pub use mock::{MockBackend, MockEffect, MockElement};

use crate::result::TextwrightResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a resolved element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    /// Backend-specific identifier
    pub id: String,
}

impl TargetRef {
    /// Wrap a backend identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Abstract UI surface the runner drives.
///
/// Resolution methods return `Ok(None)` when nothing matches; errors are
/// reserved for backend failures.
#[async_trait]
pub trait UiBackend: Send + Sync {
    /// First element with `role` whose accessible name contains `name`
    async fn resolve_by_role(
        &self,
        role: &str,
        name: &str,
        scope: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>>;

    /// First element whose `attribute` equals `value`
    async fn resolve_by_attribute(
        &self,
        attribute: &str,
        value: &str,
    ) -> TextwrightResult<Option<TargetRef>>;

    /// First element whose associated label contains `name`
    async fn resolve_by_label(
        &self,
        name: &str,
        scope: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>>;

    /// First element matching a simple CSS selector
    async fn resolve_by_css(
        &self,
        css: &str,
        within: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>>;

    /// First `<section>` containing a heading whose name contains `heading`
    async fn resolve_section(&self, heading: &str) -> TextwrightResult<Option<TargetRef>>;

    /// Whether the element is rendered and visible
    async fn is_visible(&self, target: &TargetRef) -> TextwrightResult<bool>;

    /// Click the element
    async fn click(&mut self, target: &TargetRef) -> TextwrightResult<()>;

    /// Move the pointer over the element
    async fn hover(&mut self, target: &TargetRef) -> TextwrightResult<()>;

    /// Replace the element's value
    async fn fill(&mut self, target: &TargetRef, text: &str) -> TextwrightResult<()>;

    /// Current form value
    async fn value(&self, target: &TargetRef) -> TextwrightResult<String>;

    /// Rendered text
    async fn text(&self, target: &TargetRef) -> TextwrightResult<String>;

    /// Attribute value, `None` when absent
    async fn attribute(&self, target: &TargetRef, name: &str) -> TextwrightResult<Option<String>>;

    /// Element geometry, `None` when not rendered
    async fn bounding_box(&self, target: &TargetRef) -> TextwrightResult<Option<BoundingBox>>;

    /// Move the pointer
    async fn pointer_move(&mut self, point: Point) -> TextwrightResult<()>;

    /// Press the primary pointer button
    async fn pointer_down(&mut self) -> TextwrightResult<()>;

    /// Release the primary pointer button
    async fn pointer_up(&mut self) -> TextwrightResult<()>;

    /// Current page URL
    async fn current_url(&self) -> TextwrightResult<String>;

    /// Current page title
    async fn title(&self) -> TextwrightResult<String>;

    /// Reload the page, restoring its initial state
    async fn reload(&mut self) -> TextwrightResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_center_and_contains() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(bbox.center(), Point::new(60.0, 40.0));
        assert!(bbox.contains(&Point::new(10.0, 20.0)));
        assert!(bbox.contains(&bbox.center()));
        assert!(!bbox.contains(&Point::new(111.0, 30.0)));
    }

    #[test]
    fn test_target_ref_display() {
        assert_eq!(TargetRef::new("e3").to_string(), "e3");
    }
}

//! In-memory document backend.
//!
//! Elements live in a flat list in document order; nesting is expressed
//! with parent handles. The first mutating call snapshots the document so
//! [`UiBackend::reload`] can restore it, which makes a single
//! `MockBackend` reusable across test cases.

use super::{BoundingBox, Point, TargetRef, UiBackend};
use crate::result::{TextwrightError, TextwrightResult};
use crate::selector::SliderKind;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Slider state attached to a mock element
#[derive(Debug, Clone, PartialEq)]
pub struct MockSlider {
    /// Markup flavour
    pub kind: SliderKind,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Value granularity
    pub step: f64,
    /// Current value (the live `value` property)
    pub value: f64,
    /// Native `value` content attribute; drags never change it
    pub default_value: f64,
    /// Horizontal offset between pointer and value mapping, in pixels
    pub skew_px: f64,
}

impl MockSlider {
    fn value_at(&self, bbox: &BoundingBox, x: f64) -> f64 {
        if bbox.width <= 0.0 || self.max <= self.min {
            return self.min;
        }
        let ratio = ((x - bbox.x - self.skew_px) / bbox.width).clamp(0.0, 1.0);
        let raw = self.min + ratio * (self.max - self.min);
        let step = if self.step > 0.0 { self.step } else { 1.0 };
        let stepped = ((raw - self.min) / step).round() * step + self.min;
        stepped.clamp(self.min, self.max)
    }
}

/// Side effect triggered by clicking or hovering an element
#[derive(Debug, Clone, PartialEq)]
pub enum MockEffect {
    /// Change the page URL (and optionally its title)
    Navigate {
        /// New URL
        url: String,
        /// New title
        title: Option<String>,
    },
    /// Replace an element's text
    SetText {
        /// Element to update
        target: TargetRef,
        /// New text
        text: String,
    },
    /// Show or hide an element
    SetVisible {
        /// Element to update
        target: TargetRef,
        /// New visibility
        visible: bool,
    },
    /// Copy one element's value into another element's text
    CopyValue {
        /// Source element
        from: TargetRef,
        /// Destination element
        to: TargetRef,
    },
}

/// Element in a [`MockBackend`] document
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Tag name
    pub tag: String,
    /// ARIA role
    pub role: Option<String>,
    /// Accessible name
    pub name: String,
    /// Associated label text
    pub label: Option<String>,
    /// Rendered text
    pub text: String,
    /// Form value
    pub value: Option<String>,
    /// Attributes
    pub attributes: BTreeMap<String, String>,
    /// Whether the element itself is visible
    pub visible: bool,
    /// Containing element
    pub parent: Option<TargetRef>,
    /// Geometry
    pub bbox: Option<BoundingBox>,
    /// Slider state
    pub slider: Option<MockSlider>,
    /// Slider this element is the thumb of
    pub thumb_of: Option<TargetRef>,
    /// Effects applied on click
    pub on_click: Vec<MockEffect>,
    /// Effects applied on hover
    pub on_hover: Vec<MockEffect>,
}

impl MockElement {
    /// Create a visible element with a tag name
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: None,
            name: String::new(),
            label: None,
            text: String::new(),
            value: None,
            attributes: BTreeMap::new(),
            visible: true,
            parent: None,
            bbox: None,
            slider: None,
            thumb_of: None,
            on_click: Vec::new(),
            on_hover: Vec::new(),
        }
    }

    /// Set the ARIA role
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the accessible name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Associate a label; also the accessible name unless one is set
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if self.name.is_empty() {
            self.name.clone_from(&label);
        }
        self.label = Some(label);
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Nest inside another element
    #[must_use]
    pub fn inside(mut self, parent: &TargetRef) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Start hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Set the geometry
    #[must_use]
    pub fn bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox::new(x, y, width, height));
        self
    }

    /// Make the element a slider
    #[must_use]
    pub fn slider(mut self, kind: SliderKind, min: f64, max: f64, step: f64, value: f64) -> Self {
        self.slider = Some(MockSlider {
            kind,
            min,
            max,
            step,
            value,
            default_value: value,
            skew_px: 0.0,
        });
        self
    }

    /// Offset the slider's pointer-to-value mapping
    #[must_use]
    pub fn skew(mut self, skew_px: f64) -> Self {
        if let Some(slider) = self.slider.as_mut() {
            slider.skew_px = skew_px;
        }
        self
    }

    /// Apply an effect when clicked
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    /// Apply an effect when hovered
    #[must_use]
    pub fn on_hover(mut self, effect: MockEffect) -> Self {
        self.on_hover.push(effect);
        self
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    elements: Vec<MockElement>,
    url: String,
    title: String,
}

/// Mock backend for unit testing
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Elements in document order
    pub elements: Vec<MockElement>,
    /// Current URL
    pub url: String,
    /// Current title
    pub title: String,
    /// Call history for verification
    pub call_history: Vec<String>,
    pointer: Option<Point>,
    grabbed: Option<usize>,
    pristine: Option<Snapshot>,
}

impl MockBackend {
    /// Create an empty document at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: "about:blank".to_string(),
            ..Self::default()
        }
    }

    /// Set the page URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the page title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Append an element and return its handle.
    ///
    /// A shadcn slider gets a thumb child carrying its ARIA value
    /// attributes.
    pub fn add(&mut self, element: MockElement) -> TargetRef {
        let is_shadcn = element
            .slider
            .as_ref()
            .is_some_and(|s| s.kind == SliderKind::Shadcn);
        self.elements.push(element);
        let target = self.element_ref(self.elements.len() - 1);

        if is_shadcn {
            let mut thumb = MockElement::new("span")
                .attr("data-slot", "slider-thumb")
                .inside(&target);
            thumb.thumb_of = Some(target.clone());
            self.elements.push(thumb);
        }
        target
    }

    /// Handle of the element at a document position
    #[must_use]
    pub fn element_ref(&self, index: usize) -> TargetRef {
        TargetRef::new(format!("e{index}"))
    }

    /// Look up an element by handle
    #[must_use]
    pub fn element(&self, target: &TargetRef) -> Option<&MockElement> {
        self.index(target).ok().map(|idx| &self.elements[idx])
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.call_history
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }

    fn index(&self, target: &TargetRef) -> TextwrightResult<usize> {
        target
            .id
            .strip_prefix('e')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|idx| *idx < self.elements.len())
            .ok_or_else(|| TextwrightError::backend(format!("stale element handle {target}")))
    }

    fn parent_index(&self, idx: usize) -> Option<usize> {
        self.elements[idx]
            .parent
            .as_ref()
            .and_then(|p| self.index(p).ok())
    }

    fn is_within(&self, idx: usize, ancestor: usize) -> bool {
        let mut current = self.parent_index(idx);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_index(parent);
        }
        false
    }

    fn find(
        &self,
        scope: Option<&TargetRef>,
        predicate: impl Fn(&MockElement) -> bool,
    ) -> TextwrightResult<Option<TargetRef>> {
        let scope = scope.map(|s| self.index(s)).transpose()?;
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(idx, _)| scope.map_or(true, |s| self.is_within(*idx, s)))
            .find(|(_, element)| predicate(element))
            .map(|(idx, _)| self.element_ref(idx)))
    }

    fn snapshot(&mut self) {
        if self.pristine.is_none() {
            self.pristine = Some(Snapshot {
                elements: self.elements.clone(),
                url: self.url.clone(),
                title: self.title.clone(),
            });
        }
    }

    fn apply(&mut self, effects: Vec<MockEffect>) -> TextwrightResult<()> {
        for effect in effects {
            match effect {
                MockEffect::Navigate { url, title } => {
                    self.url = url;
                    if let Some(title) = title {
                        self.title = title;
                    }
                }
                MockEffect::SetText { target, text } => {
                    let idx = self.index(&target)?;
                    self.elements[idx].text = text;
                }
                MockEffect::SetVisible { target, visible } => {
                    let idx = self.index(&target)?;
                    self.elements[idx].visible = visible;
                }
                MockEffect::CopyValue { from, to } => {
                    let value = self.elements[self.index(&from)?].value.clone().unwrap_or_default();
                    let idx = self.index(&to)?;
                    self.elements[idx].text = value;
                }
            }
        }
        Ok(())
    }

    fn slider_attribute(&self, idx: usize, name: &str) -> Option<String> {
        let element = &self.elements[idx];
        let (slider, kind) = match (&element.slider, &element.thumb_of) {
            (Some(slider), _) if slider.kind == SliderKind::Native => (slider, SliderKind::Native),
            (_, Some(owner)) => {
                let owner = self.index(owner).ok()?;
                (self.elements[owner].slider.as_ref()?, SliderKind::Shadcn)
            }
            _ => return None,
        };
        let number = if name == kind.value_attribute() && kind == SliderKind::Native {
            slider.default_value
        } else if name == kind.value_attribute() {
            slider.value
        } else if name == kind.min_attribute() {
            slider.min
        } else if name == kind.max_attribute() {
            slider.max
        } else {
            return None;
        };
        Some(format_number(number))
    }

    fn collect_text(&self, idx: usize) -> String {
        let mut parts = Vec::new();
        for (i, element) in self.elements.iter().enumerate() {
            if (i == idx || self.is_within(i, idx)) && !element.text.is_empty() {
                parts.push(element.text.as_str());
            }
        }
        parts.join(" ")
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `tag`, `[attr=value]` or `tag[attr=value]`
#[derive(Debug, PartialEq, Eq)]
struct SimpleCss {
    tag: Option<String>,
    attribute: Option<(String, String)>,
}

impl SimpleCss {
    fn parse(css: &str) -> TextwrightResult<Self> {
        let unsupported = || TextwrightError::backend(format!("unsupported selector {css}"));
        let css = css.trim();
        let (tag, rest) = css.split_once('[').map_or((css, None), |(t, r)| (t, Some(r)));
        if tag.contains(|c: char| !c.is_ascii_alphanumeric() && c != '-') {
            return Err(unsupported());
        }
        let attribute = match rest {
            None => None,
            Some(rest) => {
                let inner = rest.strip_suffix(']').ok_or_else(unsupported)?;
                let (name, value) = inner.split_once('=').ok_or_else(unsupported)?;
                Some((
                    name.trim().to_string(),
                    value.trim().trim_matches(|c| c == '"' || c == '\'').to_string(),
                ))
            }
        };
        Ok(Self {
            tag: (!tag.is_empty()).then(|| tag.to_lowercase()),
            attribute,
        })
    }

    fn matches(&self, element: &MockElement) -> bool {
        self.tag.as_ref().map_or(true, |t| element.tag.eq_ignore_ascii_case(t))
            && self.attribute.as_ref().map_or(true, |(name, value)| {
                element.attributes.get(name).is_some_and(|v| v == value)
            })
    }
}

#[async_trait]
impl UiBackend for MockBackend {
    async fn resolve_by_role(
        &self,
        role: &str,
        name: &str,
        scope: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>> {
        self.find(scope, |e| {
            e.role.as_deref() == Some(role) && contains_ci(&e.name, name)
        })
    }

    async fn resolve_by_attribute(
        &self,
        attribute: &str,
        value: &str,
    ) -> TextwrightResult<Option<TargetRef>> {
        self.find(None, |e| e.attributes.get(attribute).is_some_and(|v| v == value))
    }

    async fn resolve_by_label(
        &self,
        name: &str,
        scope: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>> {
        self.find(scope, |e| e.label.as_deref().is_some_and(|l| contains_ci(l, name)))
    }

    async fn resolve_by_css(
        &self,
        css: &str,
        within: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>> {
        let selector = SimpleCss::parse(css)?;
        self.find(within, |e| selector.matches(e))
    }

    async fn resolve_section(&self, heading: &str) -> TextwrightResult<Option<TargetRef>> {
        let found = self.elements.iter().enumerate().find(|(idx, element)| {
            element.tag.eq_ignore_ascii_case("section")
                && self.elements.iter().enumerate().any(|(child, e)| {
                    e.role.as_deref() == Some("heading")
                        && contains_ci(&e.name, heading)
                        && self.is_within(child, *idx)
                })
        });
        Ok(found.map(|(idx, _)| self.element_ref(idx)))
    }

    async fn is_visible(&self, target: &TargetRef) -> TextwrightResult<bool> {
        let mut current = Some(self.index(target)?);
        while let Some(idx) = current {
            if !self.elements[idx].visible {
                return Ok(false);
            }
            current = self.parent_index(idx);
        }
        Ok(true)
    }

    async fn click(&mut self, target: &TargetRef) -> TextwrightResult<()> {
        let idx = self.index(target)?;
        self.snapshot();
        self.call_history.push(format!("click:{target}"));
        let effects = self.elements[idx].on_click.clone();
        self.apply(effects)
    }

    async fn hover(&mut self, target: &TargetRef) -> TextwrightResult<()> {
        let idx = self.index(target)?;
        self.snapshot();
        self.call_history.push(format!("hover:{target}"));
        if let Some(bbox) = self.elements[idx].bbox {
            self.pointer = Some(bbox.center());
        }
        let effects = self.elements[idx].on_hover.clone();
        self.apply(effects)
    }

    async fn fill(&mut self, target: &TargetRef, text: &str) -> TextwrightResult<()> {
        let idx = self.index(target)?;
        self.snapshot();
        self.call_history.push(format!("fill:{target}={text}"));
        self.elements[idx].value = Some(text.to_string());
        Ok(())
    }

    async fn value(&self, target: &TargetRef) -> TextwrightResult<String> {
        let idx = self.index(target)?;
        if let Some(slider) = &self.elements[idx].slider {
            return Ok(format_number(slider.value));
        }
        Ok(self.elements[idx].value.clone().unwrap_or_default())
    }

    async fn text(&self, target: &TargetRef) -> TextwrightResult<String> {
        Ok(self.collect_text(self.index(target)?))
    }

    async fn attribute(&self, target: &TargetRef, name: &str) -> TextwrightResult<Option<String>> {
        let idx = self.index(target)?;
        Ok(self
            .slider_attribute(idx, name)
            .or_else(|| self.elements[idx].attributes.get(name).cloned()))
    }

    async fn bounding_box(&self, target: &TargetRef) -> TextwrightResult<Option<BoundingBox>> {
        Ok(self.elements[self.index(target)?].bbox)
    }

    async fn pointer_move(&mut self, point: Point) -> TextwrightResult<()> {
        self.call_history.push("pointer_move".to_string());
        self.pointer = Some(point);
        if let Some(idx) = self.grabbed {
            let element = &mut self.elements[idx];
            if let (Some(slider), Some(bbox)) = (element.slider.as_mut(), element.bbox) {
                slider.value = slider.value_at(&bbox, point.x);
            }
        }
        Ok(())
    }

    async fn pointer_down(&mut self) -> TextwrightResult<()> {
        self.snapshot();
        self.call_history.push("pointer_down".to_string());
        self.grabbed = self.pointer.and_then(|point| {
            self.elements.iter().position(|e| {
                e.slider.is_some() && e.bbox.is_some_and(|b| b.contains(&point))
            })
        });
        Ok(())
    }

    async fn pointer_up(&mut self) -> TextwrightResult<()> {
        self.call_history.push("pointer_up".to_string());
        self.grabbed = None;
        Ok(())
    }

    async fn current_url(&self) -> TextwrightResult<String> {
        Ok(self.url.clone())
    }

    async fn title(&self) -> TextwrightResult<String> {
        Ok(self.title.clone())
    }

    async fn reload(&mut self) -> TextwrightResult<()> {
        self.call_history.push("reload".to_string());
        if let Some(snapshot) = self.pristine.take() {
            self.elements = snapshot.elements;
            self.url = snapshot.url;
            self.title = snapshot.title;
        }
        self.pointer = None;
        self.grabbed = None;
        Ok(())
    }
}

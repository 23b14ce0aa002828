//! Slider convergence.
//!
//! Dragging a thumb to `(target - min) / (max - min)` of the track width
//! rarely lands exactly on the target: thumbs have width, tracks have
//! padding and values are quantized. After the initial drag the engine
//! nudges the pointer one pixel at a time toward the target and halves the
//! nudge every time the realized value overshoots, until the control
//! reports the exact value.

use crate::backend::{BoundingBox, Point, TargetRef, UiBackend};
use crate::result::{TextwrightError, TextwrightResult};
use crate::selector::SliderKind;
use tracing::{debug, trace};

/// Default cap on correction moves
pub const DEFAULT_MAX_ITERATIONS: usize = 2000;

/// Initial correction step in pixels
const INITIAL_INCREMENT_PX: f64 = 1.0;

/// Convergence limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderOptions {
    /// Maximum number of correction moves before giving up
    pub max_iterations: usize,
}

impl Default for SliderOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A slider located on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderControl {
    /// Accessible name, for error messages
    pub name: String,
    /// Element the pointer drags across
    pub track: TargetRef,
    /// Element reporting value, min and max
    pub readout: TargetRef,
    /// Markup flavour
    pub kind: SliderKind,
}

impl SliderControl {
    /// Locate the readout element for a resolved slider.
    ///
    /// shadcn sliders report their value on a thumb inside the control;
    /// when no thumb is found the control itself is read.
    pub async fn locate<B: UiBackend + ?Sized>(
        backend: &B,
        name: &str,
        track: TargetRef,
        kind: SliderKind,
    ) -> TextwrightResult<Self> {
        let readout = match kind.thumb_css() {
            Some(css) => backend
                .resolve_by_css(css, Some(&track))
                .await?
                .unwrap_or_else(|| track.clone()),
            None => track.clone(),
        };
        Ok(Self {
            name: name.to_string(),
            track,
            readout,
            kind,
        })
    }

    async fn read<B: UiBackend + ?Sized>(&self, backend: &B, attribute: &str) -> TextwrightResult<i64> {
        let raw = backend
            .attribute(&self.readout, attribute)
            .await?
            .ok_or_else(|| TextwrightError::MissingAttribute {
                name: self.name.clone(),
                attribute: attribute.to_string(),
            })?;
        parse_reading(&raw, attribute)
    }

    /// Current value of the control.
    ///
    /// A native range input keeps its `value` attribute at the initial
    /// value while dragged, so its live `value` property is read instead.
    pub async fn value<B: UiBackend + ?Sized>(&self, backend: &B) -> TextwrightResult<i64> {
        match self.kind {
            SliderKind::Native => parse_reading(&backend.value(&self.readout).await?, "value"),
            SliderKind::Shadcn => self.read(backend, self.kind.value_attribute()).await,
        }
    }
}

fn parse_reading(raw: &str, attribute: &str) -> TextwrightResult<i64> {
    raw.trim()
        .parse::<f64>()
        .map(|v| v.round() as i64)
        .map_err(|_| TextwrightError::Coercion {
            value: raw.to_string(),
            expected: format!("a number for {attribute}"),
        })
}

/// Result of a successful convergence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderOutcome {
    /// Realized value, equal to the target
    pub value: i64,
    /// Correction moves after the initial drag
    pub iterations: usize,
    /// Distance between the interpolated and the final pointer position
    pub correction_px: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    const fn sign(self) -> f64 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }
}

/// Drive `control` until it reports `target`.
///
/// Targets outside `[min, max]` are not rejected up front; they fail with
/// [`TextwrightError::SliderDidNotConverge`] once the iteration cap is hit.
/// The pointer is released whether or not convergence succeeds.
pub async fn converge<B: UiBackend + ?Sized>(
    backend: &mut B,
    control: &SliderControl,
    target: i64,
    options: SliderOptions,
) -> TextwrightResult<SliderOutcome> {
    let min = control.read(backend, control.kind.min_attribute()).await?;
    let max = control.read(backend, control.kind.max_attribute()).await?;
    if max <= min {
        return Err(TextwrightError::Coercion {
            value: format!("{min}..{max}"),
            expected: "a slider range with max above min".to_string(),
        });
    }
    let bbox = backend
        .bounding_box(&control.track)
        .await?
        .ok_or_else(|| TextwrightError::MissingAttribute {
            name: control.name.clone(),
            attribute: "bounding box".to_string(),
        })?;

    let current = control.value(backend).await?;
    let y = bbox.y + bbox.height / 2.0;
    let thumb_x = interpolate(&bbox, min, max, current);
    let initial_x = interpolate(&bbox, min, max, target);
    debug!(slider = %control.name, min, max, current, target, "dragging slider");

    backend.pointer_move(Point::new(thumb_x, y)).await?;
    backend.pointer_down().await?;
    let result = correct(backend, control, target, initial_x, y, options).await;
    let released = backend.pointer_up().await;

    let outcome = result?;
    released?;
    Ok(outcome)
}

fn interpolate(bbox: &BoundingBox, min: i64, max: i64, value: i64) -> f64 {
    bbox.x + (value - min) as f64 / (max - min) as f64 * bbox.width
}

async fn correct<B: UiBackend + ?Sized>(
    backend: &mut B,
    control: &SliderControl,
    target: i64,
    initial_x: f64,
    y: f64,
    options: SliderOptions,
) -> TextwrightResult<SliderOutcome> {
    let mut x = initial_x;
    backend.pointer_move(Point::new(x, y)).await?;
    let mut value = control.value(backend).await?;

    let mut direction: Option<Direction> = None;
    let mut increment = INITIAL_INCREMENT_PX;
    let mut iterations = 0;

    while value != target {
        if iterations >= options.max_iterations {
            return Err(TextwrightError::SliderDidNotConverge {
                name: control.name.clone(),
                target,
                last: value,
                iterations,
            });
        }

        let wanted = if value > target {
            Direction::Decrease
        } else {
            Direction::Increase
        };
        if direction.is_some_and(|d| d != wanted) {
            increment /= 2.0;
        }
        direction = Some(wanted);

        x += wanted.sign() * increment;
        backend.pointer_move(Point::new(x, y)).await?;
        value = control.value(backend).await?;
        iterations += 1;
        trace!(x, value, increment, "slider correction");
    }

    Ok(SliderOutcome {
        value,
        iterations,
        correction_px: initial_x - x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockElement};

    async fn native(page: &mut MockBackend, width: f64, max: f64, step: f64, skew: f64) -> SliderControl {
        let track = page.add(
            MockElement::new("input")
                .role("slider")
                .name("Volume")
                .attr("type", "range")
                .bbox(20.0, 100.0, width, 16.0)
                .slider(SliderKind::Native, 0.0, max, step, 0.0)
                .skew(skew),
        );
        SliderControl::locate(page, "Volume", track, SliderKind::Native)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_converges_with_skew() {
        let mut page = MockBackend::new();
        let control = native(&mut page, 200.0, 100.0, 1.0, 7.0).await;
        let outcome = converge(&mut page, &control, 37, SliderOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.value, 37);
        assert!(outcome.iterations > 0);
        assert_eq!(page.value(&control.track).await.unwrap(), "37");
        assert_eq!(page.call_count("pointer_down"), 1);
        assert_eq!(page.call_count("pointer_up"), 1);
    }

    #[tokio::test]
    async fn test_native_ignores_stale_value_attribute() {
        let mut page = MockBackend::new();
        let control = native(&mut page, 200.0, 100.0, 1.0, 0.0).await;
        let outcome = converge(&mut page, &control, 64, SliderOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.value, 64);
        assert_eq!(control.value(&page).await.unwrap(), 64);
        assert_eq!(page.attribute(&control.readout, "value").await.unwrap().as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_converges_on_dense_slider() {
        let mut page = MockBackend::new();
        let control = native(&mut page, 100.0, 1000.0, 1.0, 3.3).await;
        let outcome = converge(&mut page, &control, 777, SliderOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.value, 777);
    }

    #[tokio::test]
    async fn test_exact_interpolation_needs_no_correction() {
        let mut page = MockBackend::new();
        let control = native(&mut page, 100.0, 100.0, 1.0, 0.0).await;
        let outcome = converge(&mut page, &control, 40, SliderOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.correction_px, 0.0);
    }

    #[tokio::test]
    async fn test_out_of_range_target_fails_and_releases() {
        let mut page = MockBackend::new();
        let control = native(&mut page, 100.0, 100.0, 1.0, 0.0).await;
        let err = converge(&mut page, &control, 150, SliderOptions { max_iterations: 50 })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TextwrightError::SliderDidNotConverge {
                target: 150,
                last: 100,
                ..
            }
        ));
        assert!(page.was_called("pointer_up"));
    }

    #[tokio::test]
    async fn test_shadcn_reads_thumb() {
        let mut page = MockBackend::new();
        let root = page.add(
            MockElement::new("span")
                .role("slider")
                .name("Brightness")
                .bbox(0.0, 0.0, 300.0, 10.0)
                .slider(SliderKind::Shadcn, 10.0, 60.0, 5.0, 10.0)
                .skew(-4.0),
        );
        let control = SliderControl::locate(&page, "Brightness", root.clone(), SliderKind::Shadcn)
            .await
            .unwrap();
        assert_ne!(control.readout, root);
        let outcome = converge(&mut page, &control, 45, SliderOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.value, 45);
    }

    #[tokio::test]
    async fn test_missing_attribute() {
        let mut page = MockBackend::new();
        let plain = page.add(MockElement::new("div").bbox(0.0, 0.0, 10.0, 10.0));
        let control = SliderControl::locate(&page, "Plain", plain, SliderKind::Native)
            .await
            .unwrap();
        let err = converge(&mut page, &control, 1, SliderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TextwrightError::MissingAttribute { .. }));
    }
}

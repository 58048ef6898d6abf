//! Pan/zoom state of the diagram viewport.
//!
//! The transform maps world (layout) coordinates to container pixels as
//! `screen = world * zoom + offset`.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::layout::{Bounds, Point};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factor per zoom-in step.
    pub zoom_in_step: f64,
    /// Zoom factor per zoom-out step.
    pub zoom_out_step: f64,
    /// Upper zoom limit when fitting content.
    pub fit_max_zoom: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_in_step: 1.1,
            zoom_out_step: 0.9,
            fit_max_zoom: 2.0,
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> DomainResult<()> {
        let positive = [
            ("viewport.min_zoom", self.min_zoom),
            ("viewport.max_zoom", self.max_zoom),
            ("viewport.zoom_in_step", self.zoom_in_step),
            ("viewport.zoom_out_step", self.zoom_out_step),
            ("viewport.fit_max_zoom", self.fit_max_zoom),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DomainError::dimension(name, value));
            }
        }
        if self.min_zoom > self.max_zoom {
            return Err(DomainError::dimension(
                "viewport.min_zoom (must be <= max_zoom)",
                self.min_zoom,
            ));
        }
        Ok(())
    }

    fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// User-controlled pan and zoom.
    #[default]
    Normal,
    /// Pan and zoom computed to show the full bounds.
    Fitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Transform {
    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.offset_x, p.y * self.zoom + self.offset_y)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.zoom,
            (p.y - self.offset_y) / self.zoom,
        )
    }
}

/// Pixel size of the hosting element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub width: f64,
    pub height: f64,
}

impl Container {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    /// Pointer position minus offset at drag start.
    anchor: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    config: ViewportConfig,
    transform: Transform,
    mode: ViewMode,
    drag: Option<Drag>,
    observed_trigger: u64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            transform: Transform::default(),
            mode: ViewMode::Normal,
            drag: None,
            observed_trigger: 0,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom(&self) -> f64 {
        self.transform.zoom
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Zoom as a whole percentage, for display.
    pub fn zoom_percent(&self) -> i64 {
        (self.transform.zoom * 100.0).round() as i64
    }

    /// Only the primary button starts a pan.
    pub fn pointer_down(&mut self, button: PointerButton, at: Point) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        self.drag = Some(Drag {
            anchor: Point::new(at.x - self.transform.offset_x, at.y - self.transform.offset_y),
        });
        trace!("drag start at ({}, {})", at.x, at.y);
        true
    }

    /// Pan by the pointer delta while a drag is active.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        self.transform.offset_x = at.x - drag.anchor.x;
        self.transform.offset_y = at.y - drag.anchor.y;
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn lost_capture(&mut self) {
        self.drag = None;
    }

    /// Wheel zoom, only with the zoom modifier held. Scrolling down zooms out.
    pub fn wheel(&mut self, delta_y: f64, modifier: bool) -> bool {
        if !modifier {
            return false;
        }
        if delta_y > 0.0 {
            self.zoom_out();
        } else {
            self.zoom_in();
        }
        true
    }

    pub fn zoom_in(&mut self) {
        self.transform.zoom = self.config.clamp(self.transform.zoom * self.config.zoom_in_step);
    }

    pub fn zoom_out(&mut self) {
        self.transform.zoom = self.config.clamp(self.transform.zoom * self.config.zoom_out_step);
    }

    /// Flip between fitted and normal once for each advance of `trigger`.
    /// Bounds changes alone never refit.
    #[instrument(level = "debug", skip(self, bounds, container))]
    pub fn apply_fit_trigger(
        &mut self,
        trigger: u64,
        bounds: &Bounds,
        container: Container,
    ) -> bool {
        if trigger <= self.observed_trigger {
            return false;
        }
        self.observed_trigger = trigger;
        self.toggle_fit(bounds, container);
        true
    }

    pub fn toggle_fit(&mut self, bounds: &Bounds, container: Container) {
        match self.mode {
            ViewMode::Fitted => self.reset(),
            ViewMode::Normal => {
                self.fit(bounds, container);
            }
        }
    }

    /// Scale and translate so `bounds` fills `container` centered. No-op for
    /// degenerate sizes.
    pub fn fit(&mut self, bounds: &Bounds, container: Container) -> bool {
        if !container.is_usable() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            debug!("fit skipped: container or bounds empty");
            return false;
        }
        let zoom = (container.width / bounds.width())
            .min(container.height / bounds.height())
            .min(self.config.fit_max_zoom);
        let center = container.center();
        self.transform = Transform {
            offset_x: center.x - bounds.center_x() * zoom,
            offset_y: center.y - bounds.center_y() * zoom,
            zoom,
        };
        self.mode = ViewMode::Fitted;
        debug!("fit: zoom {:.3}", zoom);
        true
    }

    pub fn reset(&mut self) {
        self.transform = Transform::default();
        self.mode = ViewMode::Normal;
    }

    /// Place `point` at the container center at the current zoom.
    pub fn center_on(&mut self, point: Point, container: Container) {
        let center = container.center();
        self.transform.offset_x = center.x - point.x * self.transform.zoom;
        self.transform.offset_y = center.y - point.y * self.transform.zoom;
    }
}

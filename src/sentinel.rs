/// Visibility sentinel
///
/// The sentinel is a boundary row placed after the last tile. When it is
/// fully scrolled into view the gallery asks for another page. Viewport
/// geometry comes from the host (scroll and resize events), so nothing in
/// here depends on a real window.

use tracing::debug;

/// What the host knows about the scrollable viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub width: f32,
    pub height: f32,
    /// Distance scrolled from the top of the content
    pub offset_y: f32,
}

impl ViewportGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            offset_y: 0.0,
        }
    }

    /// Fraction of `[top, bottom]` inside the viewport, in [0, 1]
    pub fn visible_fraction(&self, top: f32, bottom: f32) -> f32 {
        let span = bottom - top;
        if span <= 0.0 {
            return 0.0;
        }
        let view_top = self.offset_y;
        let view_bottom = self.offset_y + self.height;
        let overlap = bottom.min(view_bottom) - top.max(view_top);
        (overlap / span).clamp(0.0, 1.0)
    }
}

/// Grid geometry used to predict where the boundary row ends up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub tile_size: f32,
    pub spacing: f32,
    pub padding: f32,
    pub max_width: f32,
    pub boundary_height: f32,
}

impl GridLayout {
    /// Tiles per row at the given viewport width (at least one)
    pub fn columns(&self, viewport_width: f32) -> usize {
        let usable = viewport_width.min(self.max_width) - 2.0 * self.padding;
        let fit = ((usable + self.spacing) / (self.tile_size + self.spacing)).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }

    /// Edge length of a square tile once the row is stretched to fill
    pub fn tile_edge(&self, viewport_width: f32) -> f32 {
        let columns = self.columns(viewport_width) as f32;
        let usable = viewport_width.min(self.max_width) - 2.0 * self.padding;
        ((usable - self.spacing * (columns - 1.0)) / columns).max(1.0)
    }

    /// Height of the grid (without the boundary row)
    pub fn grid_height(&self, item_count: usize, viewport_width: f32) -> f32 {
        let rows = item_count.div_ceil(self.columns(viewport_width));
        if rows == 0 {
            return 0.0;
        }
        let rows = rows as f32;
        rows * self.tile_edge(viewport_width) + (rows - 1.0) * self.spacing
    }

    /// Vertical span of the boundary row, from the top of the content
    pub fn boundary_span(&self, item_count: usize, viewport_width: f32) -> (f32, f32) {
        let mut top = self.padding + self.grid_height(item_count, viewport_width);
        if item_count > 0 {
            top += self.spacing;
        }
        (top, top + self.boundary_height)
    }
}

/// Emitted when the boundary becomes visible enough
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelState {
    Idle,
    Observing,
}

#[derive(Debug)]
pub struct Sentinel {
    state: SentinelState,
    threshold: f32,
}

impl Sentinel {
    pub fn new(threshold: f32) -> Self {
        Self {
            state: SentinelState::Idle,
            threshold,
        }
    }

    pub fn state(&self) -> SentinelState {
        self.state
    }

    /// Start observing (boundary mounted)
    pub fn attach(&mut self) {
        self.state = SentinelState::Observing;
    }

    /// Stop observing (component torn down)
    pub fn detach(&mut self) {
        self.state = SentinelState::Idle;
    }

    /// Check the boundary span against the viewport
    pub fn check(&self, viewport: &ViewportGeometry, boundary: (f32, f32)) -> Option<Trigger> {
        if self.state != SentinelState::Observing {
            return None;
        }

        let fraction = viewport.visible_fraction(boundary.0, boundary.1);
        // Float noise at the exact edge must still count as fully visible
        if fraction + f32::EPSILON * 4.0 >= self.threshold {
            debug!(fraction, "sentinel visible");
            Some(Trigger)
        } else {
            None
        }
    }
}

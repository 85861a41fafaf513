//! Pointer-driven segment selection.
//!
//! The controller turns normalized pointer events into selection updates.
//! It never owns the selection itself: callers pass the current index set
//! in and store whatever [`SelectionUpdate`] comes back, keyed by the page
//! that produced it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SelectionConfig;
use crate::geometry::{NormPoint, NormRect};
use crate::segment::TextSegment;

/// Which gesture the pointer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Click toggles the nearest segment
    #[default]
    Single,
    /// Drag a marquee
    Area,
    /// Click two opposite corners
    Points,
}

impl SelectionMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "area" => Some(Self::Area),
            "points" => Some(Self::Points),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Area => "area",
            Self::Points => "points",
        }
    }
}

/// A normalized point on a specific page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub page: u32,
    pub point: NormPoint,
}

/// Active mode plus the transient state only that mode needs
#[derive(Debug, Clone, Copy, PartialEq)]
enum SelectionTool {
    Single,
    Area { drag_start: Option<PagePoint> },
    Points { anchor: Option<PagePoint> },
}

impl From<SelectionMode> for SelectionTool {
    fn from(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Single => Self::Single,
            SelectionMode::Area => Self::Area { drag_start: None },
            SelectionMode::Points => Self::Points { anchor: None },
        }
    }
}

/// Result of a completed gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionUpdate {
    /// Complete new selection for `page`
    pub indices: BTreeSet<usize>,
    pub page: u32,
}

/// Visual feedback for a gesture in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePreview {
    Marquee(NormRect),
    Anchor(NormPoint),
}

/// Index of the segment whose anchor is closest to `point`, if any lies
/// within `radius`.
pub fn nearest_segment(segments: &[TextSegment], point: NormPoint, radius: f32) -> Option<usize> {
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| (index, segment.anchor().distance(point)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Indices of every segment whose bounds overlap `rect`.
pub fn segments_in_rect(segments: &[TextSegment], rect: &NormRect) -> BTreeSet<usize> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.bounds().intersects(rect))
        .map(|(index, _)| index)
        .collect()
}

/// Selection state machine
#[derive(Debug, Clone)]
pub struct SelectionController {
    tool: SelectionTool,
    pick_radius: f32,
    dead_zone: f32,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(SelectionConfig::default())
    }
}

impl SelectionController {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            tool: SelectionTool::Single,
            pick_radius: config.pick_radius,
            dead_zone: config.dead_zone,
        }
    }

    pub const fn mode(&self) -> SelectionMode {
        match self.tool {
            SelectionTool::Single => SelectionMode::Single,
            SelectionTool::Area { .. } => SelectionMode::Area,
            SelectionTool::Points { .. } => SelectionMode::Points,
        }
    }

    /// Switch modes, dropping any gesture in progress.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.tool = mode.into();
    }

    pub fn pointer_down(&mut self, page: u32, point: NormPoint) {
        if let SelectionTool::Area { drag_start } = &mut self.tool {
            *drag_start = Some(PagePoint { page, point });
        }
    }

    /// Complete a gesture step.
    ///
    /// `current` is the selection already held for `page`. Returns `None`
    /// when the step leaves the selection unchanged, including the first
    /// click of a two-point gesture.
    pub fn pointer_up(
        &mut self,
        page: u32,
        point: NormPoint,
        segments: &[TextSegment],
        current: &BTreeSet<usize>,
    ) -> Option<SelectionUpdate> {
        let (radius, dead_zone) = (self.pick_radius, self.dead_zone);
        let indices = match &mut self.tool {
            SelectionTool::Single => toggle_nearest(segments, point, current, radius)?,
            SelectionTool::Area { drag_start } => match drag_start.take() {
                Some(start) if start.page == page && start.point.distance(point) > dead_zone => {
                    let rect = NormRect::from_corners(start.point, point);
                    union(current, segments_in_rect(segments, &rect))
                }
                _ => toggle_nearest(segments, point, current, radius)?,
            },
            SelectionTool::Points { anchor } => match anchor.take() {
                Some(first) if first.page == page => {
                    let rect = NormRect::from_corners(first.point, point);
                    union(current, segments_in_rect(segments, &rect))
                }
                stale => {
                    if let Some(stale) = stale {
                        debug!(
                            "Discarding anchor from page {} on page {}",
                            stale.page, page
                        );
                    }
                    *anchor = Some(PagePoint { page, point });
                    return None;
                }
            },
        };

        if &indices == current {
            return None;
        }
        Some(SelectionUpdate { indices, page })
    }

    /// Drop transient gesture state that belongs to another page.
    pub fn page_changed(&mut self, page: u32) {
        match &mut self.tool {
            SelectionTool::Single => {}
            SelectionTool::Area { drag_start: slot } | SelectionTool::Points { anchor: slot } => {
                if slot.is_some_and(|p| p.page != page) {
                    *slot = None;
                }
            }
        }
    }

    /// Feedback for the gesture in progress on `page`; `hover` is the
    /// current pointer position, if known.
    pub fn preview(&self, page: u32, hover: Option<NormPoint>) -> Option<GesturePreview> {
        match self.tool {
            SelectionTool::Single => None,
            SelectionTool::Area { drag_start } => {
                let start = drag_start.filter(|p| p.page == page)?;
                Some(GesturePreview::Marquee(NormRect::from_corners(
                    start.point,
                    hover.unwrap_or(start.point),
                )))
            }
            SelectionTool::Points { anchor } => anchor
                .filter(|p| p.page == page)
                .map(|p| GesturePreview::Anchor(p.point)),
        }
    }
}

fn toggle_nearest(
    segments: &[TextSegment],
    point: NormPoint,
    current: &BTreeSet<usize>,
    radius: f32,
) -> Option<BTreeSet<usize>> {
    let index = nearest_segment(segments, point, radius)?;
    let mut indices = current.clone();
    if !indices.remove(&index) {
        indices.insert(index);
    }
    Some(indices)
}

fn union(current: &BTreeSet<usize>, hits: BTreeSet<usize>) -> BTreeSet<usize> {
    let mut indices = current.clone();
    indices.extend(hits);
    indices
}

/// Selected segment indices, bound to the page they were picked on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    page: Option<u32>,
    indices: BTreeSet<usize>,
}

impl Selection {
    pub const fn page(&self) -> Option<u32> {
        self.page
    }

    pub const fn indices(&self) -> &BTreeSet<usize> {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Make `page` the active page; switching pages clears the selection.
    pub fn activate_page(&mut self, page: u32) {
        if self.page != Some(page) {
            self.indices.clear();
            self.page = Some(page);
        }
    }

    pub fn apply(&mut self, update: SelectionUpdate) {
        self.page = Some(update.page);
        self.indices = update.indices;
    }

    /// Indices held for `page`; empty for any other page.
    pub fn indices_for(&self, page: u32) -> BTreeSet<usize> {
        if self.page == Some(page) {
            self.indices.clone()
        } else {
            BTreeSet::new()
        }
    }

    pub fn toggle(&mut self, page: u32, index: usize) {
        self.activate_page(page);
        if !self.indices.remove(&index) {
            self.indices.insert(index);
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(x: f32, y: f32, w: f32, h: f32) -> TextSegment {
        TextSegment::new("t", x, y, w, h, 12.0, 612.0, 792.0)
    }

    fn page_segments() -> Vec<TextSegment> {
        vec![seg(0.2, 0.3, 0.1, 0.05), seg(0.6, 0.7, 0.2, 0.04)]
    }

    fn p(x: f32, y: f32) -> NormPoint {
        NormPoint::new(x, y)
    }

    #[test]
    fn test_single_toggle_is_idempotent() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        let empty = BTreeSet::new();

        let first = ctl.pointer_up(1, p(0.25, 0.275), &segments, &empty).unwrap();
        assert_eq!(first.indices, BTreeSet::from([0]));

        let second = ctl
            .pointer_up(1, p(0.25, 0.275), &segments, &first.indices)
            .unwrap();
        assert!(second.indices.is_empty());
    }

    #[test]
    fn test_single_outside_radius_is_noop() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        assert!(ctl.pointer_up(1, p(0.95, 0.05), &segments, &BTreeSet::new()).is_none());
    }

    #[test]
    fn test_nearest_prefers_closest_anchor() {
        let segments = vec![seg(0.1, 0.1, 0.02, 0.02), seg(0.12, 0.1, 0.02, 0.02)];
        assert_eq!(nearest_segment(&segments, p(0.13, 0.09), 0.05), Some(1));
        assert_eq!(nearest_segment(&segments, p(0.9, 0.9), 0.05), None);
    }

    #[test]
    fn test_aabb_inclusion_and_exclusion() {
        let segments = vec![seg(0.2, 0.3, 0.1, 0.05)];
        let hit = NormRect::from_corners(p(0.15, 0.2), p(0.35, 0.3));
        let miss = NormRect::from_corners(p(0.5, 0.5), p(0.6, 0.6));
        assert_eq!(segments_in_rect(&segments, &hit), BTreeSet::from([0]));
        assert!(segments_in_rect(&segments, &miss).is_empty());
    }

    #[test]
    fn test_area_drag_unions() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Area);

        ctl.pointer_down(2, p(0.5, 0.6));
        let update = ctl
            .pointer_up(2, p(0.9, 0.8), &segments, &BTreeSet::from([0]))
            .unwrap();
        assert_eq!(update.indices, BTreeSet::from([0, 1]));
        assert_eq!(update.page, 2);
    }

    #[test]
    fn test_area_small_drag_falls_back_to_pick() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Area);

        ctl.pointer_down(1, p(0.25, 0.275));
        let update = ctl
            .pointer_up(1, p(0.252, 0.276), &segments, &BTreeSet::new())
            .unwrap();
        assert_eq!(update.indices, BTreeSet::from([0]));
    }

    #[test]
    fn test_area_drag_started_on_other_page_is_a_pick() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Area);

        ctl.pointer_down(1, p(0.0, 0.0));
        // Released far from every anchor on page 2: nothing to pick.
        assert!(ctl.pointer_up(2, p(1.0, 1.0), &segments, &BTreeSet::new()).is_none());
    }

    #[test]
    fn test_points_two_clicks() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Points);

        assert!(ctl.pointer_up(1, p(0.15, 0.2), &segments, &BTreeSet::new()).is_none());
        assert_eq!(
            ctl.preview(1, None),
            Some(GesturePreview::Anchor(p(0.15, 0.2)))
        );

        let update = ctl
            .pointer_up(1, p(0.35, 0.3), &segments, &BTreeSet::new())
            .unwrap();
        assert_eq!(update.indices, BTreeSet::from([0]));
        assert_eq!(ctl.preview(1, None), None);
    }

    #[test]
    fn test_points_anchor_does_not_cross_pages() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Points);

        assert!(ctl.pointer_up(3, p(0.0, 0.0), &segments, &BTreeSet::new()).is_none());
        ctl.page_changed(4);
        assert_eq!(ctl.preview(4, None), None);

        // Would enclose both segments if the page-3 anchor were used.
        assert!(ctl.pointer_up(4, p(1.0, 1.0), &segments, &BTreeSet::new()).is_none());
        assert_eq!(ctl.preview(4, None), Some(GesturePreview::Anchor(p(1.0, 1.0))));
    }

    #[test]
    fn test_points_anchor_does_not_cross_pages_without_notification() {
        let segments = page_segments();
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Points);

        ctl.pointer_up(3, p(0.0, 0.0), &segments, &BTreeSet::new());
        assert!(ctl.pointer_up(4, p(1.0, 1.0), &segments, &BTreeSet::new()).is_none());
    }

    #[test]
    fn test_marquee_preview_follows_hover() {
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Area);
        ctl.pointer_down(1, p(0.4, 0.4));

        assert_eq!(
            ctl.preview(1, Some(p(0.1, 0.2))),
            Some(GesturePreview::Marquee(NormRect::new(0.1, 0.2, 0.4, 0.4)))
        );
        assert_eq!(ctl.preview(2, Some(p(0.1, 0.2))), None);
    }

    #[test]
    fn test_set_mode_drops_gesture() {
        let mut ctl = SelectionController::default();
        ctl.set_mode(SelectionMode::Points);
        ctl.pointer_up(1, p(0.1, 0.1), &[], &BTreeSet::new());
        ctl.set_mode(SelectionMode::Points);
        assert_eq!(ctl.preview(1, None), None);
        assert_eq!(ctl.mode(), SelectionMode::Points);
    }

    #[test]
    fn test_selection_is_bound_to_page() {
        let mut selection = Selection::default();
        selection.apply(SelectionUpdate {
            indices: BTreeSet::from([1, 2]),
            page: 3,
        });
        assert_eq!(selection.indices_for(3), BTreeSet::from([1, 2]));
        assert!(selection.indices_for(4).is_empty());

        selection.activate_page(4);
        assert!(selection.is_empty());
        assert_eq!(selection.page(), Some(4));

        selection.toggle(4, 0);
        selection.toggle(4, 0);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_degenerate_segments_never_panic() {
        let segments = vec![seg(f32::NAN, 0.0, 0.0, 0.0), seg(0.0, 0.0, 0.0, 0.0)];
        let mut ctl = SelectionController::default();
        let update = ctl.pointer_up(1, p(0.0, 0.0), &segments, &BTreeSet::new());
        assert_eq!(update.unwrap().indices, BTreeSet::from([1]));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(SelectionMode::from_name("AREA"), Some(SelectionMode::Area));
        assert_eq!(SelectionMode::Points.as_str(), "points");
        assert_eq!(SelectionMode::from_name("lasso"), None);
    }
}

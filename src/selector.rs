//! Interactive region selection: the press → drag → release state machine.
//!
//! The state machine is a plain value ([`RegionSelection`]) fed with pointer
//! events, so any front-end can drive it: the full-screen overlay in
//! [`crate::overlay`], or a scripted sequence of events in tests.
//!
//! ```text
//! Idle ──press──▶ Dragging ──move*──▶ Dragging ──release──▶ Closed
//!   │                                                      ▲
//!   └──────────────────────cancel / close──────────────────┘
//! ```
//!
//! A selection that reaches `Closed` without a drag, or whose release point
//! equals its press point, yields an empty rectangle; [`RegionSelection::finish`]
//! turns that into [`ReportError::SelectionCancelled`].

use crate::error::ReportError;
use crate::geometry::CaptureRect;
use image::RgbaImage;
use tracing::debug;

/// Where the selection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// Overlay open, nothing pressed yet.
    Idle,
    /// Pointer held down; the rectangle follows the pointer.
    Dragging { anchor: (i32, i32), current: (i32, i32) },
    /// Overlay dismissed; `rect` is frozen (empty when nothing was selected).
    Closed { rect: CaptureRect },
}

/// A single pointer event, in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(i32, i32),
    Move(i32, i32),
    Release(i32, i32),
    /// Escape key or window close.
    Cancel,
}

/// State of one rectangle selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSelection {
    state: SelectorState,
}

impl Default for RegionSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionSelection {
    pub fn new() -> Self {
        Self {
            state: SelectorState::Idle,
        }
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SelectorState::Closed { .. })
    }

    /// The rectangle to outline right now, if a drag is in progress.
    pub fn current_rect(&self) -> Option<CaptureRect> {
        match self.state {
            SelectorState::Dragging { anchor, current } => {
                Some(CaptureRect::from_corners(anchor, current))
            }
            _ => None,
        }
    }

    pub fn press(&mut self, x: i32, y: i32) {
        if let SelectorState::Idle = self.state {
            self.state = SelectorState::Dragging {
                anchor: (x, y),
                current: (x, y),
            };
        }
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        if let SelectorState::Dragging { anchor, .. } = self.state {
            self.state = SelectorState::Dragging {
                anchor,
                current: (x, y),
            };
        }
    }

    pub fn release(&mut self, x: i32, y: i32) {
        let rect = match self.state {
            SelectorState::Dragging { anchor, .. } => CaptureRect::from_corners(anchor, (x, y)),
            SelectorState::Idle => CaptureRect::default(),
            SelectorState::Closed { .. } => return,
        };
        debug!("Selection closed at {}", rect);
        self.state = SelectorState::Closed { rect };
    }

    /// Close without a selection. A no-op once closed.
    pub fn cancel(&mut self) {
        if !self.is_closed() {
            self.state = SelectorState::Closed {
                rect: CaptureRect::default(),
            };
        }
    }

    pub fn apply(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press(x, y) => self.press(x, y),
            PointerEvent::Move(x, y) => self.move_to(x, y),
            PointerEvent::Release(x, y) => self.release(x, y),
            PointerEvent::Cancel => self.cancel(),
        }
    }

    /// Freeze the selection and return the rectangle.
    ///
    /// A selection that never closed is treated as cancelled, as is any
    /// zero-area rectangle.
    pub fn finish(mut self) -> Result<CaptureRect, ReportError> {
        self.cancel();
        match self.state {
            SelectorState::Closed { rect } if !rect.is_empty() => Ok(rect),
            _ => Err(ReportError::SelectionCancelled),
        }
    }
}

/// Something that lets a user carve one rectangle out of a full-screen image.
pub trait RegionSelector {
    fn select(&self, screenshot: &RgbaImage) -> Result<CaptureRect, ReportError>;
}

/// Replays a fixed sequence of pointer events.
///
/// Useful for headless runs and tests; the screenshot is only used to
/// reject rectangles that fall outside it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    events: Vec<PointerEvent>,
}

impl ScriptedSelector {
    pub fn new(events: Vec<PointerEvent>) -> Self {
        Self { events }
    }

    /// A single straight drag from `from` to `to`.
    pub fn drag(from: (i32, i32), to: (i32, i32)) -> Self {
        Self::new(vec![
            PointerEvent::Press(from.0, from.1),
            PointerEvent::Move(to.0, to.1),
            PointerEvent::Release(to.0, to.1),
        ])
    }
}

impl RegionSelector for ScriptedSelector {
    fn select(&self, screenshot: &RgbaImage) -> Result<CaptureRect, ReportError> {
        let mut selection = RegionSelection::new();
        for event in &self.events {
            selection.apply(*event);
        }
        let rect = selection.finish()?;
        if !rect.fits_within(screenshot.width(), screenshot.height()) {
            return Err(ReportError::RegionOutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                image_width: screenshot.width(),
                image_height: screenshot.height(),
            });
        }
        Ok(rect)
    }
}

/// Open the full-screen selection overlay and block until the user releases
/// the pointer (or cancels).
#[cfg(feature = "overlay")]
pub fn open_selector(screenshot: &RgbaImage) -> Result<CaptureRect, ReportError> {
    crate::overlay::run_overlay(screenshot)
}

/// Open the full-screen selection overlay and block until the user releases
/// the pointer (or cancels).
#[cfg(not(feature = "overlay"))]
pub fn open_selector(_screenshot: &RgbaImage) -> Result<CaptureRect, ReportError> {
    Err(ReportError::OverlayUnavailable)
}

/// The interactive selector backed by [`open_selector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlaySelector;

impl RegionSelector for OverlaySelector {
    fn select(&self, screenshot: &RgbaImage) -> Result<CaptureRect, ReportError> {
        open_selector(screenshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[PointerEvent]) -> Result<CaptureRect, ReportError> {
        let mut s = RegionSelection::new();
        for e in events {
            s.apply(*e);
        }
        s.finish()
    }

    #[test]
    fn starts_idle() {
        let s = RegionSelection::new();
        assert_eq!(s.state(), SelectorState::Idle);
        assert_eq!(s.current_rect(), None);
    }

    #[test]
    fn drag_tracks_pointer() {
        let mut s = RegionSelection::new();
        s.press(100, 100);
        s.move_to(150, 120);
        assert_eq!(s.current_rect(), Some(CaptureRect::new(100, 100, 50, 20)));
        s.move_to(80, 60);
        assert_eq!(s.current_rect(), Some(CaptureRect::new(80, 60, 20, 40)));
    }

    #[test]
    fn release_freezes_rect_for_all_directions() {
        for (p, q) in [
            ((10, 10), (60, 40)),
            ((60, 40), (10, 10)),
            ((60, 10), (10, 40)),
            ((10, 40), (60, 10)),
        ] {
            let rect = run(&[
                PointerEvent::Press(p.0, p.1),
                PointerEvent::Move(q.0, q.1),
                PointerEvent::Release(q.0, q.1),
            ])
            .expect("non-empty drag");
            assert_eq!(rect, CaptureRect::new(10, 10, 50, 30), "drag {p:?} → {q:?}");
        }
    }

    #[test]
    fn release_point_wins_over_last_move() {
        let rect = run(&[
            PointerEvent::Press(0, 0),
            PointerEvent::Move(10, 10),
            PointerEvent::Release(20, 30),
        ])
        .unwrap();
        assert_eq!(rect, CaptureRect::new(0, 0, 20, 30));
    }

    #[test]
    fn click_without_drag_is_cancelled() {
        let err = run(&[PointerEvent::Press(5, 5), PointerEvent::Release(5, 5)]).unwrap_err();
        assert!(matches!(err, ReportError::SelectionCancelled));
    }

    #[test]
    fn closing_without_press_is_cancelled() {
        assert!(matches!(
            run(&[PointerEvent::Cancel]).unwrap_err(),
            ReportError::SelectionCancelled
        ));
        assert!(matches!(
            RegionSelection::new().finish().unwrap_err(),
            ReportError::SelectionCancelled
        ));
    }

    #[test]
    fn events_after_close_are_ignored() {
        let mut s = RegionSelection::new();
        s.press(0, 0);
        s.release(10, 10);
        s.press(50, 50);
        s.move_to(90, 90);
        s.release(90, 90);
        s.cancel();
        assert_eq!(s.finish().unwrap(), CaptureRect::new(0, 0, 10, 10));
    }

    #[test]
    fn moves_before_press_do_nothing() {
        let mut s = RegionSelection::new();
        s.move_to(40, 40);
        assert_eq!(s.state(), SelectorState::Idle);
    }

    #[test]
    fn scripted_selector_checks_bounds() {
        let shot = RgbaImage::new(100, 100);
        let ok = ScriptedSelector::drag((10, 10), (50, 50)).select(&shot).unwrap();
        assert_eq!(ok, CaptureRect::new(10, 10, 40, 40));

        let err = ScriptedSelector::drag((10, 10), (150, 50))
            .select(&shot)
            .unwrap_err();
        assert!(matches!(err, ReportError::RegionOutOfBounds { .. }));
    }
}

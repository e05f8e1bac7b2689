//! Toolbar popover coordination.
//!
//! At most one overlay (color picker, alignment menu, style menu) is open
//! at a time; opening another closes the current one. Placement is anchored
//! below the control that opened it, with a centered fallback when the
//! anchor cannot be located. The dismissal listeners (outside click,
//! Escape) are owned by the open overlay and released when it closes, so
//! repeated open/close cycles cannot accumulate listeners.

use crate::events::{EventKind, ListenerGuard, ListenerRegistry};
use crate::format::{DecorationKind, HexColor};
use crate::model::{Alignment, TextStyle};

/// Vertical gap between an anchor control and its overlay.
const ANCHOR_GAP: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayKind {
    /// Picker for a text-color or background tool, seeded with the tool's
    /// current color so reopening shows the last pick.
    ColorPicker {
        target: DecorationKind,
        initial: HexColor,
    },
    AlignmentMenu,
    StyleMenu,
}

/// On-screen bounds of an anchor control, as reported by the host layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Below the anchor, left-aligned with it.
    Anchored { x: f64, y: f64 },
    /// Anchor could not be located; the host centers the overlay.
    Centered,
}

/// An option picked inside an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayChoice {
    Color(HexColor),
    Alignment(Alignment),
    Style(TextStyle),
}

#[derive(Debug)]
struct OpenOverlay {
    kind: OverlayKind,
    placement: Placement,
    _outside_click: ListenerGuard,
    _escape: ListenerGuard,
}

#[derive(Debug)]
pub struct PopoverCoordinator {
    open: Option<OpenOverlay>,
    listeners: ListenerRegistry,
}

impl PopoverCoordinator {
    pub fn new(listeners: ListenerRegistry) -> Self {
        Self {
            open: None,
            listeners,
        }
    }

    /// Open an overlay, closing any other first.
    pub fn open(&mut self, kind: OverlayKind, anchor: Option<AnchorRect>) -> Placement {
        self.close();
        let placement = match anchor {
            Some(rect) => Placement::Anchored {
                x: rect.x,
                y: rect.y + rect.height + ANCHOR_GAP,
            },
            None => Placement::Centered,
        };
        self.open = Some(OpenOverlay {
            kind,
            placement,
            _outside_click: self.listeners.register(EventKind::Click),
            _escape: self.listeners.register(EventKind::KeyDown),
        });
        placement
    }

    pub fn current(&self) -> Option<OverlayKind> {
        self.open.as_ref().map(|o| o.kind)
    }

    pub fn placement(&self) -> Option<Placement> {
        self.open.as_ref().map(|o| o.placement)
    }

    /// Host-delivered click outside the overlay: dismiss.
    pub fn handle_outside_click(&mut self) {
        self.close();
    }

    /// Host-delivered Escape: dismiss.
    pub fn handle_escape(&mut self) {
        self.close();
    }

    /// An option was picked inside the overlay. Closes it and returns the
    /// choice when it matches the open overlay's kind; a stray choice for
    /// an overlay that is not open is ignored.
    pub fn choose(&mut self, choice: OverlayChoice) -> Option<OverlayChoice> {
        let accepted = matches!(
            (self.open.as_ref()?.kind, choice),
            (OverlayKind::ColorPicker { .. }, OverlayChoice::Color(_))
                | (OverlayKind::AlignmentMenu, OverlayChoice::Alignment(_))
                | (OverlayKind::StyleMenu, OverlayChoice::Style(_))
        );
        if !accepted {
            return None;
        }
        self.close();
        Some(choice)
    }

    /// Close the open overlay, releasing its dismissal listeners.
    pub fn close(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> (PopoverCoordinator, ListenerRegistry) {
        let registry = ListenerRegistry::new();
        (PopoverCoordinator::new(registry.clone()), registry)
    }

    fn picker() -> OverlayKind {
        OverlayKind::ColorPicker {
            target: DecorationKind::Background,
            initial: HexColor::new(0xff, 0xff, 0x00),
        }
    }

    #[test]
    fn test_anchored_placement_sits_below_anchor() {
        let (mut popover, _registry) = coordinator();
        let anchor = AnchorRect {
            x: 120.0,
            y: 40.0,
            width: 32.0,
            height: 24.0,
        };

        let placement = popover.open(picker(), Some(anchor));
        assert_eq!(placement, Placement::Anchored { x: 120.0, y: 72.0 });
    }

    #[test]
    fn test_missing_anchor_falls_back_to_centered() {
        let (mut popover, _registry) = coordinator();
        assert_eq!(popover.open(picker(), None), Placement::Centered);
    }

    #[test]
    fn test_opening_second_overlay_closes_first() {
        let (mut popover, registry) = coordinator();
        popover.open(picker(), None);
        popover.open(OverlayKind::AlignmentMenu, None);

        assert_eq!(popover.current(), Some(OverlayKind::AlignmentMenu));
        // Only the open overlay's two dismissal listeners exist
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_dismissal_triggers_close_and_release() {
        let (mut popover, registry) = coordinator();

        popover.open(picker(), None);
        popover.handle_outside_click();
        assert_eq!(popover.current(), None);
        assert_eq!(registry.active_count(), 0);

        popover.open(picker(), None);
        popover.handle_escape();
        assert_eq!(popover.current(), None);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_choice_closes_and_returns_value() {
        let (mut popover, registry) = coordinator();
        popover.open(OverlayKind::AlignmentMenu, None);

        let choice = popover.choose(OverlayChoice::Alignment(Alignment::Right));
        assert_eq!(choice, Some(OverlayChoice::Alignment(Alignment::Right)));
        assert_eq!(popover.current(), None);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_mismatched_choice_is_ignored() {
        let (mut popover, _registry) = coordinator();
        popover.open(OverlayKind::AlignmentMenu, None);

        let choice = popover.choose(OverlayChoice::Style(TextStyle::H1));
        assert_eq!(choice, None);
        // Overlay stays open
        assert_eq!(popover.current(), Some(OverlayKind::AlignmentMenu));
    }

    #[test]
    fn test_repeated_cycles_do_not_accumulate_listeners() {
        let (mut popover, registry) = coordinator();
        for _ in 0..50 {
            popover.open(picker(), None);
            popover.handle_escape();
        }
        assert_eq!(registry.active_count(), 0);
    }
}

//! Drawing-board block behavior.
//!
//! The canvas surface itself belongs to the host; this side owns the
//! payload defaults and the host resources a mounted board holds. A board
//! registers for pointer input when mounted and must release it when the
//! block is destroyed — an unmounted board holding listeners is exactly the
//! leak the teardown contract exists to prevent.

use serde_json::{Map, Value, json};

use crate::events::{EventKind, ListenerGuard, ListenerRegistry};
use crate::model::{AppState, DrawingData, ExtTable};

pub const DEFAULT_HEIGHT: f64 = 500.0;

/// Host-side resources of a mounted drawing canvas.
#[derive(Debug)]
pub struct DrawingBoard {
    _pointer_input: ListenerGuard,
}

impl DrawingBoard {
    pub fn mount(listeners: &ListenerRegistry) -> Self {
        Self {
            _pointer_input: listeners.register(EventKind::PointerDown),
        }
    }
}

/// Canvas app-state defaults, merged *under* whatever a snapshot carries.
pub fn default_app_state() -> Map<String, Value> {
    let defaults = json!({
        "currentItemStrokeColor": "#000000",
        "currentItemBackgroundColor": "transparent",
        "currentItemFillStyle": "hachure",
        "currentItemStrokeWidth": 1,
        "currentItemStrokeStyle": "solid",
        "currentItemRoughness": 1,
        "currentItemOpacity": 100,
        "currentItemFontFamily": 1,
        "currentItemFontSize": 20,
        "currentItemTextAlign": "left",
        "currentItemStartArrowhead": null,
        "currentItemEndArrowhead": "arrow",
        "currentItemRoundness": "round",
        "scrollX": 0,
        "scrollY": 0,
        "zoom": {"value": 1},
        "gridSize": null,
        "colorPalette": {},
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Fresh payload for a newly inserted drawing block.
pub fn new_drawing() -> DrawingData {
    DrawingData {
        elements: Vec::new(),
        app_state: AppState {
            collaborators: ExtTable::new(),
            extra: default_app_state(),
        },
        files: Map::new(),
        height: DEFAULT_HEIGHT,
    }
}

/// Fill in anything a decoded payload is missing: defaults sit under saved
/// state, saved keys win.
pub fn hydrate(mut data: DrawingData) -> DrawingData {
    let mut merged = default_app_state();
    merged.append(&mut data.app_state.extra);
    data.app_state.extra = merged;
    if !(data.height.is_finite() && data.height > 0.0) {
        data.height = DEFAULT_HEIGHT;
    }
    data
}

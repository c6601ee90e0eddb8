use foundation::handles::Handle;
use foundation::math::Vec2;

/// Input the view reacts to.
///
/// Control values arrive as raw strings exactly as the widgets report them;
/// validation happens in the view so a bad value is logged and ignored rather
/// than trusted.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Year slider moved; raw slider value.
    YearChanged(String),
    /// Category radio checked; raw option value.
    CategoryChanged(String),
    PointerEnter { marker: Handle },
    PointerLeave { marker: Handle },
    /// Pointer position in page coordinates.
    PointerMove { position: Vec2 },
    /// Map container resized to the given size; `window_width` feeds the
    /// responsive breakpoint.
    Resize {
        width: f64,
        height: f64,
        window_width: f64,
    },
}

impl UiEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            UiEvent::YearChanged(_) => "year",
            UiEvent::CategoryChanged(_) => "category",
            UiEvent::PointerEnter { .. } => "pointer-enter",
            UiEvent::PointerLeave { .. } => "pointer-leave",
            UiEvent::PointerMove { .. } => "pointer-move",
            UiEvent::Resize { .. } => "resize",
        }
    }
}

/// FIFO of pending UI events.
///
/// Callbacks push while the view is borrowed elsewhere; the owner drains and
/// dispatches in arrival order.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<UiEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: UiEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[UiEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }
}

//! Size state of a control: explicit dimensions, auto grow, maximize and
//! manual resize.
//!
//! The controller only tracks state and computes target sizes. Applying them
//! to the DOM and the editor is the control's job, because it needs the
//! lifecycle and focus state to do so.

use tracing::trace;

use crate::platform::ObserverId;
use crate::scheduler::TimerId;
use crate::types::{Resizing, Size, SizeUnit};

/// Interval of the poll that tracks percentage heights.
pub const HEIGHT_MONITOR_INTERVAL_MS: u32 = 250;

/// Retry interval for size updates requested before the editor is ready, and
/// for the visibility poll on platforms without mutation observers.
pub const SIZE_RETRY_INTERVAL_MS: u32 = 100;

/// Maximized height used when neither a maximum nor a minimum height is
/// known.
pub const DEFAULT_MAXIMIZED_HEIGHT: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaximizeState {
    /// Height restored when leaving the maximized state.
    pub minimize_height: Size,
    pub maximize_height: Size,
    /// Explicitly configured maximized height, if any.
    pub configured: Option<f64>,
    pub maximized: bool,
}

impl MaximizeState {
    fn new(current: Size, configured: Option<f64>) -> Self {
        let mut state = MaximizeState {
            minimize_height: current,
            maximize_height: current,
            configured,
            maximized: false,
        };
        state.recalculate(current);
        state
    }

    /// Derive both heights from the current one.
    pub fn recalculate(&mut self, current: Size) {
        let value = match self.configured {
            Some(configured) => configured,
            None if !current.is_unset() => current.value * 2.0,
            None => DEFAULT_MAXIMIZED_HEIGHT,
        };
        self.minimize_height = current;
        self.maximize_height = Size::new(value, current.unit);
    }
}

/// Last observed state of the percentage height poll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightMonitor {
    pub generation: u64,
    pub timer: Option<TimerId>,
    pub previous_height: f64,
    pub previous_toolbar_visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SizingController {
    pub width: Size,
    pub height: Size,
    pub resizing: Resizing,
    /// The user resized the editor manually since the last explicit size.
    pub resized: bool,
    pub auto_grow: bool,
    pub maximize: Option<MaximizeState>,
    /// Pending retry of a size update.
    pub update_timer: Option<TimerId>,
    /// Observer waiting for the control to become visible.
    pub visibility_observer: Option<ObserverId>,
    pub monitor: Option<HeightMonitor>,
    monitor_generation: u64,
}

impl Default for SizingController {
    fn default() -> Self {
        Self {
            width: Size::UNSET,
            height: Size::UNSET,
            resizing: Resizing::Disabled,
            resized: false,
            auto_grow: false,
            maximize: None,
            update_timer: None,
            visibility_observer: None,
            monitor: None,
            monitor_generation: 0,
        }
    }
}

impl SizingController {
    pub fn is_maximizable(&self) -> bool {
        self.maximize.is_some()
    }

    pub fn is_maximized(&self) -> bool {
        self.maximize.is_some_and(|m| m.maximized)
    }

    pub fn set_width(&mut self, width: Size) {
        self.width = width;
        self.resized = false;
    }

    /// Enter the maximizable state. Returns false if already maximizable.
    pub fn enable_maximize(&mut self, configured: Option<f64>) -> bool {
        if self.maximize.is_some() {
            return false;
        }
        self.maximize = Some(MaximizeState::new(self.height, configured));
        true
    }

    /// Replace the configured maximized height.
    pub fn update_maximize_height(&mut self, configured: f64) {
        if let Some(state) = &mut self.maximize {
            state.configured = Some(configured);
            state.maximize_height = Size::new(configured, state.maximize_height.unit);
        }
    }

    /// Leave the maximizable state, returning the height to restore.
    pub fn disable_maximize(&mut self) -> Option<Size> {
        self.maximize.take().map(|m| m.minimize_height)
    }

    /// The height was set explicitly while maximizable.
    pub fn height_changed_while_maximizable(&mut self) {
        let height = self.height;
        if let Some(state) = &mut self.maximize {
            state.recalculate(height);
        }
    }

    /// Target height for a maximize toggle, or `None` if nothing changes.
    pub fn maximize_target(&self, maximized: bool) -> Option<Size> {
        let state = self.maximize?;
        if state.maximized == maximized {
            return None;
        }
        Some(if maximized {
            state.maximize_height
        } else {
            state.minimize_height
        })
    }

    pub fn set_maximized_flag(&mut self, maximized: bool) {
        if let Some(state) = &mut self.maximize {
            state.maximized = maximized;
        }
    }

    /// Whether the height should be tracked by polling: percentage heights
    /// depend on the parent, which the editor cannot follow by itself.
    pub fn needs_monitor(&self) -> bool {
        !self.height.is_unset() && self.height.unit == SizeUnit::Percent
    }

    /// Start a new monitor run. Returns its generation; ticks carrying an
    /// older generation are ignored.
    pub fn start_monitor(&mut self) -> u64 {
        self.monitor_generation += 1;
        self.monitor = Some(HeightMonitor {
            generation: self.monitor_generation,
            timer: None,
            previous_height: -1.0,
            previous_toolbar_visible: true,
        });
        trace!(generation = self.monitor_generation, "height monitor started");
        self.monitor_generation
    }

    pub fn stop_monitor(&mut self) -> Option<TimerId> {
        self.monitor.take().and_then(|m| m.timer)
    }

    /// Record a tick of monitor `generation`. Returns the pixel height to
    /// apply when it changed, or the toolbar appeared or disappeared.
    pub fn monitor_tick(
        &mut self,
        generation: u64,
        height: f64,
        toolbar_visible: bool,
    ) -> Option<f64> {
        let monitor = self.monitor.as_mut().filter(|m| m.generation == generation)?;
        if height <= 0.0
            || (height == monitor.previous_height
                && toolbar_visible == monitor.previous_toolbar_visible)
        {
            return None;
        }
        monitor.previous_height = height;
        monitor.previous_toolbar_visible = toolbar_visible;
        Some(height)
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_some()
    }
}

use tracing::debug;

/// Receives the "handle in reach" flag once per tick.
pub trait CrosshairFeedback {
    fn set_interactable(&mut self, visible: bool);
}

/// Crosshair sink for headless runs: logs only when the flag flips.
#[derive(Debug, Default)]
pub struct LoggedCrosshair {
    visible: Option<bool>,
}

impl LoggedCrosshair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(false)
    }
}

impl CrosshairFeedback for LoggedCrosshair {
    fn set_interactable(&mut self, visible: bool) {
        if self.visible != Some(visible) {
            debug!(visible, "Crosshair interactable");
            self.visible = Some(visible);
        }
    }
}

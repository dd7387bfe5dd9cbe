use crate::controller::QueryController;
use crate::slot::Ticket;
use kgview_core::config::SurfaceConfig;
use storage::{GraphStore, StoreError};
use tracing::debug;

/// How much the display surface can show at once. Constrained surfaces grow
/// the graph around tapped nodes instead of showing everything up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePolicy {
    Full,
    Constrained,
}

impl SurfacePolicy {
    pub fn for_viewport(width_px: u32, breakpoint_px: u32) -> Self {
        if width_px <= breakpoint_px {
            SurfacePolicy::Constrained
        } else {
            SurfacePolicy::Full
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Selected,
    /// Selected, and a neighbourhood expansion was issued.
    Expanding(Ticket),
}

#[derive(Debug, Clone)]
pub struct SelectionHandler {
    config: SurfaceConfig,
    viewport_width: Option<u32>,
}

impl SelectionHandler {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            viewport_width: None,
        }
    }

    /// An explicit override wins; otherwise the last reported viewport width
    /// decides, and an unknown width means `Full`.
    pub fn policy(&self) -> SurfacePolicy {
        match (self.config.constrained, self.viewport_width) {
            (Some(true), _) => SurfacePolicy::Constrained,
            (Some(false), _) | (None, None) => SurfacePolicy::Full,
            (None, Some(width)) => {
                SurfacePolicy::for_viewport(width, self.config.constrained_breakpoint_px)
            }
        }
    }

    pub fn set_viewport_width(&mut self, width_px: u32) -> SurfacePolicy {
        self.viewport_width = Some(width_px);
        let policy = self.policy();
        debug!(width_px, ?policy, "viewport resized");
        policy
    }

    pub fn set_constrained_override(&mut self, constrained: Option<bool>) {
        self.config.constrained = constrained;
    }

    pub fn tap(
        &self,
        store: &mut GraphStore,
        controller: &mut QueryController,
        node_id: &str,
    ) -> Result<TapOutcome, StoreError> {
        store.select(Some(node_id))?;

        match self.policy() {
            SurfacePolicy::Full => Ok(TapOutcome::Selected),
            SurfacePolicy::Constrained => {
                let ticket = controller.expand(node_id, store.generation());
                Ok(TapOutcome::Expanding(ticket))
            }
        }
    }

    pub fn clear(&self, store: &mut GraphStore) {
        // Deselecting never fails.
        let _ = store.select(None);
    }
}

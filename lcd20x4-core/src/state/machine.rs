//! Lifecycle state definition

use super::events::LifecycleEvent;

/// Bridge lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    /// Constructed, or startup failed; nothing is connected
    #[default]
    Idle,
    /// Connecting and configuring the peripheral
    Starting,
    /// Accepting host commands and relaying button events
    Running,
    /// Closing the connection
    Stopping,
    /// Shut down; may be started again
    Stopped,
}

impl LifecycleState {
    /// Check if the bridge finished startup
    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running)
    }

    /// Check if a start request would be honoured
    pub fn can_start(&self) -> bool {
        matches!(self, LifecycleState::Idle | LifecycleState::Stopped)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LifecycleEvent) -> Self {
        use LifecycleEvent::*;
        use LifecycleState::*;

        match (self, event) {
            // Startup
            (Idle | Stopped, Start) => Starting,
            (Starting, Started) => Running,
            (Starting, StartFailed) => Idle,

            // Shutdown
            (Idle | Starting | Running, Stop) => Stopping,
            (Stopping, ShutdownComplete) => Stopped,

            // Default: stay in current state
            _ => self,
        }
    }
}

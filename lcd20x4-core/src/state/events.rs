//! Events that trigger lifecycle transitions

/// Events that can trigger lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleEvent {
    /// Host asked the bridge to start
    Start,
    /// Connection established and peripheral configured
    Started,
    /// Configuration or connection error during startup
    StartFailed,
    /// Host asked the bridge to stop
    Stop,
    /// Connection closed
    ShutdownComplete,
}

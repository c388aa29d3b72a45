//! Well-known queue and topic names.

/// Work queue carrying ContextBuilt events for root-cause analysis.
pub const RCA_TASKS_QUEUE: &str = "rca-tasks";

/// Event-bus topic for incident timeline events.
pub const TIMELINE_TOPIC: &str = "debugging.timeline";

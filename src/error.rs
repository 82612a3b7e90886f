use thiserror::Error;

/// Contract violations surfaced to the caller.
///
/// Missing-resource conditions are not errors; those paths log a warning
/// and become no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// `set_parent` on an entity that already has a parent.
    /// The entity must be detached with `remove_parent` first.
    #[error("entity already has a parent")]
    AlreadyParented,

    /// `remove_parent` on an entity with no parent.
    #[error("entity has no parent")]
    NotParented,

    /// Attaching the dependent would create a notification cycle.
    #[error("dependency attachment would create a cycle")]
    DependencyCycle,

    /// A stale or never-registered entity id.
    #[error("unknown entity id")]
    UnknownEntity,

    /// A stale or released brush id.
    #[error("unknown brush id")]
    UnknownBrush,

    /// A grid slot coordinate outside the grid's current dimensions.
    #[error("grid slot out of range")]
    SlotOutOfRange,

    /// `stop` or `finish` on an animator that is not running.
    #[error("animator is not running")]
    AnimatorNotRunning,

    /// `start` on an animator that is already running.
    #[error("animator is already running")]
    AnimatorRunning,
}

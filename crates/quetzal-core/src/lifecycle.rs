use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Allocated, `activate` not called yet.
    #[default]
    Unattached,
    /// Waiting on `before_created`, or building the boundary.
    Initializing,
    Created,
    Mounted,
    Unmounted,
    /// Creation stopped on an error. Terminal.
    Failed,
}

impl LifecycleState {
    /// Transitions the pipeline is allowed to make.
    ///
    /// One-directional except `Mounted <-> Unmounted`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Unattached, Initializing)
                | (Initializing, Created)
                | (Initializing, Failed)
                | (Created, Mounted)
                | (Mounted, Unmounted)
                | (Unmounted, Mounted)
        )
    }

    /// Content is attached to the boundary.
    pub fn is_created(self) -> bool {
        matches!(
            self,
            LifecycleState::Created | LifecycleState::Mounted | LifecycleState::Unmounted
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Failed
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Unattached => "unattached",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Created => "created",
            LifecycleState::Mounted => "mounted",
            LifecycleState::Unmounted => "unmounted",
            LifecycleState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::*;

    #[test]
    fn test_forward_only() {
        assert!(Unattached.can_transition_to(Initializing));
        assert!(Initializing.can_transition_to(Created));
        assert!(Created.can_transition_to(Mounted));
        assert!(!Created.can_transition_to(Initializing));
        assert!(!Initializing.can_transition_to(Mounted));
        assert!(!Unattached.can_transition_to(Created));
    }

    #[test]
    fn test_mount_cycle() {
        assert!(Mounted.can_transition_to(Unmounted));
        assert!(Unmounted.can_transition_to(Mounted));
        assert!(!Created.can_transition_to(Unmounted));
    }

    #[test]
    fn test_failed_is_terminal() {
        assert!(Initializing.can_transition_to(Failed));
        assert!(Failed.is_terminal());
        for next in [Unattached, Initializing, Created, Mounted, Unmounted, Failed] {
            assert!(!Failed.can_transition_to(next));
        }
    }
}

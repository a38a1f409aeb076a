//! Finite state machine for instance reconciliation
//!
//! Makes the delete-then-recreate ordering an enforced invariant rather
//! than an accident of statement order: creation is only reachable from
//! `Absent`, and `Absent` is only reachable by observation or deletion.

/// Reconciliation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileState {
    /// Nothing observed yet
    Unknown,

    /// No instance with the target name exists
    Absent,

    /// An instance with the target name exists and must go
    ExistingStale,

    /// Create was issued; waiting for the instance to come up
    Creating,

    /// Instance observed running
    Running,

    /// Instance observed failed
    Failed,
}

/// Reconciliation event
#[derive(Debug, Clone)]
pub enum ReconcileEvent {
    /// Existence check found no instance
    ObservedAbsent,

    /// Existence check found an instance with the target name
    ObservedPresent,

    /// The stale instance was deleted and absence confirmed
    Deleted,

    /// The create call was accepted
    Created,

    /// Poll saw the instance still coming up
    PollPending,

    /// Poll saw the instance running
    PollRunning,

    /// Poll saw the instance in a failed state
    PollFailed(String),
}

/// Reconciliation FSM
#[derive(Debug, Clone)]
pub struct ReconcileFsm {
    state: ReconcileState,
    error: Option<String>,
}

impl ReconcileFsm {
    /// Create a new FSM with nothing observed
    pub fn new() -> Self {
        Self {
            state: ReconcileState::Unknown,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ReconcileEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            // From Unknown: the mandatory existence check
            (ReconcileState::Unknown, ReconcileEvent::ObservedAbsent) => ReconcileState::Absent,
            (ReconcileState::Unknown, ReconcileEvent::ObservedPresent) => {
                ReconcileState::ExistingStale
            }

            // From ExistingStale: unconditional deletion
            (ReconcileState::ExistingStale, ReconcileEvent::Deleted) => ReconcileState::Absent,

            // From Absent: the only state creation is allowed from
            (ReconcileState::Absent, ReconcileEvent::Created) => ReconcileState::Creating,

            // From Creating: the poll loop
            (ReconcileState::Creating, ReconcileEvent::PollPending) => ReconcileState::Creating,
            (ReconcileState::Creating, ReconcileEvent::PollRunning) => ReconcileState::Running,
            (ReconcileState::Creating, ReconcileEvent::PollFailed(err)) => {
                self.error = Some(err.clone());
                ReconcileState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for ReconcileFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_deploy_flow() {
        let mut fsm = ReconcileFsm::new();
        assert_eq!(fsm.state(), &ReconcileState::Unknown);

        fsm.process(ReconcileEvent::ObservedAbsent).unwrap();
        assert_eq!(fsm.state(), &ReconcileState::Absent);

        fsm.process(ReconcileEvent::Created).unwrap();
        assert_eq!(fsm.state(), &ReconcileState::Creating);

        fsm.process(ReconcileEvent::PollPending).unwrap();
        fsm.process(ReconcileEvent::PollRunning).unwrap();
        assert_eq!(fsm.state(), &ReconcileState::Running);
    }

    #[test]
    fn test_redeploy_deletes_first() {
        let mut fsm = ReconcileFsm::new();

        fsm.process(ReconcileEvent::ObservedPresent).unwrap();
        assert_eq!(fsm.state(), &ReconcileState::ExistingStale);

        // Creation is rejected while the stale instance still exists
        assert!(fsm.clone().process(ReconcileEvent::Created).is_err());

        fsm.process(ReconcileEvent::Deleted).unwrap();
        fsm.process(ReconcileEvent::Created).unwrap();
        assert_eq!(fsm.state(), &ReconcileState::Creating);
    }

    #[test]
    fn test_failure_records_error() {
        let mut fsm = ReconcileFsm::new();

        fsm.process(ReconcileEvent::ObservedAbsent).unwrap();
        fsm.process(ReconcileEvent::Created).unwrap();
        fsm.process(ReconcileEvent::PollFailed("image pull failed".to_string()))
            .unwrap();

        assert_eq!(fsm.state(), &ReconcileState::Failed);
        assert_eq!(fsm.error(), Some("image pull failed"));
    }

    #[test]
    fn test_invalid_transition() {
        let mut fsm = ReconcileFsm::new();

        // Cannot create before observing
        assert!(fsm.process(ReconcileEvent::Created).is_err());
        assert_eq!(fsm.state(), &ReconcileState::Unknown);
    }
}

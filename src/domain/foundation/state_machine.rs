//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating state transitions
//! across entity lifecycle statuses (order, payment).

/// Trait for status enums that represent state machines.
///
/// Implementors define the structural transition table; authorization
/// layers on top of it live with the implementing type (see
/// `domain::order::validate_transition`).
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is structurally valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

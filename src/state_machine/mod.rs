// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Generic, reusable state machine types for modeling lifecycles. All state
//! machines are pure functional: transitions are deterministic functions
//! with no side effects, so phase ordering can be checked and tested without
//! touching a platform.
//!
//! The machines here are Mealy machines: the output depends on both the
//! current state and the input.
//!
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! The provisioning lifecycle in [`provision_lifecycle`] is the primary
//! implementation; it gates which orchestration phases may run from which
//! state. [`StateMachineWithHistory`] wraps any machine and records every
//! transition with a timestamp for post-run auditing.

pub mod provision_lifecycle;

pub use provision_lifecycle::{PhaseCommand, PhaseOutput, ProvisionPhase};

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Errors that can occur during state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// No transition is defined for the (state, input) pair
    #[error("Invalid transition from {from} on {input}")]
    InvalidTransition { from: String, input: String },

    /// The state is terminal and accepts no further inputs
    #[error("State {0} is terminal")]
    TerminalState(String),
}

/// Trait for finite state machines
///
/// Implement this trait to define a state machine with typed states,
/// inputs, and outputs.
pub trait StateMachine: Sized + Clone {
    /// Input type that triggers transitions
    type Input;

    /// Output type produced by transitions (use () if none)
    type Output;

    /// Attempt to transition to a new state given an input
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    /// Check if a transition is valid without performing it
    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }
}

/// Record of a single state transition
#[derive(Debug, Clone)]
pub struct Transition<S, I> {
    /// State before transition
    pub from: S,

    /// State after transition
    pub to: S,

    /// Input that triggered transition
    pub input: I,

    /// Timestamp of transition
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// State machine wrapper that tracks transition history
#[derive(Debug, Clone)]
pub struct StateMachineWithHistory<FSM: StateMachine> {
    current: FSM,
    history: Vec<Transition<FSM, FSM::Input>>,
}

impl<FSM: StateMachine> StateMachineWithHistory<FSM> {
    /// Create a new state machine with history tracking
    pub fn new(initial: FSM) -> Self {
        Self {
            current: initial,
            history: Vec::new(),
        }
    }

    /// Transition, recording the step in history
    pub fn transition(&mut self, input: FSM::Input) -> TransitionResult<FSM::Output>
    where
        FSM::Input: Clone,
    {
        let from = self.current.clone();
        let (to, output) = self.current.transition(&input)?;

        self.history.push(Transition {
            from,
            to: to.clone(),
            input,
            timestamp: chrono::Utc::now(),
        });

        self.current = to;
        Ok(output)
    }

    /// Get transition history
    pub fn history(&self) -> &[Transition<FSM, FSM::Input>] {
        &self.history
    }

    /// Get current state
    pub fn current(&self) -> &FSM {
        &self.current
    }
}

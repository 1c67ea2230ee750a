// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Lifecycle State Machine
//!
//! Formal FSM for the environment provisioning lifecycle. The orchestrator
//! consults this machine before every phase, so phases cannot run out of
//! order no matter how the driver is invoked.
//!
//! # States
//!
//! - Uninitialized: nothing created yet
//! - RootCreated: environment root folder exists
//! - MastersCreated: master folder, port-groups, and master VMs exist
//! - MastersTemplatized: masters converted to platform templates
//! - InstancesDeployed: numbered instances cloned into the folder tree
//! - MastersCleanedUp / EnvironmentCleanedUp: terminal cleanup states
//!
//! # Inputs (Phase Commands)
//!
//! - CreateRoot: Uninitialized → RootCreated
//! - CreateMasters: RootCreated → MastersCreated
//! - ConvertMasters: MastersCreated → MastersTemplatized
//! - DeployInstances: MastersTemplatized → InstancesDeployed
//! - CleanupMasters: any non-terminal state with masters → MastersCleanedUp
//! - CleanupEnvironment: any non-terminal state → EnvironmentCleanedUp
//!
//! # Outputs
//!
//! - Warnings for state-specific conditions
//! - Whether the transition is destructive

use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Lifecycle state of a provisioned environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionPhase {
    /// Nothing created yet
    Uninitialized,
    /// Environment root folder exists
    RootCreated,
    /// Masters cloned and snapshotted
    MastersCreated,
    /// Masters converted to templates
    MastersTemplatized,
    /// Numbered instances deployed
    InstancesDeployed,
    /// Masters destroyed (terminal)
    MastersCleanedUp,
    /// Entire environment destroyed (terminal)
    EnvironmentCleanedUp,
}

impl ProvisionPhase {
    /// Terminal states accept no further commands
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisionPhase::MastersCleanedUp | ProvisionPhase::EnvironmentCleanedUp
        )
    }
}

impl fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionPhase::Uninitialized => "Uninitialized",
            ProvisionPhase::RootCreated => "RootCreated",
            ProvisionPhase::MastersCreated => "MastersCreated",
            ProvisionPhase::MastersTemplatized => "MastersTemplatized",
            ProvisionPhase::InstancesDeployed => "InstancesDeployed",
            ProvisionPhase::MastersCleanedUp => "MastersCleanedUp",
            ProvisionPhase::EnvironmentCleanedUp => "EnvironmentCleanedUp",
        };
        write!(f, "{name}")
    }
}

/// Phase command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseCommand {
    /// Resolve and create the environment root folder
    CreateRoot,
    /// Create master folder, port-groups, and master VMs
    CreateMasters,
    /// Convert masters to platform templates
    ConvertMasters,
    /// Clone numbered instances from templatized masters
    DeployInstances,
    /// Destroy master instances
    CleanupMasters,
    /// Destroy the deployed environment
    CleanupEnvironment,
}

impl fmt::Display for PhaseCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseCommand::CreateRoot => "CreateRoot",
            PhaseCommand::CreateMasters => "CreateMasters",
            PhaseCommand::ConvertMasters => "ConvertMasters",
            PhaseCommand::DeployInstances => "DeployInstances",
            PhaseCommand::CleanupMasters => "CleanupMasters",
            PhaseCommand::CleanupEnvironment => "CleanupEnvironment",
        };
        write!(f, "{name}")
    }
}

/// Transition output with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutput {
    /// Warnings generated during transition
    pub warnings: Vec<String>,

    /// Whether this transition destroys platform resources
    pub is_destructive: bool,
}

impl PhaseOutput {
    /// Output with no warnings
    pub fn ok() -> Self {
        Self {
            warnings: Vec::new(),
            is_destructive: false,
        }
    }

    /// Output for a destructive transition
    pub fn destructive(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            is_destructive: true,
        }
    }
}

impl StateMachine for ProvisionPhase {
    type Input = PhaseCommand;
    type Output = PhaseOutput;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use PhaseCommand::*;
        use ProvisionPhase::*;

        if self.is_terminal() {
            return Err(TransitionError::TerminalState(self.to_string()));
        }

        match (self, input) {
            (Uninitialized, CreateRoot) => Ok((RootCreated, PhaseOutput::ok())),
            (RootCreated, CreateMasters) => Ok((MastersCreated, PhaseOutput::ok())),
            (MastersCreated, ConvertMasters) => Ok((MastersTemplatized, PhaseOutput::ok())),
            (MastersTemplatized, DeployInstances) => Ok((InstancesDeployed, PhaseOutput::ok())),

            // Master cleanup is legal once a root exists; cleaning up before
            // masters were created just has nothing to destroy.
            (RootCreated, CleanupMasters) => Ok((
                MastersCleanedUp,
                PhaseOutput::destructive(vec!["No masters were created in this run".to_string()]),
            )),
            (MastersCreated | MastersTemplatized | InstancesDeployed, CleanupMasters) => {
                Ok((MastersCleanedUp, PhaseOutput::destructive(Vec::new())))
            }

            // Environment cleanup is legal from any non-terminal state with a root
            (
                RootCreated | MastersCreated | MastersTemplatized | InstancesDeployed,
                CleanupEnvironment,
            ) => Ok((EnvironmentCleanedUp, PhaseOutput::destructive(Vec::new()))),

            (from, input) => Err(TransitionError::InvalidTransition {
                from: from.to_string(),
                input: input.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let phase = ProvisionPhase::Uninitialized;
        let (phase, _) = phase.transition(&PhaseCommand::CreateRoot).unwrap();
        let (phase, _) = phase.transition(&PhaseCommand::CreateMasters).unwrap();
        let (phase, _) = phase.transition(&PhaseCommand::ConvertMasters).unwrap();
        let (phase, _) = phase.transition(&PhaseCommand::DeployInstances).unwrap();
        assert_eq!(phase, ProvisionPhase::InstancesDeployed);
    }

    #[test]
    fn test_phases_cannot_be_skipped() {
        let phase = ProvisionPhase::Uninitialized;
        assert!(phase.transition(&PhaseCommand::CreateMasters).is_err());
        assert!(phase.transition(&PhaseCommand::ConvertMasters).is_err());
        assert!(phase.transition(&PhaseCommand::DeployInstances).is_err());
    }

    #[test]
    fn test_cleanup_from_intermediate_states() {
        let (phase, output) = ProvisionPhase::MastersCreated
            .transition(&PhaseCommand::CleanupMasters)
            .unwrap();
        assert_eq!(phase, ProvisionPhase::MastersCleanedUp);
        assert!(output.is_destructive);

        let (phase, _) = ProvisionPhase::InstancesDeployed
            .transition(&PhaseCommand::CleanupEnvironment)
            .unwrap();
        assert_eq!(phase, ProvisionPhase::EnvironmentCleanedUp);
    }

    #[test]
    fn test_cleanup_before_masters_warns() {
        let (_, output) = ProvisionPhase::RootCreated
            .transition(&PhaseCommand::CleanupMasters)
            .unwrap();
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_cleanup_requires_a_root() {
        assert!(ProvisionPhase::Uninitialized
            .transition(&PhaseCommand::CleanupEnvironment)
            .is_err());
    }

    #[test]
    fn test_terminal_states_reject_all_commands() {
        for command in [
            PhaseCommand::CreateRoot,
            PhaseCommand::CreateMasters,
            PhaseCommand::CleanupEnvironment,
        ] {
            assert!(matches!(
                ProvisionPhase::MastersCleanedUp.transition(&command),
                Err(TransitionError::TerminalState(_))
            ));
        }
    }
}

//! Typed models for the Azure Resource Manager REST surface.
//!
//! Covers the three resource providers the deployer talks to:
//! subscriptions, `Microsoft.ContainerRegistry`, and
//! `Microsoft.ContainerInstance`, plus the ACR data-plane tag listing.
//! Wire format is camelCase JSON throughout.

pub mod models;

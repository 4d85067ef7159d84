//! Culvert Core Types
//!
//! This crate provides the shared data model for Culvert drainage network
//! schematics. It includes:
//!
//! - **Identifiers**: Canonical trimmed node and conduit identifiers ([`identifier::Id`])
//! - **Colors**: CSS colour handling for connectors ([`color::Color`])
//! - **Geometry**: Points and vector helpers ([`geometry`] module)
//! - **Network**: Node, conduit and monitor records ([`network`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod network;

//! Unit Tests Module
//!
//! Engine operations exercised one at a time against the scripted node.

pub mod chain_building;
pub mod connection;

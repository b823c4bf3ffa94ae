//! ECS Components
//!
//! Per-agent components and the world resources they live in.

pub mod agent;
pub mod world;

pub use agent::*;
pub use world::*;

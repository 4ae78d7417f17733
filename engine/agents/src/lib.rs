//! Trading agents for the simulator.
//!
//! Agents are pure order generators: they read a price and a historical
//! average and return candidate orders. They never touch shared state, so the
//! driver can run them on as many threads as it likes.

mod agent;
mod strategy;

pub use agent::{Agent, AgentPool};
pub use strategy::Strategy;

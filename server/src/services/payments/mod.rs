mod gateway;
mod signature;

pub use gateway::*;
pub use signature::*;

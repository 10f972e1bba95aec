//! Dispatch workflow: stock stats, FIFO allocation and the status state machine

pub mod allocator;
pub mod engine;
pub mod stats;
pub mod transitions;

pub use allocator::{AllocationResult, BatchIdGenerator};
pub use engine::{DispatchEngine, EngineConfig, Inventory};
pub use stats::{StatusBreakdown, StockStats};
pub use transitions::{available_actions, plan_transition, TransitionRule, WorkflowAction};

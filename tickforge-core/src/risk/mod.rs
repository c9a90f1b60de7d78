//! Risk engine: sizing, execution costs and open-position management.

pub mod cost_model;
pub mod manager;
pub mod sizing;

pub use cost_model::{CostModel, OrderSide};
pub use manager::{EntryPlan, PositionManager};
pub use sizing::PositionSizer;

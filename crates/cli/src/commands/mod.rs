//! Command implementations.

mod plan;
mod send;
mod validate;

pub use plan::run_plan;
pub use send::run_send;
pub use validate::run_validate;

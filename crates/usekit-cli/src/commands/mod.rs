//! Command implementations

pub mod list;
pub mod rule;
pub mod tool;

pub use list::run_list;
pub use rule::run_rule;
pub use tool::run_tool;

//! Standard library of DATA-step functions

pub mod math;
pub mod statistics;
pub mod strings;
pub mod time_date;

use crate::tools::ToolRegistry;

/// Register all standard library tools
pub fn register_all(registry: &mut ToolRegistry) {
    math::register(registry);
    strings::register(registry);
    statistics::register(registry);
    time_date::register(registry);
}

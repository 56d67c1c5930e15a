pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{ensure_period, handle_harvest, init_tracing, options_from_args};

// Re-export harvest functionality from ikeacats-core
pub use ikeacats_core::harvest::{
    HarvestOptions, HarvestSummary, execute_harvest, generate_harvest_report,
};
pub use ikeacats_core::print_banner;

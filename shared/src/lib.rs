pub mod confirmation;
pub mod status_line;
pub mod telemetry;
pub mod types;
pub mod utils;

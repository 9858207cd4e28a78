//! CLI library for testing purposes

pub mod convert;
pub mod route;

pub use convert::{ConvertArgs, build_converter, run_convert_command};
pub use route::{RouteEntry, collect_routes, print_routes};

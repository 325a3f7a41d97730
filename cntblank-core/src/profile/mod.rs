pub mod datetime;
pub mod field;
pub mod report;

pub use datetime::parse_datetime;
pub use field::{column_name, is_full_width, parse_bool, Extent, Field, REPORT_COLUMNS};
pub use report::{Profiler, ProfilerState, Report};

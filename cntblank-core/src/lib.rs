pub mod export;
pub mod profile;
pub mod reader;
pub mod run;
pub mod scanner;
pub mod transcode;

pub use cntblank_common::{CntblankError, Dialect, Encoding, Result, SourceInfo};
pub use export::{renderer_for, OutputFormat, ReportRenderer};
pub use profile::{Field, Profiler, ProfilerState, Report, REPORT_COLUMNS};
pub use reader::{RecordSource, Row, MAX_ROW_ERRORS};
pub use run::{profile_files, profile_path, profile_reader, profile_source};
pub use scanner::{collect_files, resolve_paths, SourceFile};

//! # LaserCAM Toolpath
//!
//! Turns validated curve snapshots into laser G-code:
//! validation, tessellation, nesting order, toolpath assembly, time
//! estimation and emission, plus the job pipeline that drives them.

pub mod estimate;
pub mod gcode_gen;
pub mod job;
pub mod nesting;
pub mod operator;
pub mod segment;
pub mod summary;
pub mod tessellate;
pub mod toolpath;
pub mod validation;

pub use estimate::{format_duration, TimeEstimate, TimeEstimator};
pub use gcode_gen::GCodeEmitter;
pub use job::{
    capture_curves, resolve_layers, select_material, Job, JobCompiler, JobSettings,
    LayerSelection,
};
pub use nesting::{NestingSorter, SortMode};
pub use operator::{
    always_abort, always_continue, Checkpoint, Decision, DecisionPolicy, HeadlessOperator,
    Operator,
};
pub use segment::{ArcDirection, Segment};
pub use summary::{JobSummary, LayerStatistics};
pub use tessellate::{CurveTessellator, Tessellation, TessellationProgress, TessellationSettings};
pub use toolpath::{
    Instruction, MotionProgram, ProgramSection, SkippedEntry, Toolpath, ToolpathBuilder,
    ToolpathEntry,
};
pub use validation::{
    FlagKind, FlagReason, GeometryValidator, ValidationFlag, ValidationReport, ValidationSettings,
};

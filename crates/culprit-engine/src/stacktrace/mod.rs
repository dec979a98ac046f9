//! Stacktrace value types handed to the engine by the crash parser.
//!
//! Frames, call stacks and stacktraces are immutable once built. Frames
//! lacking a dependency can be re-rooted with [`StackFrame::with_dependency`],
//! which returns a new frame.

pub mod callstack;
pub mod frame;

// Re-export main types
pub use callstack::{CallStack, CallStackFormat, LanguageType, Stacktrace};
pub use frame::{parse_crashed_line_range, StackFrame};

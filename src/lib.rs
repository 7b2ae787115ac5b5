//! A small Brainfuck tape machine.
//!
//! The [`Machine`] runs programs over a fixed-size byte tape (default 30,000
//! cells) with a single data pointer, and can trace every step.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0 before every run.
//! - Strict pointer bounds: moving left from cell 0 or right past the end
//!   returns an error. Cell values wrap.
//! - Input `,` reads from the supplied input string, then interactively; with
//!   nothing available the current cell is set to 0.
//! - Output `.` is accumulated and returned, and echoed to stdout unless debug
//!   mode is on.
//! - Nested loops `[]` are matched before execution; unmatched brackets are
//!   reported as errors.
//! - Any non-instruction character is a comment.
//!
//! Quick start:
//!
//! ```no_run
//! use sbfi::Machine;
//!
//! let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
//! let mut machine = Machine::new();
//! let output = machine.execute(code, "").expect("program should run");
//! assert_eq!(output, "Hello World!\n");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod io;
pub mod machine;
pub mod program;
pub mod repl;
pub mod runner;
pub mod snapshot;
pub mod theme;
pub mod trace;

pub use config::Config;
pub use machine::{ErrorKind, Machine, MachineError, DEFAULT_TAPE_LENGTH};
pub use program::{filter_source, BracketKind, Op, Program};
pub use runner::{exec_file, run_code, RunError};
pub use snapshot::{CellDump, Snapshot, SnapshotError};
pub use trace::TraceRecord;

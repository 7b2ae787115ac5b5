//! The tape machine.
//!
//! A [`Machine`] owns a zeroed byte tape, a data pointer and an instruction
//! pointer. Each call to [`Machine::execute`] starts from a clean tape, so one
//! machine can run any number of independent programs.
//!
//! Behaviors:
//! - Characters outside `><+-.,[]` are comments and are dropped before anything runs.
//! - Brackets are matched up front; an unmatched `[` or `]` fails before any side effect.
//! - Strict pointer bounds: leaving `[0, tape_length)` is an error.
//! - Cell values wrap modulo 256.
//! - `,` reads from the supplied input, then from the interactive provider, then stores 0.

use std::fmt;

use crate::io::{self, InputProvider, OutputSink, TraceSink};
use crate::program::{BracketKind, Op, Program};
use crate::snapshot::Snapshot;
use crate::trace::TraceRecord;

pub const DEFAULT_TAPE_LENGTH: usize = 30_000;

/// Errors that abort an [`Machine::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    /// Loops were not balanced.
    #[error("Unmatched {kind} at position {ip}")]
    UnmatchedBracket { ip: usize, kind: BracketKind },

    /// `>` tried to move past the last cell.
    #[error("Memory pointer overflow at position {ip}")]
    PointerOverflow { ip: usize },

    /// `<` tried to move left of cell 0.
    #[error("Memory pointer underflow at position {ip}")]
    PointerUnderflow { ip: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected while matching brackets, before execution.
    Syntax,
    /// Detected while executing an instruction.
    Runtime,
}

impl MachineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MachineError::UnmatchedBracket { .. } => ErrorKind::Syntax,
            MachineError::PointerOverflow { .. } | MachineError::PointerUnderflow { .. } => {
                ErrorKind::Runtime
            }
        }
    }

    /// Offending index in the filtered program.
    pub fn position(&self) -> usize {
        match self {
            MachineError::UnmatchedBracket { ip, .. }
            | MachineError::PointerOverflow { ip }
            | MachineError::PointerUnderflow { ip } => *ip,
        }
    }
}

pub struct Machine {
    memory: Vec<u8>,
    pointer: usize,
    ip: usize,
    output: String,
    input: String,
    // Byte offset of the next unread character in `input`.
    input_pos: usize,
    debug: bool,
    // Optional hooks; stdin/stdout are used when unset.
    input_provider: Option<InputProvider>,
    output_sink: Option<OutputSink>,
    trace_sink: Option<TraceSink>,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("tape_length", &self.memory.len())
            .field("pointer", &self.pointer)
            .field("ip", &self.ip)
            .field("output", &self.output)
            .field("input", &self.input)
            .field("input_pos", &self.input_pos)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Create a machine with a 30,000 cell tape.
    pub fn new() -> Self {
        Self::with_tape_length(DEFAULT_TAPE_LENGTH)
    }

    /// Create a machine with a custom tape length (at least one cell).
    pub fn with_tape_length(tape_length: usize) -> Self {
        Self {
            memory: vec![0; tape_length.max(1)],
            pointer: 0,
            ip: 0,
            output: String::new(),
            input: String::new(),
            input_pos: 0,
            debug: false,
            input_provider: None,
            output_sink: None,
            trace_sink: None,
        }
    }

    /// Provide the fallback used by `,` when the input buffer is exhausted.
    pub fn set_input_provider<F>(&mut self, provider: F)
    where
        F: FnMut() -> Option<char> + Send + 'static,
    {
        self.input_provider = Some(Box::new(provider));
    }

    /// Provide an output sink. When set, `.` sends characters here instead of stdout.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: FnMut(char) + Send + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    /// Provide a trace sink. When set, debug records go here instead of stdout.
    pub fn set_trace_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&TraceRecord) + Send + 'static,
    {
        self.trace_sink = Some(Box::new(sink));
    }

    /// Zero the tape and clear pointers, output and input.
    /// Debug mode and tape length are kept.
    pub fn reset(&mut self) {
        self.memory.fill(0);
        self.pointer = 0;
        self.ip = 0;
        self.output.clear();
        self.input.clear();
        self.input_pos = 0;
    }

    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.input_pos = 0;
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn tape(&self) -> &[u8] {
        &self.memory
    }

    pub fn tape_length(&self) -> usize {
        self.memory.len()
    }

    pub fn data_pointer(&self) -> usize {
        self.pointer
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Materialize the current state without mutating it.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Run `source` to completion with `input` as the initial input buffer.
    ///
    /// Returns the accumulated output. On error the machine keeps whatever
    /// state the program reached; the next `execute` or `reset` clears it.
    pub fn execute(&mut self, source: &str, input: &str) -> Result<String, MachineError> {
        self.reset();
        self.set_input(input);

        let program = Program::parse(source)?;
        if program.is_empty() {
            return Ok(String::new());
        }

        while let Some(op) = program.op(self.ip) {
            if self.debug {
                self.emit_trace(op);
            }

            match op {
                Op::Right => {
                    if self.pointer + 1 >= self.memory.len() {
                        return Err(MachineError::PointerOverflow { ip: self.ip });
                    }
                    self.pointer += 1;
                }
                Op::Left => {
                    if self.pointer == 0 {
                        return Err(MachineError::PointerUnderflow { ip: self.ip });
                    }
                    self.pointer -= 1;
                }
                Op::Inc => {
                    self.memory[self.pointer] = self.memory[self.pointer].wrapping_add(1);
                }
                Op::Dec => {
                    self.memory[self.pointer] = self.memory[self.pointer].wrapping_sub(1);
                }
                Op::Output => {
                    let c = char::from(self.memory[self.pointer]);
                    self.output.push(c);
                    if !self.debug {
                        match self.output_sink.as_mut() {
                            Some(sink) => sink(c),
                            None => io::print_stdout_char(c),
                        }
                    }
                }
                Op::Input => {
                    let c = match self.next_input_char() {
                        Some(c) => Some(c),
                        None => match self.input_provider.as_mut() {
                            Some(provider) => provider(),
                            None => io::prompt_stdin_char(),
                        },
                    };
                    // Code points above 255 keep their low byte.
                    self.memory[self.pointer] = c.map_or(0, |c| c as u8);
                }
                Op::LoopOpen => {
                    if self.memory[self.pointer] == 0 {
                        self.ip = matching_bracket(&program, self.ip);
                    }
                }
                Op::LoopClose => {
                    if self.memory[self.pointer] != 0 {
                        self.ip = matching_bracket(&program, self.ip);
                    }
                }
            }

            self.ip += 1;
        }

        Ok(self.output.clone())
    }

    fn next_input_char(&mut self) -> Option<char> {
        let c = self.input[self.input_pos..].chars().next()?;
        self.input_pos += c.len_utf8();
        Some(c)
    }

    fn emit_trace(&mut self, op: Op) {
        let record = TraceRecord::capture(self.ip, op, self.pointer, &self.memory);
        match self.trace_sink.as_mut() {
            Some(sink) => sink(&record),
            None => io::print_trace(&record),
        }
    }
}

/// Position of the bracket paired with the one at `ip`.
///
/// Every bracket is paired by `Program::parse` before anything runs.
fn matching_bracket(program: &Program, ip: usize) -> usize {
    let target = program.jump(ip);
    debug_assert!(target.is_some(), "bracket at {ip} has no jump table entry");
    target.unwrap_or(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    /// A machine whose side channels are captured instead of touching stdio.
    fn quiet(tape_length: usize) -> (Machine, Arc<Mutex<String>>) {
        let mut m = Machine::with_tape_length(tape_length);
        let printed = Arc::new(Mutex::new(String::new()));
        let sink = printed.clone();
        m.set_output_sink(move |c| sink.lock().unwrap().push(c));
        m.set_input_provider(|| None);
        m.set_trace_sink(|_| {});
        (m, printed)
    }

    #[test]
    fn hello_world() {
        let (mut m, printed) = quiet(DEFAULT_TAPE_LENGTH);
        let out = m.execute(HELLO, "").unwrap();
        assert_eq!(out, "Hello World!\n");
        assert_eq!(*printed.lock().unwrap(), "Hello World!\n");
    }

    #[test]
    fn nested_loops_jump_both_ways() {
        let (mut m, _) = quiet(8);
        // 2 * 3 into cell 2, then a loop skipped on a zero cell.
        let out = m.execute("++[>+++[>+<-]<-]>>.>[+]", "").unwrap();
        assert_eq!(out, "\u{6}");
        assert_eq!(&m.tape()[..4], &[0, 0, 6, 0]);
        assert_eq!(m.data_pointer(), 3);
    }

    #[test]
    fn echoes_input() {
        let (mut m, _) = quiet(10);
        assert_eq!(m.execute(",.", "A").unwrap(), "A");
    }

    #[test]
    fn input_is_consumed_in_order() {
        let (mut m, _) = quiet(10);
        assert_eq!(m.execute(",.,.,.", "abc").unwrap(), "abc");
    }

    #[test]
    fn exhausted_input_falls_back_to_provider() {
        let (mut m, _) = quiet(10);
        m.set_input_provider(|| Some('z'));
        assert_eq!(m.execute(",.,.", "y").unwrap(), "yz");
    }

    #[test]
    fn exhausted_input_without_provider_answer_stores_zero() {
        let (mut m, _) = quiet(10);
        assert_eq!(m.execute("+++,", "").unwrap(), "");
        assert_eq!(m.tape()[0], 0);
    }

    #[test]
    fn wide_input_keeps_low_byte() {
        let (mut m, _) = quiet(10);
        m.execute(",", "\u{141}").unwrap();
        assert_eq!(m.tape()[0], 0x41);
    }

    #[test]
    fn comments_are_ignored() {
        let (mut m, _) = quiet(10);
        assert_eq!(m.execute("add three + + + then print .", "").unwrap(), "\u{3}");
    }

    #[test]
    fn empty_program_returns_empty_output() {
        let (mut m, _) = quiet(10);
        assert_eq!(m.execute("no instructions here", "").unwrap(), "");
        assert_eq!(m.execute("", "").unwrap(), "");
    }

    #[test]
    fn balanced_brackets_only_leave_tape_clean() {
        let (mut m, _) = quiet(16);
        for source in ["[]", "[][]", "[[]]", "[[][[]]][]"] {
            assert_eq!(m.execute(source, "").unwrap(), "");
            assert!(m.tape().iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn increments_wrap_modulo_256() {
        let (mut m, _) = quiet(1);
        for n in [0usize, 1, 255, 256, 257, 600] {
            m.execute(&"+".repeat(n), "").unwrap();
            assert_eq!(m.tape()[0] as usize, n % 256, "n = {n}");
        }
    }

    #[test]
    fn decrements_wrap_modulo_256() {
        let (mut m, _) = quiet(1);
        for n in [1usize, 2, 255, 256, 257, 513] {
            m.execute(&"-".repeat(n), "").unwrap();
            assert_eq!(m.tape()[0] as usize, (256 - n % 256) % 256, "n = {n}");
        }
    }

    #[test]
    fn output_code_point_matches_cell() {
        let (mut m, _) = quiet(1);
        for v in 0u32..=255 {
            let out = m.execute(&format!("{}.", "+".repeat(v as usize)), "").unwrap();
            let chars: Vec<char> = out.chars().collect();
            assert_eq!(chars.len(), 1);
            assert_eq!(chars[0] as u32, v);
        }
    }

    #[test]
    fn move_left_on_fresh_machine_underflows() {
        let (mut m, _) = quiet(10);
        let err = m.execute("<", "").unwrap_err();
        assert_eq!(err, MachineError::PointerUnderflow { ip: 0 });
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn moving_past_the_end_overflows_on_the_last_step() {
        let tape_length = 3;
        let (mut m, _) = quiet(tape_length);
        let err = m.execute(&">".repeat(tape_length), "").unwrap_err();
        assert_eq!(err, MachineError::PointerOverflow { ip: tape_length - 1 });
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(m.data_pointer(), tape_length - 1);
    }

    #[test]
    fn unmatched_brackets_are_syntax_errors() {
        let (mut m, _) = quiet(10);
        let err = m.execute("[[", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.position(), 0);
        assert!(matches!(err, MachineError::UnmatchedBracket { kind: BracketKind::Open, .. }));

        let err = m.execute("]", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.position(), 0);
        assert!(matches!(err, MachineError::UnmatchedBracket { kind: BracketKind::Close, .. }));
    }

    #[test]
    fn syntax_errors_happen_before_any_output() {
        let (mut m, printed) = quiet(10);
        assert!(m.execute("+.]", "").is_err());
        assert!(printed.lock().unwrap().is_empty());
        assert_eq!(m.tape()[0], 0);
    }

    #[test]
    fn runtime_error_keeps_partial_state() {
        let (mut m, printed) = quiet(10);
        let err = m.execute("+++.<", "").unwrap_err();
        assert_eq!(err, MachineError::PointerUnderflow { ip: 4 });
        assert_eq!(m.output(), "\u{3}");
        assert_eq!(*printed.lock().unwrap(), "\u{3}");
        assert_eq!(m.tape()[0], 3);
    }

    #[test]
    fn error_positions_count_filtered_instructions() {
        let (mut m, _) = quiet(10);
        let err = m.execute("move  < left", "").unwrap_err();
        assert_eq!(err.position(), 0);
    }

    #[test]
    fn debug_mode_traces_and_suppresses_printing() {
        let (mut m, printed) = quiet(10);
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = records.clone();
        m.set_trace_sink(move |r| sink.lock().unwrap().push(r.clone()));
        m.set_debug(true);

        let out = m.execute("+++.", "").unwrap();
        assert_eq!(out, "\u{3}");
        assert!(printed.lock().unwrap().is_empty());

        let records = records.lock().unwrap();
        let ops: Vec<char> = records.iter().map(|r| r.op.symbol()).collect();
        assert_eq!(ops, vec!['+', '+', '+', '.']);
        // Each record is taken before the instruction's effect.
        let cells: Vec<u8> = records.iter().map(|r| r.window[r.cursor()]).collect();
        assert_eq!(cells, vec![0, 1, 2, 3]);
        let ips: Vec<usize> = records.iter().map(|r| r.ip).collect();
        assert_eq!(ips, vec![0, 1, 2, 3]);
    }

    #[test]
    fn debug_traces_every_executed_instruction_including_jumps() {
        let (mut m, _) = quiet(10);
        let count = Arc::new(Mutex::new(0usize));
        let sink = count.clone();
        m.set_trace_sink(move |_| *sink.lock().unwrap() += 1);
        m.set_debug(true);

        // '+' once, then '[' '-' ']' with one iteration.
        m.execute("+[-]", "").unwrap();
        assert_eq!(*count.lock().unwrap(), 4);

        // Skipped loop bodies are not traced.
        *count.lock().unwrap() = 0;
        m.execute("[+++]", "").unwrap();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn reset_keeps_debug_and_tape_length() {
        let (mut m, _) = quiet(7);
        m.set_debug(true);
        m.execute("+>+", "in").unwrap();
        m.reset();
        assert!(m.is_debug());
        assert_eq!(m.tape_length(), 7);
        assert!(m.tape().iter().all(|&c| c == 0));
        assert_eq!(m.data_pointer(), 0);
        assert_eq!(m.instruction_pointer(), 0);
        assert_eq!(m.output(), "");
        assert_eq!(m.input(), "");
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut m, _) = quiet(5);
        m.execute("+>++", "").unwrap();
        m.reset();
        let first = m.snapshot();
        m.reset();
        assert_eq!(first, m.snapshot());
    }

    #[test]
    fn repeated_execution_is_identical() {
        let (mut m, _) = quiet(DEFAULT_TAPE_LENGTH);
        let first = m.execute(HELLO, "").unwrap();
        let second = m.execute(HELLO, "").unwrap();
        assert_eq!(first, second);

        let first = m.execute(",+.", "a").unwrap();
        let second = m.execute(",+.", "a").unwrap();
        assert_eq!(first, "b");
        assert_eq!(first, second);
    }

    #[test]
    fn zero_length_tape_still_has_one_cell() {
        let (mut m, _) = quiet(0);
        assert_eq!(m.tape_length(), 1);
        assert!(m.execute(">", "").is_err());
    }

    #[test]
    fn machine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Machine>();
    }
}

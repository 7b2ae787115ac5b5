use std::io::{self, IsTerminal, Write};
use nu_ansi_term::Color;
use crate::MachineError;

/// `Error:` header, bold red only when stderr is a terminal.
pub fn error_label() -> String {
    if io::stderr().is_terminal() {
        Color::LightRed.bold().paint("Error:").to_string()
    } else {
        "Error:".to_string()
    }
}

/// Print the one-line `Error: <message>` banner.
pub fn print_error_banner(msg: &dyn std::fmt::Display) {
    eprintln!("{} {msg}", error_label());
    let _ = io::stderr().flush();
}

/// Close off a program's output on stdout.
///
/// In debug mode the output was only accumulated, so it is printed here.
/// A newline is added when the output does not already end with one.
pub fn finish_output(output: &str, debug: bool) {
    let mut stdout = io::stdout();
    if debug {
        let _ = write!(stdout, "{output}");
    }
    if !output.is_empty() && !output.ends_with('\n') {
        let _ = writeln!(stdout);
    }
    let _ = stdout.flush();
}

/// Pretty-print a machine error with caret positioning into the filtered `program`.
/// If `program_name` is `Some("sbfi")`, prefix messages with "sbfi: ..."
pub fn print_machine_error(program_name: Option<&str>, program: &str, err: &MachineError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program_name {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    let msg = match err {
        MachineError::UnmatchedBracket { kind, .. } => {
            prefix_program(&format!("Syntax error: unmatched bracket {kind}"))
        }
        MachineError::PointerOverflow { .. } => {
            prefix_program("Runtime error: memory pointer overflow")
        }
        MachineError::PointerUnderflow { .. } => {
            prefix_program("Runtime error: memory pointer underflow")
        }
    };
    print_error_with_context(&msg, program, err.position());
}

/// Print a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{} {prefix} at position {pos}", error_label());

    for line in context_lines(code, pos) {
        eprintln!("  {line}");
    }
    let _ = io::stderr().flush();
}

/// The source window around `pos` and a caret line under it.
fn context_lines(code: &str, pos: usize) -> [String; 2] {
    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let slice: String = code.chars().skip(start_char).take(end_char.saturating_sub(start_char)).collect();

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    let underline = format!("{}^", " ".repeat(caret_offset_chars));

    [slice, underline]
}

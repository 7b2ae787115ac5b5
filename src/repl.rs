use std::env;
use std::io::{self, IsTerminal, Write};
use reedline::{Signal, DefaultPrompt, DefaultPromptSegment, HistoryItem, Highlighter, StyledText};
use nu_ansi_term::Style;
use crate::{cli_util, Machine, MachineError};

/// Run one program per line on `machine` until `next_line` runs dry.
///
/// Blank lines and lines without instructions are skipped. The first
/// machine error ends the session and is handed back to the caller.
pub fn run_session<N>(machine: &mut Machine, mut next_line: N) -> Result<(), MachineError>
where
    N: FnMut() -> Option<String>,
{
    while let Some(line) = next_line() {
        if crate::filter_source(&line).is_empty() {
            continue;
        }
        let output = machine.execute(&line, "")?;
        cli_util::finish_output(&output, machine.is_debug());
    }
    Ok(())
}

/// Interactive editor mode.
pub fn repl_loop(machine: &mut Machine) -> io::Result<Result<(), MachineError>> {
    let mut editor = init_line_editor()?;
    let outcome = run_session(machine, || read_line_interactive(&mut editor));

    // EOF or editor closed. End the session cleanly.
    println!();
    io::stdout().flush()?;
    Ok(outcome)
}

/// Non-interactive mode: one program per stdin line until EOF.
pub fn execute_bare(machine: &mut Machine) -> Result<(), MachineError> {
    // Lock stdin per line so ',' can fall back to reading it mid-session.
    run_session(machine, || {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    })
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{default_emacs_keybindings, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent};

    // Start from default emacs-like bindings; Enter submits the line.
    // Alt+Up/Alt+Down or Ctrl+Up/Ctrl+Down navigate history items.
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(BrainfuckHighlighter::new_catppuccin_mocha()))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

fn read_line_interactive(editor: &mut reedline::Reedline) -> Option<String> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("BF".to_string()), DefaultPromptSegment::Empty);

    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Some(buffer)
        }
        Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => None,
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    // Flag override
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !io::stdin().is_terminal() {
                return Err("cannot start editor: stdin is not a TTY (use --bare or SBFI_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    // Environment override
    if let Ok(val) = env::var("SBFI_REPL_MODE") {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !io::stdin().is_terminal() {
                    return Err("cannot start editor: stdin is not a TTY (use SBFI_REPL_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid SBFI_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    // Auto-detect
    if io::stdin().is_terminal() {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

#[derive(Default)]
struct BrainfuckHighlighter {
    // Per-char styles for instructions, and a fallback for comments
    map_plus: Style,
    map_minus: Style,
    map_lt: Style,
    map_gt: Style,
    map_dot: Style,
    map_comma: Style,
    map_bracket: Style,
    map_other: Style,
}

impl BrainfuckHighlighter {
    fn new_catppuccin_mocha() -> Self {
        use crate::theme::catppuccin::Mocha as P;

        // > <   => SKY/TEAL (movement)
        // + -   => GREEN/RED (data modification)
        // . ,   => YELLOW/PEACH (I/O)
        // [ ]   => MAUVE (flow control)
        Self {
            map_gt: Style::new().fg(P::SKY).bold(),
            map_lt: Style::new().fg(P::TEAL).bold(),
            map_plus: Style::new().fg(P::GREEN).bold(),
            map_minus: Style::new().fg(P::RED).bold(),
            map_dot: Style::new().fg(P::YELLOW).bold(),
            map_comma: Style::new().fg(P::PEACH).bold(),
            map_bracket: Style::new().fg(P::MAUVE).bold(),
            map_other: Style::new().fg(P::SURFACE2).italic(),
        }
    }

    #[inline]
    fn style_for(&self, ch: char) -> Style {
        match ch {
            '>' => self.map_gt,
            '<' => self.map_lt,
            '+' => self.map_plus,
            '-' => self.map_minus,
            '.' => self.map_dot,
            ',' => self.map_comma,
            '[' | ']' => self.map_bracket,
            _ => self.map_other,
        }
    }
}

impl Highlighter for BrainfuckHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out: StyledText = StyledText::new();
        let mut current_style: Option<Style> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let style = self.style_for(ch);
            match current_style {
                Some(s) if s == style => buffer.push(ch),
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current_style = Some(style);
                    buffer.push(ch);
                }
                None => {
                    current_style = Some(style);
                    buffer.push(ch);
                }
            }
        }

        if let Some(s) = current_style {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}

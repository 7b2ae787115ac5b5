use std::io::{self, IsTerminal, Write};
use clap::Args;

use crate::cli_util::print_error_banner;
use crate::io::{install_interrupt_handler, InterruptiblePrompt};
use crate::repl::{execute_bare, repl_loop, select_mode, ModeFlagOverride, ReplMode};
use crate::{Config, Machine};

#[derive(Args, Debug, Default)]
#[command(disable_help_flag = true)]
pub struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Trace every instruction
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Number of tape cells (fallback SBFI_TAPE_LENGTH; default 30_000)
    #[arg(short = 't', long = "tape-length", value_name = "N")]
    pub tape_length: Option<usize>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl ReplArgs {
    fn mode_flag(&self) -> ModeFlagOverride {
        match (self.bare, self.editor) {
            (true, _) => ModeFlagOverride::Bare,
            (_, true) => ModeFlagOverride::Editor,
            _ => ModeFlagOverride::None,
        }
    }
}

// Public entry point for the REPL from main.rs
pub fn run(program: &str, args: ReplArgs, config: &Config) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match select_mode(args.mode_flag()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // One machine for the whole session; every line starts from a reset tape.
    let tape_length = args.tape_length.filter(|&n| n > 0).unwrap_or(config.tape_length);
    let mut machine = Machine::with_tape_length(tape_length);
    machine.set_debug(args.debug || config.debug);

    // ctrl+c at a `,` prompt stores 0; anywhere else it flushes and exits 0.
    let (mut prompt, interrupt) = InterruptiblePrompt::stdin();
    if let Err(e) = install_interrupt_handler(interrupt, || {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }
    machine.set_input_provider(move || prompt.read_char());

    let outcome = match mode {
        ReplMode::Editor => {
            // Print banners/prompts only if stderr is a TTY
            if io::stderr().is_terminal() {
                eprintln!("sbfi REPL (interactive editor mode)");
                eprintln!("Enter runs the line. Ctrl+d or ctrl+c exits");
                let _ = io::stderr().flush();
            }

            match repl_loop(&mut machine) {
                Ok(outcome) => outcome,
                Err(e) => {
                    eprintln!("{program}: REPL error: {e}");
                    let _ = io::stderr().flush();
                    return 1;
                }
            }
        }
        ReplMode::Bare => execute_bare(&mut machine),
    };

    // Any program error ends the session, but not as a failure of the REPL itself.
    if let Err(err) = outcome {
        print_error_banner(&err);
    }
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl   # Start the interactive read-eval-print loop

Options:
  --help,   -h        Show this help
  --bare              Force non-interactive bare mode
  --editor            Force interactive editor mode (errors if stdin is not a TTY)
  --debug,  -d        Trace every instruction
  --tape-length, -t <N>
                      Number of tape cells (default 30000)

Description:
  Each line you enter is run as a separate program on a freshly reset tape.
  The first error prints an "Error:" banner and ends the session.

Notes:
    - Non-instruction characters are comments and are ignored.
    - Ctrl+C exits the REPL immediately, except at a `,` input prompt,
      where it stores 0 and the program continues.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: SBFI_REPL_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
        * Banners are suppressed if stderr is not a TTY.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

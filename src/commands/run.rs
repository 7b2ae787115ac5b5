use clap::Args;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use crate::cli_util::{finish_output, print_error_banner, print_machine_error};
use crate::io::{install_interrupt_handler, InterruptiblePrompt};
use crate::{filter_source, runner, Config, Machine};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a trace line before every instruction instead of echoing output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read the program from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Input consumed by `,` before falling back to the terminal
    #[arg(short = 'i', long = "input", value_name = "TEXT")]
    pub input: Option<String>,

    /// Number of tape cells (fallback SBFI_TAPE_LENGTH; default 30_000)
    #[arg(short = 't', long = "tape-length", value_name = "N")]
    pub tape_length: Option<usize>,

    /// Write a JSON dump of the final machine state (default path from config)
    #[arg(long = "dump", value_name = "PATH", num_args = 0..=1, require_equals = true, default_missing_value = "")]
    pub dump: Option<String>,

    /// Concatenated program parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs, config: &Config) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        debug,
        file,
        input,
        tape_length,
        dump,
        code,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let source = if let Some(path) = file {
        match runner::read_source(Path::new(&path)) {
            Ok(s) => s,
            Err(e) => {
                print_error_banner(&e);
                return 1;
            }
        }
    } else {
        code.join("")
    };

    // Resolve settings: flags -> env/config file -> defaults
    let tape_length = tape_length.filter(|&n| n > 0).unwrap_or(config.tape_length);
    let mut machine = Machine::with_tape_length(tape_length);
    machine.set_debug(debug || config.debug);

    // ctrl+c at the `,` prompt stores 0; anywhere else it ends the run.
    let (mut prompt, interrupt) = InterruptiblePrompt::stdin();
    if let Err(e) = install_interrupt_handler(interrupt, || {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(130);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }
    machine.set_input_provider(move || prompt.read_char());

    let result = machine.execute(&source, input.as_deref().unwrap_or(""));
    finish_output(machine.output(), machine.is_debug());

    let mut exit_code = match result {
        Ok(_) => 0,
        Err(err) => {
            print_machine_error(Some(program), &filter_source(&source), &err);
            1
        }
    };

    if let Some(dump) = dump {
        let path = if dump.is_empty() { config.dump_file.clone() } else { PathBuf::from(dump) };
        if let Err(e) = machine.snapshot().write_to(&path) {
            print_error_banner(&e);
            exit_code = 1;
        }
    }

    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>         Read the program from PATH instead of positional "<code>"
  --input, -i <TEXT>         Input consumed by `,` before falling back to the terminal
  --tape-length, -t <N>      Number of tape cells (default 30000)
  --dump[=PATH]              Write a JSON dump of the final machine state
  --debug, -d                Print a trace line before every instruction
  --help,  -h                Show this help

Notes:
- Characters outside of ><+-.,[] are comments and are ignored.
- When --input runs out, `,` prompts for a line and uses its first character;
  an empty line, EOF or ctrl+c at the prompt stores 0.

Examples:
- Load a program from a file:
    {0} run --file ./program.bf
- Echo one character:
    {0} run --input A ",."
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

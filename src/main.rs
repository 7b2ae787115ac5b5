use clap::{Parser, Subcommand};
use sbfi::commands::{repl, run};
use sbfi::Config;
use std::env;
use std::io::{self, Write};

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run  [--debug|-d] [--input|-i TEXT] "<code>"  # Run a program (args are concatenated)
  {0} run  [--debug|-d] --file <PATH>               # Run a program loaded from file
  {0} repl [--bare|--editor]                        # Start the read-eval-print loop
  {0}                                               # Same as `{0} repl`

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "sbfi", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(run::RunArgs),
    Repl(repl::ReplArgs),
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("sbfi"));

    let cli = Cli::parse();

    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let config = Config::load();

    let code = match cli.command {
        Some(Command::Run(args)) => run::run(&program, args, &config),
        Some(Command::Repl(args)) => repl::run(&program, args, &config),
        None => repl::run(&program, repl::ReplArgs::default(), &config),
    };

    std::process::exit(code);
}

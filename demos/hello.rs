use sbfi::Machine;

fn main() {
    // Classic "Hello World!" program
    let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    let mut machine = Machine::new();

    match machine.execute(code, "") {
        Ok(output) => eprintln!("({} characters)", output.chars().count()),
        Err(err) => {
            eprintln!("interpreter error: {err}");
            std::process::exit(1);
        }
    }

    // The same machine can run another program; the tape is reset first.
    // Once the input runs out, ',' asks the provider instead of the terminal.
    machine.set_input_provider(|| None);
    if let Err(err) = machine.execute(",[.,]", "echo\n") {
        eprintln!("interpreter error: {err}");
        std::process::exit(1);
    }
}

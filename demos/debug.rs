use sbfi::Machine;

fn main() {
    // Debug mode prints one trace line per instruction and keeps '.' quiet.
    let code = ">+.<";

    let mut machine = Machine::with_tape_length(16);
    machine.set_debug(true);

    match machine.execute(code, "") {
        Ok(output) => println!("output: {:?}", output),
        Err(err) => {
            eprintln!("interpreter error: {err}");
            std::process::exit(1);
        }
    }

    // The final state can be dumped as JSON.
    match machine.snapshot().to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("dump failed: {err}"),
    }
}

//! Smoke-test tool for the script runner: echoes exactly two arguments.
//!
//! Arguments are taken verbatim, so values such as `-5` or `--help` are echoed
//! like any other word.

const USAGE: &str = "Usage: echo-args <arg1> <arg2>";

fn main() {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let [arg1, arg2] = args.as_slice() else {
        println!("{}", USAGE);
        std::process::exit(1);
    };

    println!("Processing {} and {}", arg1, arg2);
    println!("expected output");
}

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};

pub const LOGGING_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn expect_arg<'a>(m: &'a ArgMatches, arg: &str) -> &'a str {
    m.get_one::<String>(arg)
        .map(String::as_str)
        .unwrap_or_else(|| panic!("argument \"{}\" has to be set in CLI at all times", arg))
}

pub fn expect_number(m: &ArgMatches, arg: &str) -> u64 {
    *m.get_one::<u64>(arg)
        .unwrap_or_else(|| panic!("argument \"{}\" has to be set in CLI at all times", arg))
}

pub fn args() -> Command {
    command!()
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("configure logging level to use")
                .value_name("LEVEL")
                .value_parser(LOGGING_LEVELS)
                .default_value(LOGGING_LEVELS[2])
                .global(true),
        )
        .subcommand(
            Command::new("emulate")
                .about("Run a memory image until the program counter stabilizes")
                .arg(
                    Arg::new("input-file")
                        .value_name("FILE")
                        .help("Memory image to be executed")
                        .required(true),
                )
                .arg(
                    Arg::new("max-ticks")
                        .help("Number of ticks after which the run is aborted")
                        .short('t')
                        .long("max-ticks")
                        .value_name("NUMBER")
                        .default_value("20000")
                        .value_parser(value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("dump")
                        .help("Print the final machine state")
                        .short('d')
                        .long("dump")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("circuit")
                .about("Compile ticks of a memory image into a boolean circuit in C")
                .arg(
                    Arg::new("input-file")
                        .value_name("FILE")
                        .help("Memory image to be compiled")
                        .required(true),
                )
                .arg(
                    Arg::new("ticks")
                        .help("Number of ticks to unroll into the circuit")
                        .short('t')
                        .long("ticks")
                        .value_name("NUMBER")
                        .default_value("1")
                        .value_parser(value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("output-file")
                        .help("Output file to write to")
                        .short('o')
                        .long("output-file")
                        .value_name("FILE")
                        .default_value("tick.c"),
                )
                .arg(
                    Arg::new("no-optimize")
                        .help("Emit the raw graph without simplification")
                        .long("no-optimize")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}

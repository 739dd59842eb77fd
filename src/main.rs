use anyhow::{Context, Result};
use clap::ArgMatches;
use env_logger::{Env, TimestampPrecision};
use gatecpu::circuit::codegen::write_c_function;
use gatecpu::circuit::factory::{BitFactory, ConcreteFactory};
use gatecpu::circuit::optimize::optimize_graph;
use gatecpu::cli::{args, expect_arg, expect_number};
use gatecpu::emulate::{dump_state, run_to_fixpoint};
use gatecpu::loader::load_image;
use gatecpu::machine::{unroll, Cpu};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

fn main() -> Result<()> {
    let matches = args().get_matches();

    init_logger(expect_arg(&matches, "verbose"))?;

    match matches.subcommand() {
        Some(("emulate", args)) => emulate(args),
        Some(("circuit", args)) => circuit(args),
        _ => unreachable!("subcommand is required"),
    }
}

fn emulate(args: &ArgMatches) -> Result<()> {
    let input = Path::new(expect_arg(args, "input-file"));
    let max_ticks = expect_number(args, "max-ticks");

    let image = load_image(input)?;
    let cpu = Cpu::new(image.len());
    let mut factory = ConcreteFactory::new();
    let mut state = cpu.state_factory(&image).create_state(&mut factory);

    let ticks = run_to_fixpoint(&cpu, &mut factory, &mut state, max_ticks)
        .with_context(|| format!("Execution of '{}' failed", input.display()))?;
    info!(
        "Executed {} ticks ({} AND, {} XOR gates evaluated)",
        ticks,
        factory.and_count(),
        factory.xor_count()
    );

    if args.get_flag("dump") {
        print!("{}", dump_state(&factory, &state));
    }
    Ok(())
}

fn circuit(args: &ArgMatches) -> Result<()> {
    let input = Path::new(expect_arg(args, "input-file"));
    let output = Path::new(expect_arg(args, "output-file"));
    let ticks = expect_number(args, "ticks");

    let image = load_image(input)?;
    let cpu = Cpu::new(image.len());
    let mut graph = unroll(&cpu, &image, ticks);
    if !args.get_flag("no-optimize") {
        optimize_graph(&mut graph);
    }
    info!(
        "Final circuit: {} nodes, {} AND gates",
        graph.node_count(),
        graph.and_node_count()
    );

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file '{}'", output.display()))?;
    write_c_function(&graph, "tick", BufWriter::new(file))?;
    info!("Wrote circuit to '{}'", output.display());
    Ok(())
}

fn init_logger(cli_level: &str) -> Result<()> {
    let env = Env::new()
        .filter_or("GATECPU_LOG", cli_level)
        .write_style_or("GATECPU_LOG_STYLE", "always");

    let mut builder = env_logger::Builder::from_env(env);

    builder.format_timestamp(Some(TimestampPrecision::Millis));

    builder
        .try_init()
        .context("Failed to initialize logger")
}

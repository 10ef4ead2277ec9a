//! Alpha AXP emulator CLI.
//!
//! This binary provides a single entry point for driving the emulator core.
//! It performs:
//! 1. **Smoke run:** Execute the built-in firmware smoke program on a default
//!    machine and report statistics.
//! 2. **Configuration:** Optional JSON config overrides (RAM geometry, PAL
//!    base, tracing).

use clap::{Parser, Subcommand};
use std::{fs, process};

use axp_core::Config;
use axp_core::core::pipeline::engine::PipelineStepResult;
use axp_core::isa::grains;
use axp_core::sim::MachineBuilder;
use axp_core::sim::simulator::{Program, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "axpsim",
    version,
    about = "Alpha AXP (EV6) emulator core driver",
    long_about = "Run the built-in firmware smoke program on an emulated EV6 machine.\n\nConfiguration is JSON (see axp_core::Config). The CLI uses built-in defaults.\n\nExamples:\n  axpsim run\n  axpsim run --trace --max-ticks 1000\n  axpsim run --config machine.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in smoke program.
    Run {
        /// JSON machine configuration file.
        #[arg(short, long)]
        config: Option<String>,

        /// Enable per-stage instruction tracing.
        #[arg(long)]
        trace: bool,

        /// Tick budget before giving up.
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run {
            config,
            trace,
            max_ticks,
        }) => cmd_run(config, trace, max_ticks),
        None => {
            eprintln!("Alpha AXP emulator: pass a subcommand");
            eprintln!();
            eprintln!("  axpsim run               Smoke run with defaults");
            eprintln!("  axpsim run --trace       Per-stage trace");
            eprintln!("  axpsim --help            Full options");
            process::exit(1);
        }
    }
}

/// The built-in firmware smoke program, assembled as decoded grains.
///
/// Exercises address formation, a store/load round trip, arithmetic, a
/// linking branch, and the privileged HALT.
fn smoke_program(base: u64) -> Program {
    let mut program = Program::new();
    program.insert_seq(
        base,
        [
            grains::lda(1, 31, 0x100),  // R1 = 0x100
            grains::lda(2, 31, 42),     // R2 = 42
            grains::stq(2, 1, 0),       // mem[R1] = R2
            grains::ldq(3, 1, 0),       // R3 = mem[R1]
            grains::addq(3, 3, 4),      // R4 = R3 + R3
            grains::bsr(26, 1),         // skip the next instruction
            grains::addq(4, 4, 4),      // (skipped)
            grains::subq(4, 2, 5),      // R5 = R4 - R2
            grains::call_pal(0x00),     // HALT
        ],
    );
    program
}

/// Runs the smoke program: builds the machine, binds CPU 0, ticks to halt.
fn cmd_run(config_path: Option<String>, trace: bool, max_ticks: u64) {
    let mut config = match config_path {
        Some(path) => match fs::read_to_string(&path).map_err(|e| e.to_string()).and_then(
            |text| Config::from_json(&text).map_err(|e| e.to_string()),
        ) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("[!] bad config {path}: {err}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    config.general.trace |= trace;

    let builder = match MachineBuilder::new(config) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("[!] machine construction failed: {err}");
            process::exit(1);
        }
    };
    let machine = builder.build();

    println!(
        "Machine: {} CPU(s), {} MB RAM, PAL base {:#x}",
        machine.config.system.num_cpus,
        machine.config.system.ram_size / 1024 / 1024,
        machine.config.system.pal_base
    );

    let entry = 0x2000;
    let mut sim = Simulator::new(machine.bind_cpu(0), smoke_program(entry));
    sim.cpu.view.hwpcb.pc = entry;

    println!("[*] entry {entry:#x}, budget {max_ticks} ticks");
    for _ in 0..max_ticks {
        match sim.tick() {
            PipelineStepResult::Halted { code } => {
                println!("\n[*] halted: {code:?}");
                for reg in [1usize, 2, 3, 4, 5, 26] {
                    println!("    R{reg:<2} = {:#x}", sim.cpu.view.read_int(reg));
                }
                sim.cpu.stats.print();
                return;
            }
            PipelineStepResult::Fault { trap, va, pc } => {
                println!("\n[!] unhandled fault {trap} va={va:#x} pc={pc:#x}");
                println!("    {}", sim.cpu.mmio.classify_pa(va));
                sim.cpu.stats.print();
                process::exit(1);
            }
            _ => {}
        }
    }

    println!("\n[!] tick budget exhausted");
    sim.cpu.stats.print();
    process::exit(1);
}

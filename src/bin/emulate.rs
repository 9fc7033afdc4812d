//! Command-line front end: loads a flat binary image into a fresh
//! [`Cpu`], attaches a [`ConsoleEnvironment`], and runs it to
//! completion (or drops into an interactive step monitor with
//! `--debug`).
//!
//! This reproduces `main.cpp`'s file-loading flow (open, read whole
//! file, report open/read failures, run, report the terminating
//! fault) even though the core specification places the front end out
//! of scope for the interpreter itself (`SPEC_FULL.md` §11).

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use clap_num::maybe_hex;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use riscvemu::console_env::ConsoleEnvironment;
use riscvemu::Cpu;

/// Default RAM size for the CLI front end: 64 MiB, matching
/// `main.cpp`'s `RISCV cpu(64 * 1024 * 1024)`. This is distinct from
/// [`riscvemu::memory::DEFAULT_RAM_SIZE`] (16 MiB), which is the
/// core's own default when no front end overrides it.
const CLI_DEFAULT_RAM_SIZE: usize = 64 * 1024 * 1024;

/// Emulate a 32-bit RISC-V (RV32IM) processor.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the flat binary program image
    input: String,

    /// RAM size in bytes (hex with 0x prefix, or decimal)
    #[arg(short, long, value_parser=maybe_hex::<usize>, default_value_t = CLI_DEFAULT_RAM_SIZE)]
    ram_size: usize,

    /// Address to load the program at and begin execution from (hex
    /// with 0x prefix, or decimal)
    #[arg(short, long, value_parser=maybe_hex::<u32>, default_value_t = 0)]
    start_addr: u32,

    /// Drop into an interactive step monitor instead of running to
    /// completion
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let program = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: cannot open '{}': {e}", args.input);
            return ExitCode::FAILURE;
        }
    };

    println!("Loading program: {} ({} bytes)", args.input, program.len());

    let mut cpu = Cpu::new(args.ram_size);
    if let Err(e) = cpu.load_program(&program, args.start_addr) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    cpu.set_environment(Box::new(ConsoleEnvironment::new()));

    println!("Starting execution...");
    println!("--- Program output ---\n");

    let result = if args.debug {
        run_debug_monitor(&mut cpu)
    } else {
        cpu.run()
    };

    match result {
        Ok(()) => {
            println!("\n--- End of program ---");
            println!("Program exited successfully.");
            ExitCode::SUCCESS
        }
        Err(fault) => {
            eprintln!("\nError during execution: {fault}");
            ExitCode::FAILURE
        }
    }
}

/// A small `step`/`continue`/`reg`/`mem`/`quit` command line built on
/// `rustyline`, used by `--debug` in place of a bare key-press loop.
fn run_debug_monitor(cpu: &mut Cpu) -> Result<(), riscvemu::Fault> {
    let mut editor = DefaultEditor::new().expect("failed to initialize line editor");
    println!("Entering debug monitor. Commands: step [n], continue, reg <i>, mem <addr>, quit");

    loop {
        if !cpu.is_running() {
            println!("Program is not running.");
            return Ok(());
        }

        let line = match editor.readline(&format!("(pc=0x{:08x}) > ", cpu.pc())) {
            Ok(line) => line,
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(()),
            Err(e) => {
                eprintln!("readline error: {e}");
                return Ok(());
            }
        };
        editor.add_history_entry(line.as_str()).ok();

        let mut words = line.split_whitespace();
        match words.next() {
            Some("step") | Some("s") | None => {
                let count: u32 = words.next().and_then(|w| w.parse().ok()).unwrap_or(1);
                for _ in 0..count {
                    if !cpu.is_running() {
                        break;
                    }
                    cpu.step()?;
                }
            }
            Some("continue") | Some("c") => return cpu.run(),
            Some("reg") | Some("r") => {
                if let Some(index) = words.next().and_then(|w| w.parse::<u32>().ok()) {
                    println!("x{index} = 0x{:08x}", cpu.get_reg(index));
                } else {
                    for i in 0..32 {
                        println!("x{i:<2} = 0x{:08x}", cpu.get_reg(i));
                    }
                }
            }
            Some("mem") | Some("m") => {
                if let Some(addr) = words.next().and_then(|w| u32::from_str_radix(w.trim_start_matches("0x"), 16).ok()) {
                    match cpu.load32(addr) {
                        Ok(value) => println!("0x{addr:08x}: 0x{value:08x}"),
                        Err(e) => println!("error: {e}"),
                    }
                } else {
                    println!("usage: mem <hex-addr>");
                }
            }
            Some("quit") | Some("q") => return Ok(()),
            Some(other) => println!("unknown command: {other}"),
        }
    }
}

//! The console [`Environment`](crate::environment::Environment) used by
//! the `emulate` binary: a host-provided I/O surface for the guest's
//! `ECALL`/`EBREAK` instructions, matching the thirteen syscalls of the
//! `SimpleEnvironment` this crate descends from.
//!
//! Program output goes to a generic [`io::Write`] sink chosen at
//! construction (normally [`io::stdout`]); unknown syscalls and EBREAK
//! are reported on [`io::stderr`] directly, following the teacher
//! pack's convention of plain `eprintln!`/`println!` diagnostics rather
//! than a logging crate (see `SPEC_FULL.md` §10.2).

use std::io::{self, Write};

use crate::cpu::Cpu;
use crate::environment::Environment;

/// a7 register: selects the syscall.
const REG_SYSCALL: u32 = 17;
/// a0 register: primary argument / return value.
const REG_A0: u32 = 10;
/// a1 register: secondary argument.
const REG_A1: u32 = 11;

/// Formats requested by syscall 8 ("print formatted number").
const FORMAT_DEC: u32 = 0;
const FORMAT_HEX: u32 = 1;
const FORMAT_BIN: u32 = 2;
const FORMAT_CHAR: u32 = 3;

/// The console environment: services ECALL with the fixed syscall table
/// from `SPEC_FULL.md` §11, and stops the CPU on EBREAK.
pub struct ConsoleEnvironment<W: Write> {
    out: W,
}

impl ConsoleEnvironment<io::Stdout> {
    /// Construct a console environment writing to standard output.
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleEnvironment<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleEnvironment<W> {
    /// Construct a console environment writing guest output to `out`,
    /// for tests that want to capture output instead of printing it.
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    fn print_binary(&mut self, value: u32) {
        write!(self.out, "0b").ok();
        for i in (0..32).rev() {
            write!(self.out, "{}", (value >> i) & 1).ok();
            if i > 0 && i % 4 == 0 {
                write!(self.out, "'").ok();
            }
        }
    }

    fn print_formatted(&mut self, value: u32, format: u32) {
        match format {
            FORMAT_DEC => write!(self.out, "{}", value as i32).ok(),
            FORMAT_HEX => write!(self.out, "0x{value:x}").ok(),
            FORMAT_BIN => {
                self.print_binary(value);
                None
            }
            FORMAT_CHAR => write!(self.out, "{}", (value & 0xff) as u8 as char).ok(),
            _ => write!(self.out, "{}", value as i32).ok(),
        };
    }

    fn print_string(&mut self, cpu: &Cpu, addr: u32) {
        let mut addr = addr;
        loop {
            match cpu.load8(addr) {
                Ok(0) | Err(_) => break,
                Ok(byte) => {
                    write!(self.out, "{}", byte as char).ok();
                    addr = addr.wrapping_add(1);
                }
            }
        }
    }

    fn print_string_with_len(&mut self, cpu: &Cpu, addr: u32, len: u32) {
        if let Ok(bytes) = cpu.memory_slice(addr, len) {
            for byte in bytes {
                write!(self.out, "{}", *byte as char).ok();
            }
        }
    }

    fn print_hex_dump(&mut self, cpu: &Cpu, addr: u32, len: u32) {
        for i in 0..len {
            if i % 16 == 0 {
                if i > 0 {
                    writeln!(self.out).ok();
                }
                write!(self.out, "0x{:08x}: ", addr.wrapping_add(i)).ok();
            }
            let byte = cpu.load8(addr.wrapping_add(i)).unwrap_or(0);
            write!(self.out, "{byte:02x} ").ok();
        }
        writeln!(self.out).ok();
    }

    fn print_register_dump(&mut self, cpu: &Cpu) {
        writeln!(self.out, "\nRegister dump:").ok();
        for i in 0..32u32 {
            if i % 4 == 0 {
                writeln!(self.out).ok();
            }
            write!(self.out, "x{i:2} = 0x{:08x}  ", cpu.get_reg(i)).ok();
        }
        writeln!(self.out).ok();
    }
}

impl<W: Write> Environment for ConsoleEnvironment<W> {
    fn on_ecall(&mut self, cpu: &mut Cpu) {
        let syscall = cpu.get_reg(REG_SYSCALL);
        let a0 = cpu.get_reg(REG_A0);
        let a1 = cpu.get_reg(REG_A1);

        match syscall {
            0 => {
                write!(self.out, "{}", (a0 & 0xff) as u8 as char).ok();
            }
            1 => {
                write!(self.out, "{}", a0 as i32).ok();
            }
            2 => {
                write!(self.out, "0x{a0:x}").ok();
            }
            3 => self.print_binary(a0),
            4 => self.print_string(cpu, a0),
            5 => self.print_string_with_len(cpu, a0, a1),
            6 => {
                writeln!(self.out).ok();
            }
            7 => {
                write!(self.out, " ").ok();
            }
            8 => self.print_formatted(a0, a1),
            9 => self.print_hex_dump(cpu, a0, a1),
            10 => cpu.stop(),
            11 => self.print_register_dump(cpu),
            12 => {
                write!(self.out, "0x{:08x}", cpu.pc()).ok();
            }
            other => {
                eprintln!("Unknown syscall: {other}");
                cpu.stop();
            }
        }
        self.out.flush().ok();
    }

    fn on_ebreak(&mut self, cpu: &mut Cpu) {
        eprintln!("EBREAK encountered at pc=0x{:08x}", cpu.pc());
        cpu.stop();
    }
}

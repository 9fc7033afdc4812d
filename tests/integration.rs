//! End-to-end scenarios from `SPEC_FULL.md` §8, exercised against the
//! public crate surface rather than internal opcode tables, following
//! the `burjui-risky` crate's convention of a top-level
//! `tests/integration.rs` covering whole-program behavior.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use riscvemu::console_env::ConsoleEnvironment;
use riscvemu::Cpu;

const OP_IMM: u32 = 0b001_0011;
const OP: u32 = 0b011_0011;
const OP_STORE: u32 = 0b010_0011;
const OP_LOAD: u32 = 0b000_0011;
const OP_SYSTEM: u32 = 0b111_0011;

fn encode_i(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm12: u32) -> u32 {
    (imm12 & 0xfff) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

fn encode_r(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    funct7 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

fn encode_s(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm12: u32) -> u32 {
    let imm = imm12 & 0xfff;
    let hi = (imm >> 5) & 0x7f;
    let lo = imm & 0x1f;
    hi << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | lo << 7 | opcode
}

fn ecall() -> u32 {
    OP_SYSTEM
}

/// An `io::Write` sink shared with the test so guest output can be
/// inspected after `Cpu::run` returns the environment's ownership to
/// the CPU.
#[derive(Clone)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn program_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[test]
fn register_zero_is_read_only() {
    let buffer = SharedBuffer(Rc::new(RefCell::new(Vec::new())));
    let mut cpu = Cpu::new(1024);
    let addi_x0_x0_5 = encode_i(OP_IMM, 0, 0, 0, 5);
    let words = program_bytes(&[addi_x0_x0_5, ecall()]);
    cpu.load_program(&words, 0).unwrap();
    cpu.set_reg(17, 1); // a7 = print signed decimal
    cpu.set_environment(Box::new(ConsoleEnvironment::with_writer(buffer.clone())));

    cpu.step().unwrap(); // ADDI x0, x0, 5
    assert_eq!(cpu.get_reg(0), 0);
    cpu.step().unwrap(); // ECALL

    assert_eq!(buffer.0.borrow().as_slice(), b"0");
}

#[test]
fn signed_division_overflow_yields_dividend() {
    let mut cpu = Cpu::new(1024);
    let div_x7_x5_x6 = encode_r(OP, 7, 0x4, 5, 6, 0x01);
    cpu.load_program(&div_x7_x5_x6.to_le_bytes(), 0).unwrap();
    cpu.set_reg(5, 0x8000_0000);
    cpu.set_reg(6, 0xffff_ffff);
    cpu.step().unwrap();
    assert_eq!(cpu.get_reg(7), 0x8000_0000);
}

#[test]
fn division_by_zero_and_remainder() {
    let mut cpu = Cpu::new(1024);
    let div_x7_x5_x6 = encode_r(OP, 7, 0x4, 5, 6, 0x01);
    let rem_x8_x5_x6 = encode_r(OP, 8, 0x6, 5, 6, 0x01);
    let words = program_bytes(&[div_x7_x5_x6, rem_x8_x5_x6]);
    cpu.load_program(&words, 0).unwrap();
    cpu.set_reg(5, 42);
    cpu.set_reg(6, 0);
    cpu.step().unwrap();
    assert_eq!(cpu.get_reg(7), 0xffff_ffff);
    cpu.step().unwrap();
    assert_eq!(cpu.get_reg(8), 42);
}

#[test]
fn mulh_sign_versus_mulhu() {
    let mut cpu = Cpu::new(1024);
    let mulh_x7_x5_x6 = encode_r(OP, 7, 0x1, 5, 6, 0x01);
    let mulhu_x7_x5_x6 = encode_r(OP, 7, 0x3, 5, 6, 0x01);
    let minus_one = 0xffff_ffffu32;

    cpu.load_program(&mulh_x7_x5_x6.to_le_bytes(), 0).unwrap();
    cpu.set_reg(5, minus_one);
    cpu.set_reg(6, minus_one);
    cpu.step().unwrap();
    assert_eq!(cpu.get_reg(7), 0);

    cpu.load_program(&mulhu_x7_x5_x6.to_le_bytes(), 4).unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.get_reg(7), 0xffff_fffe);
}

#[test]
fn little_endian_store_then_byte_loads() {
    let mut cpu = Cpu::new(1024);
    // SW x6, 0(x5); x5 = 0x1000, x6 = 0x11223344
    let sw = encode_s(OP_STORE, 0x2, 5, 6, 0);
    cpu.load_program(&sw.to_le_bytes(), 0).unwrap();
    cpu.set_reg(5, 0x1000);
    cpu.set_reg(6, 0x1122_3344);
    cpu.step().unwrap();

    assert_eq!(cpu.load8(0x1000).unwrap(), 0x44);
    assert_eq!(cpu.load8(0x1001).unwrap(), 0x33);
    assert_eq!(cpu.load8(0x1002).unwrap(), 0x22);
    assert_eq!(cpu.load8(0x1003).unwrap(), 0x11);

    // LBU x7, 0(x5) .. LBU x10, 3(x5)
    let lbu = |rd: u32, offset: u32| encode_i(OP_LOAD, rd, 0x4, 5, offset);
    let words = program_bytes(&[lbu(7, 0), lbu(8, 1), lbu(9, 2), lbu(10, 3)]);
    cpu.load_program(&words, 0x1000).unwrap();
    for _ in 0..4 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.get_reg(7), 0x44);
    assert_eq!(cpu.get_reg(8), 0x33);
    assert_eq!(cpu.get_reg(9), 0x22);
    assert_eq!(cpu.get_reg(10), 0x11);
}

#[test]
fn hello_print_via_syscalls_then_terminates() {
    let buffer = SharedBuffer(Rc::new(RefCell::new(Vec::new())));
    let mut cpu = Cpu::new(4096);
    cpu.reset();
    cpu.store8(0x100, b'H').unwrap();
    cpu.store8(0x101, b'i').unwrap();
    cpu.store8(0x102, 0).unwrap();
    cpu.set_environment(Box::new(ConsoleEnvironment::with_writer(buffer.clone())));

    cpu.set_reg(10, 0x100); // a0
    cpu.set_reg(17, 4); // a7 = print string
    cpu.load_program(&ecall().to_le_bytes(), 0x200).unwrap();
    cpu.step().unwrap();
    assert!(cpu.is_running());

    cpu.set_reg(17, 10); // a7 = exit
    cpu.load_program(&ecall().to_le_bytes(), 0x204).unwrap();
    cpu.step().unwrap();

    assert_eq!(buffer.0.borrow().as_slice(), b"Hi");
    assert!(!cpu.is_running());
}

#[test]
fn run_stops_at_self_branch_once_hook_requests_exit() {
    // BEQ x0, x0, 0 forms an infinite self-loop; exercised here only to
    // show `run` would spin forever without an external `stop`, so the
    // test drives it through `step` and asserts the pc never advances.
    let mut cpu = Cpu::new(64);
    let beq_self = 0b110_0011; // all fields zero: BEQ x0, x0, 0
    cpu.load_program(&beq_self.to_le_bytes(), 0).unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0);
    cpu.stop();
    assert!(!cpu.is_running());
}

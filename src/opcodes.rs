//! 7-bit opcode and funct3/funct7 constants, named after the RISC-V
//! unprivileged specification's instruction mnemonics.

pub const OP_LUI: u32 = 0b011_0111;
pub const OP_AUIPC: u32 = 0b001_0111;
pub const OP_JAL: u32 = 0b110_1111;
pub const OP_JALR: u32 = 0b110_0111;
pub const OP_BRANCH: u32 = 0b110_0011;
pub const OP_LOAD: u32 = 0b000_0011;
pub const OP_STORE: u32 = 0b010_0011;
pub const OP_IMM: u32 = 0b001_0011;
pub const OP: u32 = 0b011_0011;
pub const OP_MISC_MEM: u32 = 0b000_1111;
pub const OP_SYSTEM: u32 = 0b111_0011;

// BRANCH funct3
pub const FUNCT3_BEQ: u32 = 0x0;
pub const FUNCT3_BNE: u32 = 0x1;
pub const FUNCT3_BLT: u32 = 0x4;
pub const FUNCT3_BGE: u32 = 0x5;
pub const FUNCT3_BLTU: u32 = 0x6;
pub const FUNCT3_BGEU: u32 = 0x7;

// LOAD/STORE funct3
pub const FUNCT3_B: u32 = 0x0;
pub const FUNCT3_H: u32 = 0x1;
pub const FUNCT3_W: u32 = 0x2;
pub const FUNCT3_BU: u32 = 0x4;
pub const FUNCT3_HU: u32 = 0x5;

// OP-IMM / OP funct3 (shared mnemonics for the register-register forms)
pub const FUNCT3_ADDI: u32 = 0x0;
pub const FUNCT3_SLLI: u32 = 0x1;
pub const FUNCT3_SLTI: u32 = 0x2;
pub const FUNCT3_SLTIU: u32 = 0x3;
pub const FUNCT3_XORI: u32 = 0x4;
pub const FUNCT3_SRLI_SRAI: u32 = 0x5;
pub const FUNCT3_ORI: u32 = 0x6;
pub const FUNCT3_ANDI: u32 = 0x7;

pub const FUNCT3_ADD_SUB: u32 = 0x0;
pub const FUNCT3_SLL: u32 = 0x1;
pub const FUNCT3_SLT: u32 = 0x2;
pub const FUNCT3_SLTU: u32 = 0x3;
pub const FUNCT3_XOR: u32 = 0x4;
pub const FUNCT3_SRL_SRA: u32 = 0x5;
pub const FUNCT3_OR: u32 = 0x6;
pub const FUNCT3_AND: u32 = 0x7;

pub const FUNCT7_ADD: u32 = 0x00;
pub const FUNCT7_SUB: u32 = 0x20;
pub const FUNCT7_SRL: u32 = 0x00;
pub const FUNCT7_SRA: u32 = 0x20;

// RV32M: OP with funct7 = 0x01, dispatched by funct3
pub const FUNCT7_MULDIV: u32 = 0x01;
pub const FUNCT3_MUL: u32 = 0x0;
pub const FUNCT3_MULH: u32 = 0x1;
pub const FUNCT3_MULHSU: u32 = 0x2;
pub const FUNCT3_MULHU: u32 = 0x3;
pub const FUNCT3_DIV: u32 = 0x4;
pub const FUNCT3_DIVU: u32 = 0x5;
pub const FUNCT3_REM: u32 = 0x6;
pub const FUNCT3_REMU: u32 = 0x7;

// SYSTEM
pub const FUNCT3_PRIV: u32 = 0x0;
pub const IMM_ECALL: u32 = 0x000;
pub const IMM_EBREAK: u32 = 0x001;

use thiserror::Error;

use crate::memory::{MemoryError, ProgramTooLarge};

/// The fault taxonomy from the engine's error handling design: every
/// condition a guest program can trigger that the engine itself treats
/// as non-recoverable for the current step. `step`/`run` surface these
/// to the caller instead of panicking or looping forever; RISC-V-defined
/// non-errors (division by zero, signed overflow, misaligned access)
/// never appear here because they are not faults.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("fetch out of bounds at pc=0x{pc:08x}")]
    FetchOutOfBounds { pc: u32 },

    #[error("load out of bounds: {0}")]
    LoadOutOfBounds(MemoryError),

    #[error("store out of bounds: {0}")]
    StoreOutOfBounds(MemoryError),

    #[error("unknown opcode 0b{opcode:07b} at pc=0x{pc:08x}")]
    UnknownOpcode { opcode: u32, pc: u32 },

    #[error("unknown funct3 {funct3:#05b} for opcode 0b{opcode:07b} at pc=0x{pc:08x}")]
    UnknownFunct3 { opcode: u32, funct3: u32, pc: u32 },

    #[error("unknown funct7 {funct7:#09b} for opcode 0b{opcode:07b}/funct3 {funct3:#05b} at pc=0x{pc:08x}")]
    UnknownFunct7 {
        opcode: u32,
        funct3: u32,
        funct7: u32,
        pc: u32,
    },

    #[error("unsupported SYSTEM encoding at pc=0x{pc:08x} (only ECALL/EBREAK are implemented)")]
    UnsupportedSystem { pc: u32 },

    #[error("program too large: {0}")]
    ProgramTooLarge(ProgramTooLarge),
}

impl From<ProgramTooLarge> for Fault {
    fn from(e: ProgramTooLarge) -> Self {
        Fault::ProgramTooLarge(e)
    }
}

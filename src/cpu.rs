use crate::decode::{funct3, funct7, imm_b, imm_i, imm_j, imm_s, imm_u, opcode, rd, rs1, rs2, shamt};
use crate::environment::Environment;
use crate::error::Fault;
use crate::memory::Memory;
use crate::opcodes::*;
use crate::registers::Registers;

/// A RISC-V hardware thread implementing RV32IM in user mode.
///
/// `Cpu` owns its register file, program counter, running flag and
/// memory, and holds at most one [`Environment`] to service ECALL and
/// EBREAK. Call [`Cpu::load_program`] to install an image, then
/// [`Cpu::step`] or [`Cpu::run`] to execute it.
pub struct Cpu {
    registers: Registers,
    pc: u32,
    running: bool,
    memory: Memory,
    environment: Option<Box<dyn Environment>>,
}

impl Cpu {
    /// Construct a CPU with `ram_size` bytes of zeroed memory, no
    /// environment attached, and the running flag false until `reset`
    /// or `load_program` is called.
    pub fn new(ram_size: usize) -> Self {
        Self {
            registers: Registers::new(),
            pc: 0,
            running: false,
            memory: Memory::new(ram_size),
            environment: None,
        }
    }

    /// Zero the register file and program counter, and set the running
    /// flag. Memory contents are left untouched.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.pc = 0;
        self.running = true;
    }

    /// Copy `bytes` into memory at `start_addr` and set the program
    /// counter to `start_addr`. Also sets the running flag, matching the
    /// original interpreter's behavior of being ready to run immediately
    /// after a program is loaded.
    pub fn load_program(&mut self, bytes: &[u8], start_addr: u32) -> Result<(), Fault> {
        self.memory.load_program(bytes, start_addr)?;
        self.pc = start_addr;
        self.running = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn get_reg(&self, index: u32) -> u32 {
        self.registers.get(index)
    }

    pub fn set_reg(&mut self, index: u32, value: u32) {
        self.registers.set(index, value)
    }

    pub fn load8(&self, addr: u32) -> Result<u8, crate::memory::MemoryError> {
        self.memory.load8(addr)
    }

    pub fn load16(&self, addr: u32) -> Result<u16, crate::memory::MemoryError> {
        self.memory.load16(addr)
    }

    pub fn load32(&self, addr: u32) -> Result<u32, crate::memory::MemoryError> {
        self.memory.load32(addr)
    }

    pub fn store8(&mut self, addr: u32, value: u8) -> Result<(), crate::memory::MemoryError> {
        self.memory.store8(addr, value)
    }

    pub fn store16(&mut self, addr: u32, value: u16) -> Result<(), crate::memory::MemoryError> {
        self.memory.store16(addr, value)
    }

    pub fn store32(&mut self, addr: u32, value: u32) -> Result<(), crate::memory::MemoryError> {
        self.memory.store32(addr, value)
    }

    /// Read `len` bytes starting at `addr`, for environment hooks that
    /// print strings or memory dumps.
    pub fn memory_slice(&self, addr: u32, len: u32) -> Result<&[u8], crate::memory::MemoryError> {
        self.memory.slice(addr, len)
    }

    /// Attach (or replace) the environment hook used to service ECALL
    /// and EBREAK. Only meaningful between steps; the CPU is not
    /// re-entrant during a step.
    pub fn set_environment(&mut self, environment: Box<dyn Environment>) {
        self.environment = Some(environment);
    }

    /// Detach and return the environment hook, if any.
    pub fn take_environment(&mut self) -> Option<Box<dyn Environment>> {
        self.environment.take()
    }

    /// Execute a single instruction: fetch, advance pc by 4, dispatch,
    /// then force x0 back to zero.
    pub fn step(&mut self) -> Result<(), Fault> {
        let this_pc = self.pc;
        let instr = self
            .memory
            .load32(this_pc)
            .map_err(|_| Fault::FetchOutOfBounds { pc: this_pc })?;
        self.pc = self.pc.wrapping_add(4);

        self.execute(instr, this_pc)?;

        self.registers.zero_x0();
        Ok(())
    }

    /// Step until the running flag clears. Propagates the first fault
    /// encountered; the caller decides whether to resume.
    pub fn run(&mut self) -> Result<(), Fault> {
        while self.running {
            self.step()?;
        }
        Ok(())
    }

    fn execute(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        let op = opcode(instr);
        match op {
            OP_LUI => {
                self.registers.set(rd(instr), imm_u(instr));
            }
            OP_AUIPC => {
                self.registers.set(rd(instr), this_pc.wrapping_add(imm_u(instr)));
            }
            OP_JAL => {
                self.registers.set(rd(instr), self.pc);
                self.pc = this_pc.wrapping_add(imm_j(instr) as u32);
            }
            OP_JALR => {
                let base = self.registers.get(rs1(instr));
                let target = base.wrapping_add(imm_i(instr) as u32) & !1u32;
                self.registers.set(rd(instr), self.pc);
                self.pc = target;
            }
            OP_BRANCH => self.execute_branch(instr, this_pc)?,
            OP_IMM => self.execute_op_imm(instr, this_pc)?,
            OP => self.execute_op(instr, this_pc)?,
            OP_LOAD => self.execute_load(instr, this_pc)?,
            OP_STORE => self.execute_store(instr, this_pc)?,
            OP_MISC_MEM => {
                // FENCE: single-threaded semantics, nothing to order.
            }
            OP_SYSTEM => self.execute_system(instr, this_pc)?,
            _ => return Err(Fault::UnknownOpcode { opcode: op, pc: this_pc }),
        }
        Ok(())
    }

    fn execute_branch(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        let a = self.registers.get(rs1(instr));
        let b = self.registers.get(rs2(instr));
        let taken = match funct3(instr) {
            FUNCT3_BEQ => a == b,
            FUNCT3_BNE => a != b,
            FUNCT3_BLT => (a as i32) < (b as i32),
            FUNCT3_BGE => (a as i32) >= (b as i32),
            FUNCT3_BLTU => a < b,
            FUNCT3_BGEU => a >= b,
            f => {
                return Err(Fault::UnknownFunct3 {
                    opcode: OP_BRANCH,
                    funct3: f,
                    pc: this_pc,
                })
            }
        };
        if taken {
            self.pc = this_pc.wrapping_add(imm_b(instr) as u32);
        }
        Ok(())
    }

    fn execute_op_imm(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        let src = self.registers.get(rs1(instr));
        let imm = imm_i(instr);
        let value = match funct3(instr) {
            FUNCT3_ADDI => src.wrapping_add(imm as u32),
            FUNCT3_SLTI => ((src as i32) < imm) as u32,
            FUNCT3_SLTIU => (src < (imm as u32)) as u32,
            FUNCT3_XORI => src ^ (imm as u32),
            FUNCT3_ORI => src | (imm as u32),
            FUNCT3_ANDI => src & (imm as u32),
            FUNCT3_SLLI => src << (shamt(instr) & 0x1f),
            FUNCT3_SRLI_SRAI => {
                let amount = shamt(instr) & 0x1f;
                if (instr >> 30) & 1 == 1 {
                    ((src as i32) >> amount) as u32
                } else {
                    src >> amount
                }
            }
            f => {
                return Err(Fault::UnknownFunct3 {
                    opcode: OP_IMM,
                    funct3: f,
                    pc: this_pc,
                })
            }
        };
        self.registers.set(rd(instr), value);
        Ok(())
    }

    fn execute_op(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        let f7 = funct7(instr);
        let f3 = funct3(instr);
        let a = self.registers.get(rs1(instr));
        let b = self.registers.get(rs2(instr));

        let value = if f7 & 1 == 0 {
            match f3 {
                FUNCT3_ADD_SUB => match f7 {
                    FUNCT7_ADD => a.wrapping_add(b),
                    FUNCT7_SUB => a.wrapping_sub(b),
                    _ => {
                        return Err(Fault::UnknownFunct7 {
                            opcode: OP,
                            funct3: f3,
                            funct7: f7,
                            pc: this_pc,
                        })
                    }
                },
                FUNCT3_SLL => a << (b & 0x1f),
                FUNCT3_SLT => ((a as i32) < (b as i32)) as u32,
                FUNCT3_SLTU => (a < b) as u32,
                FUNCT3_XOR => a ^ b,
                FUNCT3_SRL_SRA => match f7 {
                    FUNCT7_SRL => a >> (b & 0x1f),
                    FUNCT7_SRA => ((a as i32) >> (b & 0x1f)) as u32,
                    _ => {
                        return Err(Fault::UnknownFunct7 {
                            opcode: OP,
                            funct3: f3,
                            funct7: f7,
                            pc: this_pc,
                        })
                    }
                },
                FUNCT3_OR => a | b,
                FUNCT3_AND => a & b,
                f => {
                    return Err(Fault::UnknownFunct3 {
                        opcode: OP,
                        funct3: f,
                        pc: this_pc,
                    })
                }
            }
        } else if f7 == FUNCT7_MULDIV {
            execute_muldiv(f3, a, b).ok_or(Fault::UnknownFunct3 {
                opcode: OP,
                funct3: f3,
                pc: this_pc,
            })?
        } else {
            return Err(Fault::UnknownFunct7 {
                opcode: OP,
                funct3: f3,
                funct7: f7,
                pc: this_pc,
            });
        };

        self.registers.set(rd(instr), value);
        Ok(())
    }

    fn execute_load(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        let addr = self.registers.get(rs1(instr)).wrapping_add(imm_i(instr) as u32);
        let value = match funct3(instr) {
            FUNCT3_B => self.memory.load8(addr).map(|v| (v as i8 as i32) as u32),
            FUNCT3_H => self.memory.load16(addr).map(|v| (v as i16 as i32) as u32),
            FUNCT3_W => self.memory.load32(addr),
            FUNCT3_BU => self.memory.load8(addr).map(|v| v as u32),
            FUNCT3_HU => self.memory.load16(addr).map(|v| v as u32),
            f => {
                return Err(Fault::UnknownFunct3 {
                    opcode: OP_LOAD,
                    funct3: f,
                    pc: this_pc,
                })
            }
        }
        .map_err(Fault::LoadOutOfBounds)?;
        self.registers.set(rd(instr), value);
        Ok(())
    }

    fn execute_store(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        let addr = self.registers.get(rs1(instr)).wrapping_add(imm_s(instr) as u32);
        let value = self.registers.get(rs2(instr));
        match funct3(instr) {
            FUNCT3_B => self.memory.store8(addr, value as u8),
            FUNCT3_H => self.memory.store16(addr, value as u16),
            FUNCT3_W => self.memory.store32(addr, value),
            f => {
                return Err(Fault::UnknownFunct3 {
                    opcode: OP_STORE,
                    funct3: f,
                    pc: this_pc,
                })
            }
        }
        .map_err(Fault::StoreOutOfBounds)
    }

    fn execute_system(&mut self, instr: u32, this_pc: u32) -> Result<(), Fault> {
        if funct3(instr) != FUNCT3_PRIV {
            return Err(Fault::UnsupportedSystem { pc: this_pc });
        }
        match instr >> 20 {
            IMM_ECALL => {
                if let Some(mut env) = self.environment.take() {
                    env.on_ecall(self);
                    self.environment = Some(env);
                } else {
                    self.running = false;
                }
                Ok(())
            }
            IMM_EBREAK => {
                eprintln!("EBREAK instruction at pc=0x{this_pc:08x}");
                if let Some(mut env) = self.environment.take() {
                    env.on_ebreak(self);
                    self.environment = Some(env);
                } else {
                    self.running = false;
                }
                Ok(())
            }
            _ => Err(Fault::UnsupportedSystem { pc: this_pc }),
        }
    }
}

/// The RV32M multiply/divide instructions, dispatched by funct3 once the
/// OP opcode's funct7 has identified the extension (funct7 == 1).
/// Returns `None` for an unrecognized funct3.
fn execute_muldiv(funct3: u32, a: u32, b: u32) -> Option<u32> {
    let signed_a = a as i32;
    let signed_b = b as i32;
    Some(match funct3 {
        FUNCT3_MUL => ((signed_a as i64).wrapping_mul(signed_b as i64)) as u32,
        FUNCT3_MULH => (((signed_a as i64) * (signed_b as i64)) >> 32) as u32,
        FUNCT3_MULHSU => (((signed_a as i64) * (b as i64)) >> 32) as u32,
        FUNCT3_MULHU => (((a as u64) * (b as u64)) >> 32) as u32,
        FUNCT3_DIV => {
            if signed_b == 0 {
                0xffff_ffff
            } else if signed_a == i32::MIN && signed_b == -1 {
                signed_a as u32
            } else {
                (signed_a / signed_b) as u32
            }
        }
        FUNCT3_DIVU => {
            if b == 0 {
                0xffff_ffff
            } else {
                a / b
            }
        }
        FUNCT3_REM => {
            if signed_b == 0 {
                signed_a as u32
            } else if signed_a == i32::MIN && signed_b == -1 {
                0
            } else {
                (signed_a % signed_b) as u32
            }
        }
        FUNCT3_REMU => {
            if b == 0 {
                a
            } else {
                a % b
            }
        }
        _ => return None,
    })
}

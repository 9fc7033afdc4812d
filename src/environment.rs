use crate::cpu::Cpu;

/// A host-provided service for the guest's environment-call instructions.
///
/// This mirrors the abstract `Environment` base class in the original
/// interpreter: a small capability with two operations, invoked by the
/// CPU when the guest executes the corresponding SYSTEM instruction. The
/// CPU holds at most one `Environment` at a time and never inspects what
/// it does beyond re-enforcing that x0 reads as zero afterwards.
///
/// Implementations may read and write guest registers and memory through
/// `cpu`, and may call `cpu.stop()` to request termination.
pub trait Environment {
    /// Called when the guest executes `ECALL`.
    fn on_ecall(&mut self, cpu: &mut Cpu);

    /// Called when the guest executes `EBREAK`. The default reaction,
    /// matching the original interpreter, is simply to stop.
    fn on_ebreak(&mut self, cpu: &mut Cpu) {
        cpu.stop();
    }
}

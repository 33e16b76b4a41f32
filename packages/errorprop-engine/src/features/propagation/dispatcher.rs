//! Opcode dispatch
//!
//! Every instruction is first seeded from its annotation: a range alone
//! becomes the result range, an initial error pins the value entirely.
//! The closed [`Opcode`] tag then selects the transfer function.

use super::context::{ActivationState, CallAnalyzer, InstructionPropagator};
use crate::errors::Result;
use crate::features::flow_graph::PhiMode;
use crate::shared::ir::{BlockId, Instruction, Opcode};
use crate::shared::models::FPInterval;

impl<'a> InstructionPropagator<'a> {
    /// Compute the range/error of one instruction.
    ///
    /// `Ok(false)` means an operand had no data and nothing was written.
    pub fn propagate(
        &self,
        state: &mut ActivationState,
        calls: &mut dyn CallAnalyzer,
        inst: &Instruction,
        phi_mode: PhiMode,
    ) -> Result<bool> {
        if state.pinned.contains(&inst.id) {
            return Ok(true);
        }
        if let Some(info) = inst.scalar_info() {
            let key = self.key(inst);
            if info.initial_error.is_some() {
                state.store.seed_from_info(key, info);
                return Ok(true);
            }
            let range = info
                .interval()
                .unwrap_or_else(|| FPInterval::point(info.format, 0.0));
            state.store.set_range(key, range);
        }

        match inst.opcode() {
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::SDiv
            | Opcode::UDiv
            | Opcode::Shl
            | Opcode::LShr
            | Opcode::AShr
            | Opcode::FAdd
            | Opcode::FSub
            | Opcode::FMul
            | Opcode::FDiv
            // Remainders and bitwise operations end in the binary handler's unsupported arm
            | Opcode::SRem
            | Opcode::URem
            | Opcode::FRem
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor => self.propagate_binary(state, inst),
            Opcode::Trunc
            | Opcode::ZExt
            | Opcode::SExt
            | Opcode::FpToUi
            | Opcode::FpToSi
            | Opcode::UiToFp
            | Opcode::SiToFp
            | Opcode::FpTrunc
            | Opcode::FpExt
            | Opcode::BitCast => self.propagate_cast(state, inst),
            Opcode::ICmp | Opcode::FCmp => self.check_cmp(state, inst),
            Opcode::Select => self.propagate_select(state, inst),
            Opcode::Phi => self.propagate_phi(state, inst, phi_mode),
            Opcode::Alloca => self.propagate_alloca(state, inst),
            Opcode::Load => self.propagate_load(state, inst),
            Opcode::Store => self.propagate_store(state, inst),
            Opcode::GetElementPtr => self.propagate_gep(state, inst),
            Opcode::Call | Opcode::Invoke => self.propagate_call(state, calls, inst),
            Opcode::Ret => self.propagate_ret(state, inst),
            Opcode::Br | Opcode::CondBr | Opcode::Unreachable => Ok(false),
        }
    }

    /// Propagate every instruction of `block`, in order
    pub fn propagate_block(
        &self,
        state: &mut ActivationState,
        calls: &mut dyn CallAnalyzer,
        block: BlockId,
        phi_mode: PhiMode,
    ) -> Result<usize> {
        let mut computed = 0;
        for inst in self.func.block_insts(block) {
            if self.propagate(state, calls, inst, phi_mode)? {
                computed += 1;
            }
        }
        Ok(computed)
    }
}

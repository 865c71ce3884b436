#![cfg(not(target_arch = "wasm32"))]
//! Cross-validation tests: encode with arm64-asm, decode with yaxpeax-arm.
//!
//! Every record is assembled on its own (plus a trailing `RET` when it
//! needs a branch target), and the first emitted word is decoded by an
//! independent AArch64 decoder. The decoded opcode must match.

use arm64_asm::{assemble, Cond, Inst, MemRef, Mnemonic, Operand, Program, Reg};
use yaxpeax_arch::{Decoder as _, U8Reader};
use yaxpeax_arm::armv8::a64::{InstDecoder, Opcode};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn r(n: u8) -> Operand {
    Operand::Reg(Reg::r(n))
}

fn mem(base: u8, off: i64) -> Operand {
    Operand::Mem(MemRef::reg(Reg::r(base), off))
}

/// Decode the first word of `inst` assembled at PC 0. Branch records are
/// pointed at a `RET` placed right after them.
fn asm_and_decode(inst: Inst) -> (Opcode, String) {
    let text = inst.to_string();
    let mut prog = Program::new(0);
    let needs_target = inst.to == Operand::Branch;
    let id = prog.push(inst);
    if needs_target {
        let ret = prog.push(Inst::new(Mnemonic::Ret));
        prog.set_target(id, ret);
    }
    let out = assemble(&mut prog).unwrap_or_else(|e| panic!("arm64-asm failed: `{text}`: {e}"));
    let word = out.insts[0].words[0];
    let bytes = word.to_le_bytes();

    let decoder = InstDecoder::default();
    let mut reader = U8Reader::new(&bytes);
    let decoded = decoder.decode(&mut reader).unwrap_or_else(|e| {
        panic!("yaxpeax-arm failed to decode `{text}` → {word:#010x}: {e}")
    });
    (decoded.opcode, format!("{}", decoded))
}

/// Verify the yaxpeax-arm opcode matches expected.
fn verify(inst: Inst, expected: Opcode) {
    let text = inst.to_string();
    let (opcode, formatted) = asm_and_decode(inst);
    assert_eq!(
        opcode, expected,
        "opcode mismatch for `{text}`: yaxpeax decoded `{formatted}`"
    );
}

/// Three-register data processing, `op Rm, Rn, Rd`.
fn rrr(m: Mnemonic) -> Inst {
    Inst::new(m).with_from(r(2)).with_reg(Reg::r(1)).with_to(r(0))
}

/// Two-register data processing, `op Rn, Rd`.
fn rr(m: Mnemonic) -> Inst {
    Inst::new(m).with_from(r(1)).with_to(r(0))
}

// ─── Add/subtract ─────────────────────────────────────────────────────────────

#[test]
fn add_register() {
    verify(rrr(Mnemonic::Add), Opcode::ADD);
}

#[test]
fn sub_register() {
    verify(rrr(Mnemonic::Sub), Opcode::SUB);
}

#[test]
fn adds_register() {
    verify(rrr(Mnemonic::Adds), Opcode::ADDS);
}

#[test]
fn subs_register() {
    verify(rrr(Mnemonic::Subs), Opcode::SUBS);
}

#[test]
fn add_immediate() {
    verify(
        Inst::new(Mnemonic::Add)
            .with_from(Operand::Imm(42))
            .with_reg(Reg::r(1))
            .with_to(r(0)),
        Opcode::ADD,
    );
}

#[test]
fn sub_shifted_immediate() {
    verify(
        Inst::new(Mnemonic::Sub)
            .with_from(Operand::Imm(0x5000))
            .with_to(Operand::Reg(Reg::SP)),
        Opcode::SUB,
    );
}

#[test]
fn add_w_register() {
    verify(rrr(Mnemonic::AddW), Opcode::ADD);
}

#[test]
fn compare_is_subs_to_zero_register() {
    let (opcode, text) = asm_and_decode(
        Inst::new(Mnemonic::Cmp)
            .with_from(Operand::Imm(7))
            .with_reg(Reg::r(3)),
    );
    assert_eq!(opcode, Opcode::SUBS, "decoded `{text}`");
}

// ─── Logical ──────────────────────────────────────────────────────────────────

#[test]
fn and_register() {
    verify(rrr(Mnemonic::And), Opcode::AND);
}

#[test]
fn orr_register() {
    verify(rrr(Mnemonic::Orr), Opcode::ORR);
}

#[test]
fn eor_register() {
    verify(rrr(Mnemonic::Eor), Opcode::EOR);
}

#[test]
fn ands_register() {
    verify(rrr(Mnemonic::Ands), Opcode::ANDS);
}

#[test]
fn bic_register() {
    verify(rrr(Mnemonic::Bic), Opcode::BIC);
}

#[test]
fn orn_register() {
    verify(rrr(Mnemonic::Orn), Opcode::ORN);
}

#[test]
fn eon_register() {
    verify(rrr(Mnemonic::Eon), Opcode::EON);
}

#[test]
fn and_bitmask_immediate() {
    verify(
        Inst::new(Mnemonic::And)
            .with_from(Operand::Imm(0xFF))
            .with_reg(Reg::r(1))
            .with_to(r(0)),
        Opcode::AND,
    );
}

#[test]
fn orr_alternating_bitmask() {
    verify(
        Inst::new(Mnemonic::Orr)
            .with_from(Operand::Imm(0x5555_5555_5555_5555))
            .with_reg(Reg::r(1))
            .with_to(r(0)),
        Opcode::ORR,
    );
}

// ─── Moves ────────────────────────────────────────────────────────────────────

#[test]
fn mov_register_is_orr() {
    // MOV Xd, Xn is an alias for ORR Xd, XZR, Xn
    let (opcode, _) = asm_and_decode(rr(Mnemonic::Mov));
    assert_eq!(opcode, Opcode::ORR, "expected ORR, got {:?}", opcode);
}

#[test]
fn mov_small_constant_is_movz() {
    verify(
        Inst::new(Mnemonic::Mov)
            .with_from(Operand::Imm(0x1234_0000))
            .with_to(r(0)),
        Opcode::MOVZ,
    );
}

#[test]
fn movk_inserts_chunk() {
    verify(
        Inst::new(Mnemonic::MovK)
            .with_from(Operand::Imm(0xBEEF_0000))
            .with_to(r(5)),
        Opcode::MOVK,
    );
}

#[test]
fn movn_zero() {
    verify(
        Inst::new(Mnemonic::MovN)
            .with_from(Operand::Imm(0))
            .with_to(r(5)),
        Opcode::MOVN,
    );
}

#[test]
fn mov_bitmask_constant_is_orr() {
    verify(
        Inst::new(Mnemonic::Mov)
            .with_from(Operand::Imm(0x00FF_00FF_00FF_00FF))
            .with_to(r(0)),
        Opcode::ORR,
    );
}

// ─── Loads and stores ─────────────────────────────────────────────────────────

#[test]
fn load_unsigned_offset() {
    verify(
        Inst::new(Mnemonic::Mov).with_from(mem(1, 16)).with_to(r(0)),
        Opcode::LDR,
    );
}

#[test]
fn store_unsigned_offset() {
    verify(
        Inst::new(Mnemonic::Mov).with_from(r(0)).with_to(mem(1, 16)),
        Opcode::STR,
    );
}

#[test]
fn load_register_offset() {
    verify(
        Inst::new(Mnemonic::Mov)
            .with_from(Operand::Mem(MemRef::indexed(Reg::r(1), Reg::r(2))))
            .with_to(r(0)),
        Opcode::LDR,
    );
}

#[test]
fn load_pre_indexed() {
    verify(
        Inst::new(Mnemonic::Mov)
            .with_from(Operand::Mem(MemRef::pre(Reg::r(1), 8)))
            .with_to(r(0)),
        Opcode::LDR,
    );
}

#[test]
fn store_post_indexed() {
    verify(
        Inst::new(Mnemonic::Mov)
            .with_from(r(0))
            .with_to(Operand::Mem(MemRef::post(Reg::r(1), -16))),
        Opcode::STR,
    );
}

#[test]
fn load_signed_word() {
    verify(
        Inst::new(Mnemonic::MovW).with_from(mem(1, 4)).with_to(r(0)),
        Opcode::LDRSW,
    );
}

#[test]
fn load_unsigned_word() {
    verify(
        Inst::new(Mnemonic::MovWU).with_from(mem(1, 4)).with_to(r(0)),
        Opcode::LDR,
    );
}

#[test]
fn load_unsigned_byte() {
    verify(
        Inst::new(Mnemonic::MovBU).with_from(mem(1, 3)).with_to(r(0)),
        Opcode::LDRB,
    );
}

#[test]
fn store_byte() {
    verify(
        Inst::new(Mnemonic::MovB).with_from(r(0)).with_to(mem(1, 3)),
        Opcode::STRB,
    );
}

#[test]
fn load_unsigned_halfword() {
    verify(
        Inst::new(Mnemonic::MovHU).with_from(mem(1, 2)).with_to(r(0)),
        Opcode::LDRH,
    );
}

#[test]
fn store_halfword() {
    verify(
        Inst::new(Mnemonic::MovH).with_from(r(0)).with_to(mem(1, 2)),
        Opcode::STRH,
    );
}

#[test]
fn load_pair() {
    verify(
        Inst::new(Mnemonic::Ldp)
            .with_from(mem(1, 16))
            .with_to(Operand::Pair(Reg::r(2), Reg::r(3))),
        Opcode::LDP,
    );
}

#[test]
fn store_pair_pre_indexed() {
    verify(
        Inst::new(Mnemonic::Stp)
            .with_from(Operand::Pair(Reg::r(29), Reg::LR))
            .with_to(Operand::Mem(MemRef::pre(Reg::SP, -16))),
        Opcode::STP,
    );
}

// ─── Multiply/divide ──────────────────────────────────────────────────────────

#[test]
fn mul_register() {
    // MUL is alias for MADD Xd, Xn, Xm, XZR; yaxpeax may decode as MADD
    let (opcode, _) = asm_and_decode(rrr(Mnemonic::Mul));
    assert!(
        opcode == Opcode::MADD || opcode == Opcode::MUL,
        "expected MADD or MUL, got {:?}",
        opcode
    );
}

#[test]
fn msub_with_addend() {
    verify(
        Inst::new(Mnemonic::Msub)
            .with_from(r(2))
            .with_reg(Reg::r(1))
            .with_aux(r(3))
            .with_to(r(0)),
        Opcode::MSUB,
    );
}

#[test]
fn sdiv_register() {
    verify(rrr(Mnemonic::Sdiv), Opcode::SDIV);
}

#[test]
fn udiv_register() {
    verify(rrr(Mnemonic::Udiv), Opcode::UDIV);
}

// ─── Shifts and bit operations ────────────────────────────────────────────────

#[test]
fn lsl_register() {
    verify(rrr(Mnemonic::Lsl), Opcode::LSLV);
}

#[test]
fn lsr_register() {
    verify(rrr(Mnemonic::Lsr), Opcode::LSRV);
}

#[test]
fn asr_register() {
    verify(rrr(Mnemonic::Asr), Opcode::ASRV);
}

#[test]
fn lsl_immediate_is_ubfm() {
    verify(
        Inst::new(Mnemonic::Lsl)
            .with_from(Operand::Imm(4))
            .with_reg(Reg::r(1))
            .with_to(r(0)),
        Opcode::UBFM,
    );
}

#[test]
fn asr_immediate_is_sbfm() {
    verify(
        Inst::new(Mnemonic::Asr)
            .with_from(Operand::Imm(4))
            .with_reg(Reg::r(1))
            .with_to(r(0)),
        Opcode::SBFM,
    );
}

#[test]
fn extract() {
    verify(
        Inst::new(Mnemonic::Extr)
            .with_from(Operand::Imm(8))
            .with_reg(Reg::r(1))
            .with_aux(r(2))
            .with_to(r(0)),
        Opcode::EXTR,
    );
}

#[test]
fn clz() {
    verify(rr(Mnemonic::Clz), Opcode::CLZ);
}

#[test]
fn cls() {
    verify(rr(Mnemonic::Cls), Opcode::CLS);
}

#[test]
fn rbit() {
    verify(rr(Mnemonic::Rbit), Opcode::RBIT);
}

#[test]
fn rev() {
    verify(rr(Mnemonic::Rev), Opcode::REV);
}

#[test]
fn rev16() {
    verify(rr(Mnemonic::Rev16), Opcode::REV16);
}

// ─── Conditional select ───────────────────────────────────────────────────────

fn select(m: Mnemonic) -> Inst {
    Inst::new(m)
        .with_from(Operand::Cond(Cond::Eq))
        .with_reg(Reg::r(1))
        .with_aux(r(2))
        .with_to(r(0))
}

#[test]
fn csel() {
    verify(select(Mnemonic::Csel), Opcode::CSEL);
}

#[test]
fn csinc() {
    verify(select(Mnemonic::Csinc), Opcode::CSINC);
}

#[test]
fn csinv() {
    verify(select(Mnemonic::Csinv), Opcode::CSINV);
}

#[test]
fn csneg() {
    verify(select(Mnemonic::Csneg), Opcode::CSNEG);
}

// ─── Branches ─────────────────────────────────────────────────────────────────

#[test]
fn branch() {
    verify(Inst::new(Mnemonic::B).with_to(Operand::Branch), Opcode::B);
}

#[test]
fn branch_with_link() {
    verify(Inst::new(Mnemonic::Bl).with_to(Operand::Branch), Opcode::BL);
}

#[test]
fn branch_register() {
    verify(Inst::new(Mnemonic::B).with_to(r(16)), Opcode::BR);
}

#[test]
fn branch_with_link_register() {
    verify(Inst::new(Mnemonic::Bl).with_to(r(16)), Opcode::BLR);
}

#[test]
fn ret() {
    verify(Inst::new(Mnemonic::Ret), Opcode::RET);
}

#[test]
fn compare_and_branch_zero() {
    verify(
        Inst::new(Mnemonic::Cbz).with_from(r(3)).with_to(Operand::Branch),
        Opcode::CBZ,
    );
}

#[test]
fn compare_and_branch_nonzero() {
    verify(
        Inst::new(Mnemonic::Cbnz).with_from(r(3)).with_to(Operand::Branch),
        Opcode::CBNZ,
    );
}

#[test]
fn test_bit_and_branch_zero() {
    verify(
        Inst::new(Mnemonic::Tbz)
            .with_from(Operand::Imm(5))
            .with_reg(Reg::r(3))
            .with_to(Operand::Branch),
        Opcode::TBZ,
    );
}

#[test]
fn test_bit_and_branch_nonzero_high_bit() {
    verify(
        Inst::new(Mnemonic::Tbnz)
            .with_from(Operand::Imm(63))
            .with_reg(Reg::r(3))
            .with_to(Operand::Branch),
        Opcode::TBNZ,
    );
}

// ─── System ───────────────────────────────────────────────────────────────────

#[test]
fn supervisor_call() {
    verify(
        Inst::new(Mnemonic::Svc).with_to(Operand::Imm(0x80)),
        Opcode::SVC,
    );
}

#[test]
fn nop_is_hint() {
    let (opcode, _) = asm_and_decode(Inst::new(Mnemonic::Nop));
    assert!(
        opcode == Opcode::HINT || format!("{opcode:?}").contains("NOP"),
        "expected HINT, got {:?}",
        opcode
    );
}

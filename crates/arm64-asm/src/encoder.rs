//! Encoder dispatch: turn a looked-up instruction into machine words.
//!
//! The descriptor's [`Form`] picks the field layout; the per-family fixed
//! bits come from [`crate::opcodes`]. Operands are read by position:
//! `from` is the source, `reg` the extra source register, `to` the
//! destination, and `aux` whatever a family needs beyond that.

use core::ops::Deref;

use crate::classify::{chipfloat7, classify, encode_bitmask, movcon};
use crate::error::AsmError;
use crate::ir::{
    Cond, ExtendOp, IndexMode, Inst, MemBase, MemRef, Mnemonic, Operand, Reg, RegBank, ShiftOp,
};
use crate::opcodes::{self, is_w};
use crate::optab::{Encoding, Form};

// ─── Words: inline output buffer ──────────────────────────────────────

/// Encoded words of one instruction, kept inline. No form produces more
/// than two words.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Words {
    data: [u32; 4],
    len: u8,
}

impl Words {
    /// Empty buffer (zero-size pseudo-ops).
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: [0; 4],
            len: 0,
        }
    }

    #[inline]
    pub const fn one(w: u32) -> Self {
        Self {
            data: [w, 0, 0, 0],
            len: 1,
        }
    }

    #[inline]
    pub const fn two(a: u32, b: u32) -> Self {
        Self {
            data: [a, b, 0, 0],
            len: 2,
        }
    }

    /// Number of words.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size in bytes.
    #[inline]
    pub fn byte_len(&self) -> u32 {
        u32::from(self.len) * 4
    }

    /// Append the little-endian bytes to `out`.
    pub fn write_le(&self, out: &mut Vec<u8>) {
        for w in self.iter() {
            out.extend_from_slice(&w.to_le_bytes());
        }
    }
}

impl Default for Words {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Words {
    type Target = [u32];

    #[inline]
    fn deref(&self) -> &[u32] {
        &self.data[..self.len as usize]
    }
}

struct Hex(u32);

impl core::fmt::Debug for Hex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl core::fmt::Debug for Words {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter().map(|&w| Hex(w))).finish()
    }
}

// ─── Operand helpers ─────────────────────────────────────────────────

const ZR: u32 = 31;

fn reg_of(op: &Operand) -> Result<Reg, AsmError> {
    match op {
        Operand::Reg(r) => Ok(*r),
        Operand::Imm(0) => Ok(Reg::ZR),
        Operand::Mem(MemRef {
            base: MemBase::Reg(r),
            offset: 0,
            mode: IndexMode::Offset,
        }) => Ok(*r),
        other => Err(AsmError::invalid(format!("expected register, got {other}"))),
    }
}

fn rf(op: &Operand) -> Result<u32, AsmError> {
    reg_of(op).map(Reg::num)
}

/// Destination register, or the zero register for compare-style forms.
fn rd_or_zr(op: &Operand) -> Result<u32, AsmError> {
    match op {
        Operand::None => Ok(ZR),
        op => rf(op),
    }
}

fn imm_of(op: &Operand) -> Result<i64, AsmError> {
    match op {
        Operand::Imm(v) => Ok(*v),
        other => Err(AsmError::invalid(format!("expected constant, got {other}"))),
    }
}

fn cond_of(op: &Operand) -> Result<Cond, AsmError> {
    match op {
        Operand::Cond(c) => Ok(*c),
        other => Err(AsmError::invalid(format!("expected condition, got {other}"))),
    }
}

fn pair_of(op: &Operand) -> Result<(u32, u32), AsmError> {
    match op {
        Operand::Pair(a, b) => Ok((a.num(), b.num())),
        other => Err(AsmError::invalid(format!("expected register pair, got {other}"))),
    }
}

fn mem_of(op: &Operand) -> Result<&MemRef, AsmError> {
    match op {
        Operand::Mem(m) | Operand::Addr(m) => Ok(m),
        other => Err(AsmError::invalid(format!("expected memory operand, got {other}"))),
    }
}

/// Base register of a memory reference; frame-relative references use SP.
fn base_of(m: &MemRef) -> Result<u32, AsmError> {
    match &m.base {
        MemBase::Reg(r) => Ok(r.num()),
        MemBase::Indexed { base, .. } => Ok(base.num()),
        MemBase::Auto | MemBase::Param => Ok(Reg::SP.num()),
        MemBase::Extern(s) => Err(AsmError::invalid(format!(
            "symbol {s} has no base register"
        ))),
    }
}

fn check(v: i64, min: i64, max: i64) -> Result<u32, AsmError> {
    if v < min || v > max {
        return Err(AsmError::ImmediateOutOfRange {
            value: v,
            min,
            max,
        });
    }
    Ok(v as u32)
}

fn is_sp(op: &Operand) -> bool {
    matches!(op, Operand::Reg(r) if r.bank() == RegBank::Sp)
}

fn datasize(m: Mnemonic) -> i64 {
    if is_w(m) {
        32
    } else {
        64
    }
}

// ─── PC-relative displacement ────────────────────────────────────────

/// Signed word displacement from `pc` to the target, packed into a
/// `bits`-wide field.
fn pcrel(pc: u32, target: Option<&Inst>, bits: u32) -> Result<u32, AsmError> {
    let t = target.ok_or_else(|| AsmError::invalid("PC-relative operand has no target"))?;
    let disp = i64::from(t.pc) - i64::from(pc);
    if disp & 3 != 0 {
        return Err(AsmError::MisalignedBranch { disp });
    }
    let w = disp >> 2;
    if !fits(w, bits) {
        return Err(AsmError::BranchTooFar { disp: w, bits });
    }
    Ok((w as u32) & ((1u32 << bits) - 1))
}

/// Whether a signed word displacement fits a `bits`-wide field.
pub(crate) fn fits(words: i64, bits: u32) -> bool {
    let lim = 1i64 << (bits - 1);
    (-lim..lim).contains(&words)
}

/// Width of the displacement field of a short branch that layout may
/// widen, `None` for every other form.
pub(crate) fn short_reach(form: Form) -> Option<u32> {
    match form {
        Form::CondBranch | Form::CompareBranch => Some(19),
        Form::TestBranch => Some(14),
        _ => None,
    }
}

/// `LDR Rt, <literal>` where the literal is the pool entry `target`.
/// Word entries holding negative values load sign-extended.
fn literal_into(pc: u32, target: Option<&Inst>, rt: u32) -> Result<u32, AsmError> {
    let entry = target.ok_or_else(|| AsmError::invalid("literal load has no pool entry"))?;
    let w = match (entry.mnemonic, &entry.to) {
        (Mnemonic::Dword, _) => 1,
        (Mnemonic::Word, Operand::Imm(v)) if *v < 0 => 2,
        (Mnemonic::Word, _) => 0,
        (m, _) => {
            return Err(AsmError::inconsistent(format!(
                "literal load points at {m}, not a pool entry"
            )))
        }
    };
    Ok(opcodes::op_load_literal(w, false) | pcrel(pc, target, 19)? << 5 | rt)
}

// ─── Load/store offsets ──────────────────────────────────────────────

/// Fold an immediate offset into a scaled-offset load/store opcode,
/// switching to the unscaled 9-bit form for negative or misaligned
/// offsets that still fit it.
fn ldst_offset(op: u32, scale: u32, v: i64) -> Result<u32, AsmError> {
    let align = (1i64 << scale) - 1;
    if v < 0 || v & align != 0 {
        if (-256..256).contains(&v) {
            return Ok(opcodes::unscaled(op) | ((v as u32) & 0x1FF) << 12);
        }
        if v < 0 {
            return Err(AsmError::ImmediateOutOfRange {
                value: v,
                min: -256,
                max: 255,
            });
        }
        return Err(AsmError::OddOffset { value: v });
    }
    let scaled = check(v >> scale, 0, 0xFFF).map_err(|_| AsmError::ImmediateOutOfRange {
        value: v,
        min: 0,
        max: 0xFFF << scale,
    })?;
    Ok(op | scaled << 10)
}

/// Register-offset form `[Rn, Rm]` of a scaled-offset opcode.
fn ldst_regoff(op: u32, rm: u32) -> u32 {
    opcodes::unscaled(op) | 1 << 21 | rm << 16 | 3 << 13 | 2 << 10
}

fn ldst_op(m: Mnemonic, load: bool) -> Result<u32, AsmError> {
    if load {
        opcodes::op_load(m)
    } else {
        opcodes::op_store(m)
    }
}

/// The memory operand and data register of a load (`from` is memory) or
/// store (`to` is memory).
fn ldst_operands(inst: &Inst, load: bool) -> (&Operand, &Operand) {
    if load {
        (&inst.from, &inst.to)
    } else {
        (&inst.to, &inst.from)
    }
}

// ─── Dispatcher ──────────────────────────────────────────────────────

/// Encode `inst` with its cached descriptor.
///
/// `target` is the record the instruction refers to: the branch target,
/// or the pool entry for forms that load a literal. `autosize` is the
/// frame size plus the saved link-register slot, used to resolve stack
/// offsets.
///
/// # Errors
///
/// Range and operand errors are recoverable; the caller reports them and
/// emits zeros of the descriptor's size. A mnemonic the family tables do
/// not know is a [`AsmError::CatalogInconsistency`].
pub fn encode(inst: &Inst, target: Option<&Inst>, autosize: i64) -> Result<Words, AsmError> {
    let enc = inst
        .enc
        .ok_or_else(|| AsmError::inconsistent(format!("{} encoded before lookup", inst.mnemonic)))?;
    encode_with(inst, enc, target, autosize)
}

fn encode_with(
    inst: &Inst,
    enc: &Encoding,
    target: Option<&Inst>,
    autosize: i64,
) -> Result<Words, AsmError> {
    let m = inst.mnemonic;
    let pc = inst.pc;
    let w = match enc.form {
        Form::Pseudo => return Ok(Words::new()),
        Form::Illegal | Form::Undefined => 0,

        // ── Integer data processing ──
        Form::RegRegReg => {
            let op = opcodes::op_rrr(m)?;
            let rm = rf(&inst.from)?;
            let rd = rd_or_zr(&inst.to)?;
            let rn = match inst.reg {
                Some(r) => r.num(),
                None if opcodes::zero_rn(m) => ZR,
                None => rd,
            };
            // Register 31 reads as SP only in the extended form.
            let sp_source = inst.reg.is_some_and(|r| r.bank() == RegBank::Sp);
            if sp_source && op & 0x1F00_0000 == 0x0B00_0000 && !opcodes::zero_rn(m) {
                let ext = if is_w(m) { ExtendOp::Uxtw } else { ExtendOp::Uxtx };
                return Ok(Words::one(
                    opcodes::op_addsub_ext(m)? | rm << 16 | ext.option() << 13 | rn << 5 | rd,
                ));
            }
            op | rm << 16 | rn << 5 | rd
        }
        Form::RegZeroN => {
            let op = opcodes::op_rrr(m)?;
            let rm = rf(&inst.from)?;
            let rd = match &inst.to {
                Operand::None => rm,
                to => rf(to)?,
            };
            op | rm << 16 | ZR << 5 | rd
        }
        Form::ShiftedReg => encode_shifted(inst)?,
        Form::AddSubImm => {
            let op = opcodes::op_addsub_imm(m)?;
            let rd = rd_or_zr(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            op | addsub_imm(imm_of(&inst.from)?)? | rn << 5 | rd
        }
        Form::AddSubExt => {
            let op = opcodes::op_addsub_ext(m)?;
            let rd = rd_or_zr(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            let (rm, option, amount) = match &inst.from {
                Operand::Extended { reg, op, amount } => (reg.num(), op.option(), *amount),
                from => {
                    let ext = if is_w(m) { ExtendOp::Uxtw } else { ExtendOp::Uxtx };
                    (rf(from)?, ext.option(), 0)
                }
            };
            let amount = check(i64::from(amount), 0, 4)?;
            op | rm << 16 | option << 13 | amount << 10 | rn << 5 | rd
        }
        Form::AddSubLiteral => {
            let rd = rd_or_zr(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            let tmp = Reg::TMP.num();
            let load = literal_into(pc, target, tmp)?;
            let sp_involved = inst.reg.is_some_and(|r| r.bank() == RegBank::Sp) || is_sp(&inst.to);
            let op = if sp_involved {
                let ext = if is_w(m) { ExtendOp::Uxtw } else { ExtendOp::Uxtx };
                opcodes::op_addsub_ext(m)? | ext.option() << 13
            } else {
                opcodes::op_rrr(m)?
            };
            return Ok(Words::two(load, op | tmp << 16 | rn << 5 | rd));
        }
        Form::LogicalImm => {
            let op = opcodes::op_logical_imm(m)?;
            let mut v = imm_of(&inst.from)?;
            if opcodes::inverts_imm(m) {
                v = !v;
            }
            let (n, immr, imms) = encode_bitmask(v as u64, !is_w(m))
                .ok_or_else(|| AsmError::invalid(format!("{v:#x} is not a bitmask immediate")))?;
            let rd = rd_or_zr(&inst.to)?;
            let rn = match inst.reg {
                Some(r) => r.num(),
                None if matches!(m, Mnemonic::Mov | Mnemonic::MovW | Mnemonic::MovWU) => ZR,
                None => rd,
            };
            op | n << 22 | immr << 16 | imms << 10 | rn << 5 | rd
        }
        Form::LogicalLiteral => {
            let rd = rd_or_zr(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            let tmp = Reg::TMP.num();
            let load = literal_into(pc, target, tmp)?;
            return Ok(Words::two(
                load,
                opcodes::op_rrr(m)? | tmp << 16 | rn << 5 | rd,
            ));
        }
        Form::MoveReg => {
            let rd = rf(&inst.to)?;
            let rm = rf(&inst.from)?;
            if is_sp(&inst.from) || is_sp(&inst.to) {
                // ADD Rd, Rn, #0
                opcodes::op_addsub_imm(Mnemonic::Add)? | rm << 5 | rd
            } else {
                // ORR Rd, ZR, Rm
                opcodes::op_rrr(Mnemonic::Orr)? | rm << 16 | ZR << 5 | rd
            }
        }
        Form::MoveWide => encode_move_wide(m, imm_of(&inst.from)?, rf(&inst.to)?)?,
        Form::MoveKeep => {
            let v = imm_of(&inst.from)?;
            let hw = movcon(v)
                .filter(|&hw| !is_w(m) || hw < 2)
                .ok_or_else(|| AsmError::invalid(format!("{v:#x} is not a 16-bit chunk")))?;
            let imm16 = ((v as u64) >> (hw * 16)) as u32 & 0xFFFF;
            opcodes::op_move_wide(m)? | hw << 21 | imm16 << 5 | rf(&inst.to)?
        }
        Form::LoadLiteral => {
            let (w, fp) = match m {
                Mnemonic::Mov => (1, false),
                Mnemonic::MovW => (2, false),
                Mnemonic::MovWU => (0, false),
                Mnemonic::FmovS => (0, true),
                Mnemonic::FmovD => (1, true),
                _ => return Err(AsmError::inconsistent(format!("{m} has no literal load"))),
            };
            opcodes::op_load_literal(w, fp) | pcrel(pc, target, 19)? << 5 | rf(&inst.to)?
        }
        Form::AddrConst => {
            let mem = mem_of(&inst.from)?;
            let off = classify(&inst.from, autosize).offset;
            opcodes::op_addsub_imm(Mnemonic::Add)?
                | addsub_imm(off)?
                | base_of(mem)? << 5
                | rf(&inst.to)?
        }
        Form::AddrLiteral => {
            let base = base_of(mem_of(&inst.from)?)?;
            let tmp = Reg::TMP.num();
            let load = literal_into(pc, target, tmp)?;
            let add = opcodes::op_addsub_ext(Mnemonic::Add)?
                | ExtendOp::Uxtx.option() << 13
                | tmp << 16
                | base << 5
                | rf(&inst.to)?;
            return Ok(Words::two(load, add));
        }
        Form::Extend => {
            let imms = match m {
                Mnemonic::Sxtb | Mnemonic::SxtbW | Mnemonic::Uxtb | Mnemonic::UxtbW => 7,
                Mnemonic::MovB | Mnemonic::MovBU => 7,
                Mnemonic::Sxth | Mnemonic::SxthW | Mnemonic::Uxth | Mnemonic::UxthW => 15,
                Mnemonic::MovH | Mnemonic::MovHU => 15,
                _ => 31,
            };
            opcodes::op_bitfield(m)? | imms << 10 | rf(&inst.from)? << 5 | rf(&inst.to)?
        }
        Form::ShiftImm => encode_shift_imm(inst)?,
        Form::BitOp => opcodes::op_bit(m)? | rf(&inst.from)? << 5 | rf(&inst.to)?,
        Form::MulAdd => {
            let rd = rf(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            let ra = match &inst.aux {
                Operand::None => ZR,
                aux => rf(aux)?,
            };
            opcodes::op_muladd(m)? | rf(&inst.from)? << 16 | ra << 10 | rn << 5 | rd
        }
        Form::Remainder => {
            let (div, msub) = opcodes::op_remainder(m)?;
            let rm = rf(&inst.from)?;
            let rd = rf(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            let tmp = Reg::TMP.num();
            // TMP = Rn / Rm; Rd = Rn - TMP * Rm
            return Ok(Words::two(
                div | rm << 16 | rn << 5 | tmp,
                msub | rm << 16 | rn << 10 | tmp << 5 | rd,
            ));
        }
        Form::Bitfield => {
            let size = datasize(m);
            let immr = check(imm_of(&inst.from)?, 0, size - 1)?;
            let imms = check(imm_of(&inst.aux)?, 0, size - 1)?;
            let rd = rf(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            opcodes::op_bitfield(m)? | immr << 16 | imms << 10 | rn << 5 | rd
        }
        Form::BitfieldAlias => encode_bitfield_alias(inst)?,
        Form::Extract => {
            let size = datasize(m);
            let lsb = check(imm_of(&inst.from)?, 0, size - 1)?;
            let rd = rf(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            let rm = match &inst.aux {
                Operand::None => rn,
                aux => rf(aux)?,
            };
            opcodes::op_extract(m)? | rm << 16 | lsb << 10 | rn << 5 | rd
        }

        // ── Conditional ──
        Form::CondSelect => {
            let mut cond = cond_of(&inst.from)?;
            let rn = inst
                .reg
                .map(Reg::num)
                .ok_or_else(|| AsmError::invalid("conditional select needs a first source"))?;
            let rm = if opcodes::is_cond_alias(m) {
                cond = cond.invert();
                rn
            } else {
                rf(&inst.aux)?
            };
            opcodes::op_cond_select(m)? | rm << 16 | cond.code() << 12 | rn << 5 | rf(&inst.to)?
        }
        Form::CondSet => {
            let cond = cond_of(&inst.from)?.invert();
            opcodes::op_cond_select(m)? | ZR << 16 | cond.code() << 12 | ZR << 5 | rf(&inst.to)?
        }
        Form::CondCompare => {
            let cond = cond_of(&inst.from)?;
            let rn = inst
                .reg
                .map(Reg::num)
                .ok_or_else(|| AsmError::invalid("conditional compare needs a register"))?;
            let nzcv = check(imm_of(&inst.to)?, 0, 15)?;
            let second = match &inst.aux {
                Operand::Imm(v) => check(*v, 0, 31)? << 16 | 1 << 11,
                aux => rf(aux)? << 16,
            };
            opcodes::op_cond_compare(m)? | second | cond.code() << 12 | rn << 5 | nzcv
        }

        // ── Branches ──
        Form::Branch => opcodes::op_branch(m)? | pcrel(pc, target, 26)?,
        Form::BranchReg => {
            let rn = match &inst.to {
                Operand::None => Reg::LR.num(),
                to => rf(to)?,
            };
            opcodes::op_branch_reg(m)? | rn << 5
        }
        Form::CondBranch => {
            opcodes::OP_BCOND | pcrel(pc, target, 19)? << 5 | opcodes::branch_cond(m)?.code()
        }
        Form::CondBranchFar => {
            let inv = opcodes::branch_cond(m)?.invert();
            let skip = opcodes::OP_BCOND | 2 << 5 | inv.code();
            let jump = opcodes::op_branch(Mnemonic::B)? | pcrel(pc + 4, target, 26)?;
            return Ok(Words::two(skip, jump));
        }
        Form::CompareBranch => {
            opcodes::op_compare_branch(m)? | pcrel(pc, target, 19)? << 5 | rf(&inst.from)?
        }
        Form::CompareBranchFar => {
            let inv = opcodes::invert_compare_branch(m)?;
            let skip = opcodes::op_compare_branch(inv)? | 2 << 5 | rf(&inst.from)?;
            let jump = opcodes::op_branch(Mnemonic::B)? | pcrel(pc + 4, target, 26)?;
            return Ok(Words::two(skip, jump));
        }
        Form::TestBranch => test_branch(m, inst, pcrel(pc, target, 14)?)?,
        Form::TestBranchFar => {
            let inv = opcodes::invert_compare_branch(m)?;
            let skip = test_branch(inv, inst, 2)?;
            let jump = opcodes::op_branch(Mnemonic::B)? | pcrel(pc + 4, target, 26)?;
            return Ok(Words::two(skip, jump));
        }
        Form::Adr => {
            let t = target.ok_or_else(|| AsmError::invalid("ADR has no target"))?;
            let disp = i64::from(t.pc) - i64::from(pc);
            if !fits(disp, 21) {
                return Err(AsmError::BranchTooFar { disp, bits: 21 });
            }
            opcodes::op_adr(false, disp as u32, rf(&inst.to)?)
        }
        Form::Adrp => {
            let t = target.ok_or_else(|| AsmError::invalid("ADRP has no target"))?;
            let pages = (i64::from(t.pc) >> 12) - (i64::from(pc) >> 12);
            if !fits(pages, 21) {
                return Err(AsmError::BranchTooFar {
                    disp: pages,
                    bits: 21,
                });
            }
            opcodes::op_adr(true, pages as u32, rf(&inst.to)?)
        }

        // ── System ──
        Form::Exception => {
            let imm = match &inst.to {
                Operand::None => 0,
                to => check(imm_of(to)?, 0, 0xFFFF)?,
            };
            opcodes::op_exception(m)? | imm << 5
        }
        Form::NoOperand => opcodes::op_zero(m)?,
        Form::Clrex => {
            let crm = match &inst.to {
                Operand::None => 15,
                to => check(imm_of(to)?, 0, 15)?,
            };
            opcodes::OP_CLREX | crm << 8
        }
        Form::Sys => {
            let v = imm_of(&inst.from)?;
            if v & !0x7FFE0 != 0 {
                return Err(AsmError::invalid(format!("{v:#x} is not an op1:CRn:CRm:op2 operand")));
            }
            let rt = match &inst.to {
                Operand::None => ZR,
                to => rf(to)?,
            };
            opcodes::op_sys(m)? | v as u32 | rt
        }
        Form::Barrier => opcodes::op_barrier(m)? | check(imm_of(&inst.from)?, 0, 15)? << 8,
        Form::Hint => opcodes::OP_HINT | check(imm_of(&inst.from)?, 0, 127)? << 5,
        Form::SysRegRead => {
            let (op0, op1, crn, crm, op2) = sysreg_fields(&inst.from)?;
            opcodes::sysop(1, op0, op1, crn, crm, op2, rf(&inst.to)?)
        }
        Form::SysRegWrite => {
            let (op0, op1, crn, crm, op2) = sysreg_fields(&inst.to)?;
            opcodes::sysop(0, op0, op1, crn, crm, op2, rf(&inst.from)?)
        }
        Form::PstateWrite => {
            let (op1, op2) = match &inst.to {
                Operand::SysReg(s) => s
                    .pstate()
                    .ok_or_else(|| AsmError::invalid(format!("{s:?} is not a PSTATE field")))?,
                other => return Err(AsmError::invalid(format!("expected PSTATE field, got {other}"))),
            };
            let imm = check(imm_of(&inst.from)?, 0, 15)?;
            opcodes::OP_MSR_IMM | op1 << 16 | imm << 8 | op2 << 5
        }

        // ── Data ──
        Form::Word => match &inst.to {
            Operand::Imm(v) => *v as u32,
            // Symbol addresses are filled in through a relocation.
            _ => 0,
        },
        Form::Dword => {
            let v = match &inst.to {
                Operand::Imm(v) => *v as u64,
                _ => 0,
            };
            return Ok(Words::two(v as u32, (v >> 32) as u32));
        }

        // ── Loads and stores ──
        Form::Store | Form::Load => {
            let load = enc.form == Form::Load;
            let (mem_op, data) = ldst_operands(inst, load);
            let mem = mem_of(mem_op)?;
            let off = classify(mem_op, autosize).offset;
            let op = ldst_offset(ldst_op(m, load)?, opcodes::movesize(m)?, off)?;
            op | base_of(mem)? << 5 | rf(data)?
        }
        Form::StoreLarge | Form::LoadLarge => {
            let load = enc.form == Form::LoadLarge;
            let (mem_op, data) = ldst_operands(inst, load);
            let base = base_of(mem_of(mem_op)?)?;
            let tmp = Reg::TMP.num();
            let lit = literal_into(pc, target, tmp)?;
            let access = ldst_regoff(ldst_op(m, load)?, tmp) | base << 5 | rf(data)?;
            return Ok(Words::two(lit, access));
        }
        Form::StoreRegOff | Form::LoadRegOff => {
            let load = enc.form == Form::LoadRegOff;
            let (mem_op, data) = ldst_operands(inst, load);
            let (base, index) = match &mem_of(mem_op)?.base {
                MemBase::Indexed { base, index } => (base.num(), index.num()),
                _ => return Err(AsmError::invalid("expected register-indexed memory operand")),
            };
            ldst_regoff(ldst_op(m, load)?, index) | base << 5 | rf(data)?
        }
        Form::StoreIndexed | Form::LoadIndexed => {
            let load = enc.form == Form::LoadIndexed;
            let (mem_op, data) = ldst_operands(inst, load);
            let mem = mem_of(mem_op)?;
            let imm9 = check(mem.offset, -256, 255)? & 0x1FF;
            let mode = if mem.mode == IndexMode::Pre { 3 } else { 1 };
            opcodes::unscaled(ldst_op(m, load)?)
                | imm9 << 12
                | mode << 10
                | base_of(mem)? << 5
                | rf(data)?
        }
        Form::StoreExtern | Form::LoadExtern => {
            let load = enc.form == Form::LoadExtern;
            let (_, data) = ldst_operands(inst, load);
            let tmp = Reg::TMP.num();
            let lit = literal_into(pc, target, tmp)?;
            let access = ldst_op(m, load)? | tmp << 5 | rf(data)?;
            return Ok(Words::two(lit, access));
        }
        Form::LoadPair | Form::StorePair => {
            let load = enc.form == Form::LoadPair;
            let (mem_op, pair) = ldst_operands(inst, load);
            let mem = mem_of(mem_op)?;
            let (rt, rt2) = pair_of(pair)?;
            let scale: i64 = if is_w(m) { 4 } else { 8 };
            let off = classify(mem_op, autosize).offset;
            if off % scale != 0 {
                return Err(AsmError::OddOffset { value: off });
            }
            let imm7 = check(off / scale, -64, 63).map_err(|_| AsmError::ImmediateOutOfRange {
                value: off,
                min: -64 * scale,
                max: 63 * scale,
            })? & 0x7F;
            let mode = match mem.mode {
                IndexMode::Post => 1,
                IndexMode::Offset => 2,
                IndexMode::Pre => 3,
            };
            opcodes::op_pair(m)? | mode << 23 | imm7 << 15 | rt2 << 10 | base_of(mem)? << 5 | rt
        }
        Form::LoadExclusive => {
            let rn = base_of(mem_of(&inst.from)?)?;
            let (rt, rt2) = match &inst.to {
                Operand::Pair(a, b) => (a.num(), b.num() << 10),
                to => (rf(to)?, 0),
            };
            opcodes::op_load_exclusive(m)? | rt2 | rn << 5 | rt
        }
        Form::StoreExclusive => {
            let rn = base_of(mem_of(&inst.to)?)?;
            let (rt, rt2) = match &inst.from {
                Operand::Pair(a, b) => (a.num(), b.num() << 10),
                from => (rf(from)?, 0),
            };
            let status = match &inst.aux {
                Operand::None if opcodes::is_store_release(m) => ZR,
                Operand::None => {
                    return Err(AsmError::invalid(format!("{m} needs a status register")))
                }
                aux => rf(aux)?,
            };
            opcodes::op_store_exclusive(m)? | status << 16 | rt2 | rn << 5 | rt
        }
        Form::Atomic => {
            let rn = base_of(mem_of(&inst.to)?)?;
            let rt = match &inst.aux {
                Operand::None => ZR,
                aux => rf(aux)?,
            };
            opcodes::op_atomic(m)? | rf(&inst.from)? << 16 | rn << 5 | rt
        }

        // ── Floating point ──
        Form::FpArith => {
            let rd = rf(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            opcodes::op_fp2(m)? | rf(&inst.from)? << 16 | rn << 5 | rd
        }
        Form::FpUnary => opcodes::op_fp1(m)? | rf(&inst.from)? << 5 | rf(&inst.to)?,
        Form::FpConvert => opcodes::op_fp_convert(m)? | rf(&inst.from)? << 5 | rf(&inst.to)?,
        Form::FpCompare => {
            let rn = inst
                .reg
                .map(Reg::num)
                .ok_or_else(|| AsmError::invalid("floating compare needs a register"))?;
            let op = opcodes::op_fp_compare(m)?;
            match &inst.from {
                Operand::FImm(_) => op | 8 | rn << 5,
                from => op | rf(from)? << 16 | rn << 5,
            }
        }
        Form::FpCondCompare => {
            let cond = cond_of(&inst.from)?;
            let rn = inst
                .reg
                .map(Reg::num)
                .ok_or_else(|| AsmError::invalid("floating conditional compare needs a register"))?;
            let nzcv = check(imm_of(&inst.to)?, 0, 15)?;
            opcodes::op_fp_cond_compare(m)? | rf(&inst.aux)? << 16 | cond.code() << 12 | rn << 5 | nzcv
        }
        Form::FpCondSelect => {
            let cond = cond_of(&inst.from)?;
            let rn = inst
                .reg
                .map(Reg::num)
                .ok_or_else(|| AsmError::invalid("floating select needs a first source"))?;
            opcodes::op_fp_cond_select(m)?
                | rf(&inst.aux)? << 16
                | cond.code() << 12
                | rn << 5
                | rf(&inst.to)?
        }
        Form::FpImm => {
            let v = match &inst.from {
                Operand::FImm(v) => *v,
                other => return Err(AsmError::invalid(format!("expected float constant, got {other}"))),
            };
            let imm8 = chipfloat7(v)
                .ok_or_else(|| AsmError::invalid(format!("{v} is not an 8-bit float immediate")))?;
            opcodes::op_fp_imm(m)? | imm8 << 13 | rf(&inst.to)?
        }
        Form::FpMoveGeneral => match (&inst.from, &inst.to) {
            (Operand::FImm(_), to) => opcodes::op_fp_move_general(m, true)? | ZR << 5 | rf(to)?,
            (from, to @ Operand::Reg(r)) if r.bank() == RegBank::Float => {
                opcodes::op_fp_move_general(m, true)? | rf(from)? << 5 | rf(to)?
            }
            (from, to) => opcodes::op_fp_move_general(m, false)? | rf(from)? << 5 | rf(to)?,
        },

        // ── Crypto ──
        Form::CryptoTwo => opcodes::op_crypto2(m)? | rf(&inst.from)? << 5 | rf(&inst.to)?,
        Form::CryptoThree => {
            let rd = rf(&inst.to)?;
            let rn = inst.reg.map_or(rd, Reg::num);
            opcodes::op_crypto3(m)? | rf(&inst.from)? << 16 | rn << 5 | rd
        }
    };
    Ok(Words::one(w))
}

// ─── Family helpers ──────────────────────────────────────────────────

/// `imm12` and `sh` of an add/sub immediate.
fn addsub_imm(v: i64) -> Result<u32, AsmError> {
    if (0..=0xFFF).contains(&v) {
        return Ok((v as u32) << 10);
    }
    if v & 0xFFF == 0 && (0..=0xFFF << 12).contains(&v) {
        return Ok(1 << 22 | ((v >> 12) as u32) << 10);
    }
    Err(AsmError::ImmediateOutOfRange {
        value: v,
        min: 0,
        max: 0xFFF << 12,
    })
}

/// Shifted-register add/sub/logical: `sf|opc|01x11|shift|N|Rm|imm6|Rn|Rd`.
fn encode_shifted(inst: &Inst) -> Result<u32, AsmError> {
    let m = inst.mnemonic;
    let op = opcodes::op_rrr(m)?;
    let (rm, shift, amount) = match &inst.from {
        Operand::Shifted { reg, op, amount } => (reg.num(), *op, *amount),
        other => return Err(AsmError::invalid(format!("expected shifted register, got {other}"))),
    };
    // Add/subtract has no rotate.
    let is_addsub = op & 0x1F00_0000 == 0x0B00_0000;
    if is_addsub && shift == ShiftOp::Ror {
        return Err(AsmError::invalid(format!("{m} cannot rotate its operand")));
    }
    let amount = check(i64::from(amount), 0, datasize(m) - 1)?;
    let rd = rd_or_zr(&inst.to)?;
    let rn = match inst.reg {
        Some(r) => r.num(),
        None if opcodes::zero_rn(m) => ZR,
        None => rd,
    };
    Ok(op | (shift as u32) << 22 | rm << 16 | amount << 10 | rn << 5 | rd)
}

/// `MOV $c, R` through `MOVZ` or `MOVN`.
fn encode_move_wide(m: Mnemonic, v: i64, rd: u32) -> Result<u32, AsmError> {
    let wide = !is_w(m);
    let (value, limit) = if wide {
        (v as u64, 4)
    } else {
        (u64::from(v as u32), 2)
    };
    let mask = if wide { u64::MAX } else { 0xFFFF_FFFF };
    let chunk = |x: u64, hw: u32| ((x >> (hw * 16)) & 0xFFFF) as u32;

    let (zero, not) = if wide {
        (Mnemonic::MovZ, Mnemonic::MovN)
    } else {
        (Mnemonic::MovZW, Mnemonic::MovNW)
    };
    if let Some(hw) = movcon(value as i64).filter(|&hw| hw < limit) {
        return Ok(opcodes::op_move_wide(zero)? | hw << 21 | chunk(value, hw) << 5 | rd);
    }
    let inv = !value & mask;
    if let Some(hw) = movcon(inv as i64).filter(|&hw| hw < limit) {
        return Ok(opcodes::op_move_wide(not)? | hw << 21 | chunk(inv, hw) << 5 | rd);
    }
    Err(AsmError::invalid(format!(
        "{v:#x} is not a single 16-bit chunk"
    )))
}

/// Immediate shifts as bit-field moves (`LSL`, `LSR`, `ASR`) or `EXTR`
/// (`ROR`).
fn encode_shift_imm(inst: &Inst) -> Result<u32, AsmError> {
    let m = inst.mnemonic;
    let size = datasize(m);
    let n = check(imm_of(&inst.from)?, 0, size - 1)?;
    let size = size as u32;
    let rd = rf(&inst.to)?;
    let rn = inst.reg.map_or(rd, Reg::num);
    Ok(match m {
        Mnemonic::Lsl | Mnemonic::LslW => {
            let immr = (size - n) % size;
            opcodes::op_bitfield(m)? | immr << 16 | (size - 1 - n) << 10 | rn << 5 | rd
        }
        Mnemonic::Lsr | Mnemonic::LsrW | Mnemonic::Asr | Mnemonic::AsrW => {
            opcodes::op_bitfield(m)? | n << 16 | (size - 1) << 10 | rn << 5 | rd
        }
        Mnemonic::Ror | Mnemonic::RorW => {
            opcodes::op_extract(m)? | rn << 16 | n << 10 | rn << 5 | rd
        }
        _ => return Err(AsmError::inconsistent(format!("{m} has no immediate shift"))),
    })
}

/// `BFI`/`BFXIL` and their signed/unsigned counterparts: `from` is the
/// lsb, `aux` the width.
fn encode_bitfield_alias(inst: &Inst) -> Result<u32, AsmError> {
    use Mnemonic::*;
    let m = inst.mnemonic;
    let size = datasize(m);
    let lsb = check(imm_of(&inst.from)?, 0, size - 1)?;
    let width = check(imm_of(&inst.aux)?, 1, size - i64::from(lsb))?;
    let size = size as u32;
    let (immr, imms) = match m {
        Bfi | BfiW | Sbfiz | SbfizW | Ubfiz | UbfizW => ((size - lsb) % size, width - 1),
        Bfxil | BfxilW | Sbfx | SbfxW | Ubfx | UbfxW => (lsb, lsb + width - 1),
        _ => return Err(AsmError::inconsistent(format!("{m} is not a bit-field alias"))),
    };
    let rd = rf(&inst.to)?;
    let rn = inst.reg.map_or(rd, Reg::num);
    Ok(opcodes::op_bitfield(m)? | immr << 16 | imms << 10 | rn << 5 | rd)
}

/// `TBZ`/`TBNZ`: `b5|011011|op|b40|imm14|Rt`; `imm14` is already packed.
fn test_branch(m: Mnemonic, inst: &Inst, imm14: u32) -> Result<u32, AsmError> {
    let bit = check(imm_of(&inst.from)?, 0, 63)?;
    let rt = inst
        .reg
        .map(Reg::num)
        .ok_or_else(|| AsmError::invalid("test branch needs a register"))?;
    Ok(opcodes::op_test_branch(m)? | (bit >> 5) << 31 | (bit & 31) << 19 | imm14 << 5 | rt)
}

fn sysreg_fields(op: &Operand) -> Result<(u32, u32, u32, u32, u32), AsmError> {
    match op {
        Operand::SysReg(s) => s
            .fields()
            .ok_or_else(|| AsmError::invalid(format!("{s:?} cannot be moved to or from a register"))),
        other => Err(AsmError::invalid(format!("expected system register, got {other}"))),
    }
}

//! Encoding catalog: which (mnemonic, class triple) maps to which
//! instruction family, how many bytes it takes, and whether an operand has
//! to go through the literal pool.
//!
//! The static table lists each canonical mnemonic's rules. Building the
//! catalog sorts it by `(mnemonic, class1, class2, class3)`, so narrower
//! classes come first and win, then hands every alias the rule list of its
//! canonical mnemonic.

use std::sync::OnceLock;

use crate::class::{compatible, Class};
use crate::error::AsmError;
use crate::ir::Mnemonic;

/// Instruction family; selects the encoder that produces the words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Form {
    /// Zero-size metadata record.
    Pseudo,
    /// Degenerate descriptor returned when nothing matched.
    Illegal,
    /// `op Rm, Rn, Rd` with zero shift.
    RegRegReg,
    /// `op Rm, Rd` with `Rn` fixed to the zero register.
    RegZeroN,
    AddSubImm,
    AddSubExt,
    /// Immediate via the pool into the scratch register, then register form.
    AddSubLiteral,
    ShiftedReg,
    LogicalImm,
    LogicalLiteral,
    MoveReg,
    MoveWide,
    MoveKeep,
    LoadLiteral,
    AddrConst,
    AddrLiteral,
    Extend,
    Branch,
    BranchReg,
    CondBranch,
    CondBranchFar,
    CompareBranch,
    CompareBranchFar,
    TestBranch,
    TestBranchFar,
    Adr,
    Adrp,
    ShiftImm,
    BitOp,
    MulAdd,
    Remainder,
    CondSelect,
    CondSet,
    CondCompare,
    Bitfield,
    BitfieldAlias,
    Extract,
    Exception,
    NoOperand,
    Clrex,
    Sys,
    Barrier,
    Hint,
    SysRegRead,
    SysRegWrite,
    PstateWrite,
    Word,
    Dword,
    Undefined,
    Store,
    Load,
    StoreLarge,
    LoadLarge,
    StoreIndexed,
    LoadIndexed,
    StoreRegOff,
    LoadRegOff,
    StoreExtern,
    LoadExtern,
    LoadPair,
    StorePair,
    LoadExclusive,
    StoreExclusive,
    Atomic,
    FpArith,
    FpUnary,
    FpConvert,
    FpCompare,
    FpCondCompare,
    FpCondSelect,
    FpImm,
    FpMoveGeneral,
    CryptoTwo,
    CryptoThree,
}

/// Which operand, if any, is promoted into the literal pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolUse {
    None,
    From,
    To,
}

/// One catalog rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Encoding {
    /// Canonical mnemonic the rule was declared for.
    pub mnemonic: Mnemonic,
    /// Declared classes of operand 1, the extra register and operand 3.
    pub classes: [Class; 3],
    pub form: Form,
    /// Encoded size in bytes.
    pub size: u8,
    pub pool: PoolUse,
}

impl Encoding {
    /// Whether this rule accepts an instruction whose operands resolved to
    /// `classes`.
    pub fn accepts(&self, classes: [Class; 3]) -> bool {
        self.classes
            .iter()
            .zip(classes)
            .all(|(&wide, narrow)| compatible(wide, narrow))
    }
}

/// Descriptor handed out when no rule matches: occupies one word of zeros
/// so surrounding layout can continue.
pub static ILLEGAL: Encoding = Encoding {
    mnemonic: Mnemonic::Undef,
    classes: [Class::None; 3],
    form: Form::Illegal,
    size: 4,
    pool: PoolUse::None,
};

const fn e(m: Mnemonic, a1: Class, a2: Class, a3: Class, form: Form) -> Encoding {
    Encoding {
        mnemonic: m,
        classes: [a1, a2, a3],
        form,
        size: 4,
        pool: PoolUse::None,
    }
}

const fn sized(m: Mnemonic, a1: Class, a2: Class, a3: Class, form: Form, size: u8) -> Encoding {
    Encoding {
        mnemonic: m,
        classes: [a1, a2, a3],
        form,
        size,
        pool: PoolUse::None,
    }
}

const fn pooled(
    m: Mnemonic,
    a1: Class,
    a2: Class,
    a3: Class,
    form: Form,
    size: u8,
    pool: PoolUse,
) -> Encoding {
    Encoding {
        mnemonic: m,
        classes: [a1, a2, a3],
        form,
        size,
        pool,
    }
}

macro_rules! load_store {
    ($m:ident, $r:ident, $scaled_auto:ident, $scaled_oreg:ident) => {
        [
            e(Mnemonic::$m, Class::$r, Class::None, Class::$scaled_auto, Form::Store),
            e(Mnemonic::$m, Class::$r, Class::None, Class::NSAuto, Form::Store),
            e(Mnemonic::$m, Class::$r, Class::None, Class::$scaled_oreg, Form::Store),
            e(Mnemonic::$m, Class::$r, Class::None, Class::NSOReg, Form::Store),
            pooled(Mnemonic::$m, Class::$r, Class::None, Class::LAuto, Form::StoreLarge, 8, PoolUse::To),
            pooled(Mnemonic::$m, Class::$r, Class::None, Class::LOReg, Form::StoreLarge, 8, PoolUse::To),
            e(Mnemonic::$m, Class::$r, Class::None, Class::ROff, Form::StoreRegOff),
            e(Mnemonic::$m, Class::$r, Class::None, Class::XPre, Form::StoreIndexed),
            e(Mnemonic::$m, Class::$r, Class::None, Class::XPost, Form::StoreIndexed),
            pooled(Mnemonic::$m, Class::$r, Class::None, Class::Addr, Form::StoreExtern, 8, PoolUse::To),
            e(Mnemonic::$m, Class::$scaled_auto, Class::None, Class::$r, Form::Load),
            e(Mnemonic::$m, Class::NSAuto, Class::None, Class::$r, Form::Load),
            e(Mnemonic::$m, Class::$scaled_oreg, Class::None, Class::$r, Form::Load),
            e(Mnemonic::$m, Class::NSOReg, Class::None, Class::$r, Form::Load),
            pooled(Mnemonic::$m, Class::LAuto, Class::None, Class::$r, Form::LoadLarge, 8, PoolUse::From),
            pooled(Mnemonic::$m, Class::LOReg, Class::None, Class::$r, Form::LoadLarge, 8, PoolUse::From),
            e(Mnemonic::$m, Class::ROff, Class::None, Class::$r, Form::LoadRegOff),
            e(Mnemonic::$m, Class::XPre, Class::None, Class::$r, Form::LoadIndexed),
            e(Mnemonic::$m, Class::XPost, Class::None, Class::$r, Form::LoadIndexed),
            pooled(Mnemonic::$m, Class::Addr, Class::None, Class::$r, Form::LoadExtern, 8, PoolUse::From),
        ]
    };
}

static LOAD_STORE: [[Encoding; 20]; 6] = [
    load_store!(Mov, Reg, UAuto32K, UOReg32K),
    load_store!(MovW, Reg, UAuto16K, UOReg16K),
    load_store!(MovH, Reg, UAuto8K, UOReg8K),
    load_store!(MovB, Reg, UAuto4K, UOReg4K),
    load_store!(FmovS, FReg, UAuto16K, UOReg16K),
    load_store!(FmovD, FReg, UAuto32K, UOReg32K),
];

/// Rules that are not part of a load/store block.
const RULES: &[Encoding] = {
    use Class::*;
    use Form::*;
    use Mnemonic as M;
    &[
        // add/subtract
        e(M::Add, Reg, Reg, Reg, RegRegReg),
        e(M::Add, Reg, Class::None, Reg, RegRegReg),
        e(M::Add, AddCon, Rsp, Rsp, AddSubImm),
        e(M::Add, AddCon, Class::None, Rsp, AddSubImm),
        pooled(M::Add, VCon, Rsp, Rsp, AddSubLiteral, 8, PoolUse::From),
        pooled(M::Add, VCon, Class::None, Rsp, AddSubLiteral, 8, PoolUse::From),
        e(M::Add, Shift, Reg, Reg, ShiftedReg),
        e(M::Add, Shift, Class::None, Reg, ShiftedReg),
        e(M::Add, Reg, Rsp, Rsp, AddSubExt),
        e(M::Add, Reg, Class::None, Rsp, AddSubExt),
        e(M::Add, ExtReg, Rsp, Rsp, AddSubExt),
        e(M::Add, ExtReg, Class::None, Rsp, AddSubExt),
        e(M::Cmp, Reg, Reg, Class::None, RegRegReg),
        e(M::Cmp, AddCon, Rsp, Class::None, AddSubImm),
        pooled(M::Cmp, VCon, Rsp, Class::None, AddSubLiteral, 8, PoolUse::From),
        e(M::Cmp, Shift, Reg, Class::None, ShiftedReg),
        e(M::Cmp, ExtReg, Rsp, Class::None, AddSubExt),
        e(M::Adc, Reg, Reg, Reg, RegRegReg),
        e(M::Adc, Reg, Class::None, Reg, RegRegReg),
        e(M::Ngc, Reg, Class::None, Reg, RegZeroN),
        e(M::Neg, Reg, Class::None, Reg, RegZeroN),
        e(M::Neg, Reg, Class::None, Class::None, RegZeroN),
        e(M::Neg, Shift, Class::None, Reg, ShiftedReg),
        // logical
        e(M::And, Reg, Reg, Reg, RegRegReg),
        e(M::And, Reg, Class::None, Reg, RegRegReg),
        e(M::And, BitCon, Reg, Reg, LogicalImm),
        e(M::And, BitCon, Class::None, Reg, LogicalImm),
        pooled(M::And, VCon, Reg, Reg, LogicalLiteral, 8, PoolUse::From),
        pooled(M::And, VCon, Class::None, Reg, LogicalLiteral, 8, PoolUse::From),
        e(M::And, Shift, Reg, Reg, ShiftedReg),
        e(M::And, Shift, Class::None, Reg, ShiftedReg),
        e(M::Bic, Reg, Reg, Reg, RegRegReg),
        e(M::Bic, Reg, Class::None, Reg, RegRegReg),
        e(M::Bic, BitCon, Reg, Reg, LogicalImm),
        e(M::Bic, BitCon, Class::None, Reg, LogicalImm),
        pooled(M::Bic, VCon, Reg, Reg, LogicalLiteral, 8, PoolUse::From),
        pooled(M::Bic, VCon, Class::None, Reg, LogicalLiteral, 8, PoolUse::From),
        e(M::Bic, Shift, Reg, Reg, ShiftedReg),
        e(M::Bic, Shift, Class::None, Reg, ShiftedReg),
        e(M::Tst, Reg, Reg, Class::None, RegRegReg),
        e(M::Tst, BitCon, Reg, Class::None, LogicalImm),
        pooled(M::Tst, VCon, Reg, Class::None, LogicalLiteral, 8, PoolUse::From),
        e(M::Tst, Shift, Reg, Class::None, ShiftedReg),
        e(M::Mvn, Reg, Class::None, Reg, RegZeroN),
        e(M::Mvn, Shift, Class::None, Reg, ShiftedReg),
        // moves
        e(M::Mov, Rsp, Class::None, Rsp, MoveReg),
        e(M::Mov, MovCon, Class::None, Reg, MoveWide),
        e(M::Mov, BitCon, Class::None, Reg, LogicalImm),
        pooled(M::Mov, VCon, Class::None, Reg, LoadLiteral, 4, PoolUse::From),
        e(M::Mov, AACon, Class::None, Reg, AddrConst),
        e(M::Mov, AACon, Class::None, Rsp, AddrConst),
        pooled(M::Mov, LACon, Class::None, Reg, AddrLiteral, 8, PoolUse::From),
        e(M::Mov, Spr, Class::None, Reg, SysRegRead),
        e(M::Mov, Reg, Class::None, Spr, SysRegWrite),
        e(M::MovW, Reg, Class::None, Reg, Extend),
        e(M::MovW, MovCon, Class::None, Reg, MoveWide),
        e(M::MovW, BitCon, Class::None, Reg, LogicalImm),
        pooled(M::MovW, VCon, Class::None, Reg, LoadLiteral, 4, PoolUse::From),
        e(M::MovH, Reg, Class::None, Reg, Extend),
        e(M::MovB, Reg, Class::None, Reg, Extend),
        e(M::MovK, VCon, Class::None, Reg, MoveKeep),
        e(M::Sxtb, Reg, Class::None, Reg, Extend),
        // floating moves
        e(M::FmovS, Reg, Class::None, FReg, FpMoveGeneral),
        e(M::FmovS, FReg, Class::None, Reg, FpMoveGeneral),
        e(M::FmovS, FReg, Class::None, FReg, FpUnary),
        e(M::FmovS, ZFCon, Class::None, FReg, FpMoveGeneral),
        e(M::FmovS, FCon, Class::None, FReg, FpImm),
        pooled(M::FmovS, LFCon, Class::None, FReg, LoadLiteral, 4, PoolUse::From),
        e(M::FmovD, Reg, Class::None, FReg, FpMoveGeneral),
        e(M::FmovD, FReg, Class::None, Reg, FpMoveGeneral),
        e(M::FmovD, FReg, Class::None, FReg, FpUnary),
        e(M::FmovD, ZFCon, Class::None, FReg, FpMoveGeneral),
        e(M::FmovD, FCon, Class::None, FReg, FpImm),
        pooled(M::FmovD, LFCon, Class::None, FReg, LoadLiteral, 4, PoolUse::From),
        // branches
        e(M::B, Class::None, Class::None, SBra, Branch),
        e(M::B, Class::None, Class::None, Reg, BranchReg),
        e(M::B, Class::None, Class::None, ZOReg, BranchReg),
        e(M::Bl, Class::None, Class::None, SBra, Branch),
        e(M::Bl, Class::None, Class::None, Reg, BranchReg),
        e(M::Bl, Class::None, Class::None, ZOReg, BranchReg),
        e(M::Ret, Class::None, Class::None, Class::None, BranchReg),
        e(M::Ret, Class::None, Class::None, Reg, BranchReg),
        e(M::Beq, Class::None, Class::None, SBra, CondBranch),
        sized(M::Beq, Class::None, Class::None, LBra, CondBranchFar, 8),
        e(M::Cbz, Reg, Class::None, SBra, CompareBranch),
        sized(M::Cbz, Reg, Class::None, LBra, CompareBranchFar, 8),
        e(M::Tbz, VCon, Reg, SBra, TestBranch),
        sized(M::Tbz, VCon, Reg, LBra, TestBranchFar, 8),
        e(M::Adr, SBra, Class::None, Reg, Adr),
        e(M::Adrp, SBra, Class::None, Reg, Adrp),
        // shifts
        e(M::Lsl, Reg, Reg, Reg, RegRegReg),
        e(M::Lsl, Reg, Class::None, Reg, RegRegReg),
        e(M::Lsl, VCon, Reg, Reg, ShiftImm),
        e(M::Lsl, VCon, Class::None, Reg, ShiftImm),
        // integer data processing
        e(M::Cls, Reg, Class::None, Reg, BitOp),
        e(M::Sdiv, Reg, Reg, Reg, RegRegReg),
        e(M::Sdiv, Reg, Class::None, Reg, RegRegReg),
        e(M::Madd, Reg, Reg, Reg, MulAdd),
        e(M::Mul, Reg, Reg, Reg, MulAdd),
        e(M::Mul, Reg, Class::None, Reg, MulAdd),
        sized(M::Rem, Reg, Reg, Reg, Remainder, 8),
        sized(M::Rem, Reg, Class::None, Reg, Remainder, 8),
        e(M::Bfm, VCon, Reg, Reg, Bitfield),
        e(M::Bfi, VCon, Reg, Reg, BitfieldAlias),
        e(M::Extr, VCon, Reg, Reg, Extract),
        // conditional
        e(M::Csel, Cond, Reg, Reg, CondSelect),
        e(M::Cset, Cond, Class::None, Reg, CondSet),
        e(M::Ccmn, Cond, Reg, VCon, CondCompare),
        // system
        e(M::Svc, Class::None, Class::None, Class::None, Exception),
        e(M::Svc, Class::None, Class::None, VCon, Exception),
        e(M::Eret, Class::None, Class::None, Class::None, NoOperand),
        e(M::Clrex, Class::None, Class::None, Class::None, Clrex),
        e(M::Clrex, Class::None, Class::None, VCon, Clrex),
        e(M::Sys, VCon, Class::None, Class::None, Sys),
        e(M::Sys, VCon, Class::None, Reg, Sys),
        e(M::Sysl, VCon, Class::None, Reg, Sys),
        e(M::Dmb, VCon, Class::None, Class::None, Barrier),
        e(M::Hint, VCon, Class::None, Class::None, Hint),
        e(M::Mrs, Spr, Class::None, Reg, SysRegRead),
        e(M::Msr, Reg, Class::None, Spr, SysRegWrite),
        e(M::Msr, VCon, Class::None, Spr, PstateWrite),
        // exclusive, acquire/release, atomics
        e(M::Ldar, ZOReg, Class::None, Reg, LoadExclusive),
        e(M::Ldxp, ZOReg, Class::None, Pair, LoadExclusive),
        e(M::Stxr, Reg, Class::None, ZOReg, StoreExclusive),
        e(M::Stxp, Pair, Class::None, ZOReg, StoreExclusive),
        e(M::LdaddD, Reg, Class::None, ZOReg, Atomic),
        // pairs
        e(M::Ldp, NPAuto, Class::None, Pair, LoadPair),
        e(M::Ldp, PPAuto, Class::None, Pair, LoadPair),
        e(M::Ldp, NPOReg, Class::None, Pair, LoadPair),
        e(M::Ldp, PPOReg, Class::None, Pair, LoadPair),
        e(M::Ldp, XPre, Class::None, Pair, LoadPair),
        e(M::Ldp, XPost, Class::None, Pair, LoadPair),
        e(M::Stp, Pair, Class::None, NPAuto, StorePair),
        e(M::Stp, Pair, Class::None, PPAuto, StorePair),
        e(M::Stp, Pair, Class::None, NPOReg, StorePair),
        e(M::Stp, Pair, Class::None, PPOReg, StorePair),
        e(M::Stp, Pair, Class::None, XPre, StorePair),
        e(M::Stp, Pair, Class::None, XPost, StorePair),
        // floating point
        e(M::FaddS, FReg, Class::None, FReg, FpArith),
        e(M::FaddS, FReg, Reg, FReg, FpArith),
        e(M::FcvtSD, FReg, Class::None, FReg, FpUnary),
        e(M::FcvtzsD, FReg, Class::None, Reg, FpConvert),
        e(M::ScvtfD, Reg, Class::None, FReg, FpConvert),
        e(M::FcmpS, FReg, Reg, Class::None, FpCompare),
        e(M::FcmpS, ZFCon, Reg, Class::None, FpCompare),
        e(M::FccmpS, Cond, Reg, VCon, FpCondCompare),
        e(M::FcselD, Cond, Reg, FReg, FpCondSelect),
        // crypto
        e(M::Aesd, VReg, Class::None, VReg, CryptoTwo),
        e(M::Sha1c, VReg, Reg, VReg, CryptoThree),
        // data
        e(M::Word, Class::None, Class::None, LCon, Word),
        e(M::Word, Class::None, Class::None, VConAddr, Word),
        sized(M::Dword, Class::None, Class::None, VCon, Dword, 8),
        e(M::Undef, Class::None, Class::None, Class::None, Undefined),
        // pseudo-ops
        sized(M::Text, Class::None, Class::None, TextSize, Pseudo, 0),
        sized(M::Marker, Class::None, Class::None, Class::None, Pseudo, 0),
        sized(M::Pcdata, VCon, Class::None, VCon, Pseudo, 0),
        sized(M::Funcdata, VCon, Class::None, Addr, Pseudo, 0),
    ]
};

/// Alias mnemonics sharing the rule list of a canonical mnemonic. Every
/// canonical mnemonic with rules must appear here, even with no aliases.
pub const ALIASES: &[(Mnemonic, &[Mnemonic])] = {
    use Mnemonic::*;
    &[
        (Add, &[Adds, Sub, Subs, AddW, AddsW, SubW, SubsW]),
        (Cmp, &[CmpW, Cmn, CmnW]),
        (Adc, &[AdcW, Adcs, AdcsW, Sbc, SbcW, Sbcs, SbcsW]),
        (Ngc, &[NgcW, Ngcs, NgcsW]),
        (Neg, &[NegW, Negs, NegsW]),
        (And, &[AndW, Ands, AndsW, Eor, EorW, Orr, OrrW]),
        (Bic, &[BicW, Bics, BicsW, Eon, EonW, Orn, OrnW]),
        (Tst, &[TstW]),
        (Mvn, &[MvnW]),
        (Mov, &[]),
        (MovW, &[MovWU]),
        (MovH, &[MovHU]),
        (MovB, &[MovBU]),
        (MovK, &[MovKW, MovN, MovNW, MovZ, MovZW]),
        (Sxtb, &[SxtbW, Sxth, SxthW, Sxtw, Uxtb, UxtbW, Uxth, UxthW, Uxtw]),
        (FmovS, &[]),
        (FmovD, &[]),
        (B, &[]),
        (Bl, &[]),
        (Ret, &[]),
        (
            Beq,
            &[Bne, Bcs, Bhs, Bcc, Blo, Bmi, Bpl, Bvs, Bvc, Bhi, Bls, Bge, Blt, Bgt, Ble],
        ),
        (Cbz, &[CbzW, Cbnz, CbnzW]),
        (Tbz, &[Tbnz]),
        (Adr, &[]),
        (Adrp, &[]),
        (Lsl, &[LslW, Lsr, LsrW, Asr, AsrW, Ror, RorW]),
        (
            Cls,
            &[ClsW, Clz, ClzW, Rbit, RbitW, Rev, RevW, Rev16, Rev16W, Rev32],
        ),
        (
            Sdiv,
            &[SdivW, Udiv, UdivW, Crc32B, Crc32H, Crc32W, Crc32X, Crc32CB, Crc32CH, Crc32CW, Crc32CX],
        ),
        (Madd, &[MaddW, Msub, MsubW, Smaddl, Smsubl, Umaddl, Umsubl]),
        (Mul, &[MulW, Mneg, MnegW, Smnegl, Smull, Smulh, Umnegl, Umulh, Umull]),
        (Rem, &[RemW, Urem, UremW]),
        (Bfm, &[BfmW, Sbfm, SbfmW, Ubfm, UbfmW]),
        (
            Bfi,
            &[BfiW, Bfxil, BfxilW, Sbfiz, SbfizW, Sbfx, SbfxW, Ubfiz, UbfizW, Ubfx, UbfxW],
        ),
        (Extr, &[ExtrW]),
        (
            Csel,
            &[
                CselW, Csinc, CsincW, Csinv, CsinvW, Csneg, CsnegW, Cinc, CincW, Cinv, CinvW, Cneg,
                CnegW,
            ],
        ),
        (Cset, &[CsetW, Csetm, CsetmW]),
        (Ccmn, &[CcmnW, Ccmp, CcmpW]),
        (Svc, &[Hvc, Smc, Brk, Hlt, Dcps1, Dcps2, Dcps3]),
        (Eret, &[Nop, Wfe, Wfi, Yield, Sev, Sevl, Drps]),
        (Clrex, &[]),
        (Sys, &[At, Dc, Ic, Tlbi]),
        (Sysl, &[]),
        (Dmb, &[Dsb, Isb]),
        (Hint, &[]),
        (Mrs, &[]),
        (Msr, &[]),
        (
            Ldar,
            &[LdarW, LdarB, LdarH, Ldxr, LdxrW, LdxrB, LdxrH, Ldaxr, LdaxrW, LdaxrB, LdaxrH],
        ),
        (Ldxp, &[LdxpW, Ldaxp, LdaxpW]),
        (
            Stxr,
            &[
                StxrW, StxrB, StxrH, Stlxr, StlxrW, StlxrB, StlxrH, Stlr, StlrW, StlrB, StlrH,
            ],
        ),
        (Stxp, &[StxpW, Stlxp, StlxpW]),
        (
            LdaddD,
            &[
                LdaddW, LdaddalD, LdaddalW, LdclrD, LdclrW, LdeorD, LdeorW, LdsetD, LdsetW, SwpD,
                SwpW, SwpalD, SwpalW,
            ],
        ),
        (Ldp, &[LdpW]),
        (Stp, &[StpW]),
        (
            FaddS,
            &[
                FaddD, FsubS, FsubD, FmulS, FmulD, FnmulS, FnmulD, FdivS, FdivD, FmaxS, FmaxD,
                FminS, FminD, FmaxnmS, FmaxnmD, FminnmS, FminnmD,
            ],
        ),
        (
            FcvtSD,
            &[
                FcvtDS, FcvtSH, FcvtHS, FcvtDH, FcvtHD, FabsS, FabsD, FnegS, FnegD, FsqrtS, FsqrtD,
                FrintnS, FrintnD, FrintpS, FrintpD, FrintmS, FrintmD, FrintzS, FrintzD, FrintaS,
                FrintaD, FrintxS, FrintxD, FrintiS, FrintiD,
            ],
        ),
        (
            FcvtzsD,
            &[FcvtzsDW, FcvtzsS, FcvtzsSW, FcvtzuD, FcvtzuDW, FcvtzuS, FcvtzuSW],
        ),
        (
            ScvtfD,
            &[ScvtfS, ScvtfWD, ScvtfWS, UcvtfD, UcvtfS, UcvtfWD, UcvtfWS],
        ),
        (FcmpS, &[FcmpD, FcmpeS, FcmpeD]),
        (FccmpS, &[FccmpD, FccmpeS, FccmpeD]),
        (FcselD, &[FcselS]),
        (Aesd, &[Aese, Aesmc, Aesimc, Sha1h, Sha1su1, Sha256su0]),
        (
            Sha1c,
            &[Sha1p, Sha1m, Sha1su0, Sha256h, Sha256h2, Sha256su1],
        ),
        (Word, &[]),
        (Dword, &[]),
        (Undef, &[]),
        (Text, &[]),
        (Marker, &[]),
        (Pcdata, &[]),
        (Funcdata, &[]),
    ]
};

/// The built catalog: sorted rules plus a `[start, end)` range per
/// mnemonic.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: Vec<Encoding>,
    ranges: Vec<Option<(u32, u32)>>,
}

impl Catalog {
    /// Sort `entries`, group them per mnemonic and copy each group's range
    /// onto the aliases listed in `aliases`.
    ///
    /// # Errors
    ///
    /// [`AsmError::CatalogInconsistency`] if a mnemonic with rules is missing
    /// from `aliases`, or an alias would overwrite a range it already has.
    pub fn build(
        entries: impl IntoIterator<Item = Encoding>,
        aliases: &[(Mnemonic, &[Mnemonic])],
    ) -> Result<Catalog, AsmError> {
        let mut rules: Vec<Encoding> = entries.into_iter().collect();
        // Stable: rules with identical keys keep declaration order.
        rules.sort_by_key(|r| (r.mnemonic, r.classes));

        let mut ranges: Vec<Option<(u32, u32)>> = vec![None; Mnemonic::ALL.len()];
        let mut start = 0usize;
        while start < rules.len() {
            let m = rules[start].mnemonic;
            let end = start + rules[start..].iter().take_while(|r| r.mnemonic == m).count();
            let range = (start as u32, end as u32);

            let Some((_, alias_list)) = aliases.iter().find(|(canon, _)| *canon == m) else {
                return Err(AsmError::inconsistent(format!("unknown op in build: {m}")));
            };
            if ranges[m.index()].is_some() {
                return Err(AsmError::inconsistent(format!(
                    "{m} is both an alias and has its own rules"
                )));
            }
            ranges[m.index()] = Some(range);
            for &alias in *alias_list {
                if ranges[alias.index()].is_some() {
                    return Err(AsmError::inconsistent(format!(
                        "alias {alias} of {m} already has rules"
                    )));
                }
                ranges[alias.index()] = Some(range);
            }
            start = end;
        }
        Ok(Catalog { rules, ranges })
    }

    /// The ordered rules for `m`; empty if the mnemonic has none.
    pub fn rules(&self, m: Mnemonic) -> &[Encoding] {
        match self.ranges[m.index()] {
            Some((start, end)) => &self.rules[start as usize..end as usize],
            None => &[],
        }
    }

    /// First rule for `m` accepting `classes`.
    pub fn find(&self, m: Mnemonic, classes: [Class; 3]) -> Option<&Encoding> {
        self.rules(m).iter().find(|r| r.accepts(classes))
    }

    /// Total number of distinct rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// All built-in rules, unsorted.
pub fn builtin_rules() -> impl Iterator<Item = Encoding> {
    LOAD_STORE
        .iter()
        .flatten()
        .chain(RULES.iter())
        .cloned()
}

/// The process-wide catalog, built on first use.
///
/// # Panics
///
/// If the built-in tables are inconsistent. That is a defect in this crate,
/// not in the program being assembled.
pub fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| match Catalog::build(builtin_rules(), ALIASES) {
        Ok(c) => {
            tracing::debug!(rules = c.len(), "encoding catalog built");
            c
        }
        Err(err) => panic!("{err}"),
    })
}

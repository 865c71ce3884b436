//! Fixed opcode bits per instruction family.
//!
//! Each function maps a mnemonic to the bits that select the operation;
//! the encoder ORs operand fields into the result. A mnemonic a family does
//! not know means the catalog routed it to the wrong encoder, which is a
//! [`AsmError::CatalogInconsistency`].

use crate::error::AsmError;
use crate::ir::{Cond, Mnemonic};

use Mnemonic::*;

fn missing(m: Mnemonic, family: &str) -> AsmError {
    AsmError::inconsistent(format!("{m} has no {family} opcode"))
}

/// Operates on 32-bit registers.
pub fn is_w(m: Mnemonic) -> bool {
    matches!(
        m,
        AddW | AddsW
            | SubW
            | SubsW
            | AdcW
            | AdcsW
            | SbcW
            | SbcsW
            | NgcW
            | NgcsW
            | NegW
            | NegsW
            | CmpW
            | CmnW
            | AndW
            | AndsW
            | EorW
            | OrrW
            | BicW
            | BicsW
            | EonW
            | OrnW
            | TstW
            | MvnW
            | MovW
            | MovWU
            | MovKW
            | MovNW
            | MovZW
            | CbzW
            | CbnzW
            | LslW
            | LsrW
            | AsrW
            | RorW
            | ClsW
            | ClzW
            | RbitW
            | RevW
            | Rev16W
            | SdivW
            | UdivW
            | MaddW
            | MsubW
            | MulW
            | MnegW
            | RemW
            | UremW
            | BfmW
            | SbfmW
            | UbfmW
            | BfiW
            | BfxilW
            | SbfizW
            | SbfxW
            | UbfizW
            | UbfxW
            | ExtrW
            | SxtbW
            | SxthW
            | UxtbW
            | UxthW
            | CcmnW
            | CcmpW
            | CselW
            | CsincW
            | CsinvW
            | CsnegW
            | CincW
            | CinvW
            | CnegW
            | CsetW
            | CsetmW
            | LdpW
            | StpW
    )
}

/// Data-processing (register) forms: shifted-register add/sub/logical with
/// a zero shift, add/sub with carry, variable shifts, divide and CRC.
pub fn op_rrr(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Add | Neg => 0x8B00_0000,
        AddW | NegW => 0x0B00_0000,
        Adds | Cmn => 0xAB00_0000,
        AddsW | CmnW => 0x2B00_0000,
        Sub => 0xCB00_0000,
        SubW => 0x4B00_0000,
        Subs | Cmp | Negs => 0xEB00_0000,
        SubsW | CmpW | NegsW => 0x6B00_0000,
        Adc => 0x9A00_0000,
        AdcW => 0x1A00_0000,
        Adcs => 0xBA00_0000,
        AdcsW => 0x3A00_0000,
        Sbc | Ngc => 0xDA00_0000,
        SbcW | NgcW => 0x5A00_0000,
        Sbcs | Ngcs => 0xFA00_0000,
        SbcsW | NgcsW => 0x7A00_0000,
        And => 0x8A00_0000,
        AndW => 0x0A00_0000,
        Orr | Mov => 0xAA00_0000,
        OrrW => 0x2A00_0000,
        Eor => 0xCA00_0000,
        EorW => 0x4A00_0000,
        Ands | Tst => 0xEA00_0000,
        AndsW | TstW => 0x6A00_0000,
        Bic => 0x8A20_0000,
        BicW => 0x0A20_0000,
        Orn | Mvn => 0xAA20_0000,
        OrnW | MvnW => 0x2A20_0000,
        Eon => 0xCA20_0000,
        EonW => 0x4A20_0000,
        Bics => 0xEA20_0000,
        BicsW => 0x6A20_0000,
        Lsl => 0x9AC0_2000,
        LslW => 0x1AC0_2000,
        Lsr => 0x9AC0_2400,
        LsrW => 0x1AC0_2400,
        Asr => 0x9AC0_2800,
        AsrW => 0x1AC0_2800,
        Ror => 0x9AC0_2C00,
        RorW => 0x1AC0_2C00,
        Sdiv => 0x9AC0_0C00,
        SdivW => 0x1AC0_0C00,
        Udiv => 0x9AC0_0800,
        UdivW => 0x1AC0_0800,
        Crc32B => 0x1AC0_4000,
        Crc32H => 0x1AC0_4400,
        Crc32W => 0x1AC0_4800,
        Crc32X => 0x9AC0_4C00,
        Crc32CB => 0x1AC0_5000,
        Crc32CH => 0x1AC0_5400,
        Crc32CW => 0x1AC0_5800,
        Crc32CX => 0x9AC0_5C00,
        _ => return Err(missing(m, "register")),
    })
}

/// `Neg`/`Ngc`/`Mvn` read the zero register as their first source.
pub fn zero_rn(m: Mnemonic) -> bool {
    matches!(
        m,
        Neg | NegW | Negs | NegsW | Ngc | NgcW | Ngcs | NgcsW | Mvn | MvnW
    )
}

/// Add/subtract (immediate).
pub fn op_addsub_imm(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Add => 0x9100_0000,
        AddW => 0x1100_0000,
        Adds | Cmn => 0xB100_0000,
        AddsW | CmnW => 0x3100_0000,
        Sub => 0xD100_0000,
        SubW => 0x5100_0000,
        Subs | Cmp => 0xF100_0000,
        SubsW | CmpW => 0x7100_0000,
        _ => return Err(missing(m, "add/sub immediate")),
    })
}

/// Add/subtract (extended register), option and amount zero.
pub fn op_addsub_ext(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Add => 0x8B20_0000,
        AddW => 0x0B20_0000,
        Adds | Cmn => 0xAB20_0000,
        AddsW | CmnW => 0x2B20_0000,
        Sub => 0xCB20_0000,
        SubW => 0x4B20_0000,
        Subs | Cmp => 0xEB20_0000,
        SubsW | CmpW => 0x6B20_0000,
        _ => return Err(missing(m, "add/sub extended")),
    })
}

/// Logical (immediate). `BIC`-style mnemonics map to their positive
/// counterpart; the caller inverts the immediate.
pub fn op_logical_imm(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        And | Bic => 0x9200_0000,
        AndW | BicW => 0x1200_0000,
        Orr | Orn | Mov => 0xB200_0000,
        OrrW | OrnW | MovW | MovWU => 0x3200_0000,
        Eor | Eon => 0xD200_0000,
        EorW | EonW => 0x5200_0000,
        Ands | Bics | Tst => 0xF200_0000,
        AndsW | BicsW | TstW => 0x7200_0000,
        _ => return Err(missing(m, "logical immediate")),
    })
}

/// Whether a logical-immediate mnemonic takes the complement of its operand.
pub fn inverts_imm(m: Mnemonic) -> bool {
    matches!(
        m,
        Bic | BicW | Bics | BicsW | Orn | OrnW | Eon | EonW
    )
}

/// Move wide (immediate).
pub fn op_move_wide(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        MovN => 0x9280_0000,
        MovNW => 0x1280_0000,
        MovZ => 0xD280_0000,
        MovZW => 0x5280_0000,
        MovK => 0xF280_0000,
        MovKW => 0x7280_0000,
        _ => return Err(missing(m, "move wide")),
    })
}

/// Unconditional immediate branches.
pub fn op_branch(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        B => 0x1400_0000,
        Bl => 0x9400_0000,
        _ => return Err(missing(m, "branch")),
    })
}

/// Condition tested by a `B.cond` mnemonic.
pub fn branch_cond(m: Mnemonic) -> Result<Cond, AsmError> {
    Ok(match m {
        Beq => Cond::Eq,
        Bne => Cond::Ne,
        Bcs | Bhs => Cond::Hs,
        Bcc | Blo => Cond::Lo,
        Bmi => Cond::Mi,
        Bpl => Cond::Pl,
        Bvs => Cond::Vs,
        Bvc => Cond::Vc,
        Bhi => Cond::Hi,
        Bls => Cond::Ls,
        Bge => Cond::Ge,
        Blt => Cond::Lt,
        Bgt => Cond::Gt,
        Ble => Cond::Le,
        _ => return Err(missing(m, "conditional branch")),
    })
}

/// `B.cond` base; the condition goes in bits 0..4.
pub const OP_BCOND: u32 = 0x5400_0000;

/// Compare and branch.
pub fn op_compare_branch(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Cbz => 0xB400_0000,
        CbzW => 0x3400_0000,
        Cbnz => 0xB500_0000,
        CbnzW => 0x3500_0000,
        _ => return Err(missing(m, "compare and branch")),
    })
}

/// The same comparison with the opposite outcome.
pub fn invert_compare_branch(m: Mnemonic) -> Result<Mnemonic, AsmError> {
    Ok(match m {
        Cbz => Cbnz,
        CbzW => CbnzW,
        Cbnz => Cbz,
        CbnzW => CbzW,
        Tbz => Tbnz,
        Tbnz => Tbz,
        _ => return Err(missing(m, "compare and branch")),
    })
}

/// Test bit and branch.
pub fn op_test_branch(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Tbz => 0x3600_0000,
        Tbnz => 0x3700_0000,
        _ => return Err(missing(m, "test and branch")),
    })
}

/// Branch to register.
pub fn op_branch_reg(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        B => 0xD61F_0000,
        Bl => 0xD63F_0000,
        Ret => 0xD65F_0000,
        _ => return Err(missing(m, "branch register")),
    })
}

/// Data-processing (one source).
pub fn op_bit(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Rbit => 0xDAC0_0000,
        RbitW => 0x5AC0_0000,
        Rev16 => 0xDAC0_0400,
        Rev16W => 0x5AC0_0400,
        Rev32 => 0xDAC0_0800,
        Rev => 0xDAC0_0C00,
        RevW => 0x5AC0_0800,
        Clz => 0xDAC0_1000,
        ClzW => 0x5AC0_1000,
        Cls => 0xDAC0_1400,
        ClsW => 0x5AC0_1400,
        _ => return Err(missing(m, "bit operation")),
    })
}

/// Data-processing (three source). Two-operand multiplies use the
/// accumulate form with the zero register as addend.
pub fn op_muladd(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Madd | Mul => 0x9B00_0000,
        MaddW | MulW => 0x1B00_0000,
        Msub | Mneg => 0x9B00_8000,
        MsubW | MnegW => 0x1B00_8000,
        Smaddl | Smull => 0x9B20_0000,
        Smsubl | Smnegl => 0x9B20_8000,
        Umaddl | Umull => 0x9BA0_0000,
        Umsubl | Umnegl => 0x9BA0_8000,
        Smulh => 0x9B40_0000,
        Umulh => 0x9BC0_0000,
        _ => return Err(missing(m, "multiply")),
    })
}

/// Divide and multiply-subtract pair computing a remainder.
pub fn op_remainder(m: Mnemonic) -> Result<(u32, u32), AsmError> {
    Ok(match m {
        Rem => (op_rrr(Sdiv)?, op_muladd(Msub)?),
        RemW => (op_rrr(SdivW)?, op_muladd(MsubW)?),
        Urem => (op_rrr(Udiv)?, op_muladd(Msub)?),
        UremW => (op_rrr(UdivW)?, op_muladd(MsubW)?),
        _ => return Err(missing(m, "remainder")),
    })
}

/// Conditional select.
pub fn op_cond_select(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Csel => 0x9A80_0000,
        CselW => 0x1A80_0000,
        Csinc | Cinc | Cset => 0x9A80_0400,
        CsincW | CincW | CsetW => 0x1A80_0400,
        Csinv | Cinv | Csetm => 0xDA80_0000,
        CsinvW | CinvW | CsetmW => 0x5A80_0000,
        Csneg | Cneg => 0xDA80_0400,
        CsnegW | CnegW => 0x5A80_0400,
        _ => return Err(missing(m, "conditional select")),
    })
}

/// `CINC`-style aliases: both sources are `Rn` and the condition inverted.
pub fn is_cond_alias(m: Mnemonic) -> bool {
    matches!(m, Cinc | CincW | Cinv | CinvW | Cneg | CnegW)
}

/// Conditional compare (register); the immediate form sets bit 11.
pub fn op_cond_compare(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Ccmn => 0xBA40_0000,
        CcmnW => 0x3A40_0000,
        Ccmp => 0xFA40_0000,
        CcmpW => 0x7A40_0000,
        _ => return Err(missing(m, "conditional compare")),
    })
}

/// Bit-field move, including the extension and shift aliases that reduce to
/// one. 64-bit forms include `N`.
pub fn op_bitfield(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Sbfm | Sbfiz | Sbfx | Asr | Sxtb | Sxth | Sxtw | MovB | MovH | MovW => 0x9340_0000,
        SbfmW | SbfizW | SbfxW | AsrW | SxtbW | SxthW => 0x1300_0000,
        Bfm | Bfi | Bfxil => 0xB340_0000,
        BfmW | BfiW | BfxilW => 0x3300_0000,
        Ubfm | Ubfiz | Ubfx | Lsl | Lsr | Uxtw | MovWU => 0xD340_0000,
        UbfmW | UbfizW | UbfxW | LslW | LsrW | Uxtb | UxtbW | Uxth | UxthW | MovBU | MovHU => {
            0x5300_0000
        }
        _ => return Err(missing(m, "bit-field")),
    })
}

/// Extract; 64-bit form includes `N`.
pub fn op_extract(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Extr | Ror => 0x93C0_0000,
        ExtrW | RorW => 0x1380_0000,
        _ => return Err(missing(m, "extract")),
    })
}

/// Exception generation; the 16-bit immediate goes in bits 5..20.
pub fn op_exception(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Svc => 0xD400_0001,
        Hvc => 0xD400_0002,
        Smc => 0xD400_0003,
        Brk => 0xD420_0000,
        Hlt => 0xD440_0000,
        Dcps1 => 0xD4A0_0001,
        Dcps2 => 0xD4A0_0002,
        Dcps3 => 0xD4A0_0003,
        _ => return Err(missing(m, "exception")),
    })
}

/// Instructions without operands.
pub fn op_zero(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Eret => 0xD69F_03E0,
        Drps => 0xD6BF_03E0,
        Nop => 0xD503_201F,
        Yield => 0xD503_203F,
        Wfe => 0xD503_205F,
        Wfi => 0xD503_207F,
        Sev => 0xD503_209F,
        Sevl => 0xD503_20BF,
        _ => return Err(missing(m, "no-operand")),
    })
}

pub const OP_CLREX: u32 = 0xD503_305F;
pub const OP_HINT: u32 = 0xD503_201F;
pub const OP_MSR_IMM: u32 = 0xD500_401F;

/// Barriers; `CRm` goes in bits 8..11.
pub fn op_barrier(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Dmb => 0xD503_30BF,
        Dsb => 0xD503_309F,
        Isb => 0xD503_30DF,
        _ => return Err(missing(m, "barrier")),
    })
}

/// System instructions; the packed `op1:CRn:CRm:op2` operand is ORed in.
pub fn op_sys(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Sys | At | Dc | Ic | Tlbi => 0xD508_0000,
        Sysl => 0xD528_0000,
        _ => return Err(missing(m, "system")),
    })
}

/// System register move: `l` selects `MRS`.
pub fn sysop(l: u32, op0: u32, op1: u32, crn: u32, crm: u32, op2: u32, rt: u32) -> u32 {
    0x354 << 22 | l << 21 | op0 << 19 | op1 << 16 | crn << 12 | crm << 8 | op2 << 5 | rt
}

/// log2 of the access size of a load/store mnemonic.
pub fn movesize(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Mov | FmovD => 3,
        MovW | MovWU | FmovS => 2,
        MovH | MovHU => 1,
        MovB | MovBU => 0,
        _ => return Err(missing(m, "load/store")),
    })
}

/// Load (unsigned scaled 12-bit offset).
pub fn op_load(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Mov => 0xF940_0000,
        MovW => 0xB980_0000,
        MovWU => 0xB940_0000,
        MovH => 0x7980_0000,
        MovHU => 0x7940_0000,
        MovB => 0x3980_0000,
        MovBU => 0x3940_0000,
        FmovS => 0xBD40_0000,
        FmovD => 0xFD40_0000,
        _ => return Err(missing(m, "load")),
    })
}

/// Store (unsigned scaled 12-bit offset).
pub fn op_store(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Mov => 0xF900_0000,
        MovW | MovWU => 0xB900_0000,
        MovH | MovHU => 0x7900_0000,
        MovB | MovBU => 0x3900_0000,
        FmovS => 0xBD00_0000,
        FmovD => 0xFD00_0000,
        _ => return Err(missing(m, "store")),
    })
}

/// Turn a scaled-offset load/store opcode into its 9-bit unscaled form.
pub const fn unscaled(op: u32) -> u32 {
    op & !(1 << 24)
}

/// Load register (literal). `w`: 0 word, 1 double word, 2 sign-extended
/// word.
pub const fn op_load_literal(w: u32, fp: bool) -> u32 {
    w << 30 | (fp as u32) << 26 | 3 << 27
}

/// `ADR` (`page` false) or `ADRP`.
pub const fn op_adr(page: bool, disp: u32, rt: u32) -> u32 {
    (page as u32) << 31 | (disp & 3) << 29 | 0x10 << 24 | ((disp >> 2) & 0x7FFFF) << 5 | rt
}

/// Load-exclusive and load-acquire, with the unused `Rs` field set.
pub fn op_load_exclusive(m: Mnemonic) -> Result<u32, AsmError> {
    let op = match m {
        Ldar => 0xC8C0_FC00,
        LdarW => 0x88C0_FC00,
        LdarB => 0x08C0_FC00,
        LdarH => 0x48C0_FC00,
        Ldxr => 0xC840_7C00,
        LdxrW => 0x8840_7C00,
        LdxrB => 0x0840_7C00,
        LdxrH => 0x4840_7C00,
        Ldaxr => 0xC840_FC00,
        LdaxrW => 0x8840_FC00,
        LdaxrB => 0x0840_FC00,
        LdaxrH => 0x4840_FC00,
        Ldxp => 0xC860_0000,
        LdxpW => 0x8860_0000,
        Ldaxp => 0xC860_8000,
        LdaxpW => 0x8860_8000,
        _ => return Err(missing(m, "load exclusive")),
    };
    Ok(op | 0x1F << 16)
}

/// Store-exclusive and store-release; the status register goes in bits
/// 16..20.
pub fn op_store_exclusive(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Stlr => 0xC880_FC00,
        StlrW => 0x8880_FC00,
        StlrB => 0x0880_FC00,
        StlrH => 0x4880_FC00,
        Stxr => 0xC800_7C00,
        StxrW => 0x8800_7C00,
        StxrB => 0x0800_7C00,
        StxrH => 0x4800_7C00,
        Stlxr => 0xC800_FC00,
        StlxrW => 0x8800_FC00,
        StlxrB => 0x0800_FC00,
        StlxrH => 0x4800_FC00,
        Stxp => 0xC820_0000,
        StxpW => 0x8820_0000,
        Stlxp => 0xC820_8000,
        StlxpW => 0x8820_8000,
        _ => return Err(missing(m, "store exclusive")),
    })
}

/// Store-release without a status register.
pub fn is_store_release(m: Mnemonic) -> bool {
    matches!(m, Stlr | StlrW | StlrB | StlrH)
}

/// Atomic memory operations.
pub fn op_atomic(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        LdaddD => 0xF820_0000,
        LdaddW => 0xB820_0000,
        LdaddalD => 0xF8E0_0000,
        LdaddalW => 0xB8E0_0000,
        LdclrD => 0xF820_1000,
        LdclrW => 0xB820_1000,
        LdeorD => 0xF820_2000,
        LdeorW => 0xB820_2000,
        LdsetD => 0xF820_3000,
        LdsetW => 0xB820_3000,
        SwpD => 0xF820_8000,
        SwpW => 0xB820_8000,
        SwpalD => 0xF8E0_8000,
        SwpalW => 0xB8E0_8000,
        _ => return Err(missing(m, "atomic")),
    })
}

/// Load/store pair; the addressing mode goes in bits 23..24.
pub fn op_pair(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Ldp => 0xA840_0000,
        LdpW => 0x2840_0000,
        Stp => 0xA800_0000,
        StpW => 0x2800_0000,
        _ => return Err(missing(m, "pair")),
    })
}

/// Floating point type field: 0 single, 1 double, 3 half.
const fn fp_type(t: u32) -> u32 {
    t << 22
}

/// Floating point data-processing (two source).
pub fn op_fp2(m: Mnemonic) -> Result<u32, AsmError> {
    let (op, t) = match m {
        FmulS => (0, 0),
        FmulD => (0, 1),
        FdivS => (1, 0),
        FdivD => (1, 1),
        FaddS => (2, 0),
        FaddD => (2, 1),
        FsubS => (3, 0),
        FsubD => (3, 1),
        FmaxS => (4, 0),
        FmaxD => (4, 1),
        FminS => (5, 0),
        FminD => (5, 1),
        FmaxnmS => (6, 0),
        FmaxnmD => (6, 1),
        FminnmS => (7, 0),
        FminnmD => (7, 1),
        FnmulS => (8, 0),
        FnmulD => (8, 1),
        _ => return Err(missing(m, "floating point arithmetic")),
    };
    Ok(0x1E20_0800 | fp_type(t) | op << 12)
}

/// Floating point data-processing (one source). The type field is the
/// source precision.
pub fn op_fp1(m: Mnemonic) -> Result<u32, AsmError> {
    let (op, t) = match m {
        FmovS => (0, 0),
        FmovD => (0, 1),
        FabsS => (1, 0),
        FabsD => (1, 1),
        FnegS => (2, 0),
        FnegD => (2, 1),
        FsqrtS => (3, 0),
        FsqrtD => (3, 1),
        FcvtDS => (4, 1),
        FcvtHS => (4, 3),
        FcvtSD => (5, 0),
        FcvtHD => (5, 3),
        FcvtSH => (7, 0),
        FcvtDH => (7, 1),
        FrintnS => (8, 0),
        FrintnD => (8, 1),
        FrintpS => (9, 0),
        FrintpD => (9, 1),
        FrintmS => (10, 0),
        FrintmD => (10, 1),
        FrintzS => (11, 0),
        FrintzD => (11, 1),
        FrintaS => (12, 0),
        FrintaD => (12, 1),
        FrintxS => (14, 0),
        FrintxD => (14, 1),
        FrintiS => (15, 0),
        FrintiD => (15, 1),
        _ => return Err(missing(m, "floating point unary")),
    };
    Ok(0x1E20_4000 | fp_type(t) | op << 15)
}

/// Conversions between floating point and integer registers.
pub fn op_fp_convert(m: Mnemonic) -> Result<u32, AsmError> {
    // (sf, type, rmode, opcode)
    let (sf, t, rmode, op) = match m {
        FcvtzsD => (1, 1, 3, 0),
        FcvtzsDW => (0, 1, 3, 0),
        FcvtzsS => (1, 0, 3, 0),
        FcvtzsSW => (0, 0, 3, 0),
        FcvtzuD => (1, 1, 3, 1),
        FcvtzuDW => (0, 1, 3, 1),
        FcvtzuS => (1, 0, 3, 1),
        FcvtzuSW => (0, 0, 3, 1),
        ScvtfD => (1, 1, 0, 2),
        ScvtfS => (1, 0, 0, 2),
        ScvtfWD => (0, 1, 0, 2),
        ScvtfWS => (0, 0, 0, 2),
        UcvtfD => (1, 1, 0, 3),
        UcvtfS => (1, 0, 0, 3),
        UcvtfWD => (0, 1, 0, 3),
        UcvtfWS => (0, 0, 0, 3),
        _ => return Err(missing(m, "floating point convert")),
    };
    Ok(sf << 31 | 0x1E20_0000 | fp_type(t) | rmode << 19 | op << 16)
}

/// `FMOV` between general and floating point registers. `to_fp` selects
/// the direction.
pub fn op_fp_move_general(m: Mnemonic, to_fp: bool) -> Result<u32, AsmError> {
    let op = match m {
        FmovS => 0x1E26_0000,
        FmovD => 0x9E66_0000,
        _ => return Err(missing(m, "floating point move")),
    };
    Ok(op | u32::from(to_fp) << 16)
}

/// `FMOV` (immediate); the 8-bit value goes in bits 13..20.
pub fn op_fp_imm(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        FmovS => 0x1E20_1000,
        FmovD => 0x1E60_1000,
        _ => return Err(missing(m, "floating point immediate")),
    })
}

/// Floating point compare; comparing against zero sets bit 3.
pub fn op_fp_compare(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        FcmpS => 0x1E20_2000,
        FcmpD => 0x1E60_2000,
        FcmpeS => 0x1E20_2010,
        FcmpeD => 0x1E60_2010,
        _ => return Err(missing(m, "floating point compare")),
    })
}

/// Floating point conditional compare.
pub fn op_fp_cond_compare(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        FccmpS => 0x1E20_0400,
        FccmpD => 0x1E60_0400,
        FccmpeS => 0x1E20_0410,
        FccmpeD => 0x1E60_0410,
        _ => return Err(missing(m, "floating point conditional compare")),
    })
}

/// Floating point conditional select.
pub fn op_fp_cond_select(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        FcselS => 0x1E20_0C00,
        FcselD => 0x1E60_0C00,
        _ => return Err(missing(m, "floating point conditional select")),
    })
}

/// Cryptographic two-register operations.
pub fn op_crypto2(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Aese => 0x4E28_4800,
        Aesd => 0x4E28_5800,
        Aesmc => 0x4E28_6800,
        Aesimc => 0x4E28_7800,
        Sha1h => 0x5E28_0800,
        Sha1su1 => 0x5E28_1800,
        Sha256su0 => 0x5E28_2800,
        _ => return Err(missing(m, "crypto")),
    })
}

/// Cryptographic three-register SHA operations.
pub fn op_crypto3(m: Mnemonic) -> Result<u32, AsmError> {
    Ok(match m {
        Sha1c => 0x5E00_0000,
        Sha1p => 0x5E00_1000,
        Sha1m => 0x5E00_2000,
        Sha1su0 => 0x5E00_3000,
        Sha256h => 0x5E00_4000,
        Sha256h2 => 0x5E00_5000,
        Sha256su1 => 0x5E00_6000,
        _ => return Err(missing(m, "crypto")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_variants_clear_sf() {
        assert_eq!(op_rrr(Add).unwrap() & !(1 << 31), op_rrr(AddW).unwrap());
        assert_eq!(op_rrr(Lsl).unwrap() & !(1 << 31), op_rrr(LslW).unwrap());
        assert_eq!(
            op_addsub_imm(Subs).unwrap() & !(1 << 31),
            op_addsub_imm(SubsW).unwrap()
        );
        assert_eq!(
            op_move_wide(MovK).unwrap() & !(1 << 31),
            op_move_wide(MovKW).unwrap()
        );
    }

    #[test]
    fn comparisons_share_flag_setting_opcodes() {
        assert_eq!(op_rrr(Cmp).unwrap(), op_rrr(Subs).unwrap());
        assert_eq!(op_addsub_imm(Cmn).unwrap(), op_addsub_imm(Adds).unwrap());
        assert_eq!(op_rrr(Tst).unwrap(), op_rrr(Ands).unwrap());
    }

    #[test]
    fn unknown_mnemonic_is_inconsistent() {
        let err = op_rrr(Ldar).unwrap_err();
        assert!(matches!(err, AsmError::CatalogInconsistency { .. }));
        assert!(err.to_string().contains("LDAR"));
    }

    #[test]
    fn literal_loads() {
        assert_eq!(op_load_literal(1, false), 0x5800_0000);
        assert_eq!(op_load_literal(0, false), 0x1800_0000);
        assert_eq!(op_load_literal(2, false), 0x9800_0000);
        assert_eq!(op_load_literal(0, true), 0x1C00_0000);
        assert_eq!(op_load_literal(1, true), 0x5C00_0000);
    }

    #[test]
    fn fp_families() {
        assert_eq!(op_fp2(FaddS).unwrap(), 0x1E20_2800);
        assert_eq!(op_fp2(FaddD).unwrap(), 0x1E60_2800);
        assert_eq!(op_fp1(FcvtSD).unwrap(), 0x1E22_C000);
        assert_eq!(op_fp1(FcvtDS).unwrap(), 0x1E62_4000);
        assert_eq!(op_fp_convert(FcvtzsD).unwrap(), 0x9E78_0000);
        assert_eq!(op_fp_convert(ScvtfD).unwrap(), 0x9E62_0000);
    }

    #[test]
    fn system_register_move() {
        // MRS X0, NZCV
        assert_eq!(sysop(1, 3, 3, 4, 2, 0, 0), 0xD53B_4200);
    }

    #[test]
    fn unscaled_clears_bit_24() {
        assert_eq!(unscaled(op_load(Mov).unwrap()), 0xF840_0000);
        assert_eq!(unscaled(op_store(MovB).unwrap()), 0x3800_0000);
    }

    #[test]
    fn adr_splits_displacement() {
        // ADR X3, .+0x1005
        assert_eq!(op_adr(false, 0x1005, 3), 0x3000_8023);
    }
}

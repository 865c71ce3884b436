//! Instruction records, operands, registers and the program arena.
//!
//! The instruction-selection stage builds a [`Program`] out of [`Inst`]
//! records; the back end only annotates them (program counter, long-branch
//! refinement, cached encoding descriptor) and splices literal-pool records
//! into the sequence.

use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;

use crate::error::AsmError;
use crate::optab::Encoding;

// ── Registers ──────────────────────────────────────────────────────────────

/// Register bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegBank {
    /// General-purpose `R0`..`R30`, with number 31 meaning the zero register.
    General,
    /// The stack pointer (encoded as 31 where the instruction allows it).
    Sp,
    /// Scalar floating point `F0`..`F31`.
    Float,
    /// SIMD vector `V0`..`V31`.
    Vector,
}

/// A machine register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reg {
    bank: RegBank,
    num: u8,
}

impl Reg {
    /// Zero register.
    pub const ZR: Reg = Reg::r(31);
    /// Stack pointer.
    pub const SP: Reg = Reg {
        bank: RegBank::Sp,
        num: 31,
    };
    /// Link register.
    pub const LR: Reg = Reg::r(30);
    /// Scratch register reserved for multi-instruction expansions.
    pub const TMP: Reg = Reg::r(27);

    /// General register `Rn` (31 is the zero register).
    pub const fn r(n: u8) -> Reg {
        Reg {
            bank: RegBank::General,
            num: n & 31,
        }
    }

    /// Floating point register `Fn`.
    pub const fn f(n: u8) -> Reg {
        Reg {
            bank: RegBank::Float,
            num: n & 31,
        }
    }

    /// Vector register `Vn`.
    pub const fn v(n: u8) -> Reg {
        Reg {
            bank: RegBank::Vector,
            num: n & 31,
        }
    }

    /// Register bank.
    pub const fn bank(self) -> RegBank {
        self.bank
    }

    /// 5-bit register field value.
    pub const fn num(self) -> u32 {
        self.num as u32
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bank {
            RegBank::General if self.num == 31 => write!(f, "ZR"),
            RegBank::General => write!(f, "R{}", self.num),
            RegBank::Sp => write!(f, "RSP"),
            RegBank::Float => write!(f, "F{}", self.num),
            RegBank::Vector => write!(f, "V{}", self.num),
        }
    }
}

/// Condition code for conditional branches, selects and compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cond {
    Eq,
    Ne,
    Hs,
    Lo,
    Mi,
    Pl,
    Vs,
    Vc,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Al,
    Nv,
}

impl Cond {
    const ALL: [Cond; 16] = [
        Cond::Eq,
        Cond::Ne,
        Cond::Hs,
        Cond::Lo,
        Cond::Mi,
        Cond::Pl,
        Cond::Vs,
        Cond::Vc,
        Cond::Hi,
        Cond::Ls,
        Cond::Ge,
        Cond::Lt,
        Cond::Gt,
        Cond::Le,
        Cond::Al,
        Cond::Nv,
    ];

    /// 4-bit condition field.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// The opposite condition (flips the low bit).
    pub fn invert(self) -> Cond {
        Cond::ALL[(self.code() ^ 1) as usize]
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cond::Eq => "EQ",
            Cond::Ne => "NE",
            Cond::Hs => "HS",
            Cond::Lo => "LO",
            Cond::Mi => "MI",
            Cond::Pl => "PL",
            Cond::Vs => "VS",
            Cond::Vc => "VC",
            Cond::Hi => "HI",
            Cond::Ls => "LS",
            Cond::Ge => "GE",
            Cond::Lt => "LT",
            Cond::Gt => "GT",
            Cond::Le => "LE",
            Cond::Al => "AL",
            Cond::Nv => "NV",
        };
        f.write_str(s)
    }
}

/// Shift applied to a shifted-register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShiftOp {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

/// Extension applied to an extended-register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtendOp {
    Uxtb,
    Uxth,
    Uxtw,
    Uxtx,
    Sxtb,
    Sxth,
    Sxtw,
    Sxtx,
}

impl ExtendOp {
    /// 3-bit `option` field.
    pub const fn option(self) -> u32 {
        self as u32
    }
}

/// System registers reachable through `MRS`/`MSR`, plus the PSTATE fields
/// writable with an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SysReg {
    Nzcv,
    Daif,
    Fpcr,
    Fpsr,
    TpidrEl0,
    CntvctEl0,
    CntfrqEl0,
    DczidEl0,
    MidrEl1,
    CurrentEl,
    SpSel,
    DaifSet,
    DaifClr,
}

impl SysReg {
    /// `(op0, op1, CRn, CRm, op2)` for register moves, `None` for
    /// immediate-only PSTATE fields.
    pub const fn fields(self) -> Option<(u32, u32, u32, u32, u32)> {
        match self {
            SysReg::Nzcv => Some((3, 3, 4, 2, 0)),
            SysReg::Daif => Some((3, 3, 4, 2, 1)),
            SysReg::Fpcr => Some((3, 3, 4, 4, 0)),
            SysReg::Fpsr => Some((3, 3, 4, 4, 1)),
            SysReg::TpidrEl0 => Some((3, 3, 13, 0, 2)),
            SysReg::CntvctEl0 => Some((3, 3, 14, 0, 2)),
            SysReg::CntfrqEl0 => Some((3, 3, 14, 0, 0)),
            SysReg::DczidEl0 => Some((3, 3, 0, 0, 7)),
            SysReg::MidrEl1 => Some((3, 0, 0, 0, 0)),
            SysReg::CurrentEl => Some((3, 0, 4, 2, 2)),
            SysReg::SpSel => Some((3, 0, 4, 2, 0)),
            SysReg::DaifSet | SysReg::DaifClr => None,
        }
    }

    /// `(op1, op2)` for `MSR <pstatefield>, #imm`.
    pub const fn pstate(self) -> Option<(u32, u32)> {
        match self {
            SysReg::SpSel => Some((0, 5)),
            SysReg::DaifSet => Some((3, 6)),
            SysReg::DaifClr => Some((3, 7)),
            _ => None,
        }
    }
}

// ── Operands ───────────────────────────────────────────────────────────────

/// External symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a memory reference is relative to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemBase {
    /// Register base with immediate offset.
    Reg(Reg),
    /// Register base plus register index, `(Rn)(Rm)`.
    Indexed { base: Reg, index: Reg },
    /// Local variable, relative to the top of the frame.
    Auto,
    /// Incoming parameter, above the saved link register.
    Param,
    /// External or static symbol.
    Extern(Symbol),
}

/// Write-back behaviour of a register-based memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexMode {
    #[default]
    Offset,
    /// Base updated before the access.
    Pre,
    /// Base updated after the access.
    Post,
}

/// A memory reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemRef {
    pub base: MemBase,
    pub offset: i64,
    pub mode: IndexMode,
}

impl MemRef {
    /// `offset(Rn)`.
    pub fn reg(base: Reg, offset: i64) -> Self {
        MemRef {
            base: MemBase::Reg(base),
            offset,
            mode: IndexMode::Offset,
        }
    }

    /// `offset(Rn)!`, base written back before the access.
    pub fn pre(base: Reg, offset: i64) -> Self {
        MemRef {
            mode: IndexMode::Pre,
            ..MemRef::reg(base, offset)
        }
    }

    /// `(Rn)offset`, base written back after the access.
    pub fn post(base: Reg, offset: i64) -> Self {
        MemRef {
            mode: IndexMode::Post,
            ..MemRef::reg(base, offset)
        }
    }

    /// `(Rn)(Rm)`.
    pub fn indexed(base: Reg, index: Reg) -> Self {
        MemRef {
            base: MemBase::Indexed { base, index },
            offset: 0,
            mode: IndexMode::Offset,
        }
    }

    /// Local variable at `offset` from the frame top.
    pub fn auto(offset: i64) -> Self {
        MemRef {
            base: MemBase::Auto,
            offset,
            mode: IndexMode::Offset,
        }
    }

    /// Incoming parameter at `offset`.
    pub fn param(offset: i64) -> Self {
        MemRef {
            base: MemBase::Param,
            offset,
            mode: IndexMode::Offset,
        }
    }

    /// `sym+offset(SB)`.
    pub fn sym(symbol: Symbol, offset: i64) -> Self {
        MemRef {
            base: MemBase::Extern(symbol),
            offset,
            mode: IndexMode::Offset,
        }
    }
}

impl fmt::Display for MemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            MemBase::Reg(r) => match self.mode {
                IndexMode::Offset => write!(f, "{}({})", self.offset, r),
                IndexMode::Pre => write!(f, "{}({})!", self.offset, r),
                IndexMode::Post => write!(f, "({}){}!", r, self.offset),
            },
            MemBase::Indexed { base, index } => write!(f, "({})({})", base, index),
            MemBase::Auto => write!(f, "{}(SP)", self.offset),
            MemBase::Param => write!(f, "{}(FP)", self.offset),
            MemBase::Extern(s) if self.offset == 0 => write!(f, "{}(SB)", s),
            MemBase::Extern(s) => write!(f, "{}+{}(SB)", s, self.offset),
        }
    }
}

/// One argument slot of an instruction.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    #[default]
    None,
    Reg(Reg),
    /// Register pair for paired and exclusive-pair accesses.
    Pair(Reg, Reg),
    Shifted {
        reg: Reg,
        op: ShiftOp,
        amount: u8,
    },
    Extended {
        reg: Reg,
        op: ExtendOp,
        amount: u8,
    },
    Mem(MemRef),
    Imm(i64),
    /// Address of a memory reference, `$sym(SB)` or `$off(SP)`.
    Addr(MemRef),
    FImm(f64),
    /// Branch target; the destination is [`Inst::target`].
    Branch,
    Cond(Cond),
    SysReg(SysReg),
    /// Frame size declared on a `TEXT` record.
    TextSize(i64),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Reg(r) => write!(f, "{}", r),
            Operand::Pair(a, b) => write!(f, "({}, {})", a, b),
            Operand::Shifted { reg, op, amount } => {
                let sym = match op {
                    ShiftOp::Lsl => "<<",
                    ShiftOp::Lsr => ">>",
                    ShiftOp::Asr => "->",
                    ShiftOp::Ror => "@>",
                };
                write!(f, "{}{}{}", reg, sym, amount)
            }
            Operand::Extended { reg, op, amount } => {
                write!(f, "{}.{:?}<<{}", reg, op, amount)
            }
            Operand::Mem(m) => write!(f, "{}", m),
            Operand::Imm(v) => write!(f, "${}", v),
            Operand::Addr(m) => write!(f, "${}", m),
            Operand::FImm(v) => write!(f, "$({})", v),
            Operand::Branch => write!(f, "branch"),
            Operand::Cond(c) => write!(f, "{}", c),
            Operand::SysReg(s) => write!(f, "{:?}", s),
            Operand::TextSize(n) => write!(f, "${}", n),
        }
    }
}

// ── Mnemonics ──────────────────────────────────────────────────────────────

macro_rules! mnemonics {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Instruction mnemonic. Width variants carry a `W` suffix
        /// (`ADD` / `ADDW`), floating point ones an `S` / `D` suffix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Mnemonic {
            $($variant,)*
        }

        impl Mnemonic {
            /// Every mnemonic, in declaration order.
            pub const ALL: &'static [Mnemonic] = &[$(Mnemonic::$variant,)*];

            /// Assembler spelling.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Mnemonic::$variant => $name,)*
                }
            }
        }

        impl FromStr for Mnemonic {
            type Err = AsmError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($name => Ok(Mnemonic::$variant),)*
                    _ => Err(AsmError::UnknownMnemonic { name: s.into() }),
                }
            }
        }
    };
}

mnemonics! {
    // add/subtract
    Add => "ADD", AddW => "ADDW", Adds => "ADDS", AddsW => "ADDSW",
    Sub => "SUB", SubW => "SUBW", Subs => "SUBS", SubsW => "SUBSW",
    Adc => "ADC", AdcW => "ADCW", Adcs => "ADCS", AdcsW => "ADCSW",
    Sbc => "SBC", SbcW => "SBCW", Sbcs => "SBCS", SbcsW => "SBCSW",
    Ngc => "NGC", NgcW => "NGCW", Ngcs => "NGCS", NgcsW => "NGCSW",
    Neg => "NEG", NegW => "NEGW", Negs => "NEGS", NegsW => "NEGSW",
    Cmp => "CMP", CmpW => "CMPW", Cmn => "CMN", CmnW => "CMNW",
    // logical
    And => "AND", AndW => "ANDW", Ands => "ANDS", AndsW => "ANDSW",
    Eor => "EOR", EorW => "EORW", Orr => "ORR", OrrW => "ORRW",
    Bic => "BIC", BicW => "BICW", Bics => "BICS", BicsW => "BICSW",
    Eon => "EON", EonW => "EONW", Orn => "ORN", OrnW => "ORNW",
    Tst => "TST", TstW => "TSTW", Mvn => "MVN", MvnW => "MVNW",
    // moves
    Mov => "MOV", MovW => "MOVW", MovWU => "MOVWU", MovH => "MOVH",
    MovHU => "MOVHU", MovB => "MOVB", MovBU => "MOVBU",
    MovK => "MOVK", MovKW => "MOVKW", MovN => "MOVN", MovNW => "MOVNW",
    MovZ => "MOVZ", MovZW => "MOVZW",
    // branches
    B => "B", Bl => "BL", Ret => "RET",
    Beq => "BEQ", Bne => "BNE", Bcs => "BCS", Bhs => "BHS",
    Bcc => "BCC", Blo => "BLO", Bmi => "BMI", Bpl => "BPL",
    Bvs => "BVS", Bvc => "BVC", Bhi => "BHI", Bls => "BLS",
    Bge => "BGE", Blt => "BLT", Bgt => "BGT", Ble => "BLE",
    Cbz => "CBZ", CbzW => "CBZW", Cbnz => "CBNZ", CbnzW => "CBNZW",
    Tbz => "TBZ", Tbnz => "TBNZ", Adr => "ADR", Adrp => "ADRP",
    // shifts
    Lsl => "LSL", LslW => "LSLW", Lsr => "LSR", LsrW => "LSRW",
    Asr => "ASR", AsrW => "ASRW", Ror => "ROR", RorW => "RORW",
    // bit operations
    Cls => "CLS", ClsW => "CLSW", Clz => "CLZ", ClzW => "CLZW",
    Rbit => "RBIT", RbitW => "RBITW", Rev => "REV", RevW => "REVW",
    Rev16 => "REV16", Rev16W => "REV16W", Rev32 => "REV32",
    // divide and checksum
    Sdiv => "SDIV", SdivW => "SDIVW", Udiv => "UDIV", UdivW => "UDIVW",
    Crc32B => "CRC32B", Crc32H => "CRC32H", Crc32W => "CRC32W", Crc32X => "CRC32X",
    Crc32CB => "CRC32CB", Crc32CH => "CRC32CH", Crc32CW => "CRC32CW", Crc32CX => "CRC32CX",
    // multiply
    Madd => "MADD", MaddW => "MADDW", Msub => "MSUB", MsubW => "MSUBW",
    Smaddl => "SMADDL", Smsubl => "SMSUBL", Umaddl => "UMADDL", Umsubl => "UMSUBL",
    Mul => "MUL", MulW => "MULW", Mneg => "MNEG", MnegW => "MNEGW",
    Smnegl => "SMNEGL", Smull => "SMULL", Smulh => "SMULH",
    Umnegl => "UMNEGL", Umulh => "UMULH", Umull => "UMULL",
    Rem => "REM", RemW => "REMW", Urem => "UREM", UremW => "UREMW",
    // bit-field
    Bfm => "BFM", BfmW => "BFMW", Sbfm => "SBFM", SbfmW => "SBFMW",
    Ubfm => "UBFM", UbfmW => "UBFMW",
    Bfi => "BFI", BfiW => "BFIW", Bfxil => "BFXIL", BfxilW => "BFXILW",
    Sbfiz => "SBFIZ", SbfizW => "SBFIZW", Sbfx => "SBFX", SbfxW => "SBFXW",
    Ubfiz => "UBFIZ", UbfizW => "UBFIZW", Ubfx => "UBFX", UbfxW => "UBFXW",
    Extr => "EXTR", ExtrW => "EXTRW",
    // extension
    Sxtb => "SXTB", SxtbW => "SXTBW", Sxth => "SXTH", SxthW => "SXTHW", Sxtw => "SXTW",
    Uxtb => "UXTB", UxtbW => "UXTBW", Uxth => "UXTH", UxthW => "UXTHW", Uxtw => "UXTW",
    // conditional
    Ccmn => "CCMN", CcmnW => "CCMNW", Ccmp => "CCMP", CcmpW => "CCMPW",
    Csel => "CSEL", CselW => "CSELW", Csinc => "CSINC", CsincW => "CSINCW",
    Csinv => "CSINV", CsinvW => "CSINVW", Csneg => "CSNEG", CsnegW => "CSNEGW",
    Cinc => "CINC", CincW => "CINCW", Cinv => "CINV", CinvW => "CINVW",
    Cneg => "CNEG", CnegW => "CNEGW",
    Cset => "CSET", CsetW => "CSETW", Csetm => "CSETM", CsetmW => "CSETMW",
    // system
    Svc => "SVC", Hvc => "HVC", Smc => "SMC", Brk => "BRK", Hlt => "HLT",
    Dcps1 => "DCPS1", Dcps2 => "DCPS2", Dcps3 => "DCPS3",
    Eret => "ERET", Nop => "NOP", Wfe => "WFE", Wfi => "WFI",
    Yield => "YIELD", Sev => "SEV", Sevl => "SEVL", Drps => "DRPS",
    Clrex => "CLREX", Sys => "SYS", Sysl => "SYSL",
    At => "AT", Dc => "DC", Ic => "IC", Tlbi => "TLBI",
    Hint => "HINT", Dmb => "DMB", Dsb => "DSB", Isb => "ISB",
    Mrs => "MRS", Msr => "MSR",
    // exclusive and acquire/release
    Ldar => "LDAR", LdarW => "LDARW", LdarB => "LDARB", LdarH => "LDARH",
    Ldxr => "LDXR", LdxrW => "LDXRW", LdxrB => "LDXRB", LdxrH => "LDXRH",
    Ldaxr => "LDAXR", LdaxrW => "LDAXRW", LdaxrB => "LDAXRB", LdaxrH => "LDAXRH",
    Ldxp => "LDXP", LdxpW => "LDXPW", Ldaxp => "LDAXP", LdaxpW => "LDAXPW",
    Stlr => "STLR", StlrW => "STLRW", StlrB => "STLRB", StlrH => "STLRH",
    Stxr => "STXR", StxrW => "STXRW", StxrB => "STXRB", StxrH => "STXRH",
    Stlxr => "STLXR", StlxrW => "STLXRW", StlxrB => "STLXRB", StlxrH => "STLXRH",
    Stxp => "STXP", StxpW => "STXPW", Stlxp => "STLXP", StlxpW => "STLXPW",
    // atomics
    SwpD => "SWPD", SwpW => "SWPW", SwpalD => "SWPALD", SwpalW => "SWPALW",
    LdaddD => "LDADDD", LdaddW => "LDADDW", LdaddalD => "LDADDALD", LdaddalW => "LDADDALW",
    LdclrD => "LDCLRD", LdclrW => "LDCLRW", LdeorD => "LDEORD", LdeorW => "LDEORW",
    LdsetD => "LDSETD", LdsetW => "LDSETW",
    // pairs
    Ldp => "LDP", LdpW => "LDPW", Stp => "STP", StpW => "STPW",
    // floating point
    FaddS => "FADDS", FaddD => "FADDD", FsubS => "FSUBS", FsubD => "FSUBD",
    FmulS => "FMULS", FmulD => "FMULD", FnmulS => "FNMULS", FnmulD => "FNMULD",
    FdivS => "FDIVS", FdivD => "FDIVD", FmaxS => "FMAXS", FmaxD => "FMAXD",
    FminS => "FMINS", FminD => "FMIND", FmaxnmS => "FMAXNMS", FmaxnmD => "FMAXNMD",
    FminnmS => "FMINNMS", FminnmD => "FMINNMD",
    FabsS => "FABSS", FabsD => "FABSD", FnegS => "FNEGS", FnegD => "FNEGD",
    FsqrtS => "FSQRTS", FsqrtD => "FSQRTD",
    FcvtSD => "FCVTSD", FcvtDS => "FCVTDS", FcvtSH => "FCVTSH", FcvtHS => "FCVTHS",
    FcvtDH => "FCVTDH", FcvtHD => "FCVTHD",
    FrintnS => "FRINTNS", FrintnD => "FRINTND", FrintpS => "FRINTPS", FrintpD => "FRINTPD",
    FrintmS => "FRINTMS", FrintmD => "FRINTMD", FrintzS => "FRINTZS", FrintzD => "FRINTZD",
    FrintaS => "FRINTAS", FrintaD => "FRINTAD", FrintxS => "FRINTXS", FrintxD => "FRINTXD",
    FrintiS => "FRINTIS", FrintiD => "FRINTID",
    FcmpS => "FCMPS", FcmpD => "FCMPD", FcmpeS => "FCMPES", FcmpeD => "FCMPED",
    FccmpS => "FCCMPS", FccmpD => "FCCMPD", FccmpeS => "FCCMPES", FccmpeD => "FCCMPED",
    FcselS => "FCSELS", FcselD => "FCSELD", FmovS => "FMOVS", FmovD => "FMOVD",
    FcvtzsD => "FCVTZSD", FcvtzsDW => "FCVTZSDW", FcvtzsS => "FCVTZSS", FcvtzsSW => "FCVTZSSW",
    FcvtzuD => "FCVTZUD", FcvtzuDW => "FCVTZUDW", FcvtzuS => "FCVTZUS", FcvtzuSW => "FCVTZUSW",
    ScvtfD => "SCVTFD", ScvtfS => "SCVTFS", ScvtfWD => "SCVTFWD", ScvtfWS => "SCVTFWS",
    UcvtfD => "UCVTFD", UcvtfS => "UCVTFS", UcvtfWD => "UCVTFWD", UcvtfWS => "UCVTFWS",
    // crypto
    Aese => "AESE", Aesd => "AESD", Aesmc => "AESMC", Aesimc => "AESIMC",
    Sha1h => "SHA1H", Sha1su1 => "SHA1SU1", Sha256su0 => "SHA256SU0",
    Sha1c => "SHA1C", Sha1p => "SHA1P", Sha1m => "SHA1M", Sha1su0 => "SHA1SU0",
    Sha256h => "SHA256H", Sha256h2 => "SHA256H2", Sha256su1 => "SHA256SU1",
    // data and pseudo-ops
    Word => "WORD", Dword => "DWORD", Undef => "UNDEF",
    Text => "TEXT", Marker => "MARKER", Pcdata => "PCDATA", Funcdata => "FUNCDATA",
}

impl Mnemonic {
    /// Dense index for per-mnemonic tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Pseudo-ops that legitimately occupy no bytes.
    pub const fn is_pseudo(self) -> bool {
        matches!(
            self,
            Mnemonic::Text | Mnemonic::Marker | Mnemonic::Pcdata | Mnemonic::Funcdata
        )
    }

    /// Transfers that never fall through to the next instruction.
    pub const fn is_unconditional_transfer(self) -> bool {
        matches!(self, Mnemonic::B | Mnemonic::Ret | Mnemonic::Eret)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Instruction records ────────────────────────────────────────────────────

/// Handle of an [`Inst`] inside its [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstId(u32);

impl InstId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One abstract instruction.
///
/// `from` and `to` are operands 1 and 3; `reg` is the optional extra
/// register (operand 2). `aux` carries whatever a family needs beyond that
/// (the addend of `MADD`, the width of `BFI`, the second source of `CSEL`,
/// the status register of `STXR`) and is never classified.
#[derive(Debug, Clone)]
pub struct Inst {
    pub mnemonic: Mnemonic,
    pub from: Operand,
    pub reg: Option<Reg>,
    pub aux: Operand,
    pub to: Operand,
    pub target: Option<InstId>,
    /// Source line, echoed in diagnostics.
    pub line: u32,
    pub(crate) pc: u32,
    pub(crate) next: Option<InstId>,
    pub(crate) far: bool,
    pub(crate) enc: Option<&'static Encoding>,
}

impl Inst {
    pub fn new(mnemonic: Mnemonic) -> Self {
        Inst {
            mnemonic,
            from: Operand::None,
            reg: None,
            aux: Operand::None,
            to: Operand::None,
            target: None,
            line: 0,
            pc: 0,
            next: None,
            far: false,
            enc: None,
        }
    }

    pub fn with_from(mut self, op: Operand) -> Self {
        self.from = op;
        self
    }

    pub fn with_reg(mut self, reg: Reg) -> Self {
        self.reg = Some(reg);
        self
    }

    pub fn with_aux(mut self, op: Operand) -> Self {
        self.aux = op;
        self
    }

    pub fn with_to(mut self, op: Operand) -> Self {
        self.to = op;
        self
    }

    pub fn with_target(mut self, target: InstId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Program counter assigned by the last layout pass.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Whether layout refined this branch to its long form.
    pub fn is_far(&self) -> bool {
        self.far
    }

    /// Cached encoding descriptor, if lookup has run.
    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.enc
    }

    /// Switch a conditional branch to its long form. Drops the cached
    /// descriptor because the target operand class changes.
    pub(crate) fn widen(&mut self) {
        self.far = true;
        self.enc = None;
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05} ({})\t{}", self.pc, self.line, self.mnemonic)?;
        let reg = self.reg.map(Operand::Reg).unwrap_or_default();
        let mut sep = "\t";
        for op in [&self.from, &reg, &self.aux, &self.to] {
            if *op != Operand::None {
                write!(f, "{}{}", sep, op)?;
                sep = ", ";
            }
        }
        Ok(())
    }
}

// ── Program arena ──────────────────────────────────────────────────────────

/// The function being assembled: an arena of records threaded into a
/// singly linked sequence.
#[derive(Debug, Clone, Default)]
pub struct Program {
    insts: Vec<Inst>,
    head: Option<InstId>,
    tail: Option<InstId>,
    frame_size: i64,
}

impl Program {
    /// Empty program for a function with `frame_size` bytes of locals.
    pub fn new(frame_size: i64) -> Self {
        Program {
            frame_size,
            ..Program::default()
        }
    }

    pub fn frame_size(&self) -> i64 {
        self.frame_size
    }

    /// Append a record to the end of the sequence.
    pub fn push(&mut self, inst: Inst) -> InstId {
        let id = self.alloc(inst);
        match self.tail {
            Some(t) => self.insts[t.index()].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Point a branch (or literal load) at `target`.
    ///
    /// # Panics
    ///
    /// Panics if either id was not allocated by this program.
    pub fn set_target(&mut self, inst: InstId, target: InstId) {
        assert!(
            target.index() < self.insts.len(),
            "target #{} is not part of this program",
            target.index()
        );
        self.insts[inst.index()].target = Some(target);
    }

    /// The record behind `id`, or `None` for an id from another program.
    pub fn get(&self, id: InstId) -> Option<&Inst> {
        self.insts.get(id.index())
    }

    pub fn first(&self) -> Option<InstId> {
        self.head
    }

    pub fn next(&self, id: InstId) -> Option<InstId> {
        self.insts[id.index()].next
    }

    /// Records in sequence order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            prog: self,
            cur: self.head,
        }
    }

    /// Number of records in the arena, linked or not.
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Add a record without linking it into the sequence.
    pub(crate) fn alloc(&mut self, inst: Inst) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(inst);
        id
    }

    /// Link `chain` (already allocated, unlinked) right after `at`.
    pub(crate) fn splice_after(&mut self, at: InstId, chain: &[InstId]) {
        let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
            return;
        };
        for pair in chain.windows(2) {
            self.insts[pair[0].index()].next = Some(pair[1]);
        }
        let rest = self.insts[at.index()].next;
        self.insts[last.index()].next = rest;
        self.insts[at.index()].next = Some(first);
        if rest.is_none() {
            self.tail = Some(last);
        }
    }
}

/// # Panics
///
/// Indexing with an id this program did not allocate panics. Use
/// [`Program::get`] for ids of unknown origin.
impl Index<InstId> for Program {
    type Output = Inst;

    fn index(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }
}

impl IndexMut<InstId> for Program {
    fn index_mut(&mut self, id: InstId) -> &mut Inst {
        &mut self.insts[id.index()]
    }
}

/// Iterator over a [`Program`] in sequence order.
pub struct Iter<'a> {
    prog: &'a Program,
    cur: Option<InstId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (InstId, &'a Inst);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        let inst = &self.prog[id];
        self.cur = inst.next;
        Some((id, inst))
    }
}

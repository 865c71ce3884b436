//! Operand classes and the class compatibility matrix.
//!
//! `compatible(wide, narrow)` answers whether an encoding slot declared as
//! `wide` also accepts an operand classified as `narrow`. The relation is
//! built once from a short list of direct edges and closed transitively.

use core::fmt;
use std::sync::OnceLock;

macro_rules! classes {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Operand class. Declaration order is the catalog sort order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Class {
            $($variant,)*
        }

        impl Class {
            /// Every class, in declaration order.
            pub const ALL: &'static [Class] = &[$(Class::$variant,)*];

            /// Upper-case diagnostic name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Class::$variant => $name,)*
                }
            }
        }
    };
}

classes! {
    None => "NONE",
    Reg => "REG",
    Rsp => "RSP",
    FReg => "FREG",
    VReg => "VREG",
    Pair => "PAIR",
    Shift => "SHIFT",
    ExtReg => "EXTREG",
    Spr => "SPR",
    Cond => "COND",

    ZCon => "ZCON",
    AddCon0 => "ADDCON0",
    ABCon0 => "ABCON0",
    AddCon => "ADDCON",
    ABCon => "ABCON",
    MovCon => "MOVCON",
    MBCon => "MBCON",
    BitCon => "BITCON",
    LCon => "LCON",
    VCon => "VCON",

    ZFCon => "FCON0",
    FCon => "FCON",
    LFCon => "LFCON",

    VConAddr => "VCONADDR",
    AACon => "AACON",
    LACon => "LACON",

    SBra => "SBRA",
    LBra => "LBRA",

    NPAuto => "NPAUTO",
    NSAuto => "NSAUTO",
    PSAuto => "PSAUTO",
    PPAuto => "PPAUTO",
    UAuto4K => "UAUTO4K",
    UAuto8K => "UAUTO8K",
    UAuto16K => "UAUTO16K",
    UAuto32K => "UAUTO32K",
    UAuto64K => "UAUTO64K",
    LAuto => "LAUTO",

    ZOReg => "ZOREG",
    NPOReg => "NPOREG",
    NSOReg => "NSOREG",
    PSOReg => "PSOREG",
    PPOReg => "PPOREG",
    UOReg4K => "UOREG4K",
    UOReg8K => "UOREG8K",
    UOReg16K => "UOREG16K",
    UOReg32K => "UOREG32K",
    UOReg64K => "UOREG64K",
    LOReg => "LOREG",

    ROff => "ROFF",
    XPre => "XPRE",
    XPost => "XPOST",
    Addr => "ADDR",
    TextSize => "TEXTSIZE",
    Gok => "GOK",
}

impl Class {
    /// Number of classes.
    pub const COUNT: usize = Class::ALL.len();

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direct "wide accepts narrow" edges before closure.
const EDGES: &[(Class, &[Class])] = {
    use Class::*;
    &[
        (Rsp, &[Reg]),
        (Reg, &[ZCon]),
        (AddCon0, &[ZCon, ABCon0]),
        (AddCon, &[ZCon, AddCon0, ABCon]),
        (BitCon, &[ABCon0, ABCon, MBCon]),
        (MovCon, &[MBCon, ZCon, AddCon0]),
        (LCon, &[ZCon, BitCon, AddCon, AddCon0, ABCon, MBCon, MovCon]),
        (VCon, &[VConAddr, LCon]),
        (LACon, &[AACon]),
        (LBra, &[SBra]),
        (PPAuto, &[PSAuto]),
        (UAuto4K, &[PSAuto, PPAuto]),
        (UAuto8K, &[UAuto4K]),
        (UAuto16K, &[UAuto8K]),
        (UAuto32K, &[UAuto16K]),
        (UAuto64K, &[UAuto32K]),
        (NPAuto, &[NSAuto]),
        (LAuto, &[NPAuto, UAuto64K]),
        (PSOReg, &[ZOReg]),
        (PPOReg, &[ZOReg, PSOReg]),
        (UOReg4K, &[ZOReg, PSOReg, PPOReg, PSAuto, PPAuto]),
        (UOReg8K, &[UOReg4K]),
        (UOReg16K, &[UOReg8K]),
        (UOReg32K, &[UOReg16K]),
        (UOReg64K, &[UOReg32K]),
        (NPOReg, &[NSOReg]),
        (LOReg, &[NPOReg, UOReg64K]),
    ]
};

type Matrix = [[bool; Class::COUNT]; Class::COUNT];

fn build_matrix() -> Box<Matrix> {
    let mut m = Box::new([[false; Class::COUNT]; Class::COUNT]);
    for c in Class::ALL {
        m[c.index()][c.index()] = true;
    }
    for (wide, narrows) in EDGES {
        for n in *narrows {
            m[wide.index()][n.index()] = true;
        }
    }
    // Warshall closure.
    for k in 0..Class::COUNT {
        for i in 0..Class::COUNT {
            if !m[i][k] {
                continue;
            }
            for j in 0..Class::COUNT {
                if m[k][j] {
                    m[i][j] = true;
                }
            }
        }
    }
    m
}

fn matrix() -> &'static Matrix {
    static MATRIX: OnceLock<Box<Matrix>> = OnceLock::new();
    MATRIX.get_or_init(build_matrix)
}

/// Whether a slot declared `wide` accepts an operand of class `narrow`.
/// Reflexive and transitive.
#[inline]
pub fn compatible(wide: Class, narrow: Class) -> bool {
    matrix()[wide.index()][narrow.index()]
}

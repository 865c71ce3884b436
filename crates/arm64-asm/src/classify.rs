//! Operand classification and the immediate-encoding predicates it relies on.

use crate::class::Class;
use crate::ir::{IndexMode, MemBase, MemRef, Operand, RegBank};

/// Result of classifying one operand: its class plus the resolved integer
/// the encoder later places in the instruction (effective stack offset,
/// immediate value, float bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub class: Class,
    pub offset: i64,
}

impl Classified {
    const fn new(class: Class, offset: i64) -> Self {
        Classified { class, offset }
    }
}

/// Stack-relative classes, indexed by [`const_class`] bucket.
const AUTO_CLASSES: [Class; 11] = [
    Class::PSAuto,
    Class::NSAuto,
    Class::NPAuto,
    Class::PSAuto,
    Class::PPAuto,
    Class::UAuto4K,
    Class::UAuto8K,
    Class::UAuto16K,
    Class::UAuto32K,
    Class::UAuto64K,
    Class::LAuto,
];

/// Register-relative classes, indexed by [`const_class`] bucket.
const OREG_CLASSES: [Class; 11] = [
    Class::ZOReg,
    Class::NSOReg,
    Class::NPOReg,
    Class::PSOReg,
    Class::PPOReg,
    Class::UOReg4K,
    Class::UOReg8K,
    Class::UOReg16K,
    Class::UOReg32K,
    Class::UOReg64K,
    Class::LOReg,
];

/// Bucket an offset by magnitude and alignment.
///
/// | bucket | range |
/// |---|---|
/// | 0 | zero |
/// | 1 | `-256..0` |
/// | 2 | `-512..0`, multiple of 8 |
/// | 3 | `1..=255` |
/// | 4 | `..=504`, multiple of 8 |
/// | 5 | `..=4095` |
/// | 6..=9 | `..=4095 << s`, multiple of `1 << s` for s = 1..=4 |
/// | 10 | everything else |
pub fn const_class(v: i64) -> usize {
    if v == 0 {
        return 0;
    }
    if v < 0 {
        if v >= -256 {
            return 1;
        }
        if v >= -512 && v & 7 == 0 {
            return 2;
        }
        return 10;
    }
    if v <= 255 {
        return 3;
    }
    if v <= 504 && v & 7 == 0 {
        return 4;
    }
    if v <= 4095 {
        return 5;
    }
    if v <= 8190 && v & 1 == 0 {
        return 6;
    }
    if v <= 16380 && v & 3 == 0 {
        return 7;
    }
    if v <= 32760 && v & 7 == 0 {
        return 8;
    }
    if v <= 65520 && v & 0xF == 0 {
        return 9;
    }
    10
}

/// Scale shift implied by an unsigned scaled-offset class.
pub fn offset_shift(class: Class) -> u32 {
    match class {
        Class::UAuto4K | Class::UOReg4K => 0,
        Class::UAuto8K | Class::UOReg8K => 1,
        Class::UAuto16K | Class::UOReg16K => 2,
        Class::UAuto32K | Class::UOReg32K => 3,
        Class::UAuto64K | Class::UOReg64K => 4,
        _ => 0,
    }
}

/// Fits the add/sub immediate: 12 bits, optionally shifted left by 12.
pub fn is_addcon(v: i64) -> bool {
    if v < 0 {
        return false;
    }
    let v = if v & 0xFFF == 0 { v >> 12 } else { v };
    v <= 0xFFF
}

/// Field index (0..=3) if `v` is a single 16-bit chunk at a 16-bit
/// aligned position.
pub fn movcon(v: i64) -> Option<u32> {
    let v = v as u64;
    (0..4).find(|&hw| v & !(0xFFFFu64 << (hw * 16)) == 0)
}

/// Encodable as a logical (bit-pattern) immediate of either width.
pub fn is_bitcon(v: u64) -> bool {
    encode_bitmask(v, true).is_some() || (v >> 32 == 0 && encode_bitmask(v | (v << 32), true).is_some())
}

/// Encode `value` as a logical immediate, returning `(N, immr, imms)`.
///
/// The value must be a replicated element of 2, 4, 8, 16, 32 or 64 bits,
/// each element a rotated run of ones. `immr` is the right-rotation that
/// turns the run (packed at bit 0) into the element. For 32-bit operations
/// only the low word is considered.
pub fn encode_bitmask(value: u64, is64: bool) -> Option<(u32, u32, u32)> {
    let value = if is64 {
        value
    } else {
        let w = value & 0xFFFF_FFFF;
        w | (w << 32)
    };
    if value == 0 || value == u64::MAX {
        return None;
    }

    // Shrink to the smallest repeating element.
    let mut elem = value;
    let mut size = 64u32;
    while size > 2 {
        let half = size / 2;
        let mask = (1u64 << half) - 1;
        if elem & mask != (elem >> half) & mask {
            break;
        }
        size = half;
        elem &= mask;
    }

    let mask = if size == 64 {
        u64::MAX
    } else {
        (1u64 << size) - 1
    };
    let ones = elem.count_ones();

    // Find r such that rotating the element right by r packs its ones at
    // bit 0. The encoded rotation goes the other way.
    let ror = |x: u64, r: u32| -> u64 {
        if r == 0 {
            x
        } else {
            ((x >> r) | (x << (size - r))) & mask
        }
    };
    let r = (0..size).find(|&r| ror(elem, r) == (1u64 << ones) - 1)?;
    let immr = (size - r) % size;

    let n = u32::from(size == 64);
    let imms = ((!(size * 2 - 1)) & 0x3F) | (ones - 1);
    Some((n, immr, imms & 0x3F))
}

/// The 8-bit floating immediate for `FMOV`, if `e` is exactly one of the
/// 256 representable values (±(16..=31)/16 × 2^(-3..=4)).
pub fn chipfloat7(e: f64) -> Option<u32> {
    let bits = e.to_bits();
    let lo = bits as u32;
    let hi = (bits >> 32) as u32;
    if lo != 0 || hi & 0xFFFF != 0 {
        return None;
    }
    let exp = hi & 0x7FC0_0000;
    if exp != 0x4000_0000 && exp != 0x3FC0_0000 {
        return None;
    }
    let mut n = (hi >> 16) & 0x3F;
    if hi & 0x8000_0000 != 0 {
        n |= 1 << 7;
    }
    if exp == 0x3FC0_0000 {
        n |= 1 << 6;
    }
    Some(n)
}

fn constant_class(v: i64) -> Class {
    if v == 0 {
        return Class::ZCon;
    }
    let bitcon = is_bitcon(v as u64);
    if is_addcon(v) {
        return match (v <= 0xFFF, bitcon) {
            (true, true) => Class::ABCon0,
            (true, false) => Class::AddCon0,
            (false, true) => Class::ABCon,
            (false, false) => Class::AddCon,
        };
    }
    if movcon(v).is_some() || movcon(!v).is_some() {
        return if bitcon { Class::MBCon } else { Class::MovCon };
    }
    if bitcon {
        return Class::BitCon;
    }
    if v >= i64::from(i32::MIN) && v <= i64::from(u32::MAX) {
        return Class::LCon;
    }
    Class::VCon
}

fn address_class(m: &MemRef, autosize: i64) -> Classified {
    let eff = match (&m.base, m.mode) {
        (MemBase::Extern(_), _) => return Classified::new(Class::VConAddr, m.offset),
        (MemBase::Auto, _) => autosize + m.offset,
        (MemBase::Param, _) => autosize + m.offset + 8,
        (MemBase::Reg(_), IndexMode::Offset) => m.offset,
        _ => return Classified::new(Class::Gok, m.offset),
    };
    let class = if is_addcon(eff) {
        Class::AACon
    } else {
        Class::LACon
    };
    Classified::new(class, eff)
}

fn memory_class(m: &MemRef, autosize: i64) -> Classified {
    match &m.base {
        MemBase::Extern(_) => Classified::new(Class::Addr, m.offset),
        MemBase::Auto => {
            let eff = autosize + m.offset;
            Classified::new(AUTO_CLASSES[const_class(eff)], eff)
        }
        MemBase::Param => {
            let eff = autosize + m.offset + 8;
            Classified::new(AUTO_CLASSES[const_class(eff)], eff)
        }
        MemBase::Reg(_) => match m.mode {
            IndexMode::Offset => Classified::new(OREG_CLASSES[const_class(m.offset)], m.offset),
            IndexMode::Pre => Classified::new(Class::XPre, m.offset),
            IndexMode::Post => Classified::new(Class::XPost, m.offset),
        },
        MemBase::Indexed { .. } => Classified::new(Class::ROff, 0),
    }
}

/// Classify an operand against the current function's `autosize` (frame
/// size plus the saved link-register slot). Pure: the same operand and
/// autosize always give the same result.
pub fn classify(op: &Operand, autosize: i64) -> Classified {
    match op {
        Operand::None => Classified::new(Class::None, 0),
        Operand::Reg(r) => {
            let class = match r.bank() {
                RegBank::General => Class::Reg,
                RegBank::Sp => Class::Rsp,
                RegBank::Float => Class::FReg,
                RegBank::Vector => Class::VReg,
            };
            Classified::new(class, 0)
        }
        Operand::Pair(..) => Classified::new(Class::Pair, 0),
        Operand::Shifted { .. } => Classified::new(Class::Shift, 0),
        Operand::Extended { .. } => Classified::new(Class::ExtReg, 0),
        Operand::SysReg(_) => Classified::new(Class::Spr, 0),
        Operand::Cond(_) => Classified::new(Class::Cond, 0),
        Operand::Imm(v) => Classified::new(constant_class(*v), *v),
        Operand::Addr(m) => address_class(m, autosize),
        Operand::Mem(m) => memory_class(m, autosize),
        Operand::FImm(f) => {
            let bits = f.to_bits() as i64;
            let class = if bits == 0 {
                Class::ZFCon
            } else if chipfloat7(*f).is_some() {
                Class::FCon
            } else {
                Class::LFCon
            };
            Classified::new(class, bits)
        }
        Operand::Branch => Classified::new(Class::SBra, 0),
        Operand::TextSize(n) => Classified::new(Class::TextSize, *n),
    }
}

//! Instruction lookup: resolve an instruction's operand classes and pick the
//! first catalog rule that accepts them.

use crate::class::Class;
use crate::classify::classify;
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::error::AsmError;
use crate::ir::Inst;
use crate::optab::{catalog, Encoding, ILLEGAL};

/// Resolved classes of operand 1, the extra register and operand 3.
///
/// A branch refined to its long form reports the long-branch class for its
/// target.
pub fn operand_classes(inst: &Inst, autosize: i64) -> [Class; 3] {
    let c1 = classify(&inst.from, autosize).class;
    let c2 = if inst.reg.is_some() {
        Class::Reg
    } else {
        Class::None
    };
    let mut c3 = classify(&inst.to, autosize).class;
    if c3 == Class::SBra && inst.far {
        c3 = Class::LBra;
    }
    [c1, c2, c3]
}

/// Find the encoding for `inst`, caching it on the record.
///
/// A cached descriptor is returned as is. When no rule matches, an
/// [`AsmError::IllegalCombination`] is reported and the degenerate
/// [`ILLEGAL`] descriptor is cached and returned so layout can continue.
pub fn lookup(inst: &mut Inst, autosize: i64, sink: &mut dyn DiagnosticSink) -> &'static Encoding {
    if let Some(enc) = inst.enc {
        return enc;
    }
    let classes = operand_classes(inst, autosize);
    let enc = match catalog().find(inst.mnemonic, classes) {
        Some(enc) => {
            tracing::trace!(
                mnemonic = %inst.mnemonic,
                c1 = %classes[0],
                c2 = %classes[1],
                c3 = %classes[2],
                form = ?enc.form,
                "lookup"
            );
            enc
        }
        None => {
            sink.report(Diagnostic {
                error: AsmError::IllegalCombination {
                    mnemonic: inst.mnemonic,
                    classes,
                },
                pc: inst.pc,
                inst: inst.to_string(),
            });
            &ILLEGAL
        }
    };
    inst.enc = Some(enc);
    enc
}

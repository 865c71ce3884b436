//! Error types and severity classification for diagnostics.

use crate::class::Class;
use crate::ir::Mnemonic;

/// How an error affects the current assembly pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Reported and skipped; the pass continues so later errors surface too.
    Recoverable,
    /// A defect in the static tables or a runaway layout; the pass aborts.
    Fatal,
}

/// Assembly error with the numeric or class context needed to explain it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmError {
    /// No catalog entry accepts the operand classes of this instruction.
    #[error("illegal combination {mnemonic} {} {} {}", .classes[0], .classes[1], .classes[2])]
    IllegalCombination {
        /// Mnemonic of the offending instruction.
        mnemonic: Mnemonic,
        /// Resolved classes of operand 1, the extra register, and operand 3.
        classes: [Class; 3],
    },

    /// Memory offset is not a multiple of the access size.
    #[error("odd offset: {value}")]
    OddOffset {
        /// The misaligned offset.
        value: i64,
    },

    /// Branch displacement is not a multiple of the instruction size.
    #[error("misaligned label: displacement {disp}")]
    MisalignedBranch {
        /// The byte displacement to the target.
        disp: i64,
    },

    /// Branch or PC-relative displacement does not fit its field.
    #[error("branch too far: displacement {disp} does not fit in {bits} bits")]
    BranchTooFar {
        /// The (shifted) displacement.
        disp: i64,
        /// Width of the signed field.
        bits: u32,
    },

    /// Immediate does not fit the field of the selected encoding.
    #[error("immediate value {value} out of range [{min}..{max}]")]
    ImmediateOutOfRange {
        /// The offending value.
        value: i64,
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
    },

    /// Operand is structurally valid for the class but not for this encoding.
    #[error("invalid operand: {detail}")]
    InvalidOperand {
        /// Description of the problem.
        detail: String,
    },

    /// A non-pseudo instruction resolved to a zero-size descriptor.
    #[error("zero-width instruction {mnemonic}")]
    ZeroWidth {
        /// Mnemonic of the offending instruction.
        mnemonic: Mnemonic,
    },

    /// Textual mnemonic not known to the assembler.
    #[error("unknown mnemonic '{name}'")]
    UnknownMnemonic {
        /// The unrecognized name.
        name: String,
    },

    /// The catalog, alias table and encoder tables disagree.
    #[error("catalog inconsistency: {detail}")]
    CatalogInconsistency {
        /// What was missing or duplicated.
        detail: String,
    },

    /// Layout did not reach a fixed point within the allowed passes.
    #[error("layout exceeded maximum of {max} passes (possible oscillation)")]
    RelaxationLimit {
        /// Maximum number of passes allowed.
        max: usize,
    },

    /// Several recoverable errors collected during one assembly.
    #[error("{}", render_multiple(.errors))]
    Multiple {
        /// The collected errors, in report order.
        errors: Vec<AsmError>,
    },
}

fn render_multiple(errors: &[AsmError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl AsmError {
    /// Severity of this error per the assembler's taxonomy.
    pub fn severity(&self) -> Severity {
        match self {
            AsmError::CatalogInconsistency { .. } | AsmError::RelaxationLimit { .. } => {
                Severity::Fatal
            }
            AsmError::Multiple { errors } => {
                if errors.iter().any(|e| e.severity() == Severity::Fatal) {
                    Severity::Fatal
                } else {
                    Severity::Recoverable
                }
            }
            _ => Severity::Recoverable,
        }
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        AsmError::InvalidOperand {
            detail: detail.into(),
        }
    }

    pub(crate) fn inconsistent(detail: impl Into<String>) -> Self {
        AsmError::CatalogInconsistency {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_combination_display() {
        let err = AsmError::IllegalCombination {
            mnemonic: Mnemonic::Add,
            classes: [Class::FReg, Class::None, Class::Reg],
        };
        assert_eq!(err.to_string(), "illegal combination ADD FREG NONE REG");
    }

    #[test]
    fn odd_offset_display() {
        let err = AsmError::OddOffset { value: 3 };
        assert_eq!(err.to_string(), "odd offset: 3");
    }

    #[test]
    fn branch_too_far_display() {
        let err = AsmError::BranchTooFar {
            disp: 300_000,
            bits: 19,
        };
        assert_eq!(
            err.to_string(),
            "branch too far: displacement 300000 does not fit in 19 bits"
        );
    }

    #[test]
    fn immediate_out_of_range_display() {
        let err = AsmError::ImmediateOutOfRange {
            value: 70000,
            min: 0,
            max: 65535,
        };
        assert_eq!(
            err.to_string(),
            "immediate value 70000 out of range [0..65535]"
        );
    }

    #[test]
    fn relaxation_limit_display() {
        let err = AsmError::RelaxationLimit { max: 20 };
        assert_eq!(
            err.to_string(),
            "layout exceeded maximum of 20 passes (possible oscillation)"
        );
    }

    #[test]
    fn multiple_display_joins_lines() {
        let err = AsmError::Multiple {
            errors: vec![
                AsmError::OddOffset { value: 1 },
                AsmError::MisalignedBranch { disp: 2 },
            ],
        };
        let s = err.to_string();
        assert!(s.contains("odd offset: 1"));
        assert!(s.contains("misaligned label"));
        assert_eq!(s.lines().count(), 2);
    }

    #[test]
    fn severity_taxonomy() {
        assert_eq!(
            AsmError::inconsistent("x").severity(),
            Severity::Fatal
        );
        assert_eq!(
            AsmError::RelaxationLimit { max: 1 }.severity(),
            Severity::Fatal
        );
        assert_eq!(
            AsmError::OddOffset { value: 1 }.severity(),
            Severity::Recoverable
        );
        assert_eq!(
            AsmError::ZeroWidth {
                mnemonic: Mnemonic::Add
            }
            .severity(),
            Severity::Recoverable
        );
        let mixed = AsmError::Multiple {
            errors: vec![AsmError::OddOffset { value: 1 }, AsmError::inconsistent("y")],
        };
        assert_eq!(mixed.severity(), Severity::Fatal);
    }
}

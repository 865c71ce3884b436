//! # arm64-asm: ARM64 assembler back end
//!
//! `arm64-asm` turns an already-selected stream of abstract instruction
//! records into AArch64 machine code. Each record is a mnemonic with up to
//! three operands; the back end classifies the operands, picks the matching
//! hardware encoding from a static catalog, interleaves literal pools for
//! constants no instruction field can hold, widens conditional branches
//! that cannot reach, and finally emits 32-bit little-endian words.
//!
//! ## Quick Start
//!
//! ```rust
//! use arm64_asm::{assemble, Inst, Mnemonic, Operand, Program, Reg};
//!
//! let mut prog = Program::new(0);
//! // MOVD $0x123456789abc, R1: too wide for MOVZ/MOVN, goes through the pool.
//! prog.push(
//!     Inst::new(Mnemonic::Mov)
//!         .with_from(Operand::Imm(0x1234_5678_9abc))
//!         .with_to(Operand::Reg(Reg::r(1))),
//! );
//! prog.push(Inst::new(Mnemonic::Ret));
//!
//! let out = assemble(&mut prog).unwrap();
//! // LDR X1, lit; RET; <8-byte literal>
//! assert_eq!(out.insts[0].words, vec![0x5800_0041]);
//! assert_eq!(out.insts[1].words, vec![0xD65F_03C0]);
//! assert_eq!(out.insts[2].words, vec![0x5678_9abc, 0x1234]);
//! ```
//!
//! ## Pipeline
//!
//! - [`classify`] maps an operand to its [`Class`] and resolved offset.
//! - [`lookup()`] scans the mnemonic's catalog rules for the first one whose
//!   slots accept the operand classes ([`class::compatible`]).
//! - [`encoder`] dispatches on the rule's [`Form`] and ORs operand fields
//!   into the per-family fixed bits from [`opcodes`].
//! - [`layout`] drives PCs, pools and branch relaxation to a fixed point.
//!
//! Recoverable problems (illegal operand combinations, range violations) go
//! to a [`DiagnosticSink`] and assembly continues; catalog inconsistencies
//! and the relaxation cap abort with an [`AsmError`].

#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Encoders narrow and reinterpret integers constantly (i64→u32 fields,
// signed displacements masked into unsigned bit ranges) and opcode tables
// are dense hex literals without separators.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::bool_to_int_with_if,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::semicolon_if_nothing_returned,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::single_match_else,
    clippy::manual_let_else,
    clippy::many_single_char_names,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc
)]

/// Operand classes and the compatibility matrix.
pub mod class;
/// Operand classifier and immediate predicates (bit masks, move-wide, FMOV).
pub mod classify;
/// Layout limits.
pub mod config;
/// Diagnostic records and sinks.
pub mod diag;
/// Encoding dispatcher: descriptor + operands → instruction words.
pub mod encoder;
/// Error taxonomy.
pub mod error;
/// Registers, operands, mnemonics, instruction records and the program arena.
pub mod ir;
/// Layout driver, branch relaxation and assembled output.
pub mod layout;
/// Instruction lookup.
pub mod lookup;
/// Per-family fixed instruction bits.
pub mod opcodes;
/// Encoding catalog and alias table.
pub mod optab;
/// Literal pool.
pub mod pool;

// Re-exports
pub use class::Class;
pub use config::LayoutConfig;
pub use diag::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use encoder::{encode, Words};
pub use error::{AsmError, Severity};
pub use ir::{
    Cond, ExtendOp, IndexMode, Inst, InstId, MemBase, MemRef, Mnemonic, Operand, Program, Reg,
    RegBank, ShiftOp, Symbol, SysReg,
};
pub use layout::{assemble, Assembled, Assembler, Emitted, RelocKind, Relocation};
pub use lookup::lookup;
pub use optab::{catalog, Encoding, Form, PoolUse};

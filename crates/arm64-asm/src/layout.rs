//! Layout driver: assign PCs, place literal pools, widen out-of-range
//! branches until nothing grows, then encode.
//!
//! Layout runs in three phases:
//!
//! 1. **Placement.** One walk assigns PCs, looks up every record, promotes
//!    pool operands and splices pools into the stream.
//! 2. **Relaxation.** PCs are recomputed; short conditional branches whose
//!    target is out of reach switch to their long form. Sizes only grow, so
//!    this converges; the pass count is capped by
//!    [`LayoutConfig::max_passes`].
//! 3. **Emission.** Every record is encoded at its final PC. Recoverable
//!    errors go to the sink and leave zeros of the descriptor's size.

use crate::config::LayoutConfig;
use crate::diag::{CollectingSink, Diagnostic, DiagnosticSink};
use crate::encoder::{encode, fits, short_reach};
use crate::error::{AsmError, Severity};
use crate::ir::{Inst, InstId, MemBase, Mnemonic, Operand, Program, Symbol};
use crate::lookup::lookup;
use crate::optab::{Form, PoolUse};
use crate::pool::LiteralPool;

/// Size of the saved link-register slot above the locals.
const LINK_SLOT: i64 = 8;

// ─── Output ──────────────────────────────────────────────────────────

/// Kind of an absolute relocation against a data literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelocKind {
    /// 32-bit absolute address (`WORD $sym`).
    Abs32,
    /// 64-bit absolute address (`DWORD $sym`, address literals).
    Abs64,
}

/// A symbol address the object writer must fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relocation {
    /// Byte offset of the field within the function.
    pub offset: u32,
    pub kind: RelocKind,
    pub symbol: Symbol,
    pub addend: i64,
}

/// One record's final placement and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Emitted {
    pub id: InstId,
    pub pc: u32,
    /// Encoded words; empty for zero-size pseudo-ops.
    pub words: Vec<u32>,
}

/// An assembled function.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Assembled {
    /// Little-endian machine code, padded to the function alignment.
    pub code: Vec<u8>,
    /// Total size in bytes, a multiple of the function alignment.
    pub size: u32,
    /// Every record in stream order, pool entries and skip branches
    /// included.
    pub insts: Vec<Emitted>,
    pub relocations: Vec<Relocation>,
    /// Relaxation passes run before the layout settled.
    pub passes: usize,
}

impl Assembled {
    /// Encoded words of the whole function, padding included.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.code
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// PC assigned to record `id`, if it is part of the stream.
    pub fn pc_of(&self, id: InstId) -> Option<u32> {
        self.insts.iter().find(|e| e.id == id).map(|e| e.pc)
    }
}

// ─── Assembler ───────────────────────────────────────────────────────

/// Configurable entry point.
///
/// # Examples
///
/// ```
/// use arm64_asm::{Assembler, Inst, Mnemonic, Operand, Program, Reg};
///
/// let mut prog = Program::new(0);
/// prog.push(
///     Inst::new(Mnemonic::Add)
///         .with_from(Operand::Reg(Reg::r(1)))
///         .with_to(Operand::Reg(Reg::r(0))),
/// );
/// prog.push(Inst::new(Mnemonic::Ret));
///
/// let out = Assembler::new().assemble(&mut prog)?;
/// assert_eq!(out.size, 16);
/// assert_eq!(out.insts[0].words, vec![0x8B01_0000]);
/// # Ok::<(), arm64_asm::AsmError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: LayoutConfig,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the layout limits.
    pub fn config(&mut self, config: LayoutConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Assemble `prog`, failing if anything was reported.
    ///
    /// The program is laid out in place: PCs are assigned, pool entries and
    /// skip branches are spliced into it. Assemble a program once.
    ///
    /// # Errors
    ///
    /// The single error reported, or [`AsmError::Multiple`] when there were
    /// several.
    pub fn assemble(&self, prog: &mut Program) -> Result<Assembled, AsmError> {
        let mut sink = CollectingSink::new();
        let out = self.assemble_with(prog, &mut sink)?;
        match sink.into_error() {
            Some(err) => Err(err),
            None => Ok(out),
        }
    }

    /// Assemble `prog`, handing recoverable errors to `sink`.
    ///
    /// The output is returned even when recoverable errors were reported;
    /// it is then not a valid program.
    ///
    /// # Errors
    ///
    /// Fatal errors only: a catalog inconsistency found while encoding, or
    /// [`AsmError::RelaxationLimit`].
    pub fn assemble_with(
        &self,
        prog: &mut Program,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Assembled, AsmError> {
        let autosize = prog.frame_size() + LINK_SLOT;
        let mut layout = Layout {
            prog,
            cfg: &self.config,
            autosize,
            sink,
        };
        layout.place();
        let passes = layout.relax()?;
        layout.emit(passes)
    }
}

/// Assemble `prog` with the default limits.
///
/// # Errors
///
/// See [`Assembler::assemble`].
pub fn assemble(prog: &mut Program) -> Result<Assembled, AsmError> {
    Assembler::new().assemble(prog)
}

// ─── Driver ──────────────────────────────────────────────────────────

struct Layout<'a> {
    prog: &'a mut Program,
    cfg: &'a LayoutConfig,
    autosize: i64,
    sink: &'a mut dyn DiagnosticSink,
}

/// PC of a record placed at `pc`: double words start on an 8-byte boundary.
fn align_for(m: Mnemonic, pc: u32) -> u32 {
    if m == Mnemonic::Dword && pc & 7 != 0 {
        pc + 4
    } else {
        pc
    }
}

impl Layout<'_> {
    fn report(&mut self, id: InstId, error: AsmError) {
        let inst = &self.prog[id];
        self.sink.report(Diagnostic {
            pc: inst.pc,
            inst: inst.to_string(),
            error,
        });
    }

    /// First pass: PCs, lookups and literal pools.
    fn place(&mut self) {
        let mut pool = LiteralPool::new();
        let mut pc = 0u32;
        let mut cur = self.prog.first();
        while let Some(id) = cur {
            pc = align_for(self.prog[id].mnemonic, pc);
            self.prog[id].pc = pc;
            let enc = lookup(&mut self.prog[id], self.autosize, &mut *self.sink);
            if enc.size == 0 {
                let m = self.prog[id].mnemonic;
                if !m.is_pseudo() {
                    self.report(id, AsmError::ZeroWidth { mnemonic: m });
                }
                cur = self.prog.next(id);
                continue;
            }

            let operand = match enc.pool {
                PoolUse::From => Some(self.prog[id].from.clone()),
                PoolUse::To => Some(self.prog[id].to.clone()),
                PoolUse::None => None,
            };
            if let Some(op) = operand {
                pool.add(self.prog, id, &op, self.autosize);
            }
            if short_reach(enc.form).is_some() {
                pool.reserve_widening();
            }

            if self.prog[id].mnemonic.is_unconditional_transfer() {
                pool.flush(self.prog, id, false);
            }
            pc += u32::from(enc.size);
            if pool.must_flush(self.prog[id].pc, self.cfg)
                || (!pool.is_empty() && self.prog.next(id).is_none())
            {
                pool.flush(self.prog, id, true);
            }
            cur = self.prog.next(id);
        }
        tracing::debug!(size = pc, records = self.prog.len(), "placement done");
    }

    /// Recompute PCs from the cached descriptors, re-looking up widened
    /// branches. Returns the unpadded size.
    fn assign_pcs(&mut self) -> u32 {
        let mut pc = 0u32;
        let mut cur = self.prog.first();
        while let Some(id) = cur {
            pc = align_for(self.prog[id].mnemonic, pc);
            self.prog[id].pc = pc;
            let enc = lookup(&mut self.prog[id], self.autosize, &mut *self.sink);
            pc += u32::from(enc.size);
            cur = self.prog.next(id);
        }
        pc
    }

    /// Short branches that cannot reach their target.
    fn out_of_reach(&self) -> Vec<InstId> {
        self.prog
            .iter()
            .filter_map(|(id, inst)| {
                let bits = short_reach(inst.enc?.form)?;
                let target = self.prog.get(inst.target?)?;
                let disp = i64::from(target.pc) - i64::from(inst.pc);
                (disp & 3 == 0 && !fits(disp >> 2, bits)).then_some(id)
            })
            .collect()
    }

    /// Widen branches until every short branch reaches. Returns the number
    /// of passes run.
    fn relax(&mut self) -> Result<usize, AsmError> {
        for pass in 1..=self.cfg.max_passes {
            let size = self.assign_pcs();
            let far = self.out_of_reach();
            tracing::debug!(pass, size, widened = far.len(), "layout pass");
            if far.is_empty() {
                return Ok(pass);
            }
            for id in far {
                tracing::debug!(pc = self.prog[id].pc, inst = %self.prog[id], "widen branch");
                self.prog[id].widen();
            }
        }
        Err(AsmError::RelaxationLimit {
            max: self.cfg.max_passes,
        })
    }

    /// Final pass: encode every record at its PC.
    fn emit(&mut self, passes: usize) -> Result<Assembled, AsmError> {
        let mut code = Vec::new();
        let mut insts = Vec::with_capacity(self.prog.len());
        let mut relocations = Vec::new();
        let mut cur = self.prog.first();
        while let Some(id) = cur {
            let inst = &self.prog[id];
            cur = inst.next;
            let enc = inst
                .enc
                .ok_or_else(|| AsmError::inconsistent(format!("{} was never looked up", inst.mnemonic)))?;
            let pc = inst.pc;
            if code.len() < pc as usize {
                code.resize(pc as usize, 0);
            }

            let encoded = match inst.target {
                Some(t) => match self.prog.get(t) {
                    Some(target) => encode(inst, Some(target), self.autosize),
                    None => Err(AsmError::invalid(format!(
                        "branch target #{} is not part of this program",
                        t.index()
                    ))),
                },
                None => encode(inst, None, self.autosize),
            };
            let words = match encoded {
                Ok(words) => words,
                Err(err) if err.severity() == Severity::Fatal => return Err(err),
                Err(err) => {
                    self.report(id, err);
                    insts.push(Emitted {
                        id,
                        pc,
                        words: vec![0; usize::from(enc.size / 4)],
                    });
                    code.resize(pc as usize + usize::from(enc.size), 0);
                    continue;
                }
            };
            if words.byte_len() != u32::from(enc.size) {
                return Err(AsmError::inconsistent(format!(
                    "{} encoded to {} bytes, descriptor says {}",
                    inst.mnemonic,
                    words.byte_len(),
                    enc.size
                )));
            }
            if let Some(reloc) = relocation(inst, enc.form) {
                relocations.push(reloc);
            }
            words.write_le(&mut code);
            insts.push(Emitted {
                id,
                pc,
                words: words.to_vec(),
            });
        }

        let size = self.cfg.align_function(code.len() as u32);
        code.resize(size as usize, 0);
        tracing::debug!(size, passes, relocations = relocations.len(), "assembled");
        Ok(Assembled {
            code,
            size,
            insts,
            relocations,
            passes,
        })
    }
}

/// Relocation for a data literal holding a symbol address.
fn relocation(inst: &Inst, form: Form) -> Option<Relocation> {
    let kind = match form {
        Form::Word => RelocKind::Abs32,
        Form::Dword => RelocKind::Abs64,
        _ => return None,
    };
    match &inst.to {
        Operand::Addr(m) => match &m.base {
            MemBase::Extern(symbol) => Some(Relocation {
                offset: inst.pc,
                kind,
                symbol: symbol.clone(),
                addend: m.offset,
            }),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{MemRef, Reg};

    fn r(n: u8) -> Operand {
        Operand::Reg(Reg::r(n))
    }

    fn nop() -> Inst {
        Inst::new(Mnemonic::Nop)
    }

    fn test_bit() -> Inst {
        Inst::new(Mnemonic::Tbz)
            .with_from(Operand::Imm(3))
            .with_reg(Reg::r(0))
            .with_to(Operand::Branch)
    }

    fn small(max_pc_displacement: u32) -> Assembler {
        let mut asm = Assembler::new();
        asm.config(LayoutConfig {
            max_pc_displacement,
            ..LayoutConfig::default()
        });
        asm
    }

    #[test]
    fn pads_to_function_alignment() {
        let mut prog = Program::new(0);
        prog.push(nop());
        let out = assemble(&mut prog).unwrap();
        assert_eq!(out.size, 16);
        assert_eq!(out.code.len(), 16);
        assert_eq!(out.words().collect::<Vec<_>>(), vec![0xD503_201F, 0, 0, 0]);
    }

    #[test]
    fn pcs_follow_sizes() {
        let mut prog = Program::new(0);
        let a = prog.push(nop());
        let b = prog.push(
            Inst::new(Mnemonic::Rem)
                .with_from(r(2))
                .with_reg(Reg::r(1))
                .with_to(r(0)),
        );
        let c = prog.push(nop());
        let out = assemble(&mut prog).unwrap();
        assert_eq!(out.pc_of(a), Some(0));
        assert_eq!(out.pc_of(b), Some(4));
        assert_eq!(out.pc_of(c), Some(12));
    }

    #[test]
    fn pool_follows_return_without_skip() {
        let mut prog = Program::new(0);
        let mov = prog.push(
            Inst::new(Mnemonic::Mov)
                .with_from(Operand::Imm(0x1234_5678_9abc_def0))
                .with_to(r(0)),
        );
        let ret = prog.push(Inst::new(Mnemonic::Ret));
        let out = assemble(&mut prog).unwrap();

        let entry = prog[mov].target.unwrap();
        assert_eq!(prog[ret].next, Some(entry));
        assert_eq!(prog[entry].mnemonic, Mnemonic::Dword);
        assert_eq!(out.pc_of(entry), Some(8));
        // LDR X0, .+8
        assert_eq!(out.insts[0].words, vec![0x5800_0040]);
        assert_eq!(out.insts[2].words, vec![0x9abc_def0, 0x1234_5678]);
    }

    #[test]
    fn double_word_is_padded_to_eight() {
        let mut prog = Program::new(0);
        prog.push(nop());
        let d = prog.push(Inst::new(Mnemonic::Dword).with_to(Operand::Imm(-1)));
        let out = assemble(&mut prog).unwrap();
        assert_eq!(out.pc_of(d), Some(8));
        assert_eq!(&out.code[4..8], &[0, 0, 0, 0]);
        assert_eq!(&out.code[8..16], &[0xFF; 8]);
    }

    #[test]
    fn stream_end_flushes_behind_skip_branch() {
        let mut prog = Program::new(0);
        prog.push(
            Inst::new(Mnemonic::Add)
                .with_from(Operand::Imm(0x1234_5678))
                .with_to(r(3)),
        );
        let out = assemble(&mut prog).unwrap();
        let forms: Vec<_> = prog.iter().map(|(_, i)| i.mnemonic).collect();
        assert_eq!(
            forms,
            vec![Mnemonic::Add, Mnemonic::B, Mnemonic::Word, Mnemonic::Marker]
        );
        // B over the word to the marker at 16.
        assert_eq!(out.insts[1].pc, 8);
        assert_eq!(out.insts[1].words, vec![0x1400_0002]);
        assert_eq!(out.insts[3].pc, 16);
        assert!(out.insts[3].words.is_empty());
    }

    #[test]
    fn far_literal_flushes_early() {
        let mut prog = Program::new(0);
        let first = prog.push(
            Inst::new(Mnemonic::Mov)
                .with_from(Operand::Imm(0x1234_5678_9abc))
                .with_to(r(0)),
        );
        for _ in 0..64 {
            prog.push(nop());
        }
        prog.push(Inst::new(Mnemonic::Ret));
        let out = small(64).assemble(&mut prog).unwrap();

        let entry = prog[first].target.unwrap();
        let entry_pc = out.pc_of(entry).unwrap();
        assert!(entry_pc <= 64, "pool placed at {entry_pc}");
        // The skip branch sits right before the pool entry.
        let skip = out.insts.iter().position(|e| e.id == entry).unwrap() - 1;
        assert_eq!(prog[out.insts[skip].id].mnemonic, Mnemonic::B);
    }

    #[test]
    fn conditional_branch_is_widened() {
        let mut prog = Program::new(0);
        let tbz = prog.push(test_bit());
        for _ in 0..(1 << 13) {
            prog.push(nop());
        }
        let target = prog.push(Inst::new(Mnemonic::Ret));
        prog.set_target(tbz, target);
        let out = assemble(&mut prog).unwrap();

        assert!(prog[tbz].is_far());
        assert_eq!(out.passes, 2);
        let words = &out.insts[0].words;
        // TBNZ X0, #3, .+8; B target
        assert_eq!(words[0], 0x3718_0040);
        assert_eq!(words[1], 0x1400_0000 | ((1 << 13) + 1));
    }

    #[test]
    fn nearby_branch_stays_short() {
        let mut prog = Program::new(0);
        let b = prog.push(Inst::new(Mnemonic::Bne).with_to(Operand::Branch));
        let t = prog.push(Inst::new(Mnemonic::Ret));
        prog.set_target(b, t);
        let out = assemble(&mut prog).unwrap();
        assert!(!prog[b].is_far());
        assert_eq!(out.passes, 1);
        assert_eq!(out.insts[0].words, vec![0x5400_0021]);
    }

    fn broken() -> Program {
        let mut prog = Program::new(0);
        prog.push(
            Inst::new(Mnemonic::Add)
                .with_from(Operand::Reg(Reg::f(1)))
                .with_to(r(0)),
        );
        prog.push(
            Inst::new(Mnemonic::Mov)
                .with_from(Operand::Mem(MemRef::reg(Reg::r(1), 1001)))
                .with_to(r(0)),
        );
        prog.push(nop());
        prog
    }

    #[test]
    fn recoverable_errors_leave_zeros() {
        let mut prog = broken();
        let mut sink = CollectingSink::new();
        let out = Assembler::new().assemble_with(&mut prog, &mut sink).unwrap();
        assert_eq!(sink.diagnostics().len(), 2);
        assert_eq!(out.insts[0].words, vec![0]);
        assert_eq!(out.insts[1].words, vec![0]);
        assert_eq!(out.insts[2].words, vec![0xD503_201F]);

        assert!(matches!(
            Assembler::new().assemble(&mut broken()),
            Err(AsmError::Multiple { .. })
        ));
    }

    #[test]
    fn foreign_target_is_reported() {
        let mut other = Program::new(0);
        for _ in 0..4 {
            other.push(nop());
        }
        let stale = other.push(nop());

        let mut prog = Program::new(0);
        prog.push(Inst::new(Mnemonic::B).with_to(Operand::Branch).with_target(stale));
        prog.push(nop());
        let mut sink = CollectingSink::new();
        let out = Assembler::new().assemble_with(&mut prog, &mut sink).unwrap();
        assert_eq!(sink.diagnostics().len(), 1);
        assert!(matches!(
            sink.diagnostics()[0].error,
            AsmError::InvalidOperand { .. }
        ));
        assert_eq!(out.insts[0].words, vec![0]);
        assert_eq!(out.insts[1].words, vec![0xD503_201F]);
    }

    #[test]
    fn pseudo_ops_take_no_space() {
        let mut prog = Program::new(0);
        prog.push(Inst::new(Mnemonic::Text).with_to(Operand::TextSize(0)));
        prog.push(nop());
        let out = assemble(&mut prog).unwrap();
        assert_eq!(out.insts[0].words, Vec::<u32>::new());
        assert_eq!(out.insts[1].pc, 0);
    }

    #[test]
    fn symbol_literal_carries_relocation() {
        let mut prog = Program::new(0);
        let sym = MemRef::sym(Symbol::new("runtime.tls_g"), 8);
        prog.push(Inst::new(Mnemonic::Mov).with_from(Operand::Addr(sym)).with_to(r(1)));
        prog.push(Inst::new(Mnemonic::Ret));
        let out = assemble(&mut prog).unwrap();
        assert_eq!(
            out.relocations,
            vec![Relocation {
                offset: 8,
                kind: RelocKind::Abs64,
                symbol: Symbol::new("runtime.tls_g"),
                addend: 8,
            }]
        );
    }

    #[test]
    fn relaxation_limit_is_fatal() {
        let mut prog = Program::new(0);
        let b = prog.push(test_bit());
        for _ in 0..(1 << 13) {
            prog.push(nop());
        }
        let t = prog.push(Inst::new(Mnemonic::Ret));
        prog.set_target(b, t);
        let mut asm = Assembler::new();
        asm.config(LayoutConfig {
            max_passes: 1,
            ..LayoutConfig::default()
        });
        let mut sink = CollectingSink::new();
        assert_eq!(
            asm.assemble_with(&mut prog, &mut sink).unwrap_err(),
            AsmError::RelaxationLimit { max: 1 }
        );
    }
}

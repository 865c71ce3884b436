//! Literal pool.
//!
//! Constants that no instruction field can hold are collected as pending
//! `WORD`/`DWORD` records and spliced into the stream after an
//! unconditional transfer, or behind a skip branch once the first reference
//! would otherwise fall out of PC-relative reach.

use crate::classify::classify;
use crate::config::LayoutConfig;
use crate::ir::{Inst, InstId, MemBase, MemRef, Mnemonic, Operand, Program};

/// The pool record holding `op` for `inst`.
///
/// Symbol references become double-word address literals; everything else
/// holds the operand's resolved value (effective stack offset, immediate,
/// or float bits). A double word is used for 64-bit moves and for values
/// outside the 32-bit range.
pub fn literal(inst: &Inst, op: &Operand, autosize: i64) -> Inst {
    if let Some(m) = symbol_ref(op) {
        return Inst::new(Mnemonic::Dword)
            .with_to(Operand::Addr(m))
            .with_line(inst.line);
    }
    let value = match op {
        Operand::FImm(f) if inst.mnemonic == Mnemonic::FmovS => i64::from((*f as f32).to_bits()),
        _ => classify(op, autosize).offset,
    };
    let fits_word = (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value);
    let wide = matches!(inst.mnemonic, Mnemonic::Mov | Mnemonic::FmovD) || !fits_word;
    let mnemonic = if wide { Mnemonic::Dword } else { Mnemonic::Word };
    Inst::new(mnemonic)
        .with_to(Operand::Imm(value))
        .with_line(inst.line)
}

fn symbol_ref(op: &Operand) -> Option<MemRef> {
    match op {
        Operand::Addr(m) | Operand::Mem(m) => match &m.base {
            MemBase::Extern(s) => Some(MemRef::sym(s.clone(), m.offset)),
            _ => None,
        },
        _ => None,
    }
}

const fn entry_size(m: Mnemonic) -> u32 {
    match m {
        Mnemonic::Dword => 8,
        _ => 4,
    }
}

/// Pending literals for one function.
#[derive(Debug, Default)]
pub struct LiteralPool {
    entries: Vec<InstId>,
    /// Bytes the pending entries will occupy, alignment included.
    size: u32,
    /// PC of the first instruction referencing a pending entry.
    start: u32,
    /// Bytes the short branches placed since `start` may still grow by.
    headroom: u32,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn headroom(&self) -> u32 {
        self.headroom
    }

    /// Account for a short branch placed between the first reference and
    /// the pool. Relaxation may widen it by one word, moving the pool
    /// further away.
    pub fn reserve_widening(&mut self) {
        if !self.entries.is_empty() {
            self.headroom += 4;
        }
    }

    /// Promote `op` of instruction `id` into the pool and point the
    /// instruction at its entry. A pending entry with the same kind and
    /// value is reused.
    pub fn add(&mut self, prog: &mut Program, id: InstId, op: &Operand, autosize: i64) -> InstId {
        let lit = literal(&prog[id], op, autosize);
        let existing = self
            .entries
            .iter()
            .copied()
            .find(|&e| prog[e].mnemonic == lit.mnemonic && prog[e].to == lit.to);
        let entry = match existing {
            Some(e) => e,
            None => {
                if self.entries.is_empty() {
                    self.start = prog[id].pc;
                }
                let n = entry_size(lit.mnemonic);
                self.size = ((self.size + n - 1) & !(n - 1)) + n;
                let e = prog.alloc(lit);
                self.entries.push(e);
                e
            }
        };
        prog[id].target = Some(entry);
        entry
    }

    /// Whether the pool must be placed right after the instruction at `pc`:
    /// it has grown past the size limit, or the literal referenced first
    /// would end up out of reach of that reference once every short branch
    /// in between is widened.
    pub fn must_flush(&self, pc: u32, cfg: &LayoutConfig) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let reach = u64::from(pc) + 4 + u64::from(self.size) + 8 + u64::from(self.headroom)
            - u64::from(self.start);
        self.size >= cfg.pool_size_limit || reach > u64::from(cfg.max_pc_displacement)
    }

    /// Splice the pending entries in after `at` and reset.
    ///
    /// With `skip`, an unconditional branch over the entries goes first; it
    /// targets the record that followed `at`, or a new zero-size marker when
    /// `at` ends the stream. Returns the skip branch, if one was inserted.
    pub fn flush(&mut self, prog: &mut Program, at: InstId, skip: bool) -> Option<InstId> {
        if self.entries.is_empty() {
            return None;
        }
        let line = prog[at].line;
        let count = self.entries.len();
        for &e in &self.entries {
            prog[e].line = line;
        }
        let mut chain = Vec::with_capacity(self.entries.len() + 2);
        let mut branch = None;
        if skip {
            let after = match prog.next(at) {
                Some(next) => next,
                None => {
                    let marker = prog.alloc(Inst::new(Mnemonic::Marker).with_line(line));
                    self.entries.push(marker);
                    marker
                }
            };
            let b = prog.alloc(
                Inst::new(Mnemonic::B)
                    .with_to(Operand::Branch)
                    .with_target(after)
                    .with_line(line),
            );
            chain.push(b);
            branch = Some(b);
        }
        chain.append(&mut self.entries);

        tracing::debug!(
            pc = prog[at].pc,
            entries = count,
            bytes = self.size,
            start = self.start,
            headroom = self.headroom,
            skip,
            "flush literal pool"
        );
        prog.splice_after(at, &chain);
        self.size = 0;
        self.start = 0;
        self.headroom = 0;
        branch
    }
}

//! Property-based tests using proptest.
//!
//! These tests check the assembler's invariants over randomly generated
//! inputs: the class matrix, the classifier, the bitmask predicate, and
//! whole-program layout.

use arm64_asm::class::compatible;
use arm64_asm::classify::{classify, encode_bitmask, is_bitcon};
use arm64_asm::{
    assemble, lookup, Assembler, Class, CollectingSink, Inst, LayoutConfig, MemRef, Mnemonic,
    Operand, Program, Reg,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn arb_class() -> impl Strategy<Value = Class> {
    prop::sample::select(Class::ALL.to_vec())
}

/// Operands the classifier handles, including every memory base.
fn arb_operand() -> impl Strategy<Value = Operand> {
    prop_oneof![
        any::<i64>().prop_map(Operand::Imm),
        (0u8..32).prop_map(|n| Operand::Reg(Reg::r(n))),
        (0u8..32).prop_map(|n| Operand::Reg(Reg::f(n))),
        (-4096i64..70_000).prop_map(|o| Operand::Mem(MemRef::auto(o))),
        (-4096i64..70_000).prop_map(|o| Operand::Mem(MemRef::param(o))),
        (0u8..31, -4096i64..70_000).prop_map(|(n, o)| Operand::Mem(MemRef::reg(Reg::r(n), o))),
        (-4096i64..70_000).prop_map(|o| Operand::Addr(MemRef::auto(o))),
        any::<f64>().prop_map(Operand::FImm),
    ]
}

/// A replicated run of ones: element size, run length and rotation.
fn arb_bitmask() -> impl Strategy<Value = u64> {
    (1u32..=6)
        .prop_flat_map(|log| {
            let size = 1u32 << log;
            (Just(size), 1..size, 0..size)
        })
        .prop_map(|(size, ones, rot)| {
            let elem_mask = if size == 64 { u64::MAX } else { (1u64 << size) - 1 };
            let run = (1u64 << ones) - 1;
            let elem = ((run >> rot) | (run << ((size - rot) % size))) & elem_mask;
            let mut v = 0u64;
            let mut shift = 0;
            while shift < 64 {
                v |= elem << shift;
                shift += size;
            }
            v
        })
}

/// One abstract instruction of a generated program. Branch targets are
/// given as a forward distance in records.
#[derive(Debug, Clone)]
enum Step {
    Nop,
    AddRegs(u8, u8),
    AddImm(i64),
    LoadConst(i64),
    LoadStack(i64),
    BranchFwd(usize),
    Return,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Nop),
        2 => (0u8..28, 0u8..28).prop_map(|(a, b)| Step::AddRegs(a, b)),
        2 => any::<u32>().prop_map(|v| Step::AddImm(i64::from(v))),
        2 => any::<i64>().prop_map(Step::LoadConst),
        1 => (0i64..0x2_0000).prop_map(|o| Step::LoadStack(o & !7)),
        1 => (1usize..16).prop_map(Step::BranchFwd),
        1 => Just(Step::Return),
    ]
}

fn build(steps: &[Step]) -> Program {
    let mut prog = Program::new(64);
    let mut ids = Vec::with_capacity(steps.len());
    let mut branches = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        let inst = match *step {
            Step::Nop => Inst::new(Mnemonic::Nop),
            Step::AddRegs(a, b) => Inst::new(Mnemonic::Add)
                .with_from(Operand::Reg(Reg::r(a)))
                .with_reg(Reg::r(b))
                .with_to(Operand::Reg(Reg::r(a))),
            Step::AddImm(v) => Inst::new(Mnemonic::Add)
                .with_from(Operand::Imm(v))
                .with_to(Operand::Reg(Reg::r(3))),
            Step::LoadConst(v) => Inst::new(Mnemonic::Mov)
                .with_from(Operand::Imm(v))
                .with_to(Operand::Reg(Reg::r(4))),
            Step::LoadStack(o) => Inst::new(Mnemonic::Mov)
                .with_from(Operand::Mem(MemRef::auto(o)))
                .with_to(Operand::Reg(Reg::r(5))),
            Step::BranchFwd(d) => {
                branches.push((i, (i + d).min(steps.len())));
                Inst::new(Mnemonic::Beq).with_to(Operand::Branch)
            }
            Step::Return => Inst::new(Mnemonic::Ret),
        };
        ids.push(prog.push(inst));
    }
    let end = prog.push(Inst::new(Mnemonic::Ret));
    ids.push(end);
    for (from, to) in branches {
        prog.set_target(ids[from], ids[to]);
    }
    prog
}

// ── Class matrix ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn matrix_is_reflexive(c in arb_class()) {
        prop_assert!(compatible(c, c));
    }

    #[test]
    fn matrix_is_transitive(a in arb_class(), b in arb_class(), c in arb_class()) {
        if compatible(a, b) && compatible(b, c) {
            prop_assert!(compatible(a, c));
        }
    }
}

// ── Classifier ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn classify_is_pure(op in arb_operand(), autosize in 0i64..4096) {
        prop_assert_eq!(classify(&op, autosize), classify(&op, autosize));
    }

    #[test]
    fn constants_fit_vcon(v in any::<i64>()) {
        let class = classify(&Operand::Imm(v), 0).class;
        prop_assert!(compatible(Class::VCon, class), "{v:#x} classified {class}");
    }

    #[test]
    fn stack_offset_is_frame_relative(off in -4096i64..70_000, autosize in 0i64..4096) {
        let c = classify(&Operand::Mem(MemRef::auto(off)), autosize);
        prop_assert_eq!(c.offset, off + autosize);
    }

    #[test]
    fn replicated_runs_are_bitmasks(v in arb_bitmask()) {
        prop_assert!(is_bitcon(v), "{v:#x}");
        prop_assert!(encode_bitmask(v, true).is_some());
    }

    #[test]
    fn bitmask_fields_are_in_range(v in any::<u64>()) {
        if let Some((n, immr, imms)) = encode_bitmask(v, true) {
            prop_assert!(n <= 1);
            prop_assert!(immr < 64);
            prop_assert!(imms < 64);
        }
    }
}

// ── Lookup ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn lookup_is_idempotent(v in any::<i64>(), rd in 0u8..31) {
        let mut inst = Inst::new(Mnemonic::Mov)
            .with_from(Operand::Imm(v))
            .with_to(Operand::Reg(Reg::r(rd)));
        let mut sink = CollectingSink::new();
        let a = lookup(&mut inst, 8, &mut sink);
        let b = lookup(&mut inst, 8, &mut sink);
        prop_assert!(std::ptr::eq(a, b));
        prop_assert!(sink.is_empty());
    }
}

// ── Layout ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn layout_invariants(steps in prop::collection::vec(arb_step(), 0..64)) {
        let mut prog = build(&steps);
        let out = assemble(&mut prog).unwrap();

        prop_assert_eq!(out.code.len(), out.size as usize);
        prop_assert_eq!(out.size % 16, 0);
        let mut end = 0u32;
        for e in &out.insts {
            prop_assert!(e.pc >= end, "record at {} overlaps previous end {}", e.pc, end);
            prop_assert_eq!(e.pc % 4, 0);
            if prog[e.id].mnemonic == Mnemonic::Dword {
                prop_assert_eq!(e.pc % 8, 0);
            }
            end = e.pc + 4 * e.words.len() as u32;
        }
        prop_assert!(end <= out.size);
    }

    #[test]
    fn pools_stay_in_reach(
        steps in prop::collection::vec(arb_step(), 1..64),
        limit in 48u32..512,
    ) {
        let mut asm = Assembler::new();
        asm.config(LayoutConfig {
            max_pc_displacement: limit,
            ..LayoutConfig::default()
        });
        let mut prog = build(&steps);
        let out = asm.assemble(&mut prog).unwrap();

        // Every literal sits after its first reference and within reach.
        for e in &out.insts {
            let inst = &prog[e.id];
            let Some(entry) = inst.target else { continue };
            if !matches!(prog[entry].mnemonic, Mnemonic::Word | Mnemonic::Dword) {
                continue;
            }
            let entry_pc = out.pc_of(entry).unwrap();
            prop_assert!(entry_pc > e.pc);
            prop_assert!(entry_pc - e.pc < limit + 16, "{} -> {}", e.pc, entry_pc);
        }
    }

    #[test]
    fn branches_only_grow(steps in prop::collection::vec(arb_step(), 1..64)) {
        let mut prog = build(&steps);
        let out = assemble(&mut prog).unwrap();
        prop_assert!(out.passes >= 1);
        prop_assert!(out.passes <= LayoutConfig::default().max_passes);
        for e in &out.insts {
            let inst = &prog[e.id];
            let size = inst.encoding().map_or(0, |enc| usize::from(enc.size));
            prop_assert_eq!(e.words.len() * 4, size);
            if inst.is_far() {
                prop_assert_eq!(size, 8);
            }
        }
    }
}

//! Performance benchmarks for `arm64_asm`.
//!
//! Measures:
//! - Single record lookup + encode latency
//! - Straight-line layout throughput (records per second)
//! - Literal-pool heavy workloads
//! - Branch relaxation passes
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use arm64_asm::{
    assemble, Assembler, Cond, Inst, LayoutConfig, MemRef, Mnemonic, Operand, Program, Reg,
};

fn r(n: u8) -> Operand {
    Operand::Reg(Reg::r(n))
}

// ─── Single-Record Latency ───────────────────────────────────────────────────

fn single(inst: Inst) -> Program {
    let mut prog = Program::new(0);
    prog.push(inst);
    prog
}

fn bench_single_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_instruction");

    let cases = [
        (
            "add_reg",
            Inst::new(Mnemonic::Add).with_from(r(2)).with_reg(Reg::r(1)).with_to(r(0)),
        ),
        (
            "and_bitmask",
            Inst::new(Mnemonic::And)
                .with_from(Operand::Imm(0x00FF_00FF_00FF_00FF))
                .with_to(r(0)),
        ),
        (
            "ldr_offset",
            Inst::new(Mnemonic::Mov)
                .with_from(Operand::Mem(MemRef::reg(Reg::r(1), 8)))
                .with_to(r(0)),
        ),
        (
            "mov_pooled",
            Inst::new(Mnemonic::Mov)
                .with_from(Operand::Imm(0x1234_5678_9abc))
                .with_to(r(0)),
        ),
        (
            "csel",
            Inst::new(Mnemonic::Csel)
                .with_from(Operand::Cond(Cond::Lt))
                .with_reg(Reg::r(1))
                .with_aux(r(2))
                .with_to(r(0)),
        ),
    ];

    for (name, inst) in cases {
        let prog = single(inst);
        group.bench_function(name, |b| {
            b.iter_batched(
                || prog.clone(),
                |mut p| assemble(black_box(&mut p)).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// ─── Straight-Line Throughput ────────────────────────────────────────────────

/// Generate a block of N register and small-immediate records.
fn gen_block(n: usize) -> Program {
    let mut prog = Program::new(0);
    for i in 0..n {
        let a = (i % 28) as u8;
        let inst = match i % 6 {
            0 => Inst::new(Mnemonic::Add).with_from(r(a)).with_to(r(0)),
            1 => Inst::new(Mnemonic::Sub).with_from(Operand::Imm(16)).with_to(r(1)),
            2 => Inst::new(Mnemonic::Eor).with_from(r(a)).with_reg(Reg::r(2)).with_to(r(3)),
            3 => Inst::new(Mnemonic::Mov)
                .with_from(Operand::Mem(MemRef::reg(Reg::r(4), 8 * (i as i64 % 64))))
                .with_to(r(5)),
            4 => Inst::new(Mnemonic::Mov)
                .with_from(r(6))
                .with_to(Operand::Mem(MemRef::auto(8 * (i as i64 % 32)))),
            _ => Inst::new(Mnemonic::Lsl).with_from(Operand::Imm(3)).with_to(r(7)),
        };
        prog.push(inst);
    }
    prog.push(Inst::new(Mnemonic::Ret));
    prog
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    for n in [100usize, 1_000, 10_000] {
        let prog = gen_block(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("straight_line_{n}"), |b| {
            b.iter_batched(
                || prog.clone(),
                |mut p| assemble(black_box(&mut p)).unwrap(),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

// ─── Literal Pools ───────────────────────────────────────────────────────────

/// N wide constants, half of them repeated, with a small reach so pools are
/// flushed behind skip branches along the way.
fn gen_pool_heavy(n: usize) -> Program {
    let mut prog = Program::new(0);
    for i in 0..n {
        let v = 0x1234_5678_0000_0000 | (i as i64 / 2);
        prog.push(Inst::new(Mnemonic::Mov).with_from(Operand::Imm(v)).with_to(r(0)));
        prog.push(Inst::new(Mnemonic::Nop));
    }
    prog.push(Inst::new(Mnemonic::Ret));
    prog
}

fn bench_pools(c: &mut Criterion) {
    let mut group = c.benchmark_group("literal_pool");
    let mut asm = Assembler::new();
    asm.config(LayoutConfig {
        max_pc_displacement: 4096,
        ..LayoutConfig::default()
    });

    for n in [100usize, 1_000] {
        let prog = gen_pool_heavy(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("wide_constants_{n}"), |b| {
            b.iter_batched(
                || prog.clone(),
                |mut p| asm.assemble(black_box(&mut p)).unwrap(),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

// ─── Branch Relaxation ───────────────────────────────────────────────────────

/// Test-bit branches over N NOPs: with enough NOPs every branch must widen.
fn gen_relaxation_workload(n_nops: usize) -> Program {
    let mut prog = Program::new(0);
    let mut branches = Vec::new();
    for bit in 0..8 {
        branches.push(prog.push(
            Inst::new(Mnemonic::Tbz)
                .with_from(Operand::Imm(bit))
                .with_reg(Reg::r(0))
                .with_to(Operand::Branch),
        ));
    }
    for _ in 0..n_nops {
        prog.push(Inst::new(Mnemonic::Nop));
    }
    let end = prog.push(Inst::new(Mnemonic::Ret));
    for id in branches {
        prog.set_target(id, end);
    }
    prog
}

fn bench_relaxation(c: &mut Criterion) {
    let mut group = c.benchmark_group("relaxation");
    group.sample_size(20);

    for n in [1_000usize, 10_000] {
        let prog = gen_relaxation_workload(n);
        group.bench_function(format!("test_bit_over_{n}_nops"), |b| {
            b.iter_batched(
                || prog.clone(),
                |mut p| assemble(black_box(&mut p)).unwrap(),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_instruction,
    bench_throughput,
    bench_pools,
    bench_relaxation
);
criterion_main!(benches);

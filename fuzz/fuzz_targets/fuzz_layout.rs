#![no_main]
use arm64_asm::{
    Assembler, Cond, Inst, LayoutConfig, MemRef, Mnemonic, Operand, Program, Reg, TracingSink,
};
use libfuzzer_sys::fuzz_target;

/// Decode an operand from a selector byte and an immediate.
fn operand(sel: u8, imm: i64) -> Operand {
    let n = sel >> 3;
    match sel & 7 {
        0 => Operand::None,
        1 => Operand::Reg(Reg::r(n)),
        2 => Operand::Reg(Reg::f(n)),
        3 => Operand::Imm(imm),
        4 => Operand::Mem(MemRef::reg(Reg::r(n), imm >> 40)),
        5 => Operand::Mem(MemRef::auto(imm >> 44)),
        6 => Operand::Cond(Cond::Eq),
        _ => Operand::Branch,
    }
}

fuzz_target!(|data: &[u8]| {
    // Layout must never panic, only report or return Err.
    let mut prog = Program::new(i64::from(data.first().copied().unwrap_or(0)) * 8);
    let mut ids = Vec::new();
    for chunk in data.chunks_exact(12) {
        let m = Mnemonic::ALL[usize::from(chunk[0]) % Mnemonic::ALL.len()];
        let mut imm = [0u8; 8];
        imm.copy_from_slice(&chunk[4..12]);
        let imm = i64::from_le_bytes(imm);
        let mut inst = Inst::new(m)
            .with_from(operand(chunk[1], imm))
            .with_to(operand(chunk[2], imm));
        if chunk[3] & 0x80 != 0 {
            inst = inst.with_reg(Reg::r(chunk[3] & 31));
        }
        ids.push(prog.push(inst));
    }
    for (i, &id) in ids.iter().enumerate() {
        if prog[id].to == Operand::Branch {
            let t = ids[(i + usize::from(data[i % data.len()])) % ids.len()];
            prog.set_target(id, t);
        }
    }

    let mut asm = Assembler::new();
    asm.config(LayoutConfig {
        max_pc_displacement: 64 + u32::from(data.last().copied().unwrap_or(0)) * 16,
        max_passes: 8,
        ..LayoutConfig::default()
    });
    let mut sink = TracingSink::new();
    let _ = asm.assemble_with(&mut prog, &mut sink);
});

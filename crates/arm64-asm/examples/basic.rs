//! Basic assembly example: a small function with a frame, a wide constant
//! and a loop, assembled with diagnostics routed through `tracing`.
//!
//! Run with: `cargo run --example basic`

use arm64_asm::{
    Assembler, Inst, MemRef, Mnemonic, Operand, Program, Reg, TracingSink,
};

fn r(n: u8) -> Operand {
    Operand::Reg(Reg::r(n))
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== arm64_asm basic example ===\n");

    // sum(n): x0 = n + (n-1) + ... + 1, plus a 48-bit bias from the pool.
    let mut prog = Program::new(16);
    prog.push(
        Inst::new(Mnemonic::Mov)
            .with_from(r(0))
            .with_to(Operand::Mem(MemRef::auto(0))),
    );
    prog.push(Inst::new(Mnemonic::Mov).with_from(Operand::Imm(0)).with_to(r(1)));
    let top = prog.push(Inst::new(Mnemonic::Add).with_from(r(0)).with_to(r(1)));
    prog.push(
        Inst::new(Mnemonic::Subs)
            .with_from(Operand::Imm(1))
            .with_to(r(0)),
    );
    let back = prog.push(Inst::new(Mnemonic::Bne).with_to(Operand::Branch));
    prog.set_target(back, top);
    prog.push(
        Inst::new(Mnemonic::Mov)
            .with_from(Operand::Imm(0x0000_1234_5678_9abc))
            .with_to(r(2)),
    );
    prog.push(Inst::new(Mnemonic::Add).with_from(r(2)).with_reg(Reg::r(1)).with_to(r(0)));
    prog.push(Inst::new(Mnemonic::Ret));

    let mut sink = TracingSink::new();
    let out = match Assembler::new().assemble_with(&mut prog, &mut sink) {
        Ok(out) => out,
        Err(err) => {
            eprintln!("assembly failed: {err}");
            std::process::exit(1);
        }
    };
    if sink.count() > 0 {
        eprintln!("{} diagnostics, output is not usable", sink.count());
        std::process::exit(1);
    }

    println!("Listing ({} bytes, {} passes):", out.size, out.passes);
    for e in &out.insts {
        let words: Vec<String> = e.words.iter().map(|w| format!("{w:08x}")).collect();
        println!("   {:04x}  {:<18} {}", e.pc, words.join(" "), prog[e.id]);
    }
}

//! End-to-end: assemble source, load the result into a `Cpu`, and step it.

use corvid65::asm::assemble;
use corvid65::cpu::disasm::disassemble;
use corvid65::cpu::Cpu;
use corvid65::opcodes::{self, Mnemonic};

#[test]
fn assembled_hello_world_runs_to_completion() {
    let result = assemble(".org $1900\nLDA #'A'\nJSR $FFEE\nRTS\n", None, None).unwrap();
    let mut cpu = Cpu::new();
    cpu.load(result.origin.unwrap(), &result.to_bytes());
    cpu.reset(result.origin.unwrap());

    cpu.step(); // LDA #'A'
    assert_eq!(cpu.a, b'A');
    cpu.step(); // JSR $FFEE -> skipped (OS call)
    assert_eq!(cpu.pc, 0x1905);
    cpu.step(); // RTS
    // RTS pulls a return address never pushed (JSR was skipped); this is
    // caller error, not a core concern, so we only assert the CPU didn't
    // panic and consumed the documented base cycles.
    assert_eq!(cpu.cycles, 2 + 6 + 6);
}

#[test]
fn branch_loop_terminates() {
    // X counts down from 3 to 0, then falls through.
    let src = ".org $2000\nLDX #3\nloop:\nDEX\nBNE loop\nBRK\n";
    let result = assemble(src, None, None).unwrap();
    let mut cpu = Cpu::new();
    cpu.load(0x2000, &result.to_bytes());
    cpu.reset(0x2000);
    for _ in 0..100 {
        if cpu.halted {
            break;
        }
        cpu.step();
    }
    assert!(cpu.halted);
    assert_eq!(cpu.x, 0);
}

#[test]
fn round_trip_opcode_invariant() {
    // Invariant 1 (spec §8): every legal (mnemonic, mode) pair, assembled
    // and decoded, disassembles back to the same mnemonic and mode.
    let cases: &[(&str, &str)] = &[
        ("LDA", "#$10"),
        ("LDA", "$10"),
        ("LDA", "$10,X"),
        ("LDA", "$1000"),
        ("LDA", "$1000,X"),
        ("LDA", "$1000,Y"),
        ("LDA", "($10,X)"),
        ("LDA", "($10),Y"),
        ("LDA", "($10)"),
        ("STZ", "$10"),
        ("JMP", "($2000)"),
        ("JMP", "($2000,X)"),
        ("BIT", "#$10"),
        ("BIT", "$10,X"),
        ("BIT", "$1000,X"),
        ("BNE", "$1010"),
    ];
    for (mnemonic, operand) in cases {
        let src = format!(".org $1000\n{} {}\n", mnemonic, operand);
        let result = assemble(&src, None, None).unwrap();
        let bytes = result.to_bytes();
        let descriptor = opcodes::decode(bytes[0]).expect("byte must decode");
        assert_eq!(descriptor.mnemonic, Mnemonic::from_str(mnemonic).unwrap(), "{} {}", mnemonic, operand);
    }
}

#[test]
fn sizing_is_stable_regardless_of_definition_order() {
    let before = assemble(".org $2000\nFOO = $70\nLDA FOO\nRTS\n", None, None).unwrap();
    let after = assemble(".org $2000\nLDA FOO\nRTS\nFOO = $70\n", None, None).unwrap();
    assert_eq!(before.to_bytes(), after.to_bytes());
}

#[test]
fn disassembler_matches_assembled_program() {
    let result = assemble(".org $1900\nLDA #'A'\nJSR $FFEE\nRTS\n", None, None).unwrap();
    let mut cpu = Cpu::new();
    cpu.load(0x1900, &result.to_bytes());

    let i0 = disassemble(cpu.memory(), 0x1900);
    assert_eq!(i0.mnemonic, "LDA");
    assert_eq!(i0.operand_text, "#$41");

    let i1 = disassemble(cpu.memory(), 0x1902);
    assert_eq!(i1.mnemonic, "JSR");
    assert_eq!(i1.operand_text, "$FFEE [OSWRCH]");
}

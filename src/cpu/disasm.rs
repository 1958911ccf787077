//! Disassembler (C7): the inverse of [`crate::opcodes::decode`], with MOS
//! vector annotation for `JSR`/`JMP` calls into `$FFB9..=$FFFE`.
//!
//! Grounded on `goblin::mach::header`'s `filetype_to_str`/`flag_to_str`
//! fixed lookup tables: a small, total function from a known constant set
//! to a display name, with an explicit fallback for anything unrecognized.

use core::fmt;

use crate::opcodes::{self, AddressingMode, Mnemonic};

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: u16,
    pub mnemonic: String,
    pub operand_text: String,
    pub size: u16,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operand_text.is_empty() {
            write!(f, "{:04X}  {}", self.address, self.mnemonic)
        } else {
            write!(f, "{:04X}  {}  {}", self.address, self.mnemonic, self.operand_text)
        }
    }
}

/// Fixed BBC MOS entry-point names for `$FFB9..=$FFFE` (spec §4.6).
const MOS_VECTORS: &[(u16, &str)] = &[
    (0xFFB9, "OSDRM"),
    (0xFFBC, "VDUCHR"),
    (0xFFBF, "OSEVEN"),
    (0xFFC2, "OSINIT"),
    (0xFFC5, "OSREAD"),
    (0xFFC8, "GSINIT"),
    (0xFFCB, "GSREAD"),
    (0xFFCE, "NVRDCH"),
    (0xFFD1, "NVWRCH"),
    (0xFFD4, "OSFIND"),
    (0xFFD7, "OSGBPB"),
    (0xFFDA, "OSBPUT"),
    (0xFFDD, "OSBGET"),
    (0xFFE0, "OSARGS"),
    (0xFFE3, "OSASCI"),
    (0xFFE7, "OSNEWL"),
    (0xFFEE, "OSWRCH"),
    (0xFFF1, "OSWORD"),
    (0xFFF4, "OSBYTE"),
    (0xFFF7, "OSCLI"),
    (0xFFFA, "NMI"),
    (0xFFFC, "RESET"),
    (0xFFFE, "IRQ"),
];

fn mos_vector_name(addr: u16) -> Option<&'static str> {
    MOS_VECTORS.iter().find(|(a, _)| *a == addr).map(|(_, name)| *name)
}

/// Annotate a `JSR`/`JMP` target `>= 0xC000`: the named MOS vector if
/// recognized, else the generic `[OS]` marker (spec §4.6).
fn os_annotation(target: u16) -> Option<String> {
    if target < crate::cpu::OS_CALL_THRESHOLD {
        return None;
    }
    Some(match mos_vector_name(target) {
        Some(name) => format!(" [{}]", name),
        None => " [OS]".to_string(),
    })
}

/// Disassemble one instruction at `addr` in `memory`.
pub fn disassemble(memory: &[u8; 0x10000], addr: u16) -> Instruction {
    let opcode = memory[addr as usize];
    let descriptor = match opcodes::decode(opcode) {
        Some(d) => d,
        None => {
            return Instruction {
                address: addr,
                mnemonic: "???".to_string(),
                operand_text: format!("(${:02X})", opcode),
                size: 1,
            }
        }
    };

    let size = descriptor.size();
    let lo = if size >= 2 { memory[addr.wrapping_add(1) as usize] } else { 0 };
    let hi = if size >= 3 { memory[addr.wrapping_add(2) as usize] } else { 0 };
    let operand16 = (hi as u16) << 8 | lo as u16;

    let mnemonic_text = descriptor.mnemonic.to_string();
    let mut operand_text = format_operand(descriptor.mode, lo, operand16, addr);

    if matches!(descriptor.mnemonic, Mnemonic::JSR | Mnemonic::JMP) {
        let target = match descriptor.mode {
            AddressingMode::Absolute => Some(operand16),
            AddressingMode::Indirect => Some(operand16), // annotate the pointer operand itself
            _ => None,
        };
        if let Some(t) = target {
            if let Some(ann) = os_annotation(t) {
                operand_text.push_str(&ann);
            }
        }
    }

    Instruction { address: addr, mnemonic: mnemonic_text, operand_text, size }
}

fn format_operand(mode: AddressingMode, lo: u8, operand16: u16, addr: u16) -> String {
    use AddressingMode::*;
    match mode {
        Implied => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#${:02X}", lo),
        ZeroPage => format!("${:02X}", lo),
        ZeroPageX => format!("${:02X},X", lo),
        ZeroPageY => format!("${:02X},Y", lo),
        Absolute => format!("${:04X}", operand16),
        AbsoluteX => format!("${:04X},X", operand16),
        AbsoluteY => format!("${:04X},Y", operand16),
        Indirect => format!("(${:04X})", operand16),
        AbsoluteIndirectX => format!("(${:04X},X)", operand16),
        IndirectX => format!("(${:02X},X)", lo),
        IndirectY => format!("(${:02X}),Y", lo),
        ZeroPageIndirect => format!("(${:02X})", lo),
        Relative => {
            let delta = lo as i8 as i32;
            let target = (addr as i32 + 2 + delta) as u16;
            format!("${:04X}", target)
        }
    }
}

/// Disassemble `count` instructions starting at `addr`, advancing by each
/// instruction's own size. Useful for a UI rendering a scrolling listing.
pub fn disassemble_range(memory: &[u8; 0x10000], addr: u16, count: usize) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(count);
    let mut pc = addr;
    for _ in 0..count {
        let instr = disassemble(memory, pc);
        pc = pc.wrapping_add(instr.size.max(1));
        out.push(instr);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    #[test]
    fn disassembles_hello_world() {
        let mut cpu = Cpu::new();
        cpu.load(0x1900, &[0xA9, 0x41, 0x20, 0xEE, 0xFF, 0x60]);
        let i0 = disassemble(cpu.memory(), 0x1900);
        assert_eq!(i0.mnemonic, "LDA");
        assert_eq!(i0.operand_text, "#$41");
        assert_eq!(i0.size, 2);

        let i1 = disassemble(cpu.memory(), 0x1902);
        assert_eq!(i1.mnemonic, "JSR");
        assert_eq!(i1.operand_text, "$FFEE [OSWRCH]");

        let i2 = disassemble(cpu.memory(), 0x1905);
        assert_eq!(i2.mnemonic, "RTS");
        assert_eq!(i2.operand_text, "");
    }

    #[test]
    fn unrecognized_os_call_gets_generic_annotation() {
        let mut cpu = Cpu::new();
        cpu.load(0x1900, &[0x4C, 0x00, 0xC1]); // JMP $C100, not a named vector
        let i = disassemble(cpu.memory(), 0x1900);
        assert_eq!(i.operand_text, "$C100 [OS]");
    }

    #[test]
    fn illegal_opcode_disassembly() {
        let mut cpu = Cpu::new();
        cpu.memory_mut()[0x1900] = 0x02;
        let i = disassemble(cpu.memory(), 0x1900);
        assert_eq!(i.mnemonic, "???");
        assert_eq!(i.operand_text, "($02)");
        assert_eq!(i.size, 1);
    }

    #[test]
    fn relative_branch_target_resolved() {
        let mut cpu = Cpu::new();
        cpu.load(0x1000, &[0xD0, 0xFD]); // BNE -3 -> back to $1000
        let i = disassemble(cpu.memory(), 0x1000);
        assert_eq!(i.operand_text, "$1000");
    }

    #[test]
    fn disassemble_range_advances_by_size() {
        let mut cpu = Cpu::new();
        cpu.load(0x1900, &[0xA9, 0x41, 0xEA, 0x60]);
        let instrs = disassemble_range(cpu.memory(), 0x1900, 3);
        assert_eq!(instrs[0].address, 0x1900);
        assert_eq!(instrs[1].address, 0x1902);
        assert_eq!(instrs[2].address, 0x1903);
    }
}

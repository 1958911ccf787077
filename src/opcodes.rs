//! The 65C02 opcode table (C4): a dense 256-entry table keyed by opcode
//! byte, plus lookup in the other direction by (mnemonic, addressing mode).
//!
//! Grounded on `goblin::elf::header`'s dense constant tables paired with a
//! `*_to_str` lookup (`ET_REL` / `et_to_str`) and `goblin::mach::header`'s
//! `flag_to_str`: here the "constant" is the `(Mnemonic, AddressingMode)`
//! pair and the opcode byte is the key, built once as `static` data and
//! shared by the assembler, the CPU core, and the disassembler.

use core::fmt;

/// Every mnemonic this assembler/CPU/disassembler recognizes: the full NMOS
/// 6502 set plus the WDC 65C02 additions named in spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRA, BRK, BVC, BVS,
    CLC, CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY,
    JMP, JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PHX, PHY, PLA, PLP,
    PLX, PLY, ROL, ROR, RTI, RTS, SBC, SEC, SED, SEI, STA, STX, STY, STZ,
    TAX, TAY, TRB, TSB, TSX, TXA, TXS, TYA,
}

impl Mnemonic {
    /// Case-insensitive lookup used by the lexer/parser.
    pub fn from_str(s: &str) -> Option<Mnemonic> {
        use Mnemonic::*;
        Some(match s.to_ascii_uppercase().as_str() {
            "ADC" => ADC, "AND" => AND, "ASL" => ASL, "BCC" => BCC, "BCS" => BCS,
            "BEQ" => BEQ, "BIT" => BIT, "BMI" => BMI, "BNE" => BNE, "BPL" => BPL,
            "BRA" => BRA, "BRK" => BRK, "BVC" => BVC, "BVS" => BVS, "CLC" => CLC,
            "CLD" => CLD, "CLI" => CLI, "CLV" => CLV, "CMP" => CMP, "CPX" => CPX,
            "CPY" => CPY, "DEC" => DEC, "DEX" => DEX, "DEY" => DEY, "EOR" => EOR,
            "INC" => INC, "INX" => INX, "INY" => INY, "JMP" => JMP, "JSR" => JSR,
            "LDA" => LDA, "LDX" => LDX, "LDY" => LDY, "LSR" => LSR, "NOP" => NOP,
            "ORA" => ORA, "PHA" => PHA, "PHP" => PHP, "PHX" => PHX, "PHY" => PHY,
            "PLA" => PLA, "PLP" => PLP, "PLX" => PLX, "PLY" => PLY, "ROL" => ROL,
            "ROR" => ROR, "RTI" => RTI, "RTS" => RTS, "SBC" => SBC, "SEC" => SEC,
            "SED" => SED, "SEI" => SEI, "STA" => STA, "STX" => STX, "STY" => STY,
            "STZ" => STZ, "TAX" => TAX, "TAY" => TAY, "TRB" => TRB, "TSB" => TSB,
            "TSX" => TSX, "TXA" => TXA, "TXS" => TXS, "TYA" => TYA,
            _ => return None,
        })
    }

    /// True for the nine mnemonics that always take relative addressing
    /// (spec §4.3's "Branch mnemonic + expr" row).
    pub fn is_branch(self) -> bool {
        use Mnemonic::*;
        matches!(self, BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS | BRA)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Addressing modes, per spec §3/§4.3/§4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    /// `JMP (abs,X)`: the one 65C02 addressing mode that indexes an
    /// absolute (not zero-page) indirect address (spec §4.4).
    AbsoluteIndirectX,
    IndirectX,
    IndirectY,
    ZeroPageIndirect,
    Relative,
}

impl AddressingMode {
    /// Total instruction size in bytes: opcode + operand, per spec §4.3
    /// "Encoding".
    pub fn size(self) -> u16 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 1,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY
            | ZeroPageIndirect | Relative => 2,
            Absolute | AbsoluteX | AbsoluteY | Indirect | AbsoluteIndirectX => 3,
        }
    }
}

/// A single entry of the opcode table: the decoded shape of one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub opcode: u8,
    pub cycles: u8,
}

impl OpcodeDescriptor {
    pub fn size(&self) -> u16 {
        self.mode.size()
    }
}

macro_rules! op {
    ($table:expr, $opcode:expr, $mnemonic:ident, $mode:ident, $cycles:expr) => {
        $table[$opcode as usize] = Some(OpcodeDescriptor {
            mnemonic: Mnemonic::$mnemonic,
            mode: AddressingMode::$mode,
            opcode: $opcode,
            cycles: $cycles,
        });
    };
}

/// Build the dense 256-entry table. `None` marks an unassigned opcode byte,
/// which decodes at runtime as a 1-byte, 2-cycle illegal no-op (spec §4.4).
fn build_table() -> [Option<OpcodeDescriptor>; 256] {
    let mut t: [Option<OpcodeDescriptor>; 256] = [None; 256];

    op!(t, 0x00, BRK, Implied, 7);
    op!(t, 0x01, ORA, IndirectX, 6);
    op!(t, 0x04, TSB, ZeroPage, 5);
    op!(t, 0x05, ORA, ZeroPage, 3);
    op!(t, 0x06, ASL, ZeroPage, 5);
    op!(t, 0x08, PHP, Implied, 3);
    op!(t, 0x09, ORA, Immediate, 2);
    op!(t, 0x0A, ASL, Accumulator, 2);
    op!(t, 0x0C, TSB, Absolute, 6);
    op!(t, 0x0D, ORA, Absolute, 4);
    op!(t, 0x0E, ASL, Absolute, 6);

    op!(t, 0x10, BPL, Relative, 2);
    op!(t, 0x11, ORA, IndirectY, 5);
    op!(t, 0x12, ORA, ZeroPageIndirect, 5);
    op!(t, 0x14, TRB, ZeroPage, 5);
    op!(t, 0x15, ORA, ZeroPageX, 4);
    op!(t, 0x16, ASL, ZeroPageX, 6);
    op!(t, 0x18, CLC, Implied, 2);
    op!(t, 0x19, ORA, AbsoluteY, 4);
    op!(t, 0x1A, INC, Accumulator, 2);
    op!(t, 0x1C, TRB, Absolute, 6);
    op!(t, 0x1D, ORA, AbsoluteX, 4);
    op!(t, 0x1E, ASL, AbsoluteX, 7);

    op!(t, 0x20, JSR, Absolute, 6);
    op!(t, 0x21, AND, IndirectX, 6);
    op!(t, 0x24, BIT, ZeroPage, 3);
    op!(t, 0x25, AND, ZeroPage, 3);
    op!(t, 0x26, ROL, ZeroPage, 5);
    op!(t, 0x28, PLP, Implied, 4);
    op!(t, 0x29, AND, Immediate, 2);
    op!(t, 0x2A, ROL, Accumulator, 2);
    op!(t, 0x2C, BIT, Absolute, 4);
    op!(t, 0x2D, AND, Absolute, 4);
    op!(t, 0x2E, ROL, Absolute, 6);

    op!(t, 0x30, BMI, Relative, 2);
    op!(t, 0x31, AND, IndirectY, 5);
    op!(t, 0x32, AND, ZeroPageIndirect, 5);
    op!(t, 0x34, BIT, ZeroPageX, 4);
    op!(t, 0x35, AND, ZeroPageX, 4);
    op!(t, 0x36, ROL, ZeroPageX, 6);
    op!(t, 0x38, SEC, Implied, 2);
    op!(t, 0x39, AND, AbsoluteY, 4);
    op!(t, 0x3A, DEC, Accumulator, 2);
    op!(t, 0x3C, BIT, AbsoluteX, 4);
    op!(t, 0x3D, AND, AbsoluteX, 4);
    op!(t, 0x3E, ROL, AbsoluteX, 7);

    op!(t, 0x40, RTI, Implied, 6);
    op!(t, 0x41, EOR, IndirectX, 6);
    op!(t, 0x45, EOR, ZeroPage, 3);
    op!(t, 0x46, LSR, ZeroPage, 5);
    op!(t, 0x48, PHA, Implied, 3);
    op!(t, 0x49, EOR, Immediate, 2);
    op!(t, 0x4A, LSR, Accumulator, 2);
    op!(t, 0x4C, JMP, Absolute, 3);
    op!(t, 0x4D, EOR, Absolute, 4);
    op!(t, 0x4E, LSR, Absolute, 6);

    op!(t, 0x50, BVC, Relative, 2);
    op!(t, 0x51, EOR, IndirectY, 5);
    op!(t, 0x52, EOR, ZeroPageIndirect, 5);
    op!(t, 0x55, EOR, ZeroPageX, 4);
    op!(t, 0x56, LSR, ZeroPageX, 6);
    op!(t, 0x58, CLI, Implied, 2);
    op!(t, 0x59, EOR, AbsoluteY, 4);
    op!(t, 0x5A, PHY, Implied, 3);
    op!(t, 0x5D, EOR, AbsoluteX, 4);
    op!(t, 0x5E, LSR, AbsoluteX, 7);

    op!(t, 0x60, RTS, Implied, 6);
    op!(t, 0x61, ADC, IndirectX, 6);
    op!(t, 0x64, STZ, ZeroPage, 3);
    op!(t, 0x65, ADC, ZeroPage, 3);
    op!(t, 0x66, ROR, ZeroPage, 5);
    op!(t, 0x68, PLA, Implied, 4);
    op!(t, 0x69, ADC, Immediate, 2);
    op!(t, 0x6A, ROR, Accumulator, 2);
    op!(t, 0x6C, JMP, Indirect, 5);
    op!(t, 0x6D, ADC, Absolute, 4);
    op!(t, 0x6E, ROR, Absolute, 6);

    op!(t, 0x70, BVS, Relative, 2);
    op!(t, 0x71, ADC, IndirectY, 5);
    op!(t, 0x72, ADC, ZeroPageIndirect, 5);
    op!(t, 0x74, STZ, ZeroPageX, 4);
    op!(t, 0x75, ADC, ZeroPageX, 4);
    op!(t, 0x76, ROR, ZeroPageX, 6);
    op!(t, 0x78, SEI, Implied, 2);
    op!(t, 0x79, ADC, AbsoluteY, 4);
    op!(t, 0x7A, PLY, Implied, 4);
    op!(t, 0x7C, JMP, AbsoluteIndirectX, 6);
    op!(t, 0x7D, ADC, AbsoluteX, 4);
    op!(t, 0x7E, ROR, AbsoluteX, 7);

    op!(t, 0x80, BRA, Relative, 3);
    op!(t, 0x81, STA, IndirectX, 6);
    op!(t, 0x84, STY, ZeroPage, 3);
    op!(t, 0x85, STA, ZeroPage, 3);
    op!(t, 0x86, STX, ZeroPage, 3);
    op!(t, 0x88, DEY, Implied, 2);
    op!(t, 0x89, BIT, Immediate, 2);
    op!(t, 0x8A, TXA, Implied, 2);
    op!(t, 0x8C, STY, Absolute, 4);
    op!(t, 0x8D, STA, Absolute, 4);
    op!(t, 0x8E, STX, Absolute, 4);

    op!(t, 0x90, BCC, Relative, 2);
    op!(t, 0x91, STA, IndirectY, 6);
    op!(t, 0x92, STA, ZeroPageIndirect, 5);
    op!(t, 0x94, STY, ZeroPageX, 4);
    op!(t, 0x95, STA, ZeroPageX, 4);
    op!(t, 0x96, STX, ZeroPageY, 4);
    op!(t, 0x98, TYA, Implied, 2);
    op!(t, 0x99, STA, AbsoluteY, 5);
    op!(t, 0x9A, TXS, Implied, 2);
    op!(t, 0x9C, STZ, Absolute, 4);
    op!(t, 0x9D, STA, AbsoluteX, 5);
    op!(t, 0x9E, STZ, AbsoluteX, 5);

    op!(t, 0xA0, LDY, Immediate, 2);
    op!(t, 0xA1, LDA, IndirectX, 6);
    op!(t, 0xA2, LDX, Immediate, 2);
    op!(t, 0xA4, LDY, ZeroPage, 3);
    op!(t, 0xA5, LDA, ZeroPage, 3);
    op!(t, 0xA6, LDX, ZeroPage, 3);
    op!(t, 0xA8, TAY, Implied, 2);
    op!(t, 0xA9, LDA, Immediate, 2);
    op!(t, 0xAA, TAX, Implied, 2);
    op!(t, 0xAC, LDY, Absolute, 4);
    op!(t, 0xAD, LDA, Absolute, 4);
    op!(t, 0xAE, LDX, Absolute, 4);

    op!(t, 0xB0, BCS, Relative, 2);
    op!(t, 0xB1, LDA, IndirectY, 5);
    op!(t, 0xB2, LDA, ZeroPageIndirect, 5);
    op!(t, 0xB4, LDY, ZeroPageX, 4);
    op!(t, 0xB5, LDA, ZeroPageX, 4);
    op!(t, 0xB6, LDX, ZeroPageY, 4);
    op!(t, 0xB8, CLV, Implied, 2);
    op!(t, 0xB9, LDA, AbsoluteY, 4);
    op!(t, 0xBA, TSX, Implied, 2);
    op!(t, 0xBC, LDY, AbsoluteX, 4);
    op!(t, 0xBD, LDA, AbsoluteX, 4);
    op!(t, 0xBE, LDX, AbsoluteY, 4);

    op!(t, 0xC0, CPY, Immediate, 2);
    op!(t, 0xC1, CMP, IndirectX, 6);
    op!(t, 0xC4, CPY, ZeroPage, 3);
    op!(t, 0xC5, CMP, ZeroPage, 3);
    op!(t, 0xC6, DEC, ZeroPage, 5);
    op!(t, 0xC8, INY, Implied, 2);
    op!(t, 0xC9, CMP, Immediate, 2);
    op!(t, 0xCA, DEX, Implied, 2);
    op!(t, 0xCC, CPY, Absolute, 4);
    op!(t, 0xCD, CMP, Absolute, 4);
    op!(t, 0xCE, DEC, Absolute, 6);

    op!(t, 0xD0, BNE, Relative, 2);
    op!(t, 0xD1, CMP, IndirectY, 5);
    op!(t, 0xD2, CMP, ZeroPageIndirect, 5);
    op!(t, 0xD5, CMP, ZeroPageX, 4);
    op!(t, 0xD6, DEC, ZeroPageX, 6);
    op!(t, 0xD8, CLD, Implied, 2);
    op!(t, 0xD9, CMP, AbsoluteY, 4);
    op!(t, 0xDA, PHX, Implied, 3);
    op!(t, 0xDD, CMP, AbsoluteX, 4);
    op!(t, 0xDE, DEC, AbsoluteX, 7);

    op!(t, 0xE0, CPX, Immediate, 2);
    op!(t, 0xE1, SBC, IndirectX, 6);
    op!(t, 0xE4, CPX, ZeroPage, 3);
    op!(t, 0xE5, SBC, ZeroPage, 3);
    op!(t, 0xE6, INC, ZeroPage, 5);
    op!(t, 0xE8, INX, Implied, 2);
    op!(t, 0xE9, SBC, Immediate, 2);
    op!(t, 0xEA, NOP, Implied, 2);
    op!(t, 0xEC, CPX, Absolute, 4);
    op!(t, 0xED, SBC, Absolute, 4);
    op!(t, 0xEE, INC, Absolute, 6);

    op!(t, 0xF0, BEQ, Relative, 2);
    op!(t, 0xF1, SBC, IndirectY, 5);
    op!(t, 0xF2, SBC, ZeroPageIndirect, 5);
    op!(t, 0xF5, SBC, ZeroPageX, 4);
    op!(t, 0xF6, INC, ZeroPageX, 6);
    op!(t, 0xF8, SED, Implied, 2);
    op!(t, 0xF9, SBC, AbsoluteY, 4);
    op!(t, 0xFA, PLX, Implied, 4);
    op!(t, 0xFD, SBC, AbsoluteX, 4);
    op!(t, 0xFE, INC, AbsoluteX, 7);

    t
}

static TABLE: std::sync::OnceLock<[Option<OpcodeDescriptor>; 256]> = std::sync::OnceLock::new();

fn table() -> &'static [Option<OpcodeDescriptor>; 256] {
    TABLE.get_or_init(build_table)
}

/// Decode an opcode byte. Unassigned bytes return `None` — callers treat
/// that as the illegal 1-byte/2-cycle no-op described in spec §4.4.
pub fn decode(opcode: u8) -> Option<OpcodeDescriptor> {
    table()[opcode as usize]
}

/// Look up the opcode byte (and implicitly the size) for a
/// (mnemonic, addressing mode) pair, the assembler's encoding direction.
pub fn encode(mnemonic: Mnemonic, mode: AddressingMode) -> Option<OpcodeDescriptor> {
    table().iter().flatten().find(|d| d.mnemonic == mnemonic && d.mode == mode).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_nmos_and_65c02_addition_round_trips() {
        for opcode in 0u16..=255 {
            if let Some(desc) = decode(opcode as u8) {
                let found = encode(desc.mnemonic, desc.mode).expect("encode must find what decode found");
                assert_eq!(found.opcode, desc.opcode);
            }
        }
    }

    #[test]
    fn sixtyfive_c02_additions_present() {
        assert_eq!(decode(0x9C).unwrap().mnemonic, Mnemonic::STZ);
        assert_eq!(decode(0x80).unwrap().mnemonic, Mnemonic::BRA);
        assert_eq!(decode(0xDA).unwrap().mnemonic, Mnemonic::PHX);
        assert_eq!(decode(0x5A).unwrap().mnemonic, Mnemonic::PHY);
        assert_eq!(decode(0xFA).unwrap().mnemonic, Mnemonic::PLX);
        assert_eq!(decode(0x7A).unwrap().mnemonic, Mnemonic::PLY);
        assert_eq!(decode(0x14).unwrap().mnemonic, Mnemonic::TRB);
        assert_eq!(decode(0x04).unwrap().mnemonic, Mnemonic::TSB);
        assert_eq!(decode(0x89).unwrap().mode, AddressingMode::Immediate);
        assert_eq!(decode(0x34).unwrap().mode, AddressingMode::ZeroPageX);
        assert_eq!(decode(0x3C).unwrap().mode, AddressingMode::AbsoluteX);
        assert_eq!(decode(0x1A).unwrap().mnemonic, Mnemonic::INC);
        assert_eq!(decode(0x1A).unwrap().mode, AddressingMode::Accumulator);
        assert_eq!(decode(0x3A).unwrap().mnemonic, Mnemonic::DEC);
        assert_eq!(decode(0x7C).unwrap().mode, AddressingMode::AbsoluteIndirectX);
        for op in [0xB2u8, 0xD2, 0xF2, 0x92, 0x72, 0x52, 0x32, 0x12] {
            assert_eq!(decode(op).unwrap().mode, AddressingMode::ZeroPageIndirect);
        }
    }

    #[test]
    fn illegal_opcode_is_none() {
        // 0x02 is unassigned in this table (no 65C02 NOP fillers modeled).
        assert!(decode(0x02).is_none());
    }
}

//! Two-phase fixed-point assembler (C5): directives, labels, constants,
//! instructions, and the Pass 1a / Pass 1b / Pass 2 (emit) protocol from
//! spec §4.3.
//!
//! Grounded on `goblin::pe::writer::PEWriter`: that writer also runs a
//! multi-stage "lay things out, then go back and fill in what could only be
//! known once layout settled, then emit" pipeline (`insert_section` →
//! `layout_sections` → final write). Here the three stages are the two
//! label-collection passes and the emit pass, and what "could only be known
//! once layout settled" is whether a forward-referenced operand fits in a
//! zero page byte.

use std::collections::BTreeMap;

use crate::asm::expr::{ExprEvaluator, ResolveMode};
use crate::asm::lexer::Lexer;
use crate::asm::source_map::SourceMap;
use crate::asm::symtab::SymbolTable;
use crate::asm::token::{Token, TokenKind};
use crate::error::{Error, LocatedMessage, Result};
use crate::opcodes::{self, AddressingMode, Mnemonic};

/// Sparse, address-ordered byte map (spec §3 "Address→byte map"). A
/// `BTreeMap` keeps addresses ordered without requiring a full 64 KiB
/// buffer for small programs scattered across a few `.org` regions.
#[derive(Debug, Clone, Default)]
pub struct ByteMap {
    bytes: BTreeMap<u16, u8>,
}

impl ByteMap {
    pub fn new() -> ByteMap {
        ByteMap::default()
    }

    pub fn set(&mut self, addr: u16, value: u8) {
        self.bytes.insert(addr, value);
    }

    pub fn get(&self, addr: u16) -> Option<u8> {
        self.bytes.get(&addr).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn min_addr(&self) -> Option<u16> {
        self.bytes.keys().next().copied()
    }

    pub fn max_addr(&self) -> Option<u16> {
        self.bytes.keys().next_back().copied()
    }

    /// `bytes[0..max-min+1]` with `bytes[a-min] = map[a]` where defined,
    /// else zero (spec §3/§6).
    pub fn to_bytes(&self) -> Vec<u8> {
        match (self.min_addr(), self.max_addr()) {
            (Some(min), Some(max)) => {
                let mut out = vec![0u8; (max - min) as usize + 1];
                for (&addr, &value) in &self.bytes {
                    out[(addr - min) as usize] = value;
                }
                out
            }
            _ => Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        self.bytes.iter().map(|(&a, &b)| (a, b))
    }
}

/// The assembler's output object (spec §3 "Assembly result", §6).
#[derive(Debug, Clone, Default)]
pub struct AssemblyResult {
    pub origin: Option<u16>,
    pub output_path: Option<String>,
    pub bytes: ByteMap,
}

impl AssemblyResult {
    /// Derived byte slice spanning the populated address range.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.to_bytes()
    }
}

/// Assemble already-expanded source text into an `AssemblyResult`.
/// `file`/`source_map` are used only for error location mapping; pass
/// `source_map: None` for a single top-level file with no `.include`s.
pub fn assemble(source: &str, file: Option<String>, source_map: Option<&SourceMap>) -> Result<AssemblyResult> {
    let tokens = Lexer::new(source, file.clone(), source_map).tokenize()?;
    let lines = split_lines(&tokens);

    log::debug!("assembling {} source lines", lines.len());

    let pass1a = run_pass(&lines, SymbolTable::new(), ResolveMode::Collect, false, &file, source_map)?;
    log::debug!("pass 1a: {} labels", pass1a.symtab.len());

    let pass1b = run_pass(&lines, pass1a.symtab, ResolveMode::Collect, false, &file, source_map)?;
    log::debug!("pass 1b: {} labels", pass1b.symtab.len());

    let emit = run_pass(&lines, pass1b.symtab, ResolveMode::Emit, true, &file, source_map)?;
    log::debug!("emit: {} bytes across {} spans", emit.bytes.to_bytes().len(), count_spans(&emit.bytes));

    Ok(AssemblyResult { origin: emit.origin, output_path: emit.output_path, bytes: emit.bytes })
}

fn count_spans(bytes: &ByteMap) -> usize {
    let mut spans = 0usize;
    let mut prev: Option<u16> = None;
    for (addr, _) in bytes.iter() {
        match prev {
            Some(p) if addr == p.wrapping_add(1) => {}
            _ => spans += 1,
        }
        prev = Some(addr);
    }
    spans
}

/// Split a token stream into per-line slices, dropping `Eol`/`Eof` markers
/// and empty lines.
fn split_lines(tokens: &[Token]) -> Vec<&[Token]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if matches!(tok.kind, TokenKind::Eol | TokenKind::Eof) {
            if i > start {
                lines.push(&tokens[start..i]);
            }
            start = i + 1;
        }
    }
    lines
}

struct PassResult {
    symtab: SymbolTable,
    origin: Option<u16>,
    output_path: Option<String>,
    bytes: ByteMap,
}

fn run_pass(
    lines: &[&[Token]],
    mut symtab: SymbolTable,
    mode: ResolveMode,
    emit: bool,
    file: &Option<String>,
    source_map: Option<&SourceMap>,
) -> Result<PassResult> {
    let mut pc: Option<u16> = None;
    let mut origin: Option<u16> = None;
    let mut output_path: Option<String> = None;
    let mut bytes = ByteMap::new();

    for line in lines {
        process_line(line, &mut symtab, mode, emit, &mut pc, &mut origin, &mut output_path, &mut bytes, file, source_map)?;
    }

    Ok(PassResult { symtab, origin, output_path, bytes })
}

#[allow(clippy::too_many_arguments)]
fn process_line(
    tokens: &[Token],
    symtab: &mut SymbolTable,
    mode: ResolveMode,
    emit: bool,
    pc: &mut Option<u16>,
    origin: &mut Option<u16>,
    output_path: &mut Option<String>,
    bytes: &mut ByteMap,
    file: &Option<String>,
    source_map: Option<&SourceMap>,
) -> Result<()> {
    let located = |line: u32, col: u32, message: String| -> LocatedMessage {
        match source_map.and_then(|m| m.lookup(line)) {
            Some((f, l)) => LocatedMessage::at(Some(f.to_string()), l, col, message),
            None => LocatedMessage::at(file.clone(), line, col, message),
        }
    };

    let mut pos = 0usize;

    // Consume leading label definitions: `name:` or `.name:`.
    loop {
        if pos + 1 < tokens.len() && tokens[pos].kind == TokenKind::Identifier && tokens[pos + 1].kind == TokenKind::Colon
        {
            bind_label(&tokens[pos], symtab, pc, &located)?;
            pos += 2;
            continue;
        }
        if pos + 2 < tokens.len()
            && tokens[pos].kind == TokenKind::Dot
            && tokens[pos + 1].kind == TokenKind::Identifier
            && tokens[pos + 2].kind == TokenKind::Colon
        {
            bind_label(&tokens[pos + 1], symtab, pc, &located)?;
            pos += 3;
            continue;
        }
        break;
    }

    if pos >= tokens.len() {
        return Ok(());
    }

    let rest = &tokens[pos..];

    // `NAME = expr` constant assignment.
    if rest.len() >= 2 && rest[0].kind == TokenKind::Identifier && rest[1].kind == TokenKind::Equals {
        let ev = ExprEvaluator::new(symtab, mode, file.clone(), source_map);
        let mut epos = 2;
        let value = ev.eval(rest, &mut epos)?;
        require_no_trailing(rest, epos, &located)?;
        symtab.define(&rest[0].lexeme, (value as i64 & 0xFFFF) as u16);
        return Ok(());
    }

    // `.directive operand...`
    if rest[0].kind == TokenKind::Dot {
        let name_tok = rest.get(1).ok_or_else(|| {
            Error::Parse(located(rest[0].line, rest[0].col, "expected directive name after '.'".into()))
        })?;
        if name_tok.kind != TokenKind::Identifier {
            return Err(Error::Parse(located(name_tok.line, name_tok.col, "expected directive name after '.'".into())));
        }
        return process_directive(name_tok, &rest[2..], symtab, mode, emit, pc, origin, output_path, bytes, file, source_map, &located);
    }

    // Otherwise: an instruction.
    process_instruction(rest, symtab, mode, emit, pc, bytes, file, source_map, &located)
}

fn require_no_trailing(tokens: &[Token], pos: usize, located: &impl Fn(u32, u32, String) -> LocatedMessage) -> Result<()> {
    if pos < tokens.len() {
        let t = &tokens[pos];
        return Err(Error::Parse(located(t.line, t.col, format!("unexpected trailing token '{}'", t.lexeme))));
    }
    Ok(())
}

fn bind_label(
    name_tok: &Token,
    symtab: &mut SymbolTable,
    pc: &Option<u16>,
    located: &impl Fn(u32, u32, String) -> LocatedMessage,
) -> Result<()> {
    let pc = pc.ok_or_else(|| {
        Error::Semantic(located(name_tok.line, name_tok.col, "label defined before any .org".into()))
    })?;
    symtab.define(&name_tok.lexeme, pc);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn process_directive(
    name_tok: &Token,
    operand: &[Token],
    symtab: &mut SymbolTable,
    mode: ResolveMode,
    emit: bool,
    pc: &mut Option<u16>,
    origin: &mut Option<u16>,
    output_path: &mut Option<String>,
    bytes: &mut ByteMap,
    file: &Option<String>,
    source_map: Option<&SourceMap>,
    located: &impl Fn(u32, u32, String) -> LocatedMessage,
) -> Result<()> {
    let name = name_tok.lexeme.to_ascii_uppercase();
    let ev = ExprEvaluator::new(symtab, mode, file.clone(), source_map);

    match name.as_str() {
        "ORG" => {
            let mut epos = 0;
            let value = ev.eval(operand, &mut epos)?;
            require_no_trailing(operand, epos, located)?;
            let addr = (value & 0xFFFF) as u16;
            if origin.is_none() {
                *origin = Some(addr);
            }
            *pc = Some(addr);
            Ok(())
        }
        "BYTE" => {
            let mut cur = require_pc(pc, name_tok, located)?;
            let mut epos = 0;
            loop {
                let value = ev.eval(operand, &mut epos)?;
                if emit {
                    bytes.set(cur, (value & 0xFF) as u8);
                }
                cur = cur.wrapping_add(1);
                match operand.get(epos).map(|t| t.kind) {
                    Some(TokenKind::Comma) => epos += 1,
                    _ => break,
                }
            }
            require_no_trailing(operand, epos, located)?;
            *pc = Some(cur);
            Ok(())
        }
        "WORD" => {
            let mut cur = require_pc(pc, name_tok, located)?;
            let mut epos = 0;
            loop {
                let value = ev.eval(operand, &mut epos)?;
                if emit {
                    let v = (value & 0xFFFF) as u16;
                    bytes.set(cur, (v & 0xFF) as u8);
                    bytes.set(cur.wrapping_add(1), (v >> 8) as u8);
                }
                cur = cur.wrapping_add(2);
                match operand.get(epos).map(|t| t.kind) {
                    Some(TokenKind::Comma) => epos += 1,
                    _ => break,
                }
            }
            require_no_trailing(operand, epos, located)?;
            *pc = Some(cur);
            Ok(())
        }
        "TEXT" => {
            let mut cur = require_pc(pc, name_tok, located)?;
            let str_tok = operand.get(0).ok_or_else(|| {
                Error::Parse(located(name_tok.line, name_tok.col, "expected string literal after .text".into()))
            })?;
            if str_tok.kind != TokenKind::String {
                return Err(Error::Parse(located(str_tok.line, str_tok.col, "expected string literal after .text".into())));
            }
            require_no_trailing(operand, 1, located)?;
            if emit {
                for b in str_tok.lexeme.as_bytes() {
                    bytes.set(cur, *b);
                    cur = cur.wrapping_add(1);
                }
            } else {
                cur = cur.wrapping_add(str_tok.lexeme.as_bytes().len() as u16);
            }
            *pc = Some(cur);
            Ok(())
        }
        "OUTPUT" => {
            let str_tok = operand.get(0).ok_or_else(|| {
                Error::Parse(located(name_tok.line, name_tok.col, "expected string literal after .output".into()))
            })?;
            if str_tok.kind != TokenKind::String {
                return Err(Error::Parse(located(str_tok.line, str_tok.col, "expected string literal after .output".into())));
            }
            require_no_trailing(operand, 1, located)?;
            *output_path = Some(str_tok.lexeme.clone());
            Ok(())
        }
        "INCLUDE" => Err(Error::Semantic(located(
            name_tok.line,
            name_tok.col,
            "`.include` must be resolved before assembly".into(),
        ))),
        other => Err(Error::Semantic(located(name_tok.line, name_tok.col, format!("unknown directive '.{}'", other)))),
    }
}

fn require_pc(pc: &Option<u16>, at: &Token, located: &impl Fn(u32, u32, String) -> LocatedMessage) -> Result<u16> {
    pc.ok_or_else(|| Error::Semantic(located(at.line, at.col, "missing .org before code".into())))
}

/// The resolved shape of an operand, ahead of opcode-table lookup.
struct Operand {
    mode: AddressingMode,
    value: i64,
}

#[allow(clippy::too_many_arguments)]
fn process_instruction(
    tokens: &[Token],
    symtab: &SymbolTable,
    mode: ResolveMode,
    emit: bool,
    pc: &mut Option<u16>,
    bytes: &mut ByteMap,
    file: &Option<String>,
    source_map: Option<&SourceMap>,
    located: &impl Fn(u32, u32, String) -> LocatedMessage,
) -> Result<()> {
    let mnemonic_tok = &tokens[0];
    let mnemonic = Mnemonic::from_str(&mnemonic_tok.lexeme).ok_or_else(|| {
        Error::Parse(located(mnemonic_tok.line, mnemonic_tok.col, format!("unknown mnemonic '{}'", mnemonic_tok.lexeme)))
    })?;
    let operand_tokens = &tokens[1..];
    let ev = ExprEvaluator::new(symtab, mode, file.clone(), source_map);

    let operand = parse_operand(mnemonic, operand_tokens, &ev, located)?;
    let cur_pc = require_pc(pc, mnemonic_tok, located)?;

    if operand.mode == AddressingMode::Relative {
        let size = operand.mode.size();
        let next_pc = cur_pc.wrapping_add(size);
        if emit {
            let descriptor = opcodes::encode(mnemonic, AddressingMode::Relative).ok_or_else(|| {
                Error::Semantic(located(mnemonic_tok.line, mnemonic_tok.col, format!("unsupported instruction '{}'", mnemonic)))
            })?;
            let delta = operand.value - next_pc as i64;
            if !(-128..=127).contains(&delta) {
                return Err(Error::Semantic(located(
                    mnemonic_tok.line,
                    mnemonic_tok.col,
                    format!("branch target out of range (delta {})", delta),
                )));
            }
            bytes.set(cur_pc, descriptor.opcode);
            bytes.set(cur_pc.wrapping_add(1), (delta & 0xFF) as u8);
        }
        *pc = Some(next_pc);
        return Ok(());
    }

    let size = operand.mode.size();
    let next_pc = cur_pc.wrapping_add(size);

    if emit {
        let descriptor = opcodes::encode(mnemonic, operand.mode).ok_or_else(|| {
            Error::Semantic(located(
                mnemonic_tok.line,
                mnemonic_tok.col,
                format!("unsupported addressing mode for '{}'", mnemonic),
            ))
        })?;
        bytes.set(cur_pc, descriptor.opcode);
        match operand.mode {
            AddressingMode::Implied | AddressingMode::Accumulator => {}
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectX
            | AddressingMode::IndirectY
            | AddressingMode::ZeroPageIndirect => {
                bytes.set(cur_pc.wrapping_add(1), (operand.value & 0xFF) as u8);
            }
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect
            | AddressingMode::AbsoluteIndirectX => {
                let v = (operand.value & 0xFFFF) as u16;
                bytes.set(cur_pc.wrapping_add(1), (v & 0xFF) as u8);
                bytes.set(cur_pc.wrapping_add(2), (v >> 8) as u8);
            }
            AddressingMode::Relative => unreachable!("handled above"),
        }
    }

    *pc = Some(next_pc);
    Ok(())
}

fn is_zero_page(value: i64) -> bool {
    (0..=0xFF).contains(&value)
}

fn find_matching_rparen(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        match t.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_index_reg(tok: &Token, reg: &str) -> bool {
    tok.kind == TokenKind::Identifier && tok.lexeme.eq_ignore_ascii_case(reg)
}

fn parse_operand(
    mnemonic: Mnemonic,
    tokens: &[Token],
    ev: &ExprEvaluator,
    located: &impl Fn(u32, u32, String) -> LocatedMessage,
) -> Result<Operand> {
    // No operand, or bare "A": Implied / Accumulator (spec §4.3 table row 1).
    if tokens.is_empty() || (tokens.len() == 1 && is_index_reg(&tokens[0], "A")) {
        if opcodes::encode(mnemonic, AddressingMode::Implied).is_some() || tokens.is_empty() {
            return Ok(Operand { mode: AddressingMode::Implied, value: 0 });
        }
        return Ok(Operand { mode: AddressingMode::Accumulator, value: 0 });
    }

    // Branch mnemonics always force Relative, regardless of size.
    if mnemonic.is_branch() {
        let mut pos = 0;
        let value = ev.eval(tokens, &mut pos)?;
        if pos < tokens.len() {
            let t = &tokens[pos];
            return Err(Error::Parse(located(t.line, t.col, "unexpected tokens in branch operand".into())));
        }
        return Ok(Operand { mode: AddressingMode::Relative, value });
    }

    // `#expr`: Immediate.
    if tokens[0].kind == TokenKind::Hash {
        let mut pos = 1;
        let value = ev.eval(tokens, &mut pos)?;
        if pos < tokens.len() {
            let t = &tokens[pos];
            return Err(Error::Parse(located(t.line, t.col, "unexpected tokens after immediate operand".into())));
        }
        return Ok(Operand { mode: AddressingMode::Immediate, value });
    }

    // `(...)`-wrapped forms: IndirectX, IndirectY, Indirect/ZeroPageIndirect.
    if tokens[0].kind == TokenKind::LParen {
        let close = find_matching_rparen(tokens, 0)
            .ok_or_else(|| Error::Parse(located(tokens[0].line, tokens[0].col, "unmatched '('".into())))?;
        let inner = &tokens[1..close];
        let after = &tokens[close + 1..];

        if inner.len() >= 2
            && inner[inner.len() - 2].kind == TokenKind::Comma
            && is_index_reg(&inner[inner.len() - 1], "X")
        {
            if !after.is_empty() {
                let t = &after[0];
                return Err(Error::Parse(located(t.line, t.col, "unexpected tokens after (expr,X)".into())));
            }
            let expr_tokens = &inner[..inner.len() - 2];
            let mut pos = 0;
            let value = ev.eval(expr_tokens, &mut pos)?;
            if pos < expr_tokens.len() {
                let t = &expr_tokens[pos];
                return Err(Error::Parse(located(t.line, t.col, "unexpected tokens inside (expr,X)".into())));
            }
            let mode = if is_zero_page(value) { AddressingMode::IndirectX } else { AddressingMode::AbsoluteIndirectX };
            return Ok(Operand { mode, value });
        }

        let mut pos = 0;
        let value = ev.eval(inner, &mut pos)?;
        if pos < inner.len() {
            let t = &inner[pos];
            return Err(Error::Parse(located(t.line, t.col, "unexpected tokens inside parens".into())));
        }

        if after.len() == 2 && after[0].kind == TokenKind::Comma && is_index_reg(&after[1], "Y") {
            return Ok(Operand { mode: AddressingMode::IndirectY, value });
        }
        if after.is_empty() {
            let mode = if is_zero_page(value) { AddressingMode::ZeroPageIndirect } else { AddressingMode::Indirect };
            return Ok(Operand { mode, value });
        }
        let t = &after[0];
        return Err(Error::Parse(located(t.line, t.col, "unexpected tokens after parenthesized operand".into())));
    }

    // Plain `expr`, `expr,X`, or `expr,Y`.
    let (expr_tokens, index) = if tokens.len() >= 2
        && tokens[tokens.len() - 2].kind == TokenKind::Comma
        && (is_index_reg(&tokens[tokens.len() - 1], "X") || is_index_reg(&tokens[tokens.len() - 1], "Y"))
    {
        let reg = if is_index_reg(&tokens[tokens.len() - 1], "X") { "X" } else { "Y" };
        (&tokens[..tokens.len() - 2], Some(reg))
    } else {
        (tokens, None)
    };

    let mut pos = 0;
    let value = ev.eval(expr_tokens, &mut pos)?;
    if pos < expr_tokens.len() {
        let t = &expr_tokens[pos];
        return Err(Error::Parse(located(t.line, t.col, "unexpected tokens in operand".into())));
    }

    let zp = is_zero_page(value);
    let mode = match index {
        None => if zp { AddressingMode::ZeroPage } else { AddressingMode::Absolute },
        Some("X") => if zp { AddressingMode::ZeroPageX } else { AddressingMode::AbsoluteX },
        Some("Y") => if zp { AddressingMode::ZeroPageY } else { AddressingMode::AbsoluteY },
        _ => unreachable!(),
    };
    Ok(Operand { mode, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm(src: &str) -> AssemblyResult {
        assemble(src, None, None).expect("assembly should succeed")
    }

    #[test]
    fn s1_hello_world() {
        let r = asm(".org $1900\nLDA #'A'\nJSR $FFEE\nRTS\n");
        assert_eq!(r.origin, Some(0x1900));
        assert_eq!(r.to_bytes(), vec![0xA9, 0x41, 0x20, 0xEE, 0xFF, 0x60]);
    }

    #[test]
    fn s2_forward_reference_zero_page_sizing() {
        let r = asm(".org $2000\nLDA FOO\nRTS\nFOO = $70\n");
        assert_eq!(r.to_bytes(), vec![0xA5, 0x70, 0x60]);
    }

    #[test]
    fn s3_branch_encoding() {
        let r = asm(".org $1000\nloop:\nNOP\nBNE loop\n");
        assert_eq!(r.to_bytes(), vec![0xEA, 0xD0, 0xFD]);
    }

    #[test]
    fn word_is_little_endian() {
        let r = asm(".org $1000\n.word $1234\n");
        assert_eq!(r.to_bytes(), vec![0x34, 0x12]);
    }

    #[test]
    fn dotted_label_same_namespace() {
        let r = asm(".org $1000\n.loop:\nNOP\nBNE .loop\n");
        assert_eq!(r.to_bytes(), vec![0xEA, 0xD0, 0xFD]);
    }

    #[test]
    fn label_before_org_is_fatal() {
        assert!(assemble("foo:\n.org $1000\n", None, None).is_err());
    }

    #[test]
    fn missing_org_before_code_is_fatal() {
        assert!(assemble("NOP\n", None, None).is_err());
    }

    #[test]
    fn undefined_symbol_in_emit_is_fatal() {
        assert!(assemble(".org $1000\nLDA MISSING\n", None, None).is_err());
    }

    #[test]
    fn branch_out_of_range_is_fatal() {
        let mut src = String::from(".org $1000\nBNE target\n");
        for _ in 0..200 {
            src.push_str("NOP\n");
        }
        src.push_str("target:\nNOP\n");
        assert!(assemble(&src, None, None).is_err());
    }

    #[test]
    fn indirect_modes() {
        let r = asm(".org $1000\nLDA ($20,X)\nLDA ($20),Y\nLDA ($20)\nJMP ($2000)\n");
        let bytes = r.to_bytes();
        assert_eq!(&bytes[0..2], &[0xA1, 0x20]);
        assert_eq!(&bytes[2..4], &[0xB1, 0x20]);
        assert_eq!(&bytes[4..6], &[0xB2, 0x20]);
        assert_eq!(&bytes[6..9], &[0x6C, 0x00, 0x20]);
    }

    #[test]
    fn stz_bra_phx_are_65c02_additions() {
        let r = asm(".org $1000\nSTZ $10\nBRA $1003\nPHX\nPLY\n");
        let bytes = r.to_bytes();
        assert_eq!(bytes[0], 0x64);
        assert_eq!(bytes[2], 0x80);
    }

    #[test]
    fn byte_list_and_text() {
        let r = asm(".org $1000\n.byte 1,2,3\n.text \"AB\"\n");
        assert_eq!(r.to_bytes(), vec![1, 2, 3, b'A', b'B']);
    }

    #[test]
    fn output_directive_recorded() {
        let r = asm(".org $1000\n.output \"out.bin\"\nNOP\n");
        assert_eq!(r.output_path.as_deref(), Some("out.bin"));
    }
}

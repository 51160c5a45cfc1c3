//! The instruction encoder: splits operands, detects each operand's
//! addressing mode, checks it against the opcode rule table, and emits the
//! first word plus 0..2 additional words.

use crate::codes::asm;
use crate::diagnostics::{Diagnostic, ErrorCode, Reporter, Span};
use crate::directives::LineContext;
use crate::lexer::{is_valid_label_syntax, parse_matrix_operand, parse_register_token, MatrixError, MatrixOperand};
use crate::model::Word;
use crate::opcodes::{mode_allowed, AddrMode, OpcodeRule};

fn report(ctx: &LineContext, reporter: &mut dyn Reporter, code: ErrorCode, span: Span, message: String) {
    reporter.error(Diagnostic::new(code, ctx.file, ctx.line_number, span, ctx.source_line, message));
}

/// An operand's addressing mode plus the data needed to encode it.
enum Operand<'a> {
    Immediate(i32),
    Direct(&'a str),
    Matrix(MatrixOperand),
    Register(u8),
}

impl Operand<'_> {
    fn mode(&self) -> AddrMode {
        match self {
            Operand::Immediate(_) => AddrMode::Immediate,
            Operand::Direct(_) => AddrMode::Direct,
            Operand::Matrix(_) => AddrMode::Matrix,
            Operand::Register(_) => AddrMode::Register,
        }
    }
}

/// Splits the operand tail on a single top-level comma (commas inside
/// matrix brackets don't count). Returns one `(column, trimmed_text)` pair
/// per operand; an empty operand tail yields an empty vector.
fn split_operands<'a>(operand_text: &'a str, col_offset: usize, ctx: &LineContext, reporter: &mut dyn Reporter) -> Option<Vec<(usize, &'a str)>> {
    if operand_text.trim().is_empty() {
        return Some(Vec::new());
    }

    let bytes = operand_text.as_bytes();
    let mut depth: i32 = 0;
    let mut commas = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth -= 1,
            b',' if depth == 0 => commas.push(i),
            _ => {}
        }
    }

    if commas.len() > 1 {
        report(
            ctx,
            reporter,
            asm::TOO_MANY_TOP_LEVEL_COMMAS,
            Span::point(col_offset + commas[1]),
            "more than one comma between operands".to_string(),
        );
        return None;
    }

    let mut bounds = commas;
    bounds.push(bytes.len());

    let mut tokens = Vec::new();
    let mut start = 0;
    for bound in bounds {
        let raw = &operand_text[start..bound];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            report(ctx, reporter, asm::EMPTY_OPERAND, Span::point(col_offset + start), "empty operand".to_string());
            return None;
        }
        let leading_ws = raw.len() - raw.trim_start().len();
        tokens.push((col_offset + start + leading_ws, trimmed));
        start = bound + 1;
    }
    Some(tokens)
}

fn classify<'a>(
    col: usize,
    token: &'a str,
    ctx: &LineContext,
    reporter: &mut dyn Reporter,
) -> Option<Operand<'a>> {
    if let Some(rest) = token.strip_prefix('#') {
        return match rest.parse::<i32>() {
            Ok(v) => Some(Operand::Immediate(v)),
            Err(_) => {
                report(ctx, reporter, asm::INVALID_IMMEDIATE_VALUE, Span::new(col + 1, col + token.len() - 1), format!("invalid immediate value '{rest}'"));
                None
            }
        };
    }
    if let Some(reg) = parse_register_token(token) {
        return Some(Operand::Register(reg));
    }
    if looks_like_out_of_range_register(token) {
        report(ctx, reporter, asm::INVALID_REGISTER, Span::new(col, col + token.len() - 1), format!("'{token}' is not a valid register (r0..r7)"));
        return None;
    }
    if token.contains('[') {
        return match parse_matrix_operand(token) {
            Ok(m) => Some(Operand::Matrix(m)),
            Err(err) => {
                report_matrix_error(ctx, reporter, col, token, err);
                None
            }
        };
    }
    if !is_valid_label_syntax(token) {
        report(ctx, reporter, asm::INVALID_LABEL_SYNTAX, Span::new(col, col + token.len() - 1), format!("'{token}' is not a valid label"));
        return None;
    }
    Some(Operand::Direct(token))
}

/// `token` looks like a register reference (`r`/`R` followed only by
/// digits) but names a number outside `0..=7`, e.g. `r8` or `r15`. Caught
/// ahead of the label check so it isn't silently accepted as a direct
/// operand naming a label called "r8".
fn looks_like_out_of_range_register(token: &str) -> bool {
    let bytes = token.as_bytes();
    matches!(bytes.first(), Some(b'r') | Some(b'R')) && bytes.len() > 1 && bytes[1..].iter().all(|b| b.is_ascii_digit())
}

fn report_matrix_error(ctx: &LineContext, reporter: &mut dyn Reporter, base_col: usize, token: &str, err: MatrixError) {
    let (code, at, len) = match err {
        MatrixError::MissingBrackets { at } => (asm::MATRIX_MISSING_BRACKETS, at, 1),
        MatrixError::EmptyLabel { at } => (asm::MATRIX_EMPTY_LABEL, at, 1),
        MatrixError::LabelTooLong { at, len } => (asm::INVALID_LABEL_SYNTAX, at, len),
        MatrixError::EmptyIndex { at } => (asm::MATRIX_EMPTY_INDEX, at, 1),
        MatrixError::NonRegisterIndex { at, len } => (asm::MATRIX_INVALID_REGISTER, at, len),
        MatrixError::RegisterOutOfRange { at, len } => (asm::MATRIX_INVALID_REGISTER, at, len),
        MatrixError::JunkBetweenBrackets { at, len } => (asm::MATRIX_JUNK, at, len.max(1)),
    };
    let start = base_col + at;
    report(ctx, reporter, code, Span::new(start, start + len - 1), format!("invalid matrix operand '{token}'"));
}

/// Encodes one instruction line into its machine words, starting at
/// address `ic`. Returns `None` if the instruction could not be encoded at
/// all (errors have already been reported); the caller must not advance IC
/// in that case.
pub fn encode_instruction(
    rule: &OpcodeRule,
    operand_text: &str,
    col_offset: usize,
    ic: u16,
    ctx: &LineContext,
    reporter: &mut dyn Reporter,
) -> Option<Vec<Word>> {
    let tokens = split_operands(operand_text, col_offset, ctx, reporter)?;

    if tokens.len() != rule.operand_count as usize {
        report(
            ctx,
            reporter,
            asm::OPERAND_COUNT_MISMATCH,
            Span::point(col_offset),
            format!("'{}' expects {} operand(s), found {}", rule.mnemonic, rule.operand_count, tokens.len()),
        );
        return None;
    }

    let (source_tok, dest_tok) = match tokens.len() {
        0 => (None, None),
        1 => (None, Some(tokens[0])),
        2 => (Some(tokens[0]), Some(tokens[1])),
        _ => unreachable!("operand_count is at most 2"),
    };

    let source = match source_tok {
        Some((col, tok)) => Some(classify(col, tok, ctx, reporter)?),
        None => None,
    };
    let dest = match dest_tok {
        Some((col, tok)) => Some(classify(col, tok, ctx, reporter)?),
        None => None,
    };

    if let Some((col, tok)) = source_tok {
        if let Some(op) = &source {
            if !mode_allowed(rule.src_mask, op.mode()) {
                report(ctx, reporter, asm::ILLEGAL_ADDRESSING_MODE, Span::new(col, col + tok.len() - 1), format!("illegal source addressing mode for '{}'", rule.mnemonic));
                return None;
            }
        }
    }
    if let Some((col, tok)) = dest_tok {
        if let Some(op) = &dest {
            if !mode_allowed(rule.dst_mask, op.mode()) {
                report(ctx, reporter, asm::ILLEGAL_ADDRESSING_MODE, Span::new(col, col + tok.len() - 1), format!("illegal destination addressing mode for '{}'", rule.mnemonic));
                return None;
            }
        }
    }

    let src_bits = source.as_ref().map(|op| op.mode().mode_bits()).unwrap_or(0);
    let dst_bits = dest.as_ref().map(|op| op.mode().mode_bits()).unwrap_or(0);
    let first_payload = (rule.opcode << 4) | (src_bits << 2) | dst_bits;

    let mut words = vec![Word::absolute(ic, first_payload)];
    let mut next_addr = ic + 1;

    if let (Some(Operand::Register(src_reg)), Some(Operand::Register(dst_reg))) = (&source, &dest) {
        words.push(Word::absolute(next_addr, (*src_reg << 4) | *dst_reg));
        return Some(words);
    }

    if let Some(op) = source {
        push_operand_words(op, OperandRole::Source, &mut next_addr, &mut words);
    }
    if let Some(op) = dest {
        push_operand_words(op, OperandRole::Destination, &mut next_addr, &mut words);
    }

    Some(words)
}

#[derive(Clone, Copy)]
enum OperandRole {
    Source,
    Destination,
}

fn push_operand_words(op: Operand, role: OperandRole, next_addr: &mut u16, words: &mut Vec<Word>) {
    match op {
        Operand::Immediate(v) => {
            words.push(Word::absolute(*next_addr, (v & 0xFF) as u8));
            *next_addr += 1;
        }
        Operand::Direct(label) => {
            words.push(Word::unresolved(*next_addr, label));
            *next_addr += 1;
        }
        Operand::Register(reg) => {
            let payload = match role {
                OperandRole::Source => reg << 4,
                OperandRole::Destination => reg,
            };
            words.push(Word::absolute(*next_addr, payload));
            *next_addr += 1;
        }
        Operand::Matrix(m) => {
            words.push(Word::unresolved(*next_addr, m.label));
            *next_addr += 1;
            words.push(Word::absolute(*next_addr, (m.row_register << 4) | m.col_register));
            *next_addr += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingReporter;
    use crate::opcodes::mnemonic_lookup;

    fn ctx() -> LineContext<'static> {
        LineContext { file: "a.am", line_number: 1, source_line: "" }
    }

    #[test]
    fn stop_encodes_a_single_word() {
        let rule = mnemonic_lookup("stop").unwrap();
        let mut r = CollectingReporter::default();
        let words = encode_instruction(rule, "", 1, 100, &ctx(), &mut r).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].payload, 0xF0);
        assert_eq!(words[0].address, 100);
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn register_pair_optimization_emits_one_extra_word() {
        let rule = mnemonic_lookup("mov").unwrap();
        let mut r = CollectingReporter::default();
        let words = encode_instruction(rule, "r1, r2", 1, 100, &ctx(), &mut r).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].payload, 0x12);
        assert_eq!(words[1].address, 101);
    }

    #[test]
    fn matrix_operand_emits_two_words() {
        let rule = mnemonic_lookup("mov").unwrap();
        let mut r = CollectingReporter::default();
        let words = encode_instruction(rule, "M[r1][r2], r3", 1, 100, &ctx(), &mut r).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(words[1].symbol_ref.as_deref(), Some("M"));
        assert_eq!(words[2].payload, 0x12);
        assert_eq!(words[2].address, 102);
    }

    #[test]
    fn mov_rejects_immediate_destination() {
        let rule = mnemonic_lookup("mov").unwrap();
        let mut r = CollectingReporter::default();
        assert!(encode_instruction(rule, "r1, #5", 1, 100, &ctx(), &mut r).is_none());
        assert_eq!(r.errors[0].code.0, "AS004");
    }

    #[test]
    fn out_of_range_register_is_rejected_not_treated_as_a_label() {
        let rule = mnemonic_lookup("clr").unwrap();
        let mut r = CollectingReporter::default();
        assert!(encode_instruction(rule, "r8", 1, 100, &ctx(), &mut r).is_none());
        assert_eq!(r.errors[0].code.0, "AS008");
    }

    #[test]
    fn operand_count_mismatch_is_a_single_error() {
        let rule = mnemonic_lookup("clr").unwrap();
        let mut r = CollectingReporter::default();
        assert!(encode_instruction(rule, "r1, r2", 1, 100, &ctx(), &mut r).is_none());
        assert_eq!(r.error_count(), 1);
        assert_eq!(r.errors[0].code.0, "AS003");
    }

    #[test]
    fn direct_operand_defers_symbol_resolution() {
        let rule = mnemonic_lookup("jmp").unwrap();
        let mut r = CollectingReporter::default();
        let words = encode_instruction(rule, "LOOP", 1, 100, &ctx(), &mut r).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].symbol_ref.as_deref(), Some("LOOP"));
        assert_eq!(words[1].payload, 0);
    }
}

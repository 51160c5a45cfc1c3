//! The first-pass driver: walks the macro-expanded source once, builds the
//! symbol table and the code/data images, and dispatches each line to
//! either a directive parser or the instruction encoder. Label and address
//! bookkeeping happens here; symbol *resolution* (filling in
//! `Word::symbol_ref` targets) is [`crate::second_pass`]'s job.

use std::fs;

use crate::codes::asm;
use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::directives::{self, LineContext};
use crate::encoder;
use crate::lexer::{is_reserved_name, is_valid_label_syntax, MAX_LABEL_LEN};
use crate::model::{
    DataWord, ExternRecord, Symbol, SymbolKind, SymbolTable, Word, ADDRESS_SPACE_MAX, IC_START,
};
use crate::opcodes::mnemonic_lookup;

/// An `.entry` declaration, kept around so the second pass can report
/// "entry of an undefined symbol" against the line that declared it.
#[derive(Debug, Clone)]
pub struct EntryDeclaration {
    pub name: String,
    pub line_number: usize,
}

#[derive(Debug, Default)]
pub struct FirstPassOutput {
    pub symbols: SymbolTable,
    pub code: Vec<Word>,
    pub data: Vec<DataWord>,
    pub entries: Vec<EntryDeclaration>,
    pub externs: Vec<ExternRecord>,
    pub ic_final: u16,
    pub dc_final: u16,
}

fn report(file: &str, line_number: usize, source_line: &str, reporter: &mut dyn Reporter, code: crate::diagnostics::ErrorCode, span: Span, message: String) {
    reporter.error(Diagnostic::new(code, file, line_number, span, source_line, message));
}

/// Strips a `;` comment running to the end of the line, wherever it
/// appears -- except inside a `"..."` string literal, so `.string ";"`
/// keeps its semicolon.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

struct LabelSplit<'a> {
    label: Option<(String, usize)>,
    rest: &'a str,
    rest_col: usize,
}

/// Recognizes an optional `LABEL:` prefix at the start of a line. `rest_col`
/// is the 1-based column the remaining text starts at.
fn split_label<'a>(line: &'a str, file: &str, line_number: usize, reporter: &mut dyn Reporter) -> LabelSplit<'a> {
    let leading_ws = line.len() - line.trim_start().len();
    let body = line.trim_start();

    let first_word_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let first_word = &body[..first_word_end];

    if let Some(name) = first_word.strip_suffix(':') {
        let label_col = leading_ws + 1;
        if name.is_empty() {
            report(file, line_number, line, reporter, asm::INVALID_LABEL_SYNTAX, Span::point(label_col), "empty label before ':'".to_string());
        } else if name.len() > MAX_LABEL_LEN {
            report(
                file,
                line_number,
                line,
                reporter,
                asm::LABEL_TOO_LONG,
                Span::new(label_col, label_col + name.len() - 1),
                format!("label '{name}' is longer than {MAX_LABEL_LEN} characters"),
            );
        } else if !is_valid_label_syntax(name) {
            report(file, line_number, line, reporter, asm::INVALID_LABEL_SYNTAX, Span::new(label_col, label_col + name.len() - 1), format!("'{name}' is not a valid label"));
        } else if is_reserved_name(name) {
            report(
                file,
                line_number,
                line,
                reporter,
                asm::RESERVED_SYMBOL_NAME,
                Span::new(label_col, label_col + name.len() - 1),
                format!("'{name}' collides with a reserved word"),
            );
        }

        let rest = body[first_word_end..].trim_start();
        let rest_col = leading_ws + (body.len() - rest.len()) + 1;
        return LabelSplit { label: Some((name.to_string(), label_col)), rest, rest_col };
    }

    LabelSplit { label: None, rest: body, rest_col: leading_ws + 1 }
}

fn declare_label(
    symbols: &mut SymbolTable,
    name: String,
    col: usize,
    value: u16,
    kind: SymbolKind,
    file: &str,
    line_number: usize,
    source_line: &str,
    reporter: &mut dyn Reporter,
) {
    if !symbols.insert(Symbol { name: name.clone(), value, kind }) {
        report(
            file,
            line_number,
            source_line,
            reporter,
            asm::DUPLICATE_LABEL,
            Span::new(col, col + name.len() - 1),
            format!("'{name}' is already defined"),
        );
    }
}

/// Runs the first pass over `<stem>.am`. Callers should check
/// `reporter.had_errors()` before handing the result to the second pass --
/// a first pass with errors still returns a best-effort image so later
/// stages can keep surfacing unrelated problems, but its image must not be
/// emitted.
pub fn run(stem: &str, reporter: &mut dyn Reporter) -> Option<FirstPassOutput> {
    let path = format!("{stem}.am");
    let source = fs::read_to_string(&path).ok()?;
    let file = path.clone();

    let mut symbols = SymbolTable::new();
    let mut code: Vec<Word> = Vec::new();
    let mut raw_data: Vec<DataWord> = Vec::new();
    let mut entries: Vec<EntryDeclaration> = Vec::new();
    let mut externs: Vec<ExternRecord> = Vec::new();
    let mut ic = IC_START;
    let mut dc: u16 = 0;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;
        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        let split = split_label(line, &file, line_number, reporter);
        let rest = split.rest;
        if rest.is_empty() {
            continue;
        }

        // `.mat` may glue its dimensions straight onto the directive name
        // (`.mat[2][2]`, no intervening space), so its keyword boundary is
        // the bracket rather than the next whitespace.
        let word_end = if rest.len() > 4 && rest[..4].eq_ignore_ascii_case(".mat") && rest.as_bytes().get(4) == Some(&b'[') {
            4
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };
        let keyword = &rest[..word_end];
        let operand_text = &rest[word_end..];
        let operand_col = split.rest_col + word_end;

        let ctx = LineContext { file: &file, line_number, source_line: raw_line };

        if let Some(directive) = keyword.strip_prefix('.') {
            match directive.to_ascii_lowercase().as_str() {
                "data" => {
                    let values = directives::parse_data(operand_text, operand_col, &ctx, reporter);
                    if let Some((name, col)) = &split.label {
                        declare_label(&mut symbols, name.clone(), *col, dc, SymbolKind::Data, &file, line_number, raw_line, reporter);
                    }
                    for v in values {
                        raw_data.push(DataWord { address: dc, payload: (v as u16) & 0x3FF });
                        dc += 1;
                    }
                }
                "string" => {
                    if let Some(bytes) = directives::parse_string(operand_text, operand_col, &ctx, reporter) {
                        if let Some((name, col)) = &split.label {
                            declare_label(&mut symbols, name.clone(), *col, dc, SymbolKind::Data, &file, line_number, raw_line, reporter);
                        }
                        for b in bytes {
                            raw_data.push(DataWord { address: dc, payload: b as u16 });
                            dc += 1;
                        }
                        raw_data.push(DataWord { address: dc, payload: 0 });
                        dc += 1;
                    }
                }
                "mat" => {
                    if let Some((rows, cols, values)) = directives::parse_mat(operand_text, operand_col, &ctx, reporter) {
                        if let Some((name, col)) = &split.label {
                            declare_label(&mut symbols, name.clone(), *col, dc, SymbolKind::Data, &file, line_number, raw_line, reporter);
                        }
                        let capacity = rows as usize * cols as usize;
                        for i in 0..capacity {
                            let v = values.get(i).copied().unwrap_or(0);
                            raw_data.push(DataWord { address: dc, payload: (v as u16) & 0x3FF });
                            dc += 1;
                        }
                    }
                }
                "entry" => {
                    if let Some(name) = directives::parse_entry_extern_label(operand_text, operand_col, &ctx, reporter) {
                        entries.push(EntryDeclaration { name, line_number });
                    }
                }
                "extern" => {
                    if let Some(name) = directives::parse_entry_extern_label(operand_text, operand_col, &ctx, reporter) {
                        match symbols.get(&name) {
                            None => {
                                symbols.insert(Symbol { name: name.clone(), value: 0, kind: SymbolKind::External });
                                externs.push(ExternRecord { name, usages: Vec::new() });
                            }
                            Some(existing) if existing.kind == SymbolKind::External => {
                                // Redeclaring the same extern is harmless; don't duplicate the record.
                            }
                            Some(_) => {
                                report(
                                    &file,
                                    line_number,
                                    raw_line,
                                    reporter,
                                    asm::DUPLICATE_LABEL,
                                    Span::point(operand_col),
                                    format!("'{name}' is already defined"),
                                );
                            }
                        }
                    }
                }
                _ => {
                    report(&file, line_number, raw_line, reporter, asm::UNKNOWN_MNEMONIC_OR_DIRECTIVE, Span::point(split.rest_col), format!("unknown directive '.{directive}'"));
                }
            }
            continue;
        }

        match mnemonic_lookup(keyword) {
            Some(rule) => {
                if let Some((name, col)) = &split.label {
                    declare_label(&mut symbols, name.clone(), *col, ic, SymbolKind::Code, &file, line_number, raw_line, reporter);
                }
                if let Some(words) = encoder::encode_instruction(rule, operand_text, operand_col, ic, &ctx, reporter) {
                    ic += words.len() as u16;
                    code.extend(words);
                }
            }
            None => {
                report(&file, line_number, raw_line, reporter, asm::UNKNOWN_MNEMONIC_OR_DIRECTIVE, Span::point(split.rest_col), format!("unknown mnemonic '{keyword}'"));
            }
        }
    }

    let ic_final = ic;
    let dc_final = dc;

    if (ic_final - IC_START) + dc_final > ADDRESS_SPACE_MAX {
        report(
            &file,
            0,
            "",
            reporter,
            asm::ADDRESS_SPACE_OVERFLOW,
            Span::point(1),
            format!("program uses {} words, exceeding the {} available", (ic_final - IC_START) + dc_final, ADDRESS_SPACE_MAX),
        );
    }

    // Relocate data symbols and the data image past the final code image.
    for symbol in symbols.iter_mut() {
        if symbol.kind == SymbolKind::Data {
            symbol.value += ic_final;
        }
    }
    let data: Vec<DataWord> = raw_data
        .into_iter()
        .map(|d| DataWord { address: d.address + ic_final, payload: d.payload })
        .collect();

    Some(FirstPassOutput { symbols, code, data, entries, externs, ic_final, dc_final })
}

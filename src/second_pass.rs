//! The second pass: resolves every `Word` still carrying a pending
//! `symbol_ref` against the symbol table built by [`crate::first_pass`],
//! records external-symbol usage addresses, and fills in the final address
//! of every `.entry`-declared symbol.

use crate::codes::asm;
use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::first_pass::{EntryDeclaration, FirstPassOutput};
use crate::model::{Are, EntryRecord, ExternRecord, SymbolKind};

pub struct SecondPassOutput {
    pub entries: Vec<EntryRecord>,
}

/// Resolves `output.code` in place and returns the filled-in entry table.
/// `output.externs` is updated in place with each usage address.
pub fn run(file: &str, output: &mut FirstPassOutput, reporter: &mut dyn Reporter) -> SecondPassOutput {
    resolve_code(file, output, reporter);
    let entries = resolve_entries(file, &output.entries, output, reporter);
    SecondPassOutput { entries }
}

fn resolve_code(file: &str, output: &mut FirstPassOutput, reporter: &mut dyn Reporter) {
    for word in output.code.iter_mut() {
        let Some(name) = word.symbol_ref.clone() else { continue };

        match output.symbols.get(&name) {
            Some(symbol) if symbol.kind == SymbolKind::External => {
                word.are = Are::External;
                word.payload = 0;
                if let Some(record) = find_extern_mut(&mut output.externs, &name) {
                    record.usages.push(word.address);
                }
            }
            Some(symbol) => {
                word.are = Are::Relocatable;
                word.payload = (symbol.value & 0xFF) as u8;
            }
            None => {
                reporter.error(Diagnostic::new(
                    asm::UNDEFINED_SYMBOL,
                    file,
                    0,
                    Span::point(1),
                    "",
                    format!("undefined symbol '{name}' referenced at address {}", word.address),
                ));
            }
        }
    }
}

fn find_extern_mut<'a>(externs: &'a mut [ExternRecord], name: &str) -> Option<&'a mut ExternRecord> {
    externs.iter_mut().find(|e| e.name == name)
}

fn resolve_entries(file: &str, decls: &[EntryDeclaration], output: &FirstPassOutput, reporter: &mut dyn Reporter) -> Vec<EntryRecord> {
    let mut entries = Vec::new();
    for decl in decls {
        match output.symbols.get(&decl.name) {
            Some(symbol) if symbol.kind == SymbolKind::External => {
                reporter.error(Diagnostic::new(
                    asm::ENTRY_IS_EXTERNAL,
                    file,
                    decl.line_number,
                    Span::point(1),
                    "",
                    format!("'{}' is declared both .entry and .extern", decl.name),
                ));
            }
            Some(symbol) => entries.push(EntryRecord { name: decl.name.clone(), address: symbol.value }),
            None => {
                reporter.error(Diagnostic::new(
                    asm::ENTRY_UNDEFINED,
                    file,
                    decl.line_number,
                    Span::point(1),
                    "",
                    format!("'.entry {}' refers to an undefined symbol", decl.name),
                ));
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingReporter;
    use crate::model::{Symbol, SymbolTable, Word};

    fn base_output() -> FirstPassOutput {
        FirstPassOutput {
            symbols: SymbolTable::new(),
            code: Vec::new(),
            data: Vec::new(),
            entries: Vec::new(),
            externs: Vec::new(),
            ic_final: 101,
            dc_final: 0,
        }
    }

    #[test]
    fn resolves_a_relocatable_reference() {
        let mut out = base_output();
        out.symbols.insert(Symbol { name: "LOOP".to_string(), value: 100, kind: SymbolKind::Code });
        out.code.push(Word::unresolved(101, "LOOP"));
        let mut r = CollectingReporter::default();
        run("a.am", &mut out, &mut r);
        assert_eq!(r.error_count(), 0);
        assert_eq!(out.code[0].are, Are::Relocatable);
        assert_eq!(out.code[0].payload, 100);
    }

    #[test]
    fn records_usage_address_for_external_reference() {
        let mut out = base_output();
        out.symbols.insert(Symbol { name: "FOO".to_string(), value: 0, kind: SymbolKind::External });
        out.externs.push(ExternRecord { name: "FOO".to_string(), usages: Vec::new() });
        out.code.push(Word::unresolved(102, "FOO"));
        let mut r = CollectingReporter::default();
        run("a.am", &mut out, &mut r);
        assert_eq!(out.code[0].are, Are::External);
        assert_eq!(out.externs[0].usages, vec![102]);
    }

    #[test]
    fn undefined_symbol_is_reported() {
        let mut out = base_output();
        out.code.push(Word::unresolved(101, "GHOST"));
        let mut r = CollectingReporter::default();
        run("a.am", &mut out, &mut r);
        assert_eq!(r.errors[0].code.0, "AS009");
    }

    #[test]
    fn entry_of_external_symbol_is_rejected() {
        let mut out = base_output();
        out.symbols.insert(Symbol { name: "FOO".to_string(), value: 0, kind: SymbolKind::External });
        out.entries.push(EntryDeclaration { name: "FOO".to_string(), line_number: 3 });
        let decls = out.entries.clone();
        let mut r = CollectingReporter::default();
        let result = resolve_entries("a.am", &decls, &out, &mut r);
        assert!(result.is_empty());
        assert_eq!(r.errors[0].code.0, "AS321");
    }
}

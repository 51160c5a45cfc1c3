//! The macro preprocessor: a small state machine that recognizes
//! `mcro <name>` ... `mcroend` blocks, substitutes invocations, and writes
//! the macro-expanded source atomically.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::codes::{asm, mc};
use crate::diagnostics::{Diagnostic, Reporter, Span};

pub const MAX_LINE_LEN: usize = 80;
pub const MAX_SOURCE_LINES: usize = 10_000;

struct Macro {
    body: Vec<String>,
}

enum State {
    Outside,
    InsideMacro { name: String },
}

/// Reads `<stem>.as`, expands every macro invocation, and writes
/// `<stem>.am` atomically via a `<stem>.am.tmp` intermediate. Returns
/// `true` on success. On failure (including I/O failure), `<stem>.am` is
/// left exactly as it was before the call.
pub fn preprocess(stem: &str, reporter: &mut dyn Reporter) -> bool {
    let source_path = format!("{stem}.as");
    let output_path = format!("{stem}.am");
    let tmp_path = format!("{stem}.am.tmp");
    let file_name = Path::new(&source_path).to_string_lossy().into_owned();

    let source = match fs::read_to_string(&source_path) {
        Ok(s) => s,
        Err(err) => {
            reporter.error(Diagnostic::new(
                asm::STAGE_PREPROCESS_FAILED,
                &file_name,
                0,
                Span::point(1),
                "",
                format!("could not read '{source_path}': {err}"),
            ));
            return false;
        }
    };

    let expanded = expand(&source, &file_name, reporter);

    if reporter.had_errors() {
        let _ = fs::remove_file(&tmp_path);
        return false;
    }

    if let Err(err) = fs::write(&tmp_path, expanded) {
        reporter.error(Diagnostic::new(
            asm::STAGE_PREPROCESS_FAILED,
            &file_name,
            0,
            Span::point(1),
            "",
            format!("could not write '{tmp_path}': {err}"),
        ));
        let _ = fs::remove_file(&tmp_path);
        return false;
    }

    let _ = fs::remove_file(&output_path);
    if let Err(err) = fs::rename(&tmp_path, &output_path) {
        reporter.error(Diagnostic::new(
            asm::STAGE_PREPROCESS_FAILED,
            &file_name,
            0,
            Span::point(1),
            "",
            format!("could not finalize '{output_path}': {err}"),
        ));
        return false;
    }

    true
}

fn expand(source: &str, file_name: &str, reporter: &mut dyn Reporter) -> String {
    let mut macros: HashMap<String, Macro> = HashMap::new();
    let mut state = State::Outside;
    let mut output = String::new();
    let mut line_count = 0usize;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;
        line_count += 1;
        if line_count > MAX_SOURCE_LINES {
            reporter.error(Diagnostic::new(
                mc::FILE_TOO_LONG,
                file_name,
                line_number,
                Span::point(1),
                raw_line,
                format!("source exceeds the {MAX_SOURCE_LINES}-line limit"),
            ));
            break;
        }

        let line = if raw_line.chars().count() > MAX_LINE_LEN {
            reporter.error(Diagnostic::new(
                mc::LINE_TOO_LONG,
                file_name,
                line_number,
                Span::new(MAX_LINE_LEN + 1, raw_line.chars().count()),
                raw_line,
                format!("line exceeds {MAX_LINE_LEN} characters"),
            ));
            // Drain the remainder of the overlong line, per the line rules.
            let truncated: String = raw_line.chars().take(MAX_LINE_LEN).collect();
            truncated
        } else {
            raw_line.to_string()
        };

        let trimmed = line.trim().to_string();

        match &state {
            State::Outside => {
                if trimmed == "mcroend" {
                    reporter.error(Diagnostic::new(
                        mc::TRAILING_CONTENT_AFTER_MCROEND,
                        file_name,
                        line_number,
                        Span::point(1),
                        &trimmed,
                        "'mcroend' without a matching 'mcro'".to_string(),
                    ));
                    continue;
                }
                if trimmed == "mcro" || trimmed.starts_with("mcro") && !trimmed[4..].starts_with(|c: char| c.is_whitespace()) && trimmed.len() > 4 {
                    // Either exactly "mcro" (missing name) or "mcroXYZ" glued together.
                    if trimmed == "mcro" {
                        reporter.error(Diagnostic::new(
                            mc::MISSING_MACRO_NAME,
                            file_name,
                            line_number,
                            Span::point(1),
                            &trimmed,
                            "missing macro name after 'mcro'".to_string(),
                        ));
                        continue;
                    }
                    reporter.error(Diagnostic::new(
                        mc::MISSING_SPACE_AFTER_MCRO,
                        file_name,
                        line_number,
                        Span::point(1),
                        &trimmed,
                        "missing space after 'mcro'".to_string(),
                    ));
                    continue;
                }
                if trimmed.starts_with("mcro") && trimmed.len() > 4 {
                    // Reaching here means the guard above already established
                    // that the character right after "mcro" is whitespace;
                    // accept any run of it (space, tab, ...) as the separator.
                    let after_keyword = &trimmed[4..];
                    let leading_ws = after_keyword.len() - after_keyword.trim_start().len();
                    let name = after_keyword.trim();
                    let name_col = 1 + 4 + leading_ws;
                    match validate_macro_name(name, &macros) {
                        Ok(()) => {
                            macros.insert(name.to_string(), Macro { body: Vec::new() });
                            state = State::InsideMacro { name: name.to_string() };
                        }
                        Err((code, message)) => {
                            reporter.error(Diagnostic::new(code, file_name, line_number, Span::point(name_col), &trimmed, message));
                        }
                    }
                    continue;
                }

                let first_token = trimmed.split_whitespace().next().unwrap_or("");
                if let Some(def) = macros.get(first_token) {
                    for body_line in &def.body {
                        output.push_str(body_line);
                        output.push('\n');
                    }
                } else {
                    output.push_str(&trimmed);
                    output.push('\n');
                }
            }
            State::InsideMacro { name } => {
                if trimmed == "mcroend" {
                    state = State::Outside;
                } else if let Some(rest) = trimmed.strip_prefix("mcroend") {
                    if !rest.trim().is_empty() {
                        reporter.error(Diagnostic::new(
                            mc::TRAILING_CONTENT_AFTER_MCROEND,
                            file_name,
                            line_number,
                            Span::point(1),
                            &trimmed,
                            "unexpected content after 'mcroend'".to_string(),
                        ));
                    }
                    state = State::Outside;
                } else {
                    macros.get_mut(name.as_str()).expect("macro was just inserted").body.push(trimmed);
                }
            }
        }
    }

    if matches!(state, State::InsideMacro { .. }) {
        reporter.error(Diagnostic::new(
            mc::UNTERMINATED_MACRO,
            file_name,
            line_count,
            Span::point(1),
            "",
            "unterminated macro: missing 'mcroend'".to_string(),
        ));
    }

    output
}

fn validate_macro_name(name: &str, macros: &HashMap<String, Macro>) -> Result<(), (crate::diagnostics::ErrorCode, String)> {
    if name.is_empty() {
        return Err((mc::MISSING_MACRO_NAME, "missing macro name after 'mcro'".to_string()));
    }
    if name.len() > 31 {
        return Err((mc::NAME_TOO_LONG, format!("macro name '{name}' is longer than 31 characters")));
    }
    let mut chars = name.chars();
    let starts_with_letter = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic());
    let rest_ok = chars.clone().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !starts_with_letter || !rest_ok {
        return Err((mc::INVALID_NAME_SYNTAX, format!("'{name}' is not a valid macro name")));
    }
    if crate::lexer::is_reserved_name(name) {
        return Err((mc::RESERVED_NAME, format!("'{name}' collides with a reserved word")));
    }
    if macros.contains_key(name) {
        return Err((mc::DUPLICATE_NAME, format!("macro '{name}' is already defined")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingReporter;

    #[test]
    fn substitutes_macro_invocations() {
        let source = "mcro DOUBLE\nadd r1, r2\nadd r1, r2\nmcroend\nDOUBLE\nstop\n";
        let mut r = CollectingReporter::default();
        let expanded = expand(source, "t.as", &mut r);
        assert_eq!(r.error_count(), 0);
        assert_eq!(expanded, "add r1, r2\nadd r1, r2\nstop\n");
    }

    #[test]
    fn unterminated_macro_is_reported() {
        let source = "mcro FOO\nadd r1, r2\n";
        let mut r = CollectingReporter::default();
        expand(source, "t.as", &mut r);
        assert_eq!(r.errors[0].code.0, "MC009");
    }

    #[test]
    fn duplicate_macro_name_is_reported() {
        let source = "mcro FOO\nstop\nmcroend\nmcro FOO\nstop\nmcroend\n";
        let mut r = CollectingReporter::default();
        expand(source, "t.as", &mut r);
        assert_eq!(r.errors[0].code.0, "MC006");
    }

    #[test]
    fn reserved_macro_name_is_rejected() {
        let source = "mcro mov\nstop\nmcroend\n";
        let mut r = CollectingReporter::default();
        expand(source, "t.as", &mut r);
        assert_eq!(r.errors[0].code.0, "MC005");
    }

    #[test]
    fn tab_after_mcro_is_accepted_as_the_name_separator() {
        let source = "mcro\tDOUBLE\nadd r1, r2\nmcroend\nDOUBLE\nstop\n";
        let mut r = CollectingReporter::default();
        let expanded = expand(source, "t.as", &mut r);
        assert_eq!(r.error_count(), 0);
        assert_eq!(expanded, "add r1, r2\nstop\n");
    }

    #[test]
    fn overlong_line_is_reported_and_drained() {
        let long_line = "a".repeat(100);
        let mut r = CollectingReporter::default();
        expand(&long_line, "t.as", &mut r);
        assert_eq!(r.errors[0].code.0, "MC001");
    }
}

//! Directive parsers: `.data`, `.string`, `.mat`, `.entry`, `.extern`. Each
//! takes the directive's argument text plus the 1-based column it starts at
//! in the full source line, and reports errors through the shared
//! [`crate::diagnostics::Reporter`] with precise column spans instead of
//! raising.

use crate::codes::asm;
use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::lexer::{is_valid_label_syntax, is_reserved_name, MAX_LABEL_LEN};

/// Everything a directive parser needs to know about the line it's
/// operating on, besides the operand text itself.
pub struct LineContext<'a> {
    pub file: &'a str,
    pub line_number: usize,
    pub source_line: &'a str,
}

fn report(ctx: &LineContext, reporter: &mut dyn Reporter, code: crate::diagnostics::ErrorCode, span: Span, message: String) {
    reporter.error(Diagnostic::new(code, ctx.file, ctx.line_number, span, ctx.source_line, message));
}

/// The diagnostic codes a comma-separated number list reports through --
/// `.data` and `.mat`'s initializer list share the same list grammar but
/// the taxonomy gives each directive its own error family (§6.3), so the
/// codes are threaded through instead of hard-coded.
struct ListCodes {
    /// A comma with nothing before it at all (`,1,2`).
    leading_comma: crate::diagnostics::ErrorCode,
    /// A second comma with nothing between it and the previous one
    /// (`1,,2`).
    missing_value: crate::diagnostics::ErrorCode,
    /// Two numbers with no comma between them (`1 2`).
    unexpected_character: crate::diagnostics::ErrorCode,
    invalid_number: crate::diagnostics::ErrorCode,
    out_of_range: crate::diagnostics::ErrorCode,
    trailing_comma: crate::diagnostics::ErrorCode,
}

const DATA_CODES: ListCodes = ListCodes {
    leading_comma: asm::DATA_LEADING_COMMA,
    missing_value: asm::DATA_MISSING_COMMA,
    unexpected_character: asm::DATA_MISSING_COMMA,
    invalid_number: asm::DATA_INVALID_NUMBER,
    out_of_range: asm::DATA_OUT_OF_RANGE,
    trailing_comma: asm::DATA_TRAILING_COMMA,
};

/// `.mat` doesn't distinguish a leading comma from a mid-list double
/// comma the way `.data` does -- both are "missing value between commas"
/// per the directive's own error list.
const MAT_CODES: ListCodes = ListCodes {
    leading_comma: asm::MAT_MISSING_VALUE,
    missing_value: asm::MAT_MISSING_VALUE,
    unexpected_character: asm::MAT_UNEXPECTED_CHARACTER,
    invalid_number: asm::MAT_INVALID_NUMBER,
    out_of_range: asm::MAT_OUT_OF_RANGE,
    trailing_comma: asm::MAT_TRAILING_COMMA,
};

/// `.data`: comma-separated signed decimals in `[-128, 127]`.
pub fn parse_data(args: &str, col_offset: usize, ctx: &LineContext, reporter: &mut dyn Reporter) -> Vec<i16> {
    parse_number_list(args, col_offset, ctx, reporter, &DATA_CODES)
}

fn parse_number_list(args: &str, col_offset: usize, ctx: &LineContext, reporter: &mut dyn Reporter, codes: &ListCodes) -> Vec<i16> {
    let mut values = Vec::new();

    if let Some(pos) = trailing_comma_pos(args) {
        report(
            ctx,
            reporter,
            codes.trailing_comma,
            Span::point(col_offset + pos),
            "trailing ',' with no following number".to_string(),
        );
    }

    let chars: Vec<char> = args.chars().collect();
    let n = chars.len();
    let mut i = 0;
    let mut expect_number = true;
    let mut saw_number = false;

    while i < n {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        if chars[i] == ',' {
            if expect_number {
                let code = if saw_number { codes.missing_value } else { codes.leading_comma };
                report(ctx, reporter, code, Span::point(col_offset + i), "expected a number".to_string());
            }
            expect_number = true;
            i += 1;
            continue;
        }

        let start = i;
        while i < n && chars[i] != ',' && !chars[i].is_whitespace() {
            i += 1;
        }
        let token: String = chars[start..i].iter().collect();
        let span = Span::new(col_offset + start, col_offset + i - 1);

        if !expect_number {
            report(ctx, reporter, codes.unexpected_character, span, "missing ',' between numbers".to_string());
        }

        match token.parse::<i32>() {
            Ok(v) if (-128..=127).contains(&v) => values.push(v as i16),
            Ok(v) => report(ctx, reporter, codes.out_of_range, span, format!("value {v} out of range [-128,127]")),
            Err(_) => report(ctx, reporter, codes.invalid_number, span, format!("invalid number '{token}'")),
        }

        saw_number = true;
        expect_number = false;
    }

    values
}

fn trailing_comma_pos(args: &str) -> Option<usize> {
    let trimmed = args.trim_end();
    trimmed.ends_with(',').then(|| trimmed.chars().count() - 1)
}

/// `.string`: a double-quoted literal. Returns the byte payload (without the
/// terminating zero word -- the caller appends that).
pub fn parse_string(args: &str, col_offset: usize, ctx: &LineContext, reporter: &mut dyn Reporter) -> Option<Vec<u8>> {
    let trimmed = args.trim();
    if !trimmed.starts_with('"') {
        report(
            ctx,
            reporter,
            asm::STRING_MISSING_OPEN_QUOTE,
            Span::point(col_offset),
            "expected an opening '\"'".to_string(),
        );
        return None;
    }

    match trimmed[1..].find('"') {
        Some(rel_close) => Some(trimmed[1..1 + rel_close].bytes().collect()),
        None => {
            report(
                ctx,
                reporter,
                asm::STRING_UNTERMINATED,
                Span::new(col_offset, col_offset + trimmed.chars().count().saturating_sub(1)),
                "unterminated string literal".to_string(),
            );
            None
        }
    }
}

/// `.mat[rows][cols]` plus an optional comma-separated initializer list.
/// Returns `(rows, cols, initializer_values)` on success; the element count
/// of the final data image is always `rows*cols` regardless of how many
/// initializers were given.
pub fn parse_mat(args: &str, col_offset: usize, ctx: &LineContext, reporter: &mut dyn Reporter) -> Option<(u16, u16, Vec<i16>)> {
    let trimmed = args.trim_start();
    let leading_ws = args.len() - trimmed.len();

    let (rows, cols, after_dims) = parse_mat_dimensions(trimmed, col_offset + leading_ws, ctx, reporter)?;

    let rest = after_dims.trim_start();
    if rest.is_empty() {
        return Some((rows, cols, Vec::new()));
    }

    let rest_col_offset = col_offset + (args.len() - after_dims.len()) + (after_dims.len() - rest.len());
    let values = parse_number_list(rest, rest_col_offset, ctx, reporter, &MAT_CODES);

    let capacity = rows as usize * cols as usize;
    if values.len() > capacity {
        report(
            ctx,
            reporter,
            asm::MAT_TOO_MANY_INITIALIZERS,
            Span::point(rest_col_offset),
            format!("{} initializers given for a {rows}x{cols} matrix ({capacity} cells)", values.len()),
        );
    }

    Some((rows, cols, values))
}

/// Parses the `[rows][cols]` prefix of a `.mat` directive. Returns the
/// dimensions and the remainder of `text` after the closing `]`.
fn parse_mat_dimensions<'a>(
    text: &'a str,
    col_offset: usize,
    ctx: &LineContext,
    reporter: &mut dyn Reporter,
) -> Option<(u16, u16, &'a str)> {
    let (rows, after_rows) = parse_bracketed_dimension(text, col_offset, ctx, reporter)?;
    let (cols, after_cols) = parse_bracketed_dimension(after_rows, col_offset + (text.len() - after_rows.len()), ctx, reporter)?;

    match (rows as u32).checked_mul(cols as u32) {
        Some(total) if total <= u16::MAX as u32 => Some((rows, cols, after_cols)),
        _ => {
            report(
                ctx,
                reporter,
                asm::MAT_DIMENSION_OVERFLOW,
                Span::point(col_offset),
                format!("matrix dimension {rows}x{cols} overflows"),
            );
            None
        }
    }
}

fn parse_bracketed_dimension<'a>(
    text: &'a str,
    col_offset: usize,
    ctx: &LineContext,
    reporter: &mut dyn Reporter,
) -> Option<(u16, &'a str)> {
    let rest = text.strip_prefix('[').or_else(|| {
        report(ctx, reporter, asm::MAT_INVALID_DIMENSION, Span::point(col_offset), "expected '['".to_string());
        None
    })?;
    let close = rest.find(']').or_else(|| {
        report(ctx, reporter, asm::MAT_INVALID_DIMENSION, Span::point(col_offset), "unterminated dimension".to_string());
        None
    })?;
    let digits = &rest[..close];
    let value: u16 = digits.parse().ok().filter(|v| *v > 0).or_else(|| {
        report(
            ctx,
            reporter,
            asm::MAT_INVALID_DIMENSION,
            Span::new(col_offset + 1, col_offset + close),
            format!("invalid matrix dimension '{digits}'"),
        );
        None
    })?;
    Some((value, &rest[close + 1..]))
}

/// `.entry` / `.extern`: exactly one label argument, then only whitespace
/// or a comment for the rest of the line (the caller has already stripped
/// the comment before reaching here, so "rest of line" really means "rest
/// of the operand text").
pub fn parse_entry_extern_label(
    args: &str,
    col_offset: usize,
    ctx: &LineContext,
    reporter: &mut dyn Reporter,
) -> Option<String> {
    let trimmed_start = args.trim_start();
    let leading_ws = args.len() - trimmed_start.len();
    let label_col = col_offset + leading_ws;

    if trimmed_start.is_empty() {
        report(ctx, reporter, asm::ENTRY_EXTERN_MISSING_LABEL, Span::point(col_offset), "missing label".to_string());
        return None;
    }

    let end = trimmed_start.find(char::is_whitespace).unwrap_or(trimmed_start.len());
    let label = &trimmed_start[..end];
    let remainder = trimmed_start[end..].trim_start();

    if label.len() > MAX_LABEL_LEN {
        report(
            ctx,
            reporter,
            asm::ENTRY_EXTERN_LABEL_TOO_LONG,
            Span::new(label_col, label_col + label.len() - 1),
            format!("label '{label}' is longer than {MAX_LABEL_LEN} characters"),
        );
        return None;
    }
    if !is_valid_label_syntax(label) || is_reserved_name(label) {
        report(
            ctx,
            reporter,
            asm::ENTRY_EXTERN_INVALID_NAME,
            Span::new(label_col, label_col + label.len() - 1),
            format!("'{label}' is not a valid label name"),
        );
        return None;
    }
    if !remainder.is_empty() {
        let extra_col = col_offset + (trimmed_start.len() - remainder.len());
        report(
            ctx,
            reporter,
            asm::ENTRY_EXTERN_TRAILING_CONTENT,
            Span::new(extra_col, col_offset + args.trim_end().len() - 1),
            "unexpected content after the label".to_string(),
        );
        return None;
    }

    Some(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingReporter;

    fn ctx() -> LineContext<'static> {
        LineContext { file: "a.am", line_number: 1, source_line: "" }
    }

    #[test]
    fn data_accepts_signed_bytes() {
        let mut r = CollectingReporter::default();
        let values = parse_data(" 1, -1, 127, -128", 1, &ctx(), &mut r);
        assert_eq!(values, vec![1, -1, 127, -128]);
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn data_flags_out_of_range_and_leading_comma() {
        let mut r = CollectingReporter::default();
        let values = parse_data(",1, 200", 1, &ctx(), &mut r);
        assert_eq!(values, vec![1]);
        assert_eq!(r.error_count(), 2);
    }

    #[test]
    fn data_flags_missing_comma_between_numbers() {
        let mut r = CollectingReporter::default();
        let values = parse_data("1 2", 1, &ctx(), &mut r);
        assert_eq!(values, vec![1, 2]);
        assert_eq!(r.error_count(), 1);
    }

    #[test]
    fn string_yields_bytes_without_terminator() {
        let mut r = CollectingReporter::default();
        let bytes = parse_string("\"ab\"", 1, &ctx(), &mut r).unwrap();
        assert_eq!(bytes, vec![b'a', b'b']);
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn string_missing_quote_is_reported() {
        let mut r = CollectingReporter::default();
        assert!(parse_string("ab\"", 1, &ctx(), &mut r).is_none());
        assert_eq!(r.errors[0].code.0, "AS306");
    }

    #[test]
    fn mat_fills_missing_initializers_with_zero_conceptually() {
        let mut r = CollectingReporter::default();
        let (rows, cols, values) = parse_mat("[2][2] 1,2", 1, &ctx(), &mut r).unwrap();
        assert_eq!((rows, cols), (2, 2));
        assert_eq!(values, vec![1, 2]);
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn mat_initializer_errors_use_mat_codes_not_data_codes() {
        let mut r = CollectingReporter::default();
        let (rows, cols, values) = parse_mat("[2][2] 1,,2", 1, &ctx(), &mut r).unwrap();
        assert_eq!((rows, cols), (2, 2));
        assert_eq!(values, vec![1, 2]);
        assert_eq!(r.errors[0].code.0, "AS310");
    }

    #[test]
    fn mat_too_many_initializers_is_reported() {
        let mut r = CollectingReporter::default();
        let (rows, cols, values) = parse_mat("[1][1] 1,2", 1, &ctx(), &mut r).unwrap();
        assert_eq!((rows, cols), (1, 1));
        assert_eq!(values, vec![1, 2]);
        assert_eq!(r.errors[0].code.0, "AS313");
    }

    #[test]
    fn entry_extern_label_happy_path() {
        let mut r = CollectingReporter::default();
        assert_eq!(parse_entry_extern_label(" LOOP", 1, &ctx(), &mut r), Some("LOOP".to_string()));
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn entry_extern_rejects_trailing_content() {
        let mut r = CollectingReporter::default();
        assert!(parse_entry_extern_label(" LOOP junk", 1, &ctx(), &mut r).is_none());
        assert_eq!(r.errors[0].code.0, "AS319");
    }
}

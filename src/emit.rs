//! Output file emitters: `.ob`, `.ent`, `.ext`. The object header uses
//! minimum-width base-4 for the code/data counts; every address and word
//! after it uses fixed widths (4 letters for addresses, 5 for words -- 10
//! bits needs 5 base-4 digits).

use std::fs;

use crate::base4::{encode_fixed, encode_min};
use crate::first_pass::FirstPassOutput;
use crate::model::{ExternRecord, IC_START};
use crate::second_pass::SecondPassOutput;

const ADDRESS_WIDTH: usize = 4;
const WORD_WIDTH: usize = 5;

/// Writes `<stem>.ob`, and `<stem>.ent`/`<stem>.ext` if there's anything to
/// put in them. Returns `false` if any write failed.
pub fn emit(stem: &str, first: &FirstPassOutput, second: &SecondPassOutput) -> bool {
    emit_object(stem, first) && emit_entries(stem, &second.entries) && emit_externs(stem, &first.externs)
}

fn write_atomic(path: &str, contents: &str) -> bool {
    let tmp = format!("{path}.tmp");
    if fs::write(&tmp, contents).is_err() {
        let _ = fs::remove_file(&tmp);
        return false;
    }
    let _ = fs::remove_file(path);
    if fs::rename(&tmp, path).is_err() {
        let _ = fs::remove_file(&tmp);
        return false;
    }
    true
}

fn emit_object(stem: &str, first: &FirstPassOutput) -> bool {
    let code_count = first.ic_final - IC_START;
    let mut out = format!("{}\t{}\n", encode_min(code_count as u32), encode_min(first.dc_final as u32));

    for word in &first.code {
        out.push_str(&encode_fixed(word.address as u32, ADDRESS_WIDTH));
        out.push(' ');
        out.push_str(&encode_fixed(word.encoded() as u32, WORD_WIDTH));
        out.push('\n');
    }
    for data in &first.data {
        out.push_str(&encode_fixed(data.address as u32, ADDRESS_WIDTH));
        out.push(' ');
        out.push_str(&encode_fixed(data.payload as u32, WORD_WIDTH));
        out.push('\n');
    }

    write_atomic(&format!("{stem}.ob"), &out)
}

fn emit_entries(stem: &str, entries: &[crate::model::EntryRecord]) -> bool {
    if entries.is_empty() {
        let _ = fs::remove_file(format!("{stem}.ent"));
        return true;
    }
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("{} {}\n", entry.name, encode_fixed(entry.address as u32, ADDRESS_WIDTH)));
    }
    write_atomic(&format!("{stem}.ent"), &out)
}

fn emit_externs(stem: &str, externs: &[ExternRecord]) -> bool {
    let has_usages = externs.iter().any(|e| !e.usages.is_empty());
    if !has_usages {
        let _ = fs::remove_file(format!("{stem}.ext"));
        return true;
    }
    let mut out = String::new();
    for record in externs {
        for usage in &record.usages {
            out.push_str(&format!("{} {}\n", record.name, encode_fixed(*usage as u32, ADDRESS_WIDTH)));
        }
    }
    write_atomic(&format!("{stem}.ext"), &out)
}

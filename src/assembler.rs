//! Top-level assembler driver: wires the macro preprocessor, both passes,
//! and the emitters together for a single source stem, and reports
//! driver-level narration through [`crate::logging`] while per-line
//! problems flow through a [`crate::diagnostics::Reporter`].

use crate::diagnostics::ConsoleReporter;
use crate::{emit, first_pass, logging, macro_pre, second_pass};

/// Assembles `<stem>.as` end to end. Returns `true` if the whole pipeline
/// succeeded and `<stem>.ob` (and, if applicable, `<stem>.ent`/`<stem>.ext`)
/// were written; `false` if any stage reported an error, in which case no
/// output files beyond `<stem>.am` are produced or updated.
pub fn assemble_stem(stem: &str) -> bool {
    let mut reporter = ConsoleReporter::default();

    logging::info(&format!("preprocessing {stem}.as"));
    if !macro_pre::preprocess(stem, &mut reporter) {
        logging::error(format!("macro preprocessing failed for '{stem}.as'"));
        return false;
    }

    logging::info(&format!("running first pass on {stem}.am"));
    let Some(mut first) = first_pass::run(stem, &mut reporter) else {
        logging::error(format!("could not read '{stem}.am'"));
        return false;
    };
    if reporter.had_errors() {
        return false;
    }

    logging::info("running second pass");
    let file_name = format!("{stem}.am");
    let second = second_pass::run(&file_name, &mut first, &mut reporter);
    if reporter.had_errors() {
        return false;
    }

    logging::info(&format!("writing output files for {stem}"));
    if !emit::emit(stem, &first, &second) {
        logging::error(format!("failed to write output files for '{stem}'"));
        return false;
    }

    true
}

use std::env;

use asm10::assembler::assemble_stem;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <stem1> [<stem2> ...]", args[0]);
        std::process::exit(1);
    }

    let mut had_errors = false;
    for stem in &args[1..] {
        if !assemble_stem(stem) {
            had_errors = true;
        }
    }

    std::process::exit(if had_errors { 1 } else { 0 });
}

//! A two-pass assembler for a 10-bit-word toy architecture, featuring:
//! - a macro preprocessor
//! - a two-pass symbol resolver and instruction encoder
//! - base-4 "letter" encoded object/entry/extern output

pub mod assembler;
pub mod base4;
pub mod codes;
pub mod diagnostics;
pub mod directives;
pub mod emit;
pub mod encoder;
pub mod first_pass;
pub mod lexer;
pub mod logging;
pub mod macro_pre;
pub mod model;
pub mod opcodes;
pub mod second_pass;

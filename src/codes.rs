//! Stable diagnostic codes, grouped into families by the stage that raises
//! them. Grouped in submodules purely for readability; every constant is a
//! plain [`crate::diagnostics::ErrorCode`].

use crate::diagnostics::ErrorCode;

/// Macro preprocessor errors (`MC001..MC010`).
pub mod mc {
    use super::ErrorCode;

    pub const LINE_TOO_LONG: ErrorCode = ErrorCode("MC001");
    pub const MISSING_MACRO_NAME: ErrorCode = ErrorCode("MC002");
    pub const NAME_TOO_LONG: ErrorCode = ErrorCode("MC003");
    pub const INVALID_NAME_SYNTAX: ErrorCode = ErrorCode("MC004");
    pub const RESERVED_NAME: ErrorCode = ErrorCode("MC005");
    pub const DUPLICATE_NAME: ErrorCode = ErrorCode("MC006");
    pub const MISSING_SPACE_AFTER_MCRO: ErrorCode = ErrorCode("MC007");
    pub const TRAILING_CONTENT_AFTER_MCROEND: ErrorCode = ErrorCode("MC008");
    pub const UNTERMINATED_MACRO: ErrorCode = ErrorCode("MC009");
    pub const FILE_TOO_LONG: ErrorCode = ErrorCode("MC010");
}

/// Parsing / validation errors (`AS001..AS050`), stage failures
/// (`AS101..AS102`), matrix-operand errors (`AS110..AS114`) and directive
/// errors (`AS301..AS321`).
pub mod asm {
    use super::ErrorCode;

    pub const UNKNOWN_MNEMONIC_OR_DIRECTIVE: ErrorCode = ErrorCode("AS001");
    pub const INVALID_LABEL_SYNTAX: ErrorCode = ErrorCode("AS002");
    pub const OPERAND_COUNT_MISMATCH: ErrorCode = ErrorCode("AS003");
    pub const ILLEGAL_ADDRESSING_MODE: ErrorCode = ErrorCode("AS004");
    pub const DUPLICATE_LABEL: ErrorCode = ErrorCode("AS005");
    pub const EMPTY_OPERAND: ErrorCode = ErrorCode("AS006");
    pub const TOO_MANY_TOP_LEVEL_COMMAS: ErrorCode = ErrorCode("AS007");
    pub const INVALID_REGISTER: ErrorCode = ErrorCode("AS008");
    pub const UNDEFINED_SYMBOL: ErrorCode = ErrorCode("AS009");
    pub const ADDRESS_SPACE_OVERFLOW: ErrorCode = ErrorCode("AS010");
    pub const RESERVED_SYMBOL_NAME: ErrorCode = ErrorCode("AS011");
    pub const LABEL_TOO_LONG: ErrorCode = ErrorCode("AS012");
    pub const INVALID_IMMEDIATE_VALUE: ErrorCode = ErrorCode("AS013");

    pub const STAGE_PREPROCESS_FAILED: ErrorCode = ErrorCode("AS101");
    pub const STAGE_FIRST_PASS_FAILED: ErrorCode = ErrorCode("AS102");

    pub const MATRIX_MISSING_BRACKETS: ErrorCode = ErrorCode("AS110");
    pub const MATRIX_EMPTY_LABEL: ErrorCode = ErrorCode("AS111");
    pub const MATRIX_EMPTY_INDEX: ErrorCode = ErrorCode("AS112");
    pub const MATRIX_INVALID_REGISTER: ErrorCode = ErrorCode("AS113");
    pub const MATRIX_JUNK: ErrorCode = ErrorCode("AS114");

    pub const DATA_LEADING_COMMA: ErrorCode = ErrorCode("AS301");
    pub const DATA_INVALID_NUMBER: ErrorCode = ErrorCode("AS302");
    pub const DATA_OUT_OF_RANGE: ErrorCode = ErrorCode("AS303");
    pub const DATA_MISSING_COMMA: ErrorCode = ErrorCode("AS304");
    pub const DATA_TRAILING_COMMA: ErrorCode = ErrorCode("AS305");
    pub const STRING_MISSING_OPEN_QUOTE: ErrorCode = ErrorCode("AS306");
    pub const STRING_UNTERMINATED: ErrorCode = ErrorCode("AS307");
    pub const MAT_INVALID_DIMENSION: ErrorCode = ErrorCode("AS308");
    pub const MAT_DIMENSION_OVERFLOW: ErrorCode = ErrorCode("AS309");
    pub const MAT_MISSING_VALUE: ErrorCode = ErrorCode("AS310");
    pub const MAT_INVALID_NUMBER: ErrorCode = ErrorCode("AS311");
    pub const MAT_OUT_OF_RANGE: ErrorCode = ErrorCode("AS312");
    pub const MAT_TOO_MANY_INITIALIZERS: ErrorCode = ErrorCode("AS313");
    pub const MAT_UNEXPECTED_CHARACTER: ErrorCode = ErrorCode("AS314");
    pub const MAT_TRAILING_COMMA: ErrorCode = ErrorCode("AS315");
    pub const ENTRY_EXTERN_MISSING_LABEL: ErrorCode = ErrorCode("AS316");
    pub const ENTRY_EXTERN_LABEL_TOO_LONG: ErrorCode = ErrorCode("AS317");
    pub const ENTRY_EXTERN_INVALID_NAME: ErrorCode = ErrorCode("AS318");
    pub const ENTRY_EXTERN_TRAILING_CONTENT: ErrorCode = ErrorCode("AS319");
    pub const ENTRY_UNDEFINED: ErrorCode = ErrorCode("AS320");
    pub const ENTRY_IS_EXTERNAL: ErrorCode = ErrorCode("AS321");
}

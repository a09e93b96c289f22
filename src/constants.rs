/// Constants naming the well-known input columns.
pub mod columns {
    /// Identifier column shared by the messages and categories inputs.
    pub const ID_COLUMN: &str = "id";
    /// Column holding the packed category field.
    pub const CATEGORIES_COLUMN: &str = "categories";
    /// Column holding the untranslated original message text.
    pub const ORIGINAL_COLUMN: &str = "original";
    /// Suffix applied to a left-side column whose name also appears on the right side of a join.
    pub const LEFT_SUFFIX: &str = "_x";
    /// Suffix applied to a right-side column whose name also appears on the left side of a join.
    pub const RIGHT_SUFFIX: &str = "_y";
}

/// Constants describing the packed category field layout.
pub mod categories {
    /// Separator between `name-value` tokens (for example `related-1;request-0`).
    pub const TOKEN_DELIMITER: char = ';';
    /// Number of trailing characters (`-` plus one digit) stripped from a token to get its name.
    pub const VALUE_SUFFIX_CHARS: usize = 2;
}

/// Constants used by SQLite persistence.
pub mod storage {
    /// Default destination table name.
    pub const DEFAULT_TABLE_NAME: &str = "ETL_data";
    /// SQLite column affinity for integer columns.
    pub const SQL_INTEGER: &str = "INTEGER";
    /// SQLite column affinity for floating-point columns.
    pub const SQL_REAL: &str = "REAL";
    /// SQLite column affinity for text columns.
    pub const SQL_TEXT: &str = "TEXT";
}

/// Process exit statuses reported by the `process_data` binary.
pub mod exit_codes {
    /// Run completed and the table was written.
    pub const SUCCESS: u8 = 0;
    /// Invalid command-line usage or configuration.
    pub const USAGE: u8 = 2;
    /// Input files could not be read or parsed.
    pub const INPUT: u8 = 3;
    /// Category data did not fit the category schema.
    pub const SCHEMA: u8 = 4;
    /// Destination store could not be written.
    pub const STORAGE: u8 = 5;
}

/// Constants used by the command-line entry point.
pub mod cli {
    /// Binary name shown in usage output.
    pub const BIN_NAME: &str = "process_data";
    /// Example invocation printed in usage text.
    pub const USAGE_EXAMPLE: &str =
        "process_data disaster_messages.csv disaster_categories.csv DisasterResponse.db";
}

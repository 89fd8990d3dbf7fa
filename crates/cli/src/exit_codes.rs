//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | Success                                                     |
//! | 1    | Faulted rows found (only with `--fail-on-faults`)           |
//! | 2    | CLI usage error (bad args, missing input file)              |
//! | 3    | Invalid setup: bad config, or a sheet lacks a TYPE column   |
//! | 4    | Catalog index unusable (missing column, inconsistent keys)  |
//! | 5    | Catalog endpoint unreachable or returned an unusable body   |
//! | 6    | Runtime I/O error (unreadable sheet, unwritable output)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `exit_code_for` or the command's error handling

use accession_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// The run finished but some rows carry faults. Only returned with
/// `--fail-on-faults`; otherwise faults are reported and the run exits 0.
pub const EXIT_FAULTS: u8 = 1;

/// Usage error - bad arguments, missing input files.
pub const EXIT_USAGE: u8 = 2;

/// Config parse or validation error, or a sheet without a TYPE column.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Catalog index could not be built from its source.
pub const EXIT_CATALOG: u8 = 4;

/// Catalog fetch failed (transport, status, or body).
pub const EXIT_CONNECTIVITY: u8 = 5;

/// Reading sheets or writing outputs failed.
pub const EXIT_RUNTIME: u8 = 6;

/// Map an engine error to its exit code.
pub fn exit_code_for(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::MissingColumn { .. } => EXIT_INVALID_CONFIG,
        ReconError::CatalogIndex { .. } => EXIT_CATALOG,
        ReconError::Connectivity(_) => EXIT_CONNECTIVITY,
        ReconError::Io(_) => EXIT_RUNTIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_FAULTS,
            EXIT_USAGE,
            EXIT_INVALID_CONFIG,
            EXIT_CATALOG,
            EXIT_CONNECTIVITY,
            EXIT_RUNTIME,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn engine_errors_map_to_codes() {
        assert_eq!(exit_code_for(&ReconError::ConfigParse("x".into())), EXIT_INVALID_CONFIG);
        assert_eq!(exit_code_for(&ReconError::Connectivity("x".into())), EXIT_CONNECTIVITY);
        assert_eq!(
            exit_code_for(&ReconError::MissingColumn {
                source_name: "a.csv".into(),
                column: "TYPE".into()
            }),
            EXIT_INVALID_CONFIG
        );
        assert_eq!(exit_code_for(&ReconError::Io("x".into())), EXIT_RUNTIME);
    }
}

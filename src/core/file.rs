use std::path::Path;

use crate::core::error::ResrapError;

/// Reads a grammar file into a `String`.
///
/// No statement-splitting or comment-stripping happens here — the scanner
/// (`crate::core::scanner`) recognizes `//` line comments directly, so a
/// grammar file is handed to the same scan/build path as a grammar string,
/// verbatim.
pub fn read_grammar_file<P: AsRef<Path>>(path: P) -> Result<String, ResrapError> {
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_file_contents_unmodified() {
        let mut tmp = std::env::temp_dir();
        tmp.push("resrap_file_test_grammar.txt");
        {
            let mut f = std::fs::File::create(&tmp).unwrap();
            writeln!(f, "// a comment\na : 'x' ;").unwrap();
        }
        let contents = read_grammar_file(&tmp).unwrap();
        assert!(contents.contains("a : 'x' ;"));
        std::fs::remove_file(&tmp).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_grammar_file("/no/such/resrap/grammar.txt").unwrap_err();
        assert!(matches!(err, ResrapError::Io(_)));
    }
}

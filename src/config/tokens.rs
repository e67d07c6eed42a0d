//! Token scanner for location lists
//!
//! Splits configuration values into location tokens using space and `"` as
//! delimiters. Double-quoted segments may contain embedded spaces, so paths
//! with spaces (e.g. Windows-style install locations) survive tokenization.

/// Scanner over a location list string.
///
/// Outside quotes both space and `"` delimit; inside quotes only `"` does.
/// Each run of non-delimiter characters is trimmed and appended to the
/// current token, and a token is emitted when an unquoted space follows
/// collected content or when the input ends. An unterminated quote yields
/// the partial token collected so far.
pub struct TokenScanner<'a> {
    chars: std::str::Chars<'a>,
}

impl<'a> TokenScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
        }
    }
}

impl Iterator for TokenScanner<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut token = String::new();
        let mut chunk = String::new();
        let mut in_quote = false;
        let mut started = false;

        for c in self.chars.by_ref() {
            if c == '"' {
                if !chunk.is_empty() {
                    started = true;
                    token.push_str(chunk.trim());
                    chunk.clear();
                }
                in_quote = !in_quote;
            } else if c == ' ' && !in_quote {
                if !chunk.is_empty() {
                    started = true;
                    token.push_str(chunk.trim());
                    chunk.clear();
                }
                if started {
                    return Some(token);
                }
            } else {
                chunk.push(c);
            }
        }

        // End of input with collected content still pending.
        if !chunk.is_empty() {
            started = true;
            token.push_str(chunk.trim());
        }
        if started {
            Some(token)
        } else {
            None
        }
    }
}

/// Collect every token in `input`.
pub fn tokenize(input: &str) -> Vec<String> {
    TokenScanner::new(input).collect()
}

//! Byte-level lexical scanner parameterized by a per-language spec.
//!
//! The scanner produces the leaf-token stream a syntax-tree parser would:
//! identifiers, numeric and string literals, keywords, operators and
//! punctuation, in document order, with 1-indexed positions. Comments and
//! whitespace are skipped. It is intentionally approximate about language
//! corner cases; the engine only consumes normalized token categories.

use std::collections::{HashMap, HashSet};

use token_core::Token;

use crate::{TokenizeError, Tokenizer};

/// Static description of a language's surface lexicon.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSpec {
    pub name: &'static str,
    /// Words that normalize to themselves rather than `ID`.
    pub keywords: &'static [&'static str],
    /// Line comment openers (skip to end of line).
    pub line_comments: &'static [&'static str],
    /// Block comment delimiters, if the language has them.
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Bytes that open a string literal.
    pub string_delimiters: &'static [u8],
    /// Whether `'''` / `"""` triple-quoted strings exist.
    pub triple_strings: bool,
    /// Value-literal words and their normalized placeholders
    /// (e.g. `("true", "BOOL")`, `("nil", "NIL")`).
    pub literals: &'static [(&'static str, &'static str)],
    /// Placeholder for single-quoted character literals; `None` folds them
    /// into `STR`.
    pub char_placeholder: Option<&'static str>,
}

/// Multi-byte operators recognized as single tokens, longest first.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "===", "!==", "...", "**=", "&&=", "||=", "??=", "=>", "==", "!=", "<=", ">=",
    "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", ":=", "->", "<-", "<<", ">>", "::",
    "**", "??",
];

/// A [`Tokenizer`] driven by a [`LanguageSpec`].
pub struct LexTokenizer {
    spec: LanguageSpec,
    keywords: HashSet<&'static str>,
    literals: HashMap<&'static str, &'static str>,
}

impl LexTokenizer {
    pub fn new(spec: LanguageSpec) -> Self {
        LexTokenizer {
            keywords: spec.keywords.iter().copied().collect(),
            literals: spec.literals.iter().copied().collect(),
            spec,
        }
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

#[inline]
fn matches_at(bytes: &[u8], pos: usize, pattern: &str) -> bool {
    bytes[pos..].starts_with(pattern.as_bytes())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl Tokenizer for LexTokenizer {
    fn tokenize(&mut self, source: &[u8]) -> Result<Vec<Token>, TokenizeError> {
        let bytes = source;
        let len = bytes.len();
        let mut tokens = Vec::new();
        let mut pos = 0usize;
        let mut line = 1u32;
        let mut col = 1u32;

        'outer: while pos < len {
            let b = bytes[pos];

            if b == b'\n' {
                line += 1;
                col = 1;
                pos += 1;
                continue;
            }
            if b.is_ascii_whitespace() {
                col += 1;
                pos += 1;
                continue;
            }

            for opener in self.spec.line_comments {
                if matches_at(bytes, pos, opener) {
                    while pos < len && bytes[pos] != b'\n' {
                        pos += 1;
                    }
                    continue 'outer;
                }
            }

            if let Some((open, close)) = self.spec.block_comment {
                if matches_at(bytes, pos, open) {
                    let start_line = line;
                    pos += open.len();
                    col += open.len() as u32;
                    loop {
                        if pos >= len {
                            return Err(TokenizeError::UnterminatedComment { line: start_line });
                        }
                        if matches_at(bytes, pos, close) {
                            pos += close.len();
                            col += close.len() as u32;
                            break;
                        }
                        if bytes[pos] == b'\n' {
                            line += 1;
                            col = 1;
                        } else {
                            col += 1;
                        }
                        pos += 1;
                    }
                    continue;
                }
            }

            if self.spec.string_delimiters.contains(&b) {
                let (start, start_line, start_col) = (pos, line, col);
                let delim = b;
                // Backtick strings are raw: no escape processing.
                let escapes = delim != b'`';
                let triple = self.spec.triple_strings
                    && pos + 3 <= len
                    && bytes[pos + 1] == delim
                    && bytes[pos + 2] == delim;

                if triple {
                    pos += 3;
                    col += 3;
                    loop {
                        if pos >= len {
                            return Err(TokenizeError::UnterminatedString { line: start_line });
                        }
                        if pos + 3 <= len
                            && bytes[pos] == delim
                            && bytes[pos + 1] == delim
                            && bytes[pos + 2] == delim
                        {
                            pos += 3;
                            col += 3;
                            break;
                        }
                        if bytes[pos] == b'\\' && pos + 1 < len {
                            pos += 2;
                            col += 2;
                        } else if bytes[pos] == b'\n' {
                            line += 1;
                            col = 1;
                            pos += 1;
                        } else {
                            col += 1;
                            pos += 1;
                        }
                    }
                } else {
                    pos += 1;
                    col += 1;
                    loop {
                        if pos >= len {
                            return Err(TokenizeError::UnterminatedString { line: start_line });
                        }
                        let c = bytes[pos];
                        if escapes && c == b'\\' && pos + 1 < len {
                            pos += 2;
                            col += 2;
                        } else if c == delim {
                            pos += 1;
                            col += 1;
                            break;
                        } else if c == b'\n' {
                            line += 1;
                            col = 1;
                            pos += 1;
                        } else {
                            col += 1;
                            pos += 1;
                        }
                    }
                }

                let kind = if delim == b'\'' { "char" } else { "string" };
                tokens.push(Token::new(kind, lossy(&bytes[start..pos]), start_line, start_col));
                continue;
            }

            if is_ident_start(b) {
                let (start, start_line, start_col) = (pos, line, col);
                while pos < len && is_ident_continue(bytes[pos]) {
                    pos += 1;
                    col += 1;
                }
                tokens.push(Token::new(
                    "identifier",
                    lossy(&bytes[start..pos]),
                    start_line,
                    start_col,
                ));
                continue;
            }

            if b.is_ascii_digit() {
                let (start, start_line, start_col) = (pos, line, col);
                while pos < len
                    && (bytes[pos].is_ascii_alphanumeric()
                        || bytes[pos] == b'_'
                        || (bytes[pos] == b'.'
                            && pos + 1 < len
                            && bytes[pos + 1].is_ascii_digit()))
                {
                    pos += 1;
                    col += 1;
                }
                tokens.push(Token::new(
                    "number",
                    lossy(&bytes[start..pos]),
                    start_line,
                    start_col,
                ));
                continue;
            }

            for op in OPERATORS {
                if matches_at(bytes, pos, op) {
                    tokens.push(Token::new(*op, *op, line, col));
                    pos += op.len();
                    col += op.len() as u32;
                    continue 'outer;
                }
            }

            let text = lossy(&bytes[pos..pos + 1]);
            tokens.push(Token::new(text.clone(), text, line, col));
            pos += 1;
            col += 1;
        }

        Ok(tokens)
    }

    fn normalize(&self, token: &Token) -> String {
        match token.kind.as_str() {
            "identifier" => {
                if let Some(&placeholder) = self.literals.get(token.text.as_str()) {
                    placeholder.to_string()
                } else if self.keywords.contains(token.text.as_str()) {
                    token.text.clone()
                } else {
                    "ID".to_string()
                }
            }
            "number" => "NUM".to_string(),
            "string" => "STR".to_string(),
            "char" => self.spec.char_placeholder.unwrap_or("STR").to_string(),
            // Keywords, operators and punctuation pass through verbatim.
            _ => token.text.clone(),
        }
    }

    fn language(&self) -> &str {
        self.spec.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{go, python};

    fn scan(tokenizer: &mut LexTokenizer, source: &str) -> Vec<Token> {
        tokenizer.tokenize(source.as_bytes()).unwrap()
    }

    fn normalized(tokenizer: &mut LexTokenizer, source: &str) -> Vec<String> {
        let tokens = scan(tokenizer, source);
        tokens.iter().map(|t| tokenizer.normalize(t)).collect()
    }

    #[test]
    fn go_function_normalizes_to_structural_stream() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, "func add(a, b int) int { return a + b }");
        assert_eq!(
            stream,
            vec![
                "func", "ID", "(", "ID", ",", "ID", "ID", ")", "ID", "{", "return", "ID", "+",
                "ID", "}"
            ]
        );
    }

    #[test]
    fn go_literals_normalize_to_placeholders() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, r#"x := 42; s := "hi"; ok := true; p := nil"#);
        assert_eq!(
            stream,
            vec![
                "ID", ":=", "NUM", ";", "ID", ":=", "STR", ";", "ID", ":=", "BOOL", ";", "ID",
                ":=", "NIL"
            ]
        );
    }

    #[test]
    fn go_rune_literal_normalizes_to_char() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, "r := 'x'");
        assert_eq!(stream, vec!["ID", ":=", "CHAR"]);
    }

    #[test]
    fn go_raw_string_is_str() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, "s := `raw \\ text`");
        assert_eq!(stream, vec!["ID", ":=", "STR"]);
    }

    #[test]
    fn line_comments_are_skipped() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, "x // trailing comment\ny");
        assert_eq!(stream, vec!["ID", "ID"]);
    }

    #[test]
    fn block_comments_are_skipped_across_lines() {
        let mut tok = LexTokenizer::new(go());
        let tokens = scan(&mut tok, "a /* one\ntwo */ b");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].text, "b");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_block_comment_is_parse_error() {
        let mut tok = LexTokenizer::new(go());
        let err = tok.tokenize(b"x /* never closed").unwrap_err();
        assert_eq!(err, TokenizeError::UnterminatedComment { line: 1 });
    }

    #[test]
    fn unterminated_string_is_parse_error() {
        let mut tok = LexTokenizer::new(go());
        let err = tok.tokenize(b"s := \"open").unwrap_err();
        assert_eq!(err, TokenizeError::UnterminatedString { line: 1 });
    }

    #[test]
    fn string_escapes_do_not_terminate_early() {
        let mut tok = LexTokenizer::new(go());
        let tokens = scan(&mut tok, r#"s := "a \" b""#);
        assert_eq!(tokens.last().unwrap().kind, "string");
        assert_eq!(tokens.last().unwrap().text, r#""a \" b""#);
    }

    #[test]
    fn positions_are_one_indexed() {
        let mut tok = LexTokenizer::new(go());
        let tokens = scan(&mut tok, "ab cd\n  ef");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 4));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn multi_char_operators_stay_single_tokens() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, "a == b && c != d");
        assert_eq!(stream, vec!["ID", "==", "ID", "&&", "ID", "!=", "ID"]);
    }

    #[test]
    fn numbers_including_floats_and_hex() {
        let mut tok = LexTokenizer::new(go());
        let stream = normalized(&mut tok, "a = 1.5 + 0xFF + 1_000");
        assert_eq!(stream, vec!["ID", "=", "NUM", "+", "NUM", "+", "NUM"]);
    }

    #[test]
    fn empty_source_yields_no_tokens() {
        let mut tok = LexTokenizer::new(go());
        assert!(scan(&mut tok, "").is_empty());
        assert!(scan(&mut tok, "   \n\t  ").is_empty());
    }

    #[test]
    fn python_hash_comments_and_none() {
        let mut tok = LexTokenizer::new(python());
        let stream = normalized(&mut tok, "x = None  # comment\ny = True");
        assert_eq!(stream, vec!["ID", "=", "NONE", "ID", "=", "BOOL"]);
    }

    #[test]
    fn python_triple_quoted_string_is_one_token() {
        let mut tok = LexTokenizer::new(python());
        let stream = normalized(&mut tok, "s = \"\"\"multi\n\"quoted\"\nlines\"\"\"\nx = 1");
        assert_eq!(stream, vec!["ID", "=", "STR", "ID", "=", "NUM"]);
    }

    #[test]
    fn python_keywords_pass_through() {
        let mut tok = LexTokenizer::new(python());
        let stream = normalized(&mut tok, "def f(x):\n    return x");
        assert_eq!(
            stream,
            vec!["def", "ID", "(", "ID", ")", ":", "return", "ID"]
        );
    }

    #[test]
    fn identical_input_yields_identical_streams() {
        let mut tok = LexTokenizer::new(go());
        let source = "for i := 0; i < 10; i++ { sum += i }";
        assert_eq!(scan(&mut tok, source), scan(&mut tok, source));
    }
}

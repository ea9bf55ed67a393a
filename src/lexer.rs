use std::fmt;

use log::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Var,
    Function,
    If,
    Else,
    While,
    Do,
    Return,
    Break,
    Continue,
    True,
    False,
    Null,
    Undefined,

    // Literals
    Number(f64),
    String(String),
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equals,
    DoubleEquals,      // ==
    TripleEquals,      // ===
    NotEquals,         // !=
    NotDoubleEquals,   // !==
    LessThan,          // <
    LessThanEquals,    // <=
    GreaterThan,       // >
    GreaterThanEquals, // >=
    DoubleAmpersand,   // &&
    DoublePipe,        // ||
    Bang,              // !
    PlusPlus,          // ++
    MinusMinus,        // --
    PlusEquals,        // +=
    MinusEquals,       // -=
    StarEquals,        // *=
    SlashEquals,       // /=
    PercentEquals,     // %=
    Question,          // ?

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    Eof,
}

/// A single lexical unit together with the source text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub offset: usize,
    pub line: usize,
}

impl Token {
    /// Human-readable form used in parse error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub character: char,
    pub offset: usize,
    pub line: usize,
}

impl std::error::Error for LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized character {:?} at line {} (byte offset {})",
            self.character, self.line, self.offset
        )
    }
}

struct Scanner<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        c
    }

    /// Byte offset of the next unread character (or one past the end).
    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(o, _)| o)
            .unwrap_or(self.src.len())
    }

    fn lexeme(&self, start: usize) -> String {
        self.src[start..self.offset()].to_string()
    }
}

/// Turns source text into a token sequence terminated by an `Eof` token.
///
/// Whitespace, `//` line comments and `/* */` block comments are skipped.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    trace!(target: "lexer", "Tokenizing {} bytes of source", source.len());
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    while let Some(c) = scanner.peek() {
        let start = scanner.offset();
        let line = scanner.line;

        match c {
            c if c.is_whitespace() => {
                scanner.bump();
            }

            '/' if scanner.peek_next() == Some('/') => {
                while let Some(c) = scanner.peek() {
                    if c == '\n' {
                        break;
                    }
                    scanner.bump();
                }
            }

            '/' if scanner.peek_next() == Some('*') => {
                scanner.bump();
                scanner.bump();
                while let Some(c) = scanner.bump() {
                    if c == '*' && scanner.peek() == Some('/') {
                        scanner.bump();
                        break;
                    }
                }
            }

            '"' | '\'' => {
                let value = scan_string(&mut scanner, c);
                tokens.push(Token {
                    kind: TokenKind::String(value),
                    lexeme: scanner.lexeme(start),
                    offset: start,
                    line,
                });
            }

            c if c.is_ascii_digit() => {
                while scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                    scanner.bump();
                }
                if scanner.peek() == Some('.')
                    && scanner.peek_next().is_some_and(|c| c.is_ascii_digit())
                {
                    scanner.bump();
                    while scanner.peek().is_some_and(|c| c.is_ascii_digit()) {
                        scanner.bump();
                    }
                }
                let lexeme = scanner.lexeme(start);
                let value = lexeme.parse().unwrap_or(f64::NAN);
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    lexeme,
                    offset: start,
                    line,
                });
            }

            c if c.is_alphabetic() || c == '_' || c == '$' => {
                while scanner
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
                {
                    scanner.bump();
                }
                let lexeme = scanner.lexeme(start);
                let kind = match lexeme.as_str() {
                    "var" => TokenKind::Var,
                    "function" => TokenKind::Function,
                    "if" => TokenKind::If,
                    "else" => TokenKind::Else,
                    "while" => TokenKind::While,
                    "do" => TokenKind::Do,
                    "return" => TokenKind::Return,
                    "break" => TokenKind::Break,
                    "continue" => TokenKind::Continue,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    "undefined" => TokenKind::Undefined,
                    _ => TokenKind::Identifier(lexeme.clone()),
                };
                tokens.push(Token {
                    kind,
                    lexeme,
                    offset: start,
                    line,
                });
            }

            _ => {
                let kind = match scan_operator(&mut scanner) {
                    Some(kind) => kind,
                    None => {
                        debug!(target: "lexer", "Unrecognized character {:?} at line {}", c, line);
                        return Err(LexError {
                            character: c,
                            offset: start,
                            line,
                        });
                    }
                };
                tokens.push(Token {
                    kind,
                    lexeme: scanner.lexeme(start),
                    offset: start,
                    line,
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        offset: source.len(),
        line: scanner.line,
    });
    trace!(target: "lexer", "Produced {} tokens", tokens.len());
    Ok(tokens)
}

/// Scans the rest of a string literal, the opening quote still unread.
fn scan_string(scanner: &mut Scanner<'_>, quote: char) -> String {
    scanner.bump();
    let mut value = String::new();
    while let Some(c) = scanner.peek() {
        if c == quote {
            scanner.bump();
            break;
        } else if c == '\\' {
            scanner.bump();
            if let Some(next) = scanner.bump() {
                value.push(match next {
                    'n' => '\n',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    // Unknown escapes keep the escaped character.
                    other => other,
                });
            }
        } else {
            value.push(c);
            scanner.bump();
        }
    }
    value
}

/// Scans a punctuator/operator, longest match first.
fn scan_operator(scanner: &mut Scanner<'_>) -> Option<TokenKind> {
    let c = scanner.peek()?;
    let kind = match c {
        '+' => {
            scanner.bump();
            match scanner.peek() {
                Some('+') => {
                    scanner.bump();
                    TokenKind::PlusPlus
                }
                Some('=') => {
                    scanner.bump();
                    TokenKind::PlusEquals
                }
                _ => TokenKind::Plus,
            }
        }
        '-' => {
            scanner.bump();
            match scanner.peek() {
                Some('-') => {
                    scanner.bump();
                    TokenKind::MinusMinus
                }
                Some('=') => {
                    scanner.bump();
                    TokenKind::MinusEquals
                }
                _ => TokenKind::Minus,
            }
        }
        '*' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                TokenKind::StarEquals
            } else {
                TokenKind::Star
            }
        }
        '/' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                TokenKind::SlashEquals
            } else {
                TokenKind::Slash
            }
        }
        '%' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                TokenKind::PercentEquals
            } else {
                TokenKind::Percent
            }
        }
        '=' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                if scanner.peek() == Some('=') {
                    scanner.bump();
                    TokenKind::TripleEquals
                } else {
                    TokenKind::DoubleEquals
                }
            } else {
                TokenKind::Equals
            }
        }
        '!' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                if scanner.peek() == Some('=') {
                    scanner.bump();
                    TokenKind::NotDoubleEquals
                } else {
                    TokenKind::NotEquals
                }
            } else {
                TokenKind::Bang
            }
        }
        '<' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                TokenKind::LessThanEquals
            } else {
                TokenKind::LessThan
            }
        }
        '>' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                TokenKind::GreaterThanEquals
            } else {
                TokenKind::GreaterThan
            }
        }
        '&' => {
            if scanner.peek_next() == Some('&') {
                scanner.bump();
                scanner.bump();
                TokenKind::DoubleAmpersand
            } else {
                return None;
            }
        }
        '|' => {
            if scanner.peek_next() == Some('|') {
                scanner.bump();
                scanner.bump();
                TokenKind::DoublePipe
            } else {
                return None;
            }
        }
        '?' => {
            scanner.bump();
            TokenKind::Question
        }
        '(' => {
            scanner.bump();
            TokenKind::LeftParen
        }
        ')' => {
            scanner.bump();
            TokenKind::RightParen
        }
        '{' => {
            scanner.bump();
            TokenKind::LeftBrace
        }
        '}' => {
            scanner.bump();
            TokenKind::RightBrace
        }
        '[' => {
            scanner.bump();
            TokenKind::LeftBracket
        }
        ']' => {
            scanner.bump();
            TokenKind::RightBracket
        }
        ',' => {
            scanner.bump();
            TokenKind::Comma
        }
        ';' => {
            scanner.bump();
            TokenKind::Semicolon
        }
        ':' => {
            scanner.bump();
            TokenKind::Colon
        }
        '.' => {
            scanner.bump();
            TokenKind::Dot
        }
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("var x = undefined;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("x".to_string()),
                TokenKind::Equals,
                TokenKind::Undefined,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_integer_and_decimal() {
        assert_eq!(
            kinds("12 3.25"),
            vec![
                TokenKind::Number(12.0),
                TokenKind::Number(3.25),
                TokenKind::Eof
            ]
        );
        // A trailing dot is member access, not part of the number.
        assert_eq!(
            kinds("1.foo"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Dot,
                TokenKind::Identifier("foo".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\nb" 'it\'s' "q\"q" "b\\s""#),
            vec![
                TokenKind::String("a\nb".to_string()),
                TokenKind::String("it's".to_string()),
                TokenKind::String("q\"q".to_string()),
                TokenKind::String("b\\s".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn multi_character_operators() {
        assert_eq!(
            kinds("== === != !== <= >= && || ++ -- += -="),
            vec![
                TokenKind::DoubleEquals,
                TokenKind::TripleEquals,
                TokenKind::NotEquals,
                TokenKind::NotDoubleEquals,
                TokenKind::LessThanEquals,
                TokenKind::GreaterThanEquals,
                TokenKind::DoubleAmpersand,
                TokenKind::DoublePipe,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::PlusEquals,
                TokenKind::MinusEquals,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 // line\n/* block\n comment */ 2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn line_numbers_advance() {
        let tokens = tokenize("1\n  2\n3").expect("lexing failed");
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }

    #[test]
    fn unrecognized_character_is_an_error() {
        let err = tokenize("var x = @;").expect_err("expected a lex error");
        assert_eq!(err.character, '@');
        assert_eq!(err.offset, 8);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn bare_ampersand_is_an_error() {
        let err = tokenize("a & b").expect_err("expected a lex error");
        assert_eq!(err.character, '&');
    }

    #[test]
    fn relexing_token_lexemes_is_idempotent() {
        let source = r#"
            var fib = function (n) {
                // classic
                if (n <= 1) { return n; }
                return fib(n - 1) + fib(n - 2);
            };
            log("fib:", fib(10), 3.5 % 2, "x" + 'y');
        "#;
        let tokens = tokenize(source).expect("lexing failed");
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                continue;
            }
            let span = &source[token.offset..token.offset + token.lexeme.len()];
            let relexed = tokenize(span).expect("re-lexing failed");
            assert_eq!(relexed.len(), 2, "token {:?} split on re-lex", token.lexeme);
            assert_eq!(relexed[0].kind, token.kind);
            assert_eq!(relexed[0].lexeme, token.lexeme);
        }
    }
}

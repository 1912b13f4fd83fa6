//! Boolean expression compiler.
//!
//! Turns `red & (blue | ~green)` into postfix order with an operator
//! precedence (shunting-yard) pass, so the evaluator can run left to right
//! over a single stack.
//!
//! Grammar:
//! - `&` binary AND, `|` binary OR, `~` unary prefix NOT
//! - precedence NOT > AND > OR, binary operators left associative
//! - whitespace between two operands is an implicit `|`
//! - an unmatched `)` is ignored and an unclosed `(` is dropped at the end

use std::fmt;

use crate::analysis::stop::StopWords;
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A boolean operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '&' => Some(Operator::And),
            '|' => Some(Operator::Or),
            '~' => Some(Operator::Not),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operator::And => '&',
            Operator::Or => '|',
            Operator::Not => '~',
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            Operator::Not => 3,
        }
    }

    fn is_unary(&self) -> bool {
        matches!(self, Operator::Not)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One element of a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostfixToken {
    Operand(String),
    Operator(Operator),
}

impl fmt::Display for PostfixToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostfixToken::Operand(keyword) => f.write_str(keyword),
            PostfixToken::Operator(op) => write!(f, "{op}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    Word(String),
    Op(Operator),
    Open,
    Close,
}

impl Lexeme {
    /// Whether an operand may end right before this lexeme without an
    /// operator in between.
    fn starts_operand(&self) -> bool {
        matches!(self, Lexeme::Word(_) | Lexeme::Open | Lexeme::Op(Operator::Not))
    }

    fn ends_operand(&self) -> bool {
        matches!(self, Lexeme::Word(_) | Lexeme::Close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Op(Operator),
    Open,
}

fn lex(expression: &str) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, lexemes: &mut Vec<Lexeme>| {
        if !word.is_empty() {
            lexemes.push(Lexeme::Word(std::mem::take(word)));
        }
    };

    for c in expression.chars() {
        if let Some(op) = Operator::from_char(c) {
            flush(&mut word, &mut lexemes);
            lexemes.push(Lexeme::Op(op));
        } else if c == '(' {
            flush(&mut word, &mut lexemes);
            lexemes.push(Lexeme::Open);
        } else if c == ')' {
            flush(&mut word, &mut lexemes);
            lexemes.push(Lexeme::Close);
        } else if c.is_whitespace() {
            flush(&mut word, &mut lexemes);
        } else {
            word.push(c);
        }
    }
    flush(&mut word, &mut lexemes);
    lexemes
}

/// Compile a boolean expression to postfix order.
///
/// # Examples
///
/// ```
/// use halberd::query::expression::to_postfix;
///
/// let postfix: Vec<String> = to_postfix("a & ~b | c")
///     .iter()
///     .map(|token| token.to_string())
///     .collect();
/// assert_eq!(postfix, ["a", "b", "~", "&", "c", "|"]);
/// ```
pub fn to_postfix(expression: &str) -> Vec<PostfixToken> {
    let mut output = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut previous: Option<Lexeme> = None;

    for lexeme in lex(expression) {
        if lexeme == Lexeme::Close && !pending.contains(&Pending::Open) {
            continue;
        }

        let implicit_or = previous.as_ref().is_some_and(Lexeme::ends_operand) && lexeme.starts_operand();
        if implicit_or {
            push_binary(Operator::Or, &mut pending, &mut output);
        }

        match &lexeme {
            Lexeme::Word(keyword) => output.push(PostfixToken::Operand(keyword.clone())),
            Lexeme::Op(op) if op.is_unary() => pending.push(Pending::Op(*op)),
            Lexeme::Op(op) => push_binary(*op, &mut pending, &mut output),
            Lexeme::Open => pending.push(Pending::Open),
            Lexeme::Close => {
                while let Some(top) = pending.pop() {
                    match top {
                        Pending::Open => break,
                        Pending::Op(op) => output.push(PostfixToken::Operator(op)),
                    }
                }
            }
        }
        previous = Some(lexeme);
    }

    while let Some(top) = pending.pop() {
        if let Pending::Op(op) = top {
            output.push(PostfixToken::Operator(op));
        }
    }
    output
}

fn push_binary(op: Operator, pending: &mut Vec<Pending>, output: &mut Vec<PostfixToken>) {
    while let Some(&Pending::Op(top)) = pending.last() {
        if top.precedence() < op.precedence() {
            break;
        }
        pending.pop();
        output.push(PostfixToken::Operator(top));
    }
    pending.push(Pending::Op(op));
}

/// Split a boolean query into keyword and operator tokens.
///
/// Text between reserved characters goes through `tokenizer`; each reserved
/// character is kept as a token of its own.
pub fn query_tokens(tokenizer: &dyn Tokenizer, phrase: &str) -> Result<Vec<String>> {
    let special = tokenizer.special_chars();
    let mut tokens = Vec::new();
    let mut rest = phrase;

    while let Some(position) = rest.find(|c: char| special.contains(&c)) {
        tokens.extend(tokenizer.tokenize(&rest[..position], &StopWords::none())?);
        let reserved = &rest[position..];
        let width = reserved.chars().next().map_or(1, char::len_utf8);
        tokens.push(reserved[..width].to_string());
        rest = &reserved[width..];
    }
    tokens.extend(tokenizer.tokenize(rest, &StopWords::none())?);
    Ok(tokens)
}

/// The last keyword of a token list produced by [`query_tokens`].
pub fn last_keyword<'a>(tokens: &'a [String], special: &[char]) -> Option<&'a str> {
    tokens
        .iter()
        .rev()
        .find(|token| !token.chars().all(|c| special.contains(&c)))
        .map(String::as_str)
}

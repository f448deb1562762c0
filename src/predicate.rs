//! Filter predicates.
//!
//! A predicate is a field-scoped condition: equality (with an "All"
//! wildcard), inclusive numeric range, set membership, or a strict/non-strict
//! numeric comparison. Predicates are bound against a table schema before any
//! row is read, which is where unknown fields, type mismatches and values
//! outside a category domain are rejected.
//!
//! Predicates can also be written as text:
//! - `Region == 'South'`
//! - `Region == *` (wildcard)
//! - `Accessibility_Score BETWEEN 0 AND 10`
//! - `Preservation_Urgency IN ('Critical', 'High')`
//! - `Expected_Visitors > 75000 AND Month == 'Oct'`

use crate::column::{ColumnType, ColumnValue};
use crate::error::{Error, Result};
use crate::table::{Record, Table};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dropdown selection: a concrete value or the "All" wildcard.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Choice {
    #[default]
    All,
    Value(ColumnValue),
}

impl Choice {
    /// Label the presentation layer uses for the wildcard entry.
    pub const ALL_LABEL: &'static str = "All";

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn value(&self) -> Option<&ColumnValue> {
        match self {
            Choice::All => None,
            Choice::Value(v) => Some(v),
        }
    }
}

impl From<ColumnValue> for Choice {
    fn from(value: ColumnValue) -> Self {
        match value {
            ColumnValue::String(s) if s == Choice::ALL_LABEL => Choice::All,
            v => Choice::Value(v),
        }
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Choice::from(ColumnValue::from(value))
    }
}

impl From<i64> for Choice {
    fn from(value: i64) -> Self {
        Choice::Value(ColumnValue::Int64(value))
    }
}

impl From<f64> for Choice {
    fn from(value: f64) -> Self {
        Choice::Value(ColumnValue::Float64(value))
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str(Choice::ALL_LABEL),
            Choice::Value(v) => v.fmt(f),
        }
    }
}

impl Serialize for Choice {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Choice::All => serializer.serialize_str(Choice::ALL_LABEL),
            Choice::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Choice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        ColumnValue::deserialize(deserializer).map(Choice::from)
    }
}

/// Numeric comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl CompareOp {
    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A single field-scoped filter condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// `field == value`, or always true when the choice is `All`.
    Equals { field: String, value: Choice },
    /// `low <= field <= high`
    Range { field: String, low: f64, high: f64 },
    /// `field` is one of `values`
    OneOf {
        field: String,
        values: Vec<ColumnValue>,
    },
    /// `field <op> value`
    Compare {
        field: String,
        cmp: CompareOp,
        value: f64,
    },
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<Choice>) -> Self {
        Predicate::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wildcard on a field: never removes a row.
    pub fn all(field: impl Into<String>) -> Self {
        Predicate::Equals {
            field: field.into(),
            value: Choice::All,
        }
    }

    pub fn range(field: impl Into<String>, low: f64, high: f64) -> Self {
        Predicate::Range {
            field: field.into(),
            low,
            high,
        }
    }

    pub fn one_of<V: Into<ColumnValue>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::OneOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn compare(field: impl Into<String>, cmp: CompareOp, value: f64) -> Self {
        Predicate::Compare {
            field: field.into(),
            cmp,
            value,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Predicate::Equals { field, .. }
            | Predicate::Range { field, .. }
            | Predicate::OneOf { field, .. }
            | Predicate::Compare { field, .. } => field,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Predicate::Equals { value: Choice::All, .. })
    }

    /// Validate against a table schema and resolve the field to a column index.
    pub fn bind(&self, table: &Table) -> Result<BoundPredicate> {
        let (column, test) = match self {
            // The field name is still checked, the value never is
            Predicate::Equals {
                field,
                value: Choice::All,
            } => (table.resolve(field)?, Test::Always),
            Predicate::Equals {
                field,
                value: Choice::Value(value),
            } => {
                let column = table.resolve(field)?;
                check_literal(table, column, field, value)?;
                (column, Test::Equals(value.clone()))
            }
            Predicate::OneOf { field, values } => {
                let column = table.resolve(field)?;
                for value in values {
                    check_literal(table, column, field, value)?;
                }
                (column, Test::OneOf(values.clone()))
            }
            Predicate::Range { field, low, high } => {
                let column = table.resolve_numeric(field)?;
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(Error::InvalidRange {
                        field: field.clone(),
                        low: *low,
                        high: *high,
                    });
                }
                (column, Test::Range(*low, *high))
            }
            Predicate::Compare { field, cmp, value } => {
                let column = table.resolve_numeric(field)?;
                if !value.is_finite() {
                    return Err(Error::InvalidRange {
                        field: field.clone(),
                        low: *value,
                        high: *value,
                    });
                }
                (column, Test::Compare(*cmp, *value))
            }
        };

        Ok(BoundPredicate { column, test })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals { field, value: Choice::All } => write!(f, "{} == *", field),
            Predicate::Equals {
                field,
                value: Choice::Value(v),
            } => write!(f, "{} == {}", field, Literal(v)),
            Predicate::Range { field, low, high } => write!(
                f,
                "{} BETWEEN {} AND {}",
                field,
                Literal(&ColumnValue::Float64(*low)),
                Literal(&ColumnValue::Float64(*high))
            ),
            Predicate::OneOf { field, values } => {
                let items: Vec<String> = values.iter().map(|v| Literal(v).to_string()).collect();
                write!(f, "{} IN ({})", field, items.join(", "))
            }
            Predicate::Compare { field, cmp, value } => {
                write!(f, "{} {} {}", field, cmp.symbol(), Literal(&ColumnValue::Float64(*value)))
            }
        }
    }
}

/// Formats a value the way the parser reads it back.
struct Literal<'a>(&'a ColumnValue);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ColumnValue::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            ColumnValue::Float64(v) if v.fract() == 0.0 => write!(f, "{:.1}", v),
            v => v.fmt(f),
        }
    }
}

fn check_literal(table: &Table, column: usize, field: &str, value: &ColumnValue) -> Result<()> {
    let ty = table
        .column(column)
        .map(|c| c.column_type())
        .ok_or_else(|| Error::unknown_field(table.name(), field))?;

    if ty.admits(value) {
        return Ok(());
    }

    match (ty, value) {
        (ColumnType::Category(_), ColumnValue::String(s)) => Err(Error::UnknownCategory {
            dataset: table.name().to_string(),
            field: field.to_string(),
            value: s.clone(),
        }),
        _ => Err(Error::TypeMismatch {
            dataset: table.name().to_string(),
            field: field.to_string(),
            expected: ty.name(),
            found: value.type_name(),
        }),
    }
}

#[derive(Debug, Clone)]
enum Test {
    Always,
    Equals(ColumnValue),
    OneOf(Vec<ColumnValue>),
    Range(f64, f64),
    Compare(CompareOp, f64),
}

/// A predicate resolved against a schema, ready to evaluate.
#[derive(Debug, Clone)]
pub struct BoundPredicate {
    column: usize,
    test: Test,
}

impl BoundPredicate {
    /// True for wildcards, which never need evaluating.
    pub fn is_always(&self) -> bool {
        matches!(self.test, Test::Always)
    }

    /// Relative evaluation cost: equality first, then sets, then numeric tests.
    pub fn cost(&self) -> u8 {
        match self.test {
            Test::Always => 0,
            Test::Equals(_) => 1,
            Test::OneOf(_) => 2,
            Test::Range(..) | Test::Compare(..) => 3,
        }
    }

    pub fn matches(&self, record: &Record<'_>) -> bool {
        if let Test::Always = self.test {
            return true;
        }

        let Some(value) = record.get_by_index(self.column) else {
            return false;
        };

        match &self.test {
            Test::Always => true,
            Test::Equals(expected) => value.matches(expected),
            Test::OneOf(allowed) => allowed.iter().any(|v| value.matches(v)),
            Test::Range(low, high) => value.as_f64().is_some_and(|x| *low <= x && x <= *high),
            Test::Compare(op, bound) => value.as_f64().is_some_and(|x| compare_ord(x, *bound, op)),
        }
    }
}

/// Compare two ordered values.
fn compare_ord<T: PartialOrd>(a: T, b: T, op: &CompareOp) -> bool {
    match op {
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
    }
}

/// Lexer and parser errors are plain messages until `parse_predicates` wraps them.
type ParseResult<T> = std::result::Result<T, String>;

/// Token types for lexing
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    String(String),
    Star,
    // Operators
    Eq, // ==
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
    And,
    Between,
    In,
    LParen,
    RParen,
    Comma,
    Eof,
}

/// Lexer for tokenizing predicate strings
struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self, negative: bool) -> ParseResult<Token> {
        let mut num_str = String::from(if negative { "-" } else { "" });
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                num_str.push(c);
                self.advance();
            } else if c == '.' && !is_float {
                is_float = true;
                num_str.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if is_float {
            num_str
                .parse()
                .map(Token::Float)
                .map_err(|_| format!("Invalid number: {}", num_str))
        } else {
            num_str
                .parse()
                .map(Token::Int)
                .map_err(|_| format!("Invalid number: {}", num_str))
        }
    }

    fn read_string(&mut self, quote: char) -> ParseResult<Token> {
        self.advance(); // opening quote
        let mut s = String::new();

        while let Some(c) = self.advance() {
            if c == quote {
                return Ok(Token::String(s));
            } else if c == '\\' {
                if let Some(escaped) = self.advance() {
                    s.push(escaped);
                }
            } else {
                s.push(c);
            }
        }

        Err("Unterminated string".to_string())
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        match c {
            '(' => { self.advance(); Ok(Token::LParen) }
            ')' => { self.advance(); Ok(Token::RParen) }
            ',' => { self.advance(); Ok(Token::Comma) }
            '*' => { self.advance(); Ok(Token::Star) }
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                }
                Ok(Token::Eq)
            }
            '<' | '>' => {
                self.advance();
                let or_equal = self.peek() == Some('=');
                if or_equal {
                    self.advance();
                }
                Ok(match (c, or_equal) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::Le,
                    (_, false) => Token::Gt,
                    (_, true) => Token::Ge,
                })
            }
            '\'' | '"' => self.read_string(c),
            '-' if self.input.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit() || *c == '.') => {
                self.advance();
                self.read_number(true)
            }
            _ if c.is_ascii_digit() || c == '.' => self.read_number(false),
            _ if c.is_alphabetic() || c == '_' => {
                let ident = self.read_ident();
                match ident.to_uppercase().as_str() {
                    "AND" => Ok(Token::And),
                    "BETWEEN" => Ok(Token::Between),
                    "IN" => Ok(Token::In),
                    _ => Ok(Token::Ident(ident)),
                }
            }
            _ => Err(format!("Unexpected character: {}", c)),
        }
    }
}

/// Parser for conjunctions of predicates
struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    fn new(input: &str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        if &self.current == expected {
            self.advance()
        } else {
            Err(format!("Expected {:?}, got {:?}", expected, self.current))
        }
    }

    fn parse_conjunction(&mut self) -> ParseResult<Vec<Predicate>> {
        let mut predicates = Vec::new();
        if self.current == Token::Eof {
            return Ok(predicates);
        }

        predicates.push(self.parse_predicate()?);
        while self.current == Token::And {
            self.advance()?;
            predicates.push(self.parse_predicate()?);
        }

        Ok(predicates)
    }

    fn parse_predicate(&mut self) -> ParseResult<Predicate> {
        // Parentheses only ever group a single predicate
        let mut depth = 0usize;
        while self.current == Token::LParen {
            self.advance()?;
            depth += 1;
        }

        let predicate = self.parse_comparison()?;
        for _ in 0..depth {
            self.expect(&Token::RParen)?;
        }
        Ok(predicate)
    }

    fn parse_comparison(&mut self) -> ParseResult<Predicate> {
        let field = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => return Err(format!("Expected field name, got {:?}", self.current)),
        };
        self.advance()?;

        match self.current.clone() {
            Token::Eq => {
                self.advance()?;
                let value = if self.current == Token::Star {
                    self.advance()?;
                    Choice::All
                } else {
                    Choice::from(self.parse_literal()?)
                };
                Ok(Predicate::Equals { field, value })
            }
            Token::Lt | Token::Le | Token::Gt | Token::Ge => {
                let cmp = match self.current {
                    Token::Lt => CompareOp::Lt,
                    Token::Le => CompareOp::Le,
                    Token::Gt => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                self.advance()?;
                let value = self.parse_number()?;
                Ok(Predicate::Compare { field, cmp, value })
            }
            Token::Between => {
                self.advance()?;
                let low = self.parse_number()?;
                self.expect(&Token::And)?;
                let high = self.parse_number()?;
                Ok(Predicate::Range { field, low, high })
            }
            Token::In => {
                self.advance()?;
                self.expect(&Token::LParen)?;
                // An empty set is legal and matches nothing
                let mut values = Vec::new();
                if self.current != Token::RParen {
                    values.push(self.parse_literal()?);
                    while self.current == Token::Comma {
                        self.advance()?;
                        values.push(self.parse_literal()?);
                    }
                }
                self.expect(&Token::RParen)?;
                Ok(Predicate::OneOf { field, values })
            }
            other => Err(format!("Expected operator after '{}', got {:?}", field, other)),
        }
    }

    fn parse_literal(&mut self) -> ParseResult<ColumnValue> {
        let value = match &self.current {
            Token::Int(n) => ColumnValue::Int64(*n),
            Token::Float(f) => ColumnValue::Float64(*f),
            Token::String(s) => ColumnValue::String(s.clone()),
            _ => return Err(format!("Expected literal value, got {:?}", self.current)),
        };
        self.advance()?;
        Ok(value)
    }

    fn parse_number(&mut self) -> ParseResult<f64> {
        self.parse_literal()?
            .as_f64()
            .ok_or_else(|| "Expected a number".to_string())
    }
}

/// Parse a conjunction of predicates such as
/// `Region == 'South' AND Practitioners >= 5000`.
///
/// An empty string yields no predicates.
pub fn parse_predicates(input: &str) -> Result<Vec<Predicate>> {
    let mut parser = Parser::new(input).map_err(Error::Parse)?;
    let predicates = parser.parse_conjunction().map_err(Error::Parse)?;

    // Ensure we consumed all input
    if parser.current != Token::Eof {
        return Err(Error::Parse(format!(
            "Unexpected token after predicates: {:?}",
            parser.current
        )));
    }

    Ok(predicates)
}

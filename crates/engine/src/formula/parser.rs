// Formula parser - converts formula strings into AST
// Supports: numbers, string literals, cell refs (A1), ranges (A1:B3),
// function calls from the fixed table, basic math (+, -, *, /, %)

use crate::error::CalcError;
use crate::formula::functions::Func;
use crate::loc::Coord;

/// Expression AST for a cell formula.
///
/// Function names are resolved against the fixed table while parsing, so an
/// `Expr` never carries an unknown function. References may point outside
/// the grid extent; resolution checks that at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    /// Single cell reference (A1)
    CellRef(Coord),
    /// Rectangular range, corners kept as written (normalized on expansion)
    Range { start: Coord, end: Coord },
    Function { func: Func, args: Vec<Expr> },
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    /// Binary modulo (%), same precedence as * and /
    Mod,
}

/// Parse a formula string (leading '=' required) into an AST.
pub fn parse(formula: &str) -> Result<Expr, CalcError> {
    let Some(input) = formula.strip_prefix('=') else {
        return Err(CalcError::Parse("formula must start with =".to_string()));
    };
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Parse("empty formula".to_string()));
    }
    let (expr, pos) = parse_add_sub(&tokens, 0)?;
    if pos != tokens.len() {
        return Err(CalcError::Parse(format!(
            "unexpected input after expression at token {}",
            pos
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
enum Token {
    Number(f64),
    StringLit(String),
    CellRef(Coord),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Colon,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '%' => { tokens.push(Token::Percent); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            ':' => { tokens.push(Token::Colon); chars.next(); }
            ',' => { tokens.push(Token::Comma); chars.next(); }
            '"' => {
                // String literal
                chars.next(); // consume opening quote
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => s.push(ch),
                        None => {
                            return Err(CalcError::Parse(
                                "unterminated string literal".to_string(),
                            ))
                        }
                    }
                }
                tokens.push(Token::StringLit(s));
            }
            'A'..='Z' => {
                // Cell reference (A1) or function name (SUM). The surface is
                // uppercase-only; lowercase never forms a token.
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if ident.chars().any(|ch| ch.is_ascii_digit()) {
                    match Coord::parse(&ident) {
                        Some(coord) => tokens.push(Token::CellRef(coord)),
                        None => {
                            return Err(CalcError::Parse(format!(
                                "invalid reference: {}",
                                ident
                            )))
                        }
                    }
                } else {
                    tokens.push(Token::Ident(ident));
                }
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| CalcError::Parse(format!("invalid number: {}", num_str)))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(CalcError::Parse(format!("unexpected character: {}", c))),
        }
    }

    Ok(tokens)
}

fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), CalcError> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), CalcError> {
    let (mut left, mut pos) = parse_primary(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            Token::Percent => Op::Mod,
            _ => break,
        };
        let (right, new_pos) = parse_primary(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), CalcError> {
    if pos >= tokens.len() {
        return Err(CalcError::Parse("unexpected end of expression".to_string()));
    }

    match &tokens[pos] {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::StringLit(s) => Ok((Expr::Text(s.clone()), pos + 1)),
        Token::CellRef(start) => {
            // Check if this is a range (A1:B5)
            if pos + 2 < tokens.len() {
                if let Token::Colon = &tokens[pos + 1] {
                    if let Token::CellRef(end) = &tokens[pos + 2] {
                        return Ok((
                            Expr::Range {
                                start: *start,
                                end: *end,
                            },
                            pos + 3,
                        ));
                    }
                }
            }
            Ok((Expr::CellRef(*start), pos + 1))
        }
        Token::Ident(name) => {
            // Function call
            if pos + 1 < tokens.len() {
                if let Token::LParen = &tokens[pos + 1] {
                    let func = Func::from_name(name).ok_or_else(|| {
                        CalcError::Parse(format!("unknown function: {}", name))
                    })?;
                    let (args, new_pos) = parse_function_args(tokens, pos + 2)?;
                    return Ok((Expr::Function { func, args }, new_pos));
                }
            }
            // Bare identifiers have no meaning here
            Err(CalcError::Parse(format!("unknown identifier: {}", name)))
        }
        Token::LParen => {
            let (expr, pos) = parse_add_sub(tokens, pos + 1)?;
            if pos >= tokens.len() {
                return Err(CalcError::Parse("missing closing parenthesis".to_string()));
            }
            match &tokens[pos] {
                Token::RParen => Ok((expr, pos + 1)),
                _ => Err(CalcError::Parse("expected closing parenthesis".to_string())),
            }
        }
        Token::Plus => {
            // Unary plus (no-op, just parse the next expression)
            parse_primary(tokens, pos + 1)
        }
        Token::Minus => {
            // Unary minus
            let (expr, pos) = parse_primary(tokens, pos + 1)?;
            Ok((
                Expr::BinaryOp {
                    op: Op::Sub,
                    left: Box::new(Expr::Number(0.0)),
                    right: Box::new(expr),
                },
                pos,
            ))
        }
        _ => Err(CalcError::Parse(format!(
            "unexpected token at position {}",
            pos
        ))),
    }
}

fn parse_function_args(tokens: &[Token], pos: usize) -> Result<(Vec<Expr>, usize), CalcError> {
    let mut args = Vec::new();
    let mut pos = pos;

    // Handle empty function call SUM()
    if pos < tokens.len() {
        if let Token::RParen = &tokens[pos] {
            return Ok((args, pos + 1));
        }
    }

    loop {
        // Empty argument slot: next token is , or ) immediately
        if pos < tokens.len() && matches!(&tokens[pos], Token::Comma | Token::RParen) {
            return Err(CalcError::Parse("empty function argument".to_string()));
        }

        let (arg, new_pos) = parse_add_sub(tokens, pos)?;
        args.push(arg);
        pos = new_pos;

        if pos >= tokens.len() {
            return Err(CalcError::Parse(
                "missing closing parenthesis in function call".to_string(),
            ));
        }

        match &tokens[pos] {
            Token::RParen => return Ok((args, pos + 1)),
            Token::Comma => pos += 1,
            _ => {
                return Err(CalcError::Parse(
                    "expected comma or closing parenthesis".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(label: &str) -> Coord {
        Coord::parse(label).unwrap()
    }

    // =========================================================================
    // Literals and references
    // =========================================================================

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("=42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse("=4.25").unwrap(), Expr::Number(4.25));
        assert_eq!(parse("=.5").unwrap(), Expr::Number(0.5));
    }

    #[test]
    fn test_parse_string_literal() {
        assert_eq!(parse("=\"hello\"").unwrap(), Expr::Text("hello".to_string()));
        assert_eq!(parse("=\"\"").unwrap(), Expr::Text(String::new()));
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse("=A1").unwrap(), Expr::CellRef(c("A1")));
        assert_eq!(parse("=AA10").unwrap(), Expr::CellRef(Coord::new(9, 26)));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse("=A1:B3").unwrap(),
            Expr::Range {
                start: c("A1"),
                end: c("B3"),
            }
        );
    }

    #[test]
    fn test_parse_reversed_range_keeps_corners() {
        // Corners stay as written; normalization happens on expansion
        assert_eq!(
            parse("=B3:A1").unwrap(),
            Expr::Range {
                start: c("B3"),
                end: c("A1"),
            }
        );
    }

    // =========================================================================
    // Operators and precedence
    // =========================================================================

    #[test]
    fn test_parse_precedence() {
        // =1+2*3 parses as 1+(2*3)
        assert_eq!(
            parse("=1+2*3").unwrap(),
            Expr::BinaryOp {
                op: Op::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::BinaryOp {
                    op: Op::Mul,
                    left: Box::new(Expr::Number(2.0)),
                    right: Box::new(Expr::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_parens_override_precedence() {
        assert_eq!(
            parse("=(1+2)*3").unwrap(),
            Expr::BinaryOp {
                op: Op::Mul,
                left: Box::new(Expr::BinaryOp {
                    op: Op::Add,
                    left: Box::new(Expr::Number(1.0)),
                    right: Box::new(Expr::Number(2.0)),
                }),
                right: Box::new(Expr::Number(3.0)),
            }
        );
    }

    #[test]
    fn test_parse_modulo_binds_like_mul() {
        // =10%3+1 parses as (10%3)+1
        assert_eq!(
            parse("=10%3+1").unwrap(),
            Expr::BinaryOp {
                op: Op::Add,
                left: Box::new(Expr::BinaryOp {
                    op: Op::Mod,
                    left: Box::new(Expr::Number(10.0)),
                    right: Box::new(Expr::Number(3.0)),
                }),
                right: Box::new(Expr::Number(1.0)),
            }
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        // Desugars to 0 - x
        assert_eq!(
            parse("=-5").unwrap(),
            Expr::BinaryOp {
                op: Op::Sub,
                left: Box::new(Expr::Number(0.0)),
                right: Box::new(Expr::Number(5.0)),
            }
        );
    }

    #[test]
    fn test_parse_whitespace_ignored() {
        assert_eq!(parse("= 1 +\t2").unwrap(), parse("=1+2").unwrap());
    }

    // =========================================================================
    // Function calls
    // =========================================================================

    #[test]
    fn test_parse_function_call() {
        assert_eq!(
            parse("=SUM(A1,B2)").unwrap(),
            Expr::Function {
                func: Func::Sum,
                args: vec![Expr::CellRef(c("A1")), Expr::CellRef(c("B2"))],
            }
        );
    }

    #[test]
    fn test_parse_function_no_args() {
        assert_eq!(
            parse("=SUM()").unwrap(),
            Expr::Function {
                func: Func::Sum,
                args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_function_with_range_arg() {
        assert_eq!(
            parse("=SUM(A1:A3)").unwrap(),
            Expr::Function {
                func: Func::Sum,
                args: vec![Expr::Range {
                    start: c("A1"),
                    end: c("A3"),
                }],
            }
        );
    }

    #[test]
    fn test_parse_nested_function() {
        assert_eq!(
            parse("=SUM(MUL(A1:A2),3)").unwrap(),
            Expr::Function {
                func: Func::Sum,
                args: vec![
                    Expr::Function {
                        func: Func::Mul,
                        args: vec![Expr::Range {
                            start: c("A1"),
                            end: c("A2"),
                        }],
                    },
                    Expr::Number(3.0),
                ],
            }
        );
    }

    // =========================================================================
    // Rejections
    // =========================================================================

    #[test]
    fn test_parse_requires_equals() {
        assert!(parse("1+2").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_empty_formula() {
        assert!(parse("=").is_err());
        assert!(parse("=  ").is_err());
    }

    #[test]
    fn test_parse_unknown_function_rejected() {
        let err = parse("=AVERAGE(A1)").unwrap_err();
        assert!(err.to_string().contains("unknown function"), "{}", err);
    }

    #[test]
    fn test_parse_lowercase_rejected() {
        assert!(parse("=sum(1)").is_err());
        assert!(parse("=a1").is_err());
    }

    #[test]
    fn test_parse_bare_identifier_rejected() {
        assert!(parse("=FOO").is_err());
        assert!(parse("=SUM").is_err());
    }

    #[test]
    fn test_parse_malformed_reference_rejected() {
        assert!(parse("=A1B").is_err());
        assert!(parse("=A0").is_err());
    }

    #[test]
    fn test_parse_trailing_input_rejected() {
        assert!(parse("=A1 B2").is_err());
        assert!(parse("=1 2").is_err());
    }

    #[test]
    fn test_parse_unterminated_string() {
        assert!(parse("=\"oops").is_err());
    }

    #[test]
    fn test_parse_missing_closing_paren() {
        assert!(parse("=SUM(1").is_err());
        assert!(parse("=(1+2").is_err());
    }

    #[test]
    fn test_parse_empty_argument_rejected() {
        assert!(parse("=SUM(1,,2)").is_err());
        assert!(parse("=SUM(1,)").is_err());
    }

    #[test]
    fn test_parse_bad_number() {
        assert!(parse("=1.2.3").is_err());
    }

    #[test]
    fn test_parse_unexpected_character() {
        assert!(parse("=2^3").is_err());
        assert!(parse("=1&2").is_err());
    }
}

// Formula parser - converts formula strings into an AST
// Supports: numbers, string literals, cell refs (A1, $A$1), ranges (A1:B5),
// function calls, arithmetic (+, -, *, /, ^) and comparisons (<, >, =, <=, >=, <>)

use super::FormulaError;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Boolean(bool),
    CellRef {
        row: usize,
        col: usize,
    },
    /// Rectangular range, corners as written (normalized at evaluation).
    Range {
        start_row: usize,
        start_col: usize,
        end_row: usize,
        end_col: usize,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Neg(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Gt,
    Eq,
    LtEq,
    GtEq,
    NotEq,
}

/// Parse a formula string (leading `=` required) into an AST.
pub fn parse(formula: &str) -> Result<Expr, FormulaError> {
    let formula = formula.trim();
    let input = formula.strip_prefix('=').ok_or(FormulaError::MissingEquals)?;
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let (expr, pos) = parse_comparison(&tokens, 0)?;
    if pos < tokens.len() {
        return Err(FormulaError::TrailingInput(format!("{:?}", tokens[pos])));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    StringLit(String),
    CellRef { row: usize, col: usize },
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Colon,
    Comma,
    Lt,
    Gt,
    Eq,
    LtEq,
    GtEq,
    NotEq,
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '^' => { tokens.push(Token::Caret); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            ':' => { tokens.push(Token::Colon); chars.next(); }
            ',' => { tokens.push(Token::Comma); chars.next(); }
            '=' => { tokens.push(Token::Eq); chars.next(); }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => { tokens.push(Token::LtEq); chars.next(); }
                    Some('>') => { tokens.push(Token::NotEq); chars.next(); }
                    _ => tokens.push(Token::Lt),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    tokens.push(Token::GtEq);
                    chars.next();
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        // "" inside a literal is an escaped quote
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            s.push('"');
                        }
                        Some('"') => break,
                        Some(ch) => s.push(ch),
                        None => return Err(FormulaError::UnterminatedString),
                    }
                }
                tokens.push(Token::StringLit(s));
            }
            'A'..='Z' | 'a'..='z' | '$' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' || ch == '.' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let upper = ident.to_uppercase();
                if let Some((row, col)) = try_parse_cell_ref(&upper) {
                    tokens.push(Token::CellRef { row, col });
                } else if upper.contains('$') {
                    return Err(FormulaError::InvalidReference(ident));
                } else {
                    tokens.push(Token::Ident(upper));
                }
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else if (d == 'e' || d == 'E') && !num_str.contains(['e', 'E']) {
                        num_str.push(d);
                        chars.next();
                        if let Some(&sign) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                num_str.push(sign);
                                chars.next();
                            }
                        }
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| FormulaError::InvalidNumber(num_str.clone()))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(FormulaError::UnexpectedChar(c)),
        }
    }

    Ok(tokens)
}

/// Cell reference with optional `$` anchors; returns 0-based (row, col).
fn try_parse_cell_ref(s: &str) -> Option<(usize, usize)> {
    let body = s.strip_prefix('$').unwrap_or(s);
    let letters_end = body.find(|c: char| !c.is_ascii_uppercase())?;
    if letters_end == 0 || letters_end > 3 {
        return None;
    }
    let (letters, rest) = body.split_at(letters_end);
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    let col = cellgrid_core::letters_to_col(letters)?;
    Some((row - 1, col))
}

fn binary(op: Op, left: Expr, right: Expr) -> Expr {
    Expr::BinaryOp { op, left: Box::new(left), right: Box::new(right) }
}

// Lowest precedence: comparison operators
fn parse_comparison(tokens: &[Token], pos: usize) -> Result<(Expr, usize), FormulaError> {
    let (mut left, mut pos) = parse_add_sub(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Lt => Op::Lt,
            Token::Gt => Op::Gt,
            Token::Eq => Op::Eq,
            Token::LtEq => Op::LtEq,
            Token::GtEq => Op::GtEq,
            Token::NotEq => Op::NotEq,
            _ => break,
        };
        let (right, new_pos) = parse_add_sub(tokens, pos + 1)?;
        left = binary(op, left, right);
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), FormulaError> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = binary(op, left, right);
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), FormulaError> {
    let (mut left, mut pos) = parse_power(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            _ => break,
        };
        let (right, new_pos) = parse_power(tokens, pos + 1)?;
        left = binary(op, left, right);
        pos = new_pos;
    }

    Ok((left, pos))
}

// Right-associative
fn parse_power(tokens: &[Token], pos: usize) -> Result<(Expr, usize), FormulaError> {
    let (base, pos) = parse_unary(tokens, pos)?;

    if let Some(Token::Caret) = tokens.get(pos) {
        let (exponent, new_pos) = parse_power(tokens, pos + 1)?;
        return Ok((binary(Op::Pow, base, exponent), new_pos));
    }

    Ok((base, pos))
}

fn parse_unary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), FormulaError> {
    match tokens.get(pos) {
        Some(Token::Minus) => {
            let (inner, pos) = parse_unary(tokens, pos + 1)?;
            Ok((Expr::Neg(Box::new(inner)), pos))
        }
        Some(Token::Plus) => parse_unary(tokens, pos + 1),
        _ => parse_primary(tokens, pos),
    }
}

fn parse_primary(tokens: &[Token], pos: usize) -> Result<(Expr, usize), FormulaError> {
    let token = tokens.get(pos).ok_or(FormulaError::UnexpectedEnd)?;

    match token {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::StringLit(s) => Ok((Expr::Text(s.clone()), pos + 1)),
        Token::CellRef { row, col } => {
            if let (Some(Token::Colon), Some(Token::CellRef { row: end_row, col: end_col })) =
                (tokens.get(pos + 1), tokens.get(pos + 2))
            {
                return Ok((
                    Expr::Range { start_row: *row, start_col: *col, end_row: *end_row, end_col: *end_col },
                    pos + 3,
                ));
            }
            Ok((Expr::CellRef { row: *row, col: *col }, pos + 1))
        }
        Token::Ident(name) => {
            if tokens.get(pos + 1) == Some(&Token::LParen) {
                return parse_call(name, tokens, pos + 2);
            }
            match name.as_str() {
                "TRUE" => Ok((Expr::Boolean(true), pos + 1)),
                "FALSE" => Ok((Expr::Boolean(false), pos + 1)),
                _ => Err(FormulaError::UnknownName(name.clone())),
            }
        }
        Token::LParen => {
            let (expr, pos) = parse_comparison(tokens, pos + 1)?;
            match tokens.get(pos) {
                Some(Token::RParen) => Ok((expr, pos + 1)),
                _ => Err(FormulaError::UnclosedParen),
            }
        }
        other => Err(FormulaError::UnexpectedToken(format!("{:?}", other))),
    }
}

// Arguments after `NAME(`; `pos` points past the open paren.
fn parse_call(name: &str, tokens: &[Token], mut pos: usize) -> Result<(Expr, usize), FormulaError> {
    let mut args = Vec::new();

    if tokens.get(pos) == Some(&Token::RParen) {
        return Ok((Expr::Function { name: name.to_string(), args }, pos + 1));
    }

    loop {
        let (arg, new_pos) = parse_comparison(tokens, pos)?;
        args.push(arg);
        pos = new_pos;
        match tokens.get(pos) {
            Some(Token::Comma) => pos += 1,
            Some(Token::RParen) => {
                pos += 1;
                break;
            }
            _ => return Err(FormulaError::UnclosedParen),
        }
    }

    Ok((Expr::Function { name: name.to_string(), args }, pos))
}

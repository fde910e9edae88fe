//! Evaluación de expresiones aritméticas para la prioridad "cálculo" del router.
//!
//! Sólo se aceptan dígitos, espacios en blanco y `+ - * / ( ) .`. Cualquier
//! otro carácter, un error de sintaxis o un resultado NaN/infinito hacen que
//! la estrategia no aplique y el router siga con la siguiente prioridad.
//!
//! Gramática (precedencia habitual, asociatividad por la izquierda):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | primary
//! primary:= number | '(' expr ')'
//! ```

use std::{iter::Peekable, str::Chars};

/// Prefijo de la respuesta del cálculo.
pub const RESULT_PREFIX: &str = "Kết quả của phép tính là: ";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || "+-*/().".contains(c)
}

/// Evalúa el mensaje. `None` cuando no es una expresión válida y finita.
pub fn evaluate(message: &str) -> Option<f64> {
    if !message.chars().all(is_allowed) {
        return None;
    }
    let tokens = tokenize(message)?;
    if tokens.is_empty() {
        return None;
    }
    let value = Parser::new(tokens).parse()?;
    value.is_finite().then_some(value)
}

/// Respuesta formateada, o `None` si el mensaje no es un cálculo.
pub fn solve(message: &str) -> Option<String> {
    evaluate(message).map(|value| format!("{RESULT_PREFIX}{}", format_number(value)))
}

/// Representación decimal más corta; `-0` se muestra como `0`.
///
/// Fuera de `[1e-6, 1e21)` se usa notación exponencial con el signo del
/// exponente explícito (`1e+21`, `1.5e-7`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let exponential = format!("{value:e}");
        return match exponential.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => exponential,
        };
    }
    value.to_string()
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut chars = input.chars().peekable();
    let mut tokens = Vec::new();
    // `++` y `--` pegados son operadores de incremento, no una suma de signos
    let mut previous: Option<char> = None;

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            previous = None;
            continue;
        }
        let token = match ch {
            '0'..='9' | '.' => Token::Number(read_number(&mut chars)?),
            '+' | '-' => {
                if previous == Some(ch) {
                    return None;
                }
                chars.next();
                if ch == '+' { Token::Plus } else { Token::Minus }
            }
            '*' => {
                chars.next();
                Token::Star
            }
            '/' => {
                chars.next();
                Token::Slash
            }
            '(' => {
                chars.next();
                Token::LParen
            }
            ')' => {
                chars.next();
                Token::RParen
            }
            _ => return None,
        };
        previous = Some(ch);
        tokens.push(token);
    }

    Some(tokens)
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> Option<f64> {
    let mut literal = String::new();
    let mut seen_dot = false;
    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' => literal.push(c),
            '.' if !seen_dot => {
                seen_dot = true;
                literal.push(c);
            }
            _ => break,
        }
        chars.next();
    }
    if literal == "." {
        return None;
    }
    literal.parse().ok()
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Toda la entrada debe consumirse.
    fn parse(mut self) -> Option<f64> {
        let value = self.parse_expr()?;
        (self.position == self.tokens.len()).then_some(value)
    }

    fn parse_expr(&mut self) -> Option<f64> {
        let mut value = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    fn parse_term(&mut self) -> Option<f64> {
        let mut value = self.parse_unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    value *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.advance();
                    value /= self.parse_unary()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    fn parse_unary(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Plus => {
                self.advance();
                self.parse_unary()
            }
            Token::Minus => {
                self.advance();
                self.parse_unary().map(|v| -v)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Number(n) => {
                self.advance();
                Some(n)
            }
            Token::LParen => {
                self.advance();
                let value = self.parse_expr()?;
                if self.peek()? != Token::RParen {
                    return None;
                }
                self.advance();
                Some(value)
            }
            _ => None,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }
}

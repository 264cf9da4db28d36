use super::poly::{Poly, MAX_DEGREE};
use super::MathError;

/// Combined nesting of parentheses, function calls, signs and powers
const MAX_DEPTH: usize = 128;
const MAX_INPUT_CHARS: usize = 4096;

const FUNCTIONS: &[&str] = &["sqrt", "sin", "cos", "tan", "ln", "log", "exp", "abs"];
const CONSTANTS: &[&str] = &["pi", "e"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, MathError> {
    if input.chars().count() > MAX_INPUT_CHARS {
        return Err(MathError::Parse("expression too long".to_string()));
    }
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // scientific notation only when an exponent actually follows
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let value = literal
                .parse::<f64>()
                .map_err(|_| MathError::Parse(format!("invalid number '{}'", literal)))?;
            tokens.push(Token::Num(value));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect::<String>().to_lowercase();
            if FUNCTIONS.contains(&word.as_str()) || CONSTANTS.contains(&word.as_str()) {
                tokens.push(Token::Ident(word));
            } else {
                // `xy` reads as the product of single-letter variables
                tokens.extend(word.chars().map(|ch| Token::Ident(ch.to_string())));
            }
        } else if "+-*/^%".contains(c) {
            tokens.push(Token::Op(c));
            i += 1;
        } else if c == '(' || c == '[' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' || c == ']' {
            tokens.push(Token::RParen);
            i += 1;
        } else {
            return Err(MathError::Parse(format!("unexpected character '{}'", c)));
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser producing a polynomial in at most one variable.
///
/// Grammar, loosest binding first:
/// ```text
/// expr  := term (('+' | '-') term)*
/// term  := unary (('*' | '/' | '%') unary | unary)*     juxtaposition multiplies
/// unary := ('+' | '-') unary | power
/// power := atom ('^' unary)?
/// atom  := number | constant | variable | function '(' expr ')' | '(' expr ')'
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    var: Option<String>,
}

impl Parser {
    pub fn new(input: &str, var: Option<String>) -> Result<Self, MathError> {
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
            depth: 0,
            var,
        })
    }

    /// The variable seen so far, shared across both sides of an equation
    pub fn var(&self) -> Option<&str> {
        self.var.as_deref()
    }

    pub fn into_var(self) -> Option<String> {
        self.var
    }

    pub fn parse(&mut self) -> Result<Poly, MathError> {
        if self.tokens.is_empty() {
            return Err(MathError::Parse("empty expression".to_string()));
        }
        let poly = self.expr()?;
        if let Some(token) = self.peek() {
            return Err(MathError::Parse(format!("unexpected {:?}", token)));
        }
        Ok(poly)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Runs one level of recursion, refusing to go deeper than `MAX_DEPTH`
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, MathError>,
    ) -> Result<T, MathError> {
        if self.depth >= MAX_DEPTH {
            return Err(MathError::Parse("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Poly, MathError> {
        let mut acc = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == '+' { &acc + &rhs } else { &acc - &rhs };
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<Poly, MathError> {
        let mut acc = self.unary()?;
        loop {
            match self.peek().cloned() {
                Some(Token::Op('*')) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    acc = bounded_product(&acc, &rhs)?;
                }
                Some(Token::Op('/')) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    acc = acc.checked_div(&rhs)?;
                }
                Some(Token::Op('%')) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    acc = match (acc.as_constant(), rhs.as_constant()) {
                        (Some(_), Some(d)) if d == 0.0 => return Err(MathError::DivisionByZero),
                        (Some(a), Some(d)) => Poly::constant(a % d),
                        _ => {
                            return Err(MathError::NonPolynomial(
                                "remainder of an expression containing the variable".to_string(),
                            ))
                        }
                    };
                }
                Some(Token::Num(_)) | Some(Token::Ident(_)) | Some(Token::LParen) => {
                    let rhs = self.power()?;
                    acc = bounded_product(&acc, &rhs)?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<Poly, MathError> {
        self.nested(Self::signed)
    }

    fn signed(&mut self) -> Result<Poly, MathError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-&self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Poly, MathError> {
        let base = self.atom()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return base.checked_pow(&exponent);
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Poly, MathError> {
        self.nested(Self::primary)
    }

    fn primary(&mut self) -> Result<Poly, MathError> {
        match self.next() {
            Some(Token::Num(value)) => Ok(Poly::constant(value)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(MathError::Parse("missing closing parenthesis".to_string())),
                }
            }
            Some(Token::Ident(name)) => self.ident(name),
            Some(token) => Err(MathError::Parse(format!("unexpected {:?}", token))),
            None => Err(MathError::Parse("unexpected end of expression".to_string())),
        }
    }

    fn ident(&mut self, name: String) -> Result<Poly, MathError> {
        match name.as_str() {
            "pi" => return Ok(Poly::constant(std::f64::consts::PI)),
            "e" => return Ok(Poly::constant(std::f64::consts::E)),
            _ => {}
        }

        if FUNCTIONS.contains(&name.as_str()) {
            let argument = self.atom()?;
            let value = argument.as_constant().ok_or_else(|| {
                MathError::NonPolynomial(format!("{}() of the variable", name))
            })?;
            let result = match name.as_str() {
                "sqrt" => value.sqrt(),
                "sin" => value.sin(),
                "cos" => value.cos(),
                "tan" => value.tan(),
                "ln" => value.ln(),
                "log" => value.log10(),
                "exp" => value.exp(),
                _ => value.abs(),
            };
            if !result.is_finite() {
                return Err(MathError::Undefined(format!("{}({})", name, value)));
            }
            return Ok(Poly::constant(result));
        }

        match &self.var {
            Some(existing) if *existing != name => Err(MathError::MultipleVariables(format!(
                "{} and {}",
                existing, name
            ))),
            Some(_) => Ok(Poly::variable()),
            None => {
                self.var = Some(name);
                Ok(Poly::variable())
            }
        }
    }
}

fn bounded_product(lhs: &Poly, rhs: &Poly) -> Result<Poly, MathError> {
    if lhs.degree() + rhs.degree() > MAX_DEGREE {
        return Err(MathError::Unsupported(format!(
            "polynomials above degree {}",
            MAX_DEGREE
        )));
    }
    Ok(lhs * rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Poly, MathError> {
        Parser::new(input, None)?.parse()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse("2+3*4").unwrap().as_constant(), Some(14.0));
        assert_eq!(parse("(2+3)*4").unwrap().as_constant(), Some(20.0));
        assert_eq!(parse("-2^2").unwrap().as_constant(), Some(-4.0));
        assert_eq!(parse("2^3^2").unwrap().as_constant(), Some(512.0));
        assert_eq!(parse("7 % 4").unwrap().as_constant(), Some(3.0));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse(".5 + 1.25").unwrap().as_constant(), Some(1.75));
        assert_eq!(parse("1e3").unwrap().as_constant(), Some(1000.0));
        // `2e` is two times Euler's number, not a malformed exponent
        let two_e = parse("2e").unwrap().as_constant().unwrap();
        assert!((two_e - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_multiplication() {
        let mut parser = Parser::new("2(x - 3)", None).unwrap();
        let poly = parser.parse().unwrap();
        assert_eq!(poly.coeffs(), &[-6.0, 2.0]);
        assert_eq!(parser.var(), Some("x"));

        assert_eq!(parse("(1+1)(2+2)").unwrap().as_constant(), Some(8.0));
        assert_eq!(parse("3x").unwrap().coeffs(), &[0.0, 3.0]);
    }

    #[test]
    fn test_functions() {
        assert_eq!(parse("sqrt(16)").unwrap().as_constant(), Some(4.0));
        assert!(matches!(parse("sqrt(x)"), Err(MathError::NonPolynomial(_))));
        assert!(matches!(parse("sqrt(-1)"), Err(MathError::Undefined(_))));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("xy"), Err(MathError::MultipleVariables(_))));
        assert!(matches!(parse("(1+2"), Err(MathError::Parse(_))));
        assert!(matches!(parse("1/0"), Err(MathError::DivisionByZero)));
        assert!(matches!(parse("2 $ 3"), Err(MathError::Parse(_))));
        assert!(matches!(parse(""), Err(MathError::Parse(_))));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("1+{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        // rejected by length before any recursion
        assert!(matches!(parse(&deep), Err(MathError::Parse(_))));

        let nested = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
        assert_eq!(
            parse(&nested),
            Err(MathError::Parse("expression nested too deeply".to_string()))
        );
        assert!(matches!(parse(&"-".repeat(2_000)), Err(MathError::Parse(_))));
        assert!(matches!(parse(&format!("{}2", "sqrt ".repeat(500))), Err(MathError::Parse(_))));

        let shallow = format!("{}2{}", "(".repeat(30), ")".repeat(30));
        assert_eq!(parse(&shallow).unwrap().as_constant(), Some(2.0));
    }

    #[test]
    fn test_long_operator_runs() {
        let sum = vec!["1"; 1_000].join("+");
        assert_eq!(parse(&sum).unwrap().as_constant(), Some(1000.0));

        let powers = vec!["2"; 1_000].join("^");
        assert!(matches!(parse(&powers), Err(MathError::Parse(_))));

        let product = vec!["x"; 200].join("*");
        assert!(matches!(parse(&product), Err(MathError::Unsupported(_))));
        assert!(matches!(parse(&"x".repeat(200)), Err(MathError::Unsupported(_))));
    }

    #[test]
    fn test_huge_exponent_of_the_variable() {
        assert!(matches!(
            parse("(x^2)^9223372036854775808"),
            Err(MathError::Unsupported(_))
        ));
    }
}

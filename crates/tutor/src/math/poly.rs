use std::ops::{Add, Mul, Neg, Sub};

use super::{format_coefficient, format_number, MathError};

const EPSILON: f64 = 1e-9;
pub const MAX_DEGREE: usize = 12;

/// A polynomial in a single variable; `coeffs[i]` is the coefficient of `x^i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    coeffs: Vec<f64>,
}

impl Poly {
    pub fn constant(value: f64) -> Self {
        Poly {
            coeffs: vec![value],
        }
        .trimmed()
    }

    /// The identity polynomial `x`
    pub fn variable() -> Self {
        Poly {
            coeffs: vec![0.0, 1.0],
        }
    }

    pub fn from_coeffs(coeffs: Vec<f64>) -> Self {
        Poly { coeffs }.trimmed()
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    fn trimmed(mut self) -> Self {
        while self.coeffs.len() > 1 && self.coeffs.last().is_some_and(|c| c.abs() < EPSILON) {
            self.coeffs.pop();
        }
        if self.coeffs.is_empty() {
            self.coeffs.push(0.0);
        }
        self
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_constant(&self) -> bool {
        self.degree() == 0
    }

    pub fn as_constant(&self) -> Option<f64> {
        self.is_constant().then(|| self.coeffs[0])
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    pub fn scale(&self, factor: f64) -> Poly {
        Poly::from_coeffs(self.coeffs.iter().map(|c| c * factor).collect())
    }

    pub fn checked_div(&self, divisor: &Poly) -> Result<Poly, MathError> {
        match divisor.as_constant() {
            Some(d) if d.abs() < EPSILON => Err(MathError::DivisionByZero),
            Some(d) => Ok(self.scale(1.0 / d)),
            None => Err(MathError::NonPolynomial(
                "division by an expression containing the variable".to_string(),
            )),
        }
    }

    pub fn checked_pow(&self, exponent: &Poly) -> Result<Poly, MathError> {
        let exp = exponent.as_constant().ok_or_else(|| {
            MathError::NonPolynomial("exponent containing the variable".to_string())
        })?;

        if let Some(base) = self.as_constant() {
            let value = base.powf(exp);
            if !value.is_finite() {
                return Err(MathError::Undefined(format!(
                    "{}^{}",
                    format_number(base),
                    format_number(exp)
                )));
            }
            return Ok(Poly::constant(value));
        }

        let is_whole = (exp - exp.round()).abs() < EPSILON && exp >= 0.0;
        if !is_whole {
            return Err(MathError::NonPolynomial(format!(
                "power {} of the variable",
                format_number(exp)
            )));
        }
        let too_large = || {
            MathError::Unsupported(format!("polynomials above degree {}", MAX_DEGREE))
        };
        if exp > MAX_DEGREE as f64 {
            return Err(too_large());
        }
        let n = exp.round() as usize;
        match self.degree().checked_mul(n) {
            Some(degree) if degree <= MAX_DEGREE => {}
            _ => return Err(too_large()),
        }
        let mut result = Poly::constant(1.0);
        for _ in 0..n {
            result = &result * self;
        }
        Ok(result)
    }

    pub fn derivative(&self) -> Poly {
        if self.is_constant() {
            return Poly::constant(0.0);
        }
        Poly::from_coeffs(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(power, c)| c * power as f64)
                .collect(),
        )
    }

    /// Antiderivative with a zero constant of integration
    pub fn integral(&self) -> Poly {
        let mut coeffs = vec![0.0];
        coeffs.extend(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(power, c)| c / (power as f64 + 1.0)),
        );
        Poly::from_coeffs(coeffs)
    }

    /// Real roots of a polynomial of degree one or two, in ascending order
    pub fn real_roots(&self) -> Result<Vec<f64>, MathError> {
        match self.degree() {
            1 => Ok(vec![-self.coeffs[0] / self.coeffs[1]]),
            2 => {
                let (c, b, a) = (self.coeffs[0], self.coeffs[1], self.coeffs[2]);
                let discriminant = b * b - 4.0 * a * c;
                if discriminant < -EPSILON {
                    Ok(Vec::new())
                } else if discriminant.abs() < EPSILON {
                    Ok(vec![-b / (2.0 * a)])
                } else {
                    let sqrt = discriminant.sqrt();
                    let mut roots = vec![(-b - sqrt) / (2.0 * a), (-b + sqrt) / (2.0 * a)];
                    roots.sort_by(|x, y| x.total_cmp(y));
                    Ok(roots)
                }
            }
            0 => Err(MathError::Unsupported(
                "equations without a variable".to_string(),
            )),
            degree => Err(MathError::Unsupported(format!(
                "solving equations of degree {}",
                degree
            ))),
        }
    }

    /// Render with the given variable name, highest power first, e.g. `3x^2 - 5x + 2`.
    pub fn display(&self, var: &str) -> String {
        let mut out = String::new();
        for (power, &c) in self.coeffs.iter().enumerate().rev() {
            if c.abs() < EPSILON && !(power == 0 && out.is_empty()) {
                continue;
            }
            let magnitude = c.abs();
            let coefficient = if power > 0 && (magnitude - 1.0).abs() < EPSILON {
                String::new()
            } else {
                format_coefficient(magnitude, power > 0)
            };
            let term = match power {
                0 => coefficient,
                1 => format!("{}{}", coefficient, var),
                _ => format!("{}{}^{}", coefficient, var, power),
            };

            if out.is_empty() {
                if c < 0.0 {
                    out.push('-');
                }
                out.push_str(&term);
            } else {
                out.push_str(if c < 0.0 { " - " } else { " + " });
                out.push_str(&term);
            }
        }
        out
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, other: &Poly) -> Poly {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| self.coeffs.get(i).unwrap_or(&0.0) + other.coeffs.get(i).unwrap_or(&0.0))
            .collect();
        Poly::from_coeffs(coeffs)
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, other: &Poly) -> Poly {
        self + &(-other)
    }
}

impl Mul for &Poly {
    type Output = Poly;

    fn mul(self, other: &Poly) -> Poly {
        let mut coeffs = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Poly::from_coeffs(coeffs)
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        self.scale(-1.0)
    }
}

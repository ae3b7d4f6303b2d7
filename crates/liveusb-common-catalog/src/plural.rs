// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `Plural-Forms` header parsing and evaluation.
//!
//! The plural expression is the C subset gettext accepts: the variable `n`,
//! unsigned integer literals, `! * / % + - < > <= >= == != && || ?:` and
//! parentheses.

use std::fmt;

/// Header value used when a catalog does not declare `Plural-Forms`.
pub const DEFAULT_PLURAL_FORMS: &str = "nplurals=2; plural=(n != 1);";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
	Or,
	And,
	Eq,
	Ne,
	Lt,
	Gt,
	Le,
	Ge,
	Add,
	Sub,
	Mul,
	Div,
	Rem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
	N,
	Num(u64),
	Not(Box<Expr>),
	Binary(BinOp, Box<Expr>, Box<Expr>),
	Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
	fn eval(&self, n: u64) -> u64 {
		match self {
			Expr::N => n,
			Expr::Num(v) => *v,
			Expr::Not(e) => u64::from(e.eval(n) == 0),
			Expr::Ternary(cond, then, otherwise) => {
				if cond.eval(n) != 0 {
					then.eval(n)
				} else {
					otherwise.eval(n)
				}
			}
			Expr::Binary(op, lhs, rhs) => {
				let l = lhs.eval(n);
				// && and || short-circuit like C
				match op {
					BinOp::Or => return u64::from(l != 0 || rhs.eval(n) != 0),
					BinOp::And => return u64::from(l != 0 && rhs.eval(n) != 0),
					_ => {}
				}
				let r = rhs.eval(n);
				match op {
					BinOp::Eq => u64::from(l == r),
					BinOp::Ne => u64::from(l != r),
					BinOp::Lt => u64::from(l < r),
					BinOp::Gt => u64::from(l > r),
					BinOp::Le => u64::from(l <= r),
					BinOp::Ge => u64::from(l >= r),
					BinOp::Add => l.wrapping_add(r),
					BinOp::Sub => l.wrapping_sub(r),
					BinOp::Mul => l.wrapping_mul(r),
					BinOp::Div => l.checked_div(r).unwrap_or(0),
					BinOp::Rem => l.checked_rem(r).unwrap_or(0),
					BinOp::Or | BinOp::And => unreachable!(),
				}
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	N,
	Num(u64),
	Op(&'static str),
	LParen,
	RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
	const OPERATORS: &[&str] = &[
		"||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!", "?", ":",
	];

	let mut tokens = Vec::new();
	let mut rest = expr.trim_start();
	while !rest.is_empty() {
		if let Some(tail) = rest.strip_prefix('(') {
			tokens.push(Token::LParen);
			rest = tail;
		} else if let Some(tail) = rest.strip_prefix(')') {
			tokens.push(Token::RParen);
			rest = tail;
		} else if let Some(tail) = rest.strip_prefix('n') {
			tokens.push(Token::N);
			rest = tail;
		} else if rest.starts_with(|c: char| c.is_ascii_digit()) {
			let len = rest.bytes().take_while(u8::is_ascii_digit).count();
			let value = rest[..len]
				.parse()
				.map_err(|_| format!("number out of range: {}", &rest[..len]))?;
			tokens.push(Token::Num(value));
			rest = &rest[len..];
		} else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
			tokens.push(Token::Op(op));
			rest = &rest[op.len()..];
		} else {
			let bad = rest.chars().next().unwrap_or(' ');
			return Err(format!("unexpected character '{bad}' in plural expression"));
		}
		rest = rest.trim_start();
	}
	Ok(tokens)
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
}

impl Parser {
	fn peek_op(&self) -> Option<&'static str> {
		match self.tokens.get(self.pos) {
			Some(Token::Op(op)) => Some(op),
			_ => None,
		}
	}

	fn expect_op(&mut self, op: &str) -> Result<(), String> {
		if self.peek_op() == Some(op) {
			self.pos += 1;
			Ok(())
		} else {
			Err(format!("expected '{op}' in plural expression"))
		}
	}

	fn ternary(&mut self) -> Result<Expr, String> {
		let cond = self.binary(0)?;
		if self.peek_op() == Some("?") {
			self.pos += 1;
			let then = self.ternary()?;
			self.expect_op(":")?;
			let otherwise = self.ternary()?;
			return Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)));
		}
		Ok(cond)
	}

	/// Precedence climbing over the binary operator levels.
	fn binary(&mut self, level: usize) -> Result<Expr, String> {
		const LEVELS: &[&[(&str, BinOp)]] = &[
			&[("||", BinOp::Or)],
			&[("&&", BinOp::And)],
			&[("==", BinOp::Eq), ("!=", BinOp::Ne)],
			&[("<=", BinOp::Le), (">=", BinOp::Ge), ("<", BinOp::Lt), (">", BinOp::Gt)],
			&[("+", BinOp::Add), ("-", BinOp::Sub)],
			&[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Rem)],
		];

		if level == LEVELS.len() {
			return self.unary();
		}

		let mut lhs = self.binary(level + 1)?;
		while let Some(op) = self.peek_op() {
			let Some((_, bin_op)) = LEVELS[level].iter().find(|(sym, _)| *sym == op) else {
				break;
			};
			self.pos += 1;
			let rhs = self.binary(level + 1)?;
			lhs = Expr::Binary(*bin_op, Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn unary(&mut self) -> Result<Expr, String> {
		if self.peek_op() == Some("!") {
			self.pos += 1;
			return Ok(Expr::Not(Box::new(self.unary()?)));
		}
		self.primary()
	}

	fn primary(&mut self) -> Result<Expr, String> {
		let token = self
			.tokens
			.get(self.pos)
			.cloned()
			.ok_or_else(|| "unexpected end of plural expression".to_string())?;
		self.pos += 1;
		match token {
			Token::N => Ok(Expr::N),
			Token::Num(v) => Ok(Expr::Num(v)),
			Token::LParen => {
				let inner = self.ternary()?;
				match self.tokens.get(self.pos) {
					Some(Token::RParen) => {
						self.pos += 1;
						Ok(inner)
					}
					_ => Err("missing ')' in plural expression".to_string()),
				}
			}
			Token::RParen => Err("unexpected ')' in plural expression".to_string()),
			Token::Op(op) => Err(format!("unexpected '{op}' in plural expression")),
		}
	}
}

fn parse_expr(text: &str) -> Result<Expr, String> {
	let mut parser = Parser {
		tokens: tokenize(text)?,
		pos: 0,
	};
	if parser.tokens.is_empty() {
		return Err("empty plural expression".to_string());
	}
	let expr = parser.ternary()?;
	if parser.pos != parser.tokens.len() {
		return Err("trailing tokens in plural expression".to_string());
	}
	Ok(expr)
}

/// Parsed `Plural-Forms` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralForms {
	nplurals: usize,
	expr: Expr,
	raw: String,
}

impl PluralForms {
	/// Parse a header value such as `nplurals=2; plural=(n != 1);`.
	pub fn parse(raw: &str) -> Result<Self, String> {
		let mut nplurals = None;
		let mut plural = None;

		for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
			let (key, value) = part
				.split_once('=')
				.ok_or_else(|| format!("expected key=value in Plural-Forms, got '{part}'"))?;
			match key.trim() {
				"nplurals" => {
					let n: usize = value
						.trim()
						.parse()
						.map_err(|_| format!("invalid nplurals '{}'", value.trim()))?;
					if n == 0 {
						return Err("nplurals must be at least 1".to_string());
					}
					nplurals = Some(n);
				}
				"plural" => plural = Some(parse_expr(value)?),
				other => return Err(format!("unknown Plural-Forms field '{other}'")),
			}
		}

		Ok(Self {
			nplurals: nplurals.ok_or("Plural-Forms is missing nplurals")?,
			expr: plural.ok_or("Plural-Forms is missing plural")?,
			raw: raw.trim().to_string(),
		})
	}

	pub fn nplurals(&self) -> usize {
		self.nplurals
	}

	/// Form index for `n`.
	///
	/// An out-of-range result selects form 0, as gettext does.
	pub fn index(&self, n: u64) -> usize {
		usize::try_from(self.expr.eval(n))
			.ok()
			.filter(|i| *i < self.nplurals)
			.unwrap_or(0)
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}
}

impl Default for PluralForms {
	fn default() -> Self {
		Self {
			nplurals: 2,
			expr: Expr::Binary(BinOp::Ne, Box::new(Expr::N), Box::new(Expr::Num(1))),
			raw: DEFAULT_PLURAL_FORMS.to_string(),
		}
	}
}

impl fmt::Display for PluralForms {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const POLISH: &str =
		"nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);";
	const RUSSIAN: &str = "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);";
	const ARABIC: &str = "nplurals=6; plural=(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5);";

	#[test]
	fn test_default_is_germanic() {
		let forms = PluralForms::default();
		assert_eq!(forms.nplurals(), 2);
		assert_eq!(forms.index(0), 1);
		assert_eq!(forms.index(1), 0);
		assert_eq!(forms.index(2), 1);
		assert_eq!(forms, PluralForms::parse(DEFAULT_PLURAL_FORMS).unwrap());
	}

	#[test]
	fn test_french() {
		let forms = PluralForms::parse("nplurals=2; plural=(n > 1);").unwrap();
		assert_eq!(forms.index(0), 0);
		assert_eq!(forms.index(1), 0);
		assert_eq!(forms.index(2), 1);
	}

	#[test]
	fn test_polish() {
		let forms = PluralForms::parse(POLISH).unwrap();
		assert_eq!(forms.nplurals(), 3);
		assert_eq!(forms.index(1), 0);
		assert_eq!(forms.index(2), 1);
		assert_eq!(forms.index(4), 1);
		assert_eq!(forms.index(5), 2);
		assert_eq!(forms.index(12), 2);
		assert_eq!(forms.index(22), 1);
	}

	#[test]
	fn test_russian() {
		let forms = PluralForms::parse(RUSSIAN).unwrap();
		assert_eq!(forms.index(1), 0);
		assert_eq!(forms.index(21), 0);
		assert_eq!(forms.index(11), 2);
		assert_eq!(forms.index(3), 1);
		assert_eq!(forms.index(25), 2);
	}

	#[test]
	fn test_arabic() {
		let forms = PluralForms::parse(ARABIC).unwrap();
		let indices: Vec<usize> = [0, 1, 2, 3, 11, 100, 102].iter().map(|n| forms.index(*n)).collect();
		assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 5]);
	}

	#[test]
	fn test_single_form_languages() {
		let forms = PluralForms::parse("nplurals=1; plural=0;").unwrap();
		assert_eq!(forms.index(0), 0);
		assert_eq!(forms.index(7), 0);
	}

	#[test]
	fn test_out_of_range_index_selects_first_form() {
		let forms = PluralForms::parse("nplurals=2; plural=n;").unwrap();
		assert_eq!(forms.index(1), 1);
		assert_eq!(forms.index(5), 0);
	}

	#[test]
	fn test_division_by_zero_does_not_panic() {
		let forms = PluralForms::parse("nplurals=2; plural=(n / 0);").unwrap();
		assert_eq!(forms.index(3), 0);
	}

	#[test]
	fn test_invalid_values() {
		assert!(PluralForms::parse("nplurals=2;").is_err());
		assert!(PluralForms::parse("plural=(n != 1);").is_err());
		assert!(PluralForms::parse("nplurals=0; plural=0;").is_err());
		assert!(PluralForms::parse("nplurals=2; plural=(n != 1;").is_err());
		assert!(PluralForms::parse("nplurals=2; plural=n ? 1;").is_err());
		assert!(PluralForms::parse("nplurals=2; plural=x;").is_err());
		assert!(PluralForms::parse("nplurals=two; plural=0;").is_err());
	}

	proptest! {
		/// The selected index is always a valid form.
		#[test]
		fn index_is_always_in_range(n in any::<u64>()) {
			for raw in [POLISH, RUSSIAN, ARABIC, DEFAULT_PLURAL_FORMS] {
				let forms = PluralForms::parse(raw).unwrap();
				prop_assert!(forms.index(n) < forms.nplurals());
			}
		}
	}
}

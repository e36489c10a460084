//! Formula parser for R-style model formulas
//!
//! Supported syntax:
//! - Response variables: `y ~ x1 + x2`
//! - Intercept control: `y ~ 0 + x1`, `y ~ x1 - 1`, `y ~ 1`
//! - One random intercept: `y ~ condition + (1 | country)`
//!
//! Interactions, function calls and random slopes are recognised and
//! rejected with `FormulaError::Unsupported`.

use crate::formula::error::{FormulaError, FormulaResult};
use crate::formula::{Formula, Term};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Plus,
    Minus,
}

/// Formula parser
pub struct FormulaParser<'a> {
    chars: Peekable<Chars<'a>>,
    original: String,
    position: usize,
}

impl<'a> FormulaParser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            original: input.to_string(),
            position: 0,
        }
    }

    /// Parse a formula
    pub fn parse(formula: &str) -> FormulaResult<Formula> {
        let mut parser = FormulaParser::new(formula);
        parser.parse_formula()
    }

    /// Parse the entire formula
    fn parse_formula(&mut self) -> FormulaResult<Formula> {
        self.skip_whitespace();

        if self.chars.peek().is_none() {
            return Err(FormulaError::syntax(self.position, "Empty formula"));
        }

        let response = self.parse_response()?;
        self.expect('~')?;
        let (has_intercept, terms) = self.parse_rhs()?;

        self.skip_whitespace();
        if self.chars.peek().is_some() {
            let remaining: String = self.chars.clone().collect();
            return Err(FormulaError::syntax_with_context(
                self.position,
                "Trailing characters after formula",
                format!("Unexpected: '{}'", remaining),
            ));
        }

        Ok(Formula {
            response,
            terms,
            has_intercept,
            original: self.original.clone(),
        })
    }

    /// Parse response variable (left side of ~)
    fn parse_response(&mut self) -> FormulaResult<Option<String>> {
        self.skip_whitespace();

        if self.peek_char() == Some('~') {
            return Ok(None);
        }

        let ident = self.parse_identifier()?;

        self.skip_whitespace();
        if self.peek_char() == Some('~') {
            Ok(Some(ident))
        } else {
            Err(FormulaError::syntax_with_context(
                self.position,
                "Expected '~' after response variable",
                format!("Found '{}' instead", self.peek_char().unwrap_or(' ')),
            ))
        }
    }

    /// Parse right-hand side of formula
    fn parse_rhs(&mut self) -> FormulaResult<(bool, Vec<Term>)> {
        let mut has_intercept = true;
        let mut terms: Vec<Term> = Vec::new();

        self.skip_whitespace();
        let mut sign = Sign::Plus;
        if self.peek_char() == Some('-') {
            self.advance();
            sign = Sign::Minus;
        }

        loop {
            self.skip_whitespace();
            let start = self.position;

            match self.peek_char() {
                None => return Err(FormulaError::syntax(self.position, "Expected term")),
                Some('(') => {
                    if sign == Sign::Minus {
                        return Err(FormulaError::Unsupported {
                            construct: "removal of a random term".to_string(),
                            position: start,
                        });
                    }
                    let term = self.parse_random_intercept()?;
                    if terms.iter().any(Term::is_random) {
                        return Err(FormulaError::Unsupported {
                            construct: "more than one random effect".to_string(),
                            position: start,
                        });
                    }
                    terms.push(term);
                }
                Some(c) if is_identifier_char(c) => {
                    let ident = self.parse_identifier()?;
                    match ident.as_str() {
                        "0" => has_intercept = sign == Sign::Minus,
                        "1" => has_intercept = sign == Sign::Plus,
                        _ if ident.chars().all(|c| c.is_ascii_digit()) => {
                            return Err(FormulaError::syntax(
                                start,
                                format!("Unexpected numeric term '{}'", ident),
                            ));
                        }
                        _ => {
                            self.skip_whitespace();
                            match self.peek_char() {
                                Some('(') => {
                                    return Err(FormulaError::Unsupported {
                                        construct: format!("function call {}()", ident),
                                        position: start,
                                    });
                                }
                                Some(op @ (':' | '*' | '^' | '/')) => {
                                    return Err(FormulaError::Unsupported {
                                        construct: format!("'{}' operator", op),
                                        position: self.position,
                                    });
                                }
                                _ => {}
                            }
                            if sign == Sign::Minus {
                                return Err(FormulaError::Unsupported {
                                    construct: format!("removal of term '{}'", ident),
                                    position: start,
                                });
                            }
                            let term = Term::Variable(ident);
                            if !terms.contains(&term) {
                                terms.push(term);
                            }
                        }
                    }
                }
                Some(c) => {
                    return Err(FormulaError::syntax(
                        self.position,
                        format!("Unexpected character '{}'", c),
                    ));
                }
            }

            self.skip_whitespace();
            match self.peek_char() {
                Some('+') => {
                    self.advance();
                    sign = Sign::Plus;
                }
                Some('-') => {
                    self.advance();
                    sign = Sign::Minus;
                }
                _ => break,
            }
        }

        Ok((has_intercept, terms))
    }

    /// Parse `(1 | group)`
    fn parse_random_intercept(&mut self) -> FormulaResult<Term> {
        let start = self.position;
        self.expect('(')?;
        self.skip_whitespace();

        let effect = self.parse_identifier()?;
        if effect != "1" {
            return Err(FormulaError::Unsupported {
                construct: format!("random slope '{}'", effect),
                position: start,
            });
        }

        self.expect('|')?;
        self.skip_whitespace();
        let group = self.parse_identifier()?;
        self.expect(')')?;

        Ok(Term::RandomIntercept { group })
    }

    /// Parse an identifier (column name or 0/1)
    fn parse_identifier(&mut self) -> FormulaResult<String> {
        self.skip_whitespace();
        let mut ident = String::new();

        while let Some(&c) = self.chars.peek() {
            if is_identifier_char(c) {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if ident.is_empty() {
            return Err(FormulaError::syntax_with_context(
                self.position,
                "Expected identifier",
                format!("Found '{}' instead", self.peek_char().unwrap_or(' ')),
            ));
        }

        Ok(ident)
    }

    fn expect(&mut self, expected: char) -> FormulaResult<()> {
        self.skip_whitespace();
        match self.peek_char() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            found => Err(FormulaError::syntax_with_context(
                self.position,
                format!("Expected '{}'", expected),
                match found {
                    Some(c) => format!("Found '{}' instead", c),
                    None => "Found end of input".to_string(),
                },
            )),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) {
        if self.chars.next().is_some() {
            self.position += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

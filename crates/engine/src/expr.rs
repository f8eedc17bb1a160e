//! Probe expressions - the transform language of the in-memory host.
//!
//! ```text
//! value                                   identity: group by raw cell value
//! postcode ~ /^[A-Z]{1,2}[0-9]/           regex rule
//! number : number ; blank : blank         builtin rules, `;`-separated
//! ```
//!
//! Rules are tried in order against the trimmed cell. The first match yields
//! its label; no match yields the error sentinel.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use colcheck_core::{HostError, ERROR_SENTINEL};

/// Builtin probes usable as `label : probe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Number,
    Integer,
    Date,
    Blank,
    Any,
}

impl Builtin {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "number" => Some(Builtin::Number),
            "integer" => Some(Builtin::Integer),
            "date" => Some(Builtin::Date),
            "blank" => Some(Builtin::Blank),
            "any" => Some(Builtin::Any),
            _ => None,
        }
    }

    fn matches(self, value: &str) -> bool {
        match self {
            Builtin::Number => !value.is_empty() && value.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false),
            Builtin::Integer => value.parse::<i64>().is_ok(),
            Builtin::Date => parse_date(value).is_some(),
            Builtin::Blank => value.is_empty(),
            Builtin::Any => true,
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[derive(Debug, Clone)]
enum Matcher {
    Pattern(Regex),
    Builtin(Builtin),
}

/// One `label ~ /pattern/` or `label : probe` clause.
#[derive(Debug, Clone)]
pub struct Rule {
    label: String,
    matcher: Matcher,
}

/// A compiled transform expression.
#[derive(Debug, Clone)]
pub enum Probe {
    Identity,
    Rules(Vec<Rule>),
}

impl Probe {
    pub fn compile(source: &str) -> Result<Probe, HostError> {
        let trimmed = source.trim();
        if trimmed == "value" {
            return Ok(Probe::Identity);
        }
        Parser::new(trimmed).rules().map(Probe::Rules)
    }

    /// Transformed value for one raw cell.
    pub fn eval(&self, raw: &str) -> String {
        match self {
            Probe::Identity => raw.to_string(),
            Probe::Rules(rules) => {
                let value = raw.trim();
                rules
                    .iter()
                    .find(|rule| match &rule.matcher {
                        Matcher::Pattern(re) => re.is_match(value),
                        Matcher::Builtin(b) => b.matches(value),
                    })
                    .map(|rule| rule.label.clone())
                    .unwrap_or_else(|| ERROR_SENTINEL.to_string())
            }
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn err(&self, msg: impl Into<String>) -> HostError {
        HostError::Expression(format!("{} at offset {} in `{}`", msg.into(), self.pos, self.src))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn ident(&mut self) -> Result<String, HostError> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-' || c == '.') {
            self.bump();
        }
        if start == self.pos {
            return Err(self.err("expected a label"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    /// Body of `/.../`; `\/` stands for a literal slash.
    fn pattern(&mut self) -> Result<String, HostError> {
        self.skip_ws();
        if self.bump() != Some('/') {
            return Err(self.err("expected `/` to open a pattern"));
        }
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated pattern")),
                Some('/') => return Ok(out),
                Some('\\') if self.peek() == Some('/') => {
                    self.bump();
                    out.push('/');
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn rule(&mut self) -> Result<Rule, HostError> {
        let label = self.ident()?;
        self.skip_ws();
        let matcher = match self.bump() {
            Some('~') => {
                let body = self.pattern()?;
                let re = Regex::new(&body).map_err(|e| self.err(format!("invalid regex: {}", e)))?;
                Matcher::Pattern(re)
            }
            Some(':') => {
                let name = self.ident()?;
                let builtin = Builtin::parse(&name).ok_or_else(|| self.err(format!("unknown probe `{}`", name)))?;
                Matcher::Builtin(builtin)
            }
            _ => return Err(self.err("expected `~` or `:` after label")),
        };
        Ok(Rule { label, matcher })
    }

    fn rules(&mut self) -> Result<Vec<Rule>, HostError> {
        let mut rules = vec![self.rule()?];
        loop {
            self.skip_ws();
            match self.bump() {
                None => return Ok(rules),
                Some(';') => {
                    self.skip_ws();
                    // Trailing separator is allowed.
                    if self.peek().is_none() {
                        return Ok(rules);
                    }
                    rules.push(self.rule()?);
                }
                Some(c) => return Err(self.err(format!("unexpected `{}`", c))),
            }
        }
    }
}

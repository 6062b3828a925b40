//! Declarative validation of JSON request bodies.
//!
//! An [`ObjectRules`] set is an ordered list of [`FieldRule`]s. Evaluation
//! stops at the first violation; fields are checked in declaration order,
//! constraints in the order they were added, and undeclared keys last.
//! Violation messages are user facing and keep a stable wording.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("\"value\" must be of type object")]
    NotAnObject,
    #[error("\"{0}\" is required")]
    Required(&'static str),
    #[error("\"{0}\" must be a string")]
    NotAString(&'static str),
    #[error("\"{0}\" is not allowed to be empty")]
    Empty(&'static str),
    #[error("\"{field}\" length must be at least {min} characters long")]
    TooShort { field: &'static str, min: usize },
    #[error("\"{field}\" length must be less than or equal to {max} characters long")]
    TooLong { field: &'static str, max: usize },
    #[error("\"{field}\" length must be {length} characters long")]
    WrongLength { field: &'static str, length: usize },
    #[error("\"{0}\" must only contain hexadecimal characters")]
    NotHex(&'static str),
    #[error("\"{0}\" must be a number")]
    NotANumber(&'static str),
    #[error("\"{0}\" must be an integer")]
    NotAnInteger(&'static str),
    #[error("\"{field}\" must be greater than or equal to {min}")]
    BelowMinimum { field: &'static str, min: i64 },
    #[error("\"{field}\" must be less than or equal to {max}")]
    AboveMaximum { field: &'static str, max: i64 },
    #[error("\"{0}\" is not allowed")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Number,
}

#[derive(Debug, Clone, Copy)]
enum Constraint {
    MinLength(usize),
    MaxLength(usize),
    Length(usize),
    Hex,
    Integer,
    Min(i64),
    Max(i64),
}

/// Rule for a single field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    kind: Kind,
    required: bool,
    constraints: Vec<Constraint>,
}

impl FieldRule {
    pub fn text(name: &'static str) -> Self {
        Self::of(name, Kind::Text)
    }

    /// Accepts JSON numbers and strings holding a decimal number.
    pub fn number(name: &'static str) -> Self {
        Self::of(name, Kind::Number)
    }

    fn of(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            required: false,
            constraints: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min_length(self, min: usize) -> Self {
        self.constrain(Kind::Text, Constraint::MinLength(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.constrain(Kind::Text, Constraint::MaxLength(max))
    }

    pub fn length(self, length: usize) -> Self {
        self.constrain(Kind::Text, Constraint::Length(length))
    }

    pub fn hex(self) -> Self {
        self.constrain(Kind::Text, Constraint::Hex)
    }

    pub fn integer(self) -> Self {
        self.constrain(Kind::Number, Constraint::Integer)
    }

    pub fn min(self, min: i64) -> Self {
        self.constrain(Kind::Number, Constraint::Min(min))
    }

    pub fn max(self, max: i64) -> Self {
        self.constrain(Kind::Number, Constraint::Max(max))
    }

    fn constrain(mut self, kind: Kind, constraint: Constraint) -> Self {
        debug_assert_eq!(self.kind, kind, "constraint does not apply to this field kind");
        self.constraints.push(constraint);
        self
    }

    /// Check a present value, returning it in normalized form.
    pub fn check(&self, value: &Value) -> Result<Value, Violation> {
        match self.kind {
            Kind::Text => self.check_text(value),
            Kind::Number => self.check_number(value),
        }
    }

    fn check_text(&self, value: &Value) -> Result<Value, Violation> {
        let text = value.as_str().ok_or(Violation::NotAString(self.name))?;
        if text.is_empty() {
            return Err(Violation::Empty(self.name));
        }

        // Lengths are measured in UTF-16 code units.
        let units = text.encode_utf16().count();
        for constraint in &self.constraints {
            match *constraint {
                Constraint::MinLength(min) if units < min => {
                    return Err(Violation::TooShort {
                        field: self.name,
                        min,
                    })
                }
                Constraint::MaxLength(max) if units > max => {
                    return Err(Violation::TooLong {
                        field: self.name,
                        max,
                    })
                }
                Constraint::Length(length) if units != length => {
                    return Err(Violation::WrongLength {
                        field: self.name,
                        length,
                    })
                }
                Constraint::Hex if !text.chars().all(|c| c.is_ascii_hexdigit()) => {
                    return Err(Violation::NotHex(self.name))
                }
                _ => {}
            }
        }

        Ok(Value::String(text.to_string()))
    }

    fn check_number(&self, value: &Value) -> Result<Value, Violation> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .ok_or(Violation::NotANumber(self.name))?;

        for constraint in &self.constraints {
            match *constraint {
                Constraint::Integer if number.fract() != 0.0 => {
                    return Err(Violation::NotAnInteger(self.name))
                }
                Constraint::Min(min) if number < min as f64 => {
                    return Err(Violation::BelowMinimum {
                        field: self.name,
                        min,
                    })
                }
                Constraint::Max(max) if number > max as f64 => {
                    return Err(Violation::AboveMaximum {
                        field: self.name,
                        max,
                    })
                }
                _ => {}
            }
        }

        if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
            Ok(Value::from(number as i64))
        } else {
            Ok(Value::from(number))
        }
    }
}

/// Ordered rule set for a JSON object. Undeclared keys are rejected.
#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    fields: Vec<FieldRule>,
}

impl ObjectRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Validate `value`, returning the normalized object or the first violation.
    pub fn validate(&self, value: &Value) -> Result<Map<String, Value>, Violation> {
        let object = value.as_object().ok_or(Violation::NotAnObject)?;
        let mut normalized = Map::new();

        for rule in &self.fields {
            match object.get(rule.name) {
                Some(field) => {
                    normalized.insert(rule.name.to_string(), rule.check(field)?);
                }
                None if rule.required => return Err(Violation::Required(rule.name)),
                None => {}
            }
        }

        if let Some(unknown) = object
            .keys()
            .find(|key| !self.fields.iter().any(|rule| rule.name == key.as_str()))
        {
            return Err(Violation::Unknown(unknown.clone()));
        }

        Ok(normalized)
    }
}

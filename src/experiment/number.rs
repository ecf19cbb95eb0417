//! Bounded numbers, as found in log files.

use nom::{
    character::complete::{digit1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    number::complete::double,
    sequence::pair,
    IResult,
};

/// A parsed value of some dimension
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseNumberError {
    #[error("{text:?} is not {expected}")]
    Syntax { text: String, expected: &'static str },
    #[error("{value} is outside of [{min}, {max}]")]
    OutOfRange {
        value: Number,
        min: Number,
        max: Number,
    },
    #[error("{0} is not a finite number")]
    NotFinite(String),
}

/// Parses numbers of one type, accepting only values in an inclusive range
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberParser {
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64 },
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse)(input)
}

impl NumberParser {
    pub const NON_NEGATIVE_INTEGER: Self = NumberParser::Integer { min: 0, max: i64::MAX };
    pub const POSITIVE_INTEGER: Self = NumberParser::Integer { min: 1, max: i64::MAX };
    pub const NON_NEGATIVE_FLOAT: Self = NumberParser::Float { min: 0.0, max: f64::MAX };

    pub const fn integer(min: i64, max: i64) -> Self {
        NumberParser::Integer { min, max }
    }

    pub const fn float(min: f64, max: f64) -> Self {
        NumberParser::Float { min, max }
    }

    /// A range no number fits in
    pub fn is_empty(&self) -> bool {
        match *self {
            NumberParser::Integer { min, max } => min > max,
            // NaN bounds make the range empty too
            NumberParser::Float { min, max } => !(min <= max),
        }
    }

    pub fn parse(&self, text: &str) -> Result<Number, ParseNumberError> {
        let text = text.trim();
        match *self {
            NumberParser::Integer { min, max } => {
                let (_, value) = all_consuming(integer)(text).map_err(|_| ParseNumberError::Syntax {
                    text: text.to_owned(),
                    expected: "an integer",
                })?;
                if !(min..=max).contains(&value) {
                    return Err(ParseNumberError::OutOfRange {
                        value: Number::Integer(value),
                        min: Number::Integer(min),
                        max: Number::Integer(max),
                    });
                }
                Ok(Number::Integer(value))
            }
            NumberParser::Float { min, max } => {
                let (_, value) = all_consuming(double)(text).map_err(|_: nom::Err<nom::error::Error<&str>>| {
                    ParseNumberError::Syntax {
                        text: text.to_owned(),
                        expected: "a number",
                    }
                })?;
                if !value.is_finite() {
                    return Err(ParseNumberError::NotFinite(text.to_owned()));
                }
                if !(min..=max).contains(&value) {
                    return Err(ParseNumberError::OutOfRange {
                        value: Number::Float(value),
                        min: Number::Float(min),
                        max: Number::Float(max),
                    });
                }
                Ok(Number::Float(value))
            }
        }
    }
}

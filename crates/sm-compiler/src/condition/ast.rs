use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    Contains,
}

impl CompareOp {
    pub(crate) fn from_char(ch: char) -> Option<Self> {
        match ch {
            '=' => Some(Self::Equals),
            '~' => Some(Self::Contains),
            _ => None,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => write!(f, "="),
            Self::Contains => write!(f, "~"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Empty condition.
    Always,
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Compare {
        property: String,
        op: CompareOp,
        value: String,
    },
    /// Bare property name, true when the value is non-empty.
    Truthy { property: String },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => Ok(()),
            Self::All(parts) => write_joined(f, parts, " + "),
            Self::Any(parts) => write_joined(f, parts, " | "),
            Self::Not(inner) => match inner.as_ref() {
                Self::All(_) | Self::Any(_) => write!(f, "![{inner}]"),
                _ => write!(f, "!{inner}"),
            },
            Self::Compare {
                property,
                op,
                value,
            } => write!(f, "{property}{op}{value}"),
            Self::Truthy { property } => write!(f, "{property}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Condition], separator: &str) -> fmt::Result {
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            write!(f, "{separator}")?;
        }
        match part {
            Condition::All(_) | Condition::Any(_) => write!(f, "[{part}]")?,
            _ => write!(f, "{part}")?,
        }
    }
    Ok(())
}

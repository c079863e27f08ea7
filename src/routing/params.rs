//! Request parameter predicates.
//!
//! Declared as `"name"` (present), `"!name"` (absent) or `"name=value"`
//! (first submitted value equals `value`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::routing::request::RequestParams;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("parameter predicate '{0}' has an empty name")]
    EmptyName(String),
}

/// A single parameter condition on an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamPredicate {
    Present(String),
    Absent(String),
    Equals { name: String, value: String },
}

impl ParamPredicate {
    pub fn name(&self) -> &str {
        match self {
            ParamPredicate::Present(name) | ParamPredicate::Absent(name) => name,
            ParamPredicate::Equals { name, .. } => name,
        }
    }

    /// Evaluate against submitted parameters.
    pub fn is_satisfied_by(&self, params: &RequestParams) -> bool {
        match self {
            ParamPredicate::Present(name) => params.contains(name),
            ParamPredicate::Absent(name) => !params.contains(name),
            ParamPredicate::Equals { name, value } => params.first(name) == Some(value.as_str()),
        }
    }
}

impl FromStr for ParamPredicate {
    type Err = ParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let predicate = if let Some(name) = raw.strip_prefix('!') {
            ParamPredicate::Absent(name.trim().to_string())
        } else if let Some((name, value)) = raw.split_once('=') {
            ParamPredicate::Equals {
                name: name.trim().to_string(),
                value: value.to_string(),
            }
        } else {
            ParamPredicate::Present(raw.to_string())
        };
        if predicate.name().is_empty() {
            return Err(ParamError::EmptyName(raw.to_string()));
        }
        Ok(predicate)
    }
}

impl fmt::Display for ParamPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamPredicate::Present(name) => write!(f, "{}", name),
            ParamPredicate::Absent(name) => write!(f, "!{}", name),
            ParamPredicate::Equals { name, value } => write!(f, "{}={}", name, value),
        }
    }
}

/// Parse a declared predicate list, dropping exact duplicates.
pub fn parse_predicates<I, S>(declared: I) -> Result<Vec<ParamPredicate>, ParamError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut predicates: Vec<ParamPredicate> = Vec::new();
    for raw in declared {
        let predicate: ParamPredicate = raw.as_ref().parse()?;
        if !predicates.contains(&predicate) {
            predicates.push(predicate);
        }
    }
    Ok(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("p".parse::<ParamPredicate>(), Ok(ParamPredicate::Present("p".into())));
        assert_eq!("!p".parse::<ParamPredicate>(), Ok(ParamPredicate::Absent("p".into())));
        assert_eq!(
            "p=v".parse::<ParamPredicate>(),
            Ok(ParamPredicate::Equals { name: "p".into(), value: "v".into() })
        );
        assert_eq!(
            "p=".parse::<ParamPredicate>(),
            Ok(ParamPredicate::Equals { name: "p".into(), value: String::new() })
        );
        assert!("!".parse::<ParamPredicate>().is_err());
        assert!("=v".parse::<ParamPredicate>().is_err());
    }

    #[test]
    fn test_duplicates_dropped() {
        let parsed = parse_predicates(["p", "p", "!q", "p=v", "!q"]).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].to_string(), "p");
        assert_eq!(parsed[1].to_string(), "!q");
        assert_eq!(parsed[2].to_string(), "p=v");
    }

    #[test]
    fn test_empty_value_counts_as_present() {
        let params = RequestParams::from_query("p=&q=1&q=2");
        assert!(ParamPredicate::Present("p".into()).is_satisfied_by(&params));
        assert!(!ParamPredicate::Absent("p".into()).is_satisfied_by(&params));
        assert!(ParamPredicate::Absent("r".into()).is_satisfied_by(&params));
        assert!("q=1".parse::<ParamPredicate>().unwrap().is_satisfied_by(&params));
        assert!(!"q=2".parse::<ParamPredicate>().unwrap().is_satisfied_by(&params));
    }
}

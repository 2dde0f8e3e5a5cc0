use itertools::Itertools;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A scalar value inlined into the filter.
    Literal(Value),
    /// A reference to a query variable sent alongside the filter.
    Variable(String),
}

/// A filter over flow records, rendered as the backend's `where` argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq {
        field: String,
        value: Operand,
    },
    IsNull {
        field: String,
        is_null: bool,
    },
    /// Applies `predicate` to the object stored under `relation`.
    Related {
        relation: String,
        predicate: Box<Predicate>,
    },
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: Operand::Literal(value.into()),
        }
    }

    pub fn eq_variable(field: impl Into<String>, variable: impl Into<String>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: Operand::Variable(variable.into()),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Predicate::IsNull {
            field: field.into(),
            is_null: true,
        }
    }

    pub fn related(relation: impl Into<String>, predicate: Predicate) -> Self {
        Predicate::Related {
            relation: relation.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Conjunction; nested conjunctions are flattened.
    pub fn and(self, rhs: Predicate) -> Self {
        let mut terms = match self {
            Predicate::And(terms) => terms,
            other => vec![other],
        };
        match rhs {
            Predicate::And(more) => terms.extend(more),
            other => terms.push(other),
        }
        Predicate::And(terms)
    }

    /// Names of all variables referenced anywhere in the tree.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Predicate::Eq {
                value: Operand::Variable(name),
                ..
            } => {
                names.insert(name.as_str());
            }
            Predicate::Eq { .. } | Predicate::IsNull { .. } => {}
            Predicate::Related { predicate, .. } => predicate.collect_variables(names),
            Predicate::And(terms) => terms.iter().for_each(|t| t.collect_variables(names)),
        }
    }

    /// Evaluates the predicate against a JSON record, resolving variable
    /// references from `variables`.
    ///
    /// A missing field compares like `null`. An unresolved variable never matches.
    pub fn matches(&self, record: &Value, variables: &Map<String, Value>) -> bool {
        match self {
            Predicate::Eq { field, value } => {
                let actual = record.get(field).unwrap_or(&Value::Null);
                match value {
                    Operand::Literal(expected) => actual == expected,
                    Operand::Variable(name) => variables.get(name) == Some(actual),
                }
            }
            Predicate::IsNull { field, is_null } => {
                record.get(field).is_none_or(Value::is_null) == *is_null
            }
            Predicate::Related {
                relation,
                predicate,
            } => {
                // A null relation can only satisfy "its fields are null".
                let nested = record.get(relation).unwrap_or(&Value::Null);
                predicate.matches(nested, variables)
            }
            Predicate::And(terms) => terms.iter().all(|t| t.matches(record, variables)),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Variable(name) => write!(f, "${}", name),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq { field, value } => write!(f, "{} == {}", field, value),
            Predicate::IsNull { field, is_null } => {
                let op = if *is_null { "IS NULL" } else { "IS NOT NULL" };
                write!(f, "{} {}", field, op)
            }
            Predicate::Related {
                relation,
                predicate,
            } => write!(f, "{}.({})", relation, predicate),
            Predicate::And(terms) => write!(f, "{}", terms.iter().join(" AND ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    /// Compares two records by the ordering field.
    ///
    /// Strings compare lexically and numbers numerically. Missing or null values
    /// sort last; values of mismatched types compare equal.
    ///
    /// Lexical order is chronological only for ISO-8601 timestamps written with
    /// the same precision and offset: `...:00.5Z` sorts before `...:00Z`.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let (lhs, rhs) = (a.get(&self.field), b.get(&self.field));
        let ordering = match (lhs, rhs) {
            (Some(Value::String(l)), Some(Value::String(r))) => l.cmp(r),
            (Some(Value::Number(l)), Some(Value::Number(r))) => {
                let (l, r) = (
                    l.as_f64().unwrap_or(f64::NAN),
                    r.as_f64().unwrap_or(f64::NAN),
                );
                l.partial_cmp(&r).unwrap_or(Ordering::Equal)
            }
            (Some(Value::Null) | None, Some(Value::Null) | None) => return Ordering::Equal,
            (Some(Value::Null) | None, _) => return Ordering::Greater,
            (_, Some(Value::Null) | None) => return Ordering::Less,
            _ => Ordering::Equal,
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

//! Declarative filter conditions and their compiler.
//!
//! A [`Condition`] is a closed tree: leaves compare one column against a
//! value, `And`/`Or`/`Not` combine, and `Custom` carries a user predicate.
//! [`Condition::compile`] turns the tree into one closure once, before any
//! row is scanned.
//!
//! Serialized form (JSON/YAML), camelCase:
//! `{ "operator": "and", "conditions": [...] }`,
//! `{ "operator": "not", "condition": {...} }`,
//! `{ "operator": ">", "columnId": "n", "value": 2, "ignoreCase": false }`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tabula_core::prelude::*;
use thiserror::Error;

/// Compiled row predicate.
pub type Predicate = Arc<dyn Fn(&RowRef<'_>) -> Result<bool, CallbackError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),

    #[error("filter on '{0}' has no operator")]
    MissingOperator(String),

    #[error("operator '{0}' needs a column id")]
    MissingColumn(String),

    #[error("'not' needs a nested condition")]
    MissingOperand,
}

/// Leaf operators of the condition language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    StrictEq,
    Ne,
    StrictNe,
    Gt,
    Ge,
    Lt,
    Le,
    Empty,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::StrictEq,
        Operator::Ne,
        Operator::StrictNe,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::Empty,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::StrictEq => "===",
            Operator::Ne => "!=",
            Operator::StrictNe => "!==",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Empty => "empty",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
        }
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses canonical operator spellings only; see [`Condition::from_parts`]
/// for the friendly aliases.
impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ConditionError::UnknownOperator(s.to_string()))
    }
}

/// User predicate carried by [`Condition::Custom`].
#[derive(Clone)]
pub struct CustomPredicate(Predicate);

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPredicate(..)")
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf {
        column_id: String,
        operator: Operator,
        value: CellValue,
        /// `None` means the filter default (case-insensitive).
        ignore_case: Option<bool>,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Custom(CustomPredicate),
}

impl Condition {
    pub fn leaf(column_id: impl Into<String>, operator: Operator, value: impl Into<CellValue>) -> Self {
        Condition::Leaf {
            column_id: column_id.into(),
            operator,
            value: value.into(),
            ignore_case: None,
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or(conditions)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&RowRef<'_>) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        Condition::Custom(CustomPredicate(Arc::new(predicate)))
    }

    /// Build a leaf from an operator name as a host UI hands it over.
    ///
    /// Accepts the canonical spellings plus `equals`, `doesNotEqual`,
    /// `greaterThan`, `greaterThanOrEqualTo`, `lessThan`,
    /// `lessThanOrEqualTo`, `beginsWith`, `doesNotContain`, and `notEmpty`.
    /// The negated aliases produce a `Not` around the positive leaf.
    pub fn from_parts(
        column_id: impl Into<String>,
        operator: &str,
        value: impl Into<CellValue>,
    ) -> Result<Self, ConditionError> {
        let (op, negate) = match operator {
            "equals" => (Operator::StrictEq, false),
            "doesNotEqual" => (Operator::StrictNe, false),
            "greaterThan" => (Operator::Gt, false),
            "greaterThanOrEqualTo" => (Operator::Ge, false),
            "lessThan" => (Operator::Lt, false),
            "lessThanOrEqualTo" => (Operator::Le, false),
            "beginsWith" => (Operator::StartsWith, false),
            "doesNotContain" => (Operator::Contains, true),
            "notEmpty" => (Operator::Empty, true),
            other => (other.parse::<Operator>()?, false),
        };
        let leaf = Condition::leaf(column_id, op, value);
        Ok(if negate { Condition::not(leaf) } else { leaf })
    }

    /// Set `ignore_case` on every leaf (through `Not` wrappers) that has
    /// no explicit setting yet.
    pub fn with_default_ignore_case(self, ignore_case: bool) -> Self {
        match self {
            Condition::Leaf {
                column_id,
                operator,
                value,
                ignore_case: own,
            } => Condition::Leaf {
                column_id,
                operator,
                value,
                ignore_case: own.or(Some(ignore_case)),
            },
            Condition::And(cs) => Condition::And(
                cs.into_iter()
                    .map(|c| c.with_default_ignore_case(ignore_case))
                    .collect(),
            ),
            Condition::Or(cs) => Condition::Or(
                cs.into_iter()
                    .map(|c| c.with_default_ignore_case(ignore_case))
                    .collect(),
            ),
            Condition::Not(c) => Condition::not(c.with_default_ignore_case(ignore_case)),
            custom @ Condition::Custom(_) => custom,
        }
    }

    /// Column ids referenced by leaves, in tree order.
    pub fn column_ids(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_column_ids(&mut out);
        out
    }

    fn collect_column_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Leaf { column_id, .. } => out.push(column_id),
            Condition::And(cs) | Condition::Or(cs) => {
                for c in cs {
                    c.collect_column_ids(out);
                }
            }
            Condition::Not(c) => c.collect_column_ids(out),
            Condition::Custom(_) => {}
        }
    }

    /// Compile the tree into a single predicate.
    ///
    /// An empty `And` accepts every row, an empty `Or` rejects every row.
    pub fn compile(&self) -> Predicate {
        match self {
            Condition::Leaf {
                column_id,
                operator,
                value,
                ignore_case,
            } => compile_leaf(
                column_id.clone(),
                *operator,
                value.clone(),
                ignore_case.unwrap_or(true),
            ),
            Condition::And(cs) => {
                let parts: Vec<Predicate> = cs.iter().map(Condition::compile).collect();
                predicate(move |row| {
                    for p in &parts {
                        if !p(row)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                })
            }
            Condition::Or(cs) => {
                let parts: Vec<Predicate> = cs.iter().map(Condition::compile).collect();
                predicate(move |row| {
                    for p in &parts {
                        if p(row)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                })
            }
            Condition::Not(c) => {
                let inner = c.compile();
                predicate(move |row| Ok(!inner(row)?))
            }
            Condition::Custom(CustomPredicate(p)) => Arc::clone(p),
        }
    }
}

fn predicate<F>(f: F) -> Predicate
where
    F: Fn(&RowRef<'_>) -> Result<bool, CallbackError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn compile_leaf(column_id: String, operator: Operator, value: CellValue, ignore_case: bool) -> Predicate {
    if operator.is_text() {
        let needle = fold_case(text_of(&value), ignore_case);
        return predicate(move |row| {
            let haystack = fold_case(text_of(&row.get(&column_id)), ignore_case);
            Ok(match operator {
                Operator::Contains => haystack.contains(&needle),
                Operator::StartsWith => haystack.starts_with(&needle),
                _ => haystack.ends_with(&needle),
            })
        });
    }

    predicate(move |row| {
        let cell = row.get(&column_id);
        Ok(match operator {
            Operator::Eq => cell.loose_eq(&value),
            Operator::StrictEq => cell.strict_eq(&value),
            Operator::Ne => !cell.loose_eq(&value),
            Operator::StrictNe => !cell.strict_eq(&value),
            Operator::Empty => cell.is_empty(),
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => {
                // Missing operands compare as 0.
                match cell.or_zero().loose_cmp(&value.or_zero()) {
                    Some(ord) => match operator {
                        Operator::Gt => ord.is_gt(),
                        Operator::Ge => ord.is_ge(),
                        Operator::Lt => ord.is_lt(),
                        _ => ord.is_le(),
                    },
                    None => false,
                }
            }
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => false,
        })
    })
}

/// String form for text predicates; missing cells read as "".
fn text_of(value: &CellValue) -> String {
    if value.is_missing() {
        String::new()
    } else {
        value.to_display_string()
    }
}

fn fold_case(s: String, ignore_case: bool) -> String {
    if ignore_case {
        s.to_lowercase()
    } else {
        s
    }
}

// --- serde ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_undefined")]
    value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ignore_case: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<RawCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Box<RawCondition>>,
}

fn is_undefined(value: &CellValue) -> bool {
    matches!(value, CellValue::Undefined)
}

impl TryFrom<RawCondition> for Condition {
    type Error = ConditionError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        match raw.operator.as_str() {
            "and" => Ok(Condition::And(
                raw.conditions
                    .into_iter()
                    .map(Condition::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            "or" => Ok(Condition::Or(
                raw.conditions
                    .into_iter()
                    .map(Condition::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            "not" => {
                let inner = raw.condition.ok_or(ConditionError::MissingOperand)?;
                Ok(Condition::not(Condition::try_from(*inner)?))
            }
            op => {
                let column_id = raw
                    .column_id
                    .ok_or_else(|| ConditionError::MissingColumn(op.to_string()))?;
                let condition = Condition::from_parts(column_id, op, raw.value)?;
                Ok(match raw.ignore_case {
                    Some(flag) => condition.with_default_ignore_case(flag),
                    None => condition,
                })
            }
        }
    }
}

impl RawCondition {
    fn from_condition<E: serde::ser::Error>(condition: &Condition) -> Result<Self, E> {
        Ok(match condition {
            Condition::Leaf {
                column_id,
                operator,
                value,
                ignore_case,
            } => RawCondition {
                operator: operator.as_str().to_string(),
                column_id: Some(column_id.clone()),
                value: value.clone(),
                ignore_case: *ignore_case,
                ..RawCondition::default()
            },
            Condition::And(cs) => RawCondition {
                operator: "and".into(),
                conditions: cs.iter().map(RawCondition::from_condition::<E>).collect::<Result<_, E>>()?,
                ..RawCondition::default()
            },
            Condition::Or(cs) => RawCondition {
                operator: "or".into(),
                conditions: cs.iter().map(RawCondition::from_condition::<E>).collect::<Result<_, E>>()?,
                ..RawCondition::default()
            },
            Condition::Not(c) => RawCondition {
                operator: "not".into(),
                condition: Some(Box::new(RawCondition::from_condition(c)?)),
                ..RawCondition::default()
            },
            Condition::Custom(_) => {
                return Err(E::custom("custom conditions carry a closure and cannot be serialized"))
            }
        })
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCondition::deserialize(deserializer)?;
        Condition::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawCondition::from_condition::<S::Error>(self)?.serialize(serializer)
    }
}

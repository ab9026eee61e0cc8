use super::evaluator::EvalError;
use crate::models::{AttributeValue, DataType};
use log::warn;
use regex::Regex;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const FUNCTION_PREFIXES: [&str; 2] = [
    "urn:oasis:names:tc:xacml:1.0:function:",
    "urn:oasis:names:tc:xacml:2.0:function:",
];

// longest first: "dateTime-equal" must not resolve to "date"
const TYPE_NAMES: [&str; 8] = [
    "dateTime", "date", "time", "string", "boolean", "integer", "double", "anyURI",
];

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Single(AttributeValue),
    Bag(Vec<AttributeValue>),
    Function(String),
}

impl Value {
    pub(crate) fn boolean(value: bool) -> Self {
        Value::Single(AttributeValue::boolean(value))
    }

    pub(crate) fn as_bool(&self) -> Result<bool, EvalError> {
        let value = self.single()?;
        if value.data_type != DataType::Boolean {
            return Err(EvalError::processing(format!(
                "expected a boolean, found {}",
                value.data_type
            )));
        }
        parse_bool(&value.value)
    }

    fn single(&self) -> Result<&AttributeValue, EvalError> {
        match self {
            Value::Single(value) => Ok(value),
            Value::Bag(_) => Err(EvalError::processing("expected a single value, found a bag")),
            Value::Function(id) => Err(EvalError::processing(format!(
                "expected a single value, found function {id}"
            ))),
        }
    }

    fn typed(&self, data_type: &DataType) -> Result<&AttributeValue, EvalError> {
        let value = self.single()?;
        expect_type(data_type, value)?;
        Ok(value)
    }

    fn bag(&self) -> Result<&[AttributeValue], EvalError> {
        match self {
            Value::Bag(values) => Ok(values),
            _ => Err(EvalError::processing("expected a bag")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comparison {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::GreaterThan => ordering == Ordering::Greater,
            Comparison::GreaterThanOrEqual => ordering != Ordering::Less,
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

/// Supported XACML functions, resolved from their URN.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Function {
    Equal(DataType),
    Compare(DataType, Comparison),
    RegexpMatch,
    Concatenate,
    And,
    Or,
    Not,
    NOf,
    OneAndOnly(DataType),
    BagSize,
    IsIn(DataType),
    Bag,
    AtLeastOneMemberOf(DataType),
    AnyOf,
    AllOf,
}

impl Function {
    pub(crate) fn from_id(id: &str) -> Option<Self> {
        let name = FUNCTION_PREFIXES
            .iter()
            .find_map(|prefix| id.strip_prefix(prefix))?;
        let function = match name {
            "and" => Function::And,
            "or" => Function::Or,
            "not" => Function::Not,
            "n-of" => Function::NOf,
            "any-of" => Function::AnyOf,
            "all-of" => Function::AllOf,
            "string-concatenate" => Function::Concatenate,
            "string-regexp-match" | "anyURI-regexp-match" => Function::RegexpMatch,
            _ => return typed_function(name),
        };
        Some(function)
    }

    pub(crate) fn apply(&self, args: &[Value], regexes: &RegexCache) -> Result<Value, EvalError> {
        match self {
            Function::Equal(data_type) => {
                let [left, right] = pair(args)?;
                let ordering = compare(
                    data_type,
                    &left.typed(data_type)?.value,
                    &right.typed(data_type)?.value,
                )?;
                Ok(Value::boolean(ordering == Ordering::Equal))
            }
            Function::Compare(data_type, comparison) => {
                let [left, right] = pair(args)?;
                let ordering = compare(
                    data_type,
                    &left.typed(data_type)?.value,
                    &right.typed(data_type)?.value,
                )?;
                Ok(Value::boolean(comparison.holds(ordering)))
            }
            Function::RegexpMatch => {
                let [pattern, value] = pair(args)?;
                let regex = regexes.get(&pattern.single()?.value)?;
                Ok(Value::boolean(regex.is_match(&value.single()?.value)))
            }
            Function::Concatenate => {
                if args.len() < 2 {
                    return Err(arity("at least 2", args.len()));
                }
                let joined = args
                    .iter()
                    .map(|arg| arg.single().map(|value| value.value.as_str()))
                    .collect::<Result<String, _>>()?;
                Ok(Value::Single(AttributeValue::string(joined)))
            }
            Function::And => {
                for arg in args {
                    if !arg.as_bool()? {
                        return Ok(Value::boolean(false));
                    }
                }
                Ok(Value::boolean(true))
            }
            Function::Or => {
                for arg in args {
                    if arg.as_bool()? {
                        return Ok(Value::boolean(true));
                    }
                }
                Ok(Value::boolean(false))
            }
            Function::Not => match args {
                [arg] => Ok(Value::boolean(!arg.as_bool()?)),
                _ => Err(arity("1", args.len())),
            },
            Function::NOf => {
                let Some((count, rest)) = args.split_first() else {
                    return Err(arity("at least 1", 0));
                };
                let required = parse_integer(&count.single()?.value)?;
                let required = usize::try_from(required).map_err(|_| {
                    EvalError::processing(format!("n-of needs a non-negative count, found {required}"))
                })?;
                if required > rest.len() {
                    return Err(EvalError::processing(format!(
                        "n-of needs {required} arguments, found {}",
                        rest.len()
                    )));
                }
                let mut satisfied = 0;
                for arg in rest {
                    if satisfied == required {
                        break;
                    }
                    if arg.as_bool()? {
                        satisfied += 1;
                    }
                }
                Ok(Value::boolean(satisfied == required))
            }
            Function::OneAndOnly(_) => match args {
                [bag] => match bag.bag()? {
                    [value] => Ok(Value::Single(value.clone())),
                    values => Err(EvalError::processing(format!(
                        "one-and-only expects a bag of one value, found {}",
                        values.len()
                    ))),
                },
                _ => Err(arity("1", args.len())),
            },
            Function::BagSize => match args {
                [bag] => {
                    let size = i64::try_from(bag.bag()?.len()).unwrap_or(i64::MAX);
                    Ok(Value::Single(AttributeValue::integer(size)))
                }
                _ => Err(arity("1", args.len())),
            },
            Function::IsIn(data_type) => {
                let [value, bag] = pair(args)?;
                let value = value.typed(data_type)?;
                Ok(Value::boolean(contains(data_type, bag.bag()?, &value.value)?))
            }
            Function::Bag => args
                .iter()
                .map(|arg| arg.single().cloned())
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Bag),
            Function::AtLeastOneMemberOf(data_type) => {
                let [left, right] = pair(args)?;
                let right = right.bag()?;
                for value in left.bag()? {
                    expect_type(data_type, value)?;
                    if contains(data_type, right, &value.value)? {
                        return Ok(Value::boolean(true));
                    }
                }
                Ok(Value::boolean(false))
            }
            Function::AnyOf | Function::AllOf => {
                let [function, value, bag] = match args {
                    [function, value, bag] => [function, value, bag],
                    _ => return Err(arity("3", args.len())),
                };
                let Value::Function(id) = function else {
                    return Err(EvalError::processing("first argument must be a function"));
                };
                let inner = Function::from_id(id)
                    .ok_or_else(|| EvalError::processing(format!("unknown function {id}")))?;
                let value = value.single()?;
                let wanted = *self == Function::AnyOf;
                for candidate in bag.bag()? {
                    let result = inner
                        .apply(
                            &[Value::Single(value.clone()), Value::Single(candidate.clone())],
                            regexes,
                        )?
                        .as_bool()?;
                    if result == wanted {
                        return Ok(Value::boolean(wanted));
                    }
                }
                Ok(Value::boolean(!wanted))
            }
        }
    }
}

fn typed_function(name: &str) -> Option<Function> {
    let (data_type, operation) = TYPE_NAMES.iter().find_map(|short| {
        let operation = name.strip_prefix(short)?.strip_prefix('-')?;
        Some((DataType::from_short_name(short)?, operation))
    })?;
    let ordered = !matches!(data_type, DataType::Boolean | DataType::AnyUri);
    let function = match operation {
        "equal" => Function::Equal(data_type),
        "greater-than" if ordered => Function::Compare(data_type, Comparison::GreaterThan),
        "greater-than-or-equal" if ordered => {
            Function::Compare(data_type, Comparison::GreaterThanOrEqual)
        }
        "less-than" if ordered => Function::Compare(data_type, Comparison::LessThan),
        "less-than-or-equal" if ordered => Function::Compare(data_type, Comparison::LessThanOrEqual),
        "one-and-only" => Function::OneAndOnly(data_type),
        "bag-size" => Function::BagSize,
        "is-in" => Function::IsIn(data_type),
        "bag" => Function::Bag,
        "at-least-one-member-of" => Function::AtLeastOneMemberOf(data_type),
        _ => return None,
    };
    Some(function)
}

/// Compiled patterns of `*-regexp-match`, kept for the duration of one evaluation.
#[derive(Debug, Default)]
pub(crate) struct RegexCache {
    compiled: RefCell<HashMap<String, Regex>>,
}

impl RegexCache {
    pub(crate) fn get(&self, pattern: &str) -> Result<Regex, EvalError> {
        if let Some(regex) = self.compiled.borrow().get(pattern) {
            return Ok(regex.clone());
        }
        match Regex::new(pattern) {
            Ok(regex) => {
                self.compiled
                    .borrow_mut()
                    .insert(pattern.to_string(), regex.clone());
                Ok(regex)
            }
            Err(err) => {
                warn!("invalid regular expression in policy: pattern='{pattern}' error={err}");
                Err(EvalError::processing(format!(
                    "invalid regular expression {pattern}: {err}"
                )))
            }
        }
    }
}

fn pair(args: &[Value]) -> Result<[&Value; 2], EvalError> {
    match args {
        [left, right] => Ok([left, right]),
        _ => Err(arity("2", args.len())),
    }
}

fn arity(expected: &str, found: usize) -> EvalError {
    EvalError::processing(format!("expected {expected} arguments, found {found}"))
}

fn expect_type(data_type: &DataType, value: &AttributeValue) -> Result<(), EvalError> {
    if value.data_type != *data_type {
        return Err(EvalError::processing(format!(
            "expected a {data_type} argument, found {}",
            value.data_type
        )));
    }
    Ok(())
}

fn contains(data_type: &DataType, bag: &[AttributeValue], value: &str) -> Result<bool, EvalError> {
    for candidate in bag {
        expect_type(data_type, candidate)?;
        if compare(data_type, &candidate.value, value)? == Ordering::Equal {
            return Ok(true);
        }
    }
    Ok(false)
}

fn compare(data_type: &DataType, left: &str, right: &str) -> Result<Ordering, EvalError> {
    match data_type {
        DataType::Boolean => Ok(parse_bool(left)?.cmp(&parse_bool(right)?)),
        DataType::Integer => Ok(parse_integer(left)?.cmp(&parse_integer(right)?)),
        DataType::Double => {
            let (left, right) = (parse_double(left)?, parse_double(right)?);
            left.partial_cmp(&right).ok_or_else(|| {
                EvalError::processing(format!("unable to compare {left} and {right}"))
            })
        }
        DataType::Date | DataType::Time | DataType::DateTime => {
            Ok(parse_temporal(data_type, left)?.cmp(&parse_temporal(data_type, right)?))
        }
        DataType::String | DataType::AnyUri | DataType::Other(_) => Ok(left.cmp(right)),
    }
}

fn parse_bool(value: &str) -> Result<bool, EvalError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(EvalError::processing(format!("invalid boolean {other}"))),
    }
}

fn parse_integer(value: &str) -> Result<i64, EvalError> {
    value
        .trim()
        .parse()
        .map_err(|err| EvalError::processing(format!("invalid integer {value}: {err}")))
}

fn parse_double(value: &str) -> Result<f64, EvalError> {
    match value.trim() {
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        other => other
            .parse()
            .map_err(|err| EvalError::processing(format!("invalid double {value}: {err}"))),
    }
}

/// Parses xs:date, xs:time and xs:dateTime as instants; a missing zone means UTC.
pub(crate) fn parse_temporal(data_type: &DataType, value: &str) -> Result<OffsetDateTime, EvalError> {
    let value = value.trim();
    let candidate = match data_type {
        DataType::Date => format!("{}T00:00:00Z", value.get(..10).unwrap_or(value)),
        DataType::Time => with_zone(format!("1970-01-01T{value}")),
        _ => with_zone(value.to_string()),
    };
    OffsetDateTime::parse(&candidate, &Rfc3339)
        .map_err(|err| EvalError::processing(format!("invalid {data_type} value {value}: {err}")))
}

fn with_zone(mut value: String) -> String {
    let time_part = value.rsplit('T').next().unwrap_or_default();
    let zoned = time_part.ends_with('Z') || time_part.contains('+') || time_part.contains('-');
    if !zoned {
        value.push('Z');
    }
    value
}

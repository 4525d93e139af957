use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one form type in the catalog. Being an enum, a tag can only
/// ever name one node per return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormTag {
    #[serde(rename = "f1040")]
    F1040,
    #[serde(rename = "schedule_1")]
    Schedule1,
    #[serde(rename = "schedule_2")]
    Schedule2,
    #[serde(rename = "schedule_3")]
    Schedule3,
    #[serde(rename = "schedule_a")]
    ScheduleA,
    #[serde(rename = "schedule_b")]
    ScheduleB,
    #[serde(rename = "schedule_c")]
    ScheduleC,
    #[serde(rename = "schedule_d")]
    ScheduleD,
    #[serde(rename = "schedule_se")]
    ScheduleSe,
    #[serde(rename = "schedule_8812")]
    Schedule8812,
    #[serde(rename = "form_8889")]
    Form8889,
    #[serde(rename = "form_8995")]
    Form8995,
    #[serde(rename = "form_8995a")]
    Form8995A,
    #[serde(rename = "form_8959")]
    Form8959,
    #[serde(rename = "form_8960")]
    Form8960,
}

impl FormTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormTag::F1040 => "f1040",
            FormTag::Schedule1 => "schedule_1",
            FormTag::Schedule2 => "schedule_2",
            FormTag::Schedule3 => "schedule_3",
            FormTag::ScheduleA => "schedule_a",
            FormTag::ScheduleB => "schedule_b",
            FormTag::ScheduleC => "schedule_c",
            FormTag::ScheduleD => "schedule_d",
            FormTag::ScheduleSe => "schedule_se",
            FormTag::Schedule8812 => "schedule_8812",
            FormTag::Form8889 => "form_8889",
            FormTag::Form8995 => "form_8995",
            FormTag::Form8995A => "form_8995a",
            FormTag::Form8959 => "form_8959",
            FormTag::Form8960 => "form_8960",
        }
    }
}

impl fmt::Display for FormTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable address for one line: the owning form plus the line's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineId {
    pub form: FormTag,
    pub line: &'static str,
}

impl LineId {
    pub const fn new(form: FormTag, line: &'static str) -> Self {
        Self { form, line }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.form, self.line)
    }
}

/// An attached form as reported to packaging collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IncludedForm {
    pub tag: FormTag,
    pub sequence: u32,
    pub parent: Option<FormTag>,
}

/// A fractional rate or ratio. Unlike amounts, rates are never rounded to
/// whole currency units on output.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Rate(pub f64);

/// The resolved value of one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Amount(f64),
    Rate(f64),
    Flag(bool),
    Text(String),
    Date(NaiveDate),
    Empty,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Amount(_) => "amount",
            Value::Rate(_) => "rate",
            Value::Flag(_) => "flag",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Empty => "empty",
        }
    }

    /// Numeric view used by audit output; non-numeric values read as zero.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Amount(v) | Value::Rate(v) => *v,
            Value::Flag(true) => 1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Amount(v) => write!(f, "{:.2}", v),
            Value::Rate(v) => write!(f, "{:.4}", v),
            Value::Flag(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::Empty => f.write_str("-"),
        }
    }
}

/// Conversion between a line body's native Rust type and the stored `Value`.
pub trait LineValue: Clone + Sized {
    const KIND: &'static str;
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl LineValue for f64 {
    const KIND: &'static str = "amount";
    fn into_value(self) -> Value {
        Value::Amount(self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Amount(v) => Some(*v),
            _ => None,
        }
    }
}

impl LineValue for Rate {
    const KIND: &'static str = "rate";
    fn into_value(self) -> Value {
        Value::Rate(self.0)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Rate(v) => Some(Rate(*v)),
            _ => None,
        }
    }
}

impl LineValue for bool {
    const KIND: &'static str = "flag";
    fn into_value(self) -> Value {
        Value::Flag(self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl LineValue for String {
    const KIND: &'static str = "text";
    fn into_value(self) -> Value {
        Value::Text(self)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Date lines may legitimately be blank.
impl LineValue for Option<NaiveDate> {
    const KIND: &'static str = "date";
    fn into_value(self) -> Value {
        match self {
            Some(d) => Value::Date(d),
            None => Value::Empty,
        }
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(Some(*d)),
            Value::Empty => Some(None),
            _ => None,
        }
    }
}

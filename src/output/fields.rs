//! Flattens a form's resolved lines into the position-ordered field list the
//! PDF-filling collaborator consumes.

use crate::compute::kernel::round_half_up;
use crate::compute::{ComputationError, Result};
use crate::forms::Form;
use crate::pass::TaxReturn;
use crate::store::Value;
use chrono::NaiveDate;
use serde::Serialize;

/// The lines a form emits for one tax year, in physical field order, and the
/// number of fillable positions on that year's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub lines: &'static [&'static str],
    pub fillable: usize,
}

impl FieldLayout {
    pub const fn new(lines: &'static [&'static str], fillable: usize) -> Self {
        Self { lines, fillable }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Whole currency units.
    Amount(i64),
    Decimal(f64),
    Flag(bool),
    Text(String),
    Date(NaiveDate),
    Blank,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Amount(v) => FieldValue::Amount(round_half_up(v) as i64),
            Value::Rate(v) => FieldValue::Decimal(v),
            Value::Flag(b) => FieldValue::Flag(b),
            Value::Text(s) => FieldValue::Text(s),
            Value::Date(d) => FieldValue::Date(d),
            Value::Empty => FieldValue::Blank,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Position on the physical form.
    pub index: usize,
    pub line: &'static str,
    pub value: FieldValue,
}

/// Looks up and checks a form's layout for a tax year.
pub fn checked_layout(form: &dyn Form, tax_year: u16) -> Result<FieldLayout> {
    let layout = form
        .field_layout(tax_year)
        .ok_or(ComputationError::MissingLayout { form: form.tag(), year: tax_year })?;

    if layout.lines.len() != layout.fillable {
        return Err(ComputationError::LayoutMismatch {
            form: form.tag(),
            year: tax_year,
            expected: layout.fillable,
            actual: layout.lines.len(),
        });
    }
    let names = form.line_names();
    if let Some(missing) = layout.lines.iter().find(|l| !names.contains(*l)) {
        return Err(ComputationError::UnknownLine { form: form.tag(), line: missing.to_string() });
    }
    Ok(layout)
}

pub fn serialize_fields(form: &dyn Form, r: &TaxReturn<'_>) -> Result<Vec<Field>> {
    let layout = checked_layout(form, r.tax_year())?;
    layout
        .lines
        .iter()
        .enumerate()
        .map(|(index, &line)| {
            let value = form.evaluate(r, line)?;
            Ok(Field { index, line, value: value.into() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts_round_once_rates_keep_precision() {
        assert_eq!(FieldValue::from(Value::Amount(1234.5)), FieldValue::Amount(1235));
        assert_eq!(FieldValue::from(Value::Amount(-0.4)), FieldValue::Amount(0));
        assert_eq!(FieldValue::from(Value::Rate(0.4567)), FieldValue::Decimal(0.4567));
        assert_eq!(FieldValue::from(Value::Empty), FieldValue::Blank);
    }

    #[test]
    fn test_field_json_shape() {
        let field = Field { index: 3, line: "1z", value: FieldValue::Amount(50_000) };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"index": 3, "line": "1z", "value": {"kind": "amount", "value": 50000}})
        );
    }
}

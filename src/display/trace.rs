use crate::compute::CYCLE_BREAKS;
use crate::pass::TaxReturn;
use crate::store::LineId;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Renders the dependency tree behind one line as resolved in this pass.
///
/// The line is evaluated first if needed. Lines already printed higher in
/// the tree are shown as a reference to the level they first appeared at.
pub fn format_trace(r: &TaxReturn<'_>, target: LineId) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "AUDIT TRACE for line '{}':", target);
    let _ = writeln!(output, "--------------------------------------------------");

    if let Err(e) = r.value(target) {
        let _ = writeln!(output, "Error: {}", e);
        return output;
    }

    let mut dependencies: BTreeMap<LineId, Vec<LineId>> = BTreeMap::new();
    for (consumer, dependency) in r.dependency_edges() {
        dependencies.entry(consumer).or_default().push(dependency);
    }

    let mut tracer = Tracer { r, dependencies, visited_at_level: HashMap::new(), output };
    tracer.trace_line(target, 1, "");
    tracer.output
}

struct Tracer<'a, 'r> {
    r: &'a TaxReturn<'r>,
    dependencies: BTreeMap<LineId, Vec<LineId>>,
    visited_at_level: HashMap<LineId, usize>,
    output: String,
}

impl Tracer<'_, '_> {
    fn trace_line(&mut self, id: LineId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&id) {
            let _ = writeln!(self.output, "{}-> {} (Ref to L{})", prefix, id, first_seen);
            return;
        }
        self.visited_at_level.insert(id, level);

        let header = format!("[L{}] {}{}{}", level, id, self.format_value(id), self.annotation(id));
        let children = self.dependencies.get(&id).cloned().unwrap_or_default();
        if children.is_empty() {
            let _ = writeln!(self.output, "{}{} -> Input", prefix, header);
            return;
        }
        let _ = writeln!(self.output, "{}{}", prefix, header);

        let stem = build_child_stem(prefix);
        for (i, &child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`-- " } else { "|-- " };
            self.trace_line(child, level + 1, &format!("{}{}", stem, connector));
        }
    }

    fn format_value(&self, id: LineId) -> String {
        match self.r.cached(id) {
            Some(v) => format!(" [{}]", v),
            None => " [?]".to_string(),
        }
    }

    fn annotation(&self, id: LineId) -> String {
        for brk in CYCLE_BREAKS {
            if brk.restricted == id {
                return format!(" (excludes {})", brk.deduction);
            }
            if brk.deduction == id {
                return format!(" (limited by {})", brk.restricted);
            }
        }
        String::new()
    }
}

fn build_child_stem(prefix: &str) -> String {
    prefix.replace("`-- ", "    ").replace("|-- ", "|   ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Business, FilingStatus, ReturnInput};
    use crate::store::{FormRegistry, FormTag};

    #[test]
    fn test_trace_through_business_income() {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.businesses.push(Business { gross_receipts: 20_000.0, expenses: 5_000.0, ..Business::default() });
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();

        let trace = format_trace(&r, LineId::new(FormTag::Schedule1, "3"));
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines[0], "AUDIT TRACE for line 'schedule_1.3':");
        assert_eq!(lines[2], "[L1] schedule_1.3 [15000.00]");
        assert_eq!(lines[3], "`-- [L2] schedule_c.31 [15000.00]");
        assert!(trace.contains("schedule_c.1 [20000.00] -> Input"));
    }

    #[test]
    fn test_cycle_break_is_annotated() {
        let mut input = ReturnInput::new(2024, FilingStatus::Single);
        input.businesses.push(Business { gross_receipts: 40_000.0, ..Business::default() });
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let trace = format_trace(&r, LineId::new(FormTag::Form8995, "15"));
        assert!(trace.contains("form_8995.15"));
        assert!(trace.contains("(limited by f1040.taxable_income_before_qbi)"));
        assert!(trace.contains("(excludes form_8995.15)"));
    }

    #[test]
    fn test_unknown_line_reports_error() {
        let input = ReturnInput::new(2024, FilingStatus::Single);
        let registry = FormRegistry::default();
        let r = registry.prepare(&input).unwrap();
        let trace = format_trace(&r, LineId::new(FormTag::F1040, "nope"));
        assert!(trace.contains("Error:"));
    }
}

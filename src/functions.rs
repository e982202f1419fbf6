//! Report functions.
//!
//! A function is an event-driven aggregation: the driver hands it every event
//! of its report together with the row the event was produced for, and the
//! result is published as a virtual column of that row. Functions are
//! stateless definitions; their running values live in [`FunctionScopes`],
//! which the driver clones into every checkpoint.

use indexmap::IndexMap;
use quire_engine::ReportEvent;
use quire_flow::{CompoundDataRow, StaticDataRow};
use quire_traits::{DataRow, EvaluationError, ExpressionEvaluator, StoredValues};
use quire_types::{EventCode, FunctionStorageKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Prefix of the columns that expose values stored by the prepare pass.
pub const PREPARED_PREFIX: &str = "prepared.";

pub trait ReportFunction: Send + Sync + Debug {
    /// The column name the value is published under.
    fn name(&self) -> &str;

    fn initial_value(&self) -> Value {
        Value::from(0)
    }

    /// Computes the value after `event`.
    ///
    /// # Errors
    ///
    /// Reading an input field that does not exist, or a non-numeric input to
    /// a numeric aggregation.
    fn update(&self, current: &Value, event: &ReportEvent, row: &dyn DataRow) -> Result<Value, EvaluationError>;
}

/// `true` when `event` opens the group a function resets on.
fn starts_group(event: &ReportEvent, group: Option<&str>) -> bool {
    match group {
        Some(group) => {
            event.code.is(EventCode::GROUP_STARTED)
                && !event.code.is_artificial()
                && event.group_name.as_deref() == Some(group)
        }
        None => false,
    }
}

/// Counts item rows.
#[derive(Debug, Clone)]
pub struct ItemCount {
    name: String,
    reset_group: Option<String>,
}

impl ItemCount {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reset_group: None,
        }
    }

    /// Restarts the count whenever `group` starts.
    pub fn reset_on(mut self, group: impl Into<String>) -> Self {
        self.reset_group = Some(group.into());
        self
    }
}

impl ReportFunction for ItemCount {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, current: &Value, event: &ReportEvent, _row: &dyn DataRow) -> Result<Value, EvaluationError> {
        if starts_group(event, self.reset_group.as_deref()) {
            return Ok(self.initial_value());
        }
        if event.code.is(EventCode::ITEMS_ADVANCED) {
            return Ok(Value::from(current.as_u64().unwrap_or(0) + 1));
        }
        Ok(current.clone())
    }
}

/// Sums a numeric field over item rows. `null` values are skipped.
#[derive(Debug, Clone)]
pub struct ItemSum {
    name: String,
    field: String,
    reset_group: Option<String>,
}

impl ItemSum {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            reset_group: None,
        }
    }

    pub fn reset_on(mut self, group: impl Into<String>) -> Self {
        self.reset_group = Some(group.into());
        self
    }
}

impl ReportFunction for ItemSum {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, current: &Value, event: &ReportEvent, row: &dyn DataRow) -> Result<Value, EvaluationError> {
        if starts_group(event, self.reset_group.as_deref()) {
            return Ok(self.initial_value());
        }
        if !event.code.is(EventCode::ITEMS_ADVANCED) {
            return Ok(current.clone());
        }
        let value = row.get(&self.field).map_err(|source| EvaluationError::Data {
            expression: self.name.clone(),
            source,
        })?;
        add_numbers(current, &value).ok_or_else(|| EvaluationError::Failed {
            expression: self.name.clone(),
            message: format!("field '{}' is not numeric: {}", self.field, value),
        })
    }
}

fn add_numbers(current: &Value, value: &Value) -> Option<Value> {
    if value.is_null() {
        return Some(current.clone());
    }
    if let (Some(a), Some(b)) = (current.as_i64(), value.as_i64())
        && let Some(sum) = a.checked_add(b)
    {
        return Some(Value::from(sum));
    }
    Some(Value::from(current.as_f64()? + value.as_f64()?))
}

/// Counts how often a group starts.
#[derive(Debug, Clone)]
pub struct GroupCount {
    name: String,
    group: String,
    reset_group: Option<String>,
}

impl GroupCount {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            reset_group: None,
        }
    }

    pub fn reset_on(mut self, group: impl Into<String>) -> Self {
        self.reset_group = Some(group.into());
        self
    }
}

impl ReportFunction for GroupCount {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&self, current: &Value, event: &ReportEvent, _row: &dyn DataRow) -> Result<Value, EvaluationError> {
        let mut count = current.as_u64().unwrap_or(0);
        if starts_group(event, self.reset_group.as_deref()) {
            count = 0;
        }
        if starts_group(event, Some(&self.group)) {
            count += 1;
        }
        Ok(Value::from(count))
    }
}

/// Serializable description of a built-in function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FunctionSpec {
    ItemCount {
        name: String,
        #[serde(default)]
        reset_group: Option<String>,
    },
    ItemSum {
        name: String,
        field: String,
        #[serde(default)]
        reset_group: Option<String>,
    },
    GroupCount {
        name: String,
        group: String,
        #[serde(default)]
        reset_group: Option<String>,
    },
}

impl FunctionSpec {
    pub fn build(&self) -> Arc<dyn ReportFunction> {
        match self {
            FunctionSpec::ItemCount { name, reset_group } => {
                let mut f = ItemCount::new(name.as_str());
                f.reset_group = reset_group.clone();
                Arc::new(f)
            }
            FunctionSpec::ItemSum { name, field, reset_group } => {
                let mut f = ItemSum::new(name.as_str(), field.as_str());
                f.reset_group = reset_group.clone();
                Arc::new(f)
            }
            FunctionSpec::GroupCount { name, group, reset_group } => {
                let mut f = GroupCount::new(name.as_str(), group.as_str());
                f.reset_group = reset_group.clone();
                Arc::new(f)
            }
        }
    }
}

/// Functions and expressions attached to one report.
#[derive(Debug, Clone, Default)]
pub struct ScopeFunctions {
    pub functions: Vec<Arc<dyn ReportFunction>>,
    pub expressions: Vec<Arc<dyn ExpressionEvaluator>>,
}

/// Functions of the top-level report and of sub-reports, by report name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    report: ScopeFunctions,
    subreports: HashMap<String, ScopeFunctions>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: Arc<dyn ReportFunction>) {
        self.report.functions.push(function);
    }

    pub fn add_expression(&mut self, expression: Arc<dyn ExpressionEvaluator>) {
        self.report.expressions.push(expression);
    }

    pub fn add_subreport_function(&mut self, report: impl Into<String>, function: Arc<dyn ReportFunction>) {
        self.subreports.entry(report.into()).or_default().functions.push(function);
    }

    pub fn add_subreport_expression(&mut self, report: impl Into<String>, expression: Arc<dyn ExpressionEvaluator>) {
        self.subreports.entry(report.into()).or_default().expressions.push(expression);
    }

    /// The functions of the report at nesting `depth` named `report`.
    pub fn scope(&self, depth: usize, report: &str) -> Option<&ScopeFunctions> {
        if depth == 0 {
            Some(&self.report)
        } else {
            self.subreports.get(report)
        }
    }
}

#[derive(Debug, Clone)]
struct Scope {
    key: FunctionStorageKey,
    depth: usize,
    values: StoredValues,
    prepared: Option<StoredValues>,
}

/// Running function values, one scope per active report instance.
#[derive(Debug, Clone)]
pub struct FunctionScopes {
    stack: Vec<Scope>,
}

impl FunctionScopes {
    pub fn new(key: FunctionStorageKey, registry: &FunctionRegistry, prepared: Option<StoredValues>) -> Self {
        let mut scopes = Self { stack: Vec::new() };
        scopes.enter(key, 0, registry, prepared);
        scopes
    }

    /// Opens the scope of a sub-report instance.
    pub fn enter(
        &mut self,
        key: FunctionStorageKey,
        depth: usize,
        registry: &FunctionRegistry,
        prepared: Option<StoredValues>,
    ) {
        let values = registry
            .scope(depth, key.report_name())
            .map(|scope| {
                scope
                    .functions
                    .iter()
                    .map(|f| (f.name().to_string(), f.initial_value()))
                    .collect()
            })
            .unwrap_or_default();
        self.stack.push(Scope {
            key,
            depth,
            values,
            prepared,
        });
    }

    pub fn leave(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn current_key(&self) -> Option<&FunctionStorageKey> {
        self.stack.last().map(|scope| &scope.key)
    }

    pub fn current_values(&self) -> StoredValues {
        self.stack.last().map(|scope| scope.values.clone()).unwrap_or_default()
    }

    /// Feeds `event` to the functions of the innermost scope and evaluates
    /// its expressions. Returns the virtual columns to stack over `row`.
    ///
    /// # Errors
    ///
    /// The first function or expression failure.
    pub fn update(
        &mut self,
        registry: &FunctionRegistry,
        event: &ReportEvent,
        row: &dyn DataRow,
    ) -> Result<StaticDataRow, EvaluationError> {
        let Some(scope) = self.stack.last_mut() else {
            return Ok(StaticDataRow::new());
        };
        let functions = registry.scope(scope.depth, scope.key.report_name());

        let mut overrides = StaticDataRow::new();
        if let Some(prepared) = &scope.prepared {
            for (name, value) in prepared {
                overrides.set(format!("{PREPARED_PREFIX}{name}"), value.clone());
            }
        }
        let Some(functions) = functions else {
            return Ok(overrides);
        };

        let mut next: IndexMap<String, Value> = IndexMap::with_capacity(functions.functions.len());
        for function in &functions.functions {
            let current = scope
                .values
                .get(function.name())
                .cloned()
                .unwrap_or_else(|| function.initial_value());
            next.insert(function.name().to_string(), function.update(&current, event, row)?);
        }
        for (name, value) in &next {
            overrides.set(name.clone(), value.clone());
        }
        scope.values = next;

        for expression in &functions.expressions {
            let value = {
                let view = CompoundDataRow::new(&overrides, row);
                expression.evaluate(&view)?
            };
            overrides.set(expression.name(), value);
        }
        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_numbers() {
        assert_eq!(add_numbers(&json!(2), &json!(3)), Some(json!(5)));
        assert_eq!(add_numbers(&json!(2), &json!(0.5)), Some(json!(2.5)));
        assert_eq!(add_numbers(&json!(2), &Value::Null), Some(json!(2)));
        assert_eq!(add_numbers(&json!(2), &json!("x")), None);
    }

    #[test]
    fn test_function_spec_from_json() {
        let specs: Vec<FunctionSpec> = serde_json::from_value(json!([
            {"type": "item-count", "name": "rows"},
            {"type": "item-sum", "name": "total", "field": "Amount", "reset_group": "region"},
            {"type": "group-count", "name": "regions", "group": "region"}
        ]))
        .unwrap();

        let names: Vec<_> = specs.iter().map(|s| s.build().name().to_string()).collect();
        assert_eq!(names, vec!["rows", "total", "regions"]);
        assert_eq!(
            specs[1],
            FunctionSpec::ItemSum {
                name: "total".to_string(),
                field: "Amount".to_string(),
                reset_group: Some("region".to_string()),
            }
        );
    }

    #[test]
    fn test_scopes_stack_per_report_instance() {
        let mut registry = FunctionRegistry::new();
        registry.add_function(Arc::new(ItemCount::new("rows")));
        registry.add_subreport_function("lines", Arc::new(ItemCount::new("line_count")));

        let top = FunctionStorageKey::for_report(quire_types::InstanceId::generate(), "orders");
        let child = FunctionStorageKey::for_report(quire_types::InstanceId::generate(), "lines");
        let mut scopes = FunctionScopes::new(top.clone(), &registry, None);
        assert_eq!(scopes.current_key(), Some(&top));
        assert_eq!(scopes.current_values().get("rows"), Some(&json!(0)));

        scopes.enter(child.clone(), 1, &registry, None);
        assert_eq!(scopes.current_key(), Some(&child));
        assert!(scopes.current_values().contains_key("line_count"));

        scopes.leave();
        scopes.leave();
        assert_eq!(scopes.current_key(), Some(&top));
    }

    #[test]
    fn test_registry_scopes() {
        let mut registry = FunctionRegistry::new();
        registry.add_function(Arc::new(ItemCount::new("rows")));
        registry.add_subreport_function("lines", Arc::new(ItemCount::new("line_count")));

        assert_eq!(registry.scope(0, "anything").map(|s| s.functions.len()), Some(1));
        assert_eq!(registry.scope(1, "lines").map(|s| s.functions[0].name()), Some("line_count"));
        assert!(registry.scope(1, "other").is_none());
    }
}

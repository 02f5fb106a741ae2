//! SQL execution on an in-memory DataFusion session.
//!
//! Every call builds its own `SessionContext`, so tables created by one
//! submission are never visible to another. The session is seeded with a fixed
//! baseline schema plus tables derived from the test input, the statements run
//! in order, and the last result set is shaped into JSON text.

use super::Executor;
use crate::error::{JudgeError, JudgeResult};
use crate::input::{first_numeric_list, parse_arguments, trailing_scalar};
use crate::types::{ExecOutput, ExecutionStrategy, Fault, Invocation, Mode};
use async_trait::async_trait;
use datafusion::arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use datafusion::arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema,
    UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::arrow::util::display::{ArrayFormatter, FormatOptions};
use datafusion::datasource::MemTable;
use datafusion::prelude::{SessionConfig, SessionContext};
use serde_json::{Map, Number, Value};
use std::sync::{Arc, OnceLock};

pub struct QueryExecutor {
    session_config: OnceLock<SessionConfig>,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self {
            session_config: OnceLock::new(),
        }
    }

    fn session_config(&self) -> &SessionConfig {
        self.session_config.get_or_init(|| {
            // One partition keeps row order deterministic.
            SessionConfig::new()
                .with_target_partitions(1)
                .with_information_schema(true)
        })
    }

    fn new_session(&self, invocation: &Invocation) -> JudgeResult<SessionContext> {
        let ctx = SessionContext::new_with_config(self.session_config().clone());
        seed_baseline(&ctx)?;
        if let Mode::Judged { input, .. } = &invocation.mode {
            seed_from_input(&ctx, input)?;
        }
        Ok(ctx)
    }
}

#[async_trait]
impl Executor for QueryExecutor {
    fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::EmbeddedQuery
    }

    async fn execute(&self, invocation: &Invocation) -> JudgeResult<ExecOutput> {
        let ctx = self.new_session(invocation)?;

        let statements = split_statements(&invocation.code);
        if statements.is_empty() {
            return Ok(ExecOutput::faulted(
                "",
                Fault::Runtime("No SQL statement to execute".to_string()),
            ));
        }

        let mut last: Option<(Vec<String>, Vec<RecordBatch>)> = None;
        for statement in &statements {
            let frame = match ctx.sql(statement).await {
                Ok(frame) => frame,
                Err(e) => return Ok(ExecOutput::faulted("", Fault::Runtime(e.to_string()))),
            };
            let columns = frame
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect::<Vec<_>>();
            match frame.collect().await {
                Ok(batches) => last = Some((columns, batches)),
                Err(e) => return Ok(ExecOutput::faulted("", Fault::Runtime(e.to_string()))),
            }
        }

        let (columns, batches) = last.unwrap_or_default();
        let rows = collect_rows(&batches)?;
        let stdout = shape(&columns, rows, invocation.is_playground())?;
        Ok(ExecOutput::success(stdout))
    }
}

fn seed_baseline(ctx: &SessionContext) -> JudgeResult<()> {
    let employees = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("department", DataType::Utf8, false),
        Field::new("salary", DataType::Int64, false),
        Field::new("manager_id", DataType::Int64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
        Arc::new(StringArray::from(vec!["Alice", "Bob", "Carol", "Dave", "Eve"])),
        Arc::new(StringArray::from(vec![
            "Engineering",
            "Engineering",
            "Sales",
            "Sales",
            "Marketing",
        ])),
        Arc::new(Int64Array::from(vec![120000, 95000, 70000, 65000, 80000])),
        Arc::new(Int64Array::from(vec![None, Some(1), None, Some(3), None])),
    ];
    register(ctx, "employees", employees, columns)?;

    let departments = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3])),
        Arc::new(StringArray::from(vec!["Engineering", "Sales", "Marketing"])),
    ];
    register(ctx, "departments", departments, columns)
}

/// `nums(num)` from the first numeric list, `params(name, val)` from a
/// trailing number.
fn seed_from_input(ctx: &SessionContext, input: &str) -> JudgeResult<()> {
    let args = parse_arguments(input);

    if let Some(values) = first_numeric_list(&args) {
        let numbers = values.iter().filter_map(|v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        });
        let (field, column) = numeric_column("num", numbers);
        register(ctx, "nums", Arc::new(Schema::new(vec![field])), vec![column])?;
    }

    if let Some(target) = trailing_scalar(&args) {
        let (field, column) = numeric_column("val", std::iter::once(target));
        let schema = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            field,
        ]));
        let names: ArrayRef = Arc::new(StringArray::from(vec!["target"]));
        register(ctx, "params", schema, vec![names, column])?;
    }
    Ok(())
}

/// Int64 when every value is integral, Float64 otherwise.
fn numeric_column<'a>(name: &str, values: impl Iterator<Item = &'a Number>) -> (Field, ArrayRef) {
    let values: Vec<&Number> = values.collect();
    if values.iter().all(|n| n.is_i64()) {
        let ints: Vec<i64> = values.iter().filter_map(|n| n.as_i64()).collect();
        (
            Field::new(name, DataType::Int64, false),
            Arc::new(Int64Array::from(ints)),
        )
    } else {
        let floats: Vec<f64> = values.iter().filter_map(|n| n.as_f64()).collect();
        (
            Field::new(name, DataType::Float64, false),
            Arc::new(Float64Array::from(floats)),
        )
    }
}

fn register(
    ctx: &SessionContext,
    name: &str,
    schema: Arc<Schema>,
    columns: Vec<ArrayRef>,
) -> JudgeResult<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| JudgeError::Query(format!("seeding {name}: {e}")))?;
    let table = MemTable::try_new(schema, vec![vec![batch]])
        .map_err(|e| JudgeError::Query(format!("seeding {name}: {e}")))?;
    ctx.register_table(name, Arc::new(table))
        .map_err(|e| JudgeError::Query(format!("registering {name}: {e}")))?;
    Ok(())
}

/// Splits on `;` outside string literals and comments.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            ';' => {
                if !current.trim().is_empty() {
                    statements.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}

fn collect_rows(batches: &[RecordBatch]) -> JudgeResult<Vec<Vec<Value>>> {
    let mut rows = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|column| cell(column.as_ref(), row))
                .collect::<JudgeResult<Vec<_>>>()?;
            rows.push(values);
        }
    }
    Ok(rows)
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn cell(array: &dyn Array, row: usize) -> JudgeResult<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Int8 => Value::from(array.as_primitive::<Int8Type>().value(row)),
        DataType::Int16 => Value::from(array.as_primitive::<Int16Type>().value(row)),
        DataType::Int32 => Value::from(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => Value::from(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::from(array.as_primitive::<UInt8Type>().value(row)),
        DataType::UInt16 => Value::from(array.as_primitive::<UInt16Type>().value(row)),
        DataType::UInt32 => Value::from(array.as_primitive::<UInt32Type>().value(row)),
        DataType::UInt64 => Value::from(array.as_primitive::<UInt64Type>().value(row)),
        DataType::Float32 => float(f64::from(array.as_primitive::<Float32Type>().value(row))),
        DataType::Float64 => float(array.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(array.as_boolean().value(row)),
        DataType::Utf8 => Value::from(array.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Value::from(array.as_string::<i64>().value(row)),
        DataType::Utf8View => Value::from(array.as_string_view().value(row)),
        other => {
            let options = FormatOptions::default();
            let text = ArrayFormatter::try_new(array, &options)
                .map_err(|e| JudgeError::Query(e.to_string()))?
                .value(row)
                .to_string();
            if other.is_numeric() {
                text.parse::<f64>().map(float).unwrap_or(Value::String(text))
            } else {
                Value::String(text)
            }
        }
    };
    Ok(value)
}

/// One column or one row collapse to a flat list; anything else is an array
/// of records. Playground output is always records, pretty-printed.
fn shape(columns: &[String], rows: Vec<Vec<Value>>, playground: bool) -> JudgeResult<String> {
    let records = |rows: Vec<Vec<Value>>| -> Value {
        Value::Array(
            rows.into_iter()
                .map(|row| {
                    Value::Object(columns.iter().cloned().zip(row).collect::<Map<_, _>>())
                })
                .collect(),
        )
    };

    if playground {
        return Ok(serde_json::to_string_pretty(&records(rows))?);
    }

    let shaped = if columns.len() == 1 {
        Value::Array(rows.into_iter().filter_map(|row| row.into_iter().next()).collect())
    } else if rows.len() == 1 {
        Value::Array(rows.into_iter().flatten().collect())
    } else {
        records(rows)
    };
    Ok(serde_json::to_string(&shaped)?)
}

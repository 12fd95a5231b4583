//! JSON agent: schema validation and canonical reformatting

use crate::agent::{AgentOutcome, AgentRequest};
use crate::config::{truncate_chars, AgentConfig};
use crate::schema::{json_type_name, normalize_key, TargetSchema, ORDER};
use serde_json::{Map, Value};
use tracing::debug;
use triage_domain::{ExtractionResult, RawInput, StageMarker, ValidationAnomaly};

/// Wrapper keys whose object value is the real record
const WRAPPER_KEYS: &[&str] = &["orderrequest", "order"];

/// Field name used for whole-payload anomalies
const ROOT: &str = "$";

/// Validates payloads against a target schema and maps them onto canonical fields
///
/// The schema comes from the intent when the intent determines one,
/// otherwise it is inferred from the payload keys. Anomalies are reported
/// inside the result and never stop processing.
#[derive(Debug, Clone)]
pub struct JsonAgent {
    config: AgentConfig,
}

impl JsonAgent {
    /// Create a JSON agent
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub(crate) fn preview(&self, input: &RawInput) -> String {
        input.text_lossy()
    }

    pub(crate) fn process(&self, request: &AgentRequest<'_>) -> AgentOutcome {
        let mut result = ExtractionResult::empty(request.format);
        let text = request.input.text_lossy();
        result.content = truncate_chars(&text, self.config.max_content_chars).to_string();

        let payload: Value = match serde_json::from_slice(&request.input.bytes) {
            Ok(value) => value,
            Err(e) => {
                result
                    .anomalies
                    .push(ValidationAnomaly::structure(ROOT, format!("payload is not valid JSON: {}", e)));
                let mut outcome = AgentOutcome::new(result).with_detail("unparseable payload");
                outcome.mark(StageMarker::ValidationAnomalies);
                return outcome;
            }
        };

        let mut notes = Vec::new();
        let schema = match select_record(payload, &mut result) {
            Some(record) => {
                let record = unwrap_wrapper(record, &mut result.extra, &mut notes);
                let schema = TargetSchema::for_intent(request.intent)
                    .unwrap_or_else(|| TargetSchema::infer(&record));
                map_fields(schema, record, &mut result);
                if std::ptr::eq(schema, &ORDER) && derive_total(&mut result.fields) {
                    notes.push("total derived from items".to_string());
                }
                Some(schema)
            }
            None => None,
        };

        let schema_name = schema.map(|s| s.name).unwrap_or("none");
        debug!(
            "JSON payload mapped with schema '{}': {} fields, {} anomalies",
            schema_name,
            result.fields.len(),
            result.anomalies.len()
        );

        let mut detail = format!(
            "schema {}: {} fields, {} extra, {} anomalies",
            schema_name,
            result.fields.len(),
            result.extra.len(),
            result.anomalies.len()
        );
        for note in &notes {
            detail.push_str("; ");
            detail.push_str(note);
        }

        let has_anomalies = !result.anomalies.is_empty();
        let mut outcome = AgentOutcome::new(result).with_detail(detail);
        if has_anomalies {
            outcome.mark(StageMarker::ValidationAnomalies);
        }
        outcome
    }
}

/// Pick the object to map; arrays contribute their first record
fn select_record(payload: Value, result: &mut ExtractionResult) -> Option<Map<String, Value>> {
    match payload {
        Value::Object(map) => Some(map),
        Value::Array(mut records) => {
            if records.is_empty() {
                result
                    .anomalies
                    .push(ValidationAnomaly::structure(ROOT, "payload is an empty array"));
                return None;
            }
            let rest: Vec<Value> = records.drain(1..).collect();
            if !rest.is_empty() {
                result.anomalies.push(ValidationAnomaly::structure(
                    ROOT,
                    format!(
                        "array of {} records; only the first was mapped",
                        rest.len() + 1
                    ),
                ));
                result
                    .extra
                    .insert("additional_records".to_string(), Value::Array(rest));
            }
            match records.pop() {
                Some(Value::Object(map)) => Some(map),
                Some(other) => {
                    result.anomalies.push(ValidationAnomaly::structure(
                        ROOT,
                        format!("first record is {}, expected object", json_type_name(&other)),
                    ));
                    result.extra.insert("value".to_string(), other);
                    None
                }
                None => None,
            }
        }
        other => {
            result.anomalies.push(ValidationAnomaly::structure(
                ROOT,
                format!("payload is {}, expected object", json_type_name(&other)),
            ));
            result.extra.insert("value".to_string(), other);
            None
        }
    }
}

/// Descend into an `orderRequest` / `order` wrapper; siblings go to `extra`
fn unwrap_wrapper(
    mut record: Map<String, Value>,
    extra: &mut Map<String, Value>,
    notes: &mut Vec<String>,
) -> Map<String, Value> {
    let wrapper = record
        .iter()
        .find(|(k, v)| v.is_object() && WRAPPER_KEYS.contains(&normalize_key(k).as_str()))
        .map(|(k, _)| k.clone());

    let Some(key) = wrapper else {
        return record;
    };
    let Some(Value::Object(inner)) = record.remove(&key) else {
        return record;
    };

    extra.extend(record);
    notes.push(format!("unwrapped '{}'", key));
    inner
}

/// Map keys onto schema fields, then validate presence and types
fn map_fields(schema: &TargetSchema, record: Map<String, Value>, result: &mut ExtractionResult) {
    if schema.is_generic() {
        result.fields.extend(record);
        return;
    }

    for (key, value) in record {
        let normalized = normalize_key(&key);
        match schema.fields.iter().find(|f| f.matches(&normalized)) {
            Some(field) if !result.fields.contains_key(field.name) => {
                result.fields.insert(field.name.to_string(), value);
            }
            _ => {
                result.extra.insert(key, value);
            }
        }
    }

    for field in schema.fields {
        match result.fields.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    result.anomalies.push(ValidationAnomaly::missing(field.name));
                }
            }
            Some(value) if !field.field_type.accepts(value) => {
                result.anomalies.push(ValidationAnomaly::type_mismatch(
                    field.name,
                    field.field_type.describe(),
                    json_type_name(value),
                ));
            }
            Some(_) => {}
        }
    }
}

/// Fill `total_amount` from priced items when absent; true if it was derived
fn derive_total(fields: &mut Map<String, Value>) -> bool {
    if fields.contains_key("total_amount") {
        return false;
    }
    let Some(Value::Array(items)) = fields.get("items") else {
        return false;
    };

    let mut total = 0.0;
    let mut priced = false;
    for item in items.iter().filter_map(Value::as_object) {
        let lookup = |names: &[&str]| {
            item.iter()
                .find(|(k, _)| names.contains(&normalize_key(k).as_str()))
                .and_then(|(_, v)| v.as_f64())
        };
        if let Some(price) = lookup(&["unitprice", "price"]) {
            let quantity = lookup(&["quantity", "qty"]).unwrap_or(1.0);
            total += price * quantity;
            priced = true;
        }
    }

    if !priced {
        return false;
    }
    match serde_json::Number::from_f64(total) {
        Some(number) => {
            fields.insert("total_amount".to_string(), Value::Number(number));
            true
        }
        None => false,
    }
}

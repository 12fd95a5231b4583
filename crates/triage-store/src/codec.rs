//! Field-level encoding of contexts
//!
//! Every context field is stored under its own name with a JSON value, so
//! a patch touches only the fields it carries.

use crate::backend::FieldEntries;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use triage_domain::{ContextPatch, ProcessingContext, StageRecord};

pub(crate) const THREAD_ID: &str = "thread_id";
pub(crate) const SOURCE: &str = "source";
pub(crate) const FORMAT: &str = "format";
pub(crate) const INTENT: &str = "intent";
pub(crate) const CONFIDENCE: &str = "confidence";
pub(crate) const EXTRACTED: &str = "extracted";
pub(crate) const CREATED_AT: &str = "created_at";
pub(crate) const UPDATED_AT: &str = "updated_at";

fn encode<T: Serialize>(name: &str, value: &T) -> Result<(String, String), StoreError> {
    Ok((name.to_string(), serde_json::to_string(value)?))
}

fn decode<T: DeserializeOwned>(fields: &HashMap<String, String>, name: &str) -> Result<T, StoreError> {
    let raw = fields
        .get(name)
        .ok_or_else(|| StoreError::Serialization(format!("stored context lacks '{}'", name)))?;
    serde_json::from_str(raw)
        .map_err(|e| StoreError::Serialization(format!("field '{}': {}", name, e)))
}

/// Clamp into [0, 1]; NaN becomes 0
pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Encode the scalar fields of a new context (the chain is stored separately)
pub(crate) fn encode_context(ctx: &ProcessingContext) -> Result<FieldEntries, StoreError> {
    let mut entries = vec![
        encode(THREAD_ID, &ctx.thread_id)?,
        encode(SOURCE, &ctx.source)?,
        encode(FORMAT, &ctx.format)?,
        encode(INTENT, &ctx.intent)?,
        encode(CONFIDENCE, &clamp_confidence(ctx.confidence))?,
        encode(CREATED_AT, &ctx.created_at)?,
        encode(UPDATED_AT, &ctx.updated_at)?,
    ];
    if let Some(extracted) = &ctx.extracted {
        entries.push(encode(EXTRACTED, extracted)?);
    }
    Ok(entries)
}

/// Encode the fields a patch touches, plus the new `updated_at`
pub(crate) fn encode_patch(
    patch: &ContextPatch,
    updated_at: DateTime<Utc>,
) -> Result<FieldEntries, StoreError> {
    let mut entries = Vec::new();
    if let Some(format) = &patch.format {
        entries.push(encode(FORMAT, format)?);
    }
    if let Some(intent) = &patch.intent {
        entries.push(encode(INTENT, intent)?);
    }
    if let Some(confidence) = patch.confidence {
        entries.push(encode(CONFIDENCE, &clamp_confidence(confidence))?);
    }
    if let Some(extracted) = &patch.extracted {
        entries.push(encode(EXTRACTED, extracted)?);
    }
    entries.push(encode(UPDATED_AT, &updated_at)?);
    Ok(entries)
}

/// Encode `updated_at` alone
pub(crate) fn encode_touch(updated_at: DateTime<Utc>) -> Result<FieldEntries, StoreError> {
    Ok(vec![encode(UPDATED_AT, &updated_at)?])
}

pub(crate) fn encode_record(record: &StageRecord) -> Result<String, StoreError> {
    Ok(serde_json::to_string(record)?)
}

/// Rebuild a context from stored fields and chain records
pub(crate) fn decode_context(
    fields: &HashMap<String, String>,
    chain: &[String],
) -> Result<ProcessingContext, StoreError> {
    let extracted = match fields.get(EXTRACTED) {
        Some(_) => Some(decode(fields, EXTRACTED)?),
        None => None,
    };

    let chain = chain
        .iter()
        .map(|raw| serde_json::from_str::<StageRecord>(raw).map_err(StoreError::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProcessingContext {
        thread_id: decode(fields, THREAD_ID)?,
        source: decode(fields, SOURCE)?,
        format: decode(fields, FORMAT)?,
        intent: decode(fields, INTENT)?,
        confidence: decode(fields, CONFIDENCE)?,
        extracted,
        chain,
        created_at: decode(fields, CREATED_AT)?,
        updated_at: decode(fields, UPDATED_AT)?,
    })
}

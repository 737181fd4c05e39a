use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::repository::SubmissionRecord;

/// Submitter identity and the five score fields lead every export.
pub const PREFERRED_COLUMNS: [&str; 10] = [
    "submitter.facility_code",
    "submitter.submitter_id",
    "submitter.latitude",
    "submitter.longitude",
    "submitter.reference_link",
    "need_identification.need_score",
    "operations_network.ops_score",
    "location_strategy.loc_score",
    "facility_specs.facility_score",
    "totals.total_score",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Flatten a JSON document into dotted keys. Lists are joined with `"; "`.
pub fn flatten_value(value: &Value) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    flatten_into("", value, &mut flat);
    flat
}

fn flatten_into(prefix: &str, value: &Value, flat: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, nested, flat);
            }
        }
        other => {
            flat.insert(prefix.to_string(), scalar_text(other));
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Flattened export row; column-level fields fill gaps a payload leaves.
pub fn record_row(record: &SubmissionRecord) -> Result<BTreeMap<String, String>, ExportError> {
    let mut row = match &record.answer_payload {
        Some(payload) => flatten_value(&serde_json::to_value(payload)?),
        None => BTreeMap::new(),
    };

    let defaults = [
        (
            "submitter.facility_code",
            record
                .facility_code
                .as_ref()
                .map(|code| code.as_str().to_string())
                .unwrap_or_default(),
        ),
        ("submitter.submitter_id", record.submitter_id.clone()),
        ("submitter.latitude", record.latitude.to_string()),
        ("submitter.longitude", record.longitude.to_string()),
        (
            "submitter.reference_link",
            record.reference_link.clone().unwrap_or_default(),
        ),
        ("totals.total_score", record.total_score.to_string()),
    ];
    for (column, value) in defaults {
        row.entry(column.to_string()).or_insert(value);
    }

    Ok(row)
}

/// Preferred columns first, then every other key in lexicographic order.
pub fn ordered_columns<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let present: BTreeSet<&String> = keys.into_iter().collect();
    let mut columns: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|column| present.iter().any(|key| key.as_str() == **column))
        .map(|column| column.to_string())
        .collect();
    columns.extend(
        present
            .into_iter()
            .filter(|key| !PREFERRED_COLUMNS.contains(&key.as_str()))
            .cloned(),
    );
    columns
}

/// Render records as CSV. No records yields an empty document.
pub fn export_csv(records: &[SubmissionRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let rows = records
        .iter()
        .map(record_row)
        .collect::<Result<Vec<_>, _>>()?;
    let columns = ordered_columns(rows.iter().flat_map(|row| row.keys()));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in &rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or("")),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

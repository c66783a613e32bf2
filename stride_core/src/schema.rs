//! Schema validation and migration for the versioned plan document.
//!
//! Validation runs against raw JSON before typed decoding, so a single
//! import attempt surfaces every structural problem at once rather than
//! stopping at the first. Normalization repairs the legacy shapes the
//! format has accumulated (bucket holes, missing `measurementType`).

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{Plan, PlanDocument, PlanSettings, PlanSource, Weekday, WorkoutType};

/// Version stamped on every wrapped document
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Aggregated outcome of validating a raw document
#[derive(Debug)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate a raw document against the wrapper shape.
///
/// Collects every structural violation with a `week N, Day, workout I` path
/// prefix. Null bucket entries are skipped here because [`normalize`] drops
/// them before typed decoding. The `version` field is the importer's
/// concern, not checked here.
pub fn validate(raw: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    match raw.as_object() {
        None => errors.push("document root is not an object".to_string()),
        Some(root) => {
            if !root.contains_key("settings") {
                errors.push("missing settings".to_string());
            }
            match root.get("plan") {
                None => errors.push("missing plan".to_string()),
                Some(plan) => validate_plan(plan, &mut errors),
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn validate_plan(plan: &Value, errors: &mut Vec<String>) {
    let Some(obj) = plan.as_object() else {
        errors.push("plan is not an object".to_string());
        return;
    };
    match obj.get("weeks") {
        None => errors.push("plan has no weeks".to_string()),
        Some(Value::Array(weeks)) => {
            for (pos, entry) in weeks.iter().enumerate() {
                validate_week(entry, pos, errors);
            }
        }
        Some(_) => errors.push("weeks is not a sequence".to_string()),
    }
}

fn validate_week(entry: &Value, pos: usize, errors: &mut Vec<String>) {
    let expected = (pos + 1) as u64;
    let Some(obj) = entry.as_object() else {
        errors.push(format!("week entry {expected}: not an object"));
        return;
    };

    let label = match obj.get("week").and_then(Value::as_u64) {
        Some(n) => {
            if n != expected {
                errors.push(format!(
                    "week entry {expected}: week number {n} is out of sequence"
                ));
            }
            n
        }
        None => {
            errors.push(format!("week entry {expected}: missing week number"));
            expected
        }
    };

    if obj.get("startDate").and_then(Value::as_str).is_none() {
        errors.push(format!("week {label}: missing startDate"));
    }

    match obj.get("days") {
        None => errors.push(format!("week {label}: missing days")),
        Some(Value::Object(days)) => {
            for (key, bucket) in days {
                match Weekday::from_key(key) {
                    Some(day) => validate_bucket(bucket, label, day, errors),
                    None => errors.push(format!(
                        "week {label}: \"{key}\" is not a day key (expected one of: {})",
                        Weekday::key_list()
                    )),
                }
            }
        }
        Some(_) => errors.push(format!("week {label}: days is not an object")),
    }
}

fn validate_bucket(bucket: &Value, week: u64, day: Weekday, errors: &mut Vec<String>) {
    let Some(entries) = bucket.as_array() else {
        errors.push(format!("week {week}, {day}: bucket is not a sequence"));
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_null() {
            continue;
        }
        validate_workout(entry, week, day, index, errors);
    }
}

fn validate_workout(entry: &Value, week: u64, day: Weekday, index: usize, errors: &mut Vec<String>) {
    let path = format!("week {week}, {day}, workout {index}");
    let Some(obj) = entry.as_object() else {
        errors.push(format!("{path}: not an object"));
        return;
    };

    match obj.get("type").and_then(Value::as_str) {
        None => errors.push(format!("{path}: missing workout type")),
        Some(t) => {
            if WorkoutType::from_key(t).is_none() {
                errors.push(format!(
                    "{path}: unknown workout type \"{t}\" (expected one of: {})",
                    WorkoutType::key_list()
                ));
            }
        }
    }

    let has_distance = obj.get("distance").is_some_and(|v| !v.is_null());
    let has_time = obj.get("time").is_some_and(|v| !v.is_null());

    match obj.get("measurementType").and_then(Value::as_str) {
        Some("distance") => match obj.get("distance").and_then(Value::as_f64) {
            None => errors.push(format!(
                "{path}: measurementType is distance but distance is missing"
            )),
            Some(d) if d < 0.0 => {
                errors.push(format!("{path}: distance must not be negative"));
            }
            Some(_) => {}
        },
        Some("time") => match obj.get("time").and_then(Value::as_f64) {
            None => errors.push(format!(
                "{path}: measurementType is time but time is missing"
            )),
            Some(t) if t <= 0.0 => {
                errors.push(format!("{path}: time must be positive"));
            }
            Some(_) => {}
        },
        Some(other) => errors.push(format!(
            "{path}: measurementType \"{other}\" is not \"distance\" or \"time\""
        )),
        None => {
            if obj.contains_key("measurementType") {
                errors.push(format!("{path}: measurementType is not a string"));
            } else if !has_distance && !has_time {
                errors.push(format!("{path}: workout has neither distance nor time"));
            }
        }
    }
}

/// Repair legacy and defective shapes in a raw plan value.
///
/// - drops null entries inside day buckets
/// - backfills missing day keys with empty buckets
/// - mints an id for workouts that lack one
/// - infers a missing `measurementType` from whichever field is present
///   (distance takes priority when both are)
/// - removes the field the tag does not select
pub fn normalize(plan: &mut Value) {
    let Some(weeks) = plan.get_mut("weeks").and_then(Value::as_array_mut) else {
        return;
    };
    for week in weeks {
        let Some(days) = week.get_mut("days").and_then(Value::as_object_mut) else {
            continue;
        };
        for day in Weekday::ALL {
            let bucket = days
                .entry(day.key())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Some(entries) = bucket.as_array_mut() else {
                continue;
            };
            let before = entries.len();
            entries.retain(|e| !e.is_null());
            if entries.len() != before {
                tracing::warn!(
                    "dropped {} null workout entries from {} bucket",
                    before - entries.len(),
                    day
                );
            }
            for entry in entries {
                normalize_workout(entry);
            }
        }
    }
}

fn normalize_workout(entry: &mut Value) {
    let Some(obj) = entry.as_object_mut() else {
        return;
    };

    if !obj.contains_key("id") {
        obj.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }

    let tag = match obj.get("measurementType").and_then(Value::as_str) {
        Some(t) => t.to_string(),
        None => {
            // Legacy records carry only the bare field; distance wins if both
            let inferred = if obj.get("distance").is_some_and(|v| !v.is_null()) {
                "distance"
            } else if obj.get("time").is_some_and(|v| !v.is_null()) {
                "time"
            } else {
                return;
            };
            obj.insert(
                "measurementType".to_string(),
                Value::String(inferred.to_string()),
            );
            inferred.to_string()
        }
    };

    match tag.as_str() {
        "distance" => {
            obj.remove("time");
        }
        "time" => {
            obj.remove("distance");
        }
        _ => {}
    }
}

/// Wrap a settings/plan pair in a fresh versioned envelope
pub fn wrap(settings: PlanSettings, plan: Plan, source: PlanSource) -> PlanDocument {
    let now = Utc::now();
    tracing::debug!("wrapping {}-week plan as {:?}", plan.weeks.len(), source);
    PlanDocument {
        version: SCHEMA_VERSION.to_string(),
        created_at: now,
        updated_at: now,
        source,
        settings,
        plan,
    }
}

/// Mark a document as touched by an edit.
///
/// Bumps `updatedAt` and advances provenance Generated → Edited; a document
/// that is already Edited or Imported keeps its source (the transition is
/// one-way).
pub fn revise_after_edit(doc: &mut PlanDocument) {
    doc.updated_at = Utc::now();
    if doc.source == PlanSource::Generated {
        doc.source = PlanSource::Edited;
        tracing::debug!("document source advanced to edited");
    }
}

//! Core document model for the Stride training-plan engine.
//!
//! This module defines the plan document tree:
//! - Workouts and their single measurement (distance or time)
//! - Day buckets and the fixed seven-day schedule
//! - Weeks with derived totals, and the plan itself
//! - Generation settings and the versioned document wrapper

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::units::Unit;

// ============================================================================
// Workout Types
// ============================================================================

/// Kind of scheduled workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Rest,
    Easy,
    Long,
    Interval,
    Tempo,
    Race,
    Strength,
}

impl WorkoutType {
    /// All workout kinds, in display order
    pub const ALL: [WorkoutType; 7] = [
        WorkoutType::Rest,
        WorkoutType::Easy,
        WorkoutType::Long,
        WorkoutType::Interval,
        WorkoutType::Tempo,
        WorkoutType::Race,
        WorkoutType::Strength,
    ];

    /// The serialized form of this kind
    pub fn key(self) -> &'static str {
        match self {
            WorkoutType::Rest => "rest",
            WorkoutType::Easy => "easy",
            WorkoutType::Long => "long",
            WorkoutType::Interval => "interval",
            WorkoutType::Tempo => "tempo",
            WorkoutType::Race => "race",
            WorkoutType::Strength => "strength",
        }
    }

    /// Parse a serialized workout kind (exact match on the lowercase key)
    pub fn from_key(s: &str) -> Option<WorkoutType> {
        WorkoutType::ALL.into_iter().find(|t| t.key() == s)
    }

    /// Comma-joined list of legal keys, for validation messages
    pub fn key_list() -> String {
        WorkoutType::ALL
            .iter()
            .map(|t| t.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The single measurement a workout carries.
///
/// Internally tagged on `measurementType`, so the serialized form is the
/// flat legacy record (`{"measurementType": "distance", "distance": 5.0}`)
/// while the in-memory form can never hold both a distance and a time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "measurementType", rename_all = "lowercase")]
pub enum Measurement {
    /// Distance in kilometers
    Distance { distance: f64 },
    /// Duration in minutes
    Time { time: f64 },
}

impl Measurement {
    /// Distance in kilometers, if this is a distance measurement
    pub fn distance_km(&self) -> Option<f64> {
        match self {
            Measurement::Distance { distance } => Some(*distance),
            Measurement::Time { .. } => None,
        }
    }

    /// Duration in minutes, if this is a time measurement
    pub fn minutes(&self) -> Option<f64> {
        match self {
            Measurement::Time { time } => Some(*time),
            Measurement::Distance { .. } => None,
        }
    }
}

/// One scheduled activity on a calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: WorkoutType,
    #[serde(flatten)]
    pub measure: Measurement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Workout {
    /// Create a workout with a freshly minted id
    pub fn new(kind: WorkoutType, measure: Measurement) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            measure,
            nickname: None,
            description: None,
        }
    }
}

// ============================================================================
// Days and Weeks
// ============================================================================

/// Day-of-week key for a bucket within a training week
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// The seven days, Monday first
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Position within the week, 0 = Monday
    pub fn index(self) -> usize {
        self as usize
    }

    /// The serialized day key
    pub fn key(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }

    /// Parse an exact serialized day key ("Mon".."Sun")
    pub fn from_key(s: &str) -> Option<Weekday> {
        Weekday::ALL.into_iter().find(|d| d.key() == s)
    }

    /// Lenient parse for user input ("mon", "Monday", ...)
    pub fn parse(s: &str) -> Option<Weekday> {
        let lower = s.to_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|d| lower.starts_with(&d.key().to_lowercase()))
    }

    /// Comma-joined list of legal day keys, for validation messages
    pub fn key_list() -> String {
        Weekday::ALL
            .iter()
            .map(|d| d.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The seven ordered workout buckets of one training week.
///
/// Held as a fixed-size array so an invalid day key is unrepresentable;
/// serialized as the `{"Mon": [...], ..., "Sun": [...]}` map with all seven
/// keys always present.
#[derive(Clone, Debug, PartialEq)]
pub struct DaySchedule([Vec<Workout>; 7]);

impl DaySchedule {
    pub fn bucket(&self, day: Weekday) -> &[Workout] {
        &self.0[day.index()]
    }

    pub fn bucket_mut(&mut self, day: Weekday) -> &mut Vec<Workout> {
        &mut self.0[day.index()]
    }

    /// Iterate buckets in Mon..Sun order
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[Workout])> {
        Weekday::ALL.into_iter().map(move |d| (d, self.bucket(d)))
    }

    /// Total number of workouts across all seven buckets
    pub fn workout_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }
}

impl Default for DaySchedule {
    fn default() -> Self {
        Self(std::array::from_fn(|_| Vec::new()))
    }
}

impl Serialize for DaySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        for day in Weekday::ALL {
            map.serialize_entry(day.key(), self.bucket(day))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DaySchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DayScheduleVisitor;

        impl<'de> Visitor<'de> for DayScheduleVisitor {
            type Value = DaySchedule;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    "a map of day keys ({}) to workout lists",
                    Weekday::key_list()
                )
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut schedule = DaySchedule::default();
                while let Some(key) = access.next_key::<String>()? {
                    let day = Weekday::from_key(&key).ok_or_else(|| {
                        serde::de::Error::custom(format!(
                            "unknown day key \"{}\" (expected one of: {})",
                            key,
                            Weekday::key_list()
                        ))
                    })?;
                    *schedule.bucket_mut(day) = access.next_value()?;
                }
                Ok(schedule)
            }
        }

        deserializer.deserialize_map(DayScheduleVisitor)
    }
}

/// One training week: a start date, seven day buckets, and a derived total
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    /// 1-based sequential week number
    pub week: u32,
    /// Calendar date of this week's first day
    pub start_date: NaiveDate,
    pub days: DaySchedule,
    /// Derived: whole-unit-rounded sum of distance workouts this week
    #[serde(default)]
    pub weekly_total: f64,
}

impl Week {
    pub fn new(week: u32, start_date: NaiveDate) -> Self {
        Self {
            week,
            start_date,
            days: DaySchedule::default(),
            weekly_total: 0.0,
        }
    }

    /// Restore the weekly-total invariant by folding all seven buckets.
    ///
    /// Always a full fold over the current buckets, never an incremental
    /// adjustment. Time-measured workouts contribute nothing.
    pub fn recompute_total(&mut self) {
        let sum: f64 = self
            .days
            .iter()
            .flat_map(|(_, bucket)| bucket)
            .filter_map(|w| w.measure.distance_km())
            .sum();
        // A fold over an empty set of distance workouts yields IEEE -0.0,
        // which round() preserves; normalize so a zero total never renders
        // as "-0". -0.0 == 0.0, so this changes no numeric value.
        let total = sum.round();
        self.weekly_total = if total == 0.0 { 0.0 } else { total };
    }
}

/// The full ordered sequence of training weeks
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub weeks: Vec<Week>,
}

impl Plan {
    /// Look up a week by its 1-based week number
    pub fn week(&self, number: u32) -> Option<&Week> {
        self.weeks.iter().find(|w| w.week == number)
    }

    pub fn week_mut(&mut self, number: u32) -> Option<&mut Week> {
        self.weeks.iter_mut().find(|w| w.week == number)
    }

    /// Total number of workouts across the whole plan
    pub fn workout_count(&self) -> usize {
        self.weeks.iter().map(|w| w.days.workout_count()).sum()
    }
}

// ============================================================================
// Generation Settings
// ============================================================================

/// Race distance category, with a custom numeric override
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RaceDistance {
    #[serde(rename = "5k")]
    FiveK,
    #[serde(rename = "10k")]
    TenK,
    #[serde(rename = "half")]
    Half,
    Marathon,
    Custom { km: f64 },
}

impl RaceDistance {
    /// The race distance in kilometers
    pub fn km(&self) -> f64 {
        match self {
            RaceDistance::FiveK => 5.0,
            RaceDistance::TenK => 10.0,
            RaceDistance::Half => 21.0975,
            RaceDistance::Marathon => 42.195,
            RaceDistance::Custom { km } => *km,
        }
    }
}

/// One weekday → workout-type assignment from the generation form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAssignment {
    pub day: Weekday,
    pub workout: WorkoutType,
}

/// The raw parameters the external generator consumed to produce a plan.
///
/// The engine treats these as already validated when they arrive through a
/// direct generation call; they are only re-validated on import.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSettings {
    /// Reference "today" used when the plan was generated
    pub today: NaiveDate,
    pub race_date: NaiveDate,
    pub race_distance: RaceDistance,
    /// Display unit the plan's distances are currently expressed in
    pub unit: Unit,
    #[serde(default)]
    pub training_days: Vec<DayAssignment>,
}

// ============================================================================
// Versioned Wrapper
// ============================================================================

/// Provenance of the current document
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Generated,
    Imported,
    Edited,
}

/// The versioned, provenance-tagged envelope around a plan and its settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source: PlanSource,
    pub settings: PlanSettings,
    pub plan: Plan,
}

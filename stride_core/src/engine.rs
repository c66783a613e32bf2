//! Mutation engine for the plan document.
//!
//! Every operation leaves the document satisfying its invariants before
//! returning: weekly totals are restored by a full fold of the affected
//! week(s), never by incremental adjustment, so repeated edits cannot
//! accumulate floating-point drift.
//!
//! Targets that do not address an existing week/day/workout are reported as
//! [`Error::InvalidTarget`] instead of being silently ignored; a silent
//! no-op would let the caller's optimistic view drift from the document.
//! The one documented exception is the destination index of a move or
//! reorder, which clamps to the end of the bucket.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::units::{self, Unit};
use crate::{Measurement, Plan, Week, Weekday, Workout, WorkoutType};

/// Caller-supplied fields for a new workout
#[derive(Clone, Debug)]
pub struct WorkoutSpec {
    pub kind: WorkoutType,
    /// Defaulted when absent: 5 km distance, except Strength (0 km)
    pub measure: Option<Measurement>,
    pub nickname: Option<String>,
    pub description: Option<String>,
}

impl WorkoutSpec {
    pub fn new(kind: WorkoutType) -> Self {
        Self {
            kind,
            measure: None,
            nickname: None,
            description: None,
        }
    }
}

/// Partial update for an existing workout.
///
/// Supplying a new [`Measurement`] replaces the whole variant, which is the
/// type-level form of "switching measurement type clears the other field".
#[derive(Clone, Debug, Default)]
pub struct WorkoutUpdate {
    pub kind: Option<WorkoutType>,
    pub measure: Option<Measurement>,
    pub description: Option<String>,
}

fn week_mut(plan: &mut Plan, week: u32) -> Result<&mut Week> {
    plan.week_mut(week)
        .ok_or_else(|| Error::InvalidTarget(format!("week {week} does not exist")))
}

fn check_index(len: usize, index: usize, week: u32, day: Weekday) -> Result<()> {
    if index >= len {
        return Err(Error::InvalidTarget(format!(
            "workout {index} does not exist in week {week}, {day} ({len} scheduled)"
        )));
    }
    Ok(())
}

fn default_measure(kind: WorkoutType) -> Measurement {
    // Strength sessions carry no mileage by default
    let distance = if kind == WorkoutType::Strength { 0.0 } else { 5.0 };
    Measurement::Distance { distance }
}

/// Append a new workout to the end of a day bucket.
///
/// Returns the freshly minted id. Recomputes the week's total.
pub fn add_workout(plan: &mut Plan, week: u32, day: Weekday, spec: WorkoutSpec) -> Result<Uuid> {
    let kind = spec.kind;
    let measure = spec.measure.unwrap_or_else(|| default_measure(kind));
    let mut workout = Workout::new(kind, measure);
    workout.nickname = spec.nickname.filter(|s| !s.trim().is_empty());
    workout.description = spec.description.filter(|s| !s.is_empty());
    let id = workout.id;

    let entry = week_mut(plan, week)?;
    entry.days.bucket_mut(day).push(workout);
    entry.recompute_total();

    tracing::debug!("added {} workout {} to week {}, {}", kind.key(), id, week, day);
    Ok(id)
}

/// Apply a partial update to the workout at the given position.
///
/// Recomputes the week's total, since the kind and measurement can both
/// affect it.
pub fn update_workout(
    plan: &mut Plan,
    week: u32,
    day: Weekday,
    index: usize,
    update: WorkoutUpdate,
) -> Result<()> {
    let entry = week_mut(plan, week)?;
    let bucket = entry.days.bucket_mut(day);
    check_index(bucket.len(), index, week, day)?;

    let workout = &mut bucket[index];
    if let Some(kind) = update.kind {
        workout.kind = kind;
    }
    if let Some(measure) = update.measure {
        workout.measure = measure;
    }
    if let Some(description) = update.description {
        workout.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
    }

    entry.recompute_total();
    Ok(())
}

/// Set or clear a workout's nickname.
///
/// Empty or whitespace-only text is stored as absent so the serialized
/// document stays compact. Totals are unaffected.
pub fn update_nickname(
    plan: &mut Plan,
    week: u32,
    day: Weekday,
    index: usize,
    nickname: &str,
) -> Result<()> {
    let entry = week_mut(plan, week)?;
    let bucket = entry.days.bucket_mut(day);
    check_index(bucket.len(), index, week, day)?;

    let trimmed = nickname.trim();
    bucket[index].nickname = if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    };
    Ok(())
}

/// Delete the workout at the given position; later entries shift down.
///
/// Returns the removed workout. Recomputes the week's total.
pub fn remove_workout(plan: &mut Plan, week: u32, day: Weekday, index: usize) -> Result<Workout> {
    let entry = week_mut(plan, week)?;
    let bucket = entry.days.bucket_mut(day);
    check_index(bucket.len(), index, week, day)?;

    let removed = bucket.remove(index);
    entry.recompute_total();

    tracing::debug!("removed workout {} from week {}, {}", removed.id, week, day);
    Ok(removed)
}

/// Move a workout to a new position within its own day bucket.
///
/// The destination clamps to the end of the bucket; the week's total cannot
/// change, so no recomputation happens.
pub fn reorder_within_day(
    plan: &mut Plan,
    week: u32,
    day: Weekday,
    from: usize,
    to: usize,
) -> Result<()> {
    let entry = week_mut(plan, week)?;
    let bucket = entry.days.bucket_mut(day);
    check_index(bucket.len(), from, week, day)?;

    let workout = bucket.remove(from);
    let to = to.min(bucket.len());
    bucket.insert(to, workout);
    Ok(())
}

/// Relocate one workout between day buckets, possibly across weeks.
///
/// Both endpoints are validated before anything is touched, so a failed
/// move never loses the workout. The destination index clamps to append
/// (the empty-bucket drop case). The source week's total is recomputed
/// first, then the destination week's if different; a same-week move is
/// recomputed exactly once, after both halves have been applied.
#[allow(clippy::too_many_arguments)]
pub fn move_workout(
    plan: &mut Plan,
    from_week: u32,
    from_day: Weekday,
    from_index: usize,
    to_week: u32,
    to_day: Weekday,
    to_index: usize,
) -> Result<()> {
    let source_len = plan
        .week(from_week)
        .ok_or_else(|| Error::InvalidTarget(format!("week {from_week} does not exist")))?
        .days
        .bucket(from_day)
        .len();
    check_index(source_len, from_index, from_week, from_day)?;
    if plan.week(to_week).is_none() {
        return Err(Error::InvalidTarget(format!("week {to_week} does not exist")));
    }

    let workout = week_mut(plan, from_week)?
        .days
        .bucket_mut(from_day)
        .remove(from_index);
    let id = workout.id;

    {
        let bucket = week_mut(plan, to_week)?.days.bucket_mut(to_day);
        let at = to_index.min(bucket.len());
        bucket.insert(at, workout);
    }

    week_mut(plan, from_week)?.recompute_total();
    if to_week != from_week {
        week_mut(plan, to_week)?.recompute_total();
    }

    tracing::debug!(
        "moved workout {} from week {}, {} to week {}, {}",
        id,
        from_week,
        from_day,
        to_week,
        to_day
    );
    Ok(())
}

/// Rewrite every distance-measured workout into the target unit and
/// recompute every weekly total.
///
/// Distances are rounded to one decimal place, so converting there and back
/// is only approximately idempotent (within 0.1 of the original); see
/// [`crate::units`]. Time-measured workouts are untouched. The plan is
/// mutated in one pass with no fallible step, so the caller never observes
/// a partially converted plan.
pub fn convert_units(plan: &mut Plan, from: Unit, to: Unit) {
    if from == to {
        return;
    }
    for week in &mut plan.weeks {
        for day in Weekday::ALL {
            for workout in week.days.bucket_mut(day) {
                if let Measurement::Distance { distance } = &mut workout.measure {
                    *distance = units::round1(units::convert(*distance, from, to));
                }
            }
        }
        week.recompute_total();
    }
    tracing::info!("converted plan distances from {} to {}", from, to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn plan_with_weeks(count: u32) -> Plan {
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut plan = Plan::default();
        for n in 1..=count {
            let date = start + chrono::Duration::weeks(i64::from(n) - 1);
            plan.weeks.push(Week::new(n, date));
        }
        plan
    }

    fn distance_spec(kind: WorkoutType, km: f64) -> WorkoutSpec {
        WorkoutSpec {
            measure: Some(Measurement::Distance { distance: km }),
            ..WorkoutSpec::new(kind)
        }
    }

    #[test]
    fn test_add_workout_updates_weekly_total() {
        // One week, Mon empty, Tue holding one easy 5 km run
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Tue, distance_spec(WorkoutType::Easy, 5.0)).unwrap();

        add_workout(&mut plan, 1, Weekday::Wed, distance_spec(WorkoutType::Long, 12.0)).unwrap();

        assert_eq!(plan.week(1).unwrap().weekly_total, 17.0);
    }

    #[test]
    fn test_add_workout_defaults() {
        let mut plan = plan_with_weeks(1);

        add_workout(&mut plan, 1, Weekday::Mon, WorkoutSpec::new(WorkoutType::Easy)).unwrap();
        add_workout(&mut plan, 1, Weekday::Tue, WorkoutSpec::new(WorkoutType::Strength)).unwrap();

        let week = plan.week(1).unwrap();
        assert_eq!(
            week.days.bucket(Weekday::Mon)[0].measure,
            Measurement::Distance { distance: 5.0 }
        );
        assert_eq!(
            week.days.bucket(Weekday::Tue)[0].measure,
            Measurement::Distance { distance: 0.0 }
        );
        assert_eq!(week.weekly_total, 5.0);
    }

    #[test]
    fn test_add_workout_to_missing_week_is_an_error() {
        let mut plan = plan_with_weeks(1);
        let err = add_workout(&mut plan, 4, Weekday::Mon, WorkoutSpec::new(WorkoutType::Easy))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
    }

    #[test]
    fn test_switching_to_time_excludes_workout_from_total() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Tue, distance_spec(WorkoutType::Easy, 5.0)).unwrap();
        assert_eq!(plan.week(1).unwrap().weekly_total, 5.0);

        update_workout(
            &mut plan,
            1,
            Weekday::Tue,
            0,
            WorkoutUpdate {
                measure: Some(Measurement::Time { time: 30.0 }),
                ..WorkoutUpdate::default()
            },
        )
        .unwrap();

        let workout = &plan.week(1).unwrap().days.bucket(Weekday::Tue)[0];
        assert_eq!(workout.measure, Measurement::Time { time: 30.0 });
        assert_eq!(workout.measure.distance_km(), None);
        assert_eq!(plan.week(1).unwrap().weekly_total, 0.0);
    }

    #[test]
    fn test_update_out_of_range_index_is_an_error() {
        let mut plan = plan_with_weeks(1);
        let err = update_workout(&mut plan, 1, Weekday::Mon, 0, WorkoutUpdate::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
    }

    #[test]
    fn test_nickname_empty_string_stored_as_absent() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Mon, WorkoutSpec::new(WorkoutType::Easy)).unwrap();

        update_nickname(&mut plan, 1, Weekday::Mon, 0, "Shakeout").unwrap();
        assert_eq!(
            plan.week(1).unwrap().days.bucket(Weekday::Mon)[0].nickname.as_deref(),
            Some("Shakeout")
        );

        update_nickname(&mut plan, 1, Weekday::Mon, 0, "   ").unwrap();
        assert!(plan.week(1).unwrap().days.bucket(Weekday::Mon)[0].nickname.is_none());
    }

    #[test]
    fn test_remove_workout_shifts_and_recomputes() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Easy, 4.0)).unwrap();
        let second =
            add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Tempo, 6.0))
                .unwrap();

        let removed = remove_workout(&mut plan, 1, Weekday::Mon, 0).unwrap();
        assert_eq!(removed.kind, WorkoutType::Easy);

        let week = plan.week(1).unwrap();
        assert_eq!(week.days.bucket(Weekday::Mon).len(), 1);
        assert_eq!(week.days.bucket(Weekday::Mon)[0].id, second);
        assert_eq!(week.weekly_total, 6.0);
    }

    #[test]
    fn test_reorder_within_day_keeps_total() {
        let mut plan = plan_with_weeks(1);
        let a = add_workout(&mut plan, 1, Weekday::Sat, distance_spec(WorkoutType::Easy, 3.0))
            .unwrap();
        let b = add_workout(&mut plan, 1, Weekday::Sat, distance_spec(WorkoutType::Long, 14.0))
            .unwrap();
        let before = plan.week(1).unwrap().weekly_total;

        reorder_within_day(&mut plan, 1, Weekday::Sat, 0, 1).unwrap();

        let bucket = plan.week(1).unwrap().days.bucket(Weekday::Sat);
        assert_eq!(bucket[0].id, b);
        assert_eq!(bucket[1].id, a);
        assert_eq!(plan.week(1).unwrap().weekly_total, before);
    }

    #[test]
    fn test_reorder_clamps_destination_but_rejects_bad_source() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Sat, WorkoutSpec::new(WorkoutType::Easy)).unwrap();

        reorder_within_day(&mut plan, 1, Weekday::Sat, 0, 99).unwrap();
        assert_eq!(plan.week(1).unwrap().days.bucket(Weekday::Sat).len(), 1);

        let err = reorder_within_day(&mut plan, 1, Weekday::Sat, 5, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
    }

    #[test]
    fn test_move_to_empty_bucket_across_weeks() {
        let mut plan = plan_with_weeks(2);
        let id = add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Long, 10.0))
            .unwrap();
        add_workout(&mut plan, 2, Weekday::Tue, distance_spec(WorkoutType::Easy, 5.0)).unwrap();

        move_workout(&mut plan, 1, Weekday::Mon, 0, 2, Weekday::Fri, 0).unwrap();

        let week1 = plan.week(1).unwrap();
        let week2 = plan.week(2).unwrap();
        assert!(week1.days.bucket(Weekday::Mon).is_empty());
        assert_eq!(week1.weekly_total, 0.0);
        assert_eq!(week2.days.bucket(Weekday::Fri).len(), 1);
        assert_eq!(week2.days.bucket(Weekday::Fri)[0].id, id);
        assert_eq!(week2.weekly_total, 15.0);
    }

    #[test]
    fn test_move_preserves_total_workout_count() {
        let mut plan = plan_with_weeks(2);
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Easy, 5.0)).unwrap();
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Tempo, 7.0)).unwrap();
        add_workout(&mut plan, 2, Weekday::Sun, distance_spec(WorkoutType::Long, 16.0)).unwrap();

        // same day
        move_workout(&mut plan, 1, Weekday::Mon, 0, 1, Weekday::Mon, 1).unwrap();
        assert_eq!(plan.workout_count(), 3);
        // same week, different day
        move_workout(&mut plan, 1, Weekday::Mon, 0, 1, Weekday::Wed, 0).unwrap();
        assert_eq!(plan.workout_count(), 3);
        // cross week
        move_workout(&mut plan, 2, Weekday::Sun, 0, 1, Weekday::Sat, 5).unwrap();
        assert_eq!(plan.workout_count(), 3);
    }

    #[test]
    fn test_same_week_cross_day_move_keeps_total_consistent() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Easy, 5.0)).unwrap();
        add_workout(&mut plan, 1, Weekday::Tue, distance_spec(WorkoutType::Tempo, 8.0)).unwrap();

        move_workout(&mut plan, 1, Weekday::Mon, 0, 1, Weekday::Tue, 0).unwrap();

        let week = plan.week(1).unwrap();
        assert_eq!(week.days.bucket(Weekday::Tue).len(), 2);
        assert_eq!(week.weekly_total, 13.0);
    }

    #[test]
    fn test_move_to_missing_week_loses_nothing() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Easy, 5.0)).unwrap();

        let err = move_workout(&mut plan, 1, Weekday::Mon, 0, 9, Weekday::Fri, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
        assert_eq!(plan.workout_count(), 1);
        assert_eq!(plan.week(1).unwrap().weekly_total, 5.0);
    }

    #[test]
    fn test_convert_units_rewrites_distances_and_totals() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Easy, 10.0)).unwrap();
        add_workout(
            &mut plan,
            1,
            Weekday::Tue,
            WorkoutSpec {
                measure: Some(Measurement::Time { time: 40.0 }),
                ..WorkoutSpec::new(WorkoutType::Tempo)
            },
        )
        .unwrap();

        convert_units(&mut plan, Unit::Km, Unit::Miles);

        let week = plan.week(1).unwrap();
        assert_eq!(
            week.days.bucket(Weekday::Mon)[0].measure,
            Measurement::Distance { distance: 6.2 }
        );
        // Time workouts untouched
        assert_eq!(
            week.days.bucket(Weekday::Tue)[0].measure,
            Measurement::Time { time: 40.0 }
        );
        assert_eq!(week.weekly_total, 6.0);
    }

    #[test]
    fn test_convert_units_round_trip_within_tolerance() {
        let mut plan = plan_with_weeks(1);
        for (day, km) in [
            (Weekday::Mon, 5.0),
            (Weekday::Wed, 8.7),
            (Weekday::Sat, 21.1),
        ] {
            add_workout(&mut plan, 1, day, distance_spec(WorkoutType::Easy, km)).unwrap();
        }
        let original = plan.clone();

        convert_units(&mut plan, Unit::Km, Unit::Miles);
        convert_units(&mut plan, Unit::Miles, Unit::Km);

        for (day, _) in [(Weekday::Mon, 5.0), (Weekday::Wed, 8.7), (Weekday::Sat, 21.1)] {
            let before = original.week(1).unwrap().days.bucket(day)[0]
                .measure
                .distance_km()
                .unwrap();
            let after = plan.week(1).unwrap().days.bucket(day)[0]
                .measure
                .distance_km()
                .unwrap();
            assert!(
                (after - before).abs() <= 0.1,
                "{before} km came back as {after} km"
            );
        }
    }

    #[test]
    fn test_convert_units_same_unit_is_a_no_op() {
        let mut plan = plan_with_weeks(1);
        add_workout(&mut plan, 1, Weekday::Mon, distance_spec(WorkoutType::Easy, 8.7)).unwrap();
        let before = plan.clone();

        convert_units(&mut plan, Unit::Km, Unit::Km);
        assert_eq!(plan, before);
    }
}

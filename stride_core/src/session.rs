//! Session coordinator: owns the single current plan document.
//!
//! Lifecycle: a session starts empty, is populated by one [`Session::adopt`]
//! call (the external generator's output) or one successful
//! [`Session::import_json`], is mutated only through the methods here (each
//! one re-wraps via [`schema::revise_after_edit`] and persists every slot),
//! and is returned to empty by [`Session::reset`].

use std::path::PathBuf;

use serde_json::Value;
use uuid::Uuid;

use crate::engine::{self, WorkoutSpec, WorkoutUpdate};
use crate::error::{Error, Result};
use crate::schema::{self, SCHEMA_VERSION};
use crate::store::SessionStore;
use crate::units::Unit;
use crate::{Plan, PlanDocument, PlanSettings, PlanSource, Weekday, Workout};

/// Holds the current document and keeps the persisted slots coherent
pub struct Session {
    store: SessionStore,
    current: Option<PlanDocument>,
}

impl Session {
    /// Open a session over the given data directory, reconstructing the
    /// current document from the persisted slots when present.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = SessionStore::new(data_dir);
        let current = store.load_document()?;
        match &current {
            Some(doc) => tracing::info!(
                "restored {}-week plan (source {:?})",
                doc.plan.weeks.len(),
                doc.source
            ),
            None => tracing::debug!("no persisted document, session starts empty"),
        }
        Ok(Self { store, current })
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn document(&self) -> Option<&PlanDocument> {
        self.current.as_ref()
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.current.as_ref().map(|d| &d.plan)
    }

    pub fn settings(&self) -> Option<&PlanSettings> {
        self.current.as_ref().map(|d| &d.settings)
    }

    fn require(&self) -> Result<&PlanDocument> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::Session("no plan loaded".to_string()))
    }

    fn require_mut(&mut self) -> Result<&mut PlanDocument> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::Session("no plan loaded".to_string()))
    }

    /// Install the external generator's output as the current document.
    ///
    /// The generator's parameters are assumed valid (the form layer checked
    /// them); only the derived totals are re-established here.
    pub fn adopt(&mut self, settings: PlanSettings, mut plan: Plan) -> Result<()> {
        for week in &mut plan.weeks {
            week.recompute_total();
        }
        self.current = Some(schema::wrap(settings, plan, PlanSource::Generated));
        self.persist()
    }

    /// Replace the current document with an imported one.
    ///
    /// parse → require `version` → validate → normalize → typed decode.
    /// Any failure returns the aggregated error list and leaves the current
    /// document untouched. The incoming document's `source` is preserved,
    /// so an unedited export/import cycle round-trips exactly.
    pub fn import_json(&mut self, raw: &str) -> Result<()> {
        let mut value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::Validation(vec![format!("not valid JSON: {e}")]))?;

        match value.get("version").and_then(Value::as_str) {
            None => return Err(Error::Validation(vec!["missing version".to_string()])),
            Some(v) if v != SCHEMA_VERSION => {
                tracing::warn!("importing document version {v}, current is {SCHEMA_VERSION}");
            }
            Some(_) => {}
        }

        let report = schema::validate(&value);
        if !report.valid {
            return Err(Error::Validation(report.errors));
        }

        if let Some(plan) = value.get_mut("plan") {
            schema::normalize(plan);
        }

        let mut doc: PlanDocument = serde_json::from_value(value)
            .map_err(|e| Error::Validation(vec![format!("document did not decode: {e}")]))?;
        for week in &mut doc.plan.weeks {
            week.recompute_total();
        }

        tracing::info!(
            "imported {}-week plan (source {:?})",
            doc.plan.weeks.len(),
            doc.source
        );
        self.current = Some(doc);
        self.persist()
    }

    /// Serialize the current wrapper as one JSON document
    pub fn export_json(&self) -> Result<String> {
        let doc = self.require()?;
        Ok(serde_json::to_string_pretty(doc)?)
    }

    pub fn add_workout(&mut self, week: u32, day: Weekday, spec: WorkoutSpec) -> Result<Uuid> {
        let doc = self.require_mut()?;
        let id = engine::add_workout(&mut doc.plan, week, day, spec)?;
        schema::revise_after_edit(doc);
        self.persist()?;
        Ok(id)
    }

    pub fn update_workout(
        &mut self,
        week: u32,
        day: Weekday,
        index: usize,
        update: WorkoutUpdate,
    ) -> Result<()> {
        let doc = self.require_mut()?;
        engine::update_workout(&mut doc.plan, week, day, index, update)?;
        schema::revise_after_edit(doc);
        self.persist()
    }

    pub fn update_nickname(
        &mut self,
        week: u32,
        day: Weekday,
        index: usize,
        nickname: &str,
    ) -> Result<()> {
        let doc = self.require_mut()?;
        engine::update_nickname(&mut doc.plan, week, day, index, nickname)?;
        schema::revise_after_edit(doc);
        self.persist()
    }

    pub fn remove_workout(&mut self, week: u32, day: Weekday, index: usize) -> Result<Workout> {
        let doc = self.require_mut()?;
        let removed = engine::remove_workout(&mut doc.plan, week, day, index)?;
        schema::revise_after_edit(doc);
        self.persist()?;
        Ok(removed)
    }

    pub fn reorder_within_day(
        &mut self,
        week: u32,
        day: Weekday,
        from: usize,
        to: usize,
    ) -> Result<()> {
        let doc = self.require_mut()?;
        engine::reorder_within_day(&mut doc.plan, week, day, from, to)?;
        schema::revise_after_edit(doc);
        self.persist()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn move_workout(
        &mut self,
        from_week: u32,
        from_day: Weekday,
        from_index: usize,
        to_week: u32,
        to_day: Weekday,
        to_index: usize,
    ) -> Result<()> {
        let doc = self.require_mut()?;
        engine::move_workout(
            &mut doc.plan,
            from_week,
            from_day,
            from_index,
            to_week,
            to_day,
            to_index,
        )?;
        schema::revise_after_edit(doc);
        self.persist()
    }

    /// Switch the display unit: converts every plan distance, updates the
    /// recorded settings unit, and re-wraps, as one logical step.
    pub fn set_unit(&mut self, unit: Unit) -> Result<()> {
        let doc = self.require_mut()?;
        let from = doc.settings.unit;
        if from == unit {
            return Ok(());
        }
        engine::convert_units(&mut doc.plan, from, unit);
        doc.settings.unit = unit;
        schema::revise_after_edit(doc);
        self.persist()
    }

    /// Return the session to empty and remove the persisted slots
    pub fn reset(&mut self) -> Result<()> {
        self.current = None;
        self.store.clear()?;
        tracing::info!("session reset");
        Ok(())
    }

    /// Write all three slots; they change together or not at all from the
    /// coordinator's point of view.
    fn persist(&self) -> Result<()> {
        let Some(doc) = &self.current else {
            return Ok(());
        };
        self.store.save_settings(&doc.settings)?;
        self.store.save_plan(&doc.plan)?;
        self.store.save_document(doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Measurement, RaceDistance, Week, WorkoutType};
    use chrono::NaiveDate;

    fn sample_settings() -> PlanSettings {
        PlanSettings {
            today: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            race_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            race_distance: RaceDistance::TenK,
            unit: Unit::Km,
            training_days: vec![],
        }
    }

    fn sample_plan() -> Plan {
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut plan = Plan {
            weeks: vec![
                Week::new(1, start),
                Week::new(2, start + chrono::Duration::weeks(1)),
            ],
        };
        engine::add_workout(
            &mut plan,
            1,
            Weekday::Tue,
            WorkoutSpec {
                measure: Some(Measurement::Distance { distance: 5.0 }),
                ..WorkoutSpec::new(WorkoutType::Easy)
            },
        )
        .unwrap();
        plan
    }

    #[test]
    fn test_session_starts_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session = Session::open(temp_dir.path()).unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_adopt_then_reopen_restores_document() {
        let temp_dir = tempfile::tempdir().unwrap();

        {
            let mut session = Session::open(temp_dir.path()).unwrap();
            session.adopt(sample_settings(), sample_plan()).unwrap();
            assert_eq!(session.document().unwrap().source, PlanSource::Generated);
        }

        let session = Session::open(temp_dir.path()).unwrap();
        let doc = session.document().unwrap();
        assert_eq!(doc.source, PlanSource::Generated);
        assert_eq!(doc.plan.weeks.len(), 2);
        assert_eq!(doc.plan.week(1).unwrap().weekly_total, 5.0);
    }

    #[test]
    fn test_first_edit_advances_source_and_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();
        session.adopt(sample_settings(), sample_plan()).unwrap();

        session
            .add_workout(
                1,
                Weekday::Wed,
                WorkoutSpec {
                    measure: Some(Measurement::Distance { distance: 12.0 }),
                    ..WorkoutSpec::new(WorkoutType::Long)
                },
            )
            .unwrap();

        assert_eq!(session.document().unwrap().source, PlanSource::Edited);
        assert_eq!(session.plan().unwrap().week(1).unwrap().weekly_total, 17.0);

        let reopened = Session::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.document().unwrap().source, PlanSource::Edited);
        assert_eq!(reopened.plan().unwrap().week(1).unwrap().weekly_total, 17.0);
    }

    #[test]
    fn test_mutation_without_plan_is_a_session_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();

        let err = session
            .add_workout(1, Weekday::Mon, WorkoutSpec::new(WorkoutType::Easy))
            .unwrap_err();
        assert!(matches!(err, Error::Session(_)));
    }

    #[test]
    fn test_failed_import_leaves_document_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();
        session.adopt(sample_settings(), sample_plan()).unwrap();
        let before = session.document().unwrap().clone();

        let bad = r#"{
            "version": "1.0.0",
            "createdAt": "2025-03-01T08:00:00Z",
            "updatedAt": "2025-03-01T08:00:00Z",
            "source": "edited",
            "settings": {"today": "2025-03-01", "raceDate": "2025-06-01",
                         "raceDistance": "10k", "unit": "km"},
            "plan": {"weeks": [{"week": 1, "startDate": "2025-03-03",
                                "days": {"Weds": []}}]}
        }"#;

        let err = session.import_json(bad).unwrap_err();
        match err {
            Error::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("Weds")));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(session.document().unwrap(), &before);
    }

    #[test]
    fn test_import_requires_version() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();

        let err = session.import_json(r#"{"settings": {}, "plan": {"weeks": []}}"#).unwrap_err();
        match err {
            Error::Validation(errors) => assert!(errors[0].contains("version")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_export_import_round_trip_preserves_plan_and_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();
        session.adopt(sample_settings(), sample_plan()).unwrap();
        let exported = session.export_json().unwrap();
        let original = session.document().unwrap().clone();

        let other_dir = tempfile::tempdir().unwrap();
        let mut other = Session::open(other_dir.path()).unwrap();
        other.import_json(&exported).unwrap();

        let imported = other.document().unwrap();
        assert_eq!(imported.plan, original.plan);
        assert_eq!(imported.source, original.source);
    }

    #[test]
    fn test_set_unit_converts_plan_and_settings_together() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();
        session.adopt(sample_settings(), sample_plan()).unwrap();

        session.set_unit(Unit::Miles).unwrap();

        let doc = session.document().unwrap();
        assert_eq!(doc.settings.unit, Unit::Miles);
        let workout = &doc.plan.week(1).unwrap().days.bucket(Weekday::Tue)[0];
        assert_eq!(workout.measure, Measurement::Distance { distance: 3.1 });
        assert_eq!(doc.plan.week(1).unwrap().weekly_total, 3.0);
    }

    #[test]
    fn test_reset_clears_memory_and_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();
        session.adopt(sample_settings(), sample_plan()).unwrap();

        session.reset().unwrap();
        assert!(session.is_empty());

        let reopened = Session::open(temp_dir.path()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_move_through_session_keeps_count_and_totals() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(temp_dir.path()).unwrap();
        session.adopt(sample_settings(), sample_plan()).unwrap();

        session
            .move_workout(1, Weekday::Tue, 0, 2, Weekday::Fri, 0)
            .unwrap();

        let plan = session.plan().unwrap();
        assert_eq!(plan.workout_count(), 1);
        assert_eq!(plan.week(1).unwrap().weekly_total, 0.0);
        assert_eq!(plan.week(2).unwrap().weekly_total, 5.0);
    }
}

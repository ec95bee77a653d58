//! Session/draft reconciliation engine.
//!
//! The [`Tracker`] owns all mutable application state: today's active
//! session, the draft plan, exercise/cardio history and the derived indices
//! they touch. Every operation mutates state and persists the affected
//! slices through the store before returning.
//!
//! Exactly one session is live: today's. Any loaded or in-memory session or
//! draft whose date is not today's key is discarded on every read path and
//! never resurrected.

use crate::catalog::{default_catalog, Catalog};
use crate::metrics;
use crate::planner;
use crate::store::Store;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use std::time::{Duration, Instant};

/// Window inside which an identical save payload is treated as an
/// accidental double-tap and dropped.
const DUPLICATE_WINDOW: Duration = Duration::from_millis(800);

/// How long the one-shot "session started" notice stays visible
const SESSION_NOTICE_TTL: Duration = Duration::from_secs(4);

/// How many distinct exercise ids the recency list keeps
pub(crate) const RECENT_LIMIT: usize = 12;

/// Caller-supplied answer to a destructive-edit confirmation request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Unconfirmed,
    Confirmed,
}

/// Result of a session/draft edit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// Edit applied
    Done,
    /// The target exercise has logged sets today; replay with
    /// [`Confirmation::Confirmed`] to purge them and proceed
    NeedsConfirmation,
    /// Nothing to do (missing target, stale session)
    NoOp,
}

/// Result of adding an exercise from search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Result of a save operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Payload failed validation (non-positive weight/reps/duration)
    Invalid,
    /// Identical payload within the double-tap window
    Duplicate,
}

struct SaveGuard {
    key: String,
    payload: String,
    at: Instant,
}

/// The session/state reconciliation engine. One instance owns all state for
/// the device; there are no concurrent writers.
pub struct Tracker {
    store: Store,
    catalog: &'static Catalog,
    today: NaiveDate,
    pub profile: Profile,
    pub settings: Settings,
    pub history: ExerciseHistory,
    pub cardio_history: CardioHistory,
    pub app_state: AppState,
    pub meta: Meta,
    pub active_session: Option<ActiveSession>,
    pub draft_plan: Option<DraftPlan>,
    pub dismissed_draft_date: Option<DayKey>,
    messages: Vec<String>,
    session_start_notice: Option<(String, Instant)>,
    save_guard: Option<SaveGuard>,
}

impl Tracker {
    /// Assemble a tracker from already-loaded state. Use
    /// [`Tracker::load`](crate::persist) for the normal path.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        store: Store,
        today: NaiveDate,
        profile: Profile,
        settings: Settings,
        history: ExerciseHistory,
        cardio_history: CardioHistory,
        app_state: AppState,
        meta: Meta,
        active_session: Option<ActiveSession>,
        draft_plan: Option<DraftPlan>,
        dismissed_draft_date: Option<DayKey>,
    ) -> Self {
        Self {
            store,
            catalog: default_catalog(),
            today,
            profile,
            settings,
            history,
            cardio_history,
            app_state,
            meta,
            active_session,
            draft_plan,
            dismissed_draft_date,
            messages: Vec::new(),
            session_start_notice: None,
            save_guard: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn today_key(&self) -> DayKey {
        day_key(self.today)
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    /// Wall-clock timestamp consistent with the (possibly injected) today
    fn now(&self) -> DateTime<Utc> {
        let real = Utc::now();
        if real.date_naive() == self.today {
            real
        } else {
            // Tests pin `today`; keep timestamps inside that day
            self.today
                .and_hms_opt(12, 0, 0)
                .map(|t| t.and_utc())
                .unwrap_or(real)
        }
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub(crate) fn push_message(&mut self, text: impl Into<String>) {
        self.messages.push(text.into());
    }

    /// Take all pending user-facing notices
    pub fn drain_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// The one-shot "session started" notice, if it has not expired yet
    pub fn session_start_notice(&mut self) -> Option<String> {
        match &self.session_start_notice {
            Some((text, at)) if at.elapsed() < SESSION_NOTICE_TTL => Some(text.clone()),
            Some(_) => {
                self.session_start_notice = None;
                None
            }
            None => None,
        }
    }

    // ------------------------------------------------------------------
    // Today-only views
    // ------------------------------------------------------------------

    /// Today's session, if one exists. Sessions dated any other day are
    /// never returned.
    pub fn active_session_today(&self) -> Option<&ActiveSession> {
        self.active_session
            .as_ref()
            .filter(|s| s.date == self.today_key())
    }

    /// Today's draft plan, if one exists
    pub fn draft_plan_today(&self) -> Option<&DraftPlan> {
        self.draft_plan
            .as_ref()
            .filter(|d| d.date == self.today_key())
    }

    pub fn has_workout_today(&self) -> bool {
        self.meta
            .day_entries
            .get(&self.today_key())
            .map(|e| e.kind == DayKind::Workout)
            .unwrap_or(false)
    }

    pub fn rest_day_logged_today(&self) -> bool {
        self.meta
            .day_entries
            .get(&self.today_key())
            .map(|e| e.kind == DayKind::Rest)
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Derived metrics (thin wrappers over the pure functions)
    // ------------------------------------------------------------------

    pub fn streak(&self) -> metrics::StreakSummary {
        metrics::compute_streak(
            &self.history,
            &self.cardio_history,
            &self.app_state.rest_days,
            Some(&self.meta.day_entries),
            self.today,
        )
    }

    pub fn strength_score(&self) -> metrics::StrengthScore {
        metrics::compute_strength_score(self.catalog, &self.history)
    }

    pub fn achievements(&self) -> Vec<metrics::Achievement> {
        let score = self.strength_score();
        let streak = self.streak();
        metrics::compute_achievements(
            self.catalog,
            &self.history,
            &self.cardio_history,
            &score,
            &streak,
        )
    }

    pub fn todays_workout_type(&self) -> WorkoutType {
        metrics::todays_workout_type(&self.app_state, self.today)
    }

    /// Workout days in the trailing 7 calendar days, today included
    pub fn workouts_this_week(&self) -> usize {
        (0..7)
            .filter_map(|i| self.today.checked_sub_days(chrono::Days::new(i)))
            .filter(|day| {
                self.meta
                    .day_entries
                    .get(&day_key(*day))
                    .map(|e| e.kind == DayKind::Workout)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Human label for the most recent logged workout
    pub fn last_workout_label(&self) -> Option<String> {
        let mut dates: Vec<DateTime<Utc>> = Vec::new();
        for sessions in self.history.values() {
            dates.extend(sessions.iter().map(|s| s.date()));
        }
        for sessions in self.cardio_history.values() {
            dates.extend(sessions.iter().map(|s| s.date));
        }
        let last = dates.into_iter().max()?;
        let diff = self
            .today
            .signed_duration_since(last.date_naive())
            .num_days();
        Some(match diff {
            d if d <= 0 => "Today".to_string(),
            1 => "Yesterday".to_string(),
            d if d < 7 => format!("{} days ago", d),
            _ => last.format("%b %-d").to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Day entry and usage bookkeeping
    // ------------------------------------------------------------------

    /// Record a day in the authoritative index. A workout kind is sticky:
    /// rest never displaces it.
    fn record_day_entry(&mut self, day: DayKey, kind: DayKind, exercises: &[String]) {
        let entry = self.meta.day_entries.entry(day.clone()).or_insert(DayEntry {
            kind,
            date: day,
            exercises: Vec::new(),
        });
        if entry.kind != DayKind::Workout {
            entry.kind = kind;
        }
        for id in exercises {
            if !entry.exercises.contains(id) {
                entry.exercises.push(id.clone());
            }
        }
        self.persist_meta();
    }

    fn record_exercise_use(&mut self, exercise_id: &str, sets: &[SetEntry]) {
        self.meta.recent_exercises.retain(|id| id != exercise_id);
        self.meta.recent_exercises.insert(0, exercise_id.to_string());
        self.meta.recent_exercises.truncate(RECENT_LIMIT);

        let increment = sets.len().max(1) as u32;
        *self
            .meta
            .exercise_usage_counts
            .entry(exercise_id.to_string())
            .or_insert(0) += increment;

        if let Some(last) = sets.last() {
            self.meta.last_exercise_stats.insert(
                exercise_id.to_string(),
                LastStats {
                    weight: last.weight,
                    reps: last.reps,
                },
            );
        }
        self.persist_meta();
    }

    /// Purge today's logged data for one exercise from history, the cardio
    /// history and the day index. Hard delete; callers gate this behind the
    /// confirmation protocol.
    fn purge_todays_logs(&mut self, exercise_id: &str, kind: ExerciseKind) {
        let today_key = self.today_key();

        if kind == ExerciseKind::Cardio {
            if let Some(cardio_type) = exercise_id.strip_prefix(CARDIO_KEY_PREFIX) {
                if let Some(sessions) = self.cardio_history.get_mut(cardio_type) {
                    sessions.retain(|s| day_key_of(&s.date) != today_key);
                }
                self.persist_cardio();
            }
        }

        if let Some(sessions) = self.history.get_mut(exercise_id) {
            sessions.retain(|s| s.day_key() != today_key);
        }
        self.persist_history();

        if let Some(entry) = self.meta.day_entries.get_mut(&today_key) {
            entry.exercises.retain(|id| id != exercise_id);
        }
        self.persist_meta();
    }

    // ------------------------------------------------------------------
    // Session primitives
    // ------------------------------------------------------------------

    fn build_session_item(&self, exercise_id: &str, kind: ExerciseKind) -> SessionItem {
        SessionItem {
            exercise_id: exercise_id.to_string(),
            name: self.catalog.exercise_name(exercise_id),
            kind,
            sets: 0,
        }
    }

    /// Today's session, creating a fresh draft-status one (and dropping any
    /// stale one) if needed
    fn session_base(&mut self, created_from: CreatedFrom) -> &mut ActiveSession {
        let today_key = self.today_key();
        if !matches!(&self.active_session, Some(s) if s.date == today_key) {
            self.active_session = None;
        }
        self.active_session
            .get_or_insert_with(|| ActiveSession::empty(today_key, created_from))
    }

    /// Start (or keep) an empty manual session in draft status
    pub fn start_empty_session(&mut self) {
        self.session_base(CreatedFrom::Manual).status = SessionStatus::Draft;
        self.persist_active_session();
    }

    /// Replace the session's item list with exactly the given ids,
    /// preserving in-progress sets for retained ids and dropping the rest.
    pub fn update_session_items_by_ids(
        &mut self,
        ids: &[String],
        status: Option<SessionStatus>,
        created_from: Option<CreatedFrom>,
    ) {
        let mut unique: Vec<String> = Vec::new();
        for id in ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }

        let items: Vec<SessionItem> = {
            let catalog = self.catalog;
            let base = self.session_base(created_from.unwrap_or(CreatedFrom::Manual));
            unique
                .iter()
                .map(|id| {
                    if let Some(idx) = base.item_index(id) {
                        let mut item = base.items[idx].clone();
                        item.name = catalog.exercise_name(id);
                        item
                    } else {
                        SessionItem {
                            exercise_id: id.clone(),
                            name: catalog.exercise_name(id),
                            kind: ExerciseKind::Strength,
                            sets: 0,
                        }
                    }
                })
                .collect()
        };

        let base = self.session_base(CreatedFrom::Manual);
        base.items = items;
        for id in &unique {
            base.sets_by_exercise.entry(id.clone()).or_default();
        }
        base.sets_by_exercise.retain(|key, _| unique.contains(key));
        if let Some(status) = status {
            base.status = status;
        }
        if let Some(created_from) = created_from {
            base.created_from = created_from;
        }
        self.persist_active_session();
    }

    /// Upsert one exercise's entry into today's session, attaching the given
    /// sets (or preserving existing ones when absent). Logging at least one
    /// set promotes draft → in_progress unless the session was generator
    /// pre-populated.
    pub fn update_active_session(
        &mut self,
        exercise_id: &str,
        kind: ExerciseKind,
        display_name: Option<String>,
        sets: Option<Vec<SetDraft>>,
    ) {
        if exercise_id.is_empty() {
            return;
        }
        let name =
            display_name.unwrap_or_else(|| self.catalog.exercise_name(exercise_id));
        let base = self.session_base(CreatedFrom::Manual);

        // Without an explicit set list, keep the existing one; failing that,
        // stage one placeholder per planned set on the pre-counted item.
        let (resolved_sets, placeholders) = match sets {
            Some(list) => (list, false),
            None => {
                let existing = base
                    .sets_by_exercise
                    .get(exercise_id)
                    .cloned()
                    .unwrap_or_default();
                if existing.is_empty() {
                    let planned = base
                        .item_index(exercise_id)
                        .map(|idx| base.items[idx].sets)
                        .unwrap_or(0);
                    (vec![SetDraft::default(); planned], true)
                } else {
                    (existing, false)
                }
            }
        };
        base.sets_by_exercise
            .insert(exercise_id.to_string(), resolved_sets.clone());

        let item = SessionItem {
            exercise_id: exercise_id.to_string(),
            name,
            kind,
            sets: resolved_sets.len(),
        };
        match base.item_index(exercise_id) {
            Some(idx) => base.items[idx] = item,
            None => base.items.push(item),
        }

        // Synthesized placeholders are not logged sets and never promote
        if base.status != SessionStatus::InProgress
            && !placeholders
            && !resolved_sets.is_empty()
            && base.created_from != CreatedFrom::Generated
        {
            base.status = SessionStatus::InProgress;
        }
        self.persist_active_session();
    }

    // ------------------------------------------------------------------
    // Adding exercises
    // ------------------------------------------------------------------

    /// Add an exercise id to the draft plan, staging it into the session's
    /// item list as long as the session has not started yet.
    pub fn add_exercise_to_draft(&mut self, exercise_id: &str) {
        if exercise_id.is_empty() {
            return;
        }
        let today_key = self.today_key();
        let existing = self.draft_plan_today().cloned();
        let mut exercises = existing
            .as_ref()
            .map(|d| d.exercises.clone())
            .unwrap_or_default();
        if !exercises.contains(&exercise_id.to_string()) {
            exercises.push(exercise_id.to_string());
        }
        self.draft_plan = Some(DraftPlan {
            date: today_key.clone(),
            label: existing
                .as_ref()
                .map(|d| d.label.clone())
                .unwrap_or_else(|| "Workout Draft".into()),
            focus: existing
                .as_ref()
                .map(|d| d.focus)
                .unwrap_or_else(|| self.todays_workout_type().into()),
            exercises,
            options: existing
                .as_ref()
                .map(|d| d.options.clone())
                .unwrap_or_default(),
            created_from: existing
                .map(|d| d.created_from)
                .unwrap_or(CreatedFrom::Manual),
        });
        self.dismissed_draft_date = None;
        self.persist_draft_plan();
        self.persist_dismissed();

        // Stage into the session unless it is already underway
        let item = self.build_session_item(exercise_id, ExerciseKind::Strength);
        if let Some(session) = self.active_session.as_mut() {
            if session.date == today_key && session.status != SessionStatus::InProgress {
                if session.item_index(exercise_id).is_none() {
                    session.items.push(item);
                    session
                        .sets_by_exercise
                        .entry(exercise_id.to_string())
                        .or_default();
                }
                self.persist_active_session();
            }
        }
    }

    /// Add an exercise directly to today's session
    pub fn add_exercise_to_session(&mut self, exercise_id: &str, status: Option<SessionStatus>) {
        if exercise_id.is_empty() {
            return;
        }
        let item = self.build_session_item(exercise_id, ExerciseKind::Strength);
        let base = self.session_base(CreatedFrom::Manual);
        if base.item_index(exercise_id).is_none() {
            base.items.push(item);
            base.sets_by_exercise
                .entry(exercise_id.to_string())
                .or_default();
        }
        if let Some(status) = status {
            base.status = status;
        }
        self.persist_active_session();
    }

    /// Add an exercise picked from search into both the session and the
    /// draft, keeping the two visually consistent.
    pub fn add_exercise_from_search(&mut self, exercise_id: &str) -> AddOutcome {
        if self
            .active_session_today()
            .map(|s| s.item_index(exercise_id).is_some())
            .unwrap_or(false)
        {
            return AddOutcome::AlreadyPresent;
        }
        let status = self
            .active_session_today()
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Draft);
        self.add_exercise_to_session(exercise_id, Some(status));

        if let Some(draft) = self.draft_plan.as_mut() {
            if draft.date == day_key(self.today)
                && !draft.exercises.contains(&exercise_id.to_string())
            {
                draft.exercises.push(exercise_id.to_string());
                self.persist_draft_plan();
            }
        }
        self.push_message("Added to today's session");
        AddOutcome::Added
    }

    // ------------------------------------------------------------------
    // Destructive session/draft edits
    // ------------------------------------------------------------------

    fn needs_purge(&self, exercise_id: &str) -> bool {
        self.active_session_today()
            .map(|s| s.logged_set_count(exercise_id) > 0)
            .unwrap_or(false)
    }

    /// Remove an exercise from today's session (and the draft). Requires
    /// confirmation when logged sets would be destroyed.
    pub fn remove_session_exercise(
        &mut self,
        exercise_id: &str,
        confirm: Confirmation,
    ) -> EditOutcome {
        let Some(session) = self.active_session_today() else {
            return EditOutcome::NoOp;
        };
        let Some(idx) = session.item_index(exercise_id) else {
            return EditOutcome::NoOp;
        };
        let kind = session.items[idx].kind;

        if self.needs_purge(exercise_id) {
            if confirm != Confirmation::Confirmed {
                return EditOutcome::NeedsConfirmation;
            }
            self.purge_todays_logs(exercise_id, kind);
        }

        if let Some(session) = self.active_session.as_mut() {
            session.items.retain(|i| i.exercise_id != exercise_id);
            session.sets_by_exercise.remove(exercise_id);
        }
        self.persist_active_session();

        if let Some(draft) = self.draft_plan.as_mut() {
            if draft.date == day_key(self.today) {
                draft.exercises.retain(|id| id != exercise_id);
                self.persist_draft_plan();
            }
        }
        EditOutcome::Done
    }

    /// Swap the session item at `index` for another exercise, replacing the
    /// id everywhere it appears.
    pub fn swap_session_exercise(
        &mut self,
        index: usize,
        new_id: &str,
        confirm: Confirmation,
    ) -> EditOutcome {
        let Some(session) = self.active_session_today() else {
            return EditOutcome::NoOp;
        };
        let Some(entry) = session.items.get(index) else {
            return EditOutcome::NoOp;
        };
        let old_id = entry.exercise_id.clone();
        let kind = entry.kind;

        if self.needs_purge(&old_id) {
            if confirm != Confirmation::Confirmed {
                return EditOutcome::NeedsConfirmation;
            }
            self.purge_todays_logs(&old_id, kind);
        }

        let item = self.build_session_item(new_id, ExerciseKind::Strength);
        if let Some(session) = self.active_session.as_mut() {
            session.items[index] = item;
            session.sets_by_exercise.remove(&old_id);
            session.sets_by_exercise.entry(new_id.to_string()).or_default();
        }
        self.persist_active_session();

        if let Some(draft) = self.draft_plan.as_mut() {
            if draft.date == day_key(self.today) {
                if index < draft.exercises.len() {
                    draft.exercises[index] = new_id.to_string();
                } else if let Some(pos) = draft.exercises.iter().position(|id| *id == old_id) {
                    draft.exercises[pos] = new_id.to_string();
                }
                self.persist_draft_plan();
            }
        }
        EditOutcome::Done
    }

    /// Remove the draft exercise at `index`, dropping its staged session
    /// entry too.
    pub fn remove_draft_exercise(&mut self, index: usize, confirm: Confirmation) -> EditOutcome {
        let Some(draft) = self.draft_plan_today() else {
            return EditOutcome::NoOp;
        };
        let Some(current_id) = draft.exercises.get(index).cloned() else {
            return EditOutcome::NoOp;
        };
        let kind = self
            .active_session_today()
            .and_then(|s| s.item_index(&current_id).map(|i| s.items[i].kind))
            .unwrap_or(ExerciseKind::Strength);

        if self.needs_purge(&current_id) {
            if confirm != Confirmation::Confirmed {
                return EditOutcome::NeedsConfirmation;
            }
            self.purge_todays_logs(&current_id, kind);
        }

        if let Some(draft) = self.draft_plan.as_mut() {
            draft.exercises.remove(index);
        }
        self.persist_draft_plan();

        let today_key = self.today_key();
        if let Some(session) = self.active_session.as_mut() {
            if session.date == today_key {
                session.items.retain(|i| i.exercise_id != current_id);
                session.sets_by_exercise.remove(&current_id);
                self.persist_active_session();
            }
        }
        EditOutcome::Done
    }

    /// Swap the draft exercise at `index` for another id
    pub fn swap_draft_exercise(
        &mut self,
        index: usize,
        new_id: &str,
        confirm: Confirmation,
    ) -> EditOutcome {
        let Some(draft) = self.draft_plan_today() else {
            return EditOutcome::NoOp;
        };
        let Some(current_id) = draft.exercises.get(index).cloned() else {
            return EditOutcome::NoOp;
        };
        let kind = self
            .active_session_today()
            .and_then(|s| s.item_index(&current_id).map(|i| s.items[i].kind))
            .unwrap_or(ExerciseKind::Strength);

        if self.needs_purge(&current_id) {
            if confirm != Confirmation::Confirmed {
                return EditOutcome::NeedsConfirmation;
            }
            self.purge_todays_logs(&current_id, kind);
        }

        if let Some(draft) = self.draft_plan.as_mut() {
            draft.exercises[index] = new_id.to_string();
        }
        self.persist_draft_plan();

        let item = self.build_session_item(new_id, ExerciseKind::Strength);
        let today_key = self.today_key();
        if let Some(session) = self.active_session.as_mut() {
            if session.date == today_key {
                if let Some(pos) = session
                    .items
                    .get(index)
                    .map(|_| index)
                    .or_else(|| session.items.iter().position(|i| i.exercise_id == current_id))
                {
                    session.items[pos] = item;
                }
                session.sets_by_exercise.remove(&current_id);
                session.sets_by_exercise.entry(new_id.to_string()).or_default();
                self.persist_active_session();
            }
        }
        EditOutcome::Done
    }

    /// Clear the draft plan and its hidden-for-today flag, emptying the
    /// session's staged item list when the session has not started.
    pub fn clear_draft_plan(&mut self) {
        self.draft_plan = None;
        self.dismissed_draft_date = None;
        self.persist_draft_plan();
        self.persist_dismissed();

        if let Some(status) = self.active_session_today().map(|s| s.status) {
            self.update_session_items_by_ids(&[], Some(status), Some(CreatedFrom::Manual));
        }
    }

    /// Hide the draft for today without deleting it
    pub fn dismiss_draft_for_today(&mut self) {
        self.dismissed_draft_date = Some(self.today_key());
        self.persist_dismissed();
    }

    pub fn draft_dismissed_today(&self) -> bool {
        self.dismissed_draft_date.as_deref() == Some(self.today_key().as_str())
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Promote the session to in_progress, merging the draft plan's
    /// exercises into the item list, and mark today as a workout day.
    pub fn start_workout_from_builder(&mut self) {
        let plan = self.draft_plan_today().cloned();
        let plan_exercises = plan
            .as_ref()
            .map(|p| p.exercises.clone())
            .unwrap_or_default();
        let plan_created_from = plan
            .as_ref()
            .map(|p| p.created_from)
            .unwrap_or(CreatedFrom::Manual);

        if self.profile.onboarded {
            self.record_day_entry(self.today_key(), DayKind::Workout, &plan_exercises);
        }

        let catalog = self.catalog;
        let base = self.session_base(plan_created_from);
        let mut combined: Vec<String> =
            base.items.iter().map(|i| i.exercise_id.clone()).collect();
        for id in &plan_exercises {
            if !combined.contains(id) {
                combined.push(id.clone());
            }
        }
        let items: Vec<SessionItem> = combined
            .iter()
            .map(|id| match base.item_index(id) {
                Some(idx) => base.items[idx].clone(),
                None => SessionItem {
                    exercise_id: id.clone(),
                    name: catalog.exercise_name(id),
                    kind: ExerciseKind::Strength,
                    sets: 0,
                },
            })
            .collect();
        base.items = items;
        for id in &combined {
            base.sets_by_exercise.entry(id.clone()).or_default();
        }
        base.status = SessionStatus::InProgress;
        base.created_from = plan_created_from;
        self.persist_active_session();

        self.draft_plan = None;
        self.dismissed_draft_date = None;
        self.persist_draft_plan();
        self.persist_dismissed();

        self.session_start_notice = Some((
            "Session started. Add exercises as you go.".to_string(),
            Instant::now(),
        ));
    }

    /// Terminate today's session: append a summary record to history, mark
    /// the day as a workout and clear all today-only state. No-op unless the
    /// session is in progress or has at least one logged set.
    pub fn finish_active_session(&mut self) -> bool {
        let Some(session) = self.active_session.clone() else {
            return false;
        };
        if session.status != SessionStatus::InProgress && !session.has_logged_sets() {
            return false;
        }

        let summary = SessionSummary {
            date: self.now(),
            label: "Workout Session".to_string(),
            exercises: session.items.clone(),
        };
        self.history
            .entry(SESSION_SUMMARY_KEY.to_string())
            .or_default()
            .push(HistoryEntry::Session(summary));
        self.persist_history();

        self.record_day_entry(self.today_key(), DayKind::Workout, &[]);

        self.active_session = None;
        self.draft_plan = None;
        self.dismissed_draft_date = None;
        self.session_start_notice = None;
        self.persist_active_session();
        self.persist_draft_plan();
        self.persist_dismissed();

        self.push_message("Workout saved.");
        true
    }

    // ------------------------------------------------------------------
    // Saving sessions
    // ------------------------------------------------------------------

    fn duplicate_save(&mut self, key: &str, payload_json: String) -> bool {
        if let Some(guard) = &self.save_guard {
            if guard.key == key
                && guard.payload == payload_json
                && guard.at.elapsed() < DUPLICATE_WINDOW
            {
                tracing::debug!("Dropping duplicate save for {}", key);
                return true;
            }
        }
        self.save_guard = Some(SaveGuard {
            key: key.to_string(),
            payload: payload_json,
            at: Instant::now(),
        });
        false
    }

    /// Save a strength session for one exercise. Upserts by day key into
    /// that exercise's history (same-day saves replace), updates rotation
    /// bookkeeping and usage stats, marks the day as a workout and mirrors
    /// the sets back into the live session.
    pub fn save_strength_session(
        &mut self,
        exercise_id: &str,
        session: StrengthSession,
    ) -> SaveOutcome {
        if session.sets.is_empty()
            || session
                .sets
                .iter()
                .any(|s| s.weight <= 0.0 || s.reps == 0)
        {
            return SaveOutcome::Invalid;
        }
        let payload_json = serde_json::to_string(&session).unwrap_or_default();
        if self.duplicate_save(exercise_id, payload_json) {
            return SaveOutcome::Duplicate;
        }

        let session_day = day_key_of(&session.date);
        let previous = self.history.get(exercise_id).cloned().unwrap_or_default();
        let last = previous.last();
        let last_max = last.and_then(|s| max_weight(s.sets()));
        let last_reps = last.map(|s| total_reps(s.sets()));
        let new_max = max_weight(&session.sets);
        let new_reps = total_reps(&session.sets);
        let had_previous = last.is_some();

        let sets = session.sets.clone();
        let entry = HistoryEntry::Strength(session);
        let sessions = self.history.entry(exercise_id.to_string()).or_default();
        match sessions.iter().position(|s| s.day_key() == session_day) {
            Some(idx) => sessions[idx] = entry,
            None => sessions.push(entry),
        }
        self.persist_history();

        self.app_state.last_workout_type = Some(self.todays_workout_type());
        self.app_state.last_workout_day_key = Some(self.today_key());
        self.persist_app_state();

        self.record_exercise_use(exercise_id, &sets);
        self.record_day_entry(
            session_day,
            DayKind::Workout,
            &[exercise_id.to_string()],
        );

        let drafts: Vec<SetDraft> = sets.iter().map(SetDraft::from_entry).collect();
        self.update_active_session(exercise_id, ExerciseKind::Strength, None, Some(drafts));

        if self.settings.insights_enabled && had_previous {
            let improved = match (new_max, last_max) {
                (Some(new), Some(old)) => {
                    new > old || (new == old && new_reps > last_reps.unwrap_or(0))
                }
                (Some(_), None) => true,
                _ => false,
            };
            if improved {
                self.push_message("More than last time.");
            } else {
                self.push_message("Workout saved.");
            }
        } else {
            self.push_message("Workout saved.");
        }
        SaveOutcome::Saved
    }

    /// Save a cardio session: appends to the cardio history, mirrors it into
    /// exercise history under `cardio_<type>`, marks the day as a workout
    /// and updates the live session mirror.
    pub fn save_cardio_session(
        &mut self,
        cardio_type: &str,
        session: CardioSession,
    ) -> SaveOutcome {
        if session.duration == 0 {
            return SaveOutcome::Invalid;
        }
        let payload_json = serde_json::to_string(&session).unwrap_or_default();
        if self.duplicate_save(cardio_type, payload_json) {
            return SaveOutcome::Duplicate;
        }

        let mirror_key = format!("{}{}", CARDIO_KEY_PREFIX, cardio_type);
        let session_day = day_key_of(&session.date);

        self.cardio_history
            .entry(cardio_type.to_string())
            .or_default()
            .push(session.clone());
        self.persist_cardio();

        self.history
            .entry(mirror_key.clone())
            .or_default()
            .push(HistoryEntry::Cardio(session));
        self.persist_history();

        self.record_day_entry(session_day, DayKind::Workout, &[]);

        let name = self
            .catalog
            .cardio_types
            .get(cardio_type)
            .map(|c| format!("Cardio: {}", c.name))
            .unwrap_or_else(|| "Cardio".to_string());
        self.update_active_session(
            &mirror_key,
            ExerciseKind::Cardio,
            Some(name),
            Some(vec![SetDraft::default()]),
        );

        self.push_message("Workout saved.");
        SaveOutcome::Saved
    }

    /// Mark today as a rest day. No-op when today already has a workout or
    /// rest entry.
    pub fn log_rest_day(&mut self) -> bool {
        if self.has_workout_today() || self.rest_day_logged_today() {
            return false;
        }
        let today_key = self.today_key();
        self.record_day_entry(today_key.clone(), DayKind::Rest, &[]);
        if !self.app_state.rest_days.contains(&today_key) {
            self.app_state.rest_days.push(today_key);
        }
        self.persist_app_state();
        true
    }

    // ------------------------------------------------------------------
    // Plan generation
    // ------------------------------------------------------------------

    /// Generate a fresh draft plan and mirror its exercise list into the
    /// session (unless the session is already underway).
    pub fn generate_plan(
        &mut self,
        focus: PlanFocus,
        options: &PlanOptions,
        rng: &mut impl Rng,
    ) -> DraftPlan {
        let draft = planner::build_draft_plan(
            self.catalog,
            &self.profile,
            focus,
            options,
            self.today,
            rng,
        );
        self.draft_plan = Some(draft.clone());
        self.dismissed_draft_date = None;
        self.persist_draft_plan();
        self.persist_dismissed();

        let in_progress = self
            .active_session_today()
            .map(|s| s.status == SessionStatus::InProgress)
            .unwrap_or(false);
        if !in_progress {
            self.update_session_items_by_ids(
                &draft.exercises,
                Some(SessionStatus::Draft),
                Some(CreatedFrom::Generated),
            );
        }
        draft
    }

    /// Replace the current draft with a regenerated one, re-syncing the
    /// session item list. Returns false when there is no draft to
    /// regenerate.
    pub fn regenerate_plan(
        &mut self,
        options: Option<&PlanOptions>,
        rng: &mut impl Rng,
    ) -> bool {
        let Some(existing) = self.draft_plan_today().cloned() else {
            return false;
        };
        let options = options
            .filter(|o| o.goal.is_some() || o.duration.is_some() || o.equipment.is_some())
            .cloned()
            .unwrap_or(existing.options);
        let draft = planner::build_draft_plan(
            self.catalog,
            &self.profile,
            existing.focus,
            &options,
            self.today,
            rng,
        );
        self.draft_plan = Some(draft.clone());
        self.dismissed_draft_date = None;
        self.persist_draft_plan();
        self.persist_dismissed();

        let status = self
            .active_session_today()
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Draft);
        self.update_session_items_by_ids(
            &draft.exercises,
            Some(status),
            Some(CreatedFrom::Generated),
        );
        true
    }

    // ------------------------------------------------------------------
    // Profile, settings, reset
    // ------------------------------------------------------------------

    /// Finish onboarding: flips the flag and fills location defaults
    pub fn complete_onboarding(&mut self) {
        self.profile.onboarded = true;
        if self.profile.workout_location.is_empty() {
            self.profile.workout_location = "gym".into();
        }
        self.persist_profile();
    }

    /// Replace the pinned exercise list. Settings is the single source of
    /// truth; the metadata copy is written through from here.
    pub fn set_pinned_exercises(&mut self, pinned: Vec<String>) {
        self.settings.pinned_exercises = pinned;
        self.persist_settings();
    }

    pub fn pinned_exercises(&self) -> &[String] {
        &self.settings.pinned_exercises
    }

    /// Full reset back to factory defaults, persisted across every slice
    pub fn reset(&mut self) {
        self.profile = Profile::default();
        self.settings = Settings::default();
        self.history = ExerciseHistory::new();
        self.cardio_history = CardioHistory::new();
        self.app_state = AppState::default();
        self.meta = Meta::default();
        self.active_session = None;
        self.draft_plan = None;
        self.dismissed_draft_date = None;
        self.session_start_notice = None;
        self.save_guard = None;

        self.persist_profile();
        self.persist_settings();
        self.persist_history();
        self.persist_cardio();
        self.persist_app_state();
        self.persist_meta();
        self.persist_active_session();
        self.persist_draft_plan();
        self.persist_dismissed();
    }

    // ------------------------------------------------------------------
    // Persistence (one slice per store key)
    // ------------------------------------------------------------------

    pub(crate) fn persist_profile(&mut self) {
        self.store.set(crate::persist::KEY_PROFILE, &self.profile);
        self.store
            .set(crate::persist::KEY_ONBOARDED, &self.profile.onboarded);
    }

    pub(crate) fn persist_settings(&mut self) {
        self.store.set(crate::persist::KEY_SETTINGS, &self.settings);
        // Write-through: the meta copy always mirrors settings
        self.meta.pinned_exercises = self.settings.pinned_exercises.clone();
        self.persist_meta();
    }

    pub(crate) fn persist_history(&mut self) {
        self.store.set(crate::persist::KEY_HISTORY, &self.history);
    }

    pub(crate) fn persist_cardio(&mut self) {
        self.store
            .set(crate::persist::KEY_CARDIO, &self.cardio_history);
    }

    pub(crate) fn persist_app_state(&mut self) {
        self.store.set(crate::persist::KEY_APP_STATE, &self.app_state);
    }

    pub(crate) fn persist_meta(&mut self) {
        self.meta.version = STORAGE_VERSION;
        self.meta.pinned_exercises = self.settings.pinned_exercises.clone();
        self.store.set(crate::persist::KEY_META, &self.meta);
    }

    pub(crate) fn persist_active_session(&mut self) {
        self.store
            .set(crate::persist::KEY_ACTIVE_SESSION, &self.active_session);
    }

    pub(crate) fn persist_draft_plan(&mut self) {
        self.store
            .set(crate::persist::KEY_DRAFT_PLAN, &self.draft_plan);
    }

    pub(crate) fn persist_dismissed(&mut self) {
        self.store
            .set(crate::persist::KEY_DISMISSED_DRAFT, &self.dismissed_draft_date);
    }

    pub(crate) fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }
}

fn max_weight(sets: &[SetEntry]) -> Option<f64> {
    sets.iter()
        .map(|s| s.weight)
        .fold(None, |acc, w| match acc {
            Some(best) if best >= w => Some(best),
            _ => Some(w),
        })
}

fn total_reps(sets: &[SetEntry]) -> u32 {
    sets.iter().map(|s| s.reps).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_tracker() -> (Tracker, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path());
        let today = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let profile = Profile {
            onboarded: true,
            ..Profile::default()
        };
        let tracker = Tracker::from_parts(
            store,
            today,
            profile,
            Settings::default(),
            ExerciseHistory::new(),
            CardioHistory::new(),
            AppState::default(),
            Meta::default(),
            None,
            None,
            None,
        );
        (tracker, dir)
    }

    fn strength_payload(tracker: &Tracker, weight: f64, reps: Vec<u32>) -> StrengthSession {
        StrengthSession {
            date: tracker.today().and_hms_opt(10, 0, 0).unwrap().and_utc(),
            sets: reps
                .into_iter()
                .map(|r| SetEntry {
                    weight,
                    reps: r,
                    difficulty: Some(Difficulty::Good),
                })
                .collect(),
            anchor_weight: Some(weight),
            anchor_reps: None,
            adjusted_today: false,
            note: None,
            baseline_weight: None,
            baseline_reps: None,
        }
    }

    #[test]
    fn test_save_same_day_replaces() {
        let (mut tracker, _dir) = test_tracker();
        let first = strength_payload(&tracker, 100.0, vec![8, 8]);
        let second = strength_payload(&tracker, 105.0, vec![8, 8, 8]);

        assert_eq!(
            tracker.save_strength_session("chest_press", first),
            SaveOutcome::Saved
        );
        assert_eq!(
            tracker.save_strength_session("chest_press", second),
            SaveOutcome::Saved
        );

        let sessions = &tracker.history["chest_press"];
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].sets().len(), 3);
        assert_eq!(sessions[0].sets()[0].weight, 105.0);
    }

    #[test]
    fn test_save_promotes_session_status() {
        let (mut tracker, _dir) = test_tracker();
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        tracker.save_strength_session("chest_press", payload);

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.logged_set_count("chest_press"), 1);
    }

    #[test]
    fn test_update_without_sets_stages_planned_placeholders() {
        let (mut tracker, _dir) = test_tracker();
        tracker.start_empty_session();
        tracker
            .active_session
            .as_mut()
            .unwrap()
            .items
            .push(SessionItem {
                exercise_id: "chest_press".into(),
                name: "Chest Press".into(),
                kind: ExerciseKind::Strength,
                sets: 3,
            });

        tracker.update_active_session("chest_press", ExerciseKind::Strength, None, None);

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.logged_set_count("chest_press"), 3);
        assert!(session.sets_by_exercise["chest_press"]
            .iter()
            .all(|s| s.weight.is_none() && s.reps.is_none()));
        // Placeholders alone do not start the session
        assert_eq!(session.status, SessionStatus::Draft);
    }

    #[test]
    fn test_save_marks_workout_day_and_rotation() {
        let (mut tracker, _dir) = test_tracker();
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        tracker.save_strength_session("chest_press", payload);

        assert!(tracker.has_workout_today());
        assert_eq!(tracker.app_state.last_workout_type, Some(WorkoutType::Push));
        assert_eq!(
            tracker.app_state.last_workout_day_key.as_deref(),
            Some("2024-03-07")
        );
        // Same day: rotation repeats today's type
        assert_eq!(tracker.todays_workout_type(), WorkoutType::Push);
        assert_eq!(tracker.meta.exercise_usage_counts["chest_press"], 1);
        assert_eq!(tracker.meta.recent_exercises, vec!["chest_press".to_string()]);
    }

    #[test]
    fn test_duplicate_save_dropped() {
        let (mut tracker, _dir) = test_tracker();
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        assert_eq!(
            tracker.save_strength_session("chest_press", payload.clone()),
            SaveOutcome::Saved
        );
        assert_eq!(
            tracker.save_strength_session("chest_press", payload),
            SaveOutcome::Duplicate
        );
    }

    #[test]
    fn test_invalid_payload_rejected() {
        let (mut tracker, _dir) = test_tracker();
        let mut payload = strength_payload(&tracker, 100.0, vec![8]);
        payload.sets[0].weight = 0.0;
        assert_eq!(
            tracker.save_strength_session("chest_press", payload),
            SaveOutcome::Invalid
        );
        assert!(tracker.history.is_empty());

        let empty = StrengthSession {
            sets: vec![],
            ..strength_payload(&tracker, 100.0, vec![8])
        };
        assert_eq!(
            tracker.save_strength_session("chest_press", empty),
            SaveOutcome::Invalid
        );
    }

    #[test]
    fn test_improvement_message() {
        let (mut tracker, _dir) = test_tracker();
        let mut first = strength_payload(&tracker, 100.0, vec![8]);
        first.date = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        tracker.save_strength_session("chest_press", first);
        tracker.drain_messages();

        let better = strength_payload(&tracker, 110.0, vec![8]);
        tracker.save_strength_session("chest_press", better);
        let messages = tracker.drain_messages();
        assert!(messages.contains(&"More than last time.".to_string()));
    }

    #[test]
    fn test_cardio_save_mirrors_history() {
        let (mut tracker, _dir) = test_tracker();
        let session = CardioSession {
            date: tracker.today().and_hms_opt(9, 0, 0).unwrap().and_utc(),
            duration: 30,
            distance: Some(3.1),
            intensity: Some("moderate".into()),
            activity_id: "treadmill".into(),
            note: None,
        };
        assert_eq!(
            tracker.save_cardio_session("running", session),
            SaveOutcome::Saved
        );

        assert_eq!(tracker.cardio_history["running"].len(), 1);
        assert_eq!(tracker.history["cardio_running"].len(), 1);
        assert!(tracker.has_workout_today());

        let live = tracker.active_session_today().unwrap();
        let item = &live.items[live.item_index("cardio_running").unwrap()];
        assert_eq!(item.kind, ExerciseKind::Cardio);
        assert_eq!(item.name, "Cardio: Running");
    }

    #[test]
    fn test_cardio_zero_duration_invalid() {
        let (mut tracker, _dir) = test_tracker();
        let session = CardioSession {
            date: tracker.today().and_hms_opt(9, 0, 0).unwrap().and_utc(),
            duration: 0,
            distance: None,
            intensity: None,
            activity_id: "walk".into(),
            note: None,
        };
        assert_eq!(
            tracker.save_cardio_session("running", session),
            SaveOutcome::Invalid
        );
        assert!(tracker.cardio_history.is_empty());
    }

    #[test]
    fn test_rest_day_idempotent() {
        let (mut tracker, _dir) = test_tracker();
        assert!(tracker.log_rest_day());
        assert!(!tracker.log_rest_day());
        assert_eq!(
            tracker
                .app_state
                .rest_days
                .iter()
                .filter(|d| d.as_str() == "2024-03-07")
                .count(),
            1
        );
        assert!(tracker.rest_day_logged_today());
    }

    #[test]
    fn test_rest_day_blocked_by_workout() {
        let (mut tracker, _dir) = test_tracker();
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        tracker.save_strength_session("chest_press", payload);
        assert!(!tracker.log_rest_day());
        assert!(tracker.has_workout_today());
    }

    #[test]
    fn test_workout_wins_over_rest() {
        let (mut tracker, _dir) = test_tracker();
        assert!(tracker.log_rest_day());
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        tracker.save_strength_session("chest_press", payload);
        // Workout displaces the earlier rest entry for the day
        assert!(tracker.has_workout_today());
        assert!(!tracker.rest_day_logged_today());
    }

    #[test]
    fn test_start_workout_from_empty_draft() {
        let (mut tracker, _dir) = test_tracker();
        tracker.start_workout_from_builder();

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.items.is_empty());
        assert!(tracker.draft_plan_today().is_none());
        assert!(tracker.has_workout_today());
        assert!(tracker.session_start_notice().is_some());
    }

    #[test]
    fn test_start_workout_merges_draft_into_session() {
        let (mut tracker, _dir) = test_tracker();
        tracker.add_exercise_to_session("chest_press", None);
        let mut rng = StdRng::seed_from_u64(9);
        tracker.generate_plan(PlanFocus::Pull, &PlanOptions::default(), &mut rng);

        // Session was re-synced to the generated list, then re-add one
        tracker.add_exercise_to_session("chest_press", None);
        tracker.start_workout_from_builder();

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.item_index("chest_press").is_some());
        for id in session.items.iter().map(|i| i.exercise_id.clone()) {
            assert!(session.sets_by_exercise.contains_key(&id));
        }
        assert!(tracker.draft_plan_today().is_none());
    }

    #[test]
    fn test_remove_without_sets_needs_no_confirmation() {
        let (mut tracker, _dir) = test_tracker();
        tracker.add_exercise_to_session("chest_press", None);
        assert_eq!(
            tracker.remove_session_exercise("chest_press", Confirmation::Unconfirmed),
            EditOutcome::Done
        );
        assert!(tracker
            .active_session_today()
            .map(|s| s.items.is_empty())
            .unwrap_or(true));
    }

    #[test]
    fn test_remove_with_sets_requires_confirmation_and_purges() {
        let (mut tracker, _dir) = test_tracker();
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        tracker.save_strength_session("chest_press", payload);
        assert_eq!(tracker.history["chest_press"].len(), 1);

        assert_eq!(
            tracker.remove_session_exercise("chest_press", Confirmation::Unconfirmed),
            EditOutcome::NeedsConfirmation
        );
        // Declined: nothing changed
        assert_eq!(tracker.history["chest_press"].len(), 1);
        assert!(tracker
            .active_session_today()
            .unwrap()
            .item_index("chest_press")
            .is_some());

        assert_eq!(
            tracker.remove_session_exercise("chest_press", Confirmation::Confirmed),
            EditOutcome::Done
        );
        assert!(tracker.history["chest_press"].is_empty());
        assert!(tracker
            .active_session_today()
            .unwrap()
            .item_index("chest_press")
            .is_none());
        let day = tracker.meta.day_entries.get("2024-03-07").unwrap();
        assert!(!day.exercises.contains(&"chest_press".to_string()));
    }

    #[test]
    fn test_draft_add_stages_only_into_existing_session() {
        let (mut tracker, _dir) = test_tracker();

        // No session yet: the id lands in the draft alone
        tracker.add_exercise_to_draft("chest_press");
        assert!(tracker.active_session_today().is_none());
        assert_eq!(tracker.draft_plan_today().unwrap().exercises, vec!["chest_press"]);

        // With a draft-status session, the item is staged as well
        tracker.start_empty_session();
        tracker.add_exercise_to_draft("pec_fly");
        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.items.len(), 1);
        assert_eq!(session.items[0].exercise_id, "pec_fly");
    }

    #[test]
    fn test_swap_replaces_everywhere() {
        let (mut tracker, _dir) = test_tracker();
        tracker.start_empty_session();
        tracker.add_exercise_to_draft("chest_press");
        tracker.add_exercise_to_draft("pec_fly");

        assert_eq!(
            tracker.swap_session_exercise(0, "db_bench_press", Confirmation::Unconfirmed),
            EditOutcome::Done
        );

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.items[0].exercise_id, "db_bench_press");
        assert!(session.sets_by_exercise.contains_key("db_bench_press"));
        assert!(!session.sets_by_exercise.contains_key("chest_press"));

        let draft = tracker.draft_plan_today().unwrap();
        assert_eq!(draft.exercises[0], "db_bench_press");
        assert_eq!(draft.exercises[1], "pec_fly");
    }

    #[test]
    fn test_add_from_search_signals_already_present() {
        let (mut tracker, _dir) = test_tracker();
        assert_eq!(
            tracker.add_exercise_from_search("chest_press"),
            AddOutcome::Added
        );
        assert_eq!(
            tracker.add_exercise_from_search("chest_press"),
            AddOutcome::AlreadyPresent
        );
        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.items.len(), 1);
    }

    #[test]
    fn test_finish_requires_progress_or_sets() {
        let (mut tracker, _dir) = test_tracker();
        assert!(!tracker.finish_active_session());

        tracker.start_empty_session();
        assert!(!tracker.finish_active_session());

        tracker.start_workout_from_builder();
        assert!(tracker.finish_active_session());
        assert!(tracker.active_session.is_none());
        assert!(tracker.draft_plan.is_none());
        assert_eq!(tracker.history[SESSION_SUMMARY_KEY].len(), 1);
    }

    #[test]
    fn test_generated_session_stays_draft_on_sync() {
        let (mut tracker, _dir) = test_tracker();
        let mut rng = StdRng::seed_from_u64(2);
        let draft = tracker.generate_plan(PlanFocus::Push, &PlanOptions::default(), &mut rng);
        assert_eq!(draft.exercises.len(), 4);

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.status, SessionStatus::Draft);
        assert_eq!(session.created_from, CreatedFrom::Generated);
        assert_eq!(session.items.len(), draft.exercises.len());
    }

    #[test]
    fn test_regenerate_resyncs_session() {
        let (mut tracker, _dir) = test_tracker();
        let mut rng = StdRng::seed_from_u64(2);
        tracker.generate_plan(PlanFocus::Push, &PlanOptions::default(), &mut rng);
        assert!(tracker.regenerate_plan(None, &mut rng));

        let draft = tracker.draft_plan_today().unwrap().clone();
        let session = tracker.active_session_today().unwrap();
        let session_ids: Vec<String> =
            session.items.iter().map(|i| i.exercise_id.clone()).collect();
        assert_eq!(session_ids, draft.exercises);
    }

    #[test]
    fn test_regenerate_without_draft_is_noop() {
        let (mut tracker, _dir) = test_tracker();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(!tracker.regenerate_plan(None, &mut rng));
    }

    #[test]
    fn test_clear_draft_keeps_session_status() {
        let (mut tracker, _dir) = test_tracker();
        tracker.start_workout_from_builder();
        tracker.add_exercise_to_session("chest_press", None);
        let mut rng = StdRng::seed_from_u64(4);
        // Draft created after start; session already in progress, so no sync
        tracker.generate_plan(PlanFocus::Legs, &PlanOptions::default(), &mut rng);
        tracker.clear_draft_plan();

        let session = tracker.active_session_today().unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(tracker.draft_plan_today().is_none());
        assert!(tracker.dismissed_draft_date.is_none());
    }

    #[test]
    fn test_dismiss_draft_keeps_it_stored() {
        let (mut tracker, _dir) = test_tracker();
        let mut rng = StdRng::seed_from_u64(4);
        tracker.generate_plan(PlanFocus::Push, &PlanOptions::default(), &mut rng);
        tracker.dismiss_draft_for_today();
        assert!(tracker.draft_dismissed_today());
        assert!(tracker.draft_plan_today().is_some());
    }

    #[test]
    fn test_pinned_single_source_of_truth() {
        let (mut tracker, _dir) = test_tracker();
        tracker.set_pinned_exercises(vec!["chest_press".into(), "bb_squat".into()]);
        assert_eq!(tracker.settings.pinned_exercises.len(), 2);
        assert_eq!(tracker.meta.pinned_exercises, tracker.settings.pinned_exercises);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (mut tracker, _dir) = test_tracker();
        let payload = strength_payload(&tracker, 100.0, vec![8]);
        tracker.save_strength_session("chest_press", payload);
        tracker.reset();

        assert!(!tracker.profile.onboarded);
        assert!(tracker.history.is_empty());
        assert!(tracker.meta.day_entries.is_empty());
        assert!(tracker.active_session.is_none());
        assert_eq!(tracker.streak().best, 0);
    }

    #[test]
    fn test_week_workout_count() {
        let (mut tracker, _dir) = test_tracker();
        for day in ["2024-03-05", "2024-03-06", "2024-03-07", "2024-02-20"] {
            tracker.record_day_entry(day.to_string(), DayKind::Workout, &[]);
        }
        assert_eq!(tracker.workouts_this_week(), 3);
    }
}

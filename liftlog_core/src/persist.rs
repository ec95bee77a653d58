//! Loading the tracker from the store.
//!
//! The bridge between raw stored blobs and a live [`Tracker`]: every slice
//! loads independently with its own default, legacy blob shapes are
//! normalized into the current types, stale (non-today) sessions and drafts
//! are discarded, and the versioned metadata blob is rebuilt from raw
//! history whenever its version does not match [`STORAGE_VERSION`].
//! Corrupt or missing slices never abort a load.

use crate::catalog::default_catalog;
use crate::engine::{Tracker, RECENT_LIMIT};
use crate::metrics;
use crate::store::Store;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const KEY_PROFILE: &str = "profile";
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_HISTORY: &str = "history";
pub const KEY_CARDIO: &str = "cardio";
pub const KEY_APP_STATE: &str = "app_state";
pub const KEY_ONBOARDED: &str = "onboarded";
pub const KEY_ACTIVE_SESSION: &str = "active_session";
pub const KEY_DRAFT_PLAN: &str = "draft_plan";
pub const KEY_DISMISSED_DRAFT: &str = "dismissed_draft";
pub const KEY_META: &str = "meta";
pub const KEY_LAST_OPEN: &str = "last_open";

/// Days away after which the returning-user notice fires
const WELCOME_BACK_GAP_DAYS: i64 = 4;

// ----------------------------------------------------------------------
// Legacy blob shapes
// ----------------------------------------------------------------------

/// Older builds stored the session as a map of exercise id to sets under an
/// `exercises` key, with no item list and no origin marker.
#[derive(Deserialize)]
struct LegacySession {
    date: DayKey,
    #[serde(default)]
    status: Option<SessionStatus>,
    #[serde(default)]
    exercises: BTreeMap<String, Vec<SetDraft>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Current(ActiveSession),
    Legacy(LegacySession),
}

impl StoredSession {
    fn normalize(self) -> ActiveSession {
        match self {
            StoredSession::Current(session) => session,
            StoredSession::Legacy(legacy) => {
                let catalog = default_catalog();
                let items = legacy
                    .exercises
                    .iter()
                    .map(|(id, sets)| SessionItem {
                        exercise_id: id.clone(),
                        name: catalog.exercise_name(id),
                        kind: if id.starts_with(CARDIO_KEY_PREFIX) {
                            ExerciseKind::Cardio
                        } else {
                            ExerciseKind::Strength
                        },
                        sets: sets.len(),
                    })
                    .collect();
                ActiveSession {
                    date: legacy.date,
                    status: legacy.status.unwrap_or(SessionStatus::Draft),
                    items,
                    sets_by_exercise: legacy.exercises,
                    created_from: CreatedFrom::Manual,
                }
            }
        }
    }
}

/// Older drafts carried their exercise list under `items`
#[derive(Deserialize)]
struct LegacyDraft {
    date: DayKey,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    focus: Option<PlanFocus>,
    #[serde(default)]
    items: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDraft {
    Current(DraftPlan),
    Legacy(LegacyDraft),
}

impl StoredDraft {
    fn normalize(self) -> DraftPlan {
        match self {
            StoredDraft::Current(draft) => draft,
            StoredDraft::Legacy(legacy) => DraftPlan {
                date: legacy.date,
                label: legacy.label.unwrap_or_else(|| "Workout Draft".into()),
                focus: legacy.focus.unwrap_or(PlanFocus::Full),
                exercises: legacy.items,
                options: PlanOptions::default(),
                created_from: CreatedFrom::Manual,
            },
        }
    }
}

/// Historical records written before the tag field existed
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredHistoryEntry {
    Tagged(HistoryEntry),
    LegacyStrength(StrengthSession),
    LegacyCardio(CardioSession),
    LegacySummary(SessionSummary),
}

impl StoredHistoryEntry {
    fn normalize(self) -> HistoryEntry {
        match self {
            StoredHistoryEntry::Tagged(entry) => entry,
            StoredHistoryEntry::LegacyStrength(s) => HistoryEntry::Strength(s),
            StoredHistoryEntry::LegacyCardio(s) => HistoryEntry::Cardio(s),
            StoredHistoryEntry::LegacySummary(s) => HistoryEntry::Session(s),
        }
    }
}

pub(crate) type StoredHistory = BTreeMap<String, Vec<StoredHistoryEntry>>;

pub(crate) fn normalize_history(stored: StoredHistory) -> ExerciseHistory {
    stored
        .into_iter()
        .map(|(key, entries)| {
            (
                key,
                entries.into_iter().map(StoredHistoryEntry::normalize).collect(),
            )
        })
        .collect()
}

// ----------------------------------------------------------------------
// Load
// ----------------------------------------------------------------------

impl Tracker {
    /// Load every slice from the store and assemble a tracker for `today`.
    /// Stale sessions/drafts are dropped (and their removal persisted), and
    /// an out-of-version metadata blob is rebuilt and written back before
    /// this returns.
    pub fn load(mut store: Store, today: NaiveDate) -> Tracker {
        let today_key = day_key(today);

        let mut profile: Profile = store.get(KEY_PROFILE, Profile::default());
        // The standalone flag predates the field on the profile blob
        let onboarded_flag: bool = store.get(KEY_ONBOARDED, false);
        profile.onboarded = profile.onboarded || onboarded_flag;

        let settings: Settings = store.get(KEY_SETTINGS, Settings::default());

        let stored_history: StoredHistory = store.get(KEY_HISTORY, StoredHistory::new());
        let history = normalize_history(stored_history);

        let cardio_history: CardioHistory = store.get(KEY_CARDIO, CardioHistory::new());
        let app_state: AppState = store.get(KEY_APP_STATE, AppState::default());

        let stored_meta: Option<Meta> = store.get(KEY_META, None);
        let meta_current = stored_meta
            .as_ref()
            .map(|m| m.version == STORAGE_VERSION)
            .unwrap_or(false);
        let mut meta = if meta_current {
            stored_meta.unwrap_or_default()
        } else {
            tracing::info!(
                "Metadata blob missing or out of version, rebuilding from history"
            );
            rebuild_meta(&history, &cardio_history, &app_state.rest_days)
        };
        meta.pinned_exercises = settings.pinned_exercises.clone();
        meta.version = STORAGE_VERSION;
        if !meta_current {
            store.set(KEY_META, &meta);
        }

        let stored_session: Option<StoredSession> = store.get(KEY_ACTIVE_SESSION, None);
        let active_session = stored_session
            .map(StoredSession::normalize)
            .filter(|s| s.date == today_key);

        let stored_draft: Option<StoredDraft> = store.get(KEY_DRAFT_PLAN, None);
        let draft_plan = stored_draft
            .map(StoredDraft::normalize)
            .filter(|d| d.date == today_key);

        let dismissed: Option<DayKey> = store.get(KEY_DISMISSED_DRAFT, None);
        let dismissed_draft_date = dismissed.filter(|d| *d == today_key);

        let last_open: Option<DateTime<Utc>> = store.get(KEY_LAST_OPEN, None);

        let mut tracker = Tracker::from_parts(
            store,
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
        );

        // Write the discards through so a stale session cannot come back
        tracker.persist_active_session();
        tracker.persist_draft_plan();
        tracker.persist_dismissed();

        if tracker.profile.onboarded {
            if let Some(last) = last_open {
                let away = today.signed_duration_since(last.date_naive()).num_days();
                if away >= WELCOME_BACK_GAP_DAYS {
                    tracker.push_message("Welcome back. No rush.");
                }
            }
            let now = Utc::now();
            tracker.store_mut().set(KEY_LAST_OPEN, &now);
        }

        tracker
    }
}

/// Rebuild the derived indices from raw history
pub(crate) fn rebuild_meta(
    history: &ExerciseHistory,
    cardio_history: &CardioHistory,
    rest_days: &[DayKey],
) -> Meta {
    Meta {
        version: STORAGE_VERSION,
        pinned_exercises: Vec::new(),
        recent_exercises: metrics::derive_recent_exercises(history, RECENT_LIMIT),
        exercise_usage_counts: metrics::derive_usage_counts(history),
        day_entries: metrics::build_day_entries_from_history(
            history,
            cardio_history,
            rest_days,
        ),
        last_exercise_stats: derive_last_stats(history),
    }
}

fn derive_last_stats(history: &ExerciseHistory) -> BTreeMap<String, LastStats> {
    let mut stats = BTreeMap::new();
    for (id, sessions) in history {
        let last_set = sessions
            .iter()
            .rev()
            .flat_map(|s| s.sets().last())
            .next();
        if let Some(set) = last_set {
            stats.insert(
                id.clone(),
                LastStats {
                    weight: set.weight,
                    reps: set.reps,
                },
            );
        }
    }
    stats
}

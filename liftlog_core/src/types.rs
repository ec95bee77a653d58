//! Core domain types for the LiftLog workout tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Profile and settings
//! - Strength/cardio sessions and their history
//! - Day entries and app-level state
//! - The live active session and draft plan
//! - The versioned metadata blob

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current schema version of the metadata blob
pub const STORAGE_VERSION: u32 = 3;

// ============================================================================
// Day keys
// ============================================================================

/// A local calendar date string (`YYYY-MM-DD`), the unit of "one session per
/// exercise per day" and of streak computation.
pub type DayKey = String;

/// Format a date as a day key
pub fn day_key(date: NaiveDate) -> DayKey {
    date.format("%Y-%m-%d").to_string()
}

/// Day key of a stored timestamp
pub fn day_key_of(ts: &DateTime<Utc>) -> DayKey {
    day_key(ts.date_naive())
}

/// Parse a day key back into a date. Returns None for malformed keys.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

// ============================================================================
// Profile and Settings
// ============================================================================

/// Gym environment, gates which equipment classes the generator may use
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GymKind {
    Planet,
    Commercial,
    Iron,
    Home,
}

impl Default for GymKind {
    fn default() -> Self {
        GymKind::Commercial
    }
}

/// User profile, created at onboarding completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default = "default_location")]
    pub workout_location: String,
    #[serde(default)]
    pub gym_type: GymKind,
    #[serde(default = "default_bar_weight")]
    pub bar_weight: f64,
    #[serde(default)]
    pub onboarded: bool,
}

fn default_avatar() -> String {
    "💪".into()
}

fn default_location() -> String {
    "gym".into()
}

fn default_bar_weight() -> f64 {
    45.0
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            username: String::new(),
            avatar: default_avatar(),
            workout_location: default_location(),
            gym_type: GymKind::default(),
            bar_weight: default_bar_weight(),
            onboarded: false,
        }
    }
}

/// User preferences. `pinned_exercises` here is the single source of truth;
/// the copy in the metadata blob is write-through only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub insights_enabled: bool,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_accent")]
    pub dark_accent: String,
    #[serde(default)]
    pub show_all_exercises: bool,
    #[serde(default)]
    pub pinned_exercises: Vec<String>,
    #[serde(default = "default_view_mode")]
    pub workout_view_mode: String,
    #[serde(default = "default_true")]
    pub suggested_workout_collapsed: bool,
}

fn default_true() -> bool {
    true
}

fn default_accent() -> String {
    "purple".into()
}

fn default_view_mode() -> String {
    "all".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            insights_enabled: true,
            dark_mode: false,
            dark_accent: default_accent(),
            show_all_exercises: false,
            pinned_exercises: Vec::new(),
            workout_view_mode: default_view_mode(),
            suggested_workout_collapsed: true,
        }
    }
}

// ============================================================================
// Sessions and history
// ============================================================================

/// Perceived difficulty of a logged set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Good,
    Hard,
    Failed,
}

/// One completed set of a strength session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// An in-progress set draft inside the active session. Fields stay unset
/// until the user fills them in, so placeholders can be staged.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetDraft {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl SetDraft {
    pub fn from_entry(entry: &SetEntry) -> Self {
        Self {
            weight: Some(entry.weight),
            reps: Some(entry.reps),
            difficulty: entry.difficulty,
        }
    }
}

/// One strength session for a single exercise. At most one exists per
/// exercise per day key; a same-day save replaces it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrengthSession {
    pub date: DateTime<Utc>,
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub anchor_weight: Option<f64>,
    #[serde(default)]
    pub anchor_reps: Option<u32>,
    #[serde(default)]
    pub adjusted_today: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub baseline_weight: Option<f64>,
    #[serde(default)]
    pub baseline_reps: Option<u32>,
}

/// One cardio session (duration in minutes)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardioSession {
    pub date: DateTime<Utc>,
    pub duration: u32,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub intensity: Option<String>,
    pub activity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Whole-workout summary appended under the reserved `workout_sessions`
/// history key when the active session is finished.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub date: DateTime<Utc>,
    pub label: String,
    #[serde(default)]
    pub exercises: Vec<SessionItem>,
}

/// A single record in exercise history. Tagged so strength entries, mirrored
/// cardio entries and session summaries can share one ordered sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    Strength(StrengthSession),
    Cardio(CardioSession),
    Session(SessionSummary),
}

impl HistoryEntry {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            HistoryEntry::Strength(s) => s.date,
            HistoryEntry::Cardio(s) => s.date,
            HistoryEntry::Session(s) => s.date,
        }
    }

    pub fn day_key(&self) -> DayKey {
        day_key_of(&self.date())
    }

    pub fn sets(&self) -> &[SetEntry] {
        match self {
            HistoryEntry::Strength(s) => &s.sets,
            _ => &[],
        }
    }

    pub fn as_strength(&self) -> Option<&StrengthSession> {
        match self {
            HistoryEntry::Strength(s) => Some(s),
            _ => None,
        }
    }
}

/// Exercise id → ordered sessions. Cardio sessions are mirrored in here
/// under synthetic `cardio_<type>` keys for unified iteration.
pub type ExerciseHistory = BTreeMap<String, Vec<HistoryEntry>>;

/// Cardio type → ordered sessions
pub type CardioHistory = BTreeMap<String, Vec<CardioSession>>;

/// Reserved history key for whole-workout summaries
pub const SESSION_SUMMARY_KEY: &str = "workout_sessions";

/// Prefix of the synthetic history keys mirroring cardio sessions
pub const CARDIO_KEY_PREFIX: &str = "cardio_";

// ============================================================================
// App state and day entries
// ============================================================================

/// Workout focus rotation: Push → Pull → Legs → Push
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkoutType {
    Push,
    Pull,
    Legs,
}

impl WorkoutType {
    pub fn next(self) -> Self {
        match self {
            WorkoutType::Push => WorkoutType::Pull,
            WorkoutType::Pull => WorkoutType::Legs,
            WorkoutType::Legs => WorkoutType::Push,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkoutType::Push => "Push",
            WorkoutType::Pull => "Pull",
            WorkoutType::Legs => "Legs",
        }
    }
}

/// Rotation bookkeeping plus the append-only rest day set
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub last_workout_type: Option<WorkoutType>,
    #[serde(default)]
    pub last_workout_day_key: Option<DayKey>,
    #[serde(default)]
    pub rest_days: Vec<DayKey>,
}

/// What a recorded day was
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Workout,
    Rest,
}

/// Authoritative day-level index entry. A workout kind is sticky: once a day
/// is marked workout it never reverts to rest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DayEntry {
    #[serde(rename = "type")]
    pub kind: DayKind,
    pub date: DayKey,
    #[serde(default)]
    pub exercises: Vec<String>,
}

/// Day key → entry, sorted by day
pub type DayEntries = BTreeMap<DayKey, DayEntry>;

// ============================================================================
// Active session and draft plan (today only)
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Draft,
    InProgress,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreatedFrom {
    Manual,
    Generated,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Strength,
    Cardio,
}

/// One exercise slot inside the active session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionItem {
    pub exercise_id: String,
    pub name: String,
    pub kind: ExerciseKind,
    pub sets: usize,
}

/// Today's live logging session. Exists for at most one day; sessions from a
/// prior day are discarded on load, never carried forward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActiveSession {
    pub date: DayKey,
    pub status: SessionStatus,
    #[serde(default)]
    pub items: Vec<SessionItem>,
    #[serde(default)]
    pub sets_by_exercise: BTreeMap<String, Vec<SetDraft>>,
    pub created_from: CreatedFrom,
}

impl ActiveSession {
    pub fn empty(date: DayKey, created_from: CreatedFrom) -> Self {
        Self {
            date,
            status: SessionStatus::Draft,
            items: Vec::new(),
            sets_by_exercise: BTreeMap::new(),
            created_from,
        }
    }

    /// True when any exercise has at least one staged set
    pub fn has_logged_sets(&self) -> bool {
        self.sets_by_exercise.values().any(|sets| !sets.is_empty())
    }

    pub fn item_index(&self, exercise_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.exercise_id == exercise_id)
    }

    pub fn logged_set_count(&self, exercise_id: &str) -> usize {
        self.sets_by_exercise
            .get(exercise_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

/// What the generator was asked for
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanFocus {
    Push,
    Pull,
    Legs,
    Full,
    Surprise,
}

impl From<WorkoutType> for PlanFocus {
    fn from(t: WorkoutType) -> Self {
        match t {
            WorkoutType::Push => PlanFocus::Push,
            WorkoutType::Pull => PlanFocus::Pull,
            WorkoutType::Legs => PlanFocus::Legs,
        }
    }
}

/// Equipment restriction for the generator
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentFilter {
    Machines,
    Free,
}

/// Optional generator tweaks
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanOptions {
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub equipment: Option<EquipmentFilter>,
}

/// A proposed, not-yet-started exercise list for today
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DraftPlan {
    pub date: DayKey,
    pub label: String,
    pub focus: PlanFocus,
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub options: PlanOptions,
    pub created_from: CreatedFrom,
}

// ============================================================================
// Versioned metadata blob
// ============================================================================

/// Last-known weight/reps for an exercise, used to pre-fill logging forms
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LastStats {
    pub weight: f64,
    pub reps: u32,
}

/// Derived indices persisted as one blob. Rebuilt from raw history whenever
/// the stored version does not match [`STORAGE_VERSION`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meta {
    pub version: u32,
    #[serde(default)]
    pub pinned_exercises: Vec<String>,
    #[serde(default)]
    pub recent_exercises: Vec<String>,
    #[serde(default)]
    pub exercise_usage_counts: BTreeMap<String, u32>,
    #[serde(default)]
    pub day_entries: DayEntries,
    #[serde(default)]
    pub last_exercise_stats: BTreeMap<String, LastStats>,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            pinned_exercises: Vec::new(),
            recent_exercises: Vec::new(),
            exercise_usage_counts: BTreeMap::new(),
            day_entries: DayEntries::new(),
            last_exercise_stats: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_key_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let key = day_key(date);
        assert_eq!(key, "2024-03-07");
        assert_eq!(parse_day_key(&key), Some(date));
    }

    #[test]
    fn test_history_entry_tagging() {
        let entry = HistoryEntry::Strength(StrengthSession {
            date: Utc.with_ymd_and_hms(2024, 3, 7, 10, 0, 0).unwrap(),
            sets: vec![SetEntry {
                weight: 100.0,
                reps: 8,
                difficulty: Some(Difficulty::Good),
            }],
            anchor_weight: Some(100.0),
            anchor_reps: Some(8),
            adjusted_today: false,
            note: None,
            baseline_weight: None,
            baseline_reps: None,
        });

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "strength");
        assert_eq!(json["sets"][0]["difficulty"], "good");

        let back: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.sets().len(), 1);
        assert_eq!(back.day_key(), "2024-03-07");
    }

    #[test]
    fn test_workout_type_rotation() {
        assert_eq!(WorkoutType::Push.next(), WorkoutType::Pull);
        assert_eq!(WorkoutType::Pull.next(), WorkoutType::Legs);
        assert_eq!(WorkoutType::Legs.next(), WorkoutType::Push);
    }

    #[test]
    fn test_settings_partial_blob_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"dark_mode": true}"#).unwrap();
        assert!(settings.dark_mode);
        assert!(settings.insights_enabled);
        assert_eq!(settings.dark_accent, "purple");
        assert!(settings.pinned_exercises.is_empty());
    }

    #[test]
    fn test_active_session_logged_sets() {
        let mut session = ActiveSession::empty("2024-03-07".into(), CreatedFrom::Manual);
        assert!(!session.has_logged_sets());
        session
            .sets_by_exercise
            .insert("chest_press".into(), vec![SetDraft::default()]);
        assert!(session.has_logged_sets());
        assert_eq!(session.logged_set_count("chest_press"), 1);
        assert_eq!(session.logged_set_count("leg_press"), 0);
    }
}

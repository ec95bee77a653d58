//! Derived metrics over historical logs.
//!
//! Everything in this module is a pure function of history/state: streaks,
//! strength score, achievements, the Push/Pull/Legs rotation, per-exercise
//! bests and progression advice. Nothing here mutates, so results are safely
//! memoizable by callers.

use crate::catalog::{Catalog, TAG_LEGS};
use crate::types::*;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Streak summary. `current` is the length of the run ending at the most
/// recent recorded day, which is not necessarily today; `has_today` flags
/// whether that run includes today.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreakSummary {
    pub current: u32,
    pub best: u32,
    pub last_day_key: Option<DayKey>,
    pub has_today: bool,
}

impl StreakSummary {
    fn zero() -> Self {
        Self {
            current: 0,
            best: 0,
            last_day_key: None,
            has_today: false,
        }
    }
}

/// 0-100 composite strength metric with its components
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrengthScore {
    pub score: u32,
    pub avg_pct: u32,
    pub coverage_pct: u32,
    pub logged_count: usize,
    pub total: usize,
}

/// One achievement unlock condition
#[derive(Clone, Debug)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub desc: &'static str,
    pub unlocked: bool,
}

/// Progression signal derived from recent at-best sets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advice {
    /// Ready to bump weight next time
    Ready,
    /// Keep building, close to a bump
    Building,
}

impl Advice {
    pub fn message(self) -> &'static str {
        match self {
            Advice::Ready => "Ready to bump weight next time",
            Advice::Building => "Keep building - you are close",
        }
    }
}

/// Sorted distinct day keys on which the user did something (workout or
/// rest). The day-entry index is authoritative when non-empty; otherwise
/// keys are derived from raw session timestamps plus rest days.
pub fn unique_training_days(
    history: &ExerciseHistory,
    cardio_history: &CardioHistory,
    rest_days: &[DayKey],
    day_entries: Option<&DayEntries>,
) -> Vec<DayKey> {
    if let Some(entries) = day_entries {
        if !entries.is_empty() {
            return entries.keys().cloned().collect();
        }
    }

    let mut keys = BTreeSet::new();
    for sessions in history.values() {
        for session in sessions {
            keys.insert(session.day_key());
        }
    }
    for sessions in cardio_history.values() {
        for session in sessions {
            keys.insert(day_key_of(&session.date));
        }
    }
    for day in rest_days {
        keys.insert(day.clone());
    }
    keys.into_iter().collect()
}

/// Compute current/best streaks over all recorded days
pub fn compute_streak(
    history: &ExerciseHistory,
    cardio_history: &CardioHistory,
    rest_days: &[DayKey],
    day_entries: Option<&DayEntries>,
    today: NaiveDate,
) -> StreakSummary {
    let day_keys = unique_training_days(history, cardio_history, rest_days, day_entries);
    let days: Vec<NaiveDate> = day_keys.iter().filter_map(|k| parse_day_key(k)).collect();
    if days.is_empty() {
        return StreakSummary::zero();
    }

    let mut best = 1u32;
    let mut run = 1u32;
    for pair in days.windows(2) {
        if pair[1] - pair[0] == Duration::days(1) {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }

    // Walk back from the most recent day while days stay consecutive
    let mut current = 1u32;
    let mut i = days.len() - 1;
    while i > 0 {
        if days[i] - days[i - 1] == Duration::days(1) {
            current += 1;
            i -= 1;
        } else {
            break;
        }
    }

    let anchor = days[days.len() - 1];
    StreakSummary {
        current,
        best,
        last_day_key: Some(day_key(anchor)),
        has_today: anchor == today,
    }
}

/// Synthesize the day-entry index from raw history, used by migration when
/// the metadata blob version is stale.
pub fn build_day_entries_from_history(
    history: &ExerciseHistory,
    cardio_history: &CardioHistory,
    rest_days: &[DayKey],
) -> DayEntries {
    let mut entries = DayEntries::new();
    for sessions in history.values() {
        for session in sessions {
            let key = session.day_key();
            entries.entry(key.clone()).or_insert(DayEntry {
                kind: DayKind::Workout,
                date: key,
                exercises: Vec::new(),
            });
        }
    }
    for sessions in cardio_history.values() {
        for session in sessions {
            let key = day_key_of(&session.date);
            entries.entry(key.clone()).or_insert(DayEntry {
                kind: DayKind::Workout,
                date: key,
                exercises: Vec::new(),
            });
        }
    }
    for day in rest_days {
        entries.entry(day.clone()).or_insert(DayEntry {
            kind: DayKind::Rest,
            date: day.clone(),
            exercises: Vec::new(),
        });
    }
    entries
}

/// The `limit` most-recently-dated distinct exercise ids
pub fn derive_recent_exercises(history: &ExerciseHistory, limit: usize) -> Vec<String> {
    let mut flat: Vec<(&String, chrono::DateTime<chrono::Utc>)> = Vec::new();
    for (id, sessions) in history {
        for session in sessions {
            flat.push((id, session.date()));
        }
    }
    flat.sort_by(|a, b| b.1.cmp(&a.1));

    let mut seen = BTreeSet::new();
    let mut result = Vec::new();
    for (id, _) in flat {
        if seen.insert(id.clone()) {
            result.push(id.clone());
            if result.len() >= limit {
                break;
            }
        }
    }
    result
}

/// Per-exercise total logged-set counts, minimum 1 per session
pub fn derive_usage_counts(history: &ExerciseHistory) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for (id, sessions) in history {
        for session in sessions {
            let increment = session.sets().len().max(1) as u32;
            *counts.entry(id.clone()).or_insert(0) += increment;
        }
    }
    counts
}

/// Max weight across all logged sets, None when nothing is logged
pub fn best_for_exercise(sessions: &[HistoryEntry]) -> Option<f64> {
    let mut best = 0.0f64;
    for session in sessions {
        for set in session.sets() {
            if set.weight > best {
                best = set.weight;
            }
        }
    }
    (best > 0.0).then_some(best)
}

/// Round to the nearest 5 with a floor of 10
fn clamp_to_5(n: f64) -> f64 {
    ((n / 5.0).round() * 5.0).max(10.0)
}

/// Starter weight when an exercise has no logged best yet
pub fn strong_weight_for(catalog: &Catalog, exercise_id: &str) -> f64 {
    let starter = match catalog.exercise(exercise_id) {
        Some(ex) if ex.has_tag(TAG_LEGS) => 45.0,
        _ => 15.0,
    };
    clamp_to_5(starter)
}

/// Next weight to aim for: best (or the starter weight) plus a fixed
/// increment, 10 for leg exercises and 5 otherwise, rounded to the nearest 5
pub fn next_target(catalog: &Catalog, exercise_id: &str, best: Option<f64>) -> f64 {
    let increment = match catalog.exercise(exercise_id) {
        Some(ex) if ex.has_tag(TAG_LEGS) => 10.0,
        _ => 5.0,
    };
    let base = best.unwrap_or_else(|| strong_weight_for(catalog, exercise_id));
    clamp_to_5(base + increment)
}

/// Inspect the last 3 sessions' sets performed at the current best weight
/// and signal readiness to increase.
pub fn progression_advice(sessions: &[HistoryEntry], current_best: f64) -> Option<Advice> {
    if sessions.len() < 2 {
        return None;
    }
    let recent = &sessions[sessions.len().saturating_sub(3)..];

    let mut easy = 0;
    let mut good = 0;
    let mut hard = 0;
    let mut at_best = 0;
    for session in recent {
        for set in session.sets() {
            if set.weight == current_best {
                at_best += 1;
                match set.difficulty {
                    Some(Difficulty::Easy) => easy += 1,
                    Some(Difficulty::Good) => good += 1,
                    Some(Difficulty::Hard) => hard += 1,
                    _ => {}
                }
            }
        }
    }

    if at_best >= 3 && (easy >= 2 || easy + good >= 3) {
        Some(Advice::Ready)
    } else if at_best >= 2 && good + hard >= 2 {
        Some(Advice::Building)
    } else {
        None
    }
}

/// Composite 0-100 strength score: 70% average per-exercise improvement
/// ratio, 30% exercise coverage.
pub fn compute_strength_score(catalog: &Catalog, history: &ExerciseHistory) -> StrengthScore {
    let ids = catalog.exercise_ids();
    let total = ids.len();

    let logged: Vec<&str> = ids
        .iter()
        .copied()
        .filter(|id| history.get(*id).map(|s| !s.is_empty()).unwrap_or(false))
        .collect();

    if logged.is_empty() {
        return StrengthScore {
            score: 0,
            avg_pct: 0,
            coverage_pct: 0,
            logged_count: 0,
            total,
        };
    }

    let ratios: Vec<f64> = logged
        .iter()
        .map(|id| {
            let sessions = &history[*id];
            let best = best_for_exercise(sessions);
            let first_best = best_for_exercise(&sessions[..1]);
            match (first_best, best) {
                (Some(first), Some(best)) => {
                    let improvement = (best - first).max(0.0);
                    (improvement / first * 0.5 + 0.5).min(1.0)
                }
                // Too little signal to compare: participation credit
                _ => 0.3,
            }
        })
        .collect();

    let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let coverage = logged.len() as f64 / total as f64;
    let score01 = avg * 0.7 + coverage * 0.3;

    StrengthScore {
        score: (score01 * 100.0).round() as u32,
        avg_pct: (avg * 100.0).round() as u32,
        coverage_pct: (coverage * 100.0).round() as u32,
        logged_count: logged.len(),
        total,
    }
}

/// Evaluate the fixed achievement set
pub fn compute_achievements(
    catalog: &Catalog,
    history: &ExerciseHistory,
    cardio_history: &CardioHistory,
    score: &StrengthScore,
    streak: &StreakSummary,
) -> Vec<Achievement> {
    let days = unique_training_days(history, cardio_history, &[], None);
    let strength_sessions: usize = history.values().map(|s| s.len()).sum();
    let cardio_sessions: usize = cardio_history.values().map(|s| s.len()).sum();
    let sessions_total = strength_sessions + cardio_sessions;
    let exercises_logged = catalog
        .exercise_ids()
        .iter()
        .filter(|id| history.get(**id).map(|s| !s.is_empty()).unwrap_or(false))
        .count();

    vec![
        Achievement {
            id: "first",
            title: "First Log",
            desc: "Logged your first session",
            unlocked: sessions_total >= 1,
        },
        Achievement {
            id: "3days",
            title: "3-Day Streak",
            desc: "3 consecutive training days",
            unlocked: streak.best >= 3,
        },
        Achievement {
            id: "7days",
            title: "7-Day Streak",
            desc: "7 consecutive training days",
            unlocked: streak.best >= 7,
        },
        Achievement {
            id: "score50",
            title: "Strength Tier 50",
            desc: "Strength Score hit 50",
            unlocked: score.score >= 50,
        },
        Achievement {
            id: "score75",
            title: "Strength Tier 75",
            desc: "Strength Score hit 75",
            unlocked: score.score >= 75,
        },
        Achievement {
            id: "equipment5",
            title: "Explorer",
            desc: "Logged 5+ exercises",
            unlocked: exercises_logged >= 5,
        },
        Achievement {
            id: "days10",
            title: "Show Up Club",
            desc: "Trained on 10 different days",
            unlocked: days.len() >= 10,
        },
    ]
}

/// Today's suggested focus: repeat the last type when it was logged today,
/// otherwise rotate Push → Pull → Legs. Defaults to Push.
pub fn todays_workout_type(app_state: &AppState, today: NaiveDate) -> WorkoutType {
    let today_key = day_key(today);
    match (app_state.last_workout_type, &app_state.last_workout_day_key) {
        (Some(last), Some(key)) if *key == today_key => last,
        (Some(last), _) => last.next(),
        (None, _) => WorkoutType::Push,
    }
}

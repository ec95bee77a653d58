//! Export and import of the full data set as a single JSON document.
//!
//! The bundle carries every persisted slice plus a format version tag.
//! Import validates the whole document before touching any state: a bundle
//! missing its required slices is rejected with no partial writes.

use crate::engine::Tracker;
use crate::error::{Error, Result};
use crate::persist;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bundle format tag written on export and accepted on import
pub const BUNDLE_VERSION: &str = "v2";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bundle {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub profile: Profile,
    pub settings: Settings,
    #[serde(default)]
    pub history: ExerciseHistory,
    #[serde(default)]
    pub cardio_history: CardioHistory,
    #[serde(default)]
    pub app_state: AppState,
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// Snapshot the tracker's full state into a bundle
pub fn export_bundle(tracker: &Tracker) -> Bundle {
    Bundle {
        version: BUNDLE_VERSION.to_string(),
        export_date: Utc::now(),
        profile: tracker.profile.clone(),
        settings: tracker.settings.clone(),
        history: tracker.history.clone(),
        cardio_history: tracker.cardio_history.clone(),
        app_state: tracker.app_state.clone(),
        meta: Some(tracker.meta.clone()),
    }
}

/// Replace the tracker's state with the bundle's and persist every slice.
/// Validation happens up front; a rejected bundle leaves the tracker
/// untouched.
pub fn import_bundle(tracker: &mut Tracker, contents: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| Error::Import(format!("not valid JSON: {}", e)))?;
    if !value.get("profile").map(|v| v.is_object()).unwrap_or(false) {
        return Err(Error::Import("bundle has no profile".into()));
    }
    if !value.get("settings").map(|v| v.is_object()).unwrap_or(false) {
        return Err(Error::Import("bundle has no settings".into()));
    }

    // History entries from older exports may lack the tag field
    let stored_history: persist::StoredHistory = value
        .get("history")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| Error::Import(format!("unreadable history: {}", e)))?
        .unwrap_or_default();

    let mut raw = value;
    if let Some(obj) = raw.as_object_mut() {
        obj.remove("history");
    }
    let bundle: Bundle = serde_json::from_value(raw)
        .map_err(|e| Error::Import(format!("malformed bundle: {}", e)))?;
    let history = persist::normalize_history(stored_history);

    tracker.profile = bundle.profile;
    tracker.settings = bundle.settings;
    tracker.history = history;
    tracker.cardio_history = bundle.cardio_history;
    tracker.app_state = bundle.app_state;
    tracker.meta = match bundle.meta {
        Some(meta) if meta.version == STORAGE_VERSION => meta,
        _ => persist::rebuild_meta(
            &tracker.history,
            &tracker.cardio_history,
            &tracker.app_state.rest_days,
        ),
    };

    // Imported data describes another point in time; today-only state from
    // before the import no longer applies
    tracker.active_session = None;
    tracker.draft_plan = None;
    tracker.dismissed_draft_date = None;

    tracker.persist_profile();
    tracker.persist_settings();
    tracker.persist_history();
    tracker.persist_cardio();
    tracker.persist_app_state();
    tracker.persist_meta();
    tracker.persist_active_session();
    tracker.persist_draft_plan();
    tracker.persist_dismissed();

    tracing::info!("Imported bundle dated {}", bundle.export_date);
    Ok(())
}

//! Static exercise, gym and plan reference data.
//!
//! Everything here is read-only lookup material keyed by exercise id.
//! Historical data may reference ids that were later removed from these
//! tables; consumers treat unknown ids as silent no-ops.

use crate::types::WorkoutType;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Tag names used across exercises and plan templates
pub const TAG_PUSH: &str = "Push";
pub const TAG_PULL: &str = "Pull";
pub const TAG_LEGS: &str = "Legs";
pub const TAG_UPPER: &str = "Upper";
pub const TAG_CORE: &str = "Core";
pub const TAG_FULL_BODY: &str = "Full Body";

/// Equipment class of an exercise
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquipmentClass {
    Machine,
    Dumbbell,
    Barbell,
}

/// One exercise definition
#[derive(Clone, Debug)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub class: EquipmentClass,
    pub target: String,
    pub tags: Vec<&'static str>,
    pub stack_cap: Option<u32>,
}

impl Exercise {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }
}

/// Equipment availability for a gym environment
#[derive(Clone, Debug)]
pub struct GymProfile {
    pub label: String,
    pub machines: bool,
    pub dumbbells: bool,
    pub barbells: bool,
    pub dumbbell_max: u32,
    pub machine_stack_cap: Option<u32>,
}

/// Exercise id lists making up one focus day's template
#[derive(Clone, Debug, Default)]
pub struct PlanTemplate {
    pub machines: Vec<&'static str>,
    pub dumbbells: Vec<&'static str>,
    pub barbells: Vec<&'static str>,
}

/// A loggable cardio activity
#[derive(Clone, Debug)]
pub struct CardioActivity {
    pub id: &'static str,
    pub label: &'static str,
}

/// One cardio type (running, swimming, ...)
#[derive(Clone, Debug)]
pub struct CardioType {
    pub name: String,
    pub activities: Vec<CardioActivity>,
}

/// The complete read-only reference catalog
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
    pub plans: HashMap<WorkoutType, PlanTemplate>,
    pub cardio_types: HashMap<String, CardioType>,
}

impl Catalog {
    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    /// Display name for an id, falling back to a generic label for ids no
    /// longer in the table
    pub fn exercise_name(&self, id: &str) -> String {
        self.exercises
            .get(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "Exercise".into())
    }

    pub fn plan_template(&self, focus: WorkoutType) -> Option<&PlanTemplate> {
        self.plans.get(&focus)
    }

    /// Exercise ids in a stable order
    pub fn exercise_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.exercises.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Validate internal consistency (plan templates must reference known ids)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (focus, plan) in &self.plans {
            for id in plan
                .machines
                .iter()
                .chain(plan.dumbbells.iter())
                .chain(plan.barbells.iter())
            {
                if !self.exercises.contains_key(*id) {
                    errors.push(format!("{:?} plan references unknown exercise {}", focus, id));
                }
            }
        }
        for (key, ex) in &self.exercises {
            if key != &ex.id {
                errors.push(format!("exercise key {} does not match id {}", key, ex.id));
            }
        }
        errors
    }
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Equipment availability per gym type
static GYM_PROFILES: Lazy<HashMap<crate::types::GymKind, GymProfile>> = Lazy::new(|| {
    use crate::types::GymKind;
    let mut gyms = HashMap::new();
    gyms.insert(
        GymKind::Planet,
        GymProfile {
            label: "Planet Fitness".into(),
            machines: true,
            dumbbells: true,
            barbells: true,
            dumbbell_max: 75,
            machine_stack_cap: Some(260),
        },
    );
    gyms.insert(
        GymKind::Commercial,
        GymProfile {
            label: "Commercial Gym".into(),
            machines: true,
            dumbbells: true,
            barbells: true,
            dumbbell_max: 120,
            machine_stack_cap: Some(300),
        },
    );
    gyms.insert(
        GymKind::Iron,
        GymProfile {
            label: "Powerlifting Gym".into(),
            machines: false,
            dumbbells: true,
            barbells: true,
            dumbbell_max: 150,
            machine_stack_cap: None,
        },
    );
    gyms.insert(
        GymKind::Home,
        GymProfile {
            label: "Home Gym".into(),
            machines: false,
            dumbbells: true,
            barbells: true,
            dumbbell_max: 100,
            machine_stack_cap: None,
        },
    );
    gyms
});

/// Look up the equipment profile for a gym type
pub fn gym_profile(kind: crate::types::GymKind) -> &'static GymProfile {
    // Table covers every GymKind variant
    &GYM_PROFILES[&kind]
}

fn exercise(
    id: &str,
    name: &str,
    class: EquipmentClass,
    target: &str,
    tags: Vec<&'static str>,
    stack_cap: Option<u32>,
) -> (String, Exercise) {
    (
        id.to_string(),
        Exercise {
            id: id.to_string(),
            name: name.to_string(),
            class,
            target: target.to_string(),
            tags,
            stack_cap,
        },
    )
}

/// Builds the default catalog with built-in exercises and plan templates
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    use EquipmentClass::*;

    let exercises: HashMap<String, Exercise> = [
        // Machines
        exercise("chest_press", "Chest Press", Machine, "Chest", vec![TAG_PUSH, TAG_UPPER, TAG_FULL_BODY], Some(260)),
        exercise("pec_fly", "Pec Fly", Machine, "Chest", vec![TAG_PUSH, TAG_UPPER], Some(200)),
        exercise("shoulder_press", "Shoulder Press", Machine, "Shoulders", vec![TAG_PUSH, TAG_UPPER, TAG_FULL_BODY], Some(200)),
        exercise("cable_tricep", "Cable Tricep Push", Machine, "Triceps", vec![TAG_PUSH, TAG_UPPER], Some(70)),
        exercise("lat_pulldown", "Lat Pulldown", Machine, "Back", vec![TAG_PULL, TAG_UPPER, TAG_FULL_BODY], Some(250)),
        exercise("seated_row", "Seated Row", Machine, "Back", vec![TAG_PULL, TAG_UPPER], Some(250)),
        exercise("cable_bicep", "Cable Bicep Curl", Machine, "Biceps", vec![TAG_PULL, TAG_UPPER], Some(70)),
        exercise("leg_press", "Leg Press", Machine, "Quads", vec![TAG_PUSH, TAG_LEGS, TAG_FULL_BODY], Some(400)),
        exercise("leg_extension", "Leg Extension", Machine, "Quads", vec![TAG_PUSH, TAG_LEGS], Some(200)),
        exercise("leg_curl", "Leg Curl", Machine, "Hamstrings", vec![TAG_PULL, TAG_LEGS], Some(200)),
        exercise("back_extension", "Back Extension", Machine, "Lower Back", vec![TAG_PULL, TAG_LEGS, TAG_CORE], Some(200)),
        exercise("ab_crunch", "Ab Crunch Machine", Machine, "Core", vec![TAG_CORE, TAG_FULL_BODY], Some(150)),
        exercise("hip_abduction", "Hip Abduction", Machine, "Glutes", vec![TAG_PUSH, TAG_LEGS], Some(200)),
        exercise("calf_raise", "Calf Raise", Machine, "Calves", vec![TAG_PUSH, TAG_LEGS], Some(300)),
        exercise("preacher_curl", "Preacher Curl", Machine, "Biceps", vec![TAG_PULL, TAG_UPPER], Some(100)),
        // Dumbbells
        exercise("db_bench_press", "Dumbbell Bench Press", Dumbbell, "Chest", vec![TAG_PUSH, TAG_UPPER], None),
        exercise("db_row", "Dumbbell Row", Dumbbell, "Back", vec![TAG_PULL, TAG_UPPER], None),
        exercise("db_shoulder_press", "Dumbbell Shoulder Press", Dumbbell, "Shoulders", vec![TAG_PUSH, TAG_UPPER], None),
        exercise("db_goblet_squat", "Goblet Squat", Dumbbell, "Quads", vec![TAG_PUSH, TAG_LEGS], None),
        exercise("db_lunge", "Dumbbell Lunge", Dumbbell, "Quads", vec![TAG_PUSH, TAG_LEGS], None),
        exercise("db_curl", "Dumbbell Curl", Dumbbell, "Biceps", vec![TAG_PULL, TAG_UPPER], None),
        exercise("db_lateral_raise", "Lateral Raise", Dumbbell, "Shoulders", vec![TAG_PUSH, TAG_UPPER], None),
        exercise("db_rdl", "Dumbbell RDL", Dumbbell, "Hamstrings", vec![TAG_PULL, TAG_LEGS], None),
        exercise("db_hammer_curl", "Hammer Curl", Dumbbell, "Biceps", vec![TAG_PULL, TAG_UPPER], None),
        // Barbells
        exercise("bb_squat", "Barbell Squat", Barbell, "Quads", vec![TAG_PUSH, TAG_LEGS], None),
        exercise("bb_bench", "Barbell Bench Press", Barbell, "Chest", vec![TAG_PUSH, TAG_UPPER], None),
        exercise("bb_deadlift", "Barbell Deadlift", Barbell, "Posterior Chain", vec![TAG_PULL, TAG_LEGS], None),
        exercise("bb_row", "Barbell Row", Barbell, "Back", vec![TAG_PULL, TAG_UPPER], None),
        exercise("bb_overhead_press", "Overhead Press", Barbell, "Shoulders", vec![TAG_PUSH, TAG_UPPER], None),
        exercise("bb_rdl", "Barbell RDL", Barbell, "Hamstrings", vec![TAG_PULL, TAG_LEGS], None),
        exercise("bb_front_squat", "Front Squat", Barbell, "Quads", vec![TAG_PUSH, TAG_LEGS], None),
        exercise("bb_incline_bench", "Incline Bench Press", Barbell, "Chest", vec![TAG_PUSH, TAG_UPPER], None),
        exercise("bb_curl", "Barbell Curl", Barbell, "Biceps", vec![TAG_PULL, TAG_UPPER], None),
    ]
    .into_iter()
    .collect();

    let mut plans = HashMap::new();
    plans.insert(
        WorkoutType::Push,
        PlanTemplate {
            machines: vec!["chest_press", "shoulder_press", "pec_fly", "cable_tricep"],
            dumbbells: vec!["db_bench_press", "db_shoulder_press"],
            barbells: vec!["bb_bench", "bb_overhead_press"],
        },
    );
    plans.insert(
        WorkoutType::Pull,
        PlanTemplate {
            machines: vec!["lat_pulldown", "seated_row", "cable_bicep", "ab_crunch"],
            dumbbells: vec!["db_row", "db_curl"],
            barbells: vec!["bb_deadlift", "bb_row"],
        },
    );
    plans.insert(
        WorkoutType::Legs,
        PlanTemplate {
            machines: vec!["leg_press", "leg_extension", "leg_curl", "ab_crunch"],
            dumbbells: vec!["db_goblet_squat", "db_lunge"],
            barbells: vec!["bb_squat"],
        },
    );

    let mut cardio_types = HashMap::new();
    cardio_types.insert(
        "running".to_string(),
        CardioType {
            name: "Running".into(),
            activities: vec![
                CardioActivity { id: "treadmill", label: "Treadmill" },
                CardioActivity { id: "outdoor", label: "Outdoor Run" },
                CardioActivity { id: "walk", label: "Walking" },
                CardioActivity { id: "hiit", label: "HIIT/Intervals" },
                CardioActivity { id: "cooldown", label: "Cool Down Walk" },
            ],
        },
    );
    cardio_types.insert(
        "swimming".to_string(),
        CardioType {
            name: "Swimming".into(),
            activities: vec![
                CardioActivity { id: "laps", label: "Swimming Laps" },
                CardioActivity { id: "water_walk", label: "Water Walking" },
                CardioActivity { id: "water_aerobics", label: "Water Aerobics" },
                CardioActivity { id: "treading", label: "Treading Water" },
                CardioActivity { id: "casual", label: "Casual Swim" },
            ],
        },
    );

    Catalog {
        exercises,
        plans,
        cardio_types,
    }
}

// ABOUTME: Domain model root — job, profile snapshot, plan, and checkpoint types
// ABOUTME: Mirrors spec.md §3's data model verbatim, serde-friendly for storage round-trips

pub mod checkpoint;
pub mod job;
pub mod plan;
pub mod profile;

pub use checkpoint::Checkpoint;
pub use job::{Job, JobStatus, RedoContext, RedoScope};
pub use plan::{
    BaseNutrition, DayNutrition, DayRecovery, DayWorkout, FinalPlanRecord, MealTemplate,
    SupplementCard, Weekday, WorkoutSplit,
};
pub use profile::{ActivityLevel, DietaryPreference, Goal, ProfileSnapshot, Sex};

/// The seven weekday keys every plan-shaped map must carry, in canonical order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

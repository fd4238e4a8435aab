//! Weekly routines: validation of submitted time blocks and aggregation into
//! per-weekday availability.

pub mod availability;
pub mod validate;

pub use availability::{DailyTotal, WeeklyAvailability, describe_day_blocks};
pub use validate::{RoutineError, TimeBlockInput, TimeBlockSpec, parse_clock, validate_routine};

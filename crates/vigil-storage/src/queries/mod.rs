//! Query modules, one per table. Every function takes a plain `&Connection`.

pub mod history;
pub mod rule_checks;
pub mod rule_schedules;
pub mod violations;

pub mod analyze;
pub mod calendar;
pub mod config;
pub mod load;
pub mod rituals;

pub mod duration_record;
pub mod event_record;
pub mod report;

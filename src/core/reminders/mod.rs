pub mod reminder_service;

pub use reminder_service::{ReminderError, ReminderSchedule, ReminderService, ReminderSink};

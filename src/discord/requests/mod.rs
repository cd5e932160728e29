// Discord side of the request flow: rendering, the serenity-backed ports,
// and claim button routing.

pub mod board;
pub mod claim_handler;
pub mod render;

pub use board::{SerenityBoard, SerenityReminderSink};

pub mod request_board;
pub mod request_models;
pub mod request_service;
pub mod request_store;

pub use request_board::{BoardError, RequestBoard};
pub use request_models::{
    ClaimOutcome, ClaimState, ClaimTransition, Claimant, MessageRef, NoticeTarget,
    Request, Submission, COMPLETION_WINDOW_HOURS,
};
pub use request_service::{RequestError, RequestService, RequestSettings};
pub use request_store::{RequestStore, StoreError};

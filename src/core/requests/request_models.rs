// Request domain models - the only stateful piece of the bot.
//
// These are pure domain types with no Discord dependencies. Ids are plain
// u64 values; the Discord layer converts them to serenity ids at the edge.

use chrono::{DateTime, Duration, Utc};

/// Thread titles are capped at this many characters (including the ellipsis).
pub const THREAD_TITLE_MAX_CHARS: usize = 40;

/// How long a claimer has to finish a request. Informational only.
pub const COMPLETION_WINDOW_HOURS: i64 = 48;

/// Where a message lives on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// Claim state of a request. Starts `Unclaimed` and moves to `Claimed` once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    Unclaimed,
    Claimed { by: u64, at: DateTime<Utc> },
}

impl ClaimState {
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimState::Claimed { .. })
    }

    /// Whether the claim button should be rendered as clickable.
    pub fn control_enabled(&self) -> bool {
        !self.is_claimed()
    }
}

/// A submitted request, before it has been announced.
#[derive(Debug, Clone)]
pub struct Submission {
    pub guild_id: u64,
    pub requester_id: u64,
    pub text: String,
}

/// A request that has been announced and is tracked by the registry.
#[derive(Debug, Clone)]
pub struct Request {
    pub text: String,
    pub requester_id: u64,
    pub guild_id: u64,
    pub announcement: MessageRef,
    /// Companion thread, if creating it succeeded.
    pub thread_id: Option<u64>,
    pub claim: ClaimState,
    pub created_at: DateTime<Utc>,
}

impl Request {
    /// When the claimer is expected to be done. `None` while unclaimed.
    pub fn completion_due(&self) -> Option<DateTime<Utc>> {
        match self.claim {
            ClaimState::Claimed { at, .. } => Some(at + Duration::hours(COMPLETION_WINDOW_HOURS)),
            ClaimState::Unclaimed => None,
        }
    }

    /// The claim confirmation goes into the thread when there is one,
    /// otherwise it replies to the announcement itself.
    pub fn notice_target(&self) -> NoticeTarget {
        match self.thread_id {
            Some(thread_id) => NoticeTarget::Thread(thread_id),
            None => NoticeTarget::Reply(self.announcement),
        }
    }
}

/// Destination of a claim confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTarget {
    Thread(u64),
    Reply(MessageRef),
}

/// Who is trying to claim, and which roles they hold in the guild.
#[derive(Debug, Clone)]
pub struct Claimant {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
}

/// Result of a claim attempt.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// This attempt won the transition. Carries the updated request.
    Claimed(Request),
    /// The actor lacks the authorized role. Nothing changed.
    Unauthorized,
    /// Someone else won first.
    AlreadyClaimed { by: u64 },
    /// No request is registered for this message.
    NotTracked,
}

/// Outcome of the compare-and-set inside the registry.
#[derive(Debug, Clone)]
pub enum ClaimTransition {
    Won(Request),
    Lost { by: u64 },
    Missing,
}

/// Truncate request text for use as a thread title.
///
/// Text longer than 40 characters becomes its first 37 characters followed
/// by `...`. Counts chars, not bytes, so multi-byte text never splits.
pub fn thread_title(text: &str) -> String {
    if text.chars().count() > THREAD_TITLE_MAX_CHARS {
        let head: String = text.chars().take(THREAD_TITLE_MAX_CHARS - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

// This is the request lifecycle - submit, claim, expire.
// Like the other core services it has NO Discord-specific code. The platform
// is reached through the `RequestBoard` port and requests are tracked through
// the `RequestStore` port, so both can be swapped out in tests.

use super::request_board::{BoardError, RequestBoard};
use super::request_models::{
    thread_title, ClaimOutcome, ClaimState, ClaimTransition, Claimant, Request, Submission,
};
use super::request_store::{RequestStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request channel {0} not found")]
    ChannelNotFound(u64),
    #[error("Board error: {0}")]
    Board(#[from] BoardError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Static settings for the request flow, taken from the bot configuration.
#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub channel_id: u64,
    pub authorized_role_id: u64,
    pub media_url: Option<String>,
    /// Requests older than this are dropped by the idle sweep.
    pub retention: Duration,
}

pub struct RequestService<B: RequestBoard, S: RequestStore> {
    board: B,
    store: S,
    settings: RequestSettings,
}

impl<B: RequestBoard, S: RequestStore> RequestService<B, S> {
    pub fn new(board: B, store: S, settings: RequestSettings) -> Self {
        Self {
            board,
            store,
            settings,
        }
    }

    /// Precondition for `submit`: the request channel must resolve in this guild.
    pub async fn ensure_request_channel(&self, guild_id: u64) -> Result<(), RequestError> {
        let channel_id = self.settings.channel_id;
        if self.board.channel_in_guild(guild_id, channel_id).await? {
            Ok(())
        } else {
            Err(RequestError::ChannelNotFound(channel_id))
        }
    }

    /// Announce a request and start tracking it.
    ///
    /// The media post and the thread are best-effort; only the announcement
    /// itself can fail the submission.
    pub async fn submit(&self, submission: Submission) -> Result<Request, RequestError> {
        let channel_id = self.settings.channel_id;

        if let Some(url) = &self.settings.media_url {
            if let Err(e) = self.board.post_media(channel_id, url).await {
                tracing::warn!(channel_id, error = %e, "Failed to post request media");
            }
        }

        let announcement = self.board.post_announcement(channel_id, &submission).await?;

        // The claim button is live as soon as the announcement exists, so the
        // request is tracked before anything else is awaited.
        let mut request = Request {
            text: submission.text,
            requester_id: submission.requester_id,
            guild_id: submission.guild_id,
            announcement,
            thread_id: None,
            claim: ClaimState::Unclaimed,
            created_at: Utc::now(),
        };
        self.store.insert(request.clone()).await?;

        let title = format!("request: {}", thread_title(&request.text));
        match self.board.open_thread(announcement, &title).await {
            Ok(thread_id) => {
                self.store
                    .set_thread(announcement.message_id, thread_id)
                    .await?;
                request.thread_id = Some(thread_id);
            }
            Err(e) => {
                tracing::error!(
                    message_id = announcement.message_id,
                    error = %e,
                    "Thread creation failed"
                );
            }
        }

        tracing::info!(
            guild_id = request.guild_id,
            requester_id = request.requester_id,
            message_id = announcement.message_id,
            has_thread = request.thread_id.is_some(),
            "Request posted"
        );

        Ok(request)
    }

    /// Attempt to claim the request announced in `message_id`.
    ///
    /// An untracked message wins over a missing role, and neither changes
    /// state. The state change itself is a single compare-and-set in the
    /// store, so only one caller can ever see `ClaimOutcome::Claimed` for a
    /// given request.
    pub async fn claim(
        &self,
        message_id: u64,
        claimant: &Claimant,
    ) -> Result<ClaimOutcome, RequestError> {
        if self.store.get(message_id).await?.is_none() {
            return Ok(ClaimOutcome::NotTracked);
        }

        if !claimant
            .role_ids
            .contains(&self.settings.authorized_role_id)
        {
            return Ok(ClaimOutcome::Unauthorized);
        }

        let outcome = match self
            .store
            .try_claim(message_id, claimant.user_id, Utc::now())
            .await?
        {
            ClaimTransition::Won(request) => {
                tracing::info!(
                    message_id,
                    claimer_id = claimant.user_id,
                    "Request claimed"
                );
                ClaimOutcome::Claimed(request)
            }
            ClaimTransition::Lost { by } => ClaimOutcome::AlreadyClaimed { by },
            ClaimTransition::Missing => ClaimOutcome::NotTracked,
        };

        Ok(outcome)
    }

    /// Platform side of a won claim: disable the control, then announce the claimer.
    pub async fn complete_claim(&self, request: &Request) -> Result<(), RequestError> {
        self.board.render_claim_control(request).await?;
        self.board
            .post_claim_notice(request.notice_target(), request)
            .await?;
        Ok(())
    }

    /// Drop requests that have outlived the retention window.
    pub async fn expire_idle(&self, now: DateTime<Utc>) -> Result<usize, RequestError> {
        // A retention reaching past the start of representable time keeps everything
        let Some(cutoff) = now.checked_sub_signed(self.settings.retention) else {
            return Ok(0);
        };
        Ok(self.store.remove_created_before(cutoff).await?)
    }
}

impl<B, S> RequestService<B, S>
where
    B: RequestBoard + 'static,
    S: RequestStore + 'static,
{
    /// Periodically expire idle requests until `shutdown` is cancelled.
    pub fn spawn_idle_sweep(
        self: Arc<Self>,
        period: std::time::Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let start = tokio::time::Instant::now() + period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        match self.expire_idle(Utc::now()).await {
                            Ok(0) => {}
                            Ok(removed) => tracing::info!(removed, "Expired idle requests"),
                            Err(e) => tracing::warn!("Idle request sweep failed: {}", e),
                        }
                    }
                }
            }

            tracing::debug!("Idle request sweep stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::requests::{MessageRef, NoticeTarget};
    use crate::infra::requests::InMemoryRequestStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const GUILD: u64 = 1;
    const CHANNEL: u64 = 100;
    const ROLE: u64 = 7;

    #[derive(Debug, Clone, PartialEq)]
    enum BoardCall {
        Media,
        Announcement(String),
        Thread(String),
        RenderControl { enabled: bool },
        Notice(NoticeTarget),
    }

    #[derive(Default)]
    struct MockBoard {
        calls: Arc<Mutex<Vec<BoardCall>>>,
        next_id: AtomicU64,
        missing_channel: bool,
        fail_thread: bool,
        fail_announcement: bool,
        thread_gate: Option<ThreadGate>,
    }

    /// Holds `open_thread` open until released, like a slow HTTP call.
    struct ThreadGate {
        reached: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl MockBoard {
        fn record(&self, call: BoardCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl RequestBoard for MockBoard {
        async fn channel_in_guild(&self, _: u64, _: u64) -> Result<bool, BoardError> {
            Ok(!self.missing_channel)
        }

        async fn post_media(&self, _: u64, _: &str) -> Result<(), BoardError> {
            self.record(BoardCall::Media);
            Ok(())
        }

        async fn post_announcement(
            &self,
            channel_id: u64,
            submission: &Submission,
        ) -> Result<MessageRef, BoardError> {
            if self.fail_announcement {
                return Err(BoardError::Platform("send failed".to_string()));
            }
            self.record(BoardCall::Announcement(submission.text.clone()));
            Ok(MessageRef {
                channel_id,
                message_id: 1000 + self.next_id.fetch_add(1, Ordering::SeqCst),
            })
        }

        async fn open_thread(&self, _: MessageRef, title: &str) -> Result<u64, BoardError> {
            if let Some(gate) = &self.thread_gate {
                gate.reached.notify_one();
                gate.release.notified().await;
            }
            if self.fail_thread {
                return Err(BoardError::Platform("missing permissions".to_string()));
            }
            self.record(BoardCall::Thread(title.to_string()));
            Ok(5000)
        }

        async fn render_claim_control(&self, request: &Request) -> Result<(), BoardError> {
            // Yield so concurrent claims interleave at the same point a real
            // HTTP call would.
            tokio::task::yield_now().await;
            self.record(BoardCall::RenderControl {
                enabled: request.claim.control_enabled(),
            });
            Ok(())
        }

        async fn post_claim_notice(
            &self,
            target: NoticeTarget,
            _: &Request,
        ) -> Result<(), BoardError> {
            self.record(BoardCall::Notice(target));
            Ok(())
        }
    }

    fn settings() -> RequestSettings {
        RequestSettings {
            channel_id: CHANNEL,
            authorized_role_id: ROLE,
            media_url: Some("https://example.com/banner.gif".to_string()),
            retention: Duration::hours(168),
        }
    }

    fn service(board: MockBoard) -> RequestService<MockBoard, InMemoryRequestStore> {
        RequestService::new(board, InMemoryRequestStore::new(), settings())
    }

    fn submission(text: &str) -> Submission {
        Submission {
            guild_id: GUILD,
            requester_id: 42,
            text: text.to_string(),
        }
    }

    fn uploader(user_id: u64) -> Claimant {
        Claimant {
            user_id,
            role_ids: vec![3, ROLE],
        }
    }

    fn outsider(user_id: u64) -> Claimant {
        Claimant {
            user_id,
            role_ids: vec![3],
        }
    }

    #[tokio::test]
    async fn test_submit_posts_media_announcement_and_thread_in_order() {
        let board = MockBoard::default();
        let calls = Arc::clone(&board.calls);
        let service = service(board);

        let request = service.submit(submission("new album art")).await.unwrap();

        assert_eq!(request.text, "new album art");
        assert_eq!(request.requester_id, 42);
        assert_eq!(request.thread_id, Some(5000));
        assert_eq!(request.claim, ClaimState::Unclaimed);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                BoardCall::Media,
                BoardCall::Announcement("new album art".to_string()),
                BoardCall::Thread("request: new album art".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_long_text_thread_title_is_truncated() {
        let board = MockBoard::default();
        let calls = Arc::clone(&board.calls);
        let service = service(board);
        let text = "please upload the whole discography of this band in flac";

        service.submit(submission(text)).await.unwrap();

        let expected = format!("request: {}...", &text[..37]);
        assert!(calls
            .lock()
            .unwrap()
            .contains(&BoardCall::Thread(expected)));
    }

    #[tokio::test]
    async fn test_missing_channel_is_rejected_without_side_effects() {
        let board = MockBoard {
            missing_channel: true,
            ..Default::default()
        };
        let calls = Arc::clone(&board.calls);
        let service = service(board);

        let result = service.ensure_request_channel(GUILD).await;

        assert!(matches!(result, Err(RequestError::ChannelNotFound(CHANNEL))));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_announcement_registers_nothing() {
        let board = MockBoard {
            fail_announcement: true,
            ..Default::default()
        };
        let service = service(board);

        let result = service.submit(submission("anything")).await;
        assert!(matches!(result, Err(RequestError::Board(_))));

        let outcome = service.claim(1000, &uploader(9)).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::NotTracked));
    }

    #[tokio::test]
    async fn test_click_while_thread_is_opening_finds_the_request() {
        let reached = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let board = MockBoard {
            thread_gate: Some(ThreadGate {
                reached: Arc::clone(&reached),
                release: Arc::clone(&release),
            }),
            ..Default::default()
        };
        let service = Arc::new(service(board));

        let submit = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.submit(submission("early bird")).await.unwrap() }
        });

        // Announcement is out, thread creation still in flight
        reached.notified().await;

        let outcome = service.claim(1000, &outsider(8)).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::Unauthorized));

        let ClaimOutcome::Claimed(claimed) = service.claim(1000, &uploader(9)).await.unwrap()
        else {
            panic!("an early click should claim the request");
        };
        assert!(claimed.thread_id.is_none());

        release.notify_one();
        let request = submit.await.unwrap();
        assert_eq!(request.thread_id, Some(5000));

        // The thread is recorded without undoing the claim
        let stored = service.store.get(1000).await.unwrap().unwrap();
        assert_eq!(stored.thread_id, Some(5000));
        assert!(matches!(stored.claim, ClaimState::Claimed { by: 9, .. }));
    }

    #[tokio::test]
    async fn test_untracked_message_is_reported_before_missing_role() {
        let service = service(MockBoard::default());

        let outcome = service.claim(424242, &outsider(8)).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::NotTracked));
    }

    #[tokio::test]
    async fn test_unauthorized_claims_never_change_state() {
        let service = service(MockBoard::default());
        let request = service.submit(submission("icon pack")).await.unwrap();
        let message_id = request.announcement.message_id;

        for attempt in 0..5 {
            let outcome = service.claim(message_id, &outsider(attempt)).await.unwrap();
            assert!(matches!(outcome, ClaimOutcome::Unauthorized));
        }

        // Still claimable by an uploader afterwards
        let outcome = service.claim(message_id, &uploader(9)).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::Claimed(_)));
    }

    #[tokio::test]
    async fn test_claim_is_terminal() {
        let service = service(MockBoard::default());
        let request = service.submit(submission("banner")).await.unwrap();
        let message_id = request.announcement.message_id;

        let first = service.claim(message_id, &uploader(9)).await.unwrap();
        let claimed = match first {
            ClaimOutcome::Claimed(request) => request,
            other => panic!("expected a claim, got {:?}", other),
        };
        assert!(matches!(claimed.claim, ClaimState::Claimed { by: 9, .. }));
        assert!(claimed.completion_due().is_some());

        for claimer in [9, 10, 11] {
            let outcome = service.claim(message_id, &uploader(claimer)).await.unwrap();
            assert!(matches!(outcome, ClaimOutcome::AlreadyClaimed { by: 9 }));
        }
    }

    #[tokio::test]
    async fn test_complete_claim_disables_control_and_notifies_thread() {
        let board = MockBoard::default();
        let calls = Arc::clone(&board.calls);
        let service = service(board);
        let request = service.submit(submission("wallpaper")).await.unwrap();

        let ClaimOutcome::Claimed(claimed) = service
            .claim(request.announcement.message_id, &uploader(9))
            .await
            .unwrap()
        else {
            panic!("claim should succeed");
        };
        service.complete_claim(&claimed).await.unwrap();

        let calls = calls.lock().unwrap();
        assert!(calls.contains(&BoardCall::RenderControl { enabled: false }));
        assert_eq!(calls.last(), Some(&BoardCall::Notice(NoticeTarget::Thread(5000))));
    }

    #[tokio::test]
    async fn test_notice_replies_to_announcement_when_thread_failed() {
        let board = MockBoard {
            fail_thread: true,
            ..Default::default()
        };
        let calls = Arc::clone(&board.calls);
        let service = service(board);

        let request = service.submit(submission("wallpaper")).await.unwrap();
        assert!(request.thread_id.is_none());

        let ClaimOutcome::Claimed(claimed) = service
            .claim(request.announcement.message_id, &uploader(9))
            .await
            .unwrap()
        else {
            panic!("claim should succeed");
        };
        service.complete_claim(&claimed).await.unwrap();

        assert_eq!(
            calls.lock().unwrap().last(),
            Some(&BoardCall::Notice(NoticeTarget::Reply(request.announcement)))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_post_exactly_one_notice() {
        let board = MockBoard::default();
        let calls = Arc::clone(&board.calls);
        let service = Arc::new(service(board));
        let request = service.submit(submission("race me")).await.unwrap();
        let message_id = request.announcement.message_id;

        let mut handles = Vec::new();
        for claimer in 0..16 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                if let ClaimOutcome::Claimed(request) =
                    service.claim(message_id, &uploader(claimer)).await.unwrap()
                {
                    service.complete_claim(&request).await.unwrap();
                    true
                } else {
                    false
                }
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        let notices = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, BoardCall::Notice(_)))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(notices, 1);
    }

    #[tokio::test]
    async fn test_expire_idle_respects_retention() {
        let service = service(MockBoard::default());
        let request = service.submit(submission("old one")).await.unwrap();

        // Nothing is old enough yet
        assert_eq!(service.expire_idle(Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + Duration::hours(169);
        assert_eq!(service.expire_idle(later).await.unwrap(), 1);

        let outcome = service
            .claim(request.announcement.message_id, &uploader(9))
            .await
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::NotTracked));
    }

    #[tokio::test]
    async fn test_expire_idle_with_huge_retention_keeps_everything() {
        let mut settings = settings();
        settings.retention = Duration::try_hours(10_000_000_000).unwrap();
        let service = RequestService::new(MockBoard::default(), InMemoryRequestStore::new(), settings);
        service.submit(submission("keep me")).await.unwrap();

        assert_eq!(service.expire_idle(Utc::now()).await.unwrap(), 0);
        assert!(service.store.get(1000).await.unwrap().is_some());
    }
}

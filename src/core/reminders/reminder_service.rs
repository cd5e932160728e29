// Periodic reminder - posts one fixed message to one channel, forever.
//
// There is deliberately no backoff, jitter or in-flight guard: every tick
// sends, and missed ticks are caught up in a burst.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("Reminder channel {0} not found")]
    ChannelNotFound(u64),
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Where reminders are delivered.
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn post_reminder(&self, channel_id: u64, content: &str) -> Result<(), ReminderError>;
}

#[derive(Debug, Clone)]
pub struct ReminderSchedule {
    pub channel_id: u64,
    pub message: String,
    pub period: Duration,
}

pub struct ReminderService<S: ReminderSink> {
    sink: S,
    schedule: ReminderSchedule,
}

impl<S: ReminderSink> ReminderService<S> {
    pub fn new(sink: S, schedule: ReminderSchedule) -> Self {
        Self { sink, schedule }
    }

    /// Send one reminder. Failures are logged and swallowed so the next tick
    /// still fires.
    pub async fn tick(&self) {
        let channel_id = self.schedule.channel_id;
        match self.sink.post_reminder(channel_id, &self.schedule.message).await {
            Ok(()) => tracing::debug!(channel_id, "Reminder sent"),
            Err(ReminderError::ChannelNotFound(_)) => {
                tracing::warn!(channel_id, "Reminder channel not found")
            }
            Err(e) => tracing::error!(channel_id, error = %e, "Failed to send reminder"),
        }
    }

    /// Tick every period, first at `start`, until `shutdown` fires.
    pub async fn run(&self, start: Instant, shutdown: CancellationToken) {
        let period = self.schedule.period;
        let mut ticker = interval_at(start, period);

        tracing::info!(
            channel_id = self.schedule.channel_id,
            period_secs = period.as_secs(),
            "Reminder timer started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        tracing::info!("Reminder timer stopped");
    }
}

impl<S: ReminderSink + 'static> ReminderService<S> {
    /// The first tick is one period after this call, not after the task's
    /// first poll.
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let start = Instant::now() + self.schedule.period;
        tokio::spawn(async move { self.run(start, shutdown).await })
    }
}

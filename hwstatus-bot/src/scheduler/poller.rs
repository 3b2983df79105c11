//! Status poller
//!
//! Polls the status source on a fixed interval and forwards review verdicts
//! to the notifier. The poller owns the watermark: it only moves forward
//! after a cycle was fully processed, so a failed cycle is retried
//! wholesale on the next poll.

use hwstatus_core::{Error, ResponseValidator, Result, VerdictMapper, VerdictText, Watermark};
use std::sync::Arc;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::repository::{Notifier, StatusSource};

/// Result of a single poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Messages were delivered and the watermark moved to `cursor`
    Delivered { sent: usize, cursor: Watermark },
    /// The source reported nothing new; the watermark moved to `cursor`
    NoUpdates { cursor: Watermark },
    /// The cycle stopped early; the watermark did not move
    Failed(Error),
}

/// Successful end of a cycle, before the watermark is updated
enum Progress {
    Delivered { sent: usize, cursor: Watermark },
    NoUpdates { cursor: Watermark },
}

/// Poller that tracks one submission and reports its status changes
pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    fan_out: bool,
    watermark: Watermark,
}

impl StatusPoller {
    /// Creates a new status poller starting from the current time
    pub fn new(
        config: &Config,
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            notifier,
            poll_interval: config.poll_interval,
            fan_out: config.fan_out,
            watermark: Watermark::now(),
        }
    }

    /// Overrides the starting watermark
    pub fn with_watermark(mut self, watermark: Watermark) -> Self {
        self.watermark = watermark;
        self
    }

    /// Point up to which updates have been consumed
    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    /// Starts the polling loop
    ///
    /// Runs until `shutdown` is cancelled. A cycle in progress always runs
    /// to completion; only the pause between cycles is interrupted.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            interval = ?self.poll_interval,
            watermark = %self.watermark,
            fan_out = self.fan_out,
            "Starting status poller"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(watermark = %self.watermark, "Shutdown requested, stopping status poller");
                    break;
                }
                _ = time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Performs a single poll cycle and updates the watermark
    ///
    /// Every error is caught here; none escapes the cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        debug!(watermark = %self.watermark, "Polling for status changes");

        match self.poll_once().await {
            Ok(Progress::Delivered { sent, cursor }) => {
                info!(sent, cursor = %cursor, "Status update delivered");
                self.watermark = cursor;
                CycleOutcome::Delivered { sent, cursor }
            }
            Ok(Progress::NoUpdates { cursor }) => {
                info!(cursor = %cursor, "No updates found");
                self.watermark = cursor;
                CycleOutcome::NoUpdates { cursor }
            }
            Err(e) => {
                error!(
                    kind = e.kind(),
                    recoverable = e.is_recoverable(),
                    watermark = %self.watermark,
                    "Poll cycle failed: {}",
                    e
                );
                CycleOutcome::Failed(e)
            }
        }
    }

    /// Fetch, validate, render and deliver without touching the watermark
    async fn poll_once(&self) -> Result<Progress> {
        let raw = self.source.fetch(self.watermark).await?;
        let reply = ResponseValidator::validate(raw)?;

        if reply.records.is_empty() {
            return Ok(Progress::NoUpdates {
                cursor: reply.cursor,
            });
        }

        let messages = if self.fan_out {
            reply
                .records
                .iter()
                .map(VerdictMapper::render)
                .collect::<Result<Vec<_>>>()?
        } else {
            if reply.records.len() > 1 {
                debug!(
                    skipped = reply.records.len() - 1,
                    "Only the first record is reported"
                );
            }
            vec![VerdictMapper::render(&reply.records[0])?]
        };

        let sent = self.deliver(&messages).await?;

        Ok(Progress::Delivered {
            sent,
            cursor: reply.cursor,
        })
    }

    async fn deliver(&self, messages: &[VerdictText]) -> Result<usize> {
        for message in messages {
            info!("Sending status message");
            self.notifier.send(message.as_str()).await?;
            debug!("Status message sent");
        }

        Ok(messages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const APPROVED: &str = "Работа проверена: ревьюеру всё понравилось. Ура!";

    /// Status source replaying a fixed script of replies
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Value>>>,
        requested: Mutex<Vec<Watermark>>,
    }

    impl ScriptedSource {
        fn with(replies: Vec<Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<Watermark> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self, since: Watermark) -> Result<Value> {
            self.requested.lock().unwrap().push(since);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": [], "current_date": since.as_unix()})))
        }
    }

    /// Notifier recording messages, failing the first `failures` sends
    struct RecordingNotifier {
        failures: Mutex<usize>,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn failing(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures: Mutex::new(failures),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::DeliveryFailed("connection reset".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn build_poller(
        source: Arc<ScriptedSource>,
        notifier: Arc<RecordingNotifier>,
        fan_out: bool,
    ) -> StatusPoller {
        let config = Config::new("p".into(), "t".into(), "42".into()).with_fan_out(fan_out);
        StatusPoller::new(&config, source, notifier).with_watermark(Watermark::from_unix(500))
    }

    #[tokio::test]
    async fn test_known_status_is_delivered_and_watermark_advances() {
        let source = ScriptedSource::with(vec![Ok(json!({
            "homeworks": [{"homework_name": "hw1", "status": "approved"}],
            "current_date": 1000
        }))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source.clone(), notifier.clone(), false);

        let outcome = poller.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered {
                sent: 1,
                cursor: Watermark::from_unix(1000)
            }
        );
        assert_eq!(poller.watermark(), Watermark::from_unix(1000));
        assert_eq!(source.requested(), vec![Watermark::from_unix(500)]);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("hw1"));
        assert!(sent[0].ends_with(APPROVED));
    }

    #[tokio::test]
    async fn test_empty_records_advance_watermark_without_sending() {
        let source = ScriptedSource::with(vec![Ok(json!({"homeworks": [], "current_date": 2000}))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source, notifier.clone(), false);

        let outcome = poller.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::NoUpdates {
                cursor: Watermark::from_unix(2000)
            }
        );
        assert_eq!(poller.watermark(), Watermark::from_unix(2000));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_freezes_watermark() {
        let source = ScriptedSource::with(vec![Ok(json!({
            "homeworks": [{"homework_name": "hw2", "status": "unknown"}],
            "current_date": 3000
        }))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source, notifier.clone(), false);

        let outcome = poller.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Failed(Error::UnknownStatus("unknown".to_string()))
        );
        assert_eq!(poller.watermark(), Watermark::from_unix(500));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_replies_freeze_watermark() {
        let malformed = vec![
            json!({"current_date": 1000}),
            json!({"homeworks": "hw1", "current_date": 1000}),
            json!([{"homework_name": "hw1", "status": "approved"}]),
        ];

        for raw in malformed {
            let source = ScriptedSource::with(vec![Ok(raw)]);
            let notifier = RecordingNotifier::failing(0);
            let mut poller = build_poller(source, notifier.clone(), false);

            let outcome = poller.run_cycle().await;

            assert!(matches!(
                outcome,
                CycleOutcome::Failed(Error::MalformedReply(_))
            ));
            assert_eq!(poller.watermark(), Watermark::from_unix(500));
            assert!(notifier.sent().is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_record_freezes_watermark() {
        let source = ScriptedSource::with(vec![Ok(json!({
            "homeworks": [{"status": "approved"}],
            "current_date": 1000
        }))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source, notifier.clone(), false);

        let outcome = poller.run_cycle().await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(Error::MalformedRecord(_))
        ));
        assert_eq!(poller.watermark(), Watermark::from_unix(500));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_source_errors_freeze_watermark() {
        let source = ScriptedSource::with(vec![
            Err(Error::SourceUnavailable("dns failure".to_string())),
            Err(Error::SourceRejected {
                status: 500,
                body: String::new(),
            }),
        ]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source.clone(), notifier.clone(), false);

        for _ in 0..2 {
            let outcome = poller.run_cycle().await;
            assert!(matches!(
                outcome,
                CycleOutcome::Failed(Error::SourceUnavailable(_) | Error::SourceRejected { .. })
            ));
            assert_eq!(poller.watermark(), Watermark::from_unix(500));
        }

        assert_eq!(
            source.requested(),
            vec![Watermark::from_unix(500), Watermark::from_unix(500)]
        );
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_retried_next_cycle() {
        let reply = json!({
            "homeworks": [{"homework_name": "hw1", "status": "reviewing"}],
            "current_date": 1000
        });
        let source = ScriptedSource::with(vec![Ok(reply.clone()), Ok(reply)]);
        let notifier = RecordingNotifier::failing(1);
        let mut poller = build_poller(source.clone(), notifier.clone(), false);

        let first = poller.run_cycle().await;
        assert!(matches!(first, CycleOutcome::Failed(Error::DeliveryFailed(_))));
        assert_eq!(poller.watermark(), Watermark::from_unix(500));
        assert!(notifier.sent().is_empty());

        let second = poller.run_cycle().await;
        assert_eq!(
            second,
            CycleOutcome::Delivered {
                sent: 1,
                cursor: Watermark::from_unix(1000)
            }
        );
        assert_eq!(poller.watermark(), Watermark::from_unix(1000));
        assert_eq!(notifier.sent().len(), 1);

        // Both fetches used the frozen watermark
        assert_eq!(
            source.requested(),
            vec![Watermark::from_unix(500), Watermark::from_unix(500)]
        );
    }

    #[tokio::test]
    async fn test_only_first_record_is_reported_by_default() {
        let source = ScriptedSource::with(vec![Ok(json!({
            "homeworks": [
                {"homework_name": "hw_new", "status": "approved"},
                {"homework_name": "hw_old", "status": "rejected"}
            ],
            "current_date": 1000
        }))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source, notifier.clone(), false);

        poller.run_cycle().await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("hw_new"));
        assert_eq!(poller.watermark(), Watermark::from_unix(1000));
    }

    #[tokio::test]
    async fn test_fan_out_reports_every_record() {
        let source = ScriptedSource::with(vec![Ok(json!({
            "homeworks": [
                {"homework_name": "hw_new", "status": "approved"},
                {"homework_name": "hw_old", "status": "rejected"}
            ],
            "current_date": 1000
        }))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source, notifier.clone(), true);

        let outcome = poller.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Delivered {
                sent: 2,
                cursor: Watermark::from_unix(1000)
            }
        );
        let sent = notifier.sent();
        assert!(sent[0].contains("hw_new"));
        assert!(sent[1].contains("hw_old"));
    }

    #[tokio::test]
    async fn test_fan_out_with_bad_record_sends_nothing() {
        let source = ScriptedSource::with(vec![Ok(json!({
            "homeworks": [
                {"homework_name": "hw_new", "status": "approved"},
                {"homework_name": "hw_old", "status": "lost"}
            ],
            "current_date": 1000
        }))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source, notifier.clone(), true);

        let outcome = poller.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Failed(Error::UnknownStatus("lost".to_string()))
        );
        assert!(notifier.sent().is_empty());
        assert_eq!(poller.watermark(), Watermark::from_unix(500));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancellation() {
        let source = ScriptedSource::with(vec![Ok(json!({"homeworks": [], "current_date": 2000}))]);
        let notifier = RecordingNotifier::failing(0);
        let mut poller = build_poller(source.clone(), notifier, false);

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        time::timeout(Duration::from_secs(5), poller.run(shutdown))
            .await
            .expect("poller should stop once cancelled");

        assert_eq!(source.requested().len(), 1);
        assert_eq!(poller.watermark(), Watermark::from_unix(2000));
    }

    #[tokio::test]
    async fn test_run_keeps_polling_after_failed_cycle() {
        let source = ScriptedSource::with(vec![
            Err(Error::SourceUnavailable("connection reset".to_string())),
            Ok(json!({
                "homeworks": [{"homework_name": "hw1", "status": "approved"}],
                "current_date": 1000
            })),
        ]);
        let notifier = RecordingNotifier::failing(0);
        let mut config = Config::new("p".into(), "t".into(), "42".into());
        config.poll_interval = Duration::from_millis(100);
        let mut poller = StatusPoller::new(&config, source.clone(), notifier.clone())
            .with_watermark(Watermark::from_unix(500));

        let shutdown = CancellationToken::new();
        let canceller = shutdown.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(250)).await;
            canceller.cancel();
        });

        time::timeout(Duration::from_secs(5), poller.run(shutdown))
            .await
            .expect("poller should stop once cancelled");

        // failed fetch, delivered reply, then an empty reply at the new watermark
        assert_eq!(
            source.requested(),
            vec![
                Watermark::from_unix(500),
                Watermark::from_unix(500),
                Watermark::from_unix(1000)
            ]
        );
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(poller.watermark(), Watermark::from_unix(1000));
    }
}

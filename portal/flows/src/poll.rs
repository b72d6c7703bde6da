//! # Payment Status Polling
//!
//! One owned task per invoice. It fetches the status on start and on every manual
//! refresh, then again every `interval` while the last known status is `pending` and
//! auto-refresh is on.
//!
//! - Fetches never overlap, so an older response can never land after a newer one. A
//!   refresh that arrives mid-fetch queues exactly one follow-up fetch
//! - The first terminal status (`success`, `failed`, `expired`) is published and the
//!   task exits, nothing can change it afterwards
//! - A failed fetch only publishes its message; the schedule is untouched
//! - Dropping the [`PaymentPoller`] aborts the task and its timer
use std::{sync::Arc, time::Duration};

use api::{ApiError, PaymentService};
use async_trait::async_trait;
use models::{Payment, PaymentStatus, StatusPresentation};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, warn};

#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn fetch_status(&self, invoice: &str) -> Result<Payment, ApiError>;
}

#[async_trait]
impl StatusSource for PaymentService {
    async fn fetch_status(&self, invoice: &str) -> Result<Payment, ApiError> {
        self.status(invoice).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub auto_refresh: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            auto_refresh: true,
        }
    }
}

impl From<&api::Config> for PollConfig {
    fn from(config: &api::Config) -> Self {
        Self {
            interval: config.poll_interval,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    pub payment: Option<Payment>,
    pub error: Option<String>,
    pub loading: bool,
    pub auto_refresh: bool,

    /// A timed re-check is armed.
    pub scheduled: bool,

    /// Completed fetches, failed ones included.
    pub fetches: u64,
}

impl PollSnapshot {
    pub fn status(&self) -> Option<PaymentStatus> {
        self.payment.as_ref().map(|payment| payment.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_some_and(|status| status.is_terminal())
    }

    pub fn presentation(&self) -> Option<StatusPresentation> {
        self.status().map(|status| status.presentation())
    }

    /// Manual refresh stays available until the payment settles.
    pub fn can_refresh(&self) -> bool {
        !self.is_terminal()
    }

    fn polling_eligible(&self) -> bool {
        self.auto_refresh && self.status() == Some(PaymentStatus::Pending)
    }
}

enum Command {
    Refresh,
    AutoRefresh(bool),
    Stop,
}

pub struct PaymentPoller {
    invoice: String,
    snapshot: watch::Receiver<PollSnapshot>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl PaymentPoller {
    /// Spawns the polling task; the first fetch starts immediately.
    pub fn start<S: StatusSource>(
        source: Arc<S>,
        invoice: impl Into<String>,
        config: PollConfig,
    ) -> Self {
        let invoice = invoice.into();
        let (snapshot_tx, snapshot) = watch::channel(PollSnapshot {
            auto_refresh: config.auto_refresh,
            ..PollSnapshot::default()
        });
        let (commands, commands_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(
            source,
            invoice.clone(),
            config.interval,
            snapshot_tx,
            commands_rx,
        ));

        Self {
            invoice,
            snapshot,
            commands,
            task,
        }
    }

    pub fn invoice(&self) -> &str {
        &self.invoice
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshot.clone()
    }

    /// Requests an immediate fetch. Returns `false` once the payment is terminal or
    /// the poller has stopped.
    pub fn refresh(&self) -> bool {
        if !self.snapshot.borrow().can_refresh() {
            return false;
        }

        self.commands.send(Command::Refresh).is_ok()
    }

    pub fn set_auto_refresh(&self, enabled: bool) -> bool {
        self.commands.send(Command::AutoRefresh(enabled)).is_ok()
    }

    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Resolves with the terminal payment, or `None` if the poller stopped first.
    pub async fn settled(&self) -> Option<Payment> {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver.wait_for(PollSnapshot::is_terminal).await.ok()?;

        snapshot.payment.clone()
    }
}

impl Drop for PaymentPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<S: StatusSource>(
    source: Arc<S>,
    invoice: String,
    interval: Duration,
    snapshot: watch::Sender<PollSnapshot>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut fetch_now = true;
    let mut deadline: Option<Instant> = None;

    loop {
        if fetch_now {
            fetch_now = false;
            snapshot.send_modify(|state| {
                state.loading = true;
                state.scheduled = false;
            });

            let fetch = source.fetch_status(&invoice);
            tokio::pin!(fetch);
            let mut refresh_pending = false;

            let result = loop {
                tokio::select! {
                    result = &mut fetch => break result,
                    command = commands.recv() => match command {
                        None | Some(Command::Stop) => return,
                        Some(Command::Refresh) => refresh_pending = true,
                        Some(Command::AutoRefresh(enabled)) => {
                            snapshot.send_modify(|state| state.auto_refresh = enabled);
                        }
                    },
                }
            };

            snapshot.send_modify(|state| apply(state, &invoice, result));

            if snapshot.borrow().is_terminal() {
                info!("Payment {invoice} settled, polling stopped");
                return;
            }

            if refresh_pending {
                debug!("Refresh for {invoice} arrived mid-fetch, fetching again");
                fetch_now = true;
                continue;
            }

            deadline = arm(&snapshot, interval);
        }

        tokio::select! {
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                debug!("Re-checking payment {invoice}");
                fetch_now = true;
            }
            command = commands.recv() => match command {
                None | Some(Command::Stop) => {
                    debug!("Polling for {invoice} stopped");
                    return;
                }
                Some(Command::Refresh) => fetch_now = true,
                Some(Command::AutoRefresh(enabled)) => {
                    snapshot.send_modify(|state| state.auto_refresh = enabled);
                    deadline = arm(&snapshot, interval);
                }
            },
        }
    }
}

fn apply(state: &mut PollSnapshot, invoice: &str, result: Result<Payment, ApiError>) {
    state.loading = false;
    state.fetches += 1;

    match result {
        Ok(payment) => {
            debug!("Payment {invoice} is {}", payment.status);
            state.payment = Some(payment);
            state.error = None;
        }
        Err(e) => {
            warn!("Status check for {invoice} failed: {e}");
            state.error = Some(e.to_string());
        }
    }
}

fn arm(snapshot: &watch::Sender<PollSnapshot>, interval: Duration) -> Option<Instant> {
    let deadline = snapshot
        .borrow()
        .polling_eligible()
        .then(|| Instant::now() + interval);

    snapshot.send_modify(|state| state.scheduled = deadline.is_some());
    deadline
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use chrono::Utc;
    use models::PaymentMethod;

    use super::*;

    #[derive(Clone, Copy)]
    enum Step {
        Status(PaymentStatus),
        Fail,
    }

    struct Scripted {
        steps: Mutex<VecDeque<Step>>,
        last: Mutex<Step>,
        calls: AtomicUsize,
        latency: Duration,
    }

    impl Scripted {
        fn new(steps: &[Step]) -> Arc<Self> {
            Self::with_latency(steps, Duration::ZERO)
        }

        fn with_latency(steps: &[Step], latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.iter().copied().collect()),
                last: Mutex::new(Step::Status(PaymentStatus::Pending)),
                calls: AtomicUsize::new(0),
                latency,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn fetch_status(&self, invoice: &str) -> Result<Payment, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let step = {
                let mut steps = self.steps.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                if let Some(step) = steps.pop_front() {
                    *last = step;
                }
                *last
            };

            match step {
                Step::Status(status) => Ok(payment(invoice, status)),
                Step::Fail => Err(ApiError::server(502, Some("Gateway sibuk".to_string()))),
            }
        }
    }

    fn payment(invoice: &str, status: PaymentStatus) -> Payment {
        Payment {
            invoice_number: invoice.to_string(),
            amount: 75_000,
            status,
            payment_method: PaymentMethod::BankTransfer,
            payment_channel: "bca".to_string(),
            event_id: Some(1),
            created_at: Utc::now(),
            paid_at: None,
            expired_at: None,
        }
    }

    async fn wait_fetches(poller: &PaymentPoller, fetches: u64) -> PollSnapshot {
        let mut receiver = poller.subscribe();
        let snapshot = receiver
            .wait_for(|snapshot| snapshot.fetches >= fetches && !snapshot.loading)
            .await
            .unwrap();

        snapshot.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_schedules_recheck_after_interval() {
        let source = Scripted::new(&[
            Step::Status(PaymentStatus::Pending),
            Step::Status(PaymentStatus::Success),
        ]);
        let poller = PaymentPoller::start(source.clone(), "INV-001", PollConfig::default());

        let first = wait_fetches(&poller, 1).await;
        assert_eq!(first.presentation().unwrap().label, "Menunggu Pembayaran");
        assert!(first.scheduled);
        assert_eq!(source.calls(), 1);

        tokio::time::advance(Duration::from_millis(4_900)).await;
        tokio::task::yield_now().await;
        assert_eq!(source.calls(), 1);

        let settled = poller.settled().await.unwrap();
        assert_eq!(settled.status, PaymentStatus::Success);
        assert_eq!(source.calls(), 2);

        let last = poller.snapshot();
        assert_eq!(last.presentation().unwrap().label, "Pembayaran Berhasil!");
        assert!(!last.scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_status_stops_polling() {
        for terminal in [
            PaymentStatus::Success,
            PaymentStatus::Failed,
            PaymentStatus::Expired,
        ] {
            let source = Scripted::new(&[
                Step::Status(PaymentStatus::Pending),
                Step::Status(terminal),
            ]);
            let poller = PaymentPoller::start(source.clone(), "INV-002", PollConfig::default());

            assert_eq!(poller.settled().await.unwrap().status, terminal);
            tokio::time::sleep(Duration::from_secs(60)).await;

            assert_eq!(source.calls(), 2);
            assert!(!poller.refresh());
            assert!(poller.is_finished());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_keeps_schedule() {
        let source = Scripted::new(&[
            Step::Status(PaymentStatus::Pending),
            Step::Fail,
            Step::Status(PaymentStatus::Success),
        ]);
        let poller = PaymentPoller::start(source.clone(), "INV-003", PollConfig::default());

        let failed = wait_fetches(&poller, 2).await;
        assert_eq!(failed.error.as_deref(), Some("Gateway sibuk"));
        assert_eq!(failed.status(), Some(PaymentStatus::Pending));
        assert!(failed.scheduled);

        poller.settled().await.unwrap();
        let settled = poller.snapshot();
        assert_eq!(settled.error, None);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_first_fetch_waits_for_refresh() {
        let source = Scripted::new(&[Step::Fail, Step::Status(PaymentStatus::Success)]);
        let poller = PaymentPoller::start(source.clone(), "INV-004", PollConfig::default());

        let failed = wait_fetches(&poller, 1).await;
        assert!(!failed.scheduled);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 1);

        assert!(poller.refresh());
        assert_eq!(poller.settled().await.unwrap().status, PaymentStatus::Success);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_without_auto_refresh() {
        let source = Scripted::new(&[Step::Status(PaymentStatus::Pending)]);
        let config = PollConfig {
            auto_refresh: false,
            ..PollConfig::default()
        };
        let poller = PaymentPoller::start(source.clone(), "INV-005", config);

        let first = wait_fetches(&poller, 1).await;
        assert!(!first.scheduled);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), 1);

        assert!(poller.refresh());
        wait_fetches(&poller, 2).await;
        assert_eq!(source.calls(), 2);

        assert!(poller.set_auto_refresh(true));
        let mut receiver = poller.subscribe();
        receiver.wait_for(|snapshot| snapshot.scheduled).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_fetch_fetches_again() {
        let source = Scripted::with_latency(
            &[
                Step::Status(PaymentStatus::Pending),
                Step::Status(PaymentStatus::Success),
            ],
            Duration::from_secs(1),
        );
        let config = PollConfig {
            auto_refresh: false,
            ..PollConfig::default()
        };
        let poller = PaymentPoller::start(source.clone(), "INV-006", config);

        tokio::task::yield_now().await;
        assert_eq!(source.calls(), 1);
        assert!(poller.refresh());
        assert!(poller.refresh());

        assert_eq!(poller.settled().await.unwrap().status, PaymentStatus::Success);
        assert_eq!(source.calls(), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_auto_refresh_cancels_recheck() {
        let source = Scripted::new(&[Step::Status(PaymentStatus::Pending)]);
        let poller = PaymentPoller::start(source.clone(), "INV-009", PollConfig::default());

        let first = wait_fetches(&poller, 1).await;
        assert!(first.scheduled);

        assert!(poller.set_auto_refresh(false));
        let mut receiver = poller.subscribe();
        receiver.wait_for(|snapshot| !snapshot.scheduled).await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;

        let last = poller.snapshot();
        assert_eq!(source.calls(), 1);
        assert!(!last.scheduled);
        assert!(!last.auto_refresh);
        assert_eq!(last.status(), Some(PaymentStatus::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let source = Scripted::new(&[Step::Status(PaymentStatus::Pending)]);
        let poller = PaymentPoller::start(source.clone(), "INV-007", PollConfig::default());

        wait_fetches(&poller, 1).await;
        poller.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.calls(), 1);
        assert!(poller.is_finished());
        assert!(!poller.set_auto_refresh(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let source = Scripted::new(&[Step::Status(PaymentStatus::Pending)]);
        let poller = PaymentPoller::start(source.clone(), "INV-008", PollConfig::default());

        wait_fetches(&poller, 1).await;
        drop(poller);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.calls(), 1);
    }
}

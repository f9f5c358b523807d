use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{bail, Result};
use log::info;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::models::RawCounterSample;

/// Roughly the cadence of a UI-rate sensor subscription.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(60);

/// Receives raw counter readings from an active step source. Invoked from the
/// source's own task; implementations must not block it.
pub trait RawCountListener: Send + Sync {
    fn on_raw_count(&self, sample: RawCounterSample);
}

/// A cumulative step counter register: total steps since boot, or `None` when
/// the device is absent.
pub trait CounterDevice: Send + Sync {
    fn read_total(&self) -> Option<u64>;
}

/// Hardware-facing subscription seam. At most one listener is registered at a
/// time; the engine's ref-count decides when to register and unregister.
pub trait StepSource: Send + Sync {
    fn is_available(&self) -> bool;
    fn register(&self, listener: Arc<dyn RawCountListener>) -> Result<()>;
    fn unregister(&self);
}

struct ActivePoll {
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

/// Adapts a [`CounterDevice`] into listener callbacks by polling it at a
/// UI-responsive rate from a background task. Availability is probed once at
/// construction; an absent device leaves the source permanently inert.
pub struct PollingStepSource {
    device: Arc<dyn CounterDevice>,
    poll_interval: Duration,
    runtime: Handle,
    available: bool,
    active: Mutex<Option<ActivePoll>>,
}

impl PollingStepSource {
    /// Must be constructed inside a Tokio runtime; the polling task is
    /// spawned onto the runtime that was current here.
    pub fn new(device: Arc<dyn CounterDevice>, poll_interval: Duration) -> Self {
        let available = device.read_total().is_some();
        if !available {
            info!("no step counter hardware detected; source stays inert");
        }
        Self {
            device,
            poll_interval,
            runtime: Handle::current(),
            available,
            active: Mutex::new(None),
        }
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<ActivePoll>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StepSource for PollingStepSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn register(&self, listener: Arc<dyn RawCountListener>) -> Result<()> {
        let mut guard = self.lock_active();
        if guard.is_some() {
            bail!("step source already registered");
        }

        let cancel = CancellationToken::new();
        let task = self.runtime.spawn(poll_loop(
            Arc::clone(&self.device),
            listener,
            self.poll_interval,
            cancel.clone(),
        ));

        *guard = Some(ActivePoll {
            cancel,
            _task: task,
        });
        Ok(())
    }

    fn unregister(&self) {
        if let Some(active) = self.lock_active().take() {
            active.cancel.cancel();
        }
    }
}

async fn poll_loop(
    device: Arc<dyn CounterDevice>,
    listener: Arc<dyn RawCountListener>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Counters only report movement: unchanged readings are not re-delivered.
    let mut last_total: Option<u64> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(total) = device.read_total() else {
                    continue;
                };
                if last_total == Some(total) {
                    continue;
                }
                last_total = Some(total);
                listener.on_raw_count(RawCounterSample {
                    total_steps_since_boot: total,
                });
            }
            _ = cancel.cancelled() => {
                info!("step polling loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ScriptedDevice {
        total: AtomicU64,
    }

    impl ScriptedDevice {
        fn new(start: u64) -> Arc<Self> {
            Arc::new(Self {
                total: AtomicU64::new(start),
            })
        }

        fn set(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
    }

    impl CounterDevice for ScriptedDevice {
        fn read_total(&self) -> Option<u64> {
            Some(self.total.load(Ordering::SeqCst))
        }
    }

    #[derive(Default)]
    struct Collector {
        seen: Mutex<Vec<u64>>,
    }

    impl RawCountListener for Collector {
        fn on_raw_count(&self, sample: RawCounterSample) {
            self.seen.lock().unwrap().push(sample.total_steps_since_boot);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_only_changed_readings() {
        let device = ScriptedDevice::new(5000);
        let source =
            PollingStepSource::new(Arc::clone(&device) as Arc<dyn CounterDevice>, DEFAULT_POLL_INTERVAL);
        let collector = Arc::new(Collector::default());

        source
            .register(Arc::clone(&collector) as Arc<dyn RawCountListener>)
            .unwrap();

        // First tick delivers the initial reading; the next two ticks see no
        // change; then the counter advances.
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        device.set(5137);
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::task::yield_now().await;

        let seen = collector.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![5000, 5137]);
        source.unregister();
    }

    #[tokio::test(start_paused = true)]
    async fn unregister_stops_delivery() {
        let device = ScriptedDevice::new(100);
        let source =
            PollingStepSource::new(Arc::clone(&device) as Arc<dyn CounterDevice>, DEFAULT_POLL_INTERVAL);
        let collector = Arc::new(Collector::default());

        source
            .register(Arc::clone(&collector) as Arc<dyn RawCountListener>)
            .unwrap();
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::task::yield_now().await;

        source.unregister();
        device.set(200);
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::task::yield_now().await;

        let seen = collector.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![100]);
    }

    #[tokio::test]
    async fn double_register_is_rejected() {
        let device = ScriptedDevice::new(0);
        let source =
            PollingStepSource::new(Arc::clone(&device) as Arc<dyn CounterDevice>, DEFAULT_POLL_INTERVAL);
        let collector = Arc::new(Collector::default());

        source
            .register(Arc::clone(&collector) as Arc<dyn RawCountListener>)
            .unwrap();
        assert!(source
            .register(Arc::clone(&collector) as Arc<dyn RawCountListener>)
            .is_err());
        source.unregister();
    }

    #[tokio::test]
    async fn unregister_when_idle_is_a_no_op() {
        let device = ScriptedDevice::new(0);
        let source = PollingStepSource::new(device as Arc<dyn CounterDevice>, DEFAULT_POLL_INTERVAL);
        source.unregister();
    }
}

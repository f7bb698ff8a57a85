//! Observer hooks for injection events.
//!
//! Observers are registered on a [`DependencyInjector`](crate::DependencyInjector)
//! and notified synchronously for every capability it attaches. Keep
//! implementations lightweight; they run inside `resolve_dependencies`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::capability::CapabilityEntry;
use crate::error::DependencyResolutionError;

/// Observer trait for injection events.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
/// use ferrous_wire::{
///     CapabilityEntry, CapabilityTable, DependencyInjector, DependencyResolutionError,
///     InjectionObserver,
/// };
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl InjectionObserver for Counter {
///     fn attaching(&self, _instance: &'static str, _entry: &CapabilityEntry) {}
///
///     fn attached(&self, _instance: &'static str, _entry: &CapabilityEntry, _elapsed: Duration) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
///
///     fn failed(&self, _instance: &'static str, _entry: &CapabilityEntry, _error: &DependencyResolutionError) {}
/// }
///
/// let mut injector = DependencyInjector::new(CapabilityTable::builtins());
/// injector.add_observer(Arc::new(Counter::default()));
/// ```
pub trait InjectionObserver: Send + Sync {
    /// Called before the service for `entry` is resolved.
    fn attaching(&self, instance: &'static str, entry: &CapabilityEntry);

    /// Called after the service was resolved and stored.
    ///
    /// `elapsed` covers both resolution and attachment.
    fn attached(&self, instance: &'static str, entry: &CapabilityEntry, elapsed: Duration);

    /// Called once when wiring stops at `entry`.
    fn failed(&self, instance: &'static str, entry: &CapabilityEntry, error: &DependencyResolutionError);
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn InjectionObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn InjectionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn attaching(&self, instance: &'static str, entry: &CapabilityEntry) {
        for observer in &self.observers {
            observer.attaching(instance, entry);
        }
    }

    #[inline]
    pub(crate) fn attached(&self, instance: &'static str, entry: &CapabilityEntry, elapsed: Duration) {
        for observer in &self.observers {
            observer.attached(instance, entry, elapsed);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, instance: &'static str, entry: &CapabilityEntry, error: &DependencyResolutionError) {
        for observer in &self.observers {
            observer.failed(instance, entry, error);
        }
    }
}

/// Observer that forwards events to `tracing` at `info`/`warn`.
///
/// The injector already emits `trace`-level events; this one is for
/// applications that want wiring visible at normal log levels.
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-wire".to_string(),
        }
    }

    /// Creates a logging observer whose events carry `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectionObserver for LoggingObserver {
    fn attaching(&self, _instance: &'static str, _entry: &CapabilityEntry) {}

    fn attached(&self, instance: &'static str, entry: &CapabilityEntry, elapsed: Duration) {
        info!(
            observer = %self.prefix,
            instance,
            capability = entry.marker_name(),
            service = %entry.service_key(),
            ?elapsed,
            "capability attached"
        );
    }

    fn failed(&self, instance: &'static str, entry: &CapabilityEntry, error: &DependencyResolutionError) {
        warn!(
            observer = %self.prefix,
            instance,
            capability = entry.marker_name(),
            %error,
            "capability injection failed"
        );
    }
}

/// Observer that counts attachments and failures.
///
/// ```
/// use ferrous_wire::MetricsObserver;
///
/// let metrics = MetricsObserver::new();
/// assert_eq!(metrics.attached_count(), 0);
/// assert!(metrics.average_attach_time().is_none());
/// ```
#[derive(Debug, Default)]
pub struct MetricsObserver {
    attached: AtomicU64,
    failed: AtomicU64,
    total_attach_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of capabilities attached.
    pub fn attached_count(&self) -> u64 {
        self.attached.load(Ordering::Relaxed)
    }

    /// Number of failed injections.
    pub fn failure_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn total_attach_time(&self) -> Duration {
        Duration::from_nanos(self.total_attach_nanos.load(Ordering::Relaxed))
    }

    pub fn average_attach_time(&self) -> Option<Duration> {
        let count = self.attached_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            self.total_attach_nanos.load(Ordering::Relaxed) / count,
        ))
    }
}

impl InjectionObserver for MetricsObserver {
    fn attaching(&self, _instance: &'static str, _entry: &CapabilityEntry) {}

    fn attached(&self, _instance: &'static str, _entry: &CapabilityEntry, elapsed: Duration) {
        self.attached.fetch_add(1, Ordering::Relaxed);
        self.total_attach_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    fn failed(&self, _instance: &'static str, _entry: &CapabilityEntry, _error: &DependencyResolutionError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

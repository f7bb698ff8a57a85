//! Observer hooks and tracing output of the injector.

use ferrous_wire::{
    capability, injectable, CapabilityEntry, CapabilityTable, DependencyInjector, DependencyResolutionError,
    InjectionObserver, InjectorConfig, LoggingObserver, MetricsObserver, ServiceCollection, Slot,
};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct Db;
pub struct Cache;

capability!(pub WithDb: Db);
capability!(pub WithCache: Cache);

#[derive(Default)]
struct Repo {
    db: Slot<WithDb>,
    cache: Slot<WithCache>,
}
injectable!(Repo { db: WithDb, cache: WithCache });

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl InjectionObserver for Recorder {
    fn attaching(&self, _instance: &'static str, entry: &CapabilityEntry) {
        self.events.lock().unwrap().push(format!("attaching {}", short(entry.marker_name())));
    }

    fn attached(&self, _instance: &'static str, entry: &CapabilityEntry, _elapsed: Duration) {
        self.events.lock().unwrap().push(format!("attached {}", short(entry.marker_name())));
    }

    fn failed(&self, _instance: &'static str, entry: &CapabilityEntry, error: &DependencyResolutionError) {
        assert_eq!(error.marker, entry.marker_name());
        self.events.lock().unwrap().push(format!("failed {}", short(entry.marker_name())));
    }
}

fn short(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

fn table() -> CapabilityTable {
    CapabilityTable::builder().with::<WithDb>().with::<WithCache>().build().unwrap()
}

#[test]
fn test_observer_sees_each_attachment() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(Db);
    sc.add_singleton(Cache);
    let sp = sc.build();

    let recorder = Arc::new(Recorder::default());
    let mut injector = DependencyInjector::new(table());
    injector.add_observer(recorder.clone());

    injector.resolve_dependencies(&mut Repo::default(), &sp).unwrap();
    assert_eq!(
        recorder.events(),
        vec!["attaching WithDb", "attached WithDb", "attaching WithCache", "attached WithCache"]
    );
}

#[test]
fn test_observer_sees_single_failure() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(Cache);
    let sp = sc.build();

    let recorder = Arc::new(Recorder::default());
    let metrics = Arc::new(MetricsObserver::new());
    let mut injector = DependencyInjector::new(table());
    injector.add_observer(recorder.clone()).add_observer(metrics.clone());

    assert!(injector.resolve_dependencies(&mut Repo::default(), &sp).is_err());
    assert_eq!(recorder.events(), vec!["attaching WithDb", "failed WithDb"]);
    assert_eq!(metrics.failure_count(), 1);
    assert_eq!(metrics.attached_count(), 0);
}

// ===== tracing output =====

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<F: FnOnce()>(f: F) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("trace"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.text()
}

#[test]
fn test_failure_is_logged_at_warn() {
    let sp = ServiceCollection::new().build();
    let injector = DependencyInjector::new(table());

    let output = capture(|| {
        let _ = injector.resolve_dependencies(&mut Repo::default(), &sp);
    });
    assert!(output.contains("WARN"));
    assert!(output.contains("dependency injection aborted"));
    assert!(output.contains("resolve_dependencies"));
}

#[test]
fn test_slow_resolution_is_logged() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(Db);
    sc.add_singleton(Cache);
    let sp = sc.build();

    let config = InjectorConfig::default().slow_resolution_threshold(Duration::ZERO);
    let injector = DependencyInjector::with_config(table(), config);

    let output = capture(|| injector.resolve_dependencies(&mut Repo::default(), &sp).unwrap());
    assert!(output.contains("slow capability resolution"));
}

#[test]
fn test_logging_observer_reports_attachments() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(Db);
    sc.add_singleton(Cache);
    let sp = sc.build();

    let mut injector = DependencyInjector::new(table());
    injector.add_observer(Arc::new(LoggingObserver::with_prefix("repo-wiring")));

    let output = capture(|| injector.resolve_dependencies(&mut Repo::default(), &sp).unwrap());
    assert!(output.contains("capability attached"));
    assert!(output.contains("repo-wiring"));
}

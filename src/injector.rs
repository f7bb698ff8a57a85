//! The dependency injector.
//!
//! Walks a [`CapabilityTable`] and, for every capability an instance
//! declares, resolves the service from a container and stores it in the
//! instance's slot.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, debug_span, trace, warn};

use crate::capability::{CapabilityEntry, CapabilityTable, Injectable};
use crate::config::InjectorConfig;
use crate::error::{DependencyResolutionError, DiError};
use crate::observer::{InjectionObserver, Observers};
use crate::traits::ResolverCore;

/// Injects capability services into instances.
///
/// Holds no container: the container is passed per call, so one injector
/// serves any number of providers. It is `Send + Sync` and never locks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ferrous_wire::{
///     capability, injectable, CapabilityExt, CapabilityTable, DependencyInjector,
///     ServiceCollection, Slot,
/// };
///
/// pub trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
/// struct Stdout;
/// impl Logger for Stdout {
///     fn log(&self, msg: &str) { println!("{msg}"); }
/// }
///
/// capability!(pub WithLogger: dyn Logger => "logger");
///
/// #[derive(Default)]
/// struct Foo {
///     logger: Slot<WithLogger>,
/// }
/// injectable!(Foo { logger: WithLogger });
///
/// let mut services = ServiceCollection::new();
/// services.add_named_singleton_trait::<dyn Logger>("logger", Arc::new(Stdout));
/// let provider = services.build();
///
/// let injector = DependencyInjector::new(CapabilityTable::builder().with::<WithLogger>().build()?);
/// let mut foo = Foo::default();
/// injector.resolve_dependencies(&mut foo, &provider)?;
/// assert!(foo.capability::<WithLogger>().is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct DependencyInjector {
    table: Arc<CapabilityTable>,
    config: InjectorConfig,
    observers: Observers,
}

impl DependencyInjector {
    pub fn new(table: impl Into<Arc<CapabilityTable>>) -> Self {
        Self::with_config(table, InjectorConfig::default())
    }

    pub fn with_config(table: impl Into<Arc<CapabilityTable>>, config: InjectorConfig) -> Self {
        Self {
            table: table.into(),
            config,
            observers: Observers::default(),
        }
    }

    /// Injector over the process-wide table.
    pub fn global() -> Self {
        Self::new(CapabilityTable::global())
    }

    /// Registers an observer notified for every attachment.
    pub fn add_observer(&mut self, observer: Arc<dyn InjectionObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// Wires every capability `instance` declares from `container`.
    ///
    /// Capabilities the instance does not declare are skipped. The first
    /// service that cannot be resolved or attached aborts the call; the
    /// instance may then be partially wired and should be discarded.
    /// Calling again on the same instance overwrites each slot.
    pub fn resolve_dependencies(
        &self,
        instance: &mut dyn Injectable,
        container: &dyn ResolverCore,
    ) -> Result<(), DependencyResolutionError> {
        let instance_name = instance.type_name();
        let _span = debug_span!("resolve_dependencies", instance = instance_name).entered();

        for entry in self.table.iter() {
            let Some(slot) = instance.capability_slot(entry.marker()) else {
                if self.config.trace_attachments {
                    debug!(capability = entry.marker_name(), "not declared, skipping");
                }
                continue;
            };

            self.observers.attaching(instance_name, entry);
            let start = Instant::now();
            let result = container
                .resolve_any(entry.service_key())
                .and_then(|service| entry.attach(slot, service));
            let elapsed = start.elapsed();

            if let Err(source) = result {
                let error = failure(instance_name, entry, source);
                self.observers.failed(instance_name, entry, &error);
                warn!(capability = entry.marker_name(), %error, "dependency injection aborted");
                return Err(error);
            }

            self.observers.attached(instance_name, entry, elapsed);
            if elapsed >= self.config.slow_resolution_threshold {
                warn!(
                    capability = entry.marker_name(),
                    service = %entry.service_key(),
                    ?elapsed,
                    "slow capability resolution"
                );
            } else if self.config.trace_attachments {
                debug!(capability = entry.marker_name(), service = %entry.service_key(), ?elapsed, "attached");
            } else {
                trace!(capability = entry.marker_name(), ?elapsed, "attached");
            }
        }

        Ok(())
    }

    /// Reports every declared capability whose service is unavailable.
    ///
    /// Unlike [`resolve_dependencies`](Self::resolve_dependencies) this does
    /// not stop at the first problem and leaves `instance` untouched.
    /// Services are still resolved, so singleton factories may run.
    pub fn diagnose(
        &self,
        instance: &dyn Injectable,
        container: &dyn ResolverCore,
    ) -> Vec<DependencyResolutionError> {
        let instance_name = instance.type_name();
        self.table
            .iter()
            .filter(|entry| instance.declares(entry.marker()))
            .filter_map(|entry| {
                let outcome = container.resolve_any(entry.service_key()).and_then(|service| {
                    if entry.accepts(&service) {
                        Ok(())
                    } else {
                        Err(DiError::TypeMismatch(entry.service_type()))
                    }
                });
                outcome.err().map(|source| failure(instance_name, entry, source))
            })
            .collect()
    }

    /// Names of the table's markers that `instance` declares.
    pub fn satisfied_markers(&self, instance: &dyn Injectable) -> Vec<&'static str> {
        self.table
            .iter()
            .filter(|entry| instance.declares(entry.marker()))
            .map(CapabilityEntry::marker_name)
            .collect()
    }
}

impl Default for DependencyInjector {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for DependencyInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyInjector")
            .field("capabilities", &self.table.markers())
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn failure(instance: &'static str, entry: &CapabilityEntry, source: DiError) -> DependencyResolutionError {
    DependencyResolutionError {
        instance,
        marker: entry.marker_name(),
        service_key: entry.service_key().clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{capability, injectable, CapabilityExt, ServiceCollection, Slot};

    capability!(WithName: String => "name");
    capability!(WithPort: u16);

    #[derive(Default)]
    struct Server {
        name: Slot<WithName>,
        port: Slot<WithPort>,
    }
    injectable!(Server { name: WithName, port: WithPort });

    fn table() -> CapabilityTable {
        CapabilityTable::builder()
            .with::<WithName>()
            .with::<WithPort>()
            .build()
            .unwrap()
    }

    #[test]
    fn slow_threshold_zero_still_attaches() {
        let config = InjectorConfig::default().slow_resolution_threshold(Duration::ZERO);
        let injector = DependencyInjector::with_config(table(), config);

        let mut sc = ServiceCollection::new();
        sc.add_named_singleton("name", "api".to_string());
        sc.add_singleton(8080u16);
        let sp = sc.build();

        let mut server = Server::default();
        injector.resolve_dependencies(&mut server, &sp).unwrap();
        assert_eq!(server.capability::<WithName>().as_deref().map(String::as_str), Some("api"));
        assert_eq!(server.capability::<WithPort>().as_deref(), Some(&8080));
    }

    #[test]
    fn failure_names_marker_and_key() {
        let injector = DependencyInjector::new(table());
        let mut sc = ServiceCollection::new();
        sc.add_named_singleton("name", "api".to_string());
        let sp = sc.build();

        let mut server = Server::default();
        let err = injector.resolve_dependencies(&mut server, &sp).unwrap_err();
        assert!(err.marker.ends_with("WithPort"));
        assert_eq!(err.service_key, crate::key_of_type::<u16>());
        assert!(matches!(err.source, DiError::NotFound(_)));
    }

    #[test]
    fn satisfied_markers_follow_table_order() {
        let injector = DependencyInjector::new(table().with_builtins());
        let markers = injector.satisfied_markers(&Server::default());
        assert_eq!(markers.len(), 2);
        assert!(markers[0].ends_with("WithName"));
    }
}

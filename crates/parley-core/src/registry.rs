//! Subscription registry.
//!
//! The registry owns every subscription of one robot, grouped by
//! [`EventKind`] and kept in registration order.
//!
//! # Dispatch
//!
//! A dispatch pass works on a snapshot of the list taken when the pass
//! starts. The lock is released before any handler runs, so handlers may
//! register or remove subscriptions (including themselves) freely; such
//! changes only affect later passes.
//!
//! Every subscription whose filter passes is invoked. There is no
//! first-match-wins and no blocking.
//!
//! A `once` subscription is claimed atomically before its handler runs and
//! removed from the registry at the same moment, so it fires at most once
//! even when its handler re-enters dispatch.
//!
//! Handler failures are collected into the [`DispatchReport`] and returned;
//! the registry neither logs nor swallows them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::context::Context;
use crate::error::BoxError;
use crate::event::EventKind;
use crate::handler::BoxedHandler;
use crate::matcher::Filter;

/// Handle identifying one registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One registered interest in an event kind.
///
/// Never mutated after creation; replace it by removing and re-adding.
pub struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    filter: Filter,
    handler: BoxedHandler,
    once: bool,
    spent: AtomicBool,
}

impl Subscription {
    /// Returns this subscription's handle.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the event kind this subscription listens on.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Returns the filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Returns `true` for `once` subscriptions.
    pub fn is_once(&self) -> bool {
        self.once
    }

    /// Claims a `once` subscription. Returns `false` if it already fired.
    fn claim(&self) -> bool {
        !self.once || !self.spent.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("filter", &self.filter)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// A handler error captured during a dispatch pass.
#[derive(Debug)]
pub struct HandlerFailure {
    /// The subscription whose handler failed.
    pub subscription: SubscriptionId,
    /// The error it returned.
    pub error: BoxError,
}

/// Summary of one dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of handlers invoked.
    pub invoked: usize,
    /// Failures returned by invoked handlers, in invocation order.
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    /// Returns `true` if at least one handler ran.
    pub fn any_invoked(&self) -> bool {
        self.invoked > 0
    }
}

/// Per-event-kind ordered lists of subscriptions.
#[derive(Default)]
pub struct SubscriptionRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<EventKind, Vec<Arc<Subscription>>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscription for `kind`. Identical filters are not
    /// deduplicated; each registration fires independently.
    pub fn register(
        &self,
        kind: EventKind,
        filter: Filter,
        handler: BoxedHandler,
        once: bool,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let subscription = Arc::new(Subscription {
            id,
            kind: kind.clone(),
            filter,
            handler,
            once,
            spent: AtomicBool::new(false),
        });
        self.entries.write().entry(kind).or_default().push(subscription);
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        for list in entries.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Returns the current subscriptions for `kind`, in registration order.
    pub fn snapshot(&self, kind: &EventKind) -> Vec<Arc<Subscription>> {
        self.entries.read().get(kind).cloned().unwrap_or_default()
    }

    /// Returns the number of subscriptions for `kind`.
    pub fn len(&self, kind: &EventKind) -> usize {
        self.entries.read().get(kind).map_or(0, Vec::len)
    }

    /// Returns the number of subscriptions across all kinds.
    pub fn total(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Runs one dispatch pass of `kind` over `ctx`.
    pub fn dispatch(&self, kind: &EventKind, ctx: &mut Context) -> DispatchReport {
        let mut report = DispatchReport::default();

        for subscription in self.snapshot(kind) {
            let Some(matches) = subscription.filter.check(ctx.message(), ctx.fields()) else {
                trace!(event = %kind, subscription = %subscription.id, "Filter did not match");
                continue;
            };

            if !subscription.claim() {
                continue;
            }
            if subscription.once {
                self.unregister(subscription.id);
            }

            trace!(event = %kind, subscription = %subscription.id, "Invoking handler");
            ctx.set_matches(matches);
            report.invoked += 1;

            if let Err(error) = (subscription.handler)(ctx) {
                report.failures.push(HandlerFailure {
                    subscription: subscription.id,
                    error,
                });
            }
        }

        report
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::into_handler;
    use crate::matcher::{Fields, fields};
    use crate::robot::Robot;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn ctx(text: &str) -> Context {
        Context::new(Robot::new("Robot"), text, Fields::new())
    }

    fn counter(hits: &Arc<AtomicUsize>) -> BoxedHandler {
        let hits = Arc::clone(hits);
        into_handler(move |_ctx: &mut Context| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn dispatch_on_unknown_kind_is_noop() {
        let registry = SubscriptionRegistry::new();
        let report = registry.dispatch(&EventKind::Hear, &mut ctx("hi"));
        assert!(!report.any_invoked());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn all_matching_handlers_run_in_order() {
        let registry = SubscriptionRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            registry.register(
                EventKind::Hear,
                Filter::any(),
                into_handler(move |_ctx: &mut Context| order.lock().push(i)),
                false,
            );
        }

        let report = registry.dispatch(&EventKind::Hear, &mut ctx("hi"));
        assert_eq!(report.invoked, 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn once_fires_a_single_time() {
        let registry = SubscriptionRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        registry.register(EventKind::Hear, Filter::any(), counter(&hits), true);

        registry.dispatch(&EventKind::Hear, &mut ctx("a"));
        registry.dispatch(&EventKind::Hear, &mut ctx("b"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(&EventKind::Hear), 0);
    }

    #[test]
    fn once_survives_non_matching_dispatch() {
        let registry = SubscriptionRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        registry.register(
            EventKind::Hear,
            Filter::regex("yes").unwrap(),
            counter(&hits),
            true,
        );

        registry.dispatch(&EventKind::Hear, &mut ctx("no"));
        assert_eq!(registry.len(&EventKind::Hear), 1);

        registry.dispatch(&EventKind::Hear, &mut ctx("yes"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(&EventKind::Hear), 0);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = registry.register(EventKind::Hear, Filter::any(), counter(&hits), false);

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));

        registry.dispatch(&EventKind::Hear, &mut ctx("hi"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identical_filters_fire_independently() {
        let registry = SubscriptionRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let filter = Filter::regex("x").unwrap();
        registry.register(EventKind::Hear, filter.clone(), counter(&hits), false);
        registry.register(EventKind::Hear, filter, counter(&hits), false);

        registry.dispatch(&EventKind::Hear, &mut ctx("x"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_collected_and_dispatch_continues() {
        let registry = SubscriptionRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let failing = registry.register(
            EventKind::Hear,
            Filter::any(),
            into_handler(|_ctx: &mut Context| -> Result<(), BoxError> { Err("boom".into()) }),
            false,
        );
        registry.register(EventKind::Hear, Filter::any(), counter(&hits), false);

        let report = registry.dispatch(&EventKind::Hear, &mut ctx("hi"));
        assert_eq!(report.invoked, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].subscription, failing);
        assert_eq!(report.failures[0].error.to_string(), "boom");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn matches_are_per_subscription() {
        let registry = SubscriptionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for pattern in ["(h)ello", "wor(ld)"] {
            let seen = Arc::clone(&seen);
            registry.register(
                EventKind::Hear,
                Filter::regex(pattern).unwrap(),
                into_handler(move |ctx: &mut Context| {
                    seen.lock().push(ctx.capture(1).map(str::to_string));
                }),
                false,
            );
        }

        let mut c = Context::new(Robot::new("Robot"), "hello world", fields([("user", "a")]));
        registry.dispatch(&EventKind::Hear, &mut c);
        assert_eq!(
            *seen.lock(),
            vec![Some("h".to_string()), Some("ld".to_string())]
        );
    }
}

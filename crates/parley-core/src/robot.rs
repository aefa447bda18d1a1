//! The robot: identity, subscriptions and the hear → mention pipeline.
//!
//! # Pipeline
//!
//! ```text
//! adapter ──hear(text, fields)──▶ Robot ──▶ `hear` pass ──▶ handlers
//!                                   │
//!                          mentioned?│yes
//!                                   ▼
//!                               `mention` pass ──▶ handlers
//! ```
//!
//! Every call to [`Robot::hear`] runs a `hear` pass. If the text addresses
//! the robot, a `mention` pass follows with the same context, whose
//! [`command`](Context::command) then holds the text without the address.
//!
//! # Re-entrancy
//!
//! Internal locks are never held while handlers run. A handler may call
//! [`hear`](Robot::hear), [`emit`](Robot::emit), [`on`](Robot::on),
//! [`off`](Robot::off) or [`set_name`](Robot::set_name) on the same robot;
//! those calls start their own dispatch passes.
//!
//! # Handler failures
//!
//! Failures are isolated: the remaining handlers of the pass still run.
//! Each failure is logged and re-emitted as an `error` event carrying the
//! failing `event`, the `subscription` id and the original `source_message`
//! alongside the original fields. Failures inside `error` handlers are only
//! logged.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use tracing::{Level, debug, info, span, warn};

use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::event::EventKind;
use crate::handler::{HandlerResult, IntoHandlerResult, into_handler};
use crate::matcher::{Fields, Filter, IntoFilter};
use crate::mention::{DEFAULT_MENTION_TEMPLATE, MentionDetector, PatternFactory};
use crate::output::{EventOutput, OutputChannel};
use crate::plugin::Plugin;
use crate::registry::{DispatchReport, SubscriptionId, SubscriptionRegistry};

/// The name a robot gets when none is configured.
pub const DEFAULT_NAME: &str = "Robot";

/// Type-erased service stored in the robot. The inner value is an `Arc<T>`.
type ServiceArc = Arc<dyn Any + Send + Sync>;

struct Identity {
    name: String,
    mentions: MentionDetector,
}

struct RobotInner {
    identity: RwLock<Identity>,
    registry: SubscriptionRegistry,
    output: RwLock<Arc<dyn OutputChannel>>,
    services: RwLock<HashMap<TypeId, ServiceArc>>,
}

/// A chat robot.
///
/// `Robot` is a cheap handle; clones share the same state.
#[derive(Clone)]
pub struct Robot {
    inner: Arc<RobotInner>,
}

impl Default for Robot {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Robot {
    /// Creates a robot with the default mention template and patterns.
    ///
    /// A blank name cannot be addressed, so the robot starts without mention
    /// patterns; use [`Robot::builder`] to get the error instead.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mentions = MentionDetector::new(&name).unwrap_or_else(|e| {
            warn!(name = %name, error = %e, "Default mention patterns rejected, starting without any");
            MentionDetector::empty(DEFAULT_MENTION_TEMPLATE)
        });
        Self::from_parts(name, mentions)
    }

    /// Returns a non-owning handle to this robot.
    ///
    /// Timers and other long-lived helpers stored inside the robot hold a
    /// [`WeakRobot`] so that they do not keep it alive.
    pub fn downgrade(&self) -> WeakRobot {
        WeakRobot {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Creates a builder for a customised robot.
    pub fn builder() -> RobotBuilder {
        RobotBuilder::new()
    }

    fn from_parts(name: String, mentions: MentionDetector) -> Self {
        Self {
            inner: Arc::new(RobotInner {
                identity: RwLock::new(Identity { name, mentions }),
                registry: SubscriptionRegistry::new(),
                output: RwLock::new(Arc::new(EventOutput)),
                services: RwLock::new(HashMap::new()),
            }),
        }
    }

    // ─── Identity ────────────────────────────────────────────────────────────

    /// Returns the robot's current name.
    pub fn name(&self) -> String {
        self.inner.identity.read().name.clone()
    }

    /// Renames the robot.
    ///
    /// Mention patterns are regenerated for the new name. If the name is
    /// blank or any pattern fails to compile, nothing changes and the error
    /// is returned. On
    /// success a `name` event is emitted with the new name as its text and
    /// the old one in the `previous` field.
    pub fn set_name(&self, name: impl Into<String>) -> CoreResult<&Self> {
        let name = name.into();
        let previous = {
            let mut identity = self.inner.identity.write();
            identity.mentions.regenerate(&name)?;
            std::mem::replace(&mut identity.name, name.clone())
        };

        info!(from = %previous, to = %name, "Robot renamed");
        let mut fields = Fields::new();
        fields.insert("previous".into(), Value::from(previous));
        Ok(self.emit(EventKind::Name, &name, fields))
    }

    /// Returns the mention template.
    pub fn mention_template(&self) -> String {
        self.inner.identity.read().mentions.template().to_string()
    }

    /// Replaces the mention template.
    pub fn set_mention_template(&self, template: impl Into<String>) -> &Self {
        self.inner.identity.write().mentions.set_template(template);
        self
    }

    /// Formats the mention template for `nickname`, or for the robot itself.
    pub fn mention_prefix(&self, nickname: Option<&str>) -> String {
        let identity = self.inner.identity.read();
        identity
            .mentions
            .prefix(nickname.unwrap_or(identity.name.as_str()))
    }

    /// Returns `true` if `text` addresses the robot.
    pub fn is_mentioned(&self, text: &str) -> bool {
        self.inner.identity.read().mentions.is_mentioned(text)
    }

    /// Appends a mention pattern factory, compiled for the current name.
    pub fn add_mention_pattern(&self, factory: PatternFactory) -> CoreResult<&Self> {
        let mut identity = self.inner.identity.write();
        let name = identity.name.clone();
        identity.mentions.add_pattern(&name, factory)?;
        drop(identity);
        Ok(self)
    }

    /// Returns the compiled mention patterns in registration order.
    pub fn mention_patterns(&self) -> Vec<Regex> {
        self.inner.identity.read().mentions.patterns().to_vec()
    }

    // ─── Subscriptions ───────────────────────────────────────────────────────

    /// Subscribes `handler` to `kind` for every message passing `filter`.
    ///
    /// String filters are compiled here; a malformed pattern is returned as
    /// [`CoreError::InvalidPattern`] and nothing is registered.
    pub fn on<K, T, F, R>(&self, kind: K, filter: T, handler: F) -> CoreResult<SubscriptionId>
    where
        K: Into<EventKind>,
        T: IntoFilter,
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Ok(self.subscribe(kind.into(), filter.into_filter()?, handler, false))
    }

    /// Like [`on`](Self::on), but the subscription is removed after it fires
    /// once.
    pub fn once<K, T, F, R>(&self, kind: K, filter: T, handler: F) -> CoreResult<SubscriptionId>
    where
        K: Into<EventKind>,
        T: IntoFilter,
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Ok(self.subscribe(kind.into(), filter.into_filter()?, handler, true))
    }

    /// Subscribes `handler` to every message of `kind`.
    pub fn on_any<K, F, R>(&self, kind: K, handler: F) -> SubscriptionId
    where
        K: Into<EventKind>,
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.subscribe(kind.into(), Filter::any(), handler, false)
    }

    fn subscribe<F, R>(
        &self,
        kind: EventKind,
        filter: Filter,
        handler: F,
        once: bool,
    ) -> SubscriptionId
    where
        F: Fn(&mut Context) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        let id = self
            .inner
            .registry
            .register(kind.clone(), filter, into_handler(handler), once);
        debug!(event = %kind, subscription = %id, once, "Subscription registered");
        id
    }

    /// Removes a subscription. Removing twice is a no-op returning `false`.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.registry.unregister(id);
        if removed {
            debug!(subscription = %id, "Subscription removed");
        }
        removed
    }

    /// Returns the number of subscriptions for `kind`.
    pub fn subscription_count(&self, kind: impl Into<EventKind>) -> usize {
        self.inner.registry.len(&kind.into())
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    /// Feeds an incoming line to the robot.
    ///
    /// Always runs a `hear` pass; runs a `mention` pass afterwards if the
    /// text addresses the robot. Mention detection uses the patterns in
    /// effect when the call starts.
    pub fn hear(&self, text: &str, fields: Fields) -> &Self {
        let command = self.inner.identity.read().mentions.strip(text);
        let mut ctx = Context::new(self.clone(), text, fields);

        self.dispatch(&EventKind::Hear, &mut ctx);

        if let Some(command) = command {
            ctx.set_command(Some(command));
            self.dispatch(&EventKind::Mention, &mut ctx);
        }

        self
    }

    /// Dispatches an arbitrary event.
    pub fn emit(&self, kind: impl Into<EventKind>, text: &str, fields: Fields) -> &Self {
        let mut ctx = Context::new(self.clone(), text, fields);
        self.dispatch(&kind.into(), &mut ctx);
        self
    }

    fn dispatch(&self, kind: &EventKind, ctx: &mut Context) {
        let span = span!(Level::DEBUG, "dispatch", event = %kind);
        let _enter = span.enter();

        let report = self.inner.registry.dispatch(kind, ctx);
        debug!(
            invoked = report.invoked,
            failed = report.failures.len(),
            "Dispatch pass finished"
        );
        self.report_failures(kind, ctx, report);
    }

    fn report_failures(&self, kind: &EventKind, ctx: &Context, report: DispatchReport) {
        for failure in report.failures {
            warn!(
                event = %kind,
                subscription = %failure.subscription,
                error = %failure.error,
                "Handler failed"
            );

            if *kind == EventKind::Error {
                continue;
            }

            let mut fields = ctx.fields().clone();
            fields.insert("event".into(), Value::from(kind.as_str()));
            fields.insert(
                "subscription".into(),
                Value::from(failure.subscription.get()),
            );
            fields.insert("source_message".into(), Value::from(ctx.message()));
            self.emit(EventKind::Error, &failure.error.to_string(), fields);
        }
    }

    // ─── Output ──────────────────────────────────────────────────────────────

    /// Installs the output channel, replacing the previous one.
    pub fn set_output(&self, output: Arc<dyn OutputChannel>) -> &Self {
        *self.inner.output.write() = output;
        self
    }

    /// Returns the installed output channel.
    pub fn output(&self) -> Arc<dyn OutputChannel> {
        Arc::clone(&self.inner.output.read())
    }

    /// Sends text through the output channel.
    pub fn say(&self, text: &str, fields: &Fields) -> HandlerResult {
        self.output().say(self, text, fields)
    }

    /// Sends text addressed to the `user` in `fields`.
    pub fn reply(&self, text: &str, fields: &Fields) -> HandlerResult {
        self.output().reply(self, text, fields)
    }

    // ─── Plugins and services ────────────────────────────────────────────────

    /// Applies a plugin to this robot.
    pub fn use_plugin<P: Plugin>(&self, plugin: P) -> CoreResult<&Self> {
        self.apply_plugin(&plugin)?;
        Ok(self)
    }

    fn apply_plugin(&self, plugin: &dyn Plugin) -> CoreResult<()> {
        let name = plugin.name().into_owned();
        debug!(plugin = %name, "Applying plugin");
        plugin
            .apply(self)
            .map_err(|source| CoreError::Plugin {
                plugin: name.clone(),
                source,
            })?;
        info!(plugin = %name, "Plugin applied");
        Ok(())
    }

    /// Stores a service, replacing any previous service of the same type.
    pub fn provide<T>(&self, service: Arc<T>) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner
            .services
            .write()
            .insert(TypeId::of::<T>(), Arc::new(service));
        self
    }

    /// Looks up a service by type.
    pub fn service<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner
            .services
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<Arc<T>>())
            .map(Arc::clone)
    }

    /// Looks up a service, providing one from `init` if it is missing.
    pub fn service_or_provide<T, F>(&self, init: F) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        let mut services = self.inner.services.write();
        if let Some(existing) = services
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<Arc<T>>())
        {
            return Arc::clone(existing);
        }
        let service = init();
        services.insert(TypeId::of::<T>(), Arc::new(Arc::clone(&service)));
        service
    }
}

impl fmt::Debug for Robot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.inner.identity.read();
        f.debug_struct("Robot")
            .field("name", &identity.name)
            .field("mentions", &identity.mentions)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

/// A non-owning handle to a [`Robot`].
#[derive(Clone)]
pub struct WeakRobot {
    inner: Weak<RobotInner>,
}

impl WeakRobot {
    /// Returns the robot if it is still alive.
    pub fn upgrade(&self) -> Option<Robot> {
        self.inner.upgrade().map(|inner| Robot { inner })
    }
}

impl fmt::Debug for WeakRobot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRobot")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// =============================================================================
// RobotBuilder
// =============================================================================

/// Builder for a [`Robot`] with custom mention handling and plugins.
///
/// ```rust,ignore
/// let robot = Robot::builder()
///     .name("Hal")
///     .mention_template("%s: ")
///     .mention_pattern(templated_factory(r"^hey {name}\b"))
///     .plugin(HelpPlugin::new())
///     .build()?;
/// ```
pub struct RobotBuilder {
    name: String,
    template: String,
    default_mentions: bool,
    patterns: Vec<PatternFactory>,
    output: Option<Arc<dyn OutputChannel>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Default for RobotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            template: DEFAULT_MENTION_TEMPLATE.to_string(),
            default_mentions: true,
            patterns: Vec::new(),
            output: None,
            plugins: Vec::new(),
        }
    }

    /// Sets the robot's name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the mention template (`%s` is replaced by the nickname).
    pub fn mention_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Whether to install the built-in address patterns (default: `true`).
    pub fn default_mentions(mut self, enabled: bool) -> Self {
        self.default_mentions = enabled;
        self
    }

    /// Appends a mention pattern factory after the built-in ones.
    pub fn mention_pattern(mut self, factory: PatternFactory) -> Self {
        self.patterns.push(factory);
        self
    }

    /// Installs an output channel before plugins run.
    pub fn output(mut self, output: Arc<dyn OutputChannel>) -> Self {
        self.output = Some(output);
        self
    }

    /// Queues a plugin, applied in order by [`build`](Self::build).
    pub fn plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Builds the robot and applies queued plugins.
    pub fn build(self) -> CoreResult<Robot> {
        crate::mention::check_name(&self.name)?;
        let mut mentions = if self.default_mentions {
            MentionDetector::new(&self.name)?
        } else {
            MentionDetector::empty(DEFAULT_MENTION_TEMPLATE)
        };
        mentions.set_template(self.template);
        for factory in self.patterns {
            mentions.add_pattern(&self.name, factory)?;
        }

        let robot = Robot::from_parts(self.name, mentions);
        if let Some(output) = self.output {
            robot.set_output(output);
        }
        for plugin in &self.plugins {
            robot.apply_plugin(plugin.as_ref())?;
        }

        info!(
            name = %robot.name(),
            plugins = self.plugins.len(),
            "Robot ready"
        );
        Ok(robot)
    }
}

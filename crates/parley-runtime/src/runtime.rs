//! Runtime orchestration: configuration, robot, adapters and shutdown.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parley_runtime::ParleyRuntime;
//!
//! // Loads parley.toml from the current directory, if any
//! let mut runtime = ParleyRuntime::new()?;
//! runtime.use_plugin(HelpPlugin::new())?;
//! runtime.with_console();
//! runtime.run().await?;
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,ignore
//! let runtime = ParleyRuntime::builder()
//!     .config_file("config/parley.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use parley_core::{Plugin, Robot};
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::adapter::{Adapter, BoxedAdapter, ConsoleAdapter};
use crate::config::{ConfigLoader, ParleyConfig, validate_config};
use crate::error::{AdapterError, RuntimeError, RuntimeResult};
use crate::logging;
use crate::timers::Timers;

/// Owns a robot and the adapters that talk to it.
pub struct ParleyRuntime {
    config: ParleyConfig,
    robot: Robot,
    adapters: Vec<BoxedAdapter>,
    timers: Timers,
    shutdown: CancellationToken,
}

impl ParleyRuntime {
    /// Creates a runtime from `parley.toml` (or defaults) in the current
    /// directory, plus `PARLEY_*` environment overrides.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration.
    ///
    /// Initializes logging, validates the configuration, builds the robot and
    /// provides a [`Timers`] service to it.
    pub fn from_config(config: ParleyConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        validate_config(&config)?;

        let robot = config.robot.to_builder().build()?;
        let shutdown = CancellationToken::new();
        let timers = Timers::new(&robot, shutdown.child_token());
        robot.provide(Arc::new(timers.clone()));

        info!(
            robot = %robot.name(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            robot,
            adapters: Vec::new(),
            timers,
            shutdown,
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Returns the robot.
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Returns a handle to the runtime's timers.
    pub fn timers(&self) -> Timers {
        self.timers.clone()
    }

    /// Returns a token that stops the runtime when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Applies a plugin to the robot.
    pub fn use_plugin<P: Plugin>(&self, plugin: P) -> RuntimeResult<&Self> {
        self.robot.use_plugin(plugin)?;
        Ok(self)
    }

    /// Registers an adapter, started by [`run`](Self::run).
    pub fn register_adapter<A>(&mut self, adapter: A) -> &mut Self
    where
        A: Adapter + 'static,
    {
        info!(adapter = adapter.name(), "Registered adapter");
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Registers a stdin/stdout console adapter using the `console` settings.
    pub fn with_console(&mut self) -> &mut Self {
        let console = ConsoleAdapter::new(self.config.console.clone());
        self.register_adapter(console)
    }

    /// Returns the number of registered adapters.
    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Runs every adapter until they all finish or Ctrl+C / SIGTERM arrives.
    pub async fn run(self) -> RuntimeResult<()> {
        info!("Parley runtime is now running. Press Ctrl+C to stop.");
        self.run_until(wait_for_signal()).await
    }

    /// Runs every adapter until they all finish or `shutdown` completes.
    ///
    /// Adapters are connected, run and disconnected on their own tasks.
    /// Pending timers are cancelled before this returns. The first adapter
    /// failure, if any, is returned after every adapter has stopped.
    pub async fn run_until<F>(mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let adapters = std::mem::take(&mut self.adapters);
        info!(adapters = adapters.len(), robot = %self.robot.name(), "Starting Parley runtime");

        let mut tasks = JoinSet::new();
        for adapter in adapters {
            tasks.spawn(drive_adapter(
                adapter,
                self.robot.clone(),
                self.shutdown.child_token(),
            ));
        }

        tokio::pin!(shutdown);
        let mut stopping = false;
        let mut first_error = None;

        loop {
            tokio::select! {
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let outcome = joined
                        .map_err(|e| RuntimeError::Task(e.to_string()))
                        .and_then(|result| result);
                    if let Err(e) = outcome {
                        error!(error = %e, "Adapter stopped with an error");
                        first_error.get_or_insert(e);
                    }
                }
                () = &mut shutdown, if !stopping => {
                    info!("Shutdown requested, stopping adapters");
                    stopping = true;
                    self.shutdown.cancel();
                }
            }
        }

        self.shutdown.cancel();
        info!("Runtime stopped");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Connects, runs and disconnects one adapter.
async fn drive_adapter(
    mut adapter: BoxedAdapter,
    robot: Robot,
    shutdown: CancellationToken,
) -> RuntimeResult<()> {
    let name = adapter.name().to_string();
    let wrap = |source: AdapterError| RuntimeError::Adapter {
        adapter: name.clone(),
        source,
    };

    adapter.connect(&robot).await.map_err(wrap)?;
    info!(adapter = %name, "Adapter connected");

    let outcome = adapter.run(&robot, shutdown).await;
    if let Err(e) = adapter.disconnect(&robot).await {
        warn!(adapter = %name, error = %e, "Error during adapter disconnect");
    }
    info!(adapter = %name, "Adapter stopped");

    outcome.map_err(wrap)
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c() => {}
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `ParleyRuntime` with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ParleyConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> RuntimeResult<ParleyRuntime> {
        let config = self.config_loader.load()?;
        ParleyRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::{EventKind, Fields, HelpPlugin};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::AdapterResult;

    /// Hears a fixed script, recording what the robot says.
    struct Scripted {
        lines: Vec<&'static str>,
        said: Arc<Mutex<Vec<String>>>,
        disconnects: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Scripted {
        fn new(lines: Vec<&'static str>) -> Self {
            Self {
                lines,
                said: Arc::new(Mutex::new(Vec::new())),
                disconnects: Arc::new(AtomicUsize::new(0)),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Adapter for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn connect(&mut self, robot: &Robot) -> AdapterResult<()> {
            let said = Arc::clone(&self.said);
            robot.on_any(EventKind::Say, move |ctx| said.lock().push(ctx.message().to_string()));
            Ok(())
        }

        async fn run(&mut self, robot: &Robot, _shutdown: CancellationToken) -> AdapterResult<()> {
            for line in &self.lines {
                robot.hear(line, Fields::new());
            }
            if self.fail {
                return Err(AdapterError::NotConnected("scripted".into()));
            }
            Ok(())
        }

        async fn disconnect(&mut self, _robot: &Robot) -> AdapterResult<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Runs until cancelled.
    struct Idle;

    #[async_trait]
    impl Adapter for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        async fn connect(&mut self, _robot: &Robot) -> AdapterResult<()> {
            Ok(())
        }

        async fn run(&mut self, _robot: &Robot, shutdown: CancellationToken) -> AdapterResult<()> {
            shutdown.cancelled().await;
            Ok(())
        }
    }

    fn runtime() -> ParleyRuntime {
        ParleyRuntime::from_config(ParleyConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn runs_adapters_to_completion() {
        let mut runtime = runtime();
        runtime.use_plugin(HelpPlugin::new()).unwrap();

        let adapter = Scripted::new(vec!["hello", "@Robot help"]);
        let said = Arc::clone(&adapter.said);
        let disconnects = Arc::clone(&adapter.disconnects);
        runtime.register_adapter(adapter);
        assert_eq!(runtime.adapter_count(), 1);

        runtime.run_until(std::future::pending()).await.unwrap();

        assert_eq!(*said.lock(), vec!["@Robot help - Show this help"]);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_future_cancels_adapters_and_timers() {
        let mut runtime = runtime();
        runtime.register_adapter(Idle);

        let timers = runtime.timers();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        timers
            .after(Duration::from_secs(3600), move |_robot| {
                f.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        runtime
            .run_until(tokio::time::sleep(Duration::from_millis(10)))
            .await
            .unwrap();

        assert!(timers.is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn external_token_stops_the_runtime() {
        let mut runtime = runtime();
        runtime.register_adapter(Idle);
        let token = runtime.shutdown_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        tokio::time::timeout(
            Duration::from_secs(5),
            runtime.run_until(std::future::pending()),
        )
        .await
        .expect("runtime should stop when its token is cancelled")
        .unwrap();
    }

    #[tokio::test]
    async fn adapter_failure_is_reported_after_disconnect() {
        let mut runtime = runtime();
        let mut adapter = Scripted::new(vec!["hello"]);
        adapter.fail = true;
        let disconnects = Arc::clone(&adapter.disconnects);
        runtime.register_adapter(adapter);

        let result = runtime.run_until(std::future::pending()).await;

        assert!(matches!(
            result,
            Err(RuntimeError::Adapter { ref adapter, .. }) if adapter == "scripted"
        ));
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn timers_are_provided_to_the_robot() {
        let runtime = runtime();
        assert!(Timers::of(runtime.robot()).is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ParleyConfig::default();
        config.robot.mention_template = "no placeholder".into();
        assert!(matches!(
            ParleyRuntime::from_config(config),
            Err(RuntimeError::Config(_))
        ));
    }
}

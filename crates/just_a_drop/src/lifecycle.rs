//! Runs the long-lived tasks of the client until a shutdown signal or the
//! first task failure, then runs closers under a timeout.

use anyhow::{anyhow, Result};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type BoxFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type Task = Box<dyn FnOnce(CancellationToken) -> BoxFuture + Send>;
type Closer = Box<dyn FnOnce() -> BoxFuture + Send>;

pub struct Lifecycle {
    tasks: Vec<(String, Task)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    token: CancellationToken,
}

impl Lifecycle {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            tasks: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            token,
        }
    }

    pub fn with_task<F, Fut>(mut self, name: impl Into<String>, task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks
            .push((name.into(), Box::new(move |token| Box::pin(task(token)))));
        self
    }

    /// Closers run after every task stopped, in registration order
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(move || Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Runs until cancelled; returns the first task error, if any
    pub async fn run(self) -> Result<()> {
        let token = self.token;
        let mut tasks = JoinSet::new();

        for (name, task) in self.tasks {
            let task_token = token.clone();
            tasks.spawn(async move { (name, task(task_token).await) });
        }

        tokio::spawn(watch_signals(token.clone()));

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(()))) => debug!(task = %name, "task stopped"),
                Ok((name, Err(err))) => {
                    if !token.is_cancelled() {
                        error!(task = %name, "task failed: {:#}", err);
                        first_error.get_or_insert(err);
                        token.cancel();
                    }
                }
                Err(err) => {
                    error!("task panicked: {}", err);
                    first_error.get_or_insert(anyhow!("task panicked: {}", err));
                    token.cancel();
                }
            }
        }

        if !self.closers.is_empty() {
            let closers = run_closers(self.closers);
            if tokio::time::timeout(self.closer_timeout, closers).await.is_err() {
                error!(timeout = ?self.closer_timeout, "closers timed out");
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn run_closers(closers: Vec<Closer>) {
    for closer in closers {
        if let Err(err) = closer().await {
            warn!("closer failed: {:#}", err);
        }
    }
}

async fn watch_signals(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                return wait_ctrl_c(token).await;
            }
        };
        tokio::select! {
            _ = token.cancelled() => {}
            _ = sigterm.recv() => {
                info!("received SIGTERM");
                token.cancel();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                token.cancel();
            }
        }
    }

    #[cfg(not(unix))]
    wait_ctrl_c(token).await;
}

async fn wait_ctrl_c(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("received shutdown signal");
                token.cancel();
            }
            Err(err) => error!("failed to listen for ctrl-c: {}", err),
        }
    }
}

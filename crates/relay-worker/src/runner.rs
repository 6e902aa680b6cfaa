//! Supervises the worker's long-running processes and runs cleanup on
//! shutdown. SIGTERM/SIGINT cancel every process through a shared token;
//! closers then get a bounded window to release resources.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

type AppProcess =
    Box<dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

type Closer = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

pub struct Runner {
    processes: Vec<AppProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_app_process<F, Fut>(mut self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.processes.push(Box::new(|token| Box::pin(process(token))));
        self
    }

    /// Closers run after all processes have stopped, whatever the reason.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Run until every process finishes, one fails, or a shutdown signal
    /// arrives; then run closers and exit the process.
    pub async fn run(self) {
        let token = CancellationToken::new();
        let mut join_set = JoinSet::new();

        for process in self.processes {
            let process_token = token.clone();
            join_set.spawn(async move { process(process_token).await });
        }

        let signal_token = token.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("received shutdown signal");
            signal_token.cancel();
        });

        let mut first_error = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if first_error.is_none() {
                        error!("app process error: {:#}", err);
                        first_error = Some(err);
                    }
                    token.cancel();
                }
                Err(err) => {
                    error!("app process panicked: {}", err);
                    token.cancel();
                }
            }
        }

        if !self.closers.is_empty() {
            let closing = async {
                for closer in self.closers {
                    if let Err(err) = closer().await {
                        error!("closer error: {:#}", err);
                    }
                }
            };
            if tokio::time::timeout(self.closer_timeout, closing).await.is_err() {
                error!("closers timed out after {:?}", self.closer_timeout);
            }
        }

        if first_error.is_some() {
            error!("worker exiting with error");
            std::process::exit(1);
        }
        info!("worker exiting normally");
        std::process::exit(0);
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                // Fall back to ctrl-c alone
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_process_sees_cancellation() {
        let finished = Arc::new(AtomicBool::new(false));
        let finished_clone = finished.clone();

        let token = CancellationToken::new();
        let process_token = token.clone();
        let handle = tokio::spawn(async move {
            process_token.cancelled().await;
            finished_clone.store(true, Ordering::SeqCst);
        });

        token.cancel();
        handle.await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_closers_run_in_registration_order() {
        // run() exits the process, so exercise the closer plumbing directly
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let runner = Runner::new()
            .with_closer({
                let order = order.clone();
                move || async move {
                    order.lock().unwrap().push(1);
                    Ok(())
                }
            })
            .with_closer({
                let order = order.clone();
                move || async move {
                    order.lock().unwrap().push(2);
                    Ok(())
                }
            });

        for closer in runner.closers {
            closer().await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }
}

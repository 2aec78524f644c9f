//! Tokio runtime shared by the pagekeep binaries.
//!
//! The runtime owns one root [`CancellationToken`]. Requests receive child
//! tokens, so cancelling the root (on shutdown or Ctrl-C) reaches every
//! in-flight extraction.
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

/// Sizing knobs for [`PagekeepRuntime::build`].
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub thread_name: String,
    /// Async worker threads; `None` uses one per core.
    pub worker_threads: Option<usize>,
    /// Upper bound on threads used for HTML parsing; `None` keeps Tokio's default.
    pub max_blocking_threads: Option<usize>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            thread_name: "pagekeep-worker".to_string(),
            worker_threads: None,
            max_blocking_threads: None,
        }
    }
}

/// Cloneable view of the runtime's cancellation tree. Stage work on the
/// runtime (including `spawn_blocking` parsing) is sized by [`RuntimeOptions`].
#[derive(Clone)]
pub struct PagekeepHandle {
    cancel: CancellationToken,
}

pub struct PagekeepRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl PagekeepRuntime {
    /// Build a multi-thread runtime.
    ///
    /// ```
    /// use pagekeep_runtime::{PagekeepRuntime, RuntimeOptions};
    /// use std::time::Duration;
    ///
    /// let runtime = PagekeepRuntime::build(RuntimeOptions {
    ///     worker_threads: Some(1),
    ///     ..RuntimeOptions::default()
    /// })
    /// .expect("runtime builds");
    /// assert_eq!(runtime.block_on(async { 2 + 2 }), 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(options: RuntimeOptions) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(options.thread_name.as_str());

        if let Some(workers) = options.worker_threads {
            builder.worker_threads(workers.max(1));
        }
        if let Some(blocking) = options.max_blocking_threads {
            builder.max_blocking_threads(blocking.max(1));
        }

        let runtime = builder
            .build()
            .with_context(|| format!("building runtime `{}`", options.thread_name))?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> PagekeepHandle {
        PagekeepHandle {
            cancel: self.cancel.clone(),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel the root token when the process receives Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let cancel = self.cancel.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => {
                        tracing::info!("runtime.ctrl_c");
                        cancel.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "runtime.ctrl_c.listen_failed"),
                },
            }
        });
    }

    /// Cancel outstanding work and give tasks `graceful` to finish.
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}

impl PagekeepHandle {
    /// The root token. Cancelling it stops everything on this runtime.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A token for one request: cancelled with the root, or on its own.
    ///
    /// ```
    /// use pagekeep_runtime::{PagekeepRuntime, RuntimeOptions};
    /// use std::time::Duration;
    ///
    /// let runtime = PagekeepRuntime::build(RuntimeOptions::default()).unwrap();
    /// let token = runtime.handle().request_token();
    /// runtime.shutdown(Duration::from_millis(10));
    /// assert!(token.is_cancelled());
    /// ```
    pub fn request_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}

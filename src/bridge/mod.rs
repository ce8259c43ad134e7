//! Synchronous entry point for asynchronous agent calls.
//!
//! [`InvocationBridge::run_to_completion`] blocks the calling thread until a
//! future finishes, whatever tokio context the caller happens to be in:
//!
//! | Caller environment                      | Strategy                                        |
//! |-----------------------------------------|-------------------------------------------------|
//! | no runtime reachable                    | temporary current-thread runtime, dropped after |
//! | bridge-owned runtime, not being driven  | `block_on` on that runtime                      |
//! | inside a multi-thread runtime           | `block_in_place` + `Handle::block_on`           |
//! | inside a current-thread runtime         | scoped worker thread with its own runtime       |
//!
//! A current-thread scheduler cannot lend its thread out, and starting a
//! second runtime on a thread that is already driving one panics, so that
//! case moves the call to a dedicated thread instead.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};
use tracing::debug;

use crate::agent::AgentHandle;
use crate::error::{AgentError, ParleyError};
use crate::util::timeout::with_deadline;

/// Where a bridged call will be driven, as seen from the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnvironment {
    /// No tokio runtime is reachable from this thread.
    NoRuntime,
    /// The bridge owns a runtime and the caller is outside every runtime.
    IdleRuntime,
    /// The caller is inside, or has entered, a multi-thread runtime.
    ActiveMultiThread,
    /// The caller is inside, or has entered, a current-thread runtime.
    ActiveCurrentThread,
}

/// Runs one asynchronous agent call to completion for a synchronous caller.
#[derive(Debug, Default)]
pub struct InvocationBridge {
    runtime: Option<Runtime>,
    deadline: Option<Duration>,
}

impl InvocationBridge {
    /// A bridge that borrows whatever runtime the caller is in, or builds a
    /// temporary one per call.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge that drives calls on `runtime` whenever the caller is not
    /// already inside a runtime.
    pub fn with_runtime(runtime: Runtime) -> Self {
        Self {
            runtime: Some(runtime),
            deadline: None,
        }
    }

    /// Fail calls that take longer than `deadline` with [`AgentError::Timeout`].
    pub fn with_timeout(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Classify the calling thread's execution environment.
    pub fn environment(&self) -> ExecutionEnvironment {
        match Handle::try_current() {
            Ok(handle) => match handle.runtime_flavor() {
                RuntimeFlavor::CurrentThread => ExecutionEnvironment::ActiveCurrentThread,
                _ => ExecutionEnvironment::ActiveMultiThread,
            },
            Err(_) if self.runtime.is_some() => ExecutionEnvironment::IdleRuntime,
            Err(_) => ExecutionEnvironment::NoRuntime,
        }
    }

    /// Block until `future` completes and return its output.
    ///
    /// The configured deadline applies, and a panic inside the future is
    /// reported as [`AgentError::Runtime`] rather than unwinding into the caller.
    pub fn run_to_completion<F, T>(&self, future: F) -> Result<T, AgentError>
    where
        F: Future<Output = Result<T, AgentError>> + Send,
        T: Send,
    {
        let deadline = self.deadline;
        let guarded = async move {
            match AssertUnwindSafe(with_deadline(deadline, future))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AgentError::Runtime("agent call panicked".into())),
            }
        };

        match self.environment() {
            ExecutionEnvironment::NoRuntime => {
                let runtime = temporary_runtime()?;
                runtime.block_on(guarded)
            }
            ExecutionEnvironment::IdleRuntime => match self.runtime.as_ref() {
                Some(runtime) => runtime.block_on(guarded),
                None => temporary_runtime()?.block_on(guarded),
            },
            ExecutionEnvironment::ActiveMultiThread => {
                let handle = Handle::current();
                tokio::task::block_in_place(move || handle.block_on(guarded))
            }
            ExecutionEnvironment::ActiveCurrentThread => std::thread::scope(|scope| {
                scope
                    .spawn(move || temporary_runtime()?.block_on(guarded))
                    .join()
                    .unwrap_or_else(|_| Err(AgentError::Runtime("bridge worker panicked".into())))
            }),
        }
    }

    /// Send `message` through `handle` and wait for the reply.
    pub fn invoke(&self, handle: &AgentHandle, message: &str) -> Result<String, ParleyError> {
        debug!(
            environment = ?self.environment(),
            model = %handle.model(),
            generation = handle.generation(),
            "Invoking agent"
        );
        self.run_to_completion(handle.respond(message))
            .map_err(ParleyError::Invocation)
    }
}

impl Drop for InvocationBridge {
    fn drop(&mut self) {
        // Dropping a runtime from inside another runtime panics; detach instead.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn temporary_runtime() -> Result<Runtime, AgentError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AgentError::Runtime(format!("failed to start runtime: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn answer(value: u32) -> Result<u32, AgentError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(value)
    }

    fn owned_runtime() -> Runtime {
        Builder::new_current_thread().enable_all().build().unwrap()
    }

    #[test]
    fn plain_thread_has_no_runtime() {
        let bridge = InvocationBridge::new();
        assert_eq!(bridge.environment(), ExecutionEnvironment::NoRuntime);
        assert_eq!(bridge.run_to_completion(answer(1)).unwrap(), 1);
    }

    #[test]
    fn owned_runtime_is_idle_outside_of_it() {
        let bridge = InvocationBridge::with_runtime(owned_runtime());
        assert_eq!(bridge.environment(), ExecutionEnvironment::IdleRuntime);
        assert_eq!(bridge.run_to_completion(answer(2)).unwrap(), 2);
        assert_eq!(bridge.run_to_completion(answer(3)).unwrap(), 3);
    }

    #[test]
    fn entered_multi_thread_runtime_is_driven_directly() {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let bridge = InvocationBridge::new();
        assert_eq!(bridge.environment(), ExecutionEnvironment::ActiveMultiThread);
        assert_eq!(bridge.run_to_completion(answer(4)).unwrap(), 4);
    }

    #[tokio::test]
    async fn current_thread_runtime_uses_a_worker() {
        let bridge = InvocationBridge::new();
        assert_eq!(bridge.environment(), ExecutionEnvironment::ActiveCurrentThread);
        assert_eq!(bridge.run_to_completion(answer(5)).unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn multi_thread_runtime_nests() {
        let bridge = InvocationBridge::new();
        assert_eq!(bridge.environment(), ExecutionEnvironment::ActiveMultiThread);
        assert_eq!(bridge.run_to_completion(answer(6)).unwrap(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn nested_call_from_a_spawned_task() {
        let value = tokio::spawn(async {
            InvocationBridge::new().run_to_completion(answer(7))
        })
        .await
        .unwrap();
        assert_eq!(value.unwrap(), 7);
    }

    #[test]
    fn deadline_turns_slow_calls_into_timeouts() {
        let bridge = InvocationBridge::new().with_timeout(Duration::from_millis(20));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AgentError>(())
        };
        assert!(matches!(
            bridge.run_to_completion(slow),
            Err(AgentError::Timeout(20))
        ));
    }

    #[test]
    fn panics_are_contained() {
        let bridge = InvocationBridge::new();
        let result: Result<(), AgentError> = bridge.run_to_completion(async {
            if true {
                panic!("remote exploded");
            }
            Ok(())
        });
        assert!(matches!(result, Err(AgentError::Runtime(_))));
    }

    #[tokio::test]
    async fn dropping_an_owning_bridge_inside_a_runtime_is_safe() {
        let bridge = InvocationBridge::with_runtime(owned_runtime());
        drop(bridge);
    }
}

//! Settled-barrier fan-out: spawn one task per model, join every one of
//! them, never fail-fast, and cancel whatever is still running once a
//! deadline fires.

use crate::config::FanoutConfig;
use crate::events::FanoutEvent;
use crate::executor::Executor;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

/// What became of one model's task by the time the round settled.
#[derive(Debug)]
pub enum FanoutOutcome<T, E> {
    /// The task finished before the deadline.
    Completed { model: String, value: T },
    /// The task finished before the deadline, with an error.
    Failed { model: String, error: E },
    /// The task panicked.
    Panicked { model: String },
    /// The deadline fired before the task finished; it was aborted.
    Cancelled { model: String },
}

impl<T, E> FanoutOutcome<T, E> {
    pub fn model(&self) -> &str {
        match self {
            FanoutOutcome::Completed { model, .. } | FanoutOutcome::Failed { model, .. } | FanoutOutcome::Panicked { model } | FanoutOutcome::Cancelled { model } => model,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, FanoutOutcome::Completed { .. })
    }
}

/// Runs `tasks` (one future per model) to completion or until `deadline`
/// elapses, whichever comes first. Every model contributes exactly one
/// [`FanoutOutcome`]: this never returns early just because one task
/// failed or the fastest task finished.
pub async fn fan_out<E, T, Err, Exec>(config: &FanoutConfig, tasks: Vec<(String, E)>, deadline: Duration, executor: &Exec) -> Vec<FanoutOutcome<T, Err>>
where
    E: Future<Output = Result<T, Err>> + Send + 'static,
    T: Send + 'static,
    Err: Send + 'static,
    Exec: Executor,
{
    let attempted = tasks.len();
    let mut abort_handles = Vec::with_capacity(attempted);
    let mut in_flight = FuturesUnordered::new();

    for (model, future) in tasks {
        let handle = executor.spawn(future);
        abort_handles.push((model.clone(), handle.abort_handle()));
        in_flight.push(async move {
            let outcome = handle.await;
            (model, outcome)
        });
    }

    let sleep = tokio::time::sleep(deadline);
    tokio::pin!(sleep);

    let mut results = Vec::with_capacity(attempted);
    let mut settled: HashSet<String> = HashSet::with_capacity(attempted);

    loop {
        tokio::select! {
            biased;
            Some((model, joined)) = in_flight.next() => {
                settled.insert(model.clone());
                emit(config, FanoutEvent::TaskSettled { name: config.name.clone(), timestamp: Instant::now(), model: model.clone() });
                results.push(match joined {
                    Ok(Ok(value)) => FanoutOutcome::Completed { model, value },
                    Ok(Err(error)) => FanoutOutcome::Failed { model, error },
                    Err(_join_error) => FanoutOutcome::Panicked { model },
                });
                if in_flight.is_empty() {
                    break;
                }
            }
            _ = &mut sleep => {
                for (model, abort_handle) in &abort_handles {
                    if !settled.contains(model) {
                        abort_handle.abort();
                        emit(config, FanoutEvent::TaskCancelled { name: config.name.clone(), timestamp: Instant::now(), model: model.clone() });
                        results.push(FanoutOutcome::Cancelled { model: model.clone() });
                    }
                }
                break;
            }
        }
    }

    if !results.iter().any(|r| r.is_completed()) {
        emit(config, FanoutEvent::AllFailed { name: config.name.clone(), timestamp: Instant::now(), attempted });
    }

    results
}

fn emit(config: &FanoutConfig, event: FanoutEvent) {
    config.event_listeners.emit(&event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CurrentRuntime;
    use std::time::Duration;

    #[tokio::test]
    async fn all_tasks_settle_before_deadline() {
        let config = FanoutConfig::builder().name("round-1").build();
        let executor = CurrentRuntime::new();
        let tasks: Vec<(String, _)> = vec![
            ("a".to_string(), Box::pin(async { Ok::<_, &str>(1) }) as std::pin::Pin<Box<dyn Future<Output = Result<i32, &str>> + Send>>),
            ("b".to_string(), Box::pin(async { Err::<i32, _>("boom") })),
        ];
        let results = fan_out(&config, tasks, Duration::from_secs(5), &executor).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| matches!(r, FanoutOutcome::Completed { model, value: 1 } if model == "a")));
        assert!(results.iter().any(|r| matches!(r, FanoutOutcome::Failed { model, error: "boom" } if model == "b")));
    }

    #[tokio::test]
    async fn slow_task_is_cancelled_at_deadline() {
        let config = FanoutConfig::builder().name("round-2").build();
        let executor = CurrentRuntime::new();
        let tasks: Vec<(String, _)> = vec![
            ("fast".to_string(), Box::pin(async { Ok::<_, &str>(1) }) as std::pin::Pin<Box<dyn Future<Output = Result<i32, &str>> + Send>>),
            ("slow".to_string(), Box::pin(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, &str>(2)
            })),
        ];
        let results = fan_out(&config, tasks, Duration::from_millis(50), &executor).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| matches!(r, FanoutOutcome::Completed { model, .. } if model == "fast")));
        assert!(results.iter().any(|r| matches!(r, FanoutOutcome::Cancelled { model } if model == "slow")));
    }

    #[tokio::test]
    async fn never_fails_fast_on_first_error() {
        let config = FanoutConfig::builder().name("round-3").build();
        let executor = CurrentRuntime::new();
        let tasks: Vec<(String, _)> = vec![
            ("a".to_string(), Box::pin(async { Err::<i32, _>("early error") }) as std::pin::Pin<Box<dyn Future<Output = Result<i32, &str>> + Send>>),
            ("b".to_string(), Box::pin(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, &str>(7)
            })),
        ];
        let results = fan_out(&config, tasks, Duration::from_secs(5), &executor).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| r.is_completed()));
    }
}

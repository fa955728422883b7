use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs `work` for every job on the blocking thread pool, at most `limit` at a time.
///
/// Results come back in job order. A task that panics is turned into a result
/// by `on_failure` instead of taking the other jobs down with it.
pub async fn run_bounded<J, T, F, E>(jobs: Vec<J>, limit: usize, work: F, on_failure: E) -> Vec<T>
where
    J: Clone + Send + 'static,
    T: Send + 'static,
    F: Fn(J) -> T + Send + Sync + 'static,
    E: Fn(J, String) -> T,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let work = Arc::new(work);
    let mut handles = Vec::with_capacity(jobs.len());

    for job in jobs {
        let permit = Arc::clone(&semaphore).acquire_owned().await;
        let work = Arc::clone(&work);
        let task_job = job.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            (*work)(task_job)
        });
        handles.push((job, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => results.push(on_failure(job, e.to_string())),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_results_keep_job_order() {
        let jobs: Vec<u64> = (0..20).collect();
        let results = run_bounded(
            jobs,
            4,
            |n| {
                std::thread::sleep(std::time::Duration::from_millis(20 - n));
                n * 2
            },
            |_, _| u64::MAX,
        )
        .await;

        assert_eq!(results, (0..20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_panic_becomes_failure_result() {
        let results = run_bounded(
            vec![1, 2, 3],
            2,
            |n: i32| {
                if n == 2 {
                    panic!("boom");
                }
                Ok(n)
            },
            |n, reason| Err(format!("{} failed: {}", n, reason)),
        )
        .await;

        assert_eq!(results[0], Ok(1));
        assert!(results[1].as_ref().unwrap_err().starts_with("2 failed"));
        assert_eq!(results[2], Ok(3));
    }
}

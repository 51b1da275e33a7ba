//! Demonstration driver: submits sample tasks across two groups and prints
//! their outcomes as they resolve. Only touches the executor's public
//! operations.

use std::time::Duration;

use grouped_executor::{logging, Task, TaskError, TaskExecutor, TaskGroup, TaskType};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let executor = TaskExecutor::new(3)?;

    let reports = TaskGroup::new();
    let billing = TaskGroup::new();

    for n in 1..=6u32 {
        let group = if n % 2 == 0 { reports } else { billing };
        let task = Task::new(group, TaskType::Read, move || async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, TaskError>(format!("result-{n}"))
        });

        let handle = executor.submit(task)?;
        handle.on_complete(move |outcome| match outcome {
            Ok(value) => println!("task {n} finished: {value}"),
            Err(err) => println!("task {n} failed: {err}"),
        });
    }

    // Let the samples complete before shutting down.
    tokio::time::sleep(Duration::from_secs(4)).await;
    executor.shutdown().await;

    Ok(())
}

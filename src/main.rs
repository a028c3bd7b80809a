use std::fmt::{Debug, Display};

use letterforge::configuration::get_config;
use letterforge::scheduler::run_scheduler_until_stopped;
use letterforge::startup::Application;
use letterforge::telemetry::{get_subscriber, init_subscriber};
use tokio::task::JoinError;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("letterforge".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_config().expect("Failed to read configuration");

    let application = Application::build(config.clone()).await?;
    tracing::info!(port = application.port(), "Starting API server");

    let application_task = tokio::spawn(application.run_until_stopped());
    let scheduler_task = tokio::spawn(run_scheduler_until_stopped(config));

    // Both tasks are meant to run forever. Whichever one returns first
    // brings the process down so the orchestrator can restart it whole.
    tokio::select! {
        outcome = application_task => report_exit("API server", outcome),
        outcome = scheduler_task => report_exit("Scheduler", outcome),
    };

    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{task_name} has exited");
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{task_name} failed",
            );
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{task_name} task failed to complete",
            );
        }
    }
}

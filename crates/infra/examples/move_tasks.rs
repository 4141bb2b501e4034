//! Example: Moving tasks in a single batch request
//!
//! Loads configuration (environment first, then `tasklink.toml` /
//! `tasklink.json`), fetches the tasks to move and relocates them with one
//! batch call.
//!
//! # Setup
//!
//! 1. Export a token: ```bash export TASKLINK_API_TOKEN=... ```
//!
//! 2. Run this example: ```bash cargo run --example move_tasks -- <project-id>
//!    <task-id>... ```

use tasklink_domain::MoveTarget;
use tasklink_infra::{config, TaskClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Honors RUST_LOG, e.g. RUST_LOG=tasklink_infra=debug
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(project_id) = args.next() else {
        println!("usage: move_tasks <project-id> <task-id>...");
        return Ok(());
    };
    let ids: Vec<String> = args.collect();

    let client = TaskClient::new(config::load()?)?;

    for id in &ids {
        match client.get_task(id).await {
            Ok(task) => println!("  {} {:?} (project {:?})", task.id, task.content, task.project_id),
            Err(err) if err.http_status_code() == Some(404) => println!("  {id}: not found"),
            Err(err) => return Err(err.into()),
        }
    }

    match client.move_tasks(&ids, &MoveTarget::Project(project_id.clone()), None).await {
        Ok(moved) => println!("moved {} task(s) to {project_id}", moved.len()),
        Err(err) if err.is_auth_error() => {
            println!("token rejected ({:?})", err.http_status_code());
        }
        Err(err) => {
            eprintln!("{} error: {err}", err.kind());
            return Err(err.into());
        }
    }

    Ok(())
}

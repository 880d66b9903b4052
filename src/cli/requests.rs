//! Requests command implementation

use crate::cli::output::{format_event_json, format_requests_table};
use crate::cli::session::{follow, prepare};
use crate::cli::RequestsArgs;
use crate::session::SessionMode;
use crate::sync::SyncEvent;

/// Handle `telewire requests`
pub async fn run_requests(args: RequestsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, connector) = prepare(&args.connection)?;
    if args.capacity == Some(0) {
        return Err("--capacity must be non-zero".into());
    }

    let sync = follow(
        &config,
        connector,
        SessionMode::Requests,
        args.capacity,
        |event| {
            match event {
                SyncEvent::RequestsPrepended(requests) if args.json => {
                    for request in requests {
                        match serde_json::to_string(request) {
                            Ok(line) => println!("{}", line),
                            Err(e) => tracing::warn!(error = %e, "Failed to serialize request"),
                        }
                    }
                }
                SyncEvent::RequestsPrepended(requests) => {
                    println!("{}", format_requests_table(requests))
                }
                SyncEvent::Closed if args.json => println!("{}", format_event_json(event)),
                SyncEvent::Closed => println!("Connection closed"),
                _ => {}
            }
            None
        },
    )
    .await?;

    tracing::info!(
        held = sync.requests().len(),
        cursor = sync.request_cursor().value(),
        "Request tail ended"
    );
    Ok(())
}

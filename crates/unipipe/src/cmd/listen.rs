use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use unipipe_endpoint::{Endpoint, EndpointConfig, EndpointEvent, Message};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{endpoint_error, CliError, CliResult, SUCCESS};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let heartbeat = parse_duration(&args.heartbeat)?;
    let mut config = EndpointConfig::named(&args.name).with_heartbeat_interval(heartbeat);
    if let Some(path) = args.socket_path {
        config = config.with_socket_path(path);
    }

    let endpoint = Endpoint::server(config);
    let events = endpoint.subscribe();
    endpoint
        .start()
        .map_err(|err| endpoint_error("listen failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let event = match events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match event {
            EndpointEvent::Connected => {
                info!("peer connected");
            }
            EndpointEvent::Data(payload) => {
                if args.skip_heartbeats && is_heartbeat(&payload) {
                    continue;
                }

                print_payload(&payload, format);
                printed = printed.saturating_add(1);

                if let Some(count) = args.count {
                    if printed >= count {
                        break;
                    }
                }
            }
        }
    }

    endpoint.shutdown();
    Ok(SUCCESS)
}

fn is_heartbeat(payload: &str) -> bool {
    Message::from_json(payload)
        .map(|msg| msg.is_heartbeat())
        .unwrap_or(false)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

use std::time::{Duration, Instant};

use unipipe_endpoint::{Endpoint, EndpointConfig, Message};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{endpoint_error, CliError, CliResult, DATA_INVALID, SUCCESS, TIMEOUT, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let payload = resolve_payload(&args)?;

    let mut config = EndpointConfig::named(&args.name);
    if let Some(path) = args.socket_path {
        config = config.with_socket_path(path);
    }

    let endpoint = Endpoint::client(config);
    endpoint
        .start()
        .map_err(|err| endpoint_error("connect failed", err))?;

    let deadline = Instant::now() + timeout;
    wait_for(deadline, "connection", || endpoint.is_connected())?;

    if !endpoint.send(&payload) {
        return Err(CliError::new(
            DATA_INVALID,
            format!("payload rejected ({} bytes)", payload.len()),
        ));
    }

    // pending hits zero when the writer pops the entry; give it one more
    // tick to finish the actual write before tearing the session down.
    wait_for(deadline, "flush", || {
        endpoint.pending_messages() == 0 && endpoint.is_connected()
    })?;
    std::thread::sleep(endpoint.config().write_tick * 2);

    endpoint.shutdown();
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<String> {
    if let Some(json) = &args.json {
        let msg: Message = Message::from_json(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not a valid message: {err}")))?;
        return msg
            .to_json()
            .map_err(|err| CliError::new(USAGE, format!("--json failed to re-encode: {err}")));
    }

    let value = args.value.as_deref().unwrap_or_default();
    Message::new(&args.kind, value)
        .to_json()
        .map_err(|err| CliError::new(USAGE, format!("message failed to encode: {err}")))
}

fn wait_for(deadline: Instant, what: &str, mut pred: impl FnMut() -> bool) -> CliResult<()> {
    while Instant::now() < deadline {
        if pred() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    Err(CliError::new(TIMEOUT, format!("timed out waiting for {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with(json: Option<&str>, kind: &str, value: Option<&str>) -> SendArgs {
        SendArgs {
            name: "UnityPipe".to_string(),
            socket_path: None,
            kind: kind.to_string(),
            value: value.map(str::to_string),
            json: json.map(str::to_string),
            timeout: "5s".to_string(),
        }
    }

    #[test]
    fn kind_value_payload_is_wire_json() {
        let payload = resolve_payload(&args_with(None, "custom", Some("true"))).unwrap();
        assert_eq!(payload, r#"{"kind":"custom","value":"true"}"#);
    }

    #[test]
    fn missing_value_defaults_to_empty() {
        let payload = resolve_payload(&args_with(None, "show-window", None)).unwrap();
        assert_eq!(payload, r#"{"kind":"show-window","value":""}"#);
    }

    #[test]
    fn raw_json_must_be_a_message() {
        let ok = resolve_payload(&args_with(
            Some(r#"{"kind":"custom","value":"x"}"#),
            "custom",
            None,
        ));
        assert!(ok.is_ok());

        let err = resolve_payload(&args_with(Some(r#"{"not":"a message"}"#), "custom", None))
            .expect_err("arbitrary JSON should be rejected");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn wait_for_times_out() {
        let err = wait_for(Instant::now(), "nothing", || false).expect_err("should time out");
        assert_eq!(err.code, TIMEOUT);
    }
}

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::error::{CliError, ErrorBody};
use crate::metadata::{Metadata, RequestId};

#[derive(Debug, Serialize)]
struct SuccessOutput<'a> {
    meta: &'a Metadata,
    data: &'a Value,
}

#[derive(Debug, Serialize)]
struct ErrorOutput<'a> {
    request_id: RequestId,
    error: ErrorBody<'a>,
}

pub fn render(meta: &Metadata, data: &Value, pretty: bool) -> Result<(), CliError> {
    write_json(&SuccessOutput { meta, data }, pretty)
}

pub fn render_error(request_id: RequestId, error: &CliError, pretty: bool) -> Result<(), CliError> {
    write_json(
        &ErrorOutput {
            request_id,
            error: error.body(),
        },
        pretty,
    )
}

fn write_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    lock.write_all(rendered.as_bytes())?;
    lock.write_all(b"\n")?;
    lock.flush()?;
    Ok(())
}

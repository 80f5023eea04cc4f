use chatwire_client::{
    ChatResponse, FailureKind, SessionAnnouncement, StreamEvent, StreamHandle, StreamOutcome,
};
use std::io::{self, Write};

/// What one rendered turn produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub outcome: StreamOutcome,
    /// Session the backend stored the turn under, when it said so
    pub session_id: Option<i64>,
    /// Payloads written to the output
    pub shown: usize,
}

/// Append each payload to `out` as it arrives.
///
/// A leading session announcement is consumed, not shown. On failure before
/// anything was shown, a failure line takes the reply's place; a partial reply
/// stays as it is.
pub async fn render_stream<W: Write>(
    mut handle: StreamHandle,
    out: &mut W,
) -> io::Result<TurnReport> {
    let mut session_id = None;
    let mut shown = 0;
    let mut first = true;

    while let Some(event) = handle.next_event().await {
        match event {
            StreamEvent::Payload { content } => {
                if std::mem::take(&mut first) {
                    if let Some(announcement) = SessionAnnouncement::from_payload(&content) {
                        session_id = Some(announcement.session_id);
                        continue;
                    }
                }
                out.write_all(content.as_bytes())?;
                out.flush()?;
                shown += 1;
            }
            StreamEvent::Finished { outcome } => {
                write_ending(out, &outcome, shown)?;
                return Ok(TurnReport {
                    outcome,
                    session_id,
                    shown,
                });
            }
        }
    }

    let outcome = StreamOutcome::Failed {
        kind: FailureKind::Read,
        message: "stream ended without an outcome".to_string(),
    };
    write_ending(out, &outcome, shown)?;
    Ok(TurnReport {
        outcome,
        session_id,
        shown,
    })
}

/// Print a synchronous reply, or the failure in its place
pub fn render_reply<W: Write>(
    result: chatwire_client::Result<ChatResponse>,
    out: &mut W,
) -> io::Result<TurnReport> {
    match result {
        Ok(response) => {
            writeln!(out, "{}", response.message)?;
            Ok(TurnReport {
                outcome: StreamOutcome::Completed { payloads: 1 },
                session_id: response.session_id,
                shown: 1,
            })
        }
        Err(e) => {
            let outcome = StreamOutcome::failed(&e);
            write_ending(out, &outcome, 0)?;
            Ok(TurnReport {
                outcome,
                session_id: None,
                shown: 0,
            })
        }
    }
}

fn write_ending<W: Write>(out: &mut W, outcome: &StreamOutcome, shown: usize) -> io::Result<()> {
    match outcome {
        StreamOutcome::Completed { .. } => writeln!(out)?,
        StreamOutcome::Failed { message, .. } if shown == 0 => {
            writeln!(out, "generation failed: {}", message)?
        }
        StreamOutcome::Failed { message, .. } => {
            tracing::warn!(error = %message, shown, "Reply interrupted");
            writeln!(out)?
        }
        StreamOutcome::Cancelled { .. } if shown == 0 => writeln!(out, "[cancelled]")?,
        StreamOutcome::Cancelled { .. } => writeln!(out, "\n[cancelled]")?,
    }
    out.flush()
}

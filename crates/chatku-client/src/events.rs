use serde::Serialize;
use tracing::{debug, error};

/// Things the client asks the UI to show outside the message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UiEvent {
    /// A blocking alert.
    Alert { title: String, message: String },
}

pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: UiEvent) -> Result<(), String>;
}

/// Drops every event. For headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: UiEvent) -> Result<(), String> {
        Ok(())
    }
}

pub fn emit_event(sink: &dyn EventSink, event: UiEvent) {
    debug!(?event, "Emitting UI event");
    if let Err(e) = sink.emit(event) {
        error!(error = %e, "Failed to emit event");
    }
}

pub fn alert(sink: &dyn EventSink, title: &str, message: &str) {
    emit_event(
        sink,
        UiEvent::Alert {
            title: title.to_string(),
            message: message.to_string(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_json_shape() {
        let event = UiEvent::Alert {
            title: "Error".into(),
            message: "Gagal".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "alert");
        assert_eq!(json["message"], "Gagal");
    }

    #[test]
    fn failing_sink_is_swallowed() {
        struct Broken;
        impl EventSink for Broken {
            fn emit(&self, _event: UiEvent) -> Result<(), String> {
                Err("window closed".into())
            }
        }
        alert(&Broken, "t", "m");
    }
}

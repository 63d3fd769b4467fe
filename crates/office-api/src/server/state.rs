#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<ServerInner>>,
    stream_tx: broadcast::Sender<StreamMessage>,
}

impl AppState {
    fn new() -> Self {
        let (stream_tx, _) = broadcast::channel(4096);
        Self {
            inner: std::sync::Arc::new(Mutex::new(ServerInner::default())),
            stream_tx,
        }
    }
}

#[derive(Debug, Default)]
struct ServerInner {
    engine: Option<EngineApi>,
    emitted_event_count: usize,
}

fn require_sim(inner: &ServerInner) -> Result<&EngineApi, HttpApiError> {
    inner.engine.as_ref().ok_or_else(HttpApiError::sim_not_found)
}

fn require_sim_mut(inner: &mut ServerInner) -> Result<&mut EngineApi, HttpApiError> {
    inner.engine.as_mut().ok_or_else(HttpApiError::sim_not_found)
}

/// Frame plus any events logged since the last broadcast.
fn collect_delta_messages(inner: &mut ServerInner) -> Vec<StreamMessage> {
    let Some(engine) = inner.engine.as_ref() else {
        return Vec::new();
    };
    let mut messages = Vec::new();
    for event in engine.events_after(inner.emitted_event_count) {
        messages.push(StreamMessage::event(event.clone()));
    }
    inner.emitted_event_count = engine.events().len();
    messages.push(StreamMessage::frame(engine.render_frame()));
    messages
}

fn broadcast_all(state: &AppState, messages: Vec<StreamMessage>) {
    for message in messages {
        // Send errors only mean nobody is listening right now.
        let _ = state.stream_tx.send(message);
    }
}

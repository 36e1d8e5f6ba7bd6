use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use logscope_source::{LineStream, LogSource, SourceError};
use logscope_types::{LevelFilter, StatusMessage};

use crate::store::LogStore;
use crate::view::LineCounter;

/// Lifecycle of the live subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    /// Subscription opened, no line received yet
    Connecting,
    /// At least one line received
    Streaming,
    /// Transport failed; passes straight back to Idle
    Error,
}

impl StreamState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Error => "error",
        }
    }
}

/// Event forwarded from the stream task to the event loop
#[derive(Debug)]
pub struct StreamEvent {
    /// Subscription the event belongs to
    pub generation: u64,
    pub kind: StreamEventKind,
}

#[derive(Debug)]
pub enum StreamEventKind {
    Line(String),
    Failed(String),
    Closed,
}

/// Manages the single live subscription and feeds the store
///
/// Every subscription gets a new generation number. Events carrying an old
/// generation are dropped, so nothing reaches the store once `stop` returns.
pub struct LiveStreamController {
    state: StreamState,

    /// Cancellation token for the running task
    cancel: CancellationToken,

    /// Active stream task handle
    task: Option<tokio::task::JoinHandle<()>>,

    /// Current subscription generation
    generation: u64,

    /// Fail the subscription if no line arrives within this time
    connect_timeout: Option<Duration>,

    /// Display counter bumped per live event
    counter: LineCounter,
}

impl LiveStreamController {
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
            cancel: CancellationToken::new(),
            task: None,
            generation: 0,
            connect_timeout: None,
            counter: LineCounter::default(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Open a new subscription, tearing down any previous one first
    pub fn start<S: LogSource>(
        &mut self,
        source: &S,
        file: Option<&str>,
        level: Option<LevelFilter>,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
    ) {
        self.teardown();
        self.generation += 1;
        self.state = StreamState::Connecting;

        let level = level.filter(|l| *l != LevelFilter::All);
        info!(
            file = file.unwrap_or("<default>"),
            level = level.map(|l| l.label()).unwrap_or("ALL"),
            generation = self.generation,
            "starting live stream"
        );

        let stream = source.open_log_stream(file, level);
        let task = Self::spawn_forwarder(
            stream,
            self.generation,
            self.connect_timeout,
            self.cancel.clone(),
            event_tx,
        );
        self.task = Some(task);
    }

    fn spawn_forwarder(
        mut stream: LineStream,
        generation: u64,
        connect_timeout: Option<Duration>,
        cancel: CancellationToken,
        event_tx: mpsc::UnboundedSender<StreamEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut connected = false;

            loop {
                let limit = if connected { None } else { connect_timeout };

                tokio::select! {
                    _ = cancel.cancelled() => break,

                    item = next_item(&mut stream, limit) => {
                        let kind = match item {
                            Some(Ok(line)) => {
                                connected = true;
                                StreamEventKind::Line(line)
                            }
                            Some(Err(e)) => StreamEventKind::Failed(e.to_string()),
                            None => StreamEventKind::Closed,
                        };
                        let terminal = !matches!(kind, StreamEventKind::Line(_));

                        if event_tx.send(StreamEvent { generation, kind }).is_err() {
                            // Event loop gone, stop streaming
                            break;
                        }
                        if terminal {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Apply an event from the stream task to the store
    ///
    /// Returns a status message when the subscription ended.
    pub fn handle_event(
        &mut self,
        event: StreamEvent,
        store: &mut LogStore,
    ) -> Option<StatusMessage> {
        if event.generation != self.generation || !self.is_active() {
            trace!(generation = event.generation, "dropping stale stream event");
            return None;
        }

        match event.kind {
            StreamEventKind::Line(raw) => {
                if self.state == StreamState::Connecting {
                    debug!(generation = self.generation, "live stream connected");
                    self.state = StreamState::Streaming;
                }
                store.append_live(&raw);
                self.counter.bump();
                None
            }
            StreamEventKind::Failed(reason) => {
                warn!(%reason, "live stream failed");
                Some(self.fail())
            }
            StreamEventKind::Closed => {
                warn!("live stream closed by source");
                Some(self.fail())
            }
        }
    }

    fn fail(&mut self) -> StatusMessage {
        self.state = StreamState::Error;
        self.teardown();
        self.state = StreamState::Idle;
        StatusMessage::error("Connection to server lost")
    }

    /// Close the subscription if open. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.is_active() {
            info!(generation = self.generation, "stopping live stream");
        }
        self.teardown();
        self.state = StreamState::Idle;
    }

    fn teardown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Invalidate events already queued by the old task
        self.generation += 1;
        self.cancel = CancellationToken::new();
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Check if a subscription is open
    pub fn is_active(&self) -> bool {
        matches!(self.state, StreamState::Connecting | StreamState::Streaming)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn counter(&self) -> LineCounter {
        self.counter
    }

    pub fn counter_mut(&mut self) -> &mut LineCounter {
        &mut self.counter
    }
}

impl Default for LiveStreamController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LiveStreamController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn next_item(
    stream: &mut LineStream,
    limit: Option<Duration>,
) -> Option<Result<String, SourceError>> {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
            Ok(item) => item,
            Err(_) => Some(Err(SourceError::Timeout(limit))),
        },
        None => stream.next().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;
    use logscope_types::StoreMode;

    async fn recv(rx: &mut mpsc::UnboundedReceiver<StreamEvent>) -> StreamEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for stream event")
            .expect("stream channel closed")
    }

    #[tokio::test]
    async fn test_lines_flow_into_store() {
        let source = ScriptedSource::lines(["[INFO] one", "", "[ERROR] two"]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = LogStore::new();
        store.set_mode(StoreMode::Live);
        let mut controller = LiveStreamController::new();

        controller.start(&source, Some("app.log"), None, tx);
        assert_eq!(controller.state(), StreamState::Connecting);

        for _ in 0..3 {
            let event = recv(&mut rx).await;
            assert!(controller.handle_event(event, &mut store).is_none());
            assert_eq!(controller.state(), StreamState::Streaming);
        }

        let raws: Vec<_> = store.live_lines().map(|l| l.raw()).collect();
        assert_eq!(raws, vec!["[ERROR] two", "[INFO] one"]);
        // Blank event still counted
        assert_eq!(controller.counter().get(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_returns_to_idle() {
        let source = ScriptedSource::lines(["[INFO] one"]).failing();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = LogStore::new();
        let mut controller = LiveStreamController::new();

        controller.start(&source, None, None, tx);
        let line = recv(&mut rx).await;
        assert!(controller.handle_event(line, &mut store).is_none());

        let failure = recv(&mut rx).await;
        assert!(matches!(failure.kind, StreamEventKind::Failed(_)));
        let status = controller.handle_event(failure, &mut store).unwrap();
        assert!(status.is_error());
        assert_eq!(status.text, "Connection to server lost");
        assert_eq!(controller.state(), StreamState::Idle);
        assert_eq!(store.live_len(), 1);
    }

    #[tokio::test]
    async fn test_stream_end_is_reported() {
        let source = ScriptedSource::lines(Vec::<&str>::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = LogStore::new();
        let mut controller = LiveStreamController::new();

        controller.start(&source, None, None, tx);
        let event = recv(&mut rx).await;
        assert!(matches!(event.kind, StreamEventKind::Closed));
        assert!(controller.handle_event(event, &mut store).is_some());
        assert_eq!(controller.state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let source = ScriptedSource::hanging();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = LiveStreamController::new();

        controller.stop();
        assert_eq!(controller.state(), StreamState::Idle);

        controller.start(&source, None, None, tx);
        controller.stop();
        assert_eq!(controller.state(), StreamState::Idle);
        controller.stop();
        assert_eq!(controller.state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn test_events_after_stop_are_ignored() {
        let source = ScriptedSource::lines(["[INFO] late"]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = LogStore::new();
        let mut controller = LiveStreamController::new();

        controller.start(&source, None, None, tx);
        let event = recv(&mut rx).await;
        controller.stop();

        assert!(controller.handle_event(event, &mut store).is_none());
        assert_eq!(store.live_len(), 0);
        assert_eq!(controller.counter().get(), 0);
    }

    #[tokio::test]
    async fn test_restart_supersedes_previous_subscription() {
        let first = ScriptedSource::lines(["[INFO] old"]);
        let second = ScriptedSource::lines(["[INFO] new"]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = LogStore::new();
        let mut controller = LiveStreamController::new();

        controller.start(&first, None, None, tx.clone());
        let old_event = recv(&mut rx).await;
        let old_generation = controller.generation();

        controller.start(&second, None, None, tx);
        assert!(controller.generation() > old_generation);
        assert!(controller.handle_event(old_event, &mut store).is_none());
        assert_eq!(store.live_len(), 0);

        // Skip anything else the first task queued before it was aborted
        loop {
            let event = recv(&mut rx).await;
            if event.generation == controller.generation() {
                controller.handle_event(event, &mut store);
                break;
            }
        }
        let raws: Vec<_> = store.live_lines().map(|l| l.raw()).collect();
        assert_eq!(raws, vec!["[INFO] new"]);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let source = ScriptedSource::hanging();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = LogStore::new();
        let mut controller =
            LiveStreamController::new().with_connect_timeout(Some(Duration::from_millis(20)));

        controller.start(&source, None, None, tx);
        let event = recv(&mut rx).await;
        match &event.kind {
            StreamEventKind::Failed(reason) => assert!(reason.contains("Timeout")),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(controller.handle_event(event, &mut store).is_some());
        assert_eq!(controller.state(), StreamState::Idle);
    }

    #[tokio::test]
    async fn test_level_passed_to_source() {
        let source = ScriptedSource::lines(["[ERROR] x"]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = LiveStreamController::new();

        controller.start(&source, Some("app.log"), Some(LevelFilter::All), tx.clone());
        assert_eq!(source.last_request(), Some((Some("app.log".to_string()), None)));

        controller.start(&source, None, Some(LevelFilter::Error), tx);
        assert_eq!(source.last_request(), Some((None, Some(LevelFilter::Error))));
        controller.stop();
    }
}

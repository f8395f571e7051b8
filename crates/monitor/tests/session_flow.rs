use actuator::MockActuator;
use alerting::{spawn_worker, NotificationChannel, NotificationDispatcher, SendError};
use async_trait::async_trait;
use dms::{DmsConfig, EyeRatios, Phase};
use monitor::{run, Frame, JsonLinesSource, MonitorConfig, NoFacePolicy, Session};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const OPEN: EyeRatios = EyeRatios { left: 32.0, right: 30.0 };
const CLOSED: EyeRatios = EyeRatios { left: 12.0, right: 10.5 };

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl NotificationChannel for Inbox {
    fn name(&self) -> &'static str {
        "inbox"
    }

    async fn send(&self, message: &str) -> Result<(), SendError> {
        self.0.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct Harness {
    session: Session,
    actuator: MockActuator,
    inbox: Inbox,
    worker: tokio::task::JoinHandle<NotificationDispatcher>,
    start: Instant,
}

impl Harness {
    fn new(no_face: NoFacePolicy, actuator: MockActuator) -> Self {
        let inbox = Inbox::default();
        let mut dispatcher =
            NotificationDispatcher::new(Duration::from_secs(30), Duration::from_secs(5));
        dispatcher.add_channel(Box::new(inbox.clone()));
        let (notifier, worker) = spawn_worker(dispatcher, 4);

        let session = Session::new(
            DmsConfig::default(),
            no_face,
            Box::new(actuator.clone()),
            notifier,
        );

        Self {
            session,
            actuator,
            inbox,
            worker,
            start: Instant::now(),
        }
    }

    /// Feed the same ratios every 100ms over `[from_ms, to_ms)`
    async fn feed(&mut self, ratios: Option<EyeRatios>, from_ms: u64, to_ms: u64) {
        for ms in (from_ms..to_ms).step_by(100) {
            let frame = Frame {
                ratios,
                timestamp: self.start + Duration::from_millis(ms),
            };
            self.session.process(frame).await;
        }
    }

    async fn finish(self) -> (Vec<u8>, Vec<String>) {
        self.session.finish();
        self.worker.await.unwrap();
        let messages = self.inbox.0.lock().unwrap().clone();
        (self.actuator.written(), messages)
    }
}

#[tokio::test]
async fn onset_drives_actuator_and_notifies_once() {
    let mut harness = Harness::new(NoFacePolicy::FailOpen, MockActuator::new());

    harness.feed(Some(OPEN), 0, 1000).await;
    harness.feed(Some(CLOSED), 1000, 5000).await;
    assert_eq!(harness.session.phase(), Phase::Alerting);
    assert_eq!(harness.session.stats().onsets, 1);

    harness.feed(Some(OPEN), 5000, 8100).await;
    assert_eq!(harness.session.phase(), Phase::Normal);
    assert_eq!(harness.session.stats().releases, 1);

    let (written, messages) = harness.finish().await;

    // 10 open + 30 pending ticks before onset at 4000ms
    assert!(written[..40].iter().all(|&b| b == b'A'));
    // alerting through the closure and the first 3s of reopening
    assert!(written[40..80].iter().all(|&b| b == b'F'));
    assert_eq!(*written.last().unwrap(), b'A');
    assert_eq!(written.len(), 81);

    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Left eye ratio: 12.0"));
    assert!(messages[0].contains("Eyes closed for: 3.0s"));
}

#[tokio::test]
async fn missing_face_fails_open() {
    let mut harness = Harness::new(NoFacePolicy::FailOpen, MockActuator::new());

    harness.feed(Some(CLOSED), 0, 2000).await;
    assert_eq!(harness.session.phase(), Phase::Pending);
    harness.feed(None, 2000, 2100).await;
    assert_eq!(harness.session.phase(), Phase::Normal);

    harness.feed(Some(CLOSED), 2100, 4100).await;
    assert_eq!(harness.session.phase(), Phase::Pending);

    let stats = harness.session.stats();
    assert_eq!(stats.frames_without_face, 1);
    assert_eq!(stats.onsets, 0);
    harness.finish().await;
}

#[tokio::test]
async fn missing_face_can_hold_timers() {
    let mut harness = Harness::new(NoFacePolicy::Hold, MockActuator::new());

    harness.feed(Some(CLOSED), 0, 2000).await;
    harness.feed(None, 2000, 2500).await;
    assert_eq!(harness.session.phase(), Phase::Pending);

    // The closure timer kept running through the gap
    harness.feed(Some(CLOSED), 2500, 3100).await;
    assert_eq!(harness.session.phase(), Phase::Alerting);

    let (written, messages) = harness.finish().await;
    // Skipped frames write nothing
    assert_eq!(written.len(), 26);
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn actuator_failure_does_not_affect_decisions() {
    let mut harness = Harness::new(NoFacePolicy::FailOpen, MockActuator::failing());

    harness.feed(Some(CLOSED), 0, 3100).await;
    assert_eq!(harness.session.phase(), Phase::Alerting);
    assert_eq!(harness.session.stats().actuator_failures, 31);

    let (_, messages) = harness.finish().await;
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn second_episode_within_cooldown_is_not_sent() {
    let mut harness = Harness::new(NoFacePolicy::FailOpen, MockActuator::new());

    harness.feed(Some(CLOSED), 0, 3100).await;
    harness.feed(Some(OPEN), 3100, 6200).await;
    assert_eq!(harness.session.phase(), Phase::Normal);
    harness.feed(Some(CLOSED), 6200, 9300).await;
    assert_eq!(harness.session.stats().onsets, 2);

    let (_, messages) = harness.finish().await;
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn replay_through_run() {
    let mut input = String::new();
    for i in 0..50 {
        let t = i as f64 * 0.1;
        let (left, right) = if i < 10 { (30.0, 31.0) } else { (9.0, 8.0) };
        input.push_str(&format!(
            "{{\"left\": {}, \"right\": {}, \"t\": {:.1}}}\n",
            left, right, t
        ));
    }
    input.push_str("garbage line\n");
    input.push_str("{\"face\": false, \"t\": 5.0}\n");

    let source = JsonLinesSource::new(std::io::Cursor::new(input.into_bytes()));
    let stats = run(MonitorConfig::default(), source).await.unwrap();

    assert_eq!(stats.frames, 51);
    assert_eq!(stats.frames_without_face, 1);
    assert_eq!(stats.onsets, 1);
    assert_eq!(stats.releases, 0);
}

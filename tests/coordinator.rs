use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use announcement_core::announcement::{parse_timestamp, Announcement, AnnouncementKind, AnnouncementList};
use announcement_core::client::{AnnouncementClient, Delivery, FeedCallback};
use announcement_core::host::HostContext;
use announcement_core::transport::{AnnouncementTransport, TransportError, WikiSite};
use announcement_core::types::Card;
use async_trait::async_trait;
use tokio::sync::Notify;

enum Script {
    Ready(AnnouncementList),
    Gated(Arc<Notify>, AnnouncementList),
    Fail(u16),
}

/// Answers each wiki with a fixed script, once.
#[derive(Default)]
struct ScriptedTransport {
    scripts: Mutex<HashMap<String, Script>>,
    started: Arc<Notify>,
}

impl ScriptedTransport {
    fn with(self, wiki: &WikiSite, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(wiki.authority().to_string(), script);
        self
    }
}

#[async_trait]
impl AnnouncementTransport for ScriptedTransport {
    async fn fetch(&self, wiki: &WikiSite) -> Result<AnnouncementList, TransportError> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .remove(wiki.authority())
            .expect("unexpected fetch");
        self.started.notify_one();
        match script {
            Script::Ready(list) => Ok(list),
            Script::Gated(gate, list) => {
                gate.notified().await;
                Ok(list)
            }
            Script::Fail(status) => Err(TransportError::Status {
                status,
                body: "upstream unavailable".into(),
            }),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Event {
    Success(Vec<String>),
    Error(String),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    delivered: Notify,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    async fn wait(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.delivered.notified())
            .await
            .expect("callback never fired");
    }
}

impl FeedCallback for Recorder {
    fn success(&self, cards: Vec<Card>) {
        let ids = cards
            .iter()
            .map(|c| c.announcement().id.as_str().to_string())
            .collect();
        self.events.lock().unwrap().push(Event::Success(ids));
        self.delivered.notify_one();
    }

    fn error(&self, cause: TransportError) {
        self.events.lock().unwrap().push(Event::Error(cause.to_string()));
        self.delivered.notify_one();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn make_ctx() -> HostContext {
    HostContext::new("US", parse_timestamp("2024-07-01T00:00Z").unwrap(), 700)
}

fn make_list(ids: &[&str]) -> AnnouncementList {
    ids.iter()
        .map(|id| Announcement {
            platforms: vec!["AndroidApp".into()],
            countries: vec!["US".into()],
            ..Announcement::new(*id)
        })
        .collect::<Vec<_>>()
        .into()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn success_delivers_selected_cards() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let mut list = make_list(&["a", "b"]);
    list.items[1].countries = vec!["FR".into()];
    list.items[0].kind = AnnouncementKind::Survey;
    let transport = ScriptedTransport::default().with(&wiki, Script::Ready(list));
    let mut client = AnnouncementClient::new(transport, make_ctx());
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    recorder.wait().await;

    assert_eq!(recorder.events(), vec![Event::Success(vec!["a".into()])]);
}

#[tokio::test]
async fn empty_list_is_success() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let transport = ScriptedTransport::default().with(&wiki, Script::Ready(AnnouncementList::default()));
    let mut client = AnnouncementClient::new(transport, make_ctx()).with_delivery(Delivery::Immediate);
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    recorder.wait().await;

    assert_eq!(recorder.events(), vec![Event::Success(vec![])]);
}

#[tokio::test]
async fn second_request_supersedes_first() {
    init_tracing();
    let first_wiki = WikiSite::for_language("first");
    let second_wiki = WikiSite::for_language("second");
    let gate = Arc::new(Notify::new());
    let transport = ScriptedTransport::default()
        .with(&first_wiki, Script::Gated(gate.clone(), make_list(&["old"])))
        .with(&second_wiki, Script::Ready(make_list(&["new"])));
    let started = transport.started.clone();
    let mut client = AnnouncementClient::new(transport, make_ctx());
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());

    client.request(first_wiki, first.clone());
    started.notified().await;
    client.request(second_wiki, second.clone());
    second.wait().await;

    gate.notify_one();
    settle().await;

    assert_eq!(second.events(), vec![Event::Success(vec!["new".into()])]);
    assert!(first.events().is_empty(), "superseded request must not call back");
}

#[tokio::test]
async fn cancel_before_completion_fires_nothing() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let gate = Arc::new(Notify::new());
    let transport = ScriptedTransport::default().with(&wiki, Script::Gated(gate.clone(), make_list(&["a"])));
    let started = transport.started.clone();
    let mut client = AnnouncementClient::new(transport, make_ctx());
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    started.notified().await;
    assert!(client.is_in_flight());

    client.cancel();
    assert!(!client.is_in_flight());
    gate.notify_one();
    settle().await;

    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn cancel_during_posted_delay_fires_nothing() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let transport = ScriptedTransport::default().with(&wiki, Script::Ready(make_list(&["a"])));
    let started = transport.started.clone();
    let mut client = AnnouncementClient::new(transport, make_ctx()).with_delivery(Delivery::Posted {
        delay: Duration::from_millis(100),
    });
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    started.notified().await;
    client.cancel();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn cancel_is_idempotent() {
    init_tracing();
    let mut client = AnnouncementClient::new(ScriptedTransport::default(), make_ctx());

    client.cancel();
    client.cancel();

    assert!(!client.is_in_flight());
}

#[tokio::test]
async fn transport_failure_reports_error() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let transport = ScriptedTransport::default().with(&wiki, Script::Fail(503));
    let snapshots = Arc::new(AtomicUsize::new(0));
    let counter = snapshots.clone();
    let host = move || {
        counter.fetch_add(1, Ordering::SeqCst);
        make_ctx()
    };
    let mut client = AnnouncementClient::new(transport, host);
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    recorder.wait().await;

    assert_eq!(
        recorder.events(),
        vec![Event::Error("server returned 503: upstream unavailable".into())]
    );
    assert_eq!(snapshots.load(Ordering::SeqCst), 0, "no host snapshot without a list");
}

#[tokio::test]
async fn host_snapshot_taken_per_request() {
    init_tracing();
    let first_wiki = WikiSite::for_language("first");
    let second_wiki = WikiSite::for_language("second");
    let transport = ScriptedTransport::default()
        .with(&first_wiki, Script::Ready(make_list(&["a"])))
        .with(&second_wiki, Script::Ready(make_list(&["b"])));
    let snapshots = Arc::new(AtomicUsize::new(0));
    let counter = snapshots.clone();
    // The second snapshot moves the host to a country nothing targets.
    let host = move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let ctx = make_ctx();
        if n == 0 {
            ctx
        } else {
            HostContext::new("JP", ctx.now, ctx.version_code)
        }
    };
    let mut client = AnnouncementClient::new(transport, host);
    let recorder = Arc::new(Recorder::default());

    client.request(first_wiki, recorder.clone());
    recorder.wait().await;
    client.request(second_wiki, recorder.clone());
    recorder.wait().await;

    assert_eq!(
        recorder.events(),
        vec![Event::Success(vec!["a".into()]), Event::Success(vec![])]
    );
    assert_eq!(snapshots.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dropping_client_cancels_call() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let gate = Arc::new(Notify::new());
    let transport = ScriptedTransport::default().with(&wiki, Script::Gated(gate.clone(), make_list(&["a"])));
    let started = transport.started.clone();
    let mut client = AnnouncementClient::new(transport, make_ctx());
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    started.notified().await;
    drop(client);
    gate.notify_one();
    settle().await;

    assert!(recorder.events().is_empty());
}

type SharedClient = Arc<Mutex<Option<AnnouncementClient<ScriptedTransport, HostContext>>>>;

enum Reentry {
    Cancel,
    Request(WikiSite, Arc<Recorder>),
    Drop,
}

/// Reaches back into the client that called it before recording the cards.
struct ReentrantCallback {
    client: SharedClient,
    reentry: Mutex<Option<Reentry>>,
    in_flight_seen: Mutex<Option<bool>>,
    recorder: Arc<Recorder>,
}

impl ReentrantCallback {
    fn new(client: &SharedClient, reentry: Reentry) -> Arc<Self> {
        Arc::new(Self {
            client: client.clone(),
            reentry: Mutex::new(Some(reentry)),
            in_flight_seen: Mutex::new(None),
            recorder: Arc::new(Recorder::default()),
        })
    }
}

impl FeedCallback for ReentrantCallback {
    fn success(&self, cards: Vec<Card>) {
        let mut slot = self.client.lock().unwrap();
        *self.in_flight_seen.lock().unwrap() = slot.as_ref().map(|client| client.is_in_flight());
        match self.reentry.lock().unwrap().take() {
            Some(Reentry::Cancel) => {
                if let Some(client) = slot.as_mut() {
                    client.cancel();
                }
            }
            Some(Reentry::Request(wiki, next)) => {
                if let Some(client) = slot.as_mut() {
                    client.request(wiki, next);
                }
            }
            Some(Reentry::Drop) => drop(slot.take()),
            None => {}
        }
        drop(slot);
        self.recorder.success(cards);
    }

    fn error(&self, cause: TransportError) {
        self.recorder.error(cause);
    }
}

fn shared_client(transport: ScriptedTransport) -> SharedClient {
    let client = AnnouncementClient::new(transport, make_ctx()).with_delivery(Delivery::Immediate);
    Arc::new(Mutex::new(Some(client)))
}

fn request_on(client: &SharedClient, wiki: WikiSite, callback: Arc<ReentrantCallback>) {
    client.lock().unwrap().as_mut().unwrap().request(wiki, callback);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callback_may_cancel_its_own_client() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let client = shared_client(ScriptedTransport::default().with(&wiki, Script::Ready(make_list(&["a"]))));
    let callback = ReentrantCallback::new(&client, Reentry::Cancel);

    request_on(&client, wiki, callback.clone());
    callback.recorder.wait().await;

    assert_eq!(callback.recorder.events(), vec![Event::Success(vec!["a".into()])]);
    assert_eq!(*callback.in_flight_seen.lock().unwrap(), Some(false));
    assert!(!client.lock().unwrap().as_ref().unwrap().is_in_flight());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callback_may_request_again() {
    init_tracing();
    let first_wiki = WikiSite::for_language("first");
    let second_wiki = WikiSite::for_language("second");
    let transport = ScriptedTransport::default()
        .with(&first_wiki, Script::Ready(make_list(&["a"])))
        .with(&second_wiki, Script::Ready(make_list(&["b"])));
    let client = shared_client(transport);
    let next = Arc::new(Recorder::default());
    let callback = ReentrantCallback::new(&client, Reentry::Request(second_wiki, next.clone()));

    request_on(&client, first_wiki, callback.clone());
    callback.recorder.wait().await;
    next.wait().await;

    assert_eq!(callback.recorder.events(), vec![Event::Success(vec!["a".into()])]);
    assert_eq!(next.events(), vec![Event::Success(vec!["b".into()])]);
    assert!(!client.lock().unwrap().as_ref().unwrap().is_in_flight());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callback_may_drop_its_own_client() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let client = shared_client(ScriptedTransport::default().with(&wiki, Script::Ready(make_list(&["a"]))));
    let callback = ReentrantCallback::new(&client, Reentry::Drop);

    request_on(&client, wiki, callback.clone());
    callback.recorder.wait().await;

    assert_eq!(callback.recorder.events(), vec![Event::Success(vec!["a".into()])]);
    assert!(client.lock().unwrap().is_none());
}

#[tokio::test]
async fn not_in_flight_after_delivery() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let transport = ScriptedTransport::default().with(&wiki, Script::Ready(make_list(&["a"])));
    let mut client = AnnouncementClient::new(transport, make_ctx());
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    assert!(client.is_in_flight());
    recorder.wait().await;

    assert!(!client.is_in_flight());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn not_in_flight_after_delivery_multi_thread() {
    init_tracing();
    let wiki = WikiSite::for_language("en");
    let transport = ScriptedTransport::default().with(&wiki, Script::Fail(500));
    let mut client = AnnouncementClient::new(transport, make_ctx()).with_delivery(Delivery::Immediate);
    let recorder = Arc::new(Recorder::default());

    client.request(wiki, recorder.clone());
    recorder.wait().await;

    assert!(!client.is_in_flight());
    assert_eq!(recorder.events().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_requests_deliver_at_most_once() {
    init_tracing();
    let wikis: Vec<_> = (0..32).map(|i| WikiSite::for_language(&format!("w{i}"))).collect();
    let transport = wikis.iter().enumerate().fold(ScriptedTransport::default(), |transport, (i, wiki)| {
        let id = format!("card{i}");
        transport.with(wiki, Script::Ready(make_list(&[id.as_str()])))
    });
    let mut client = AnnouncementClient::new(transport, make_ctx()).with_delivery(Delivery::Immediate);
    let recorders: Vec<_> = wikis.iter().map(|_| Arc::new(Recorder::default())).collect();

    for (i, (wiki, recorder)) in wikis.iter().zip(&recorders).enumerate() {
        client.request(wiki.clone(), recorder.clone());
        if i % 3 == 0 {
            client.cancel();
        }
    }
    let last = recorders.last().unwrap();
    last.wait().await;
    settle().await;

    for (i, recorder) in recorders.iter().enumerate() {
        let events = recorder.events();
        assert!(events.len() <= 1, "request {i} delivered {} times", events.len());
        if let Some(event) = events.first() {
            assert_eq!(*event, Event::Success(vec![format!("card{i}")]));
        }
    }
    assert!(!client.is_in_flight());
}

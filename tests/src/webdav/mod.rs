/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ahash::AHashSet;
use dav_report::{
    DavResponse as ReportResponse,
    config::DavConfig,
    content::DavContent,
    report::{DavServer, ReportRequest, ReportRequestHandler},
    storage::{
        CollectionKind, DavCollection, DavItem, DavNode, DavStorage, StorageError, StorageLock,
    },
};
use hyper::StatusCode;
use parking_lot::Mutex;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::{borrow::Cow, io, str, sync::Arc, time::Instant};

pub mod card_query;

#[test]
fn webdav_tests() {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            let start_time = Instant::now();

            basic::test().await;
            cal_query::test().await;
            card_query::test().await;
            multiget::test().await;
            sync::test().await;

            // Print elapsed time
            let elapsed = start_time.elapsed();
            println!(
                "Elapsed: {}.{:03}s",
                elapsed.as_secs(),
                elapsed.subsec_millis()
            );
        });
}

/// Calls made into the storage collaborator, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    Lock { path: String, principal: String },
    Discover(String),
    Kind(String),
    Items(String),
    Release,
}

type EventLog = Arc<Mutex<Vec<StorageEvent>>>;

#[derive(Default)]
pub struct MemoryStorage {
    collections: Vec<MemoryCollection>,
    events: EventLog,
    offline: bool,
}

#[derive(Clone)]
pub struct MemoryCollection {
    path: String,
    kind: Option<CollectionKind>,
    items: Vec<MemoryItem>,
    events: EventLog,
}

#[derive(Debug, Clone)]
pub struct MemoryItem {
    href: String,
    etag: String,
    body: String,
    content: DavContent,
}

pub struct MemoryLock<'x> {
    storage: &'x MemoryStorage,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(
        mut self,
        path: &str,
        kind: Option<CollectionKind>,
        items: impl IntoIterator<Item = MemoryItem>,
    ) -> Self {
        self.collections.push(MemoryCollection {
            path: path.trim_matches('/').to_string(),
            kind,
            items: items.into_iter().collect(),
            events: self.events.clone(),
        });
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn record(&self, event: StorageEvent) {
        self.events.lock().push(event);
    }
}

impl MemoryItem {
    pub fn new(href: &str, etag: &str, body: &str) -> Self {
        MemoryItem {
            href: href.to_string(),
            etag: etag.to_string(),
            body: body.to_string(),
            content: DavContent::parse(body).unwrap(),
        }
    }
}

impl DavStorage for MemoryStorage {
    type Item = MemoryItem;
    type Collection = MemoryCollection;
    type Lock<'x> = MemoryLock<'x>;

    fn acquire_read_lock(
        &self,
        path: &str,
        principal: &str,
    ) -> Result<Self::Lock<'_>, StorageError> {
        self.record(StorageEvent::Lock {
            path: path.to_string(),
            principal: principal.to_string(),
        });

        if self.offline {
            Err(StorageError::Lock("storage is offline".to_string()))
        } else {
            Ok(MemoryLock { storage: self })
        }
    }
}

impl StorageLock for MemoryLock<'_> {
    type Collection = MemoryCollection;

    fn discover(&self, path: &str) -> Result<Option<DavNode<MemoryCollection>>, StorageError> {
        self.storage.record(StorageEvent::Discover(path.to_string()));

        let path = path.trim_matches('/');
        for collection in &self.storage.collections {
            if collection.path == path {
                return Ok(Some(DavNode::Collection(collection.clone())));
            }

            if let Some((parent, name)) = path.rsplit_once('/') {
                if parent == collection.path && collection.items.iter().any(|i| i.href == name) {
                    return Ok(Some(DavNode::Item {
                        collection: collection.clone(),
                        href: name.to_string(),
                    }));
                }
            }
        }

        Ok(None)
    }
}

impl Drop for MemoryLock<'_> {
    fn drop(&mut self) {
        self.storage.record(StorageEvent::Release);
    }
}

impl DavCollection for MemoryCollection {
    type Item = MemoryItem;

    fn kind(&self) -> Option<CollectionKind> {
        self.events
            .lock()
            .push(StorageEvent::Kind(self.path.clone()));
        self.kind
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn items(&self) -> Result<Vec<MemoryItem>, StorageError> {
        self.events
            .lock()
            .push(StorageEvent::Items(self.path.clone()));
        Ok(self.items.clone())
    }
}

impl DavItem for MemoryItem {
    fn href(&self) -> &str {
        &self.href
    }

    fn etag(&self) -> &str {
        &self.etag
    }

    fn serialize(&self) -> String {
        self.body.clone()
    }

    fn content(&self) -> &DavContent {
        &self.content
    }
}

pub struct ReportTest {
    server: Arc<DavServer<MemoryStorage>>,
    events: EventLog,
    base_prefix: &'static str,
}

impl ReportTest {
    pub fn new(storage: MemoryStorage) -> Self {
        Self::with_config(storage, DavConfig::default())
    }

    pub fn with_config(storage: MemoryStorage, config: DavConfig) -> Self {
        let events = storage.events.clone();
        ReportTest {
            server: Arc::new(DavServer::new(storage, config)),
            events,
            base_prefix: "",
        }
    }

    pub fn with_base_prefix(mut self, base_prefix: &'static str) -> Self {
        self.base_prefix = base_prefix;
        self
    }

    pub async fn report(&self, path: &str, body: impl Into<String>) -> DavResponse {
        let body = body.into().into_bytes();
        self.report_with_body(path, async move { Ok(body) }).await
    }

    pub async fn report_with_body<B>(&self, path: &str, body: B) -> DavResponse
    where
        B: Future<Output = io::Result<Vec<u8>>> + Send,
    {
        self.events.lock().clear();
        let response = self
            .server
            .handle_report_request(ReportRequest {
                path: path.to_string(),
                principal: "john".to_string(),
                base_prefix: self.base_prefix.to_string(),
                body,
            })
            .await;
        self.assert_lock_discipline();

        DavResponse::from(response)
    }

    /// Runs the request on a separate task, which requires the handler
    /// future to be `Send`.
    pub async fn report_spawned(&self, path: &str, body: &str) -> DavResponse {
        let server = self.server.clone();
        let request = ReportRequest {
            path: path.to_string(),
            principal: "john".to_string(),
            base_prefix: self.base_prefix.to_string(),
            body: std::future::ready(Ok(body.as_bytes().to_vec())),
        };

        DavResponse::from(
            tokio::spawn(async move { server.handle_report_request(request).await })
                .await
                .unwrap(),
        )
    }

    pub fn events(&self) -> Vec<StorageEvent> {
        self.events.lock().clone()
    }

    // The lock is taken at most once and nothing reaches the storage
    // after it is released.
    fn assert_lock_discipline(&self) {
        let events = self.events();
        let locks = events
            .iter()
            .filter(|event| matches!(event, StorageEvent::Lock { .. }))
            .count();
        let releases = events
            .iter()
            .filter(|event| matches!(event, StorageEvent::Release))
            .count();

        if locks == 0 {
            assert!(events.is_empty(), "Storage used without a lock: {events:?}");
        } else {
            assert_eq!(locks, 1, "{events:?}");
            if releases == 1 {
                assert_eq!(events.last(), Some(&StorageEvent::Release), "{events:?}");
            } else {
                // A failed acquisition hands out no guard.
                assert_eq!(releases, 0, "{events:?}");
                assert_eq!(events.len(), 1, "{events:?}");
            }
        }
    }
}

pub struct DavResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
    xml: Vec<(String, String)>,
}

impl From<ReportResponse> for DavResponse {
    fn from(response: ReportResponse) -> Self {
        let encoding = response
            .content_type
            .as_deref()
            .and_then(|content_type| content_type.split_once("charset="))
            .and_then(|(_, charset)| encoding_rs::Encoding::for_label(charset.trim().as_bytes()))
            .unwrap_or(encoding_rs::UTF_8);
        let body = encoding
            .decode_without_bom_handling(&response.body)
            .0
            .into_owned();
        let xml = if response
            .content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("text/xml"))
        {
            flatten_xml(&body)
        } else {
            vec![]
        };

        DavResponse {
            status: response.status,
            content_type: response.content_type,
            body,
            xml,
        }
    }
}

impl DavResponse {
    pub fn with_status(self, status: StatusCode) -> Self {
        if self.status != status {
            self.dump_response();
            panic!("Expected {status} but got {}", self.status)
        }
        self
    }

    pub fn with_content_type(self, content_type: &str) -> Self {
        if self.content_type.as_deref() != Some(content_type) {
            self.dump_response();
            panic!(
                "Expected content type {content_type:?} but got {:?}",
                self.content_type
            )
        }
        self
    }

    pub fn with_body_containing(self, text: &str) -> Self {
        if !self.body.contains(text) {
            self.dump_response();
            panic!("Expected body containing {text:?}");
        }
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn sync_token(&self) -> &str {
        self.find_keys("D:multistatus.D:sync-token")
            .next()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                self.dump_response();
                panic!("Sync token not found.")
            })
    }

    /// Response hrefs in document order.
    pub fn hrefs(&self) -> Vec<&str> {
        self.find_keys("D:multistatus.D:response.D:href")
            .collect::<Vec<_>>()
    }

    pub fn with_href_count(self, count: usize) -> Self {
        let href_count = self.find_keys("D:multistatus.D:response.D:href").count();
        if href_count != count {
            self.dump_response();
            panic!("Expected {} hrefs but got {}", count, href_count);
        }
        self
    }

    pub fn with_hrefs<'x>(self, hrefs: impl IntoIterator<Item = &'x str>) -> Self {
        let expected_hrefs = hrefs.into_iter().collect::<Vec<_>>();
        let hrefs = self.hrefs();
        if expected_hrefs != hrefs {
            self.dump_response();

            let expected_set = expected_hrefs.iter().collect::<AHashSet<_>>();
            let found_set = hrefs.iter().collect::<AHashSet<_>>();
            println!("\nMissing: {:?}", expected_set.difference(&found_set));
            println!("\nExtra: {:?}", found_set.difference(&expected_set));

            panic!("Expected hrefs {expected_hrefs:?} but got {hrefs:?}");
        }
        self
    }

    /// Element keys in document order, attributes excluded.
    pub fn elements(&self) -> Vec<&str> {
        self.xml
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(|key| !key.contains(".["))
            .collect()
    }

    pub fn with_no_children(self) -> Self {
        if !self.elements().is_empty() || !self.body.contains("<D:multistatus") {
            self.dump_response();
            panic!("Expected an empty multistatus");
        }
        self
    }

    pub fn with_first_element(self, key: &str) -> Self {
        if self.elements().first() != Some(&key) {
            self.dump_response();
            panic!("Expected {key} to be the first element");
        }
        self
    }

    fn dump_response(&self) {
        eprintln!("-------------------------------------");
        eprintln!("Status: {}", self.status);
        eprintln!("Content-Type: {:?}", self.content_type);
        eprintln!("Body: {}", self.body);

        for (key, value) in self.xml.iter() {
            eprintln!("{} -> {:?}", key, value);
        }
    }

    fn find_keys(&self, name: &str) -> impl Iterator<Item = &str> {
        self.xml
            .iter()
            .filter(move |(key, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn value(&self, name: &str) -> &str {
        self.find_keys(name).next().unwrap_or_else(|| {
            self.dump_response();
            panic!("Key {name} not found.")
        })
    }

    // Poor man's XPath
    pub fn with_value(self, query: &str, expect: impl AsRef<str>) -> Self {
        let expect = expect.as_ref();
        if let Some(value) = self.find_keys(query).next() {
            if value != expect {
                self.dump_response();
                panic!("Expected {query} = {expect:?} but got {value:?}");
            }
        } else {
            self.dump_response();
            panic!("Key {query} not found.");
        }
        self
    }

    pub fn with_values<I, T>(self, query: &str, expect: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let expect_owned: Vec<T> = expect.into_iter().collect();
        let expect = expect_owned.iter().map(|s| s.as_ref()).collect::<Vec<_>>();
        let found = self.find_keys(query).collect::<Vec<_>>();
        if expect != found {
            self.dump_response();
            panic!("Expected {query} = {expect:?} but got {found:?}");
        }
        self
    }
}

fn flatten_xml(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<String> = Vec::new();
    let mut result: Vec<(String, String)> = Vec::new();
    let mut buf = Vec::new();
    let mut text_content: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf).unwrap() {
            Event::Start(ref e) => {
                let name = str::from_utf8(e.name().as_ref()).unwrap().to_string();
                path.push(name);
                let base_path = path.join(".");
                for attr in e.attributes() {
                    let attr = attr.unwrap();
                    let key = str::from_utf8(attr.key.as_ref()).unwrap().to_string();
                    let value = attr.unescape_value().unwrap();
                    let value_str = value.trim().to_string();

                    result.push((format!("{}.[{}]", base_path, key), value_str));
                }
                text_content = None;
            }
            Event::Empty(ref e) => {
                let name = str::from_utf8(e.name().as_ref()).unwrap().to_string();
                let base_path = format!("{}.{}", path.join("."), name);
                let mut has_attrs = false;

                for attr in e.attributes() {
                    let attr = attr.unwrap();
                    let key = str::from_utf8(attr.key.as_ref()).unwrap().to_string();
                    let value = attr.unescape_value().unwrap();
                    let value_str = value.trim().to_string();
                    has_attrs = true;
                    result.push((format!("{}.[{}]", base_path, key), value_str));
                }

                if !has_attrs {
                    result.push((base_path, "".to_string()));
                }
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(text_content) = text_content.as_mut() {
                        text_content.push_str(trimmed);
                    } else {
                        text_content = Some(trimmed.to_string());
                    }
                }
            }
            Event::GeneralRef(entity) => {
                let name: &[u8] = &entity;
                let value: Cow<str> = match name {
                    b"lt" => "<".into(),
                    b"gt" => ">".into(),
                    b"amp" => "&".into(),
                    b"apos" => "'".into(),
                    b"quot" => "\"".into(),
                    _ => {
                        if let Ok(Some(gr)) = entity.resolve_char_ref() {
                            gr.to_string().into()
                        } else {
                            std::str::from_utf8(name).unwrap_or_default().into()
                        }
                    }
                };

                if let Some(text_content) = text_content.as_mut() {
                    text_content.push_str(value.as_ref());
                } else {
                    text_content = Some(value.into_owned());
                }
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref()).unwrap();
                if let Some(text_content) = text_content.as_mut() {
                    text_content.push_str(text);
                } else {
                    text_content = Some(text.to_string());
                }
            }
            Event::End(_) => {
                if let Some(text) = text_content.take() {
                    result.push((path.join("."), text));
                }

                if !path.is_empty() {
                    path.pop();
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    result
}

pub const TEST_VCARD_1: &str = r#"BEGIN:VCARD
VERSION:4.0
UID:18F098B5-7383-4FD6-B482-48F2181D73AA
N:Coyote;Wile;E.;;
FN:Wile E. Coyote
ORG:ACME Inc.;
EMAIL;TYPE=work;X-LABEL=Office:wile@acme.example.com
END:VCARD
"#;

pub const TEST_VCARD_2: &str = r#"BEGIN:VCARD
VERSION:4.0
UID:6exhjr32bt783wwlr9u0sr8lfqse5x7zqc8y
FN:Joe Citizen
N:Citizen;Joe;;;
NICKNAME:human_being
EMAIL;TYPE=pref:jcitizen@foo.com
REV:20200411T072429Z
END:VCARD
"#;

pub const TEST_VCARD_3: &str = r#"BEGIN:VCARD
VERSION:4.0
UID:urn:uuid:4fbe8971-0bc3-424c-9c26-36c3e1eff6b1
FN:Jane Doe
N:Doe;Jane;;;
item1.EMAIL;TYPE=home:jane@doe.example.org
TEL;TYPE=cell:+1-555-0100
END:VCARD
"#;

pub const TEST_ICAL_1: &str = r#"BEGIN:VCALENDAR
SOURCE;VALUE=URI:http://calendar.example.com/event_with_html.ics
BEGIN:VEVENT
UID: 2371c2d9-a136-43b0-bba3-f6ab249ad46e
SUMMARY:What a nice present: üéÅ
DTSTART;TZID=America/New_York:20190221T170000
DTEND;TZID=America/New_York:20190221T180000
LOCATION:Germany
DESCRIPTION:<html><body><h1>Title</h1><p><ul><li><b>first</b> Row </li><li><
 i>second</i> Row</li></ul></p></body></html>
END:VEVENT
END:VCALENDAR
"#;

pub const TEST_ICAL_2: &str = r#"BEGIN:VCALENDAR
BEGIN:VEVENT
UID:0000001
SUMMARY:Treasure Hunting
DTSTART;TZID=America/Los_Angeles:20150706T120000
DTEND;TZID=America/Los_Angeles:20150706T130000
RRULE:FREQ=DAILY;COUNT=10
EXDATE;TZID=America/Los_Angeles:20150708T120000
EXDATE;TZID=America/Los_Angeles:20150710T120000
END:VEVENT
BEGIN:VEVENT
UID:0000001
SUMMARY:More Treasure Hunting
LOCATION:The other island
DTSTART;TZID=America/Los_Angeles:20150709T150000
DTEND;TZID=America/Los_Angeles:20150707T160000
RECURRENCE-ID;TZID=America/Los_Angeles:20150707T120000
END:VEVENT
END:VCALENDAR
"#;

pub const TEST_ICAL_TODO: &str = r#"BEGIN:VCALENDAR
PRODID:-//Example Corp.//CalDAV Client//EN
VERSION:2.0
BEGIN:VTIMEZONE
TZID:US-Eastern
LAST-MODIFIED:19870101T000000Z
END:VTIMEZONE
BEGIN:VTODO
UID:todo-2024-01
SUMMARY:Submit quarterly report
DTSTART;VALUE=DATE:20240110
DUE;VALUE=DATE:20240115
STATUS:NEEDS-ACTION
BEGIN:VALARM
ACTION:DISPLAY
TRIGGER:-PT15M
DESCRIPTION:Report due soon
END:VALARM
END:VTODO
END:VCALENDAR
"#;

pub fn calendar_storage() -> MemoryStorage {
    MemoryStorage::new().with_collection(
        "john/calendar",
        Some(CollectionKind::Calendar),
        [
            MemoryItem::new("event1.ics", "\"e1\"", TEST_ICAL_1),
            MemoryItem::new("event2.ics", "\"e2\"", TEST_ICAL_2),
            MemoryItem::new("todo 1.ics", "\"t1\"", TEST_ICAL_TODO),
        ],
    )
}

pub fn addressbook_storage() -> MemoryStorage {
    MemoryStorage::new().with_collection(
        "john/contacts",
        Some(CollectionKind::AddressBook),
        [
            MemoryItem::new("wile.vcf", "\"c1\"", TEST_VCARD_1),
            MemoryItem::new("joe.vcf", "\"c2\"", TEST_VCARD_2),
            MemoryItem::new("jane.vcf", "\"c3\"", TEST_VCARD_3),
        ],
    )
}

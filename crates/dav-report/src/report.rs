/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::io;

use dav_proto::schema::{
    request::{MultiGet, Report, SyncCollection},
    response::MultiStatus,
    Namespace,
};
use hyper::StatusCode;

use crate::{
    DavResponse, ReportError,
    config::DavConfig,
    filter,
    property::partition,
    response::{build_response, item_path, normalize_path},
    storage::{CollectionKind, DavCollection, DavItem, DavNode, DavStorage, StorageLock},
};

pub struct DavServer<S> {
    pub storage: S,
    pub config: DavConfig,
}

pub struct ReportRequest<B> {
    /// Storage path the REPORT was issued against, without the base prefix.
    pub path: String,
    pub principal: String,
    /// Mount point of the DAV tree, prepended to every emitted href.
    pub base_prefix: String,
    pub body: B,
}

pub trait ReportRequestHandler: Sync + Send {
    fn handle_report_request<B>(
        &self,
        request: ReportRequest<B>,
    ) -> impl Future<Output = DavResponse> + Send
    where
        B: Future<Output = io::Result<Vec<u8>>> + Send;
}

/// Items buffered while the storage lock was held.
struct Snapshot<I> {
    kind: Option<CollectionKind>,
    collection_path: String,
    items: Vec<I>,
    sync_token: String,
}

impl<S: DavStorage> DavServer<S> {
    pub fn new(storage: S, config: DavConfig) -> Self {
        DavServer { storage, config }
    }

    async fn report<B>(&self, request: ReportRequest<B>) -> crate::Result<DavResponse>
    where
        B: Future<Output = io::Result<Vec<u8>>> + Send,
    {
        let body = match tokio::time::timeout(self.config.request_timeout, request.body).await {
            Ok(Ok(body)) => body,
            Ok(Err(err)) if err.kind() == io::ErrorKind::TimedOut => {
                return Err(ReportError::RequestTimeout);
            }
            Ok(Err(err)) => {
                return Err(ReportError::BadRequest(format!(
                    "Failed to read request body: {err}"
                )));
            }
            Err(_) => return Err(ReportError::RequestTimeout),
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(
                context = "dav",
                event = "empty-report",
                path = %request.path,
                "Empty REPORT request body"
            );
            return Ok(self.render(self.multistatus()));
        }

        let report = Report::parse_bytes(&body)?;

        tracing::debug!(
            context = "dav",
            event = "report",
            path = %request.path,
            principal = %request.principal,
            report = report.name(),
            "Processing REPORT request"
        );

        let Snapshot {
            kind,
            collection_path,
            items,
            sync_token,
        } = self.snapshot(&request.path, &request.principal)?;

        // The storage lock is released at this point, nothing below
        // touches the storage collaborator.
        if let Some(query_filter) = report.filter() {
            filter::validate(kind, query_filter)?;
        }

        let mut multistatus = self.multistatus();
        let mut missing = Vec::new();
        let selected = match &report {
            Report::CalendarQuery(_) | Report::AddressbookQuery(_) => {
                let mut selected = match report.filter() {
                    Some(query_filter) => items
                        .into_iter()
                        .filter(|item| filter::matches(item.content(), query_filter))
                        .collect(),
                    None => items,
                };

                if let Report::AddressbookQuery(query) = &report {
                    if let Some(limit) = query.limit {
                        selected.truncate(limit as usize);
                    }
                }

                selected
            }
            Report::CalendarMultiGet(multiget) | Report::AddressbookMultiGet(multiget) => {
                let (selected, not_found) =
                    select_hrefs(multiget, items, &collection_path, &request.base_prefix);
                missing = not_found;
                selected
            }
            Report::SyncCollection(sync) => {
                let selected = select_changes(sync, items, &sync_token);
                multistatus.set_sync_token(sync_token);
                selected
            }
        };

        let properties = report.properties();
        for item in selected {
            let (found, not_found) = partition(&item, properties, self.config.encoding);
            multistatus.add_response(build_response(
                &request.base_prefix,
                &item_path(&collection_path, item.href()),
                found,
                not_found,
                true,
            ));
        }

        for path in missing {
            multistatus.add_response(build_response(
                &request.base_prefix,
                &path,
                vec![],
                vec![],
                false,
            ));
        }

        Ok(self.render(multistatus))
    }

    fn snapshot(&self, path: &str, principal: &str) -> crate::Result<Snapshot<S::Item>> {
        let lock = self.storage.acquire_read_lock(path, principal)?;

        let (collection, scope) = match lock.discover(path)? {
            Some(DavNode::Collection(collection)) => (collection, None),
            Some(DavNode::Item { collection, href }) => (collection, Some(href)),
            None => return Err(ReportError::NotFound(path.to_string())),
        };

        let kind = collection.kind();
        let collection_path = collection.path().to_string();
        let mut items = collection.items()?;
        if let Some(href) = scope {
            items.retain(|item| item.href() == href);
        }

        drop(collection);
        drop(lock);

        tracing::debug!(
            context = "dav",
            event = "lock-released",
            path = path,
            items = items.len(),
            "Storage lock released"
        );

        let sync_token = sync_token(&items);

        Ok(Snapshot {
            kind,
            collection_path,
            items,
            sync_token,
        })
    }

    fn multistatus(&self) -> MultiStatus {
        MultiStatus::new(vec![])
            .with_namespace(Namespace::CalDav)
            .with_namespace(Namespace::CardDav)
            .with_encoding(self.config.encoding.encoding().output_encoding().name())
    }

    fn render(&self, multistatus: MultiStatus) -> DavResponse {
        let encoding = self.config.encoding.encoding().output_encoding();
        let xml = multistatus.to_string();
        let (body, _, _) = encoding.encode(&xml);

        DavResponse::new(StatusCode::MULTI_STATUS)
            .with_content_type(format!("text/xml; charset={}", encoding.name()))
            .with_body(body.into_owned())
    }
}

impl<S: DavStorage> ReportRequestHandler for DavServer<S> {
    async fn handle_report_request<B>(&self, request: ReportRequest<B>) -> DavResponse
    where
        B: Future<Output = io::Result<Vec<u8>>> + Send,
    {
        let path = request.path.clone();

        match self.report(request).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    ReportError::BadRequest(_) | ReportError::Filter(_) => {
                        tracing::warn!(
                            context = "dav",
                            event = "bad-request",
                            path = %path,
                            reason = %err,
                            "Bad REPORT request"
                        );
                    }
                    ReportError::RequestTimeout => {
                        tracing::debug!(
                            context = "dav",
                            event = "timeout",
                            path = %path,
                            "Timeout while reading REPORT request body"
                        );
                    }
                    ReportError::NotFound(_) => {
                        tracing::debug!(
                            context = "dav",
                            event = "not-found",
                            path = %path,
                            "REPORT target not found"
                        );
                    }
                    ReportError::Storage(_) => {
                        tracing::error!(
                            context = "dav",
                            event = "storage-error",
                            path = %path,
                            reason = %err,
                            "Storage failure while processing REPORT"
                        );
                    }
                }

                err.into()
            }
        }
    }
}

/// Splits the buffered items into the ones addressed by the request, in
/// enumeration order, and the requested paths no item answers to.
fn select_hrefs<I: DavItem>(
    multiget: &MultiGet,
    items: Vec<I>,
    collection_path: &str,
    base_prefix: &str,
) -> (Vec<I>, Vec<String>) {
    let mut requested: Vec<String> = Vec::with_capacity(multiget.hrefs.len());
    for href in &multiget.hrefs {
        let path = normalize_href(href, base_prefix);
        if !requested.contains(&path) {
            requested.push(path);
        }
    }

    let mut found = vec![false; requested.len()];
    let mut selected = Vec::new();
    for item in items {
        let path = normalize_path(&item_path(collection_path, item.href()));
        if let Some(pos) = requested.iter().position(|requested| requested == &path) {
            found[pos] = true;
            selected.push(item);
        }
    }

    let missing = requested
        .into_iter()
        .zip(found)
        .filter_map(|(path, found)| (!found).then_some(path))
        .collect();

    (selected, missing)
}

fn select_changes<I>(sync: &SyncCollection, mut items: Vec<I>, current_token: &str) -> Vec<I> {
    if sync.sync_token.as_deref().map(str::trim) == Some(current_token) {
        return Vec::new();
    }

    if let Some(limit) = sync.limit {
        items.truncate(limit as usize);
    }

    items
}

/// Reduces a client href to a storage path: percent-decoded, without scheme,
/// authority or base prefix.
fn normalize_href(href: &str, base_prefix: &str) -> String {
    let href = href.trim();
    let href = match href.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |pos| &rest[pos..]),
        None => href,
    };
    let path = normalize_path(&percent_encoding::percent_decode_str(href).decode_utf8_lossy());
    let base_prefix = normalize_path(base_prefix);

    if base_prefix != "/" {
        if let Some(rest) = path.strip_prefix(base_prefix.as_str()) {
            if rest.is_empty() || rest.starts_with('/') {
                return normalize_path(rest);
            }
        }
    }

    path
}

fn sync_token<I: DavItem>(items: &[I]) -> String {
    let mut hasher = blake3::Hasher::new();
    for item in items {
        hasher.update(item.href().as_bytes());
        hasher.update(&[0]);
        hasher.update(item.etag().as_bytes());
        hasher.update(&[0]);
    }

    format!("urn:dav:sync:{}", hasher.finalize().to_hex())
}

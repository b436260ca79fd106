/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::schema::{
    request::DavPropertyValue,
    response::{PropStat, Response},
};
use hyper::StatusCode;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// Everything outside the RFC 3986 unreserved set, except the path separator.
pub const HREF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub fn build_response(
    base_prefix: &str,
    path: &str,
    found: Vec<DavPropertyValue>,
    not_found: Vec<DavPropertyValue>,
    item_exists: bool,
) -> Response {
    let href = encode_href(base_prefix, path);

    if !item_exists {
        return Response::new_status(href, StatusCode::NOT_FOUND);
    }

    let mut propstat = Vec::with_capacity(2);
    if !found.is_empty() {
        propstat.push(PropStat::new_list(found));
    }
    if !not_found.is_empty() {
        propstat.push(PropStat::new_list(not_found).with_status(StatusCode::NOT_FOUND));
    }

    Response::new_propstat(href, propstat)
}

/// Collapses a path to a leading slash and single separators, without a
/// trailing one.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);

    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }

    normalized
}

/// Storage path of an item inside its collection. The item href is kept
/// verbatim so that distinct hrefs never share a path.
pub fn item_path(collection_path: &str, href: &str) -> String {
    let mut path = normalize_path(collection_path);
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(href);
    path
}

/// Client facing href of a storage path below the normalized base prefix.
pub fn encode_href(base_prefix: &str, path: &str) -> String {
    let base_prefix = normalize_path(base_prefix);
    let mut href = base_prefix.trim_end_matches('/').to_string();

    if !path.starts_with('/') {
        href.push('/');
    }
    href.extend(percent_encoding::utf8_percent_encode(path, HREF_ENCODE_SET));
    href
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::schema::{
    property::{CalDavProperty, CardDavProperty, DavProperty, DavValue, WebDavProperty},
    request::DavPropertyValue,
};

use crate::{config::Charset, storage::DavItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Found(DavPropertyValue),
    NotFound(DavProperty),
}

pub fn resolve(item: &impl DavItem, property: &DavProperty, encoding: Charset) -> Resolved {
    match property {
        DavProperty::WebDav(WebDavProperty::GetETag) => {
            Resolved::Found(DavPropertyValue::new(property.clone(), item.etag()))
        }
        DavProperty::WebDav(WebDavProperty::GetContentType) => Resolved::Found(
            DavPropertyValue::new(property.clone(), item.content_type(encoding)),
        ),
        DavProperty::CalDav(CalDavProperty::CalendarData)
        | DavProperty::CardDav(CardDavProperty::AddressData) => {
            // Characters the output charset lacks become numeric character
            // references, which are only decoded outside CDATA sections.
            let data = if encoding.is_utf8() {
                DavValue::CData(item.serialize())
            } else {
                DavValue::String(item.serialize())
            };
            Resolved::Found(DavPropertyValue::new(property.clone(), data))
        }
        DavProperty::DeadProperty(_) => Resolved::NotFound(property.clone()),
    }
}

/// Resolves every requested property, keeping request order inside each
/// half. Not-found properties are returned as empty placeholders.
pub fn partition(
    item: &impl DavItem,
    properties: &[DavProperty],
    encoding: Charset,
) -> (Vec<DavPropertyValue>, Vec<DavPropertyValue>) {
    let mut found = Vec::with_capacity(properties.len());
    let mut not_found = Vec::new();

    for property in properties {
        match resolve(item, property, encoding) {
            Resolved::Found(value) => found.push(value),
            Resolved::NotFound(property) => not_found.push(DavPropertyValue::empty(property)),
        }
    }

    (found, not_found)
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{Element, NamedElement, Namespace};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum DavProperty {
    WebDav(WebDavProperty),
    CalDav(CalDavProperty),
    CardDav(CardDavProperty),
    DeadProperty(DeadElementTag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum WebDavProperty {
    GetETag,
    GetContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum CalDavProperty {
    CalendarData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum CardDavProperty {
    AddressData,
}

/// A property outside the set this server knows how to produce, kept
/// verbatim so it can be echoed back in a 404 propstat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct DeadElementTag {
    pub name: String,
    pub attrs: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum DavValue {
    String(String),
    CData(String),
    Null,
}

/// UTC bounds of a `time-range` element, as unix timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DavProperty {
    pub fn from_element(element: NamedElement) -> Option<Self> {
        match (element.ns, element.element) {
            (Namespace::Dav, Element::Getetag) => {
                Some(DavProperty::WebDav(WebDavProperty::GetETag))
            }
            (Namespace::Dav, Element::Getcontenttype) => {
                Some(DavProperty::WebDav(WebDavProperty::GetContentType))
            }
            (Namespace::CalDav, Element::CalendarData) => {
                Some(DavProperty::CalDav(CalDavProperty::CalendarData))
            }
            (Namespace::CardDav, Element::AddressData) => {
                Some(DavProperty::CardDav(CardDavProperty::AddressData))
            }
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            DavProperty::WebDav(_) => Some(Namespace::Dav),
            DavProperty::CalDav(_) => Some(Namespace::CalDav),
            DavProperty::CardDav(_) => Some(Namespace::CardDav),
            DavProperty::DeadProperty(_) => None,
        }
    }
}

impl TimeRange {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start.is_none_or(|range_start| end > range_start)
            && self.end.is_none_or(|range_end| start < range_end)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start.is_none_or(|range_start| timestamp >= range_start)
            && self.end.is_none_or(|range_end| timestamp < range_end)
    }
}

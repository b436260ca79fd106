/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{XmlCdataEscape, XmlEscape};
use crate::schema::{
    property::{CalDavProperty, CardDavProperty, DavProperty, DavValue, DeadElementTag, WebDavProperty},
    request::DavPropertyValue,
};
use std::fmt::Display;

impl Display for DavPropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, attrs) = self.property.tag_name();

        write!(f, "<{}", name)?;

        if let Some(attrs) = attrs {
            write!(f, " {attrs}")?;
        }

        if !matches!(self.value, DavValue::Null) {
            write!(f, ">{}</{}>", self.value, name)
        } else {
            write!(f, "/>")
        }
    }
}

impl Display for DavValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DavValue::String(v) => v.write_escaped_to(f),
            DavValue::CData(v) => v.write_cdata_escaped_to(f),
            DavValue::Null => Ok(()),
        }
    }
}

impl DavProperty {
    pub fn tag_name(&self) -> (&str, Option<&str>) {
        match self {
            DavProperty::WebDav(prop) => (
                match prop {
                    WebDavProperty::GetETag => "D:getetag",
                    WebDavProperty::GetContentType => "D:getcontenttype",
                },
                None,
            ),
            DavProperty::CalDav(CalDavProperty::CalendarData) => ("A:calendar-data", None),
            DavProperty::CardDav(CardDavProperty::AddressData) => ("B:address-data", None),
            DavProperty::DeadProperty(tag) => (tag.name.as_str(), tag.attrs.as_deref()),
        }
    }
}

impl From<WebDavProperty> for DavProperty {
    fn from(value: WebDavProperty) -> Self {
        DavProperty::WebDav(value)
    }
}

impl From<CalDavProperty> for DavProperty {
    fn from(value: CalDavProperty) -> Self {
        DavProperty::CalDav(value)
    }
}

impl From<CardDavProperty> for DavProperty {
    fn from(value: CardDavProperty) -> Self {
        DavProperty::CardDav(value)
    }
}

impl From<DeadElementTag> for DavProperty {
    fn from(value: DeadElementTag) -> Self {
        DavProperty::DeadProperty(value)
    }
}

impl From<String> for DavValue {
    fn from(value: String) -> Self {
        DavValue::String(value)
    }
}

impl From<&str> for DavValue {
    fn from(value: &str) -> Self {
        DavValue::String(value.to_string())
    }
}

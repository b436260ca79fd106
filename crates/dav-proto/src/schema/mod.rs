/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::borrow::Cow;

use request::FilterTest;

pub mod property;
pub mod request;
pub mod response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum Namespace {
    Dav,
    CalDav,
    CardDav,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Namespaces {
    pub(crate) cal: bool,
    pub(crate) card: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct NamedElement {
    pub ns: Namespace,
    pub element: Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    AddressData,
    AddressbookMultiget,
    AddressbookQuery,
    Allprop,
    CalendarData,
    CalendarMultiget,
    CalendarQuery,
    CompFilter,
    Filter,
    Getcontenttype,
    Getetag,
    Href,
    IsNotDefined,
    Limit,
    Nresults,
    ParamFilter,
    Prop,
    PropFilter,
    Propname,
    SyncCollection,
    SyncLevel,
    SyncToken,
    TextMatch,
    TimeRange,
    Timezone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Name(String),
    Test(FilterTest),
    Collation(Collation),
    MatchType(MatchType),
    NegateCondition(bool),
    Start(String),
    End(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum Collation {
    #[default]
    AsciiCasemap,
    Octet,
    UnicodeCasemap,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum MatchType {
    Equals,
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Unsupported(String),
}

impl Namespace {
    pub fn try_parse(value: &[u8]) -> Option<Self> {
        hashify::tiny_map!(value,
            "DAV:" => Namespace::Dav,
            "urn:ietf:params:xml:ns:caldav" => Namespace::CalDav,
            "urn:ietf:params:xml:ns:carddav" => Namespace::CardDav,
        )
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Dav => "D",
            Namespace::CalDav => "A",
            Namespace::CardDav => "B",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Namespace::Dav => "DAV:",
            Namespace::CalDav => "urn:ietf:params:xml:ns:caldav",
            Namespace::CardDav => "urn:ietf:params:xml:ns:carddav",
        }
    }
}

impl Namespaces {
    pub fn set(&mut self, ns: Namespace) {
        match ns {
            Namespace::CalDav => self.cal = true,
            Namespace::CardDav => self.card = true,
            Namespace::Dav => {}
        }
    }
}

impl Element {
    pub fn try_parse(value: &[u8]) -> Option<Self> {
        hashify::tiny_map!(value,
            "address-data" => Element::AddressData,
            "addressbook-multiget" => Element::AddressbookMultiget,
            "addressbook-query" => Element::AddressbookQuery,
            "allprop" => Element::Allprop,
            "calendar-data" => Element::CalendarData,
            "calendar-multiget" => Element::CalendarMultiget,
            "calendar-query" => Element::CalendarQuery,
            "comp-filter" => Element::CompFilter,
            "filter" => Element::Filter,
            "getcontenttype" => Element::Getcontenttype,
            "getetag" => Element::Getetag,
            "href" => Element::Href,
            "is-not-defined" => Element::IsNotDefined,
            "limit" => Element::Limit,
            "nresults" => Element::Nresults,
            "param-filter" => Element::ParamFilter,
            "prop" => Element::Prop,
            "prop-filter" => Element::PropFilter,
            "propname" => Element::Propname,
            "sync-collection" => Element::SyncCollection,
            "sync-level" => Element::SyncLevel,
            "sync-token" => Element::SyncToken,
            "text-match" => Element::TextMatch,
            "time-range" => Element::TimeRange,
            "timezone" => Element::Timezone,
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::AddressData => "address-data",
            Element::AddressbookMultiget => "addressbook-multiget",
            Element::AddressbookQuery => "addressbook-query",
            Element::Allprop => "allprop",
            Element::CalendarData => "calendar-data",
            Element::CalendarMultiget => "calendar-multiget",
            Element::CalendarQuery => "calendar-query",
            Element::CompFilter => "comp-filter",
            Element::Filter => "filter",
            Element::Getcontenttype => "getcontenttype",
            Element::Getetag => "getetag",
            Element::Href => "href",
            Element::IsNotDefined => "is-not-defined",
            Element::Limit => "limit",
            Element::Nresults => "nresults",
            Element::ParamFilter => "param-filter",
            Element::Prop => "prop",
            Element::PropFilter => "prop-filter",
            Element::Propname => "propname",
            Element::SyncCollection => "sync-collection",
            Element::SyncLevel => "sync-level",
            Element::SyncToken => "sync-token",
            Element::TextMatch => "text-match",
            Element::TimeRange => "time-range",
            Element::Timezone => "timezone",
        }
    }
}

impl Attribute {
    pub fn from_param(key: &[u8], value: Cow<'_, str>) -> Option<Self> {
        match key {
            b"name" => Some(Attribute::Name(value.into_owned())),
            b"test" => Some(Attribute::Test(FilterTest::parse(&value))),
            b"collation" => Some(Attribute::Collation(Collation::parse(&value))),
            b"match-type" => Some(Attribute::MatchType(MatchType::parse(&value))),
            b"negate-condition" => Some(Attribute::NegateCondition(
                value.trim().eq_ignore_ascii_case("yes"),
            )),
            b"start" => Some(Attribute::Start(value.into_owned())),
            b"end" => Some(Attribute::End(value.into_owned())),
            _ => None,
        }
    }
}

impl Collation {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "i;ascii-casemap" => Collation::AsciiCasemap,
            "i;octet" => Collation::Octet,
            "i;unicode-casemap" => Collation::UnicodeCasemap,
            other => Collation::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Collation::AsciiCasemap => "i;ascii-casemap",
            Collation::Octet => "i;octet",
            Collation::UnicodeCasemap => "i;unicode-casemap",
            Collation::Unsupported(other) => other,
        }
    }
}

impl MatchType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "equals" => MatchType::Equals,
            "contains" => MatchType::Contains,
            "starts-with" => MatchType::StartsWith,
            "ends-with" => MatchType::EndsWith,
            other => MatchType::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MatchType::Equals => "equals",
            MatchType::Contains => "contains",
            MatchType::StartsWith => "starts-with",
            MatchType::EndsWith => "ends-with",
            MatchType::Unsupported(other) => other,
        }
    }
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use super::{
    property::{DavProperty, DavValue, TimeRange},
    Collation, MatchType, Namespace,
};
use crate::Depth;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum Report {
    CalendarQuery(CalendarQuery),
    AddressbookQuery(AddressbookQuery),
    CalendarMultiGet(MultiGet),
    AddressbookMultiGet(MultiGet),
    SyncCollection(SyncCollection),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum PropFind {
    PropName,
    #[default]
    AllProp,
    Prop(Vec<DavProperty>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarQuery {
    pub properties: PropFind,
    pub filter: Option<Filter>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct AddressbookQuery {
    pub properties: PropFind,
    pub filter: Option<Filter>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct MultiGet {
    pub properties: PropFind,
    pub hrefs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct SyncCollection {
    pub sync_token: Option<String>,
    pub properties: PropFind,
    pub depth: Depth,
    pub limit: Option<u32>,
}

/// Root `filter` element of a calendar-query or addressbook-query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct Filter {
    pub ns: Namespace,
    pub test: FilterTest,
    pub children: Vec<FilterNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum FilterNode {
    Component(CompFilter),
    Property(PropFilter),
    Unexpected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub enum FilterTest {
    #[default]
    AnyOf,
    AllOf,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct CompFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub time_range: Option<TimeRange>,
    pub prop_filters: Vec<PropFilter>,
    pub comp_filters: Vec<CompFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct PropFilter {
    pub name: String,
    pub group: Option<String>,
    pub test: FilterTest,
    pub is_not_defined: bool,
    pub time_range: Option<TimeRange>,
    pub text_matches: Vec<TextMatch>,
    pub param_filters: Vec<ParamFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct ParamFilter {
    pub name: String,
    pub is_not_defined: bool,
    pub text_match: Option<TextMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct TextMatch {
    pub match_type: MatchType,
    pub value: String,
    pub collation: Collation,
    pub negate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize, serde::Deserialize))]
pub struct DavPropertyValue {
    pub property: DavProperty,
    pub value: DavValue,
}

impl Report {
    pub fn properties(&self) -> &[DavProperty] {
        let properties = match self {
            Report::CalendarQuery(query) => &query.properties,
            Report::AddressbookQuery(query) => &query.properties,
            Report::CalendarMultiGet(multiget) | Report::AddressbookMultiGet(multiget) => {
                &multiget.properties
            }
            Report::SyncCollection(sync) => &sync.properties,
        };

        match properties {
            PropFind::Prop(properties) => properties,
            PropFind::PropName | PropFind::AllProp => &[],
        }
    }

    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Report::CalendarQuery(query) => query.filter.as_ref(),
            Report::AddressbookQuery(query) => query.filter.as_ref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Report::CalendarQuery(_) => "calendar-query",
            Report::AddressbookQuery(_) => "addressbook-query",
            Report::CalendarMultiGet(_) => "calendar-multiget",
            Report::AddressbookMultiGet(_) => "addressbook-multiget",
            Report::SyncCollection(_) => "sync-collection",
        }
    }
}

impl FilterTest {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "anyof" => FilterTest::AnyOf,
            "allof" => FilterTest::AllOf,
            other => FilterTest::Unknown(other.to_string()),
        }
    }
}

impl DavPropertyValue {
    pub fn new(property: impl Into<DavProperty>, value: impl Into<DavValue>) -> Self {
        DavPropertyValue {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn empty(property: impl Into<DavProperty>) -> Self {
        DavPropertyValue {
            property: property.into(),
            value: DavValue::Null,
        }
    }
}

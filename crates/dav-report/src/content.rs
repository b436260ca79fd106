/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::borrow::Cow;

use calcard::{
    Entry, Parser,
    common::IanaString,
    icalendar::{
        ICalendar, ICalendarComponentType, ICalendarEntry, ICalendarParameterValue, ICalendarValue,
    },
    vcard::{VCard, VCardEntry, VCardParameterValue, VCardValue},
};

/// Parsed body of a calendar object or a contact.
#[derive(Debug, Clone)]
pub enum DavContent {
    ICalendar(ICalendar),
    VCard(VCard),
}

/// Read access to a property line of either format.
pub trait ContentLine {
    fn property_name(&self) -> &str;

    fn property_group(&self) -> Option<&str> {
        None
    }

    /// Values that can be compared as text.
    fn text_values(&self) -> Vec<Cow<'_, str>>;

    /// One entry per parameter called `name`, holding its value when it is
    /// textual.
    fn parameters(&self, name: &str) -> Vec<Option<&str>>;
}

impl DavContent {
    pub fn parse(text: &str) -> Option<Self> {
        match Parser::new(text).entry() {
            Entry::ICalendar(ical) => Some(DavContent::ICalendar(ical)),
            Entry::VCard(vcard) => Some(DavContent::VCard(vcard)),
            _ => None,
        }
    }

    /// Type of the first component below VCALENDAR that is not a VTIMEZONE.
    pub fn main_component(&self) -> Option<&str> {
        match self {
            DavContent::ICalendar(ical) => ical
                .components
                .first()?
                .component_ids
                .iter()
                .filter_map(|id| ical.components.get(*id as usize))
                .find(|component| component.component_type != ICalendarComponentType::VTimezone)
                .map(|component| component.component_type.as_str()),
            DavContent::VCard(_) => None,
        }
    }
}

impl ContentLine for ICalendarEntry {
    fn property_name(&self) -> &str {
        self.name.as_str()
    }

    fn text_values(&self) -> Vec<Cow<'_, str>> {
        self.values
            .iter()
            .filter_map(|value| match value {
                ICalendarValue::Text(text) => Some(Cow::Borrowed(text.as_str())),
                ICalendarValue::Uri(uri) => uri.as_str().map(Cow::Borrowed),
                ICalendarValue::Integer(number) => Some(Cow::Owned(number.to_string())),
                _ => None,
            })
            .collect()
    }

    fn parameters(&self, name: &str) -> Vec<Option<&str>> {
        self.params
            .iter()
            .filter(|param| param.name.as_str().eq_ignore_ascii_case(name))
            .map(|param| match &param.value {
                ICalendarParameterValue::Text(text) => Some(text.as_str()),
                ICalendarParameterValue::Uri(uri) => uri.as_str(),
                _ => None,
            })
            .collect()
    }
}

impl ContentLine for VCardEntry {
    fn property_name(&self) -> &str {
        self.name.as_str()
    }

    fn property_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn text_values(&self) -> Vec<Cow<'_, str>> {
        self.values
            .iter()
            .filter_map(|value| match value {
                VCardValue::Component(parts) => Some(Cow::Owned(parts.join(";"))),
                value => value.as_text().map(Cow::Borrowed),
            })
            .collect()
    }

    fn parameters(&self, name: &str) -> Vec<Option<&str>> {
        self.params
            .iter()
            .filter(|param| param.name.as_str().eq_ignore_ascii_case(name))
            .map(|param| match &param.value {
                VCardParameterValue::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

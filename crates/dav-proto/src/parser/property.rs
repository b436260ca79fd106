/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use chrono::{NaiveDate, NaiveDateTime};

use crate::schema::{
    property::{DavProperty, DeadElementTag, TimeRange},
    Attribute,
};

use super::{tokenizer::Tokenizer, Error, RawElement, Token};

impl Tokenizer<'_> {
    pub(crate) fn collect_properties(
        &mut self,
        mut elements: Vec<DavProperty>,
    ) -> crate::parser::Result<Vec<DavProperty>> {
        loop {
            match self.token()? {
                Token::ElementStart { name, raw } => {
                    elements.push(
                        DavProperty::from_element(name)
                            .unwrap_or_else(|| DavProperty::DeadProperty((&raw).into())),
                    );
                    // calendar-data and address-data may carry a partial
                    // retrieval request, the full body is always returned.
                    self.seek_element_end()?;
                }
                Token::UnknownElement(raw) => {
                    elements.push(DavProperty::DeadProperty((&raw).into()));
                    self.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(elements)
    }
}

impl From<&RawElement<'_>> for DeadElementTag {
    fn from(raw: &RawElement<'_>) -> Self {
        DeadElementTag {
            name: raw.local_name(),
            attrs: raw.namespace.as_ref().map(|ns| {
                let mut attrs = String::with_capacity(ns.len() + 8);
                attrs.push_str("xmlns=\"");
                for ch in ns.chars() {
                    match ch {
                        '"' => attrs.push_str("&quot;"),
                        '&' => attrs.push_str("&amp;"),
                        '<' => attrs.push_str("&lt;"),
                        _ => attrs.push(ch),
                    }
                }
                attrs.push('"');
                attrs
            }),
        }
    }
}

impl TimeRange {
    pub fn from_raw(raw: &RawElement<'_>) -> crate::parser::Result<Option<Self>> {
        let mut range = TimeRange::default();

        for attribute in raw.attributes() {
            match attribute? {
                Attribute::Start(value) => {
                    range.start = Some(parse_utc_timestamp(&value)?);
                }
                Attribute::End(value) => {
                    range.end = Some(parse_utc_timestamp(&value)?);
                }
                _ => {}
            }
        }

        Ok((!range.is_empty()).then_some(range))
    }
}

fn parse_utc_timestamp(value: &str) -> crate::parser::Result<i64> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
        .map(|dt| dt.and_utc().timestamp())
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc().timestamp())
                .ok_or(())
        })
        .map_err(|_| Error::InvalidValue {
            name: "time-range",
            value: value.to_string(),
        })
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::borrow::Cow;

use quick_xml::{
    events::{attributes::AttrError, Event},
    name::ResolveResult,
    NsReader,
};

use crate::schema::{Attribute, Element, NamedElement, Namespace};

use super::{Error, RawElement, Token, UnexpectedToken};

pub struct Tokenizer<'x> {
    xml: NsReader<&'x [u8]>,
    last_is_end: bool,
}

impl<'x> Tokenizer<'x> {
    pub fn new(input: &'x [u8]) -> Self {
        Self {
            xml: NsReader::from_reader(input),
            last_is_end: false,
        }
    }

    pub fn token(&mut self) -> super::Result<Token<'x>> {
        loop {
            if self.last_is_end {
                self.last_is_end = false;
                return Ok(Token::ElementEnd);
            }

            let (resolve_result, event) = self.xml.read_resolved_event()?;
            let tag = match event {
                Event::Start(tag) => tag,
                Event::Empty(tag) => {
                    self.last_is_end = true;
                    tag
                }
                Event::End(_) => {
                    return Ok(Token::ElementEnd);
                }
                Event::Text(text) if text.iter().any(|ch| !ch.is_ascii_whitespace()) => {
                    let text = match text.into_inner() {
                        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
                        Cow::Owned(bytes) => {
                            Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
                        }
                    };
                    return Ok(Token::Text(text));
                }
                Event::GeneralRef(entity) => {
                    return resolve_entity(entity.as_ref())
                        .map(|ch| Token::Text(Cow::Owned(ch.to_string())))
                        .ok_or_else(|| Error::InvalidValue {
                            name: "entity",
                            value: String::from_utf8_lossy(entity.as_ref()).into_owned(),
                        });
                }
                Event::CData(bytes) => return Ok(Token::Bytes(bytes.into_inner())),
                Event::Eof => return Ok(Token::Eof),
                _ => {
                    continue;
                }
            };

            // Parse element
            match resolve_result {
                ResolveResult::Bound(raw_ns) if !raw_ns.as_ref().is_empty() => {
                    let namespace = String::from_utf8_lossy(raw_ns.as_ref()).into_owned();
                    if let (Some(ns), Some(element)) = (
                        Namespace::try_parse(raw_ns.as_ref()),
                        Element::try_parse(tag.local_name().as_ref()),
                    ) {
                        return Ok(Token::ElementStart {
                            name: NamedElement { ns, element },
                            raw: RawElement::new(tag).with_namespace(namespace),
                        });
                    } else {
                        return Ok(Token::UnknownElement(
                            RawElement::new(tag).with_namespace(namespace),
                        ));
                    }
                }
                ResolveResult::Unknown(prefix) => {
                    return Err(Error::UnknownPrefix(
                        String::from_utf8_lossy(&prefix).into_owned(),
                    ));
                }
                _ => {
                    return Ok(Token::UnknownElement(RawElement::new(tag)));
                }
            }
        }
    }

    pub fn unwrap_named_element(&mut self) -> super::Result<NamedElement> {
        match self.token()? {
            Token::ElementStart { name, .. } => Ok(name),
            found => Err(found.into_unexpected()),
        }
    }

    pub fn expect_named_element(&mut self, expected: NamedElement) -> super::Result<()> {
        match self.token()? {
            Token::ElementStart { name, .. } if name == expected => Ok(()),
            found => Err(Error::UnexpectedToken(Box::new(UnexpectedToken {
                expected: Token::ElementStart {
                    name: expected,
                    raw: RawElement::default(),
                }
                .into(),
                found: found.into_owned(),
            }))),
        }
    }

    pub fn expect_element_end(&mut self) -> super::Result<()> {
        match self.token()? {
            Token::ElementEnd => Ok(()),
            found => Err(Error::UnexpectedToken(Box::new(UnexpectedToken {
                expected: Token::ElementEnd.into(),
                found: found.into_owned(),
            }))),
        }
    }

    pub fn seek_element_end(&mut self) -> super::Result<()> {
        let mut depth = 1;
        loop {
            match self.token()? {
                Token::ElementStart { .. } | Token::UnknownElement(_) => depth += 1,
                Token::ElementEnd => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Eof => return Err(Token::Eof.into_unexpected()),
                _ => {}
            }
        }
    }

    /// Concatenates the text of the current element, skipping nested elements.
    /// Entity references arrive as separate tokens, so partial runs are joined
    /// before trimming.
    pub fn collect_string_value(&mut self) -> super::Result<Option<String>> {
        let mut depth = 1;
        let mut value: Option<String> = None;

        loop {
            match self.token()? {
                Token::ElementStart { .. } | Token::UnknownElement(_) => depth += 1,
                Token::ElementEnd => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Token::Text(text) if depth == 1 => {
                    value.get_or_insert_with(String::new).push_str(&text);
                }
                Token::Bytes(bytes) if depth == 1 => {
                    value
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&bytes));
                }
                Token::Text(_) | Token::Bytes(_) => {}
                Token::Eof => return Err(Token::Eof.into_unexpected()),
            }
        }

        Ok(value.map(|value| value.trim().to_string()))
    }

    pub fn parse_number(&mut self) -> super::Result<Option<u32>> {
        match self.collect_string_value()? {
            Some(value) => value
                .parse::<u32>()
                .map(Some)
                .map_err(|_| Error::InvalidValue {
                    name: "number",
                    value,
                }),
            None => Ok(None),
        }
    }
}

impl RawElement<'_> {
    pub fn attributes(&self) -> impl Iterator<Item = super::Result<Attribute>> + '_ {
        self.element.attributes().filter_map(|attr| match attr {
            Ok(attr) => match attr.unescape_value() {
                Ok(value) => Attribute::from_param(attr.key.as_ref(), value).map(Ok),
                Err(err) => Some(Err(err.into())),
            },
            Err(err) => Some(Err(err.into())),
        })
    }
}

fn resolve_entity(entity: &[u8]) -> Option<char> {
    match entity {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"apos" => Some('\''),
        b"quot" => Some('"'),
        [b'#', b'x' | b'X', hex @ ..] => std::str::from_utf8(hex)
            .ok()
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32),
        [b'#', dec @ ..] => std::str::from_utf8(dec)
            .ok()
            .and_then(|dec| dec.parse::<u32>().ok())
            .and_then(char::from_u32),
        _ => None,
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(Box::new(err))
    }
}

impl From<AttrError> for Error {
    fn from(err: AttrError) -> Self {
        Error::Xml(Box::new(err.into()))
    }
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{borrow::Cow, fmt::Display};

use quick_xml::events::BytesStart;
use tokenizer::Tokenizer;

use crate::schema::{Element, NamedElement, Namespace};

pub mod property;
pub mod tokenizer;

#[derive(Debug)]
pub enum Error {
    Xml(Box<quick_xml::Error>),
    UnknownPrefix(String),
    InvalidValue { name: &'static str, value: String },
    MissingAttribute { element: String, attribute: &'static str },
    UnexpectedToken(Box<UnexpectedToken>),
}

#[derive(Debug)]
pub struct UnexpectedToken {
    pub expected: Option<Token<'static>>,
    pub found: Token<'static>,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub enum Token<'x> {
    ElementStart {
        name: NamedElement,
        raw: RawElement<'x>,
    },
    ElementEnd,
    Bytes(Cow<'x, [u8]>),
    Text(Cow<'x, str>),
    UnknownElement(RawElement<'x>),
    Eof,
}

#[derive(Debug, Clone)]
pub struct RawElement<'x> {
    pub element: BytesStart<'x>,
    pub namespace: Option<String>,
}

pub trait DavParser: Sized {
    fn parse(stream: &mut Tokenizer<'_>) -> Result<Self>;
}

impl NamedElement {
    pub fn dav(element: Element) -> NamedElement {
        NamedElement {
            ns: Namespace::Dav,
            element,
        }
    }

    pub fn caldav(element: Element) -> NamedElement {
        NamedElement {
            ns: Namespace::CalDav,
            element,
        }
    }

    pub fn carddav(element: Element) -> NamedElement {
        NamedElement {
            ns: Namespace::CardDav,
            element,
        }
    }

    pub fn into_unexpected(self) -> Error {
        Error::UnexpectedToken(Box::new(UnexpectedToken {
            expected: None,
            found: Token::ElementStart {
                name: self,
                raw: RawElement::default(),
            },
        }))
    }
}

impl Token<'_> {
    pub fn into_owned(self) -> Token<'static> {
        match self {
            Token::ElementStart { name, raw } => Token::ElementStart {
                name,
                raw: raw.into_owned(),
            },
            Token::ElementEnd => Token::ElementEnd,
            Token::Bytes(bytes) => Token::Bytes(bytes.into_owned().into()),
            Token::Text(text) => Token::Text(text.into_owned().into()),
            Token::UnknownElement(raw) => Token::UnknownElement(raw.into_owned()),
            Token::Eof => Token::Eof,
        }
    }

    pub fn into_unexpected(self) -> Error {
        Error::UnexpectedToken(Box::new(UnexpectedToken {
            expected: None,
            found: self.into_owned(),
        }))
    }
}

impl<'x> RawElement<'x> {
    pub fn new(element: BytesStart<'x>) -> Self {
        RawElement {
            element,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn into_owned(self) -> RawElement<'static> {
        RawElement {
            element: self.element.into_owned(),
            namespace: self.namespace,
        }
    }

    /// Qualified name as written in the document, e.g. `C:param-filter`.
    pub fn tag_name(&self) -> String {
        String::from_utf8_lossy(self.element.name().as_ref()).into_owned()
    }

    pub fn local_name(&self) -> String {
        String::from_utf8_lossy(self.element.local_name().as_ref()).into_owned()
    }
}

impl Default for RawElement<'_> {
    fn default() -> Self {
        RawElement::new(BytesStart::new(""))
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::ElementStart { name, .. } => {
                write!(f, "<{}:{}>", name.ns.prefix(), name.element.as_str())
            }
            Token::ElementEnd => f.write_str("end of element"),
            Token::Bytes(_) => f.write_str("CDATA section"),
            Token::Text(text) => write!(f, "text {text:?}"),
            Token::UnknownElement(raw) => write!(f, "<{}>", raw.tag_name()),
            Token::Eof => f.write_str("end of document"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Xml(err) => write!(f, "XML error: {err}"),
            Error::UnknownPrefix(prefix) => write!(f, "Unknown namespace prefix {prefix:?}"),
            Error::InvalidValue { name, value } => write!(f, "Invalid {name} value {value:?}"),
            Error::MissingAttribute { element, attribute } => {
                write!(f, "Missing {attribute:?} attribute in <{element}>")
            }
            Error::UnexpectedToken(token) => match &token.expected {
                Some(expected) => write!(f, "Expected {expected} but found {}", token.found),
                None => write!(f, "Unexpected {}", token.found),
            },
        }
    }
}

impl std::error::Error for Error {}

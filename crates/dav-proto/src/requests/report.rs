/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    parser::{tokenizer::Tokenizer, DavParser, Error, RawElement, Token},
    schema::{
        property::TimeRange,
        request::{
            AddressbookQuery, CalendarQuery, CompFilter, Filter, FilterNode, FilterTest, MultiGet,
            ParamFilter, PropFilter, PropFind, Report, SyncCollection, TextMatch,
        },
        Attribute, Element, NamedElement, Namespace,
    },
    Depth,
};

impl DavParser for Report {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        match stream.unwrap_named_element()? {
            NamedElement {
                ns: Namespace::CalDav,
                element: Element::CalendarQuery,
            } => CalendarQuery::parse(stream).map(Report::CalendarQuery),
            NamedElement {
                ns: Namespace::CalDav,
                element: Element::CalendarMultiget,
            } => MultiGet::parse(stream).map(Report::CalendarMultiGet),
            NamedElement {
                ns: Namespace::CardDav,
                element: Element::AddressbookQuery,
            } => AddressbookQuery::parse(stream).map(Report::AddressbookQuery),
            NamedElement {
                ns: Namespace::CardDav,
                element: Element::AddressbookMultiget,
            } => MultiGet::parse(stream).map(Report::AddressbookMultiGet),
            NamedElement {
                ns: Namespace::Dav,
                element: Element::SyncCollection,
            } => SyncCollection::parse(stream).map(Report::SyncCollection),
            other => Err(other.into_unexpected()),
        }
    }
}

impl DavParser for CalendarQuery {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        let mut cq = CalendarQuery::default();

        loop {
            match stream.token()? {
                Token::ElementStart { name, raw } => match name {
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Propname,
                    } => {
                        cq.properties = PropFind::PropName;
                        stream.expect_element_end()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Allprop,
                    } => {
                        stream.seek_element_end()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Prop,
                    } => {
                        cq.properties = PropFind::Prop(stream.collect_properties(Vec::new())?);
                    }
                    NamedElement {
                        ns: Namespace::CalDav,
                        element: Element::Filter,
                    } => {
                        cq.filter = Filter::parse(stream, &raw, Namespace::CalDav)?.into();
                    }
                    NamedElement {
                        ns: Namespace::CalDav,
                        element: Element::Timezone,
                    } => {
                        cq.timezone = stream.collect_string_value()?;
                    }
                    name => return Err(name.into_unexpected()),
                },
                Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(cq)
    }
}

impl DavParser for AddressbookQuery {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        let mut aq = AddressbookQuery::default();

        loop {
            match stream.token()? {
                Token::ElementStart { name, raw } => match name {
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Propname,
                    } => {
                        aq.properties = PropFind::PropName;
                        stream.expect_element_end()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Allprop,
                    } => {
                        stream.seek_element_end()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Prop,
                    } => {
                        aq.properties = PropFind::Prop(stream.collect_properties(Vec::new())?);
                    }
                    NamedElement {
                        ns: Namespace::CardDav,
                        element: Element::Filter,
                    } => {
                        aq.filter = Filter::parse(stream, &raw, Namespace::CardDav)?.into();
                    }
                    NamedElement {
                        ns: Namespace::CardDav,
                        element: Element::Limit,
                    } => {
                        aq.limit = stream.collect_limit()?;
                    }
                    name => return Err(name.into_unexpected()),
                },
                Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(aq)
    }
}

impl DavParser for MultiGet {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        let mut mg = MultiGet::default();

        loop {
            match stream.token()? {
                Token::ElementStart { name, .. } => match name {
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Propname,
                    } => {
                        mg.properties = PropFind::PropName;
                        stream.expect_element_end()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Allprop,
                    } => {
                        stream.seek_element_end()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Prop,
                    } => {
                        mg.properties = PropFind::Prop(stream.collect_properties(Vec::new())?);
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Href,
                    } => {
                        if let Some(href) = stream.collect_string_value()? {
                            mg.hrefs.push(href);
                        }
                    }
                    name => return Err(name.into_unexpected()),
                },
                Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                element => return Err(element.into_unexpected()),
            }
        }

        Ok(mg)
    }
}

impl DavParser for SyncCollection {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        let mut sc = SyncCollection::default();

        loop {
            match stream.token()? {
                Token::ElementStart { name, .. } => match name {
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Prop,
                    } => {
                        sc.properties = PropFind::Prop(stream.collect_properties(Vec::new())?);
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::Limit,
                    } => {
                        sc.limit = stream.collect_limit()?;
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::SyncToken,
                    } => {
                        sc.sync_token = stream
                            .collect_string_value()?
                            .filter(|token| !token.is_empty());
                    }
                    NamedElement {
                        ns: Namespace::Dav,
                        element: Element::SyncLevel,
                    } => {
                        if let Some(level) = stream.collect_string_value()? {
                            sc.depth = Depth::parse(level.as_bytes()).ok_or(
                                Error::InvalidValue {
                                    name: "sync-level",
                                    value: level,
                                },
                            )?;
                        }
                    }
                    name => return Err(name.into_unexpected()),
                },
                Token::ElementEnd => {
                    break;
                }
                Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                element => return Err(element.into_unexpected()),
            }
        }

        Ok(sc)
    }
}

impl Filter {
    fn parse(
        stream: &mut Tokenizer<'_>,
        raw: &RawElement<'_>,
        ns: Namespace,
    ) -> crate::parser::Result<Self> {
        let mut filter = Filter {
            ns,
            test: FilterTest::AnyOf,
            children: Vec::new(),
        };

        for attribute in raw.attributes() {
            if let Attribute::Test(test) = attribute? {
                filter.test = test;
            }
        }

        loop {
            match stream.token()? {
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: child_ns,
                            element: Element::CompFilter,
                        },
                    raw,
                } if child_ns == ns => {
                    filter
                        .children
                        .push(FilterNode::Component(CompFilter::parse(stream, &raw)?));
                }
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: child_ns,
                            element: Element::PropFilter,
                        },
                    raw,
                } if child_ns == ns => {
                    filter
                        .children
                        .push(FilterNode::Property(PropFilter::parse(stream, &raw, ns)?));
                }
                Token::ElementStart { raw, .. } | Token::UnknownElement(raw) => {
                    filter.children.push(FilterNode::Unexpected(raw.tag_name()));
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(filter)
    }
}

impl CompFilter {
    fn parse(stream: &mut Tokenizer<'_>, raw: &RawElement<'_>) -> crate::parser::Result<Self> {
        let mut filter = CompFilter {
            name: required_name(raw)?,
            ..Default::default()
        };

        loop {
            match stream.token()? {
                Token::ElementStart {
                    name:
                        NamedElement {
                            ns: Namespace::CalDav,
                            element,
                        },
                    raw,
                } => match element {
                    Element::IsNotDefined => {
                        filter.is_not_defined = true;
                        stream.seek_element_end()?;
                    }
                    Element::TimeRange => {
                        filter.time_range = TimeRange::from_raw(&raw)?;
                        stream.seek_element_end()?;
                    }
                    Element::PropFilter => {
                        filter
                            .prop_filters
                            .push(PropFilter::parse(stream, &raw, Namespace::CalDav)?);
                    }
                    Element::CompFilter => {
                        filter.comp_filters.push(CompFilter::parse(stream, &raw)?);
                    }
                    element => return Err(NamedElement::caldav(element).into_unexpected()),
                },
                Token::ElementStart { .. } | Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(filter)
    }
}

impl PropFilter {
    fn parse(
        stream: &mut Tokenizer<'_>,
        raw: &RawElement<'_>,
        ns: Namespace,
    ) -> crate::parser::Result<Self> {
        let mut filter = PropFilter::default();

        for attribute in raw.attributes() {
            match attribute? {
                Attribute::Name(name) => match name.split_once('.') {
                    Some((group, name)) if ns == Namespace::CardDav => {
                        filter.group = Some(group.to_string());
                        filter.name = name.to_string();
                    }
                    _ => {
                        filter.name = name;
                    }
                },
                Attribute::Test(test) => {
                    filter.test = test;
                }
                _ => {}
            }
        }

        if filter.name.is_empty() {
            return Err(Error::MissingAttribute {
                element: raw.tag_name(),
                attribute: "name",
            });
        }

        loop {
            match stream.token()? {
                Token::ElementStart { name, raw } if name.ns == ns => match name.element {
                    Element::IsNotDefined => {
                        filter.is_not_defined = true;
                        stream.seek_element_end()?;
                    }
                    Element::TimeRange => {
                        filter.time_range = TimeRange::from_raw(&raw)?;
                        stream.seek_element_end()?;
                    }
                    Element::TextMatch => {
                        filter.text_matches.push(TextMatch::parse(stream, &raw)?);
                    }
                    Element::ParamFilter => {
                        filter.param_filters.push(ParamFilter::parse(stream, &raw, ns)?);
                    }
                    _ => return Err(name.into_unexpected()),
                },
                Token::ElementStart { .. } | Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(filter)
    }
}

impl ParamFilter {
    fn parse(
        stream: &mut Tokenizer<'_>,
        raw: &RawElement<'_>,
        ns: Namespace,
    ) -> crate::parser::Result<Self> {
        let mut filter = ParamFilter {
            name: required_name(raw)?,
            ..Default::default()
        };

        loop {
            match stream.token()? {
                Token::ElementStart { name, raw } if name.ns == ns => match name.element {
                    Element::IsNotDefined => {
                        filter.is_not_defined = true;
                        stream.seek_element_end()?;
                    }
                    Element::TextMatch => {
                        filter.text_match = TextMatch::parse(stream, &raw)?.into();
                    }
                    _ => return Err(name.into_unexpected()),
                },
                Token::ElementStart { .. } | Token::UnknownElement(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(filter)
    }
}

impl TextMatch {
    fn parse(stream: &mut Tokenizer<'_>, raw: &RawElement<'_>) -> crate::parser::Result<Self> {
        let mut tm = TextMatch::default();

        for attribute in raw.attributes() {
            match attribute? {
                Attribute::MatchType(match_type) => {
                    tm.match_type = match_type;
                }
                Attribute::NegateCondition(negate) => {
                    tm.negate = negate;
                }
                Attribute::Collation(collation) => {
                    tm.collation = collation;
                }
                _ => {}
            }
        }

        tm.value = stream.collect_string_value()?.unwrap_or_default();

        Ok(tm)
    }
}

impl Tokenizer<'_> {
    fn collect_limit(&mut self) -> crate::parser::Result<Option<u32>> {
        let mut limit = None;

        loop {
            match self.token()? {
                Token::ElementStart {
                    name:
                        NamedElement {
                            element: Element::Nresults,
                            ..
                        },
                    ..
                } => {
                    limit = self.parse_number()?;
                }
                Token::ElementStart { .. } | Token::UnknownElement(_) => {
                    self.seek_element_end()?;
                }
                Token::ElementEnd => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(limit)
    }
}

fn required_name(raw: &RawElement<'_>) -> crate::parser::Result<String> {
    for attribute in raw.attributes() {
        if let Attribute::Name(name) = attribute? {
            return Ok(name);
        }
    }

    Err(Error::MissingAttribute {
        element: raw.tag_name(),
        attribute: "name",
    })
}

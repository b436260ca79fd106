/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod calendar;
pub mod card;

use dav_proto::schema::{
    request::{Filter, FilterNode, FilterTest, ParamFilter, TextMatch},
    Collation, MatchType, Namespace,
};

use crate::{
    content::{ContentLine, DavContent},
    storage::CollectionKind,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("{0}")]
    Malformed(String),
    #[error("Unsupported filter {tag:?} for {kind:?}")]
    Unsupported { tag: String, kind: String },
}

/// Checks a query filter against the collection it targets. The whole tree
/// is walked, so a filter is rejected even when no item would reach the
/// offending branch.
pub fn validate(kind: Option<CollectionKind>, filter: &Filter) -> Result<(), FilterError> {
    match (kind, filter.ns) {
        (Some(CollectionKind::Calendar), Namespace::CalDav) => calendar::validate(filter),
        (Some(CollectionKind::AddressBook), Namespace::CardDav) => card::validate(filter),
        (kind, ns) => Err(FilterError::Unsupported {
            tag: format!("{{{}}}filter", ns.namespace()),
            kind: kind.map_or("none", |kind| kind.as_str()).to_string(),
        }),
    }
}

/// Evaluates a filter that passed [`validate`] against one item. Content
/// of the wrong format never matches.
pub fn matches(content: &DavContent, filter: &Filter) -> bool {
    match (content, filter.ns) {
        (DavContent::ICalendar(ical), Namespace::CalDav) => calendar::matches(ical, filter),
        (DavContent::VCard(card), Namespace::CardDav) => card::matches(card, filter),
        _ => false,
    }
}

pub(crate) fn unexpected_node(ns: Namespace, node: &FilterNode) -> FilterError {
    let tag = match node {
        FilterNode::Component(_) => format!("{}:comp-filter", ns.prefix()),
        FilterNode::Property(_) => format!("{}:prop-filter", ns.prefix()),
        FilterNode::Unexpected(tag) => tag.clone(),
    };

    FilterError::Malformed(format!("Unexpected <{tag}> in filter"))
}

pub(crate) fn validate_test(test: &FilterTest) -> Result<(), FilterError> {
    match test {
        FilterTest::AnyOf | FilterTest::AllOf => Ok(()),
        FilterTest::Unknown(test) => Err(FilterError::Malformed(format!(
            "Unsupported filter test: {test:?}"
        ))),
    }
}

pub(crate) fn validate_text_match(text_match: &TextMatch) -> Result<(), FilterError> {
    if let Collation::Unsupported(collation) = &text_match.collation {
        return Err(FilterError::Unsupported {
            tag: "text-match".to_string(),
            kind: format!("collation {collation}"),
        });
    }
    if let MatchType::Unsupported(match_type) = &text_match.match_type {
        return Err(FilterError::Unsupported {
            tag: "text-match".to_string(),
            kind: format!("match-type {match_type}"),
        });
    }
    Ok(())
}

pub(crate) fn validate_param_filters(params: &[ParamFilter]) -> Result<(), FilterError> {
    for param in params {
        if let Some(text_match) = &param.text_match {
            validate_text_match(text_match)?;
        }
    }
    Ok(())
}

/// Applies `test` over the `lines` named `name` (and in `group`, when
/// given). With `is_not_defined` no such line may exist.
pub(crate) fn property_matches<'x, L: ContentLine + 'x>(
    lines: impl IntoIterator<Item = &'x L>,
    name: &str,
    group: Option<&str>,
    is_not_defined: bool,
    test: impl Fn(&L) -> bool,
) -> bool {
    let mut lines = lines.into_iter().filter(|line| {
        line.property_name().eq_ignore_ascii_case(name)
            && group.is_none_or(|group| {
                line.property_group()
                    .is_some_and(|line_group| line_group.eq_ignore_ascii_case(group))
            })
    });

    if is_not_defined {
        lines.next().is_none()
    } else {
        lines.any(test)
    }
}

pub(crate) fn param_matches(line: &impl ContentLine, filter: &ParamFilter) -> bool {
    let params = line.parameters(&filter.name);

    if filter.is_not_defined {
        return params.is_empty();
    } else if params.is_empty() {
        return false;
    }

    match &filter.text_match {
        Some(text_match) => {
            params
                .iter()
                .flatten()
                .any(|value| raw_text_matches(value, text_match))
                ^ text_match.negate
        }
        None => true,
    }
}

/// Matches the textual values of `line`. A line without any is treated as
/// not matching before negation.
pub(crate) fn line_text_matches(line: &impl ContentLine, text_match: &TextMatch) -> bool {
    line.text_values()
        .iter()
        .any(|value| raw_text_matches(value, text_match))
        ^ text_match.negate
}

fn raw_text_matches(value: &str, text_match: &TextMatch) -> bool {
    let (value, pattern) = match text_match.collation {
        Collation::Octet => (value.to_string(), text_match.value.clone()),
        Collation::AsciiCasemap => (
            value.to_ascii_lowercase(),
            text_match.value.to_ascii_lowercase(),
        ),
        Collation::UnicodeCasemap => (value.to_lowercase(), text_match.value.to_lowercase()),
        Collation::Unsupported(_) => return false,
    };

    match text_match.match_type {
        MatchType::Equals => value == pattern,
        MatchType::Contains => value.contains(&pattern),
        MatchType::StartsWith => value.starts_with(&pattern),
        MatchType::EndsWith => value.ends_with(&pattern),
        MatchType::Unsupported(_) => false,
    }
}

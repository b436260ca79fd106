/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use calcard::vcard::{VCard, VCardEntry};
use dav_proto::schema::request::{Filter, FilterNode, FilterTest, PropFilter};

use super::{
    FilterError, line_text_matches, param_matches, property_matches, unexpected_node,
    validate_param_filters, validate_test, validate_text_match,
};

pub(super) fn validate(filter: &Filter) -> Result<(), FilterError> {
    validate_test(&filter.test)?;

    for node in &filter.children {
        let FilterNode::Property(prop_filter) = node else {
            return Err(unexpected_node(filter.ns, node));
        };

        validate_test(&prop_filter.test)?;
        for text_match in &prop_filter.text_matches {
            validate_text_match(text_match)?;
        }
        validate_param_filters(&prop_filter.param_filters)?;
    }

    Ok(())
}

pub(super) fn matches(card: &VCard, filter: &Filter) -> bool {
    let prop_filters = filter.children.iter().filter_map(|node| match node {
        FilterNode::Property(prop_filter) => Some(prop_filter),
        _ => None,
    });

    combine(&filter.test, prop_filters, |prop_filter| {
        prop_matches(card, prop_filter)
    })
}

fn prop_matches(card: &VCard, filter: &PropFilter) -> bool {
    property_matches(
        &card.entries,
        &filter.name,
        filter.group.as_deref(),
        filter.is_not_defined,
        |entry| entry_matches(entry, filter),
    )
}

fn entry_matches(entry: &VCardEntry, filter: &PropFilter) -> bool {
    if filter.text_matches.is_empty() && filter.param_filters.is_empty() {
        return true;
    }

    let text_results = filter
        .text_matches
        .iter()
        .map(|text_match| line_text_matches(entry, text_match));
    let param_results = filter
        .param_filters
        .iter()
        .map(|param_filter| param_matches(entry, param_filter));

    combine(&filter.test, text_results.chain(param_results), |result| result)
}

/// `anyof` is a logical OR and `allof` a logical AND. Over no conditions
/// `anyof` is false and `allof` is true.
fn combine<T>(test: &FilterTest, items: impl IntoIterator<Item = T>, eval: impl FnMut(T) -> bool) -> bool {
    let mut items = items.into_iter().map(eval);
    match test {
        FilterTest::AllOf => items.all(|result| result),
        FilterTest::AnyOf | FilterTest::Unknown(_) => items.any(|result| result),
    }
}

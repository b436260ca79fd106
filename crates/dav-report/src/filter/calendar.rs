/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::cell::OnceCell;

use calcard::{
    common::{IanaString, timezone::Tz},
    icalendar::{
        ICalendar, ICalendarComponent, ICalendarEntry, ICalendarProperty, dates::TimeOrDelta,
    },
};
use chrono::TimeDelta;
use dav_proto::schema::{
    property::TimeRange,
    request::{CompFilter, Filter, FilterNode, PropFilter},
};

use super::{
    FilterError, line_text_matches, param_matches, property_matches, unexpected_node,
    validate_param_filters, validate_text_match,
};

const MAX_EXPANSIONS: usize = 1024;

pub(super) fn validate(filter: &Filter) -> Result<(), FilterError> {
    match filter.children.as_slice() {
        [] => Ok(()),
        [FilterNode::Component(comp_filter)] => validate_comp_filter(comp_filter),
        [node] => Err(unexpected_node(filter.ns, node)),
        children => Err(FilterError::Malformed(format!(
            "Filter with {} children",
            children.len()
        ))),
    }
}

fn validate_comp_filter(filter: &CompFilter) -> Result<(), FilterError> {
    for prop_filter in &filter.prop_filters {
        for text_match in &prop_filter.text_matches {
            validate_text_match(text_match)?;
        }
        validate_param_filters(&prop_filter.param_filters)?;
    }

    filter
        .comp_filters
        .iter()
        .try_for_each(validate_comp_filter)
}

pub(super) fn matches(ical: &ICalendar, filter: &Filter) -> bool {
    let [FilterNode::Component(comp_filter)] = filter.children.as_slice() else {
        return filter.children.is_empty();
    };
    let Some(root) = ical.components.first() else {
        return false;
    };
    let query = CalendarQuery {
        ical,
        instances: OnceCell::new(),
    };

    // A filter naming the root (VCALENDAR) applies to it directly, anything
    // else is looked up among the root's sub-components.
    if root
        .component_type
        .as_str()
        .eq_ignore_ascii_case(&comp_filter.name)
    {
        !comp_filter.is_not_defined && query.comp_matches(0, root, comp_filter)
    } else {
        query.components_match(root, comp_filter)
    }
}

struct CalendarQuery<'x> {
    ical: &'x ICalendar,
    instances: OnceCell<Vec<Instance>>,
}

/// One occurrence of a component, as UTC timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Instance {
    comp_id: usize,
    start: i64,
    end: i64,
}

impl<'x> CalendarQuery<'x> {
    fn components_match(&self, parent: &'x ICalendarComponent, filter: &CompFilter) -> bool {
        let mut components = sub_components(self.ical, parent).filter(|(_, component)| {
            component
                .component_type
                .as_str()
                .eq_ignore_ascii_case(&filter.name)
        });

        if filter.is_not_defined {
            components.next().is_none()
        } else {
            components.any(|(comp_id, component)| self.comp_matches(comp_id, component, filter))
        }
    }

    fn comp_matches(
        &self,
        comp_id: usize,
        component: &'x ICalendarComponent,
        filter: &CompFilter,
    ) -> bool {
        filter
            .time_range
            .is_none_or(|range| self.component_in_range(comp_id, component, &range))
            && filter
                .prop_filters
                .iter()
                .all(|prop_filter| self.prop_matches(component, prop_filter))
            && filter
                .comp_filters
                .iter()
                .all(|comp_filter| self.components_match(component, comp_filter))
    }

    fn prop_matches(&self, component: &ICalendarComponent, filter: &PropFilter) -> bool {
        property_matches(
            &component.entries,
            &filter.name,
            None,
            filter.is_not_defined,
            |entry| {
                filter
                    .time_range
                    .is_none_or(|range| self.property_in_range(entry, &range))
                    && filter
                        .text_matches
                        .iter()
                        .all(|text_match| line_text_matches(entry, text_match))
                    && filter
                        .param_filters
                        .iter()
                        .all(|param_filter| param_matches(entry, param_filter))
            },
        )
    }

    fn component_in_range(
        &self,
        comp_id: usize,
        component: &ICalendarComponent,
        range: &TimeRange,
    ) -> bool {
        let mut instances = self
            .instances()
            .iter()
            .filter(|instance| instance.comp_id == comp_id)
            .peekable();

        if instances.peek().is_some() {
            instances.any(|instance| instance.in_range(range))
        } else {
            // Not expandable, fall back to its own start (or due) time.
            match component.entries.iter().find(|entry| {
                matches!(entry.name, ICalendarProperty::Dtstart | ICalendarProperty::Due)
            }) {
                Some(entry) => self
                    .timestamp(entry)
                    .is_some_and(|timestamp| range.contains(timestamp)),
                None => true,
            }
        }
    }

    fn property_in_range(&self, entry: &ICalendarEntry, range: &TimeRange) -> bool {
        self.timestamp(entry)
            .is_some_and(|timestamp| range.contains(timestamp))
    }

    /// Reads a DATE or DATE-TIME value in the time zone named by its TZID.
    /// Floating values are read as UTC.
    fn timestamp(&self, entry: &ICalendarEntry) -> Option<i64> {
        let date_time = entry.values.first()?.as_partial_date_time()?;
        let tz = match entry.tz_id() {
            Some(tz_id) => self.ical.build_tz_resolver().resolve_or_default(Some(tz_id)),
            None => Tz::UTC,
        };

        date_time
            .to_date_time_with_tz(tz)
            .map(|date_time| date_time.timestamp())
            .or_else(|| date_time.to_timestamp())
    }

    fn instances(&self) -> &[Instance] {
        self.instances.get_or_init(|| {
            let expanded = self.ical.expand_dates(Tz::UTC, MAX_EXPANSIONS);
            if !expanded.errors.is_empty() {
                tracing::debug!(
                    context = "dav",
                    event = "expand",
                    errors = expanded.errors.len(),
                    "Failed to expand some recurrences"
                );
            }

            expanded
                .events
                .into_iter()
                .map(|event| {
                    let start = event.start.timestamp();
                    let end = match event.end {
                        TimeOrDelta::Time(end) => end.timestamp(),
                        TimeOrDelta::Delta(delta) => instance_end(start, delta),
                    };

                    Instance {
                        comp_id: event.comp_id as usize,
                        start,
                        end,
                    }
                })
                .collect()
        })
    }
}

impl Instance {
    fn in_range(&self, range: &TimeRange) -> bool {
        if self.end > self.start {
            range.overlaps(self.start, self.end)
        } else {
            range.contains(self.start)
        }
    }
}

fn instance_end(start: i64, delta: TimeDelta) -> i64 {
    start.saturating_add(delta.num_seconds())
}

fn sub_components<'x>(
    ical: &'x ICalendar,
    parent: &'x ICalendarComponent,
) -> impl Iterator<Item = (usize, &'x ICalendarComponent)> {
    parent.component_ids.iter().filter_map(move |id| {
        let id = *id as usize;
        ical.components.get(id).map(|component| (id, component))
    })
}

/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::StatusCode;

use super::{request::DavPropertyValue, Namespaces};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiStatus {
    pub namespaces: Namespaces,
    pub encoding: &'static str,
    pub sync_token: Option<SyncToken>,
    pub response: List<Response>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub href: Href,
    pub typ: ResponseType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    PropStat(List<PropStat>),
    Status(Status),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropStat {
    pub prop: Prop,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop(pub List<DavPropertyValue>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub StatusCode);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Href(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<T>(pub Vec<T>);

impl<T> Default for List<T> {
    fn default() -> Self {
        List(Vec::new())
    }
}

impl<T> List<T> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<String> for Href {
    fn from(value: String) -> Self {
        Href(value)
    }
}

impl From<&str> for Href {
    fn from(value: &str) -> Self {
        Href(value.to_string())
    }
}

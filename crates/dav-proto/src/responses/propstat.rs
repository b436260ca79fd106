/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

use hyper::StatusCode;

use crate::schema::{
    request::DavPropertyValue,
    response::{List, Prop, PropStat, Status},
};

impl Display for PropStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<D:propstat>")?;
        self.prop.fmt(f)?;
        self.status.fmt(f)?;
        write!(f, "</D:propstat>")
    }
}

impl Display for Prop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<D:prop>{}</D:prop>", self.0)
    }
}

impl PropStat {
    pub fn new_list(props: Vec<DavPropertyValue>) -> Self {
        PropStat {
            prop: Prop(List(props)),
            status: Status(StatusCode::OK),
        }
    }

    pub fn with_prop(mut self, prop: impl Into<DavPropertyValue>) -> Self {
        self.prop.0 .0.push(prop.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Status(status);
        self
    }
}

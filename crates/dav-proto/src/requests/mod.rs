/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    parser::{tokenizer::Tokenizer, DavParser},
    schema::request::Report,
};

pub mod report;

impl Report {
    pub fn parse_bytes(bytes: &[u8]) -> crate::parser::Result<Self> {
        Report::parse(&mut Tokenizer::new(bytes))
    }
}

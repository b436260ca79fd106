/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod config;
pub mod content;
pub mod filter;
pub mod property;
pub mod report;
pub mod response;
pub mod storage;

use filter::FilterError;
use hyper::StatusCode;
use storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Bad filter: {0}")]
    Filter(#[from] FilterError),
    #[error("Timeout while reading request body")]
    RequestTimeout,
    #[error("No resource found at {0:?}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ReportError {
    pub fn status(&self) -> StatusCode {
        match self {
            ReportError::BadRequest(_) | ReportError::Filter(_) => StatusCode::BAD_REQUEST,
            ReportError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ReportError::NotFound(_) => StatusCode::NOT_FOUND,
            ReportError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<dav_proto::parser::Error> for ReportError {
    fn from(err: dav_proto::parser::Error) -> Self {
        ReportError::BadRequest(err.to_string())
    }
}

impl DavResponse {
    pub fn new(status: StatusCode) -> Self {
        DavResponse {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

impl From<ReportError> for DavResponse {
    fn from(err: ReportError) -> Self {
        DavResponse::new(err.status())
            .with_content_type("text/plain; charset=utf-8")
            .with_body(err.to_string())
    }
}

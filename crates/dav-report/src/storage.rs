/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{config::Charset, content::DavContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Calendar,
    AddressBook,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to acquire lock: {0}")]
    Lock(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Result of resolving a request path inside a locked storage view.
#[derive(Debug)]
pub enum DavNode<C> {
    Collection(C),
    Item { collection: C, href: String },
}

pub trait DavStorage: Sync + Send {
    type Item: DavItem;
    type Collection: DavCollection<Item = Self::Item>;
    type Lock<'x>: StorageLock<Collection = Self::Collection>
    where
        Self: 'x;

    /// Takes the shared lock guarding `path`. The guard releases it on drop.
    fn acquire_read_lock(
        &self,
        path: &str,
        principal: &str,
    ) -> Result<Self::Lock<'_>, StorageError>;
}

pub trait StorageLock {
    type Collection;

    fn discover(&self, path: &str) -> Result<Option<DavNode<Self::Collection>>, StorageError>;
}

pub trait DavCollection {
    type Item;

    fn kind(&self) -> Option<CollectionKind>;

    fn path(&self) -> &str;

    fn items(&self) -> Result<Vec<Self::Item>, StorageError>;
}

pub trait DavItem: Send {
    fn href(&self) -> &str;

    fn etag(&self) -> &str;

    fn serialize(&self) -> String;

    fn content(&self) -> &DavContent;

    fn content_type(&self, encoding: Charset) -> String {
        let content = self.content();
        match (content, content.main_component()) {
            (DavContent::VCard(_), _) => format!("text/vcard;charset={}", encoding.name()),
            (DavContent::ICalendar(_), Some(component)) => format!(
                "text/calendar;charset={};component={component}",
                encoding.name()
            ),
            (DavContent::ICalendar(_), None) => {
                format!("text/calendar;charset={}", encoding.name())
            }
        }
    }
}

impl CollectionKind {
    pub fn parse(tag: &str) -> Option<Self> {
        hashify::tiny_map_ignore_case!(tag.as_bytes(),
            "VCALENDAR" => CollectionKind::Calendar,
            "VADDRESSBOOK" => CollectionKind::AddressBook,
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Calendar => "VCALENDAR",
            CollectionKind::AddressBook => "VADDRESSBOOK",
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Relay-style connections built from persistence page slices.

use localmarket_domain::{EntityId, PageRequest, encode_cursor};
use localmarket_persistence::PageSlice;
use serde::Serialize;

/// Position information of a page.
///
/// Cursors are empty strings when the page has no edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: String,
    pub end_cursor: String,
    pub has_next_page: bool,
}

/// One node of a connection with its cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    /// Count of the whole filtered scope, ignoring the cursor.
    pub total_count: i64,
}

impl<T> Connection<T> {
    /// Builds a connection from a slice fetched with `page.fetch_limit()`.
    ///
    /// The row past `page.first` only signals that another page exists and
    /// is dropped.
    ///
    /// # Arguments
    ///
    /// * `slice` - Rows ordered by id plus the total count
    /// * `page` - The request the slice was fetched for
    /// * `id_of` - Returns the identifier of a row
    /// * `to_node` - Converts a row into its API view
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `to_node`.
    pub fn try_from_slice<R, E>(
        slice: PageSlice<R>,
        page: &PageRequest,
        id_of: impl Fn(&R) -> &EntityId,
        mut to_node: impl FnMut(R) -> Result<T, E>,
    ) -> Result<Self, E> {
        let PageSlice {
            mut items,
            total_count,
        } = slice;

        let limit: usize = usize::try_from(page.first).unwrap_or(0);
        let has_next_page: bool = items.len() > limit;
        items.truncate(limit);

        let mut edges: Vec<Edge<T>> = Vec::with_capacity(items.len());
        for item in items {
            let cursor: String = encode_cursor(id_of(&item));
            edges.push(Edge {
                cursor,
                node: to_node(item)?,
            });
        }

        let page_info: PageInfo = PageInfo {
            start_cursor: edges.first().map(|e| e.cursor.clone()).unwrap_or_default(),
            end_cursor: edges.last().map(|e| e.cursor.clone()).unwrap_or_default(),
            has_next_page,
        };

        Ok(Self {
            edges,
            page_info,
            total_count,
        })
    }

    /// Builds a connection with an infallible conversion.
    #[must_use]
    pub fn from_slice<R>(
        slice: PageSlice<R>,
        page: &PageRequest,
        id_of: impl Fn(&R) -> &EntityId,
        to_node: impl FnMut(R) -> T,
    ) -> Self {
        let mut to_node = to_node;
        match Self::try_from_slice(slice, page, id_of, |row| {
            Ok::<T, std::convert::Infallible>(to_node(row))
        }) {
            Ok(connection) => connection,
            Err(never) => match never {},
        }
    }

    /// Returns the nodes of the page in order.
    #[must_use]
    pub fn nodes(&self) -> Vec<&T> {
        self.edges.iter().map(|e| &e.node).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn ids(count: usize) -> Vec<EntityId> {
        (0..count).map(|_| EntityId::generate()).collect()
    }

    #[test]
    fn test_overfetched_row_sets_has_next_page() {
        let rows: Vec<EntityId> = ids(3);
        let page: PageRequest = PageRequest::new(Some(2), None).unwrap();

        let connection: Connection<String> = Connection::from_slice(
            PageSlice {
                items: rows.clone(),
                total_count: 7,
            },
            &page,
            |id| id,
            |id| id.to_string(),
        );

        assert_eq!(connection.edges.len(), 2);
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.page_info.start_cursor, encode_cursor(&rows[0]));
        assert_eq!(connection.page_info.end_cursor, encode_cursor(&rows[1]));
        assert_eq!(connection.total_count, 7);
    }

    #[test]
    fn test_last_page_has_no_next_page() {
        let rows: Vec<EntityId> = ids(2);
        let page: PageRequest = PageRequest::new(Some(2), None).unwrap();

        let connection: Connection<String> = Connection::from_slice(
            PageSlice {
                items: rows,
                total_count: 2,
            },
            &page,
            |id| id,
            |id| id.to_string(),
        );

        assert_eq!(connection.edges.len(), 2);
        assert!(!connection.page_info.has_next_page);
    }

    #[test]
    fn test_empty_page_uses_empty_cursors() {
        let page: PageRequest = PageRequest::new(None, None).unwrap();

        let connection: Connection<String> = Connection::from_slice(
            PageSlice {
                items: Vec::<EntityId>::new(),
                total_count: 0,
            },
            &page,
            |id| id,
            |id| id.to_string(),
        );

        let json: serde_json::Value = serde_json::to_value(&connection).unwrap();
        assert_eq!(json["edges"], serde_json::json!([]));
        assert_eq!(json["pageInfo"]["startCursor"], "");
        assert_eq!(json["pageInfo"]["endCursor"], "");
        assert_eq!(json["pageInfo"]["hasNextPage"], false);
        assert_eq!(json["totalCount"], 0);
    }

    #[test]
    fn test_conversion_error_is_returned() {
        let page: PageRequest = PageRequest::new(None, None).unwrap();

        let result: Result<Connection<String>, &str> = Connection::try_from_slice(
            PageSlice {
                items: ids(1),
                total_count: 1,
            },
            &page,
            |id| id,
            |_| Err("broken row"),
        );

        assert_eq!(result, Err("broken row"));
    }
}

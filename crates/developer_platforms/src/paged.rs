//! Cursor pagination over GraphQL connections.
//!
//! Any query whose result contains a connection of the shape
//! `{ pageInfo { hasNextPage endCursor } edges { node } }` can be traversed
//! with a [`PagedQuery`]. The query document must declare an `$after: String`
//! variable; it is set to `null` for the first page and to the previous
//! page's `endCursor` afterwards.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{errors::Error, QueryExecutor};

#[cfg(test)]
#[path = "paged_tests.rs"]
mod tests;

/// Default upper bound on the number of pages a single traversal may request.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    page_info: PageInfo,
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
}

/// A GraphQL query whose result holds a paginated connection of `T` nodes.
///
/// `page_path` is the list of object keys leading from the `data` member of
/// the response to the connection, e.g. `["recipeRun", "summaryResultsPages"]`.
#[derive(Debug)]
pub struct PagedQuery<T> {
    document: &'static str,
    page_path: &'static [&'static str],
    max_pages: usize,
    node: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> PagedQuery<T> {
    pub const fn new(document: &'static str, page_path: &'static [&'static str]) -> Self {
        Self {
            document,
            page_path,
            max_pages: DEFAULT_MAX_PAGES,
            node: PhantomData,
        }
    }

    /// Caps the number of pages `get_all` requests before failing with
    /// [`Error::PaginationLimitExceeded`].
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Fetch only the first page of results.
    pub async fn get_first_page<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        variables: Map<String, Value>,
    ) -> Result<Vec<T>, Error> {
        let connection = self.request_page(executor, None, &variables).await?;
        Ok(connection.edges.into_iter().map(|e| e.node).collect())
    }

    /// Fetch every page, in order, and return the concatenated nodes.
    ///
    /// Nothing is returned until the final page has been received.
    pub async fn get_all<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        variables: Map<String, Value>,
    ) -> Result<Vec<T>, Error> {
        let mut results = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0;

        loop {
            let connection = self
                .request_page(executor, after.as_deref(), &variables)
                .await?;
            pages += 1;
            results.extend(connection.edges.into_iter().map(|e| e.node));

            if !connection.page_info.has_next_page {
                break;
            }

            if pages >= self.max_pages {
                warn!(
                    pages,
                    results = results.len(),
                    "Paged query still reports further pages, giving up"
                );
                return Err(Error::PaginationLimitExceeded(self.max_pages));
            }

            after = match connection.page_info.end_cursor {
                Some(cursor) => Some(cursor),
                None => {
                    return Err(Error::InvalidResponse(
                        "page reports hasNextPage without an endCursor".to_string(),
                    ))
                }
            };
        }

        debug!(pages, results = results.len(), "Fetched all pages");
        Ok(results)
    }

    async fn request_page<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        after: Option<&str>,
        variables: &Map<String, Value>,
    ) -> Result<Connection<T>, Error> {
        let mut params = variables.clone();
        params.insert(
            "after".to_string(),
            after.map_or(Value::Null, |a| Value::String(a.to_string())),
        );

        let data = executor.execute(self.document, Value::Object(params)).await?;
        let page = self.select_page(data)?;

        serde_json::from_value(page).map_err(|e| {
            Error::InvalidResponse(format!(
                "page at '{}' could not be parsed: {}",
                self.page_path.join("."),
                e
            ))
        })
    }

    fn select_page(&self, mut data: Value) -> Result<Value, Error> {
        for key in self.page_path {
            data = match data {
                Value::Object(mut map) => map.remove(*key).ok_or_else(|| {
                    Error::InvalidResponse(format!("missing field '{}' in response", key))
                })?,
                _ => {
                    return Err(Error::InvalidResponse(format!(
                        "expected an object while looking up '{}'",
                        key
                    )))
                }
            };
        }
        Ok(data)
    }
}

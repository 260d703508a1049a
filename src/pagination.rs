use crate::datamall::{DataMallClient, DataMallError};
use log::{debug, warn};
use serde::de::DeserializeOwned;

/// Bulk datamall datasets page with `$skip` and do not reliably signal
/// end-of-data, so every fetch is bounded by a hard record cap on top of the
/// empty-page check.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedFetch<T> {
    pub records: Vec<T>,
    /// Set when the hard cap was reached before an empty page was seen.
    /// A data quality warning for the caller, not an error.
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ValueEnvelope<T> {
    #[serde(rename = "value", default)]
    pub value: Vec<T>,
}

#[allow(async_fn_in_trait)]
pub trait PageSource<T> {
    async fn page(&self, skip: u32) -> Result<Vec<T>, DataMallError>;
}

/// The real page source: one datamall dataset endpoint queried with `$skip`.
pub struct DatasetPages<'a> {
    pub client: &'a DataMallClient,
    pub path: &'a str,
}

impl<T: DeserializeOwned> PageSource<T> for DatasetPages<'_> {
    async fn page(&self, skip: u32) -> Result<Vec<T>, DataMallError> {
        let envelope: ValueEnvelope<T> = self
            .client
            .fetch_page(self.path, &[("$skip", skip.to_string())])
            .await?;
        Ok(envelope.value)
    }
}

/// Fetches pages starting at offset 0 until a page comes back empty or the
/// offset reaches `hard_cap` records, and flattens them in order. A failed
/// page fails the whole fetch; the loop never retries an offset.
pub async fn fetch_all<T, S: PageSource<T>>(
    source: &S,
    page_size: u32,
    hard_cap: u32,
) -> Result<PaginatedFetch<T>, DataMallError> {
    let mut records: Vec<T> = Vec::new();
    let mut skip = 0u32;
    let mut truncated = false;

    loop {
        let page = source.page(skip).await?;

        if page.is_empty() {
            break;
        }

        records.extend(page);
        skip += page_size;

        if skip >= hard_cap {
            truncated = true;
            warn!("pagination stopped at the {} record cap before an empty page", hard_cap);
            break;
        }

        debug!("accumulated {} records, next $skip={}", records.len(), skip);
    }

    Ok(PaginatedFetch { records, truncated })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SIZE: u32 = 500;

    /// Serves fixed pages by offset, then empty pages forever.
    struct ScriptedPages {
        pages: Vec<Vec<u32>>,
    }

    impl PageSource<u32> for ScriptedPages {
        async fn page(&self, skip: u32) -> Result<Vec<u32>, DataMallError> {
            let page_index = (skip / PAGE_SIZE) as usize;
            Ok(self.pages.get(page_index).cloned().unwrap_or_default())
        }
    }

    /// Never runs out of records, like the datamall endpoints that keep
    /// answering with full pages past the end of the dataset.
    struct BottomlessPages;

    impl PageSource<u32> for BottomlessPages {
        async fn page(&self, skip: u32) -> Result<Vec<u32>, DataMallError> {
            Ok((skip..skip + PAGE_SIZE).collect())
        }
    }

    #[tokio::test]
    async fn complete_dataset_is_returned_without_truncation() {
        let source = ScriptedPages {
            pages: vec![
                (0..500).collect(),
                (500..1000).collect(),
                (1000..1200).collect(),
            ],
        };

        let fetch = fetch_all(&source, PAGE_SIZE, 30_000).await.unwrap();

        assert_eq!(fetch.records.len(), 1200);
        assert!(!fetch.truncated);

        let unique: std::collections::HashSet<u32> = fetch.records.iter().copied().collect();
        assert_eq!(unique.len(), 1200, "no record may be fetched twice");
        assert_eq!(fetch.records, (0..1200).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn empty_first_page_yields_empty_fetch() {
        let source = ScriptedPages { pages: vec![] };

        let fetch = fetch_all(&source, PAGE_SIZE, 30_000).await.unwrap();

        assert!(fetch.records.is_empty());
        assert!(!fetch.truncated);
    }

    #[tokio::test]
    async fn bottomless_source_stops_at_the_cap_and_flags_truncation() {
        let fetch = fetch_all(&BottomlessPages, PAGE_SIZE, 8_000).await.unwrap();

        assert_eq!(fetch.records.len(), 8_000);
        assert!(fetch.truncated);
    }

    #[tokio::test]
    async fn partial_page_does_not_terminate_the_loop() {
        // a short page mid-dataset must not be mistaken for end-of-data
        let source = ScriptedPages {
            pages: vec![(0..500).collect(), (500..503).collect(), (503..700).collect()],
        };

        let fetch = fetch_all(&source, PAGE_SIZE, 30_000).await.unwrap();

        assert_eq!(fetch.records.len(), 700);
        assert!(!fetch.truncated);
    }
}

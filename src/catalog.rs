// Bulk catalog operations: the paginated datamall datasets, the derived
// route indices built from them, and the TTL cache wiring in front of the
// semi-static ones.

use crate::cache::ResultCache;
use crate::datamall::{DataMallClient, DataMallError};
use crate::models::{BusServiceRecord, BusStopRecord, RouteRecord};
use crate::pagination::{self, DatasetPages, PaginatedFetch};
use crate::route_index::{self, RouteIndex};
use compact_str::CompactString;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

pub const BUS_ROUTES_PATH: &str = "ltaodataservice/BusRoutes";
pub const BUS_STOPS_PATH: &str = "ltaodataservice/BusStops";
pub const BUS_SERVICES_PATH: &str = "ltaodataservice/BusServices";

pub const PAGE_SIZE: u32 = 500;

// The datamall does not reliably signal end-of-data, so each dataset gets a
// cap sized to its observed row count.
pub const BUS_ROUTES_HARD_CAP: u32 = 30_000;
pub const BUS_STOPS_HARD_CAP: u32 = 8_000;
pub const BUS_SERVICES_HARD_CAP: u32 = 1_000;

/// Semi-static catalogs are refreshed from upstream at most every two days.
pub const CATALOG_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 2);

pub const ROUTE_EXTRACTION_CACHE_KEY: &str = "busRoute";
pub const BUS_SERVICES_CACHE_KEY: &str = "busServices";

pub async fn fetch_bus_routes(
    client: &DataMallClient,
) -> Result<PaginatedFetch<RouteRecord>, DataMallError> {
    let pages = DatasetPages {
        client,
        path: BUS_ROUTES_PATH,
    };
    pagination::fetch_all(&pages, PAGE_SIZE, BUS_ROUTES_HARD_CAP).await
}

pub async fn fetch_bus_stops(
    client: &DataMallClient,
) -> Result<PaginatedFetch<BusStopRecord>, DataMallError> {
    let pages = DatasetPages {
        client,
        path: BUS_STOPS_PATH,
    };
    pagination::fetch_all(&pages, PAGE_SIZE, BUS_STOPS_HARD_CAP).await
}

pub async fn fetch_bus_services(
    client: &DataMallClient,
) -> Result<PaginatedFetch<BusServiceRecord>, DataMallError> {
    let pages = DatasetPages {
        client,
        path: BUS_SERVICES_PATH,
    };
    pagination::fetch_all(&pages, PAGE_SIZE, BUS_SERVICES_HARD_CAP).await
}

/// A full route extraction run: the whole BusRoutes dataset reindexed from
/// scratch. Truncation is carried through as a data quality flag, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteExtraction {
    #[serde(flatten)]
    pub index: RouteIndex,
    pub truncated: bool,
}

pub async fn extract_routes(client: &DataMallClient) -> Result<RouteExtraction, DataMallError> {
    let fetch = fetch_bus_routes(client).await?;

    if fetch.truncated {
        warn!("the bus route dataset hit its hard cap, the derived indices may be incomplete");
    }

    info!("indexing {} bus route rows", fetch.records.len());
    let index = route_index::build(&fetch.records);

    Ok(RouteExtraction {
        index,
        truncated: fetch.truncated,
    })
}

pub async fn extract_routes_cached(
    client: &DataMallClient,
    cache: &ResultCache<Arc<RouteExtraction>>,
) -> Result<Arc<RouteExtraction>, DataMallError> {
    if let Some(cached) = cache.get(ROUTE_EXTRACTION_CACHE_KEY) {
        return Ok(cached);
    }

    let extraction = Arc::new(extract_routes(client).await?);
    cache.set(ROUTE_EXTRACTION_CACHE_KEY, extraction.clone(), CATALOG_TTL);
    Ok(extraction)
}

pub async fn fetch_bus_services_cached(
    client: &DataMallClient,
    cache: &ResultCache<Arc<Vec<BusServiceRecord>>>,
) -> Result<Arc<Vec<BusServiceRecord>>, DataMallError> {
    if let Some(cached) = cache.get(BUS_SERVICES_CACHE_KEY) {
        return Ok(cached);
    }

    let fetch = fetch_bus_services(client).await?;
    let records = Arc::new(fetch.records);
    cache.set(BUS_SERVICES_CACHE_KEY, records.clone(), CATALOG_TTL);
    Ok(records)
}

/// A bus stop row joined with the services that visit it, the shape the stop
/// directory is stored and served in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusStopWithServices {
    pub bus_stop_code: CompactString,
    pub road_name: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub services: Vec<CompactString>,
}

pub fn annotate_stops(stops: Vec<BusStopRecord>, index: &RouteIndex) -> Vec<BusStopWithServices> {
    stops
        .into_iter()
        .map(|stop| {
            let services = index
                .services_for_stop(&stop.bus_stop_code)
                .map(|services| services.to_vec())
                .unwrap_or_default();

            BusStopWithServices {
                bus_stop_code: stop.bus_stop_code,
                road_name: stop.road_name,
                description: stop.description,
                latitude: stop.latitude,
                longitude: stop.longitude,
                services,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataMallConfig;

    fn offline_client() -> DataMallClient {
        let mut config = DataMallConfig::new("test-key".to_string());
        config.base_url = "http://127.0.0.1:1".to_string();
        DataMallClient::new(&config).unwrap()
    }

    fn sample_index() -> RouteIndex {
        let rows = vec![
            RouteRecord {
                service_no: "15".into(),
                operator: "GAS".to_string(),
                direction: Some(1),
                stop_sequence: Some(1),
                bus_stop_code: "83139".into(),
                distance: Some(0.0),
                ..blank_row()
            },
            RouteRecord {
                service_no: "2".into(),
                operator: "GAS".to_string(),
                direction: Some(1),
                stop_sequence: Some(4),
                bus_stop_code: "83139".into(),
                distance: Some(1.2),
                ..blank_row()
            },
        ];
        route_index::build(&rows)
    }

    fn blank_row() -> RouteRecord {
        RouteRecord {
            service_no: "".into(),
            operator: String::new(),
            direction: None,
            stop_sequence: None,
            bus_stop_code: "".into(),
            distance: None,
            weekday_first_bus: String::new(),
            weekday_last_bus: String::new(),
            saturday_first_bus: String::new(),
            saturday_last_bus: String::new(),
            sunday_first_bus: String::new(),
            sunday_last_bus: String::new(),
        }
    }

    #[test]
    fn annotate_stops_joins_the_stop_service_index() {
        let index = sample_index();
        let stops = vec![
            BusStopRecord {
                bus_stop_code: "83139".into(),
                road_name: "Hougang Ave 1".to_string(),
                description: "Blk 212".to_string(),
                latitude: Some(1.36),
                longitude: Some(103.89),
            },
            BusStopRecord {
                bus_stop_code: "00001".into(),
                road_name: "Nowhere".to_string(),
                description: "Unserved".to_string(),
                latitude: None,
                longitude: None,
            },
        ];

        let annotated = annotate_stops(stops, &index);

        assert_eq!(
            annotated[0].services,
            vec![CompactString::from("2"), CompactString::from("15")]
        );
        assert!(annotated[1].services.is_empty());
    }

    #[tokio::test]
    async fn cached_extraction_short_circuits_the_upstream() {
        let cache: ResultCache<Arc<RouteExtraction>> = ResultCache::new();
        let preloaded = Arc::new(RouteExtraction {
            index: sample_index(),
            truncated: false,
        });
        cache.set(ROUTE_EXTRACTION_CACHE_KEY, preloaded.clone(), CATALOG_TTL);

        // the client points at a closed port, so any upstream call would fail
        let extraction = extract_routes_cached(&offline_client(), &cache)
            .await
            .unwrap();

        assert_eq!(extraction, preloaded);
    }
}

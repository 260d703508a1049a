// Normalizes the whole-stop BusArrival payload into fixed-shape arrival
// records. Once the raw payload is in hand everything here is local: a bad
// slot degrades to sentinel values and a bad service entry is dropped, the
// stop's response never fails on per-service problems.

use crate::datamall::{DataMallClient, DataMallError};
use crate::models::{
    AggregatedArrival, ArrivalEnvelope, ArrivalPrediction, BusFeature, BusLoad, BusType,
    NO_ARRIVAL_DATA, RawBusPrediction, RawBusService,
};
use crate::service_order::service_number_key;
use ahash::AHashSet;
use chrono::DateTime;
use chrono_tz::Tz;
use compact_str::CompactString;
use futures::future::join_all;
use itertools::Itertools;
use log::warn;

pub const ARRIVAL_PATH: &str = "ltaodataservice/v3/BusArrival";

/// Which services of a stop the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFilter {
    All,
    Only(AHashSet<CompactString>),
}

impl ServiceFilter {
    /// Parses the comma separated request form, e.g. `"2,12B"` or `"all"`.
    pub fn parse(raw: &str) -> ServiceFilter {
        let requested: AHashSet<CompactString> = raw
            .split(',')
            .filter(|part| !part.is_empty())
            .map(CompactString::from)
            .collect();

        if requested.contains("all") {
            ServiceFilter::All
        } else {
            ServiceFilter::Only(requested)
        }
    }

    pub fn matches(&self, service_no: &str) -> bool {
        match self {
            ServiceFilter::All => true,
            ServiceFilter::Only(requested) => requested.contains(service_no),
        }
    }
}

/// Minutes until an estimated arrival, floored. Anything already past counts
/// as due now, the clock skew between the datamall and this process is well
/// under a minute. Empty or unparseable timestamps yield the sentinel.
pub fn minutes_until(estimated_arrival: &str, now: DateTime<Tz>) -> i32 {
    if estimated_arrival.is_empty() {
        return NO_ARRIVAL_DATA;
    }

    match DateTime::parse_from_rfc3339(estimated_arrival) {
        Ok(target) => {
            let minutes = target.signed_duration_since(now).num_seconds().div_euclid(60);
            i32::try_from(minutes.max(0)).unwrap_or(i32::MAX)
        }
        Err(_) => {
            warn!("unparseable estimated arrival {:?}", estimated_arrival);
            NO_ARRIVAL_DATA
        }
    }
}

fn normalize_slot(slot: Option<&RawBusPrediction>, now: DateTime<Tz>) -> ArrivalPrediction {
    let Some(raw) = slot else {
        return ArrivalPrediction::sentinel();
    };

    let minutes_to_arrival = minutes_until(&raw.estimated_arrival, now);
    if minutes_to_arrival == NO_ARRIVAL_DATA {
        return ArrivalPrediction::sentinel();
    }

    ArrivalPrediction {
        minutes_to_arrival,
        load: BusLoad::parse(&raw.load),
        bus_type: BusType::parse(&raw.bus_type),
        feature: BusFeature::parse(&raw.feature),
        monitored: raw.monitored,
        latitude: raw.latitude,
        longitude: raw.longitude,
    }
}

/// One service entry down to its fixed three-slot record. `None` when the
/// entry has no service number at all.
pub fn normalize_service(raw: &RawBusService, now: DateTime<Tz>) -> Option<AggregatedArrival> {
    if raw.service_no.is_empty() {
        warn!("dropping an arrival entry without a service number");
        return None;
    }

    Some(AggregatedArrival {
        service_no: raw.service_no.clone(),
        operator: raw.operator.clone(),
        predictions: [
            normalize_slot(raw.next_bus.as_ref(), now),
            normalize_slot(raw.next_bus_2.as_ref(), now),
            normalize_slot(raw.next_bus_3.as_ref(), now),
        ],
    })
}

/// Filters and normalizes every service of a stop concurrently, then orders
/// the survivors naturally. Normalization order and output order are
/// deliberately decoupled, only the final sort determines the response order.
pub async fn aggregate(
    services: Vec<RawBusService>,
    filter: &ServiceFilter,
    now: DateTime<Tz>,
) -> Vec<AggregatedArrival> {
    let tasks = services
        .into_iter()
        .filter(|service| filter.matches(&service.service_no))
        .map(|service| async move { normalize_service(&service, now) });

    join_all(tasks)
        .await
        .into_iter()
        .flatten()
        .sorted_by_key(|arrival| service_number_key(&arrival.service_no))
        .collect()
}

/// The live path: fetch the whole-stop payload and aggregate it. An upstream
/// failure here fails the request, there is no partial-stop fallback.
pub async fn fetch_arrivals(
    client: &DataMallClient,
    bus_stop_code: &str,
    filter: &ServiceFilter,
    now: DateTime<Tz>,
) -> Result<Vec<AggregatedArrival>, DataMallError> {
    let envelope: ArrivalEnvelope = client
        .fetch_page(ARRIVAL_PATH, &[("BusStopCode", bus_stop_code.to_string())])
        .await?;

    Ok(aggregate(envelope.services, filter, now).await)
}

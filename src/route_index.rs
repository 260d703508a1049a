// Turns the flat BusRoutes rows into the two derived indices the rest of the
// system reads: per-service ordered stop sequences, and per-stop service
// lists. Both are rebuilt wholesale from a full extraction run, never patched
// incrementally.

use crate::models::RouteRecord;
use crate::service_order::service_number_key;
use ahash::AHashMap;
use compact_str::CompactString;
use itertools::Itertools;
use log::warn;
use std::collections::BTreeMap;

/// Rows without a direction are treated as direction 1, like the datamall
/// itself does for unidirectional services.
pub const DEFAULT_DIRECTION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionRoute {
    pub direction: u8,
    pub bus_stop_codes: Vec<CompactString>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRoutes {
    pub service_no: CompactString,
    pub routes: Vec<DirectionRoute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteIndex {
    /// Service-centric view, in natural service number order.
    pub services: Vec<ServiceRoutes>,
    /// Stop-centric view: every service that visits the stop, deduplicated
    /// across directions and in natural service number order.
    pub stop_services: BTreeMap<CompactString, Vec<CompactString>>,
    /// Rows dropped for missing a service number or stop code.
    pub skipped_records: u32,
}

impl RouteIndex {
    pub fn stops_for_service(&self, service_no: &str, direction: u8) -> Option<&[CompactString]> {
        self.services
            .iter()
            .find(|service| service.service_no == service_no)?
            .routes
            .iter()
            .find(|route| route.direction == direction)
            .map(|route| route.bus_stop_codes.as_slice())
    }

    pub fn services_for_stop(&self, bus_stop_code: &str) -> Option<&[CompactString]> {
        self.stop_services
            .get(bus_stop_code)
            .map(|services| services.as_slice())
    }
}

pub fn build(records: &[RouteRecord]) -> RouteIndex {
    // service -> direction -> sequence -> stop. The inner BTreeMap orders the
    // stops by sequence and makes duplicate (service, direction, sequence)
    // rows last-write-wins, a known quality quirk of the upstream dataset.
    let mut per_service: AHashMap<CompactString, BTreeMap<u8, BTreeMap<i32, CompactString>>> =
        AHashMap::new();
    let mut stop_services: BTreeMap<CompactString, Vec<CompactString>> = BTreeMap::new();
    let mut skipped_records = 0u32;

    for record in records {
        if record.service_no.is_empty() || record.bus_stop_code.is_empty() {
            skipped_records += 1;
            continue;
        }

        let direction = match record.direction {
            Some(2) => 2,
            _ => DEFAULT_DIRECTION,
        };
        let sequence = record.stop_sequence.unwrap_or(0);

        per_service
            .entry(record.service_no.clone())
            .or_default()
            .entry(direction)
            .or_default()
            .insert(sequence, record.bus_stop_code.clone());

        let services_here = stop_services.entry(record.bus_stop_code.clone()).or_default();
        if !services_here.contains(&record.service_no) {
            services_here.push(record.service_no.clone());
        }
    }

    if skipped_records > 0 {
        warn!(
            "dropped {} route rows without a service number or stop code",
            skipped_records
        );
    }

    for services_here in stop_services.values_mut() {
        services_here.sort_by_key(|service_no| service_number_key(service_no));
    }

    let services: Vec<ServiceRoutes> = per_service
        .into_iter()
        .map(|(service_no, directions)| ServiceRoutes {
            service_no,
            routes: directions
                .into_iter()
                .map(|(direction, stops)| DirectionRoute {
                    direction,
                    bus_stop_codes: stops.into_values().collect(),
                })
                .collect(),
        })
        .sorted_by_key(|service| service_number_key(&service.service_no))
        .collect();

    RouteIndex {
        services,
        stop_services,
        skipped_records,
    }
}

// ---------------------------------------------------------------------------
// Stop-centric detail documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstLastBus {
    pub first_bus: String,
    pub last_bus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTypeSchedules {
    pub weekday: FirstLastBus,
    pub saturday: FirstLastBus,
    pub sunday: FirstLastBus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopServiceDirection {
    pub direction: u8,
    pub stop_sequence: i32,
    pub distance: Option<f64>,
    pub schedules: DayTypeSchedules,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopServiceDetail {
    pub service_no: CompactString,
    pub operator: String,
    pub directions: BTreeMap<u8, StopServiceDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopDetail {
    pub bus_stop_code: CompactString,
    pub services: BTreeMap<CompactString, StopServiceDetail>,
}

/// The schedule-bearing stop view: per stop, per service, per direction, the
/// position along the route and first/last bus times by day type. Rows
/// already counted as malformed by [`build`] are skipped here too.
pub fn build_stop_details(records: &[RouteRecord]) -> BTreeMap<CompactString, StopDetail> {
    let mut stops: BTreeMap<CompactString, StopDetail> = BTreeMap::new();

    for record in records {
        if record.service_no.is_empty() || record.bus_stop_code.is_empty() {
            continue;
        }

        let direction = match record.direction {
            Some(2) => 2,
            _ => DEFAULT_DIRECTION,
        };

        let stop = stops
            .entry(record.bus_stop_code.clone())
            .or_insert_with(|| StopDetail {
                bus_stop_code: record.bus_stop_code.clone(),
                services: BTreeMap::new(),
            });

        let service = stop
            .services
            .entry(record.service_no.clone())
            .or_insert_with(|| StopServiceDetail {
                service_no: record.service_no.clone(),
                operator: record.operator.clone(),
                directions: BTreeMap::new(),
            });

        service.directions.insert(
            direction,
            StopServiceDirection {
                direction,
                stop_sequence: record.stop_sequence.unwrap_or(0),
                distance: record.distance,
                schedules: DayTypeSchedules {
                    weekday: FirstLastBus {
                        first_bus: record.weekday_first_bus.clone(),
                        last_bus: record.weekday_last_bus.clone(),
                    },
                    saturday: FirstLastBus {
                        first_bus: record.saturday_first_bus.clone(),
                        last_bus: record.saturday_last_bus.clone(),
                    },
                    sunday: FirstLastBus {
                        first_bus: record.sunday_first_bus.clone(),
                        last_bus: record.sunday_last_bus.clone(),
                    },
                },
            },
        );
    }

    stops
}

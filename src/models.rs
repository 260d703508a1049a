// Typed views of the LTA DataMall payloads. The datamall is loose about
// types across API versions (numbers arrive quoted, optional fields arrive as
// "", 0, or are missing entirely), so deserialization is tolerant and the
// malformed-record decisions happen in the indexing and aggregation passes.

use compact_str::CompactString;
use serde::Deserialize;
use serde::de::Deserializer;
use serde::ser::Serializer;

/// Sentinel for "no arrival data for this slot", distinct from a legitimate
/// zero ("due now").
pub const NO_ARRIVAL_DATA: i32 = -100;

// ---------------------------------------------------------------------------
// Upstream catalog rows
// ---------------------------------------------------------------------------

/// One row of the `BusRoutes` dataset: a single (service, direction, stop)
/// visit with its position along the route and the first/last bus times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    #[serde(rename = "ServiceNo", default)]
    pub service_no: CompactString,
    #[serde(rename = "Operator", default)]
    pub operator: String,
    #[serde(rename = "Direction", default, deserialize_with = "de_opt_u8")]
    pub direction: Option<u8>,
    #[serde(rename = "StopSequence", default, deserialize_with = "de_opt_i32")]
    pub stop_sequence: Option<i32>,
    #[serde(rename = "BusStopCode", default)]
    pub bus_stop_code: CompactString,
    #[serde(rename = "Distance", default, deserialize_with = "de_opt_f64")]
    pub distance: Option<f64>,
    #[serde(rename = "WD_FirstBus", default)]
    pub weekday_first_bus: String,
    #[serde(rename = "WD_LastBus", default)]
    pub weekday_last_bus: String,
    #[serde(rename = "SAT_FirstBus", default)]
    pub saturday_first_bus: String,
    #[serde(rename = "SAT_LastBus", default)]
    pub saturday_last_bus: String,
    #[serde(rename = "SUN_FirstBus", default)]
    pub sunday_first_bus: String,
    #[serde(rename = "SUN_LastBus", default)]
    pub sunday_last_bus: String,
}

/// One row of the `BusStops` dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStopRecord {
    #[serde(rename = "BusStopCode", default)]
    pub bus_stop_code: CompactString,
    #[serde(rename = "RoadName", default)]
    pub road_name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Latitude", default, deserialize_with = "de_opt_f64")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default, deserialize_with = "de_opt_f64")]
    pub longitude: Option<f64>,
}

/// One row of the `BusServices` dataset. Deserializes from the datamall's
/// PascalCase-with-underscores names and serializes camelCased for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusServiceRecord {
    #[serde(rename(deserialize = "ServiceNo", serialize = "serviceNo"), default)]
    pub service_no: CompactString,
    #[serde(rename(deserialize = "Operator", serialize = "operator"), default)]
    pub operator: String,
    #[serde(
        rename(deserialize = "Direction", serialize = "direction"),
        default,
        deserialize_with = "de_opt_u8"
    )]
    pub direction: Option<u8>,
    #[serde(rename(deserialize = "Category", serialize = "category"), default)]
    pub category: String,
    #[serde(rename(deserialize = "OriginCode", serialize = "originCode"), default)]
    pub origin_code: CompactString,
    #[serde(
        rename(deserialize = "DestinationCode", serialize = "destinationCode"),
        default
    )]
    pub destination_code: CompactString,
    #[serde(rename(deserialize = "AM_Peak_Freq", serialize = "amPeakFreq"), default)]
    pub am_peak_freq: String,
    #[serde(
        rename(deserialize = "AM_Offpeak_Freq", serialize = "amOffpeakFreq"),
        default
    )]
    pub am_offpeak_freq: String,
    #[serde(rename(deserialize = "PM_Peak_Freq", serialize = "pmPeakFreq"), default)]
    pub pm_peak_freq: String,
    #[serde(
        rename(deserialize = "PM_Offpeak_Freq", serialize = "pmOffpeakFreq"),
        default
    )]
    pub pm_offpeak_freq: String,
    #[serde(rename(deserialize = "LoopDesc", serialize = "loopDesc"), default)]
    pub loop_desc: String,
}

// ---------------------------------------------------------------------------
// Upstream live arrival payloads
// ---------------------------------------------------------------------------

/// The whole-stop `BusArrival` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArrivalEnvelope {
    #[serde(rename = "BusStopCode", default)]
    pub bus_stop_code: CompactString,
    #[serde(rename = "Services", default)]
    pub services: Vec<RawBusService>,
}

/// One service at one stop, with up to three positional predictions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBusService {
    #[serde(rename = "ServiceNo", default)]
    pub service_no: CompactString,
    #[serde(rename = "Operator", default)]
    pub operator: String,
    #[serde(rename = "NextBus", default)]
    pub next_bus: Option<RawBusPrediction>,
    #[serde(rename = "NextBus2", default)]
    pub next_bus_2: Option<RawBusPrediction>,
    #[serde(rename = "NextBus3", default)]
    pub next_bus_3: Option<RawBusPrediction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBusPrediction {
    #[serde(rename = "EstimatedArrival", default)]
    pub estimated_arrival: String,
    #[serde(rename = "Load", default)]
    pub load: String,
    #[serde(rename = "Feature", default)]
    pub feature: String,
    #[serde(rename = "Type", default)]
    pub bus_type: String,
    #[serde(rename = "Monitored", default, deserialize_with = "de_opt_bool")]
    pub monitored: Option<bool>,
    #[serde(rename = "Latitude", default, deserialize_with = "de_opt_f64")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default, deserialize_with = "de_opt_f64")]
    pub longitude: Option<f64>,
    #[serde(rename = "VisitNumber", default)]
    pub visit_number: String,
    #[serde(rename = "OriginCode", default)]
    pub origin_code: CompactString,
    #[serde(rename = "DestinationCode", default)]
    pub destination_code: CompactString,
}

// ---------------------------------------------------------------------------
// Normalized arrival records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusLoad {
    #[serde(rename = "seatedAvailable")]
    SeatedAvailable,
    #[serde(rename = "standingAvailable")]
    StandingAvailable,
    #[serde(rename = "limitedStanding")]
    LimitedStanding,
    #[default]
    #[serde(rename = "-")]
    Unknown,
}

impl BusLoad {
    pub fn parse(code: &str) -> BusLoad {
        match code {
            "SEA" | "SDA" => BusLoad::SeatedAvailable,
            "STA" => BusLoad::StandingAvailable,
            "LSD" => BusLoad::LimitedStanding,
            _ => BusLoad::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusType {
    #[serde(rename = "singleDeck")]
    SingleDeck,
    #[serde(rename = "doubleDeck")]
    DoubleDeck,
    #[default]
    #[serde(rename = "-")]
    Unknown,
}

impl BusType {
    pub fn parse(code: &str) -> BusType {
        match code {
            "SD" => BusType::SingleDeck,
            "DD" => BusType::DoubleDeck,
            _ => BusType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusFeature {
    #[serde(rename = "wheelchairAccessible")]
    WheelchairAccessible,
    #[default]
    #[serde(rename = "-")]
    Unknown,
}

impl BusFeature {
    pub fn parse(code: &str) -> BusFeature {
        match code {
            "WAB" => BusFeature::WheelchairAccessible,
            _ => BusFeature::Unknown,
        }
    }
}

/// One normalized prediction slot. Every service always carries exactly three
/// of these; slots the datamall omitted are sentinel-filled, never dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalPrediction {
    pub minutes_to_arrival: i32,
    pub load: BusLoad,
    #[serde(rename = "type")]
    pub bus_type: BusType,
    pub feature: BusFeature,
    pub monitored: Option<bool>,
    #[serde(serialize_with = "ser_opt_coord")]
    pub latitude: Option<f64>,
    #[serde(serialize_with = "ser_opt_coord")]
    pub longitude: Option<f64>,
}

impl ArrivalPrediction {
    pub fn sentinel() -> ArrivalPrediction {
        ArrivalPrediction {
            minutes_to_arrival: NO_ARRIVAL_DATA,
            load: BusLoad::Unknown,
            bus_type: BusType::Unknown,
            feature: BusFeature::Unknown,
            monitored: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// One service's normalized arrival answer for a stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedArrival {
    pub service_no: CompactString,
    pub operator: String,
    pub predictions: [ArrivalPrediction; 3],
}

// ---------------------------------------------------------------------------
// Tolerant field deserializers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(value)) => Some(value),
        Some(NumberOrText::Text(raw)) => raw.trim().parse::<f64>().ok(),
        None => None,
    })
}

pub fn de_opt_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(value)) => Some(value as i32),
        Some(NumberOrText::Text(raw)) => raw.trim().parse::<i32>().ok(),
        None => None,
    })
}

pub fn de_opt_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(value)) if (0.0..=255.0).contains(&value) => Some(value as u8),
        Some(NumberOrText::Number(_)) => None,
        Some(NumberOrText::Text(raw)) => raw.trim().parse::<u8>().ok(),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolIntOrText {
    Bool(bool),
    Int(i64),
    Text(String),
}

pub fn de_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<BoolIntOrText>::deserialize(deserializer)? {
        Some(BoolIntOrText::Bool(value)) => Some(value),
        Some(BoolIntOrText::Int(value)) => Some(value != 0),
        Some(BoolIntOrText::Text(raw)) => match raw.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        None => None,
    })
}

/// Missing coordinates serialize as the `"-"` sentinel, the same convention
/// as the other sentinel-filled slot fields.
fn ser_opt_coord<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(coord) => serializer.serialize_f64(*coord),
        None => serializer.serialize_str("-"),
    }
}

// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

// Catalog extraction job: pulls the bus route, stop, and service datasets
// from the LTA DataMall, rebuilds the derived indices, and upserts the
// resulting documents into the key-value store.

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use tembusu::catalog;
use tembusu::config::DataMallConfig;
use tembusu::datamall::DataMallClient;
use tembusu::route_index;
use tembusu::store::{DirectoryKvStore, KvStore};

#[derive(Parser)]
#[command(
    name = "angsana",
    about = "Extracts the datamall bus catalogs and writes the derived indices"
)]
struct Args {
    /// Directory the extracted documents are written into
    #[arg(long, default_value = "angsana_output")]
    out: PathBuf,

    /// Skip the bus stop catalog
    #[arg(long)]
    skip_stops: bool,

    /// Skip the bus service catalog
    #[arg(long)]
    skip_services: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let config = DataMallConfig::from_env()?;
    let client =
        DataMallClient::new(&config).context("could not construct the datamall client")?;
    let store = DirectoryKvStore::new(&args.out);
    let modified_at = chrono::Utc::now();

    let fetch = catalog::fetch_bus_routes(&client).await?;
    if fetch.truncated {
        warn!("bus route dataset was truncated at the hard cap, indices may be incomplete");
    }

    let index = route_index::build(&fetch.records);
    info!(
        "indexed {} services across {} stops ({} rows skipped)",
        index.services.len(),
        index.stop_services.len(),
        index.skipped_records
    );

    for service in &index.services {
        store
            .upsert(
                &format!("bus_route/{}", service.service_no),
                serde_json::to_value(service)?,
                modified_at,
            )
            .await?;
    }
    store
        .upsert(
            "bus_stop_services",
            serde_json::to_value(&index.stop_services)?,
            modified_at,
        )
        .await?;

    let details = route_index::build_stop_details(&fetch.records);
    for (bus_stop_code, detail) in &details {
        store
            .upsert(
                &format!("bus_route_raw/{}", bus_stop_code),
                serde_json::to_value(detail)?,
                modified_at,
            )
            .await?;
    }
    info!("wrote {} stop detail documents", details.len());

    if !args.skip_stops {
        let stops = catalog::fetch_bus_stops(&client).await?;
        if stops.truncated {
            warn!("bus stop dataset was truncated at the hard cap");
        }

        let annotated = catalog::annotate_stops(stops.records, &index);
        info!("wrote {} bus stops", annotated.len());
        store
            .upsert("bus_stops", serde_json::to_value(&annotated)?, modified_at)
            .await?;
    }

    if !args.skip_services {
        let services = catalog::fetch_bus_services(&client).await?;
        info!("wrote {} bus services", services.records.len());
        store
            .upsert(
                "bus_services",
                serde_json::to_value(&services.records)?,
                modified_at,
            )
            .await?;
    }

    info!("extraction complete");
    Ok(())
}

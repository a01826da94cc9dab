//! Queries against the `nodes` table.
//!
//! Every column is read as text so that stored coordinates can be compared
//! verbatim with geocoder output. Fixed-width `CHAR` columns are
//! right-trimmed in SQL.

use geofix_database_models::{NodeCoordinateUpdate, NodeRow};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Selects every node, oldest first.
pub const SELECT_ALL_NODES: &str = "SELECT
        node_id::bigint AS node_id,
        rtrim(location)::text AS location,
        rtrim(description)::text AS description,
        rtrim(address)::text AS address,
        rtrim(city)::text AS city,
        rtrim(state_province)::text AS state_province,
        rtrim(zip_postal_code)::text AS zip_postal_code,
        long::text AS longitude,
        lat::text AS latitude
     FROM nodes
     ORDER BY node_id";

/// Sets the coordinates of every node with a matching address.
///
/// Parameters: `$1` longitude, `$2` latitude, `$3` address. Coordinates are
/// bound as text and cast server-side so the stored value is exactly what
/// the geocoder returned.
pub const UPDATE_NODE_COORDINATES: &str = "UPDATE nodes
     SET long = $1::text::real, lat = $2::text::real
     WHERE address = $3";

/// Summary of an applied batch of coordinate updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Number of `UPDATE` statements executed.
    pub statements: u64,
    /// Total rows changed across all statements.
    pub rows_affected: u64,
    /// Statements whose address matched no node.
    pub unmatched: u64,
}

/// Returns every row of the `nodes` table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn fetch_all_nodes(db: &dyn Database) -> Result<Vec<NodeRow>, DbError> {
    let rows = db.query_raw_params(SELECT_ALL_NODES, &[]).await?;

    let nodes = rows
        .iter()
        .map(row_to_node)
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Fetched {} nodes", nodes.len());

    Ok(nodes)
}

fn row_to_node(row: &switchy_database::Row) -> Result<NodeRow, DbError> {
    let node_id: i64 = row.to_value("node_id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse node_id: {e}"),
    })?;

    Ok(NodeRow {
        node_id,
        location: row.to_value("location").unwrap_or(None),
        description: row.to_value("description").unwrap_or(None),
        address: row.to_value("address").unwrap_or(None),
        city: row.to_value("city").unwrap_or(None),
        state_province: row.to_value("state_province").unwrap_or(None),
        zip_postal_code: row.to_value("zip_postal_code").unwrap_or(None),
        longitude: row.to_value("longitude").unwrap_or(None),
        latitude: row.to_value("latitude").unwrap_or(None),
    })
}

/// Builds the bound parameters for [`UPDATE_NODE_COORDINATES`].
#[must_use]
pub fn update_params(update: &NodeCoordinateUpdate) -> [DatabaseValue; 3] {
    [
        DatabaseValue::String(update.longitude.clone()),
        DatabaseValue::String(update.latitude.clone()),
        DatabaseValue::String(update.address.clone()),
    ]
}

/// Applies all updates inside a single transaction and commits once.
///
/// If any statement fails the transaction is rolled back and nothing is
/// written. Updates whose address matches no node are logged and counted
/// in [`UpdateSummary::unmatched`].
///
/// # Errors
///
/// Returns [`DbError`] if the transaction cannot be started, a statement
/// fails, or the commit fails.
pub async fn apply_coordinate_updates(
    db: &dyn Database,
    updates: &[NodeCoordinateUpdate],
) -> Result<UpdateSummary, DbError> {
    let txn = db.begin_transaction().await?;
    let mut summary = UpdateSummary::default();

    for update in updates {
        log::debug!(
            "Updating '{}' to ({} {})",
            update.address,
            update.longitude,
            update.latitude
        );

        let affected = match txn
            .exec_raw_params(UPDATE_NODE_COORDINATES, &update_params(update))
            .await
        {
            Ok(n) => n,
            Err(e) => {
                log::error!("Update for '{}' failed, rolling back: {e}", update.address);
                if let Err(rollback_err) = txn.rollback().await {
                    log::error!("Rollback failed: {rollback_err}");
                }
                return Err(e.into());
            }
        };

        if affected == 0 {
            log::warn!("No node has address '{}'", update.address);
            summary.unmatched += 1;
        }

        summary.statements += 1;
        summary.rows_affected += affected;
    }

    txn.commit().await?;

    log::info!(
        "Committed {} updates ({} rows changed, {} unmatched)",
        summary.statements,
        summary.rows_affected,
        summary.unmatched
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_params_bind_longitude_latitude_address() {
        let update = NodeCoordinateUpdate {
            address: "42 Main St".to_string(),
            longitude: "-121.9".to_string(),
            latitude: "37.2".to_string(),
        };

        let params = update_params(&update);

        assert!(matches!(&params[0], DatabaseValue::String(s) if s == "-121.9"));
        assert!(matches!(&params[1], DatabaseValue::String(s) if s == "37.2"));
        assert!(matches!(&params[2], DatabaseValue::String(s) if s == "42 Main St"));
    }

    #[test]
    fn update_statement_targets_long_and_lat_by_address() {
        assert!(UPDATE_NODE_COORDINATES.contains("SET long = $1"));
        assert!(UPDATE_NODE_COORDINATES.contains("lat = $2"));
        assert!(UPDATE_NODE_COORDINATES.contains("WHERE address = $3"));
    }

    #[test]
    fn select_reads_coordinates_as_text() {
        assert!(SELECT_ALL_NODES.contains("long::text AS longitude"));
        assert!(SELECT_ALL_NODES.contains("lat::text AS latitude"));
        assert!(SELECT_ALL_NODES.contains("FROM nodes"));
    }
}

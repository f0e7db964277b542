//! Wire records returned by the licensing service
//!
//! Field names follow the service's JSON exactly; the tree types carry the
//! crate's own names.

use serde::Deserialize;

/// One element of the topic listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicRecord {
    #[serde(rename = "pTopicoID")]
    pub id: i64,
    #[serde(rename = "pNombre")]
    pub name: String,
}

/// One element of a topic's procedure listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcedureRecord {
    #[serde(rename = "TramiteId")]
    pub id: i64,
    #[serde(rename = "Nombre")]
    pub name: String,
}

/// One element of a region's branch listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchRecord {
    #[serde(rename = "pSucursalID")]
    pub id: i64,
    #[serde(rename = "pNombre")]
    pub name: String,
    #[serde(rename = "pDireccion", default)]
    pub address: String,
    /// Province the service reports for the branch; ownership is not taken from it
    #[serde(rename = "numeroProvincia", default)]
    pub province: Option<i64>,
}

//! Tree entities populated by a crawl run
//!
//! This module defines the crawl tree and the fetches that fill it:
//! - `Topic`: root of the procedure and region subtrees
//! - `Procedure`: leaf under a topic
//! - `Region`: statically configured subdivision under a topic
//! - `Branch`: service location inside a region
//! - `Appointment`: scheduling record attachable to a branch
//!
//! Child sequences start out unpopulated and are filled at most once.

mod appointment;
mod branch;
mod procedure;
mod records;
mod region;
mod topic;

pub use appointment::Appointment;
pub use branch::Branch;
pub use procedure::Procedure;
pub use records::{BranchRecord, ProcedureRecord, TopicRecord};
pub use region::Region;
pub use topic::Topic;

use crate::client::{Payload, RestClient};
use crate::FetchError;
use serde::de::DeserializeOwned;

/// POSTs `payload` to `url` and decodes the reply as a JSON array of `T`
///
/// A missing response, a non-2xx status, or an undecodable body all fail the
/// whole list: no partial sequence is ever returned.
pub(crate) async fn fetch_list<T: DeserializeOwned>(
    client: &RestClient,
    url: String,
    payload: Payload,
) -> Result<Vec<T>, FetchError> {
    let response = match client.post_form(&url, &payload).await {
        Some(response) => response,
        None => return Err(FetchError::NoResponse { url }),
    };

    if !response.is_success() {
        return Err(FetchError::Status {
            url,
            status: response.status,
        });
    }

    response
        .json()
        .map_err(|source| FetchError::Decode { url, source })
}

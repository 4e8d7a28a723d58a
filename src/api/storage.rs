/// Storage item endpoints
///
/// Wire shapes follow the backend envelopes: lists arrive as
/// `{ data: { items: [...] } }`, single items as
/// `{ data: { storageItem: {...} } }`.

use serde::Deserialize;

use super::{ApiError, Client};
use crate::state::data::{RawStorageItem, StorageItem};

#[derive(Debug, Deserialize)]
struct ItemsData {
    #[serde(default)]
    items: Vec<RawStorageItem>,
}

#[derive(Debug, Deserialize)]
struct ItemData {
    #[serde(rename = "storageItem")]
    storage_item: RawStorageItem,
}

/// `GET /storage` - all items for the logged-in user.
pub async fn list(client: Client) -> Result<Vec<StorageItem>, ApiError> {
    let data: ItemsData = client.send(client.get("/storage")).await?;
    Ok(data.items.into_iter().map(StorageItem::from).collect())
}

/// `GET /people/:id/storage` - items a given person appears in.
pub async fn list_for_person(
    client: Client,
    person_id: String,
) -> Result<Vec<StorageItem>, ApiError> {
    let path = format!("/people/{person_id}/storage");
    let data: ItemsData = client.send(client.get(&path)).await?;
    Ok(data.items.into_iter().map(StorageItem::from).collect())
}

/// `GET /storage/:id` - one item with its full recognition metadata.
pub async fn get(client: Client, id: String) -> Result<StorageItem, ApiError> {
    let path = format!("/storage/{id}");
    let data: ItemData = client.send(client.get(&path)).await?;
    Ok(data.storage_item.into())
}

/// `DELETE /storage/:id`
pub async fn delete(client: Client, id: String) -> Result<(), ApiError> {
    let path = format!("/storage/{id}");
    client.send_unit(client.delete(&path)).await
}

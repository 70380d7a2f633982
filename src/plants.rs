use crate::api::client::ApiClient;
use crate::api::error::Error;
use crate::api::models::Plant;
use crate::session::Session;

/// Whatever the cache has, newest first, so a shell can paint the plant
/// list before the network answers. An unreadable cache is just an empty
/// list.
pub fn cached(limit: Option<usize>) -> Vec<Plant> {
    match crate::storage::get_plants(limit) {
        Ok(plants) => plants,
        Err(e) => {
            log::warn!("plant cache read failed: {}", e);
            Vec::new()
        }
    }
}

/// Fetch the registry from the backend and fold it into the cache. Cache
/// trouble is logged, never fatal; the fresh list is returned either way.
pub async fn refresh(client: &ApiClient, session: &Session) -> Result<Vec<Plant>, Error> {
    let plants = client.plants(session).await?;
    if let Err(e) = crate::storage::upsert_plants(&plants) {
        log::warn!("plant cache update failed: {}", e);
    }
    Ok(plants)
}

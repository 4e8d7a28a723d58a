/// People endpoints
///
/// The list endpoint is server-paginated; the query carries page and
/// limit plus optional search/gender/type/status filters. Empty filter
/// values are omitted from the query string, like the web client did.

use serde::{Deserialize, Serialize};

use super::{ApiError, Client};
use crate::state::data::{PageMetadata, Person};

/// Query parameters for `GET /people`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeopleQuery {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub gender: String,
    pub person_type: String,
    pub status: String,
}

impl PeopleQuery {
    pub fn first_page(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            search: String::new(),
            gender: String::new(),
            person_type: String::new(),
            status: String::new(),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        for (key, value) in [
            ("search", &self.search),
            ("gender", &self.gender),
            ("type", &self.person_type),
            ("status", &self.status),
        ] {
            if !value.is_empty() {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

/// One page of people plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeoplePage {
    pub people: Vec<Person>,
    pub metadata: PageMetadata,
}

/// Fields accepted by the create/update endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub person_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// `GET /people?page&limit&search&gender&type&status`
pub async fn list(client: Client, query: PeopleQuery) -> Result<PeoplePage, ApiError> {
    client
        .send(client.get("/people").query(&query.params()))
        .await
}

/// `GET /people/:id`
pub async fn get(client: Client, id: String) -> Result<Person, ApiError> {
    let path = format!("/people/{id}");
    client.send(client.get(&path)).await
}

/// `POST /people`
pub async fn create(client: Client, draft: PersonDraft) -> Result<Person, ApiError> {
    client.send(client.post("/people").json(&draft)).await
}

/// `PUT /people/:id`
pub async fn update(client: Client, id: String, draft: PersonDraft) -> Result<Person, ApiError> {
    let path = format!("/people/{id}");
    client.send(client.put(&path).json(&draft)).await
}

/// `DELETE /people/:id`
pub async fn delete(client: Client, id: String) -> Result<(), ApiError> {
    let path = format!("/people/{id}");
    client.send_unit(client.delete(&path)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_are_omitted() {
        let query = PeopleQuery::first_page(20);
        let params = query.params();
        assert_eq!(
            params,
            vec![("page", "1".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn test_set_filters_are_sent() {
        let mut query = PeopleQuery::first_page(10);
        query.page = 3;
        query.search = "ada".to_string();
        query.person_type = "CELEBRITY".to_string();

        let params = query.params();
        assert!(params.contains(&("page", "3".to_string())));
        assert!(params.contains(&("search", "ada".to_string())));
        assert!(params.contains(&("type", "CELEBRITY".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "gender"));
    }
}

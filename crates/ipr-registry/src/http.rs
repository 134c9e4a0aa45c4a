use std::time::Duration;

use async_trait::async_trait;
use ipr_schemas::{Allocation, AllocationStatus};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{RegistryClient, RegistryError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Live HTTP adapter for a NetBox-compatible IPAM registry.
pub struct HttpRegistry {
    client: Client,
    base: String,
}

impl HttpRegistry {
    /// `base_url` is the instance root, e.g. `http://localhost:8000`; a
    /// trailing slash is tolerated. The token goes into every request as
    /// `Authorization: Token <token>`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Token {token}")).map_err(|_| {
            RegistryError::Decode {
                detail: "registry token contains invalid header characters".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::Transport {
                detail: e.to_string(),
            })?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, RegistryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::transport(&e))?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Value, RegistryError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RegistryError::Auth {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(RegistryError::Api {
            status: status.as_u16(),
            detail,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| RegistryError::Decode {
            detail: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Page {
    results: Vec<WireAllocation>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct WireAllocation {
    id: i64,
    address: String,
    status: WireStatus,
    #[serde(default)]
    description: String,
    #[serde(default)]
    dns_name: String,
}

/// The registry nests status as `{"value": "active", "label": "Active"}`.
#[derive(Deserialize)]
struct WireStatus {
    value: String,
}

fn into_allocation(wire: WireAllocation) -> Result<Allocation, RegistryError> {
    let status =
        AllocationStatus::from_wire(&wire.status.value).ok_or_else(|| RegistryError::Decode {
            detail: format!(
                "unknown status {:?} on allocation {}",
                wire.status.value, wire.address
            ),
        })?;
    Ok(Allocation {
        id: wire.id,
        address: wire.address,
        status,
        description: wire.description,
        dns_name: wire.dns_name,
    })
}

fn parse_page(value: Value) -> Result<(Vec<Allocation>, Option<String>), RegistryError> {
    let page: Page = serde_json::from_value(value).map_err(|e| RegistryError::Decode {
        detail: e.to_string(),
    })?;
    let next = page.next;
    let allocations = page
        .results
        .into_iter()
        .map(into_allocation)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((allocations, next))
}

#[async_trait]
impl RegistryClient for HttpRegistry {
    async fn version(&self) -> Result<String, RegistryError> {
        let value = self.get_json(&format!("{}/api/status/", self.base)).await?;
        Ok(value
            .get("netbox-version")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    async fn query_active(&self, prefix: &str) -> Result<Vec<Allocation>, RegistryError> {
        let mut url = format!(
            "{}/api/ipam/ip-addresses/?parent={}&status=active",
            self.base, prefix
        );
        let mut out = Vec::new();

        // The listing endpoint paginates; follow `next` until exhausted.
        loop {
            let value = self.get_json(&url).await?;
            let (mut allocations, next) = parse_page(value)?;
            out.append(&mut allocations);
            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }

        debug!(prefix, count = out.len(), "queried active allocations");
        Ok(out)
    }

    async fn lookup(&self, address: &str) -> Result<Allocation, RegistryError> {
        let url = format!("{}/api/ipam/ip-addresses/?address={}", self.base, address);
        let value = self.get_json(&url).await?;
        let (allocations, _) = parse_page(value)?;
        allocations
            .into_iter()
            .next()
            .ok_or_else(|| RegistryError::NotFound {
                address: address.to_string(),
            })
    }

    async fn set_status(
        &self,
        id: i64,
        status: AllocationStatus,
    ) -> Result<Allocation, RegistryError> {
        let url = format!("{}/api/ipam/ip-addresses/{id}/", self.base);
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await
            .map_err(|e| RegistryError::transport(&e))?;
        let value = check_status(response).await?;
        let wire: WireAllocation =
            serde_json::from_value(value).map_err(|e| RegistryError::Decode {
                detail: e.to_string(),
            })?;
        into_allocation(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parsing_follows_next_links_and_maps_status() {
        let value = json!({
            "count": 2,
            "next": "http://localhost:8000/api/ipam/ip-addresses/?parent=10.0.1.0%2F24&status=active&offset=50",
            "previous": null,
            "results": [
                {
                    "id": 42,
                    "address": "10.0.1.15/24",
                    "status": {"value": "active", "label": "Active"},
                    "description": "Old test server",
                    "dns_name": "old-test.lab"
                },
                {
                    "id": 43,
                    "address": "10.0.1.16/24",
                    "status": {"value": "active", "label": "Active"}
                }
            ]
        });

        let (allocations, next) = parse_page(value).expect("parse page");
        assert!(next.is_some());
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].id, 42);
        assert_eq!(allocations[0].status, AllocationStatus::Active);
        assert_eq!(allocations[0].dns_name, "old-test.lab");
        // Absent optional fields default to empty strings.
        assert_eq!(allocations[1].description, "");
    }

    #[test]
    fn unknown_status_value_is_a_decode_error() {
        let value = json!({
            "next": null,
            "results": [
                {"id": 1, "address": "10.0.1.1/24", "status": {"value": "quarantined"}}
            ]
        });
        let err = parse_page(value).expect_err("unknown status");
        assert!(matches!(err, RegistryError::Decode { .. }));
    }
}

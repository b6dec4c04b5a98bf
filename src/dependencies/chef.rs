use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Method, Response, header::ACCEPT};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, trace};
use url::Url;

mod signing;

pub use signing::{RequestSigner, SigningError};

/// Version of the Chef protocol we announce to the server.
const CHEF_VERSION: &str = "18.0.0";

#[derive(Debug, Error)]
pub enum ChefApiError {
    #[error("failed to create the HTTP client")]
    HttpClient(#[source] reqwest::Error),
    #[error("Chef server URL '{url}' cannot be used as a base URL")]
    InvalidBaseUrl { url: String },
    #[error("failed to sign the request")]
    Signing(#[from] SigningError),
    #[error("request to {path} failed")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: String,
        path: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode the response of {path}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A client as known by the Chef server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    pub name: String,
    pub validator: bool,
}

// Dependency to list clients
#[async_trait]
pub trait ClientLister {
    /// Returns every client known by the server, with its details.
    async fn list_clients(&self) -> Result<Vec<ApiClient>, ChefApiError>;
}

// Dependency to delete a client
#[async_trait]
pub trait ClientDestroyer {
    async fn destroy_client(&self, name: &str) -> Result<(), ChefApiError>;
}

/// Chef server API client.
///
/// Requests are signed with the key of the configured client and sent one at a time.
#[derive(Debug)]
pub struct ChefServer {
    http: reqwest::Client,
    base_url: Url,
    signer: RequestSigner,
}

/// Body of `GET /clients/<name>`.
#[derive(Debug, Deserialize)]
struct ClientDetails {
    #[serde(default)]
    validator: bool,
}

/// Error body returned by the Chef server, `error` is either a string or a list of strings.
#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorMessages,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorMessages {
    Many(Vec<String>),
    One(String),
}

impl ChefServer {
    pub fn new(base_url: Url, signer: RequestSigner) -> Result<Self, ChefApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ChefApiError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("knife-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ChefApiError::HttpClient)?;
        debug!(%base_url, user_id = signer.user_id(), "created Chef server client");

        Ok(Self {
            http,
            base_url,
            signer,
        })
    }

    /// Build the URL of an endpoint below the base URL, segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ChefApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ChefApiError::InvalidBaseUrl {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn send(&self, method: Method, segments: &[&str]) -> Result<Response, ChefApiError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        debug!(%method, %path, "sending request to the Chef server");

        let headers = self
            .signer
            .sign(method.as_str(), &path, b"", OffsetDateTime::now_utc())?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header("X-Chef-Version", CHEF_VERSION);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ChefApiError::Request {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        trace!(%status, %path, "received response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChefApiError::Status {
                method: method.to_string(),
                path,
                status: status.as_u16(),
                message: server_error_message(&body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ChefApiError> {
        let response = self.send(Method::GET, segments).await?;
        let path = response.url().path().to_string();

        response
            .json()
            .await
            .map_err(|source| ChefApiError::Decode { path, source })
    }
}

#[async_trait]
impl ClientLister for ChefServer {
    async fn list_clients(&self) -> Result<Vec<ApiClient>, ChefApiError> {
        // The index maps client names to their URL, the details need one request per client.
        let index: BTreeMap<String, String> = self.get_json(&["clients"]).await?;
        debug!(count = index.len(), "listed clients");

        let mut clients = Vec::with_capacity(index.len());
        for name in index.into_keys() {
            let details: ClientDetails = self.get_json(&["clients", &name]).await?;
            trace!(name = %name, ?details, "fetched client details");

            clients.push(ApiClient {
                name,
                validator: details.validator,
            });
        }

        Ok(clients)
    }
}

#[async_trait]
impl ClientDestroyer for ChefServer {
    async fn destroy_client(&self, name: &str) -> Result<(), ChefApiError> {
        debug!(name, "deleting client");
        self.send(Method::DELETE, &["clients", name]).await?;
        Ok(())
    }
}

/// Extract the server's error message from a response body, falling back to the raw body.
fn server_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorMessages::Many(messages),
        }) => messages.join(", "),
        Ok(ErrorBody {
            error: ErrorMessages::One(message),
        }) => message,
        Err(_) => body.trim().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use httptest::{Expectation, Server, all_of, matchers::*, responders::*};
    use serde_json::json;

    use super::*;

    const CLIENT_KEY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/client.pem"
    ));

    fn chef_server(server: &Server) -> ChefServer {
        let base_url = Url::parse(&server.url_str("/organizations/acme")).unwrap();
        let signer = RequestSigner::from_pem("admin", CLIENT_KEY).unwrap();
        ChefServer::new(base_url, signer).unwrap()
    }

    #[tokio::test]
    async fn test_list_clients() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/organizations/acme/clients"),
                request::headers(contains(("x-ops-userid", "admin"))),
                request::headers(contains(("x-ops-sign", "algorithm=sha256;version=1.3"))),
                request::headers(contains(key("x-ops-authorization-1"))),
                request::headers(contains(("accept", "application/json"))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({
                "web1": "https://chef.example.com/organizations/acme/clients/web1",
                "acme-validator": "https://chef.example.com/organizations/acme/clients/acme-validator",
            }))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/organizations/acme/clients/acme-validator",
            ))
            .times(1)
            .respond_with(json_encoded(json!({
                "name": "acme-validator",
                "clientname": "acme-validator",
                "validator": true,
                "orgname": "acme",
                "json_class": "Chef::ApiClient",
                "chef_type": "client",
            }))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/organizations/acme/clients/web1",
            ))
            .times(1)
            .respond_with(json_encoded(json!({
                "name": "web1",
                "validator": false,
            }))),
        );

        let clients = chef_server(&server).list_clients().await.unwrap();

        assert_eq!(
            clients,
            vec![
                ApiClient {
                    name: "acme-validator".to_string(),
                    validator: true,
                },
                ApiClient {
                    name: "web1".to_string(),
                    validator: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_clients_empty() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/organizations/acme/clients"))
                .respond_with(json_encoded(json!({}))),
        );

        let clients = chef_server(&server).list_clients().await.unwrap();

        assert!(clients.is_empty());
    }

    #[tokio::test]
    async fn test_list_clients_forbidden() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/organizations/acme/clients"))
                .respond_with(status_code(403).body(r#"{"error":["missing read permission"]}"#)),
        );

        let error = chef_server(&server).list_clients().await.unwrap_err();

        match error {
            ChefApiError::Status {
                method,
                path,
                status,
                message,
            } => {
                assert_eq!(method, "GET");
                assert_eq!(path, "/organizations/acme/clients");
                assert_eq!(status, 403);
                assert_eq!(message, "missing read permission");
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_clients_invalid_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/organizations/acme/clients"))
                .respond_with(status_code(200).body("not json")),
        );

        let error = chef_server(&server).list_clients().await.unwrap_err();

        assert!(matches!(error, ChefApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_destroy_client() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("DELETE", "/organizations/acme/clients/web1"),
                request::headers(contains(key("x-ops-content-hash"))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({"name": "web1", "validator": false}))),
        );

        chef_server(&server).destroy_client("web1").await.unwrap();
    }

    #[tokio::test]
    async fn test_destroy_missing_client() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/organizations/acme/clients/ghost",
            ))
            .respond_with(status_code(404).body(r#"{"error":"Cannot load client ghost"}"#)),
        );

        let error = chef_server(&server)
            .destroy_client("ghost")
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "DELETE /organizations/acme/clients/ghost returned 404: Cannot load client ghost"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_cause_once() {
        // Nothing listens on the port once the listener is dropped.
        let address = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let base_url = Url::parse(&format!("http://{address}/organizations/acme")).unwrap();
        let signer = RequestSigner::from_pem("admin", CLIENT_KEY).unwrap();

        let error = ChefServer::new(base_url, signer)
            .unwrap()
            .list_clients()
            .await
            .unwrap_err();

        assert!(matches!(error, ChefApiError::Request { .. }));
        assert_eq!(error.to_string(), "request to /organizations/acme/clients failed");

        let report = format!("{:#}", anyhow::Error::new(error));
        assert!(report.starts_with("request to /organizations/acme/clients failed: "));
        assert_eq!(str::matches(report.as_str(), "error sending request").count(), 1);
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let signer = RequestSigner::from_pem("admin", CLIENT_KEY).unwrap();
        let server = ChefServer::new(
            Url::parse("https://chef.example.com/organizations/acme/").unwrap(),
            signer,
        )
        .unwrap();

        assert_eq!(
            server.endpoint(&["clients", "web 1"]).unwrap().as_str(),
            "https://chef.example.com/organizations/acme/clients/web%201"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let signer = RequestSigner::from_pem("admin", CLIENT_KEY).unwrap();
        let error = ChefServer::new(Url::parse("mailto:admin@example.com").unwrap(), signer)
            .unwrap_err();

        assert!(matches!(error, ChefApiError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_server_error_message() {
        assert_eq!(
            server_error_message(r#"{"error":["first","second"]}"#),
            "first, second"
        );
        assert_eq!(server_error_message(r#"{"error":"only"}"#), "only");
        assert_eq!(server_error_message("Bad Gateway\n"), "Bad Gateway");
    }
}

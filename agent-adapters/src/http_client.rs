use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// JSON-over-HTTP transport shared by adapters. Accepts both `http://` and
/// `https://` endpoints.
#[derive(Clone)]
pub(crate) struct JsonTransport {
    client: HyperClient,
    timeout: Duration,
}

impl JsonTransport {
    pub(crate) fn new(timeout: Duration) -> Self {
        let mut roots = RootCertStore::empty();
        roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
            OwnedTrustAnchor::from_subject_spki_name_constraints(
                anchor.subject,
                anchor.spki,
                anchor.name_constraints,
            )
        }));

        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(timeout));

        let connector = HttpsConnector::from((http, Arc::new(config)));

        Self {
            client: Client::builder().build::<_, Body>(connector),
            timeout,
        }
    }

    /// Posts `body` and returns the response status and raw bytes.
    ///
    /// Connection failures, timeouts, and truncated bodies are reported as
    /// [`AdapterError::Connectivity`]; status handling is left to the caller.
    pub(crate) async fn post_json(
        &self,
        endpoint: &Uri,
        body: Vec<u8>,
    ) -> AdapterResult<(StatusCode, Bytes)> {
        let request = Request::post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Body::from(body))
            .map_err(|err| AdapterError::invalid_request(format!("failed to build request: {err}")))?;

        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let bytes = to_bytes(response.into_body()).await?;
            Ok::<_, hyper::Error>((status, bytes))
        };

        timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                AdapterError::connectivity(format!(
                    "no response from {endpoint} within {:?}",
                    self.timeout
                ))
            })?
            .map_err(|err| AdapterError::connectivity(format!("request to {endpoint} failed: {err}")))
    }
}

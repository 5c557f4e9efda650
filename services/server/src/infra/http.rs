use futures::future::BoxFuture;
use reqwest::Client;

use versatile_auth_types::context::AUTH_SERVER_PAYLOAD;

use crate::infra::backend::{HttpBackend, OutboundRequest, OutboundResponse, TransportError};

/// `reqwest` transport to the auth microservice.
#[derive(Clone)]
pub struct ReqwestBackend {
    pub client: Client,
}

impl HttpBackend for ReqwestBackend {
    fn execute<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> BoxFuture<'a, Result<OutboundResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(request.method.clone(), &request.url)
                .header(AUTH_SERVER_PAYLOAD, &request.auth_payload);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok(OutboundResponse { status, body })
        })
    }
}

//! Output binding invocation over gRPC.
//!
//! # Responsibilities
//! - Serialize the record and wrap it in an `InvokeBindingRequest`
//! - Open a fresh channel per call and drop it afterwards
//! - Bound the whole call, connect included, by the configured deadline
//! - Map transport failures and gRPC status to [`SinkError`]
//!
//! # Design Decisions
//! - No connection reuse: the channel dies with the call
//! - No retry: a failed invocation is reported once and forgotten

use async_trait::async_trait;
use http::uri::PathAndQuery;
use tonic::codec::ProstCodec;
use tonic::transport::Endpoint;
use tonic::GrpcMethod;

use crate::config::BindingTarget;
use crate::error::{SinkError, SinkResult};
use crate::record::AuditRecord;
use crate::sink::proto::{
    InvokeBindingRequest, InvokeBindingResponse, INVOKE_BINDING_PATH, METHOD_NAME, SERVICE_NAME,
};
use crate::sink::AuditSink;

/// Host of the local binding endpoint.
pub const BINDING_HOST: &str = "127.0.0.1";

/// Delivers records to a named output binding.
#[derive(Debug, Clone)]
pub struct BindingSink {
    target: BindingTarget,
}

impl BindingSink {
    pub fn new(target: BindingTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &BindingTarget {
        &self.target
    }

    fn endpoint_uri(&self) -> String {
        format!("http://{}:{}", BINDING_HOST, self.target.port)
    }

    async fn invoke(&self, message: InvokeBindingRequest) -> SinkResult<()> {
        let channel = Endpoint::from_shared(self.endpoint_uri())?.connect().await?;
        let mut client = tonic::client::Grpc::new(channel);

        client.ready().await?;

        // Advertised as grpc-timeout; the local deadline is enforced in `deliver`.
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.target.timeout);
        request
            .extensions_mut()
            .insert(GrpcMethod::new(SERVICE_NAME, METHOD_NAME));

        tracing::debug!(binding = %self.target.name, "Sending data to binding via gRPC");

        let codec: ProstCodec<InvokeBindingRequest, InvokeBindingResponse> = ProstCodec::default();
        client
            .unary(request, PathAndQuery::from_static(INVOKE_BINDING_PATH), codec)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for BindingSink {
    fn name(&self) -> &'static str {
        "binding"
    }

    async fn deliver(&self, record: &AuditRecord) -> SinkResult<()> {
        let data = serde_json::to_vec(record)?;
        let message = InvokeBindingRequest::create(self.target.name.clone(), data);

        tokio::time::timeout(self.target.timeout, self.invoke(message))
            .await
            .map_err(|_| SinkError::Timeout(self.target.timeout))?
    }
}

//! Messages of the output binding RPC.
//!
//! ```text
//! service Dapr {
//!   rpc InvokeBinding(InvokeBindingRequest) returns (InvokeBindingResponse);
//! }
//! ```
//!
//! Only this one RPC is used, so the two messages are declared here with
//! `prost` derives instead of generating the whole runtime API.

use std::collections::HashMap;

/// Fully qualified method path of the invocation.
pub const INVOKE_BINDING_PATH: &str = "/dapr.proto.runtime.v1.Dapr/InvokeBinding";

/// gRPC service name, used to tag the outgoing request.
pub const SERVICE_NAME: &str = "dapr.proto.runtime.v1.Dapr";

/// gRPC method name, used to tag the outgoing request.
pub const METHOD_NAME: &str = "InvokeBinding";

/// Operation requested from output bindings.
pub const CREATE_OPERATION: &str = "create";

/// Request message for an output binding.
#[derive(Clone, PartialEq, prost::Message)]
pub struct InvokeBindingRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
    #[prost(string, tag = "4")]
    pub operation: String,
}

/// Response message of an output binding. The audit sink ignores its
/// content.
#[derive(Clone, PartialEq, prost::Message)]
pub struct InvokeBindingResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    #[prost(map = "string, string", tag = "2")]
    pub metadata: HashMap<String, String>,
}

impl InvokeBindingRequest {
    /// `create` request carrying `data` with no metadata.
    pub fn create(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            metadata: HashMap::new(),
            operation: CREATE_OPERATION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_encode_create_request() {
        let encoded = InvokeBindingRequest::create("log", b"{}".to_vec()).encode_to_vec();

        let expected: &[u8] = &[
            0x0a, 0x03, b'l', b'o', b'g', // name
            0x12, 0x02, b'{', b'}', // data
            0x22, 0x06, b'c', b'r', b'e', b'a', b't', b'e', // operation
        ];
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_decode_roundtrip_keeps_metadata() {
        let mut request = InvokeBindingRequest::create("audit", vec![b'x'; 300]);
        request.metadata.insert("k".into(), "v".into());

        let decoded = InvokeBindingRequest::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, request);
    }
}

//! Gateway: HTTP shell around the pipeline.
//!
//! Serves health probes and the SMAX webhook on a single port. The webhook always answers
//! 200 once a reply exists, with the delivery outcome reported in the body.

mod protocol;
mod server;

pub use protocol::{
    ForwardStatus, GatewayError, ResponseMetadata, WebhookResponse, MSG_NOT_ADDRESSED,
    MSG_NO_TEXT, MSG_PROBE_OK,
};
pub use server::{build_router, run_gateway, GatewayState};

//! Chat channel plumbing: inbound normalization, addressing, and the SMAX delivery sink.
//!
//! Inbound payloads become an `InboundEvent`; the addressing step decides whether the assistant
//! was tagged; replies go back out through `SmaxChannel`.

mod addressing;
mod inbound;
mod smax;

pub use addressing::{AddressingDetector, CommandExtractor};
pub use inbound::{
    is_placeholder, is_verification_probe, normalize, InboundEvent, MentionEntity,
    TransportHeaders, PLACEHOLDER_MARKER,
};
pub use smax::{Attr, Customer, DeliveryError, DeliveryPayload, RecipientIds, SmaxChannel};

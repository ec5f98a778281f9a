//! Stream layer for netpcm.
//!
//! Builds on [`wire`] with the state a real session needs: the sender's
//! header cadence and sample index, and the receiver's last known descriptor
//! with gap detection. Transport stays with the caller; every operation takes
//! and returns plain byte slices.

mod config;
mod interleave;
mod receiver;
mod sender;

pub use config::StreamConfig;
pub use interleave::{deinterleave, interleave};
pub use receiver::{
    classify_gap, Gap, ReceiveError, Received, ReceiverStats, StreamReceiver,
    DEFAULT_MAX_FRAME_LEN,
};
pub use sender::{SentChunk, StreamSender};

//! Binary packet codec: primitive field types, the id catalog, the
//! fluent builder/reader pair, and high-level packet constructors.

pub mod builders;
pub mod error;
pub mod ids;
pub mod packet;
pub mod types;

pub use error::CodecError;
pub use ids::{ClientPacketId, ServerPacketId};
pub use packet::{split_frames, InboundFrame, PacketBuilder, PacketReader, HEADER_LEN};

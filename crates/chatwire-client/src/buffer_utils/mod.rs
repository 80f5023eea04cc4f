mod buffering;
mod decoder;
mod sse_parser;

pub use buffering::{extract_frames, PendingBuffer};
pub use decoder::Utf8Decoder;
pub use sse_parser::{
    decode_payload, parse_frame_line, parse_payload_stream, PayloadStream, FRAME_MARKER,
};

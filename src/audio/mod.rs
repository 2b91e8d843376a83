pub mod decoder;
pub mod playback;
pub mod source;
pub mod spectrum;

pub use decoder::{
    decode_bytes, AudioDecoder, BackgroundDecoder, DecodeRequest, DecodeService, DecodedAudio,
    SymphoniaDecoder,
};
pub use playback::{list_output_devices, AudioOutput, PlaybackId, RodioOutput};
pub use source::TappedBuffer;
pub use spectrum::{AnalyserInput, SpectrumProvider, SpectrumSource};

//! Integer PCM WAV via `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::{DecodedAudio, Decoder, Encoder, PcmFormat};
use crate::{AudioSegmentError, AudioSegmentResult};

/// Reads and writes 8, 16, 24 and 32-bit integer PCM WAV.
///
/// 8-bit samples are exchanged unsigned, as stored on disk. 24-bit samples
/// are exchanged as packed 3-byte values and widened by
/// [`AudioSegment::from_decoded`](crate::AudioSegment::from_decoded).
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl Decoder for WavCodec {
    fn decode(&self, bytes: &[u8]) -> AudioSegmentResult<DecodedAudio> {
        let mut reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int {
            return Err(AudioSegmentError::UnsupportedFormat(format!(
                "{}-bit float WAV is not supported",
                spec.bits_per_sample
            )));
        }

        let sample_width = match spec.bits_per_sample {
            8 => 1,
            16 => 2,
            24 => 3,
            32 => 4,
            bits => {
                return Err(AudioSegmentError::UnsupportedFormat(format!(
                    "{bits}-bit integer WAV is not supported"
                )));
            }
        };

        let mut data = Vec::with_capacity(reader.len() as usize * sample_width);
        for sample in reader.samples::<i32>() {
            let sample = sample?;
            match sample_width {
                1 => data.push((sample + 128) as u8),
                2 => data.extend_from_slice(&(sample as i16).to_le_bytes()),
                3 => data.extend_from_slice(&sample.to_le_bytes()[..3]),
                _ => data.extend_from_slice(&sample.to_le_bytes()),
            }
        }

        Ok(DecodedAudio {
            sample_width,
            frame_rate: spec.sample_rate,
            channels: usize::from(spec.channels),
            data,
            format: PcmFormat::Integer,
        })
    }
}

impl Encoder for WavCodec {
    fn encode(&self, audio: &DecodedAudio) -> AudioSegmentResult<Vec<u8>> {
        if audio.format != PcmFormat::Integer {
            return Err(AudioSegmentError::UnsupportedFormat(
                "only integer PCM can be written to WAV".to_string(),
            ));
        }
        if !matches!(audio.sample_width, 1..=4) {
            return Err(AudioSegmentError::InvalidWidth {
                width: audio.sample_width,
            });
        }
        let channels = u16::try_from(audio.channels).map_err(|_| {
            AudioSegmentError::invalid_parameter(format!(
                "{} channels do not fit in a WAV header",
                audio.channels
            ))
        })?;

        let spec = WavSpec {
            channels,
            sample_rate: audio.frame_rate,
            bits_per_sample: (audio.sample_width * 8) as u16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(audio.data.len() + 44));
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for sample in audio.data.chunks_exact(audio.sample_width) {
                match *sample {
                    [b0] => writer.write_sample((i16::from(b0) - 128) as i8)?,
                    [b0, b1] => writer.write_sample(i16::from_le_bytes([b0, b1]))?,
                    [b0, b1, b2] => {
                        writer.write_sample(i32::from_le_bytes([0, b0, b1, b2]) >> 8)?
                    }
                    [b0, b1, b2, b3] => writer.write_sample(i32::from_le_bytes([b0, b1, b2, b3]))?,
                    _ => {
                        return Err(AudioSegmentError::InvalidWidth {
                            width: audio.sample_width,
                        });
                    }
                }
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}

//! Canonical 44-byte RIFF/WAVE header construction.

use crate::audio::mime::PcmFormat;

/// Size of the canonical header.
pub const WAV_HEADER_LEN: usize = 44;

const FMT_CHUNK_SIZE: u32 = 16;
const AUDIO_FORMAT_PCM: u16 = 1;

/// Build the header for `data_len` bytes of PCM in `format`.
///
/// Little-endian throughout. Sizes and rates are truncated to the width of
/// their on-disk fields, matching the 32-bit limits of the container itself.
pub fn build_wav_header(data_len: usize, format: &PcmFormat) -> [u8; WAV_HEADER_LEN] {
    let channels = u64::from(format.channel_count);
    let sample_rate = u64::from(format.sample_rate_hz);
    let bits = u64::from(format.bits_per_sample);
    let data_len = data_len as u64;

    let byte_rate = (sample_rate * channels * bits / 8) as u32;
    let block_align = (channels * bits / 8) as u16;

    let mut header = [0u8; WAV_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&((36 + data_len) as u32).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&AUDIO_FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&(format.channel_count as u16).to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate_hz.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&(format.bits_per_sample as u16).to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&(data_len as u32).to_le_bytes());
    header
}

/// Prepend a canonical header to raw PCM bytes.
pub fn wrap_pcm(pcm: &[u8], format: &PcmFormat) -> Vec<u8> {
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(&build_wav_header(pcm.len(), format));
    wav.extend_from_slice(pcm);
    wav
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn header_fields_for_24khz_16bit_mono() {
        let header = build_wav_header(48000, &PcmFormat::mono(24000, 16));

        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32_at(&header, 4), 36 + 48000);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u32_at(&header, 16), 16);
        assert_eq!(u16_at(&header, 20), 1);
        assert_eq!(u16_at(&header, 22), 1);
        assert_eq!(u32_at(&header, 24), 24000);
        assert_eq!(u32_at(&header, 28), 48000);
        assert_eq!(u16_at(&header, 32), 2);
        assert_eq!(u16_at(&header, 34), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32_at(&header, 40), 48000);
    }

    #[test]
    fn size_and_rate_invariants_hold_across_formats() {
        let formats = [
            (1u32, 8000u32, 8u32),
            (1, 16000, 16),
            (2, 44100, 16),
            (2, 48000, 24),
            (6, 96000, 32),
        ];
        for (channels, rate, bits) in formats {
            for data_len in [0usize, 1, 1023, 65536] {
                let format = PcmFormat {
                    channel_count: channels,
                    sample_rate_hz: rate,
                    bits_per_sample: bits,
                };
                let header = build_wav_header(data_len, &format);
                assert_eq!(header.len(), WAV_HEADER_LEN);
                assert_eq!(u32_at(&header, 4) as usize, 36 + data_len);
                assert_eq!(u32_at(&header, 40) as usize, data_len);
                assert_eq!(u32_at(&header, 28), rate * channels * bits / 8);
                assert_eq!(u16_at(&header, 32) as u32, channels * bits / 8);
                assert_eq!(u16_at(&header, 22) as u32, channels);
            }
        }
    }

    #[test]
    fn header_is_reproducible() {
        let format = PcmFormat::mono(22050, 16);
        assert_eq!(build_wav_header(777, &format), build_wav_header(777, &format));
    }

    #[test]
    fn non_byte_aligned_depth_truncates_block_align() {
        let header = build_wav_header(0, &PcmFormat::mono(8000, 12));
        assert_eq!(u16_at(&header, 32), 1);
        assert_eq!(u32_at(&header, 28), 12000);
    }

    #[test]
    fn wrap_pcm_prepends_header() {
        let pcm = vec![0xAB; 100];
        let wav = wrap_pcm(&pcm, &PcmFormat::mono(24000, 16));

        assert_eq!(wav.len(), 44 + 100);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[44..], &pcm[..]);
    }

    #[test]
    fn wrapped_pcm_is_readable_by_hound() {
        let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = wrap_pcm(&pcm, &PcmFormat::mono(24000, 16));

        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn header_matches_hound_writer_output() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in [1i16, 2, 3, 4] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        let reference = cursor.into_inner();

        let header = build_wav_header(8, &PcmFormat::mono(16000, 16));
        assert_eq!(&reference[..44], &header[..]);
    }

    #[test]
    fn empty_payload_yields_bare_header() {
        let wav = wrap_pcm(&[], &PcmFormat::mono(24000, 16));
        assert_eq!(wav.len(), 44);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }
}

//! Offline renderer — drives the engine for a fixed number of loops and
//! encodes the result as a WAV byte buffer.

use log::info;

use crate::config::EngineConfig;
use crate::engine::MusicEngine;
use crate::error::{ConfigError, EngineError};

/// Longest offline render, in frames (ten minutes at 48 kHz).
pub const MAX_RENDER_FRAMES: u64 = 600 * 48_000;

/// Render `loops` loop lengths of mono audio exactly as the live engine
/// would play them.
pub fn render_loops(config: &EngineConfig, loops: u32) -> Result<Vec<f32>, EngineError> {
    let mut engine = MusicEngine::new(config.clone())?;
    let frames = (loops as f64 * config.loop_duration * config.sample_rate as f64).round();
    if frames > MAX_RENDER_FRAMES as f64 {
        return Err(ConfigError::InvalidValue {
            field: "loops",
            reason: format!("{loops} loops exceed the {MAX_RENDER_FRAMES}-frame render limit"),
        }
        .into());
    }
    let frames = frames as usize;
    if frames == 0 {
        return Ok(Vec::new());
    }

    engine.start()?;
    let mut out = vec![0.0_f32; frames];
    engine.process(&mut out)?;
    info!(
        "rendered {loops} loops ({frames} frames, {} iterations)",
        engine.iterations()
    );
    engine.stop();
    Ok(out)
}

/// Render `loops` loop lengths to a WAV file as bytes (16-bit stereo PCM).
pub fn render_loops_wav(config: &EngineConfig, loops: u32) -> Result<Vec<u8>, EngineError> {
    let mono = render_loops(config, loops)?;
    Ok(encode_wav(&to_pcm_i16_stereo(&mono), config.sample_rate, 2))
}

/// Duplicate mono samples into interleaved stereo i16 PCM.
fn to_pcm_i16_stereo(mono: &[f32]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &s in mono {
        let sample = (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        stereo.push(sample); // L
        stereo.push(sample); // R
    }
    stereo
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sample_rate: u32) -> EngineConfig {
        EngineConfig {
            sample_rate,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn one_loop_has_loop_length() {
        let samples = render_loops(&config(8000), 1).unwrap();
        assert_eq!(samples.len(), 4 * 8000);
        assert!(samples.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn zero_loops_is_empty() {
        assert!(render_loops(&config(8000), 0).unwrap().is_empty());
    }

    #[test]
    fn wav_header_valid() {
        let wav = render_loops_wav(&config(8000), 1).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 8000);
        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 2);

        // 4 s * 8000 frames * 2 channels * 2 bytes
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 128_000);
        assert_eq!(wav.len(), 44 + 128_000);
    }

    #[test]
    fn stereo_channels_match() {
        let pcm = to_pcm_i16_stereo(&[0.5, -1.0, 2.0]);
        assert_eq!(pcm, vec![16384, 16384, -32767, -32767, 32767, 32767]);
    }

    #[test]
    fn oversized_render_is_rejected() {
        assert!(matches!(
            render_loops(&config(8000), u32::MAX),
            Err(EngineError::Config(ConfigError::InvalidValue { field: "loops", .. }))
        ));
        // One 60 s loop at 768 kHz is already past the limit
        let long = EngineConfig {
            loop_duration: 60.0,
            ..config(768_000)
        };
        assert!(matches!(render_loops(&long, 1), Err(EngineError::Config(_))));
    }

    #[test]
    fn bad_sample_rate_fails() {
        assert!(matches!(
            render_loops(&config(100), 1),
            Err(EngineError::Context(_))
        ));
    }
}

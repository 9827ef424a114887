/*!
# WarpClip: WAVE Reader

A minimal, forward-only RIFF/WAVE parser for mono or interleaved IEEE-float
PCM data. This is deliberately not a general-purpose WAV crate: it validates
the exact chunk order [`Clip::load`](crate::Clip::load) expects, and nothing
more.

The stream is read strictly forward; nothing here ever seeks.
*/

use crate::{
	AudioInfo,
	WarpClipError,
};
use std::io::Read;



/// # Required Format-Chunk Audio Format Code (IEEE Float).
const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;

/// # Required `fmt ` Chunk Size (No Extension).
const FMT_CHUNK_SIZE: u32 = 0x10;

/// # Bytes Per (IEEE-Float) Sample.
const BYTES_PER_SAMPLE: usize = 4;



/// # Read Format.
///
/// Consume and validate the RIFF/WAVE header through the `fact` chunk, then
/// scan forward to (and consume) the `data` chunk tag and its size,
/// populating and returning an [`AudioInfo`].
///
/// ## Errors
///
/// Returns [`WarpClipError::MalformedWave`] if any expected token, format
/// code, or chunk size does not match, and [`WarpClipError::IoFailure`] if
/// the stream ends before the header is fully consumed.
pub fn read_format<R: Read>(r: &mut R) -> Result<AudioInfo, WarpClipError> {
	expect_token(r, b"RIFF")?;
	let _file_size = read_u32_le(r)?;
	expect_token(r, b"WAVE")?;
	expect_token(r, b"fmt ")?;

	let fmt_chunk_size = read_u32_le(r)?;
	if fmt_chunk_size != FMT_CHUNK_SIZE {
		return Err(WarpClipError::MalformedWave("fmt chunk size must be 16"));
	}

	let audio_format = read_u16_le(r)?;
	if audio_format != WAVE_FORMAT_IEEE_FLOAT {
		return Err(WarpClipError::MalformedWave("audio format is not IEEE float"));
	}

	let channels = read_u16_le(r)?;
	if channels == 0 {
		return Err(WarpClipError::MalformedWave("channel count is zero"));
	}

	let sample_rate = read_u32_le(r)?;
	if sample_rate == 0 {
		return Err(WarpClipError::MalformedWave("sample rate is zero"));
	}

	let bytes_per_sec = read_u32_le(r)?;
	if bytes_per_sec == 0 {
		return Err(WarpClipError::MalformedWave("bytes-per-second is zero"));
	}

	let bytes_per_block = read_u16_le(r)?;
	if bytes_per_block == 0 {
		return Err(WarpClipError::MalformedWave("block alignment is zero"));
	}

	let bits_per_sample = read_u16_le(r)?;
	if ! matches!(bits_per_sample, 8 | 16 | 24 | 32) {
		return Err(WarpClipError::MalformedWave("bits-per-sample must be 8, 16, 24, or 32"));
	}

	expect_token(r, b"fact")?;

	let fact_chunk_size = read_u32_le(r)?;
	if fact_chunk_size < 4 {
		return Err(WarpClipError::MalformedWave("fact chunk size must be at least 4"));
	}

	let samples_per_channel = read_u32_le(r)?;
	if samples_per_channel == 0 {
		return Err(WarpClipError::MalformedWave("fact chunk reports zero samples"));
	}

	// Skip any padding between the fact chunk and the data chunk; the next
	// byte matching 'd' is assumed to begin the "data" tag.
	skip_to_data_tag(r)?;

	let data_size = read_u32_le(r)?;
	if data_size == 0 {
		return Err(WarpClipError::MalformedWave("data chunk size is zero"));
	}

	let total_samples = data_size / (u32::from(channels) * (u32::from(bits_per_sample) / 8));

	Ok(AudioInfo {
		sample_rate,
		bits_per_sample,
		channels,
		total_samples,
	})
}

/// # Read Samples.
///
/// Reads up to `n` interleaved 32-bit IEEE-float samples into `out[..n]`.
///
/// ## Errors
///
/// Returns [`WarpClipError::InvalidAudioInfo`] if `info` fails validation.
/// Otherwise returns `Ok((read, ok))`: `read` is how many samples were
/// actually consumed from the stream, and `ok` is `true` iff `read == n`,
/// i.e. the stream was not truncated before the request was satisfied.
pub fn read_samples<R: Read>(
	r: &mut R,
	info: &AudioInfo,
	n: usize,
	out: &mut [f32],
) -> Result<(usize, bool), WarpClipError> {
	if ! info.is_valid() { return Err(WarpClipError::InvalidAudioInfo); }

	let mut buf = [0_u8; BYTES_PER_SAMPLE];
	let mut read = 0_usize;
	while read < n {
		match r.read_exact(&mut buf) {
			Ok(()) => {
				out[read] = f32::from_le_bytes(buf);
				read += 1;
			},
			Err(_) => break,
		}
	}

	Ok((read, read == n))
}



/// # Expect Literal Token.
fn expect_token<R: Read>(r: &mut R, expected: &[u8; 4]) -> Result<(), WarpClipError> {
	let mut buf = [0_u8; 4];
	r.read_exact(&mut buf).map_err(|_| WarpClipError::IoFailure)?;
	if &buf == expected { Ok(()) }
	else { Err(WarpClipError::MalformedWave(token_name(expected))) }
}

/// # Token Name (For Error Messages).
const fn token_name(token: &[u8; 4]) -> &'static str {
	match token {
		b"RIFF" => "expected \"RIFF\"",
		b"WAVE" => "expected \"WAVE\"",
		b"fmt " => "expected \"fmt \"",
		b"fact" => "expected \"fact\"",
		_ => "expected a chunk token",
	}
}

/// # Read Little-Endian `u16`.
fn read_u16_le<R: Read>(r: &mut R) -> Result<u16, WarpClipError> {
	let mut buf = [0_u8; 2];
	r.read_exact(&mut buf).map_err(|_| WarpClipError::IoFailure)?;
	Ok(u16::from_le_bytes(buf))
}

/// # Read Little-Endian `u32`.
fn read_u32_le<R: Read>(r: &mut R) -> Result<u32, WarpClipError> {
	let mut buf = [0_u8; 4];
	r.read_exact(&mut buf).map_err(|_| WarpClipError::IoFailure)?;
	Ok(u32::from_le_bytes(buf))
}

/// # Skip Bytes Until The `data` Tag.
///
/// Consumes bytes one at a time until one equals `'d'`, then reads the
/// remaining three bytes and confirms the full token is `"data"`.
fn skip_to_data_tag<R: Read>(r: &mut R) -> Result<(), WarpClipError> {
	let mut b = [0_u8; 1];
	loop {
		r.read_exact(&mut b).map_err(|_| WarpClipError::MalformedWave("data chunk not found"))?;
		if b[0] == b'd' { break; }
	}

	let mut rest = [0_u8; 3];
	r.read_exact(&mut rest).map_err(|_| WarpClipError::IoFailure)?;

	if &rest == b"ata" { Ok(()) }
	else { Err(WarpClipError::MalformedWave("expected \"data\"")) }
}

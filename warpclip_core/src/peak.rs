/*!
# WarpClip: Streaming Peak Detector

A causal onset detector: two-pole low-pass filter → envelope follower
(instant attack, exponential release) → Schmitt trigger → rising-edge
detector. Every call processes exactly one fixed-size window and resets
its internal state first; continuity across windows is the caller's
responsibility (see [`Clip::load`](crate::Clip::load)'s overlap handling).
*/

use crate::{
	AudioInfo,
	INPUT_WINDOW_SIZE,
	SR0,
	WarpClipError,
};
use std::f64::consts::PI;



/// # Low-Pass Corner Frequency (Hz).
const FREQ_LP_BEAT: f64 = 150.0;

/// # Envelope Release Time (Seconds).
const BEAT_RELEASE_TIME: f64 = 0.2;

/// # Schmitt Trigger Rising Threshold.
const TRIGGER_HIGH: f64 = 0.5;

/// # Schmitt Trigger Falling Threshold.
const TRIGGER_LOW: f64 = 0.3;



#[derive(Debug, Clone, Copy)]
/// # Peak.
///
/// A single detected onset, carried as (peakSampleIndex, attackSampleIndex)
/// — both relative to whatever window produced them until the clip
/// orchestrator offsets them to file-absolute indices.
pub struct Peak {
	/// # Peak Sample Index.
	pub peak_sample_index: f64,

	/// # Attack Sample Index.
	pub attack_sample_index: f64,
}

impl Peak {
	#[must_use]
	/// # New.
	pub const fn new(peak_sample_index: f64, attack_sample_index: f64) -> Self {
		Self { peak_sample_index, attack_sample_index }
	}
}



/// # Peak Detector.
///
/// Abstracts "how do we find onsets in a window of samples" so
/// [`Clip`](crate::Clip) can hold a detector by mutable reference without
/// caring which algorithm backs it. Only [`SimplePeakDetector`] is provided,
/// but callers are free to supply their own.
pub trait PeakDetector {
	/// # Get Peaks.
	///
	/// Analyzes exactly [`INPUT_WINDOW_SIZE`] samples and returns rising-edge
	/// onset indices relative to the start of `samples`.
	///
	/// ## Errors
	///
	/// Returns [`WarpClipError::InvalidAudioInfo`] if `info` fails
	/// validation, or a generic malformed-window rejection if `samples` is
	/// not exactly [`INPUT_WINDOW_SIZE`] long.
	fn get_peaks(&mut self, samples: &[f32], info: &AudioInfo) -> Result<Vec<Peak>, WarpClipError>;
}



#[derive(Debug, Clone, Copy)]
/// # Simple Peak Detector.
///
/// The reference onset detector: a second-order low-pass cascade feeding an
/// envelope follower and a hysteretic (Schmitt) trigger. DSP coefficients
/// are calibrated against [`SR0`], not the clip's actual sample rate — for
/// files at other rates the filter corner and release time are implicitly
/// scaled. This mirrors the source's behavior rather than correcting it.
pub struct SimplePeakDetector {
	/// # Low-Pass Filter Coefficient.
	filter_k: f64,

	/// # Low-Pass Stage 1 Output.
	filter1_out: f64,

	/// # Low-Pass Stage 2 Output.
	filter2_out: f64,

	/// # Envelope Release Coefficient.
	release: f64,

	/// # Envelope Follower State.
	envelope_peak: f64,

	/// # Schmitt Trigger State.
	trigger: bool,

	/// # Previous Trigger State (Rising-Edge Memory).
	prev_trigger: bool,
}

impl Default for SimplePeakDetector {
	fn default() -> Self { Self::new() }
}

impl SimplePeakDetector {
	#[must_use]
	/// # New.
	pub fn new() -> Self {
		let mut out = Self {
			filter_k: 0.0,
			filter1_out: 0.0,
			filter2_out: 0.0,
			release: 0.0,
			envelope_peak: 0.0,
			trigger: false,
			prev_trigger: false,
		};
		out.reset();
		out
	}

	/// # Reset.
	///
	/// Re-derives the filter coefficients from [`SR0`] and zeroes every
	/// piece of running state. Called at the start of every [`process`](Self::process).
	fn reset(&mut self) {
		let t_filter = 1.0 / (2.0 * PI * FREQ_LP_BEAT);
		self.filter_k = 1.0 / (f64::from(SR0) * t_filter);
		self.release = (-1.0 / (f64::from(SR0) * BEAT_RELEASE_TIME)).exp();

		self.filter1_out = 0.0;
		self.filter2_out = 0.0;
		self.envelope_peak = 0.0;
		self.trigger = false;
		self.prev_trigger = false;
	}

	/// # Process One Window.
	///
	/// Runs the full per-sample state machine over `samples`, returning
	/// rising-edge indices relative to the start of the slice.
	fn process(&mut self, samples: &[f32]) -> Vec<Peak> {
		self.reset();

		let mut out = Vec::new();
		for (idx, &x) in samples.iter().enumerate() {
			self.filter1_out += self.filter_k * (f64::from(x) - self.filter1_out);
			self.filter2_out += self.filter_k * (self.filter1_out - self.filter2_out);

			let envelope_in = self.filter2_out.abs();
			if envelope_in > self.envelope_peak {
				self.envelope_peak = envelope_in;
			}
			else {
				self.envelope_peak = self.release.mul_add(self.envelope_peak, (1.0 - self.release) * envelope_in);
			}

			if ! self.trigger {
				if self.envelope_peak > TRIGGER_HIGH { self.trigger = true; }
			}
			else if self.envelope_peak < TRIGGER_LOW { self.trigger = false; }

			if self.trigger && ! self.prev_trigger {
				let idx = idx as f64;
				out.push(Peak::new(idx, idx));
			}

			self.prev_trigger = self.trigger;
		}

		out
	}
}

impl PeakDetector for SimplePeakDetector {
	fn get_peaks(&mut self, samples: &[f32], info: &AudioInfo) -> Result<Vec<Peak>, WarpClipError> {
		if ! info.is_valid() { return Err(WarpClipError::InvalidAudioInfo); }
		if samples.len() != INPUT_WINDOW_SIZE {
			return Err(WarpClipError::MalformedWave("peak detector window must be INPUT_WINDOW_SIZE samples"));
		}

		Ok(self.process(samples))
	}
}



#[cfg(test)]
mod test {
	use super::*;

	fn ok_info() -> AudioInfo {
		AudioInfo { sample_rate: 44_100, bits_per_sample: 32, channels: 1, total_samples: INPUT_WINDOW_SIZE as u32 }
	}

	#[test]
	fn t_silence_emits_nothing() {
		let mut det = SimplePeakDetector::new();
		let window = vec![0.0_f32; INPUT_WINDOW_SIZE];
		let peaks = det.get_peaks(&window, &ok_info()).unwrap();
		assert!(peaks.is_empty());
	}

	#[test]
	fn t_impulse_emits_one_rising_edge() {
		let mut det = SimplePeakDetector::new();
		let mut window = vec![0.0_f32; INPUT_WINDOW_SIZE];

		// A single full-scale sample never drives the envelope follower
		// past the 0.5 trigger threshold (the two-pole low-pass cascade
		// needs on the order of a hundred samples of sustained amplitude
		// before its output crosses that far); use a short sustained pulse
		// instead, the way a real percussive onset actually holds its
		// amplitude across several samples.
		const PULSE_LEN: usize = 200;
		window[1_000..1_000 + PULSE_LEN].fill(1.0);

		let peaks = det.get_peaks(&window, &ok_info()).unwrap();
		assert_eq!(peaks.len(), 1);
		assert!(peaks[0].peak_sample_index >= 1_000.0);
	}

	#[test]
	fn t_deterministic() {
		let mut det = SimplePeakDetector::new();
		let mut window = vec![0.0_f32; INPUT_WINDOW_SIZE];
		window[500] = 0.9;
		window[40_000] = -0.9;

		let a: Vec<f64> = det.get_peaks(&window, &ok_info()).unwrap()
			.into_iter().map(|p| p.peak_sample_index).collect();
		let b: Vec<f64> = det.get_peaks(&window, &ok_info()).unwrap()
			.into_iter().map(|p| p.peak_sample_index).collect();
		assert_eq!(a, b);
	}

	#[test]
	fn t_rejects_wrong_window_size() {
		let mut det = SimplePeakDetector::new();
		let window = vec![0.0_f32; 128];
		assert!(det.get_peaks(&window, &ok_info()).is_err());
	}

	#[test]
	fn t_rejects_invalid_audio_info() {
		let mut det = SimplePeakDetector::new();
		let window = vec![0.0_f32; INPUT_WINDOW_SIZE];
		let bad = AudioInfo { sample_rate: 0, ..ok_info() };
		assert!(matches!(det.get_peaks(&window, &bad), Err(WarpClipError::InvalidAudioInfo)));
	}
}

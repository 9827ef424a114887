/*!
# WarpClip: Clip Orchestrator

Drives the windowed read-analyze pipeline: open a `.wav` file, parse its
format, repeatedly read overlapped windows and feed them to a peak
detector, then expose the resulting warp map and BPM estimate.
*/

use crate::{
	AudioInfo,
	INPUT_WINDOW_OFFSET,
	INPUT_WINDOW_SIZE,
	Peak,
	PeakDetector,
	WarpClipError,
	WarpMap,
	wave,
};
use fyi_msg::Msg;
use std::{
	fs::File,
	io::BufReader,
	path::Path,
};



/// # Clip.
///
/// Owns the loaded audio format, the detected peak list, and the warp map.
/// Holds the peak detector by mutable reference rather than by value: its
/// lifetime is the caller's responsibility and it is never owned by the
/// clip.
pub struct Clip<'a> {
	/// # Audio Format.
	info: AudioInfo,

	/// # Detected Peaks (File-Absolute Indices).
	peaks: Vec<Peak>,

	/// # Warp Map.
	warp: WarpMap,

	/// # Cached BPM.
	bpm: Option<f64>,

	/// # Peak Detector (Non-Owning).
	detector: &'a mut dyn PeakDetector,
}

impl<'a> Clip<'a> {
	#[must_use]
	/// # New.
	///
	/// Constructs an empty, unloaded clip bound to `detector`.
	pub fn new(detector: &'a mut dyn PeakDetector) -> Self {
		Self {
			info: AudioInfo::default(),
			peaks: Vec::new(),
			warp: WarpMap::new(),
			bpm: None,
			detector,
		}
	}

	#[must_use]
	/// # Audio Info.
	pub const fn info(&self) -> &AudioInfo { &self.info }

	#[must_use]
	/// # Peaks.
	pub fn peaks(&self) -> &[Peak] { &self.peaks }

	#[must_use]
	/// # Warp Map.
	pub const fn warp(&self) -> &WarpMap { &self.warp }

	/// # Load.
	///
	/// Reads `path` as a mono IEEE-float `.wav` file, runs the windowed
	/// peak-detection pipeline over its samples, and installs the default
	/// warp markers.
	///
	/// ## Errors
	///
	/// Returns [`WarpClipError::MissingExtension`] if `path` does not end in
	/// `.wav`; [`WarpClipError::IoFailure`] on open/read failure;
	/// [`WarpClipError::MalformedWave`] on a bad header; propagates any
	/// error from [`WarpMap::add_default_markers`].
	pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), WarpClipError> {
		let path = path.as_ref();
		if path.extension().and_then(std::ffi::OsStr::to_str) != Some("wav") {
			return Err(WarpClipError::MissingExtension);
		}

		let file = File::open(path).map_err(|_| WarpClipError::IoFailure)?;
		let mut reader = BufReader::new(file);

		self.info = wave::read_format(&mut reader)?;

		if self.info.channels > 1 {
			Msg::warning("More than one channel is not supported at this time.").eprint();
		}

		let mut window = vec![0.0_f32; INPUT_WINDOW_SIZE];
		let mut peaks = Vec::new();

		let total = self.info.total_samples as usize;
		let mut samples_left = total;

		let first_n = samples_left.min(INPUT_WINDOW_SIZE);
		let (first_read, first_ok) = wave::read_samples(&mut reader, &self.info, first_n, &mut window[..first_n])?;
		if ! first_ok { return Err(WarpClipError::IoFailure); }
		for s in &mut window[first_read..] { *s = 0.0; }

		for p in self.detector.get_peaks(&window, &self.info)? {
			peaks.push(p);
		}
		samples_left -= first_read;

		while samples_left > 0 {
			// Carry the tail of the previous window forward as the head of
			// this one before reading anything new, so the detector always
			// sees real overlap rather than stale head data.
			window.copy_within(INPUT_WINDOW_SIZE - INPUT_WINDOW_OFFSET.., 0);

			let budget = INPUT_WINDOW_SIZE - INPUT_WINDOW_OFFSET;
			let n = samples_left.min(budget);

			let (read, ok) = wave::read_samples(&mut reader, &self.info, n, &mut window[INPUT_WINDOW_OFFSET..INPUT_WINDOW_OFFSET + n])?;
			if ! ok { return Err(WarpClipError::IoFailure); }
			for s in &mut window[INPUT_WINDOW_OFFSET + read..] { *s = 0.0; }

			let window_start = total - samples_left - INPUT_WINDOW_OFFSET;
			for p in self.detector.get_peaks(&window, &self.info)? {
				peaks.push(Peak::new(
					p.peak_sample_index + window_start as f64,
					p.attack_sample_index + window_start as f64,
				));
			}

			samples_left -= read;
		}

		// An onset near a window boundary can be detected again when the
		// overlap region is reprocessed as the head of the next window;
		// since peaks are appended in non-decreasing absolute-index order,
		// such duplicates are always adjacent here.
		peaks.dedup_by(|a, b| (a.peak_sample_index - b.peak_sample_index).abs() < 1.0);

		self.peaks = peaks;
		self.bpm = None;
		self.warp = WarpMap::new();

		let duration = self.duration();
		self.warp.add_default_markers(self.info.is_valid(), duration)
	}

	#[must_use]
	/// # Duration (Seconds).
	///
	/// `0.0` if the audio info is invalid.
	pub fn duration(&self) -> f64 {
		if ! self.info.is_valid() { return 0.0; }
		f64::from(self.info.total_samples) / f64::from(self.info.sample_rate)
	}

	/// # Add Warp Marker.
	///
	/// ## Errors
	///
	/// Returns [`WarpClipError::MarkerRejected`] if validation fails.
	pub fn add_marker(&mut self, sample_time: f64, beat_time: f64) -> Result<(), WarpClipError> {
		let duration = self.duration();
		self.warp.add(sample_time, beat_time, duration)
	}

	#[must_use]
	/// # Sample Time → Beat Time.
	///
	/// Returns `0.0` if no bounding segment can be found; this is part of
	/// the contract, not an error channel.
	pub fn sample_to_beat_time(&mut self, sample_time: f64) -> f64 {
		let Some((lo, hi)) = self.warp.bounding_for_sample_time(sample_time) else { return 0.0; };
		crate::linear_map(sample_time, lo.sample_time, hi.sample_time, lo.beat_time, hi.beat_time)
	}

	#[must_use]
	/// # Beat Time → Sample Time.
	pub fn beat_to_sample_time(&mut self, beat_time: f64) -> f64 {
		let Some((lo, hi)) = self.warp.bounding_for_beat_time(beat_time) else { return 0.0; };
		crate::linear_map(beat_time, lo.beat_time, hi.beat_time, lo.sample_time, hi.sample_time)
	}

	/// # BPM.
	///
	/// Estimated from the mean inter-peak interval of the detected onset
	/// list, divided by the peak count (not the interval count — a
	/// deliberately naive estimator; see module docs on
	/// [`peaks`](Self::peaks)). Cached after the first successful
	/// computation.
	///
	/// ## Errors
	///
	/// Returns [`WarpClipError::BpmUnavailable`] if fewer than two peaks
	/// were detected, the audio info is invalid, the sample rate is zero,
	/// or the mean interval is zero.
	pub fn bpm(&mut self) -> Result<f64, WarpClipError> {
		if let Some(v) = self.bpm { return Ok(v); }

		if self.peaks.len() <= 1 || ! self.info.is_valid() {
			return Err(WarpClipError::BpmUnavailable);
		}

		let sr = f64::from(self.info.sample_rate);
		if sr == 0.0 { return Err(WarpClipError::BpmUnavailable); }

		let mut sum = 0.0_f64;
		for pair in self.peaks.windows(2) {
			let prev = pair[0].peak_sample_index / sr;
			let cur = pair[1].peak_sample_index / sr;
			sum += cur - prev;
		}

		let n = self.peaks.len() as f64;
		let mean_interval = sum / n;
		if mean_interval == 0.0 { return Err(WarpClipError::BpmUnavailable); }

		let bpm = 60.0 / mean_interval;
		self.bpm = Some(bpm);
		Ok(bpm)
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::SimplePeakDetector;
	use std::io::Write;

	fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) {
		let mut out = Vec::new();
		let data_size = (samples.len() * 4) as u32;

		out.extend_from_slice(b"RIFF");
		out.extend_from_slice(&(36 + 12 + data_size).to_le_bytes());
		out.extend_from_slice(b"WAVE");

		out.extend_from_slice(b"fmt ");
		out.extend_from_slice(&16_u32.to_le_bytes());
		out.extend_from_slice(&3_u16.to_le_bytes());
		out.extend_from_slice(&1_u16.to_le_bytes());
		out.extend_from_slice(&sample_rate.to_le_bytes());
		out.extend_from_slice(&(sample_rate * 4).to_le_bytes());
		out.extend_from_slice(&4_u16.to_le_bytes());
		out.extend_from_slice(&32_u16.to_le_bytes());

		out.extend_from_slice(b"fact");
		out.extend_from_slice(&4_u32.to_le_bytes());
		out.extend_from_slice(&(samples.len() as u32).to_le_bytes());

		out.extend_from_slice(b"data");
		out.extend_from_slice(&data_size.to_le_bytes());
		for s in samples { out.extend_from_slice(&s.to_le_bytes()); }

		let mut f = File::create(path).unwrap();
		f.write_all(&out).unwrap();
	}

	#[test]
	fn t_s1_identity_clip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("s1.wav");
		let samples = vec![0.0_f32; 4 * 44_100];
		write_wav(&path, 44_100, &samples);

		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		clip.load(&path).unwrap();

		// Defaults (0,0) and (4,4) are already in place after load.
		clip.add_marker(1.0, 2.0).unwrap();
		clip.add_marker(2.0, 3.0).unwrap();

		// 6.0 is beyond every existing beat-time marker, so no beat-axis
		// bounding segment exists even though a sample-axis one does.
		assert!(clip.add_marker(3.0, 6.0).is_err());

		assert!((clip.sample_to_beat_time(0.5) - 1.0).abs() < 1e-9);
		assert!((clip.sample_to_beat_time(1.5) - 2.5).abs() < 1e-9);
		assert!((clip.beat_to_sample_time(2.5) - 1.5).abs() < 1e-9);
	}

	#[test]
	fn t_s2_empty_map() {
		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		assert_eq!(clip.sample_to_beat_time(0.0), 0.0);
		assert_eq!(clip.beat_to_sample_time(0.0), 0.0);
	}

	#[test]
	fn t_s5_rejects_non_float_codec() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("s5.wav");

		let mut out = Vec::new();
		out.extend_from_slice(b"RIFF");
		out.extend_from_slice(&0_u32.to_le_bytes());
		out.extend_from_slice(b"WAVE");
		out.extend_from_slice(b"fmt ");
		out.extend_from_slice(&16_u32.to_le_bytes());
		out.extend_from_slice(&1_u16.to_le_bytes()); // PCM, not IEEE float
		out.extend_from_slice(&1_u16.to_le_bytes());
		out.extend_from_slice(&44_100_u32.to_le_bytes());
		out.extend_from_slice(&(44_100_u32 * 4).to_le_bytes());
		out.extend_from_slice(&4_u16.to_le_bytes());
		out.extend_from_slice(&32_u16.to_le_bytes());
		out.extend_from_slice(b"fact");
		out.extend_from_slice(&4_u32.to_le_bytes());
		out.extend_from_slice(&1_u32.to_le_bytes());
		out.extend_from_slice(b"data");
		out.extend_from_slice(&4_u32.to_le_bytes());
		out.extend_from_slice(&0.0_f32.to_le_bytes());
		std::fs::write(&path, &out).unwrap();

		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		assert!(matches!(clip.load(&path), Err(WarpClipError::MalformedWave(_))));
		assert_eq!(clip.duration(), 0.0);
	}

	#[test]
	fn t_s6_overlap_detection() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("s6.wav");

		let total = INPUT_WINDOW_SIZE + (INPUT_WINDOW_SIZE - INPUT_WINDOW_OFFSET);
		let mut samples = vec![0.0_f32; total];

		// A single full-scale sample never crosses the envelope follower's
		// 0.5 trigger threshold (see peak.rs's t_impulse_emits_one_rising_edge);
		// use a sustained pulse straddling the overlap region instead — its
		// head lands in the tail of the first window, its body is fully
		// reconstructed at the head of the second.
		const PULSE_LEN: usize = 200;
		samples[65_500..65_500 + PULSE_LEN].fill(1.0);
		write_wav(&path, 44_100, &samples);

		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		clip.load(&path).unwrap();

		// The truncated view of the pulse in the first window (only its
		// first 36 samples, cut off at the window boundary) never crosses
		// the trigger threshold, so exactly one rising edge should be
		// reported, somewhere within or shortly after the pulse.
		let matches: Vec<_> = clip.peaks().iter()
			.filter(|p| p.peak_sample_index >= 65_500.0 && p.peak_sample_index < (65_500 + PULSE_LEN + 256) as f64)
			.collect();
		assert_eq!(matches.len(), 1);
	}

	#[test]
	fn t_requires_wav_extension() {
		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		assert!(matches!(clip.load("not-a-wav.txt"), Err(WarpClipError::MissingExtension)));
	}

	#[test]
	fn t_s3_bpm_from_synthetic_peaks() {
		// Peaks at sample indices {0, 22_050, 44_100, 66_150} at 44_100 Hz:
		// four peaks, three intervals summing to 1.5s, so BPM = 60 * 4 / 1.5.
		//
		// This exercises the BPM formula in isolation, against the literal
		// indices spec.md's S3 scenario names, rather than by re-deriving
		// them from a synthesized waveform: the peak detector's onset
		// timing (see peak.rs) has its own dedicated coverage, and pinning
		// *this* test to an exact detected sample index would make it a
		// test of filter settling time, not of the BPM math.
		let mut det = SimplePeakDetector::new();
		let mut clip = Clip {
			info: AudioInfo { sample_rate: 44_100, bits_per_sample: 32, channels: 1, total_samples: 66_151 },
			peaks: vec![
				Peak::new(0.0, 0.0),
				Peak::new(22_050.0, 22_050.0),
				Peak::new(44_100.0, 44_100.0),
				Peak::new(66_150.0, 66_150.0),
			],
			warp: WarpMap::new(),
			bpm: None,
			detector: &mut det,
		};
		assert_eq!(clip.peaks().len(), 4);

		let bpm = clip.bpm().unwrap();
		assert!((bpm - 160.0).abs() < 1e-9);

		// Second call must return the cached value (same result, no panic on
		// an empty/changed peak list since nothing was mutated).
		assert_eq!(clip.bpm().unwrap(), bpm);
	}

	#[test]
	fn t_round_trip_and_piecewise_linearity() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("roundtrip.wav");
		let samples = vec![0.0_f32; 4 * 44_100];
		write_wav(&path, 44_100, &samples);

		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		clip.load(&path).unwrap();
		clip.add_marker(1.0, 2.0).unwrap();

		// Universal invariant 1: round-trip near identity for every inserted
		// marker, including the defaults.
		for (s, b) in [(0.0, 0.0), (1.0, 2.0), (4.0, 4.0)] {
			assert!((clip.sample_to_beat_time(s) - b).abs() < 1e-12);
			assert!((clip.beat_to_sample_time(b) - s).abs() < 1e-12);
		}

		// Universal invariant 2: any point within a segment lies on the line
		// through its two endpoints. Segment (1.0, 2.0)-(4.0, 4.0): slope is
		// 2/3 beat-seconds per sample-second.
		let expected = 2.0 + (2.5 - 1.0) * (2.0 / 3.0);
		assert!((clip.sample_to_beat_time(2.5) - expected).abs() < 1e-9);

		// Universal invariant 3: monotonicity within a segment.
		let b1 = clip.sample_to_beat_time(1.5);
		let b2 = clip.sample_to_beat_time(2.5);
		assert!(b1 <= b2);
	}

	#[test]
	fn t_cache_equivalence() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("cache.wav");
		let samples = vec![0.0_f32; 4 * 44_100];
		write_wav(&path, 44_100, &samples);

		let mut det = SimplePeakDetector::new();
		let mut clip = Clip::new(&mut det);
		clip.load(&path).unwrap();
		clip.add_marker(1.0, 2.0).unwrap();
		clip.add_marker(2.0, 2.5).unwrap();

		// Pre-warm the cache on an unrelated segment, then query a point in a
		// different segment; the result must match what a freshly-loaded
		// (uncached) clip returns for the same query.
		let _ = clip.sample_to_beat_time(0.5);
		let warmed = clip.sample_to_beat_time(1.5);

		let mut det2 = SimplePeakDetector::new();
		let mut fresh = Clip::new(&mut det2);
		fresh.load(&path).unwrap();
		fresh.add_marker(1.0, 2.0).unwrap();
		fresh.add_marker(2.0, 2.5).unwrap();
		let cold = fresh.sample_to_beat_time(1.5);

		assert!((warmed - cold).abs() < 1e-12);
	}
}

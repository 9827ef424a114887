/*!
# WarpClip: Warp-Marker Map

A dual-indexed ordered map binding sample time to beat time. The primary
index ([`BTreeMap<u32, WarpMarker>`]) owns every marker, keyed by a
quantized sample index; the secondary index is a plain `BTreeMap` keyed by
beat time holding only the sample index back into the primary — one owner,
one set of non-owning keys, no aliased pointers.

Lookup by either axis goes through [`WarpMap::find_bounding_by_sample_time`]
or [`WarpMap::find_bounding_by_beat_time`]: two specialized routines rather
than one generic search behind a function-pointer or trait-object axis
selector.
*/

use crate::{
	almost_equal,
	is_valid_time,
	round,
	SR0,
	TIME_ABSOLUTE_TOLERANCE,
	TIME_RELATIVE_TOLERANCE,
	WarpClipError,
};
use std::{
	cmp::Ordering,
	collections::BTreeMap,
};



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Warp Marker.
///
/// Anchors a sample time to a beat time. `sample_index` is derived once at
/// construction as `round(sample_time * SR0)`; it exists purely as an
/// ordering/quantization key and is always computed against the crate-wide
/// [`SR0`], never the clip's actual sample rate.
pub struct WarpMarker {
	/// # Sample Time (Seconds).
	pub sample_time: f64,

	/// # Beat Time (Seconds, Tempo-Relative).
	pub beat_time: f64,

	/// # Quantized Sample Index (Ordering Key).
	pub sample_index: u32,
}

impl WarpMarker {
	#[must_use]
	/// # New.
	///
	/// Derives `sample_index` from `sample_time` against [`SR0`], clamping
	/// to the `u32` range.
	pub fn new(sample_time: f64, beat_time: f64) -> Self {
		let idx = round(sample_time * f64::from(SR0));
		let sample_index = idx.clamp(0, i64::from(u32::MAX)) as u32;
		Self { sample_time, beat_time, sample_index }
	}
}



#[derive(Debug, Clone, Copy, PartialEq)]
/// # Beat-Time Key.
///
/// A thin wrapper giving `f64` a total order for use as a `BTreeMap` key.
/// Every beat time stored here has already passed [`is_valid_time`], so
/// `NaN` never reaches [`Self::cmp`].
struct BeatKey(f64);

impl Eq for BeatKey {}

impl Ord for BeatKey {
	fn cmp(&self, other: &Self) -> Ordering { self.0.total_cmp(&other.0) }
}

impl PartialOrd for BeatKey {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}



#[derive(Debug, Clone, Default)]
/// # Warp Map.
///
/// Owns every [`WarpMarker`] added to a clip, indexed for fast lookup by
/// either sample time or beat time, plus a one-segment cache for the most
/// recently resolved bounding pair.
pub struct WarpMap {
	/// # Primary Index (Owning).
	by_sample_index: BTreeMap<u32, WarpMarker>,

	/// # Secondary Index (Non-Owning).
	by_beat_time: BTreeMap<BeatKey, u32>,

	/// # Segment Cache.
	cache: Option<(WarpMarker, WarpMarker)>,
}

impl WarpMap {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	#[must_use]
	/// # Len.
	pub fn len(&self) -> usize { self.by_sample_index.len() }

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.by_sample_index.is_empty() }

	#[must_use]
	/// # First (Minimal Sample Index).
	pub fn first(&self) -> Option<&WarpMarker> {
		self.by_sample_index.values().next()
	}

	#[must_use]
	/// # Last (Maximal Sample Index).
	pub fn last(&self) -> Option<&WarpMarker> {
		self.by_sample_index.values().next_back()
	}

	/// # Add Default Markers.
	///
	/// Inserts `(0, 0)` and `(duration, duration)`. Fails if `audio_valid`
	/// is `false` or either insertion is rejected.
	///
	/// ## Errors
	///
	/// Returns [`WarpClipError::InvalidAudioInfo`] or
	/// [`WarpClipError::MarkerRejected`].
	pub fn add_default_markers(&mut self, audio_valid: bool, duration: f64) -> Result<(), WarpClipError> {
		self.add(0.0, 0.0, duration)?;

		if ! audio_valid { return Err(WarpClipError::InvalidAudioInfo); }

		self.add(duration, duration, duration)
	}

	/// # Add.
	///
	/// Validates and inserts a new marker at `(sample_time, beat_time)`,
	/// given the clip's current `duration`. A successful add invalidates
	/// the segment cache.
	///
	/// ## Errors
	///
	/// Returns [`WarpClipError::MarkerRejected`] with a short reason if any
	/// validation step fails.
	pub fn add(&mut self, sample_time: f64, beat_time: f64, duration: f64) -> Result<(), WarpClipError> {
		self.validate_for_add(sample_time, beat_time, duration)?;

		let marker = WarpMarker::new(sample_time, beat_time);
		self.by_sample_index.insert(marker.sample_index, marker);
		self.by_beat_time.insert(BeatKey(beat_time), marker.sample_index);
		self.cache = None;

		Ok(())
	}

	/// # Validate For Add.
	fn validate_for_add(&self, sample_time: f64, beat_time: f64, duration: f64) -> Result<(), WarpClipError> {
		if ! is_valid_time(sample_time) || ! is_valid_time(beat_time) {
			return Err(WarpClipError::MarkerRejected("sample or beat time is not a valid time"));
		}

		let within_duration = sample_time <= duration ||
			almost_equal(sample_time, duration, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE);
		if sample_time < 0.0 || ! within_duration {
			return Err(WarpClipError::MarkerRejected("sample time is out of bounds"));
		}

		if beat_time < 0.0 {
			return Err(WarpClipError::MarkerRejected("beat time is negative"));
		}

		if self.is_empty() { return Ok(()); }

		let sample_index = WarpMarker::new(sample_time, beat_time).sample_index;
		if self.by_sample_index.contains_key(&sample_index) {
			return Err(WarpClipError::MarkerRejected("sample index already present"));
		}
		if self.by_beat_time.contains_key(&BeatKey(beat_time)) {
			return Err(WarpClipError::MarkerRejected("beat time already present"));
		}

		let Some((lo_s, hi_s)) = self.find_bounding_by_sample_time(sample_time) else {
			// Outside the existing range on the sample axis; this covers
			// adding the second endpoint.
			return Ok(());
		};

		let Some((lo_b, hi_b)) = self.find_bounding_by_beat_time(beat_time) else {
			return Err(WarpClipError::MarkerRejected("no bounding segment on the beat-time axis"));
		};

		if lo_b != lo_s || hi_b != hi_s {
			return Err(WarpClipError::MarkerRejected("bounding segments differ between axes"));
		}

		if almost_equal(sample_time, lo_s.sample_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE) ||
			almost_equal(sample_time, hi_s.sample_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE) ||
			almost_equal(beat_time, lo_s.beat_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE) ||
			almost_equal(beat_time, hi_s.beat_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE)
		{
			return Err(WarpClipError::MarkerRejected("too similar to an existing endpoint"));
		}

		Ok(())
	}

	#[must_use]
	/// # Find Bounding Markers By Sample Time.
	pub fn find_bounding_by_sample_time(&self, sample_time: f64) -> Option<(WarpMarker, WarpMarker)> {
		let idx = round(sample_time * f64::from(SR0)).clamp(0, i64::from(u32::MAX)) as u32;
		self.find_bounding_by_sample_index(idx)
	}

	#[must_use]
	/// # Find Bounding Markers By Sample Index.
	fn find_bounding_by_sample_index(&self, sample_index: u32) -> Option<(WarpMarker, WarpMarker)> {
		if self.by_sample_index.len() < 2 { return None; }

		let mut ge = self.by_sample_index.range(sample_index..);
		let (&just_after_key, just_after) = ge.next()?;
		let lowest_key = *self.by_sample_index.keys().next()?;

		let lo = if just_after_key == lowest_key || just_after_key == sample_index {
			*just_after
		}
		else {
			*self.by_sample_index.range(..sample_index).next_back()?.1
		};

		if lo.sample_index > sample_index { return None; }

		let mut gt = self.by_sample_index.range((std::ops::Bound::Excluded(sample_index), std::ops::Bound::Unbounded));
		let (_, hi) = gt.next()?;
		if hi.sample_index <= sample_index { return None; }

		Some((lo, *hi))
	}

	#[must_use]
	/// # Find Bounding Markers By Beat Time.
	pub fn find_bounding_by_beat_time(&self, beat_time: f64) -> Option<(WarpMarker, WarpMarker)> {
		if self.by_beat_time.len() < 2 { return None; }

		let key = BeatKey(beat_time);

		let mut ge = self.by_beat_time.range(key..);
		let (&just_after_key, &just_after_idx) = ge.next()?;
		let just_after = self.by_sample_index.get(&just_after_idx)?;

		let lowest_key = *self.by_beat_time.keys().next()?;

		let lo = if just_after_key == lowest_key ||
			almost_equal(just_after.beat_time, beat_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE)
		{
			*just_after
		}
		else {
			let (_, &idx) = self.by_beat_time.range(..key).next_back()?;
			*self.by_sample_index.get(&idx)?
		};

		if lo.beat_time > beat_time &&
			! almost_equal(lo.beat_time, beat_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE)
		{
			return None;
		}

		let mut gt = self.by_beat_time.range((std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded));
		let (_, &hi_idx) = gt.next()?;
		let hi = *self.by_sample_index.get(&hi_idx)?;

		if hi.beat_time < beat_time ||
			almost_equal(hi.beat_time, beat_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE)
		{
			return None;
		}

		Some((lo, hi))
	}

	#[must_use]
	/// # Cached Bounding Segment For Sample Time.
	///
	/// Returns the cached segment if `sample_time` falls within it, else
	/// resolves and re-caches via [`Self::find_bounding_by_sample_time`].
	pub fn bounding_for_sample_time(&mut self, sample_time: f64) -> Option<(WarpMarker, WarpMarker)> {
		if let Some((lo, hi)) = self.cache {
			let low_ok = sample_time > lo.sample_time ||
				almost_equal(sample_time, lo.sample_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE);
			if low_ok && sample_time < hi.sample_time {
				return Some((lo, hi));
			}
		}

		let found = self.find_bounding_by_sample_time(sample_time)?;
		self.cache = Some(found);
		Some(found)
	}

	#[must_use]
	/// # Cached Bounding Segment For Beat Time.
	pub fn bounding_for_beat_time(&mut self, beat_time: f64) -> Option<(WarpMarker, WarpMarker)> {
		if let Some((lo, hi)) = self.cache {
			let low_ok = beat_time > lo.beat_time ||
				almost_equal(beat_time, lo.beat_time, TIME_RELATIVE_TOLERANCE, TIME_ABSOLUTE_TOLERANCE);
			if low_ok && beat_time < hi.beat_time {
				return Some((lo, hi));
			}
		}

		let found = self.find_bounding_by_beat_time(beat_time)?;
		self.cache = Some(found);
		Some(found)
	}
}

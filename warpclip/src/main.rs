/*!
# WarpClip!
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

mod cli;

use dactyl::NiceU32;
use fyi_msg::Msg;
use warpclip_core::{
	Clip,
	SimplePeakDetector,
	WarpClipError,
};



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() {
	match _main() {
		Ok(()) => {},
		Err(WarpClipError::PrintHelp) => { println!("{}", WarpClipError::PrintHelp); },
		Err(WarpClipError::PrintVersion) => { println!("{}", WarpClipError::PrintVersion); },
		Err(e) => {
			Msg::from(e).eprint();
			std::process::exit(1);
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn _main() -> Result<(), WarpClipError> {
	let opts = cli::parse()?;

	let mut detector = SimplePeakDetector::new();
	let mut clip = Clip::new(&mut detector);
	clip.load(&opts.path)?;

	for (sample_time, beat_time) in &opts.markers {
		if let Err(e) = clip.add_marker(*sample_time, *beat_time) {
			Msg::from(e).eprint();
		}
	}

	let info = *clip.info();
	eprintln!(
		"\x1b[1;38;5;199mWarpClip\x1b[0m \x1b[2m({} Hz, {}-bit, {} sample(s))\x1b[0m",
		NiceU32::from(info.sample_rate),
		info.bits_per_sample,
		NiceU32::from(info.total_samples),
	);

	if ! opts.quiet { print_tables(&mut clip, opts.step); }

	println!("Duration: {:.3}s", clip.duration());
	match clip.bpm() {
		Ok(bpm) => println!("BPM: {bpm:.2}"),
		Err(e) => Msg::from(e).eprint(),
	}

	Ok(())
}

/// # Print Sample/Beat Tables.
///
/// Walks the sample-time axis from zero to the clip's duration, then the
/// beat-time axis from zero to the last warp marker's beat time, printing
/// both conversions at `step`-second intervals.
fn print_tables(clip: &mut Clip, step: f64) {
	let duration = clip.duration();
	let mut t = 0.0_f64;
	while t < duration {
		println!("Sample time: {t:.3}, beat time: {:.3}", clip.sample_to_beat_time(t));
		t += step;
	}

	let max_beat = clip.warp().last().map_or(0.0, |m| m.beat_time);
	let mut b = 0.0_f64;
	while b < max_beat {
		println!("Beat time: {b:.3}, sample time: {:.3}", clip.beat_to_sample_time(b));
		b += step;
	}
}

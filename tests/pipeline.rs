//! End-to-end scenarios driving the magnification engine and the
//! processing thread.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};
use video_magnify::{
    capture::{Frame, Rect, SharedFrameBuffer},
    magnify::{MagnifyMode, MagnifySettings, Magnificator},
    processing::{ProcessingControl, ProcessingThread, Publisher, RecordingSink},
};

fn constant_bgr(value: u8, n: u32, seq: u64) -> Frame {
    Frame::filled(value, n, n, 3, seq)
}

fn settings(mode: MagnifyMode) -> MagnifySettings {
    MagnifySettings {
        mode,
        levels: 3,
        amplification: 10.0,
        co_low: 0.5,
        co_high: 2.0,
        framerate: 30.0,
        ..Default::default()
    }
}

/// Constant input must come back unchanged in every mode, with a zero
/// breath measure.
#[test]
fn constant_input_is_identity_in_every_mode() {
    for mode in [MagnifyMode::Color, MagnifyMode::Laplace, MagnifyMode::Riesz] {
        let mut mag = Magnificator::new(settings(mode));
        for seq in 0..64 {
            mag.push_input(constant_bgr(128, 64, seq));
            mag.consume();
        }
        let mut outputs = 0;
        while let Some(frame) = mag.get_frame_first() {
            outputs += 1;
            assert!(
                frame.pixels().iter().all(|&v| (v as i32 - 128).abs() <= 1),
                "mode {mode:?} altered a constant frame"
            );
        }
        assert!(outputs > 0);
        assert_eq!(mag.breath_measure(), 0, "mode {mode:?}");
    }
}

/// Color mode amplifies a chroma pulsation while leaving the quiet
/// channels an order of magnitude stiller.
#[test]
fn color_mode_amplifies_chroma_pulsation() {
    let config = MagnifySettings {
        mode: MagnifyMode::Color,
        levels: 3,
        amplification: 10.0,
        co_low: 1.0,
        co_high: 2.0,
        framerate: 30.0,
        ..Default::default()
    };
    let mut mag = Magnificator::new(config);

    let n = 32u32;
    // Black and white anchor pixels pin the observed range so the
    // output rescale stays close to the identity.
    let make_frame = |t: u64| -> Frame {
        let red_pulse = 10.0 * (TAU * 1.5 * t as f32 / 30.0).sin();
        let mut pixels = Vec::with_capacity((n * n * 3) as usize);
        for y in 0..n {
            for x in 0..n {
                if y == 0 && x == 0 {
                    pixels.extend_from_slice(&[0, 0, 0]);
                } else if y == 0 && x == 1 {
                    pixels.extend_from_slice(&[255, 255, 255]);
                } else {
                    let in_block = (8..24).contains(&x) && (8..24).contains(&y);
                    let red = if in_block {
                        (128.0 + red_pulse).round().clamp(0.0, 255.0) as u8
                    } else {
                        128
                    };
                    pixels.extend_from_slice(&[128, 128, red]);
                }
            }
        }
        Frame::new(pixels, n, n, 3, t)
    };

    let mut outputs = Vec::new();
    for t in 0..64 {
        mag.push_input(make_frame(t));
        mag.consume();
        while let Some(frame) = mag.get_frame_first() {
            outputs.push(frame);
        }
    }
    assert_eq!(outputs.len(), 64);

    // Peak-to-peak temporal swing of each channel at the block
    // center, over the settled second half.
    let mut lo = [255i32; 3];
    let mut hi = [0i32; 3];
    for frame in &outputs[32..] {
        for c in 0..3u8 {
            let v = frame.sample(16, 16, c) as i32;
            lo[c as usize] = lo[c as usize].min(v);
            hi[c as usize] = hi[c as usize].max(v);
        }
    }
    let red_amplitude = (hi[2] - lo[2]) / 2;
    assert!(
        (30..=140).contains(&red_amplitude),
        "red amplitude {red_amplitude} outside amplified range"
    );
    // The input pulsation was 10; the quiet channels must move far
    // less than the amplified red.
    for c in [0usize, 1] {
        let swing = hi[c] - lo[c];
        assert!(swing <= 10, "quiet channel {c} swings by {swing}");
        assert!(swing * 3 <= red_amplitude, "channel {c} not quiet: {swing}");
    }
}

fn bar_frame(n: u32, left: f32, bar_width: f32, seq: u64) -> Frame {
    // Anti-aliased vertical bar so sub-pixel positions render
    let bg = 60.0f32;
    let fg = 150.0f32;
    let right = left + bar_width;
    let mut pixels = Vec::with_capacity((n * n) as usize);
    for _y in 0..n {
        for x in 0..n {
            let coverage =
                ((x as f32 + 1.0).min(right) - (x as f32).max(left)).clamp(0.0, 1.0);
            let v = bg + (fg - bg) * coverage;
            pixels.push(v.round() as u8);
        }
    }
    Frame::new(pixels, n, n, 1, seq)
}

fn bump_frame(n: u32, center: f32, seq: u64) -> Frame {
    // Smooth vertical ridge; its energy sits in the mid pyramid
    // levels where the Laplacian gain ramp is largest.
    let bg = 60.0f32;
    let peak = 170.0f32;
    let sigma = 3.0f32;
    let mut pixels = Vec::with_capacity((n * n) as usize);
    for _y in 0..n {
        for x in 0..n {
            let d = x as f32 - center;
            let v = bg + (peak - bg) * (-d * d / (2.0 * sigma * sigma)).exp();
            pixels.push(v.round().clamp(0.0, 255.0) as u8);
        }
    }
    Frame::new(pixels, n, n, 1, seq)
}

/// Intensity-weighted horizontal centroid of everything above the
/// background level, averaged over rows.
fn ridge_centroid(frame: &Frame) -> f32 {
    let n = frame.width();
    let (mut weighted, mut total) = (0.0f64, 0.0f64);
    for y in 0..n {
        for x in 0..n {
            let v = (frame.sample(x, y, 0) as f64 - 60.0).max(0.0);
            weighted += v * x as f64;
            total += v;
        }
    }
    (weighted / total) as f32
}

/// Laplace mode turns a sub-pixel ridge oscillation into a clearly
/// larger one.
#[test]
fn laplace_mode_amplifies_subpixel_motion() {
    let config = MagnifySettings {
        mode: MagnifyMode::Laplace,
        levels: 4,
        amplification: 10.0,
        co_low: 0.05,
        co_high: 0.5,
        co_wavelength: 16.0,
        framerate: 30.0,
        ..Default::default()
    };
    let mut mag = Magnificator::new(config);

    let input_amp = 0.5f32;
    let positions: Vec<f32> = (0..32)
        .map(|t| 30.0 + input_amp * (TAU * 2.0 * t as f32 / 30.0).sin())
        .collect();

    let mut outputs = Vec::new();
    for (t, &center) in positions.iter().enumerate() {
        mag.push_input(bump_frame(64, center, t as u64));
        mag.consume();
        while let Some(frame) = mag.get_frame_first() {
            outputs.push(frame);
        }
    }
    assert_eq!(outputs.len(), 32);

    // First frame is the seed and returns unchanged.
    let reference = bump_frame(64, positions[0], 0);
    for (a, b) in outputs[0].pixels().iter().zip(reference.pixels()) {
        assert!((*a as i32 - *b as i32).abs() <= 1);
    }

    // Oscillation amplitude of the ridge centroid, input vs output,
    // past the filter transient.
    let (mut out_min, mut out_max) = (f32::INFINITY, f32::NEG_INFINITY);
    for frame in &outputs[10..] {
        let pos = ridge_centroid(frame);
        out_min = out_min.min(pos);
        out_max = out_max.max(pos);
    }
    let out_amp = (out_max - out_min) / 2.0;
    assert!(
        out_amp >= 2.0 * input_amp,
        "output amplitude {out_amp} vs input {input_amp}"
    );
}

/// Riesz mode amplifies a temporal phase wiggle of a spatial sinusoid.
#[test]
fn riesz_mode_amplifies_phase_wiggle() {
    let config = MagnifySettings {
        mode: MagnifyMode::Riesz,
        levels: 4,
        amplification: 20.0,
        co_low: 0.8,
        co_high: 2.0,
        co_wavelength: 16.0,
        framerate: 30.0,
        ..Default::default()
    };
    let mut mag = Magnificator::new(config);

    let n = 128u32;
    let wavelength = 16.0f32;
    let input_amp = 0.05f32;
    let make_frame = |t: u64| -> Frame {
        let wiggle = input_amp * (TAU * 1.2 * t as f32 / 30.0).sin();
        let mut pixels = Vec::with_capacity((n * n) as usize);
        for _y in 0..n {
            for x in 0..n {
                let v = 128.0 + 64.0 * (TAU * x as f32 / wavelength + wiggle).sin();
                pixels.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }
        Frame::new(pixels, n, n, 1, t)
    };

    // Fitted phase of the dominant spatial frequency, averaged rows.
    let fitted_phase = |frame: &Frame| -> f32 {
        let (mut re, mut im) = (0.0f32, 0.0f32);
        for y in 0..n {
            for x in 0..n {
                let v = frame.sample(x, y, 0) as f32 - 128.0;
                let angle = TAU * x as f32 / wavelength;
                re += v * angle.cos();
                im += v * angle.sin();
            }
        }
        // signal is sin(angle + phi): in-phase with sin, quadrature cos
        (re / im).atan()
    };

    let mut outputs = Vec::new();
    for t in 0..64 {
        mag.push_input(make_frame(t));
        mag.consume();
        while let Some(frame) = mag.get_frame_first() {
            outputs.push(frame);
        }
    }
    assert_eq!(outputs.len(), 64);

    let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
    for frame in &outputs[24..] {
        let phi = fitted_phase(frame);
        lo = lo.min(phi);
        hi = hi.max(phi);
    }
    let out_amp = (hi - lo) / 2.0;
    assert!(
        out_amp > 4.0 * input_amp,
        "output phase amplitude {out_amp} vs input {input_amp}"
    );
}

/// Deterministic version of the ROI-change scenario: resetting the
/// engine makes the next frame a pure pass-through at the new size.
#[test]
fn reset_after_roi_change_reseeds_algorithm() {
    let mut mag = Magnificator::new(MagnifySettings {
        mode: MagnifyMode::Laplace,
        levels: 4,
        ..Default::default()
    });

    for t in 0..10 {
        mag.push_input(bar_frame(128, 40.0 + 0.3 * t as f32, 10.0, t as u64));
    }
    mag.consume();
    assert_eq!(mag.buffer_size(), 10);

    // ROI shrink: the loop drains queues and resets state.
    mag.clear_buffer();
    assert!(!mag.has_frame());

    let frame = bar_frame(64, 20.0, 8.0, 11);
    mag.push_input(frame.clone());
    mag.consume();

    let out = mag.get_frame_first().unwrap();
    assert_eq!(out.width(), 64);
    for (a, b) in out.pixels().iter().zip(frame.pixels()) {
        assert!(
            (*a as i32 - *b as i32).abs() <= 1,
            "first post-reset frame must pass through"
        );
    }
}

/// Thread-level ROI change: output frames switch to the new size and
/// the pipeline keeps running.
#[test]
fn processing_thread_survives_roi_change() {
    let buffer = Arc::new(SharedFrameBuffer::new(8));
    let publisher = Arc::new(Publisher::new());
    let control = ProcessingControl::new(
        MagnifySettings {
            mode: MagnifyMode::Laplace,
            levels: 4,
            ..Default::default()
        },
        Rect::new(0, 0, 128, 128),
    )
    .unwrap();

    let worker = ProcessingThread::new(
        Arc::clone(&buffer),
        Arc::clone(&publisher),
        Arc::clone(&control),
    )
    .spawn();

    let mut sizes = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seq = 0u64;
    let mut changed = false;
    while Instant::now() < deadline {
        buffer.put(bar_frame(128, 40.0 + (seq % 4) as f32 * 0.3, 10.0, seq));
        seq += 1;
        std::thread::sleep(Duration::from_millis(5));
        if let Some(frame) = publisher.take_frame() {
            sizes.push(frame.width());
            if !changed && sizes.len() >= 5 {
                control.set_roi(Rect::new(0, 0, 64, 64)).unwrap();
                changed = true;
            }
            if changed && sizes.iter().filter(|&&w| w == 64).count() >= 5 {
                break;
            }
        }
    }
    control.stop();
    worker.join().unwrap();

    assert!(sizes.contains(&128), "saw no pre-change frames");
    assert!(
        sizes.iter().filter(|&&w| w == 64).count() >= 5,
        "saw no post-change frames: {sizes:?}"
    );
    // Once the ROI shrinks, no 128-wide frame appears again.
    let first_small = sizes.iter().position(|&w| w == 64).unwrap();
    assert!(sizes[first_small..].iter().all(|&w| w == 64));
}

/// Thread-level breath flow: constant frames keep the smoothed breath
/// emissions at zero, and emissions arrive only in Laplace mode.
#[test]
fn processing_thread_emits_smoothed_breath() {
    let buffer = Arc::new(SharedFrameBuffer::new(8));
    let publisher = Arc::new(Publisher::new());
    let control = ProcessingControl::new(
        MagnifySettings {
            mode: MagnifyMode::Laplace,
            levels: 3,
            ..Default::default()
        },
        Rect::new(0, 0, 64, 64),
    )
    .unwrap();

    let sink = RecordingSink::default();
    let values = Arc::clone(&sink.values);

    let worker = ProcessingThread::new(
        Arc::clone(&buffer),
        Arc::clone(&publisher),
        Arc::clone(&control),
    )
    .with_breath_sink(Box::new(sink))
    .spawn();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seq = 0u64;
    while Instant::now() < deadline {
        buffer.put(constant_bgr(128, 64, seq));
        seq += 1;
        std::thread::sleep(Duration::from_millis(5));
        if values.lock().unwrap().len() >= 3 {
            break;
        }
    }
    control.stop();
    worker.join().unwrap();

    let emitted = values.lock().unwrap();
    assert!(emitted.len() >= 3, "no smoothed breath emissions");
    assert!(emitted.iter().all(|&v| v == 0));
}

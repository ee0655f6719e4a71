//! End-to-end speech animation tests
//!
//! Runs the full control loop against recording actuators and silent outputs

use std::sync::Arc;
use std::time::{Duration, Instant};

use servomouth::Error;
use servomouth::config::AnimationConfig;

mod common;

use common::{
    BrokenOutput, CountingOutput, RecordedRig, RecordingActuator, animation, dc_clip, sine_clip,
    speaker,
};

#[tokio::test]
async fn test_sine_clip_drives_mouth_in_real_time() {
    let recorded = RecordedRig::new();
    let output = CountingOutput::default();
    let mut speaker = speaker(
        &recorded,
        Arc::new(output.clone()),
        animation(Duration::from_millis(100), 60.0),
    );
    let clip = Arc::new(sine_clip(440.0, 1.0, 0.5, 16_000));

    let begun = Instant::now();
    speaker.speak(clip).await.unwrap();
    let elapsed = begun.elapsed();

    // 1.0 s of windows plus 0.25 s trailing delay, 50 ms of jitter
    assert!(elapsed >= Duration::from_millis(1_200), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(1_300), "elapsed {elapsed:?}");
    assert_eq!(output.plays(), 1);

    // Ten windows, then the mouth returns to rest
    let writes = recorded.mouth.writes();
    assert_eq!(writes.len(), 11);
    for angle in &writes[..10] {
        assert!((angle - 42.43).abs() < 0.1, "angle = {angle}");
    }
    assert!(writes[10].abs() < f32::EPSILON);

    // Arms got one gesture step per window
    for arm in &recorded.arms {
        let steps = arm.writes();
        assert_eq!(steps.len(), 10);
        let mut previous = 0.0_f32;
        for angle in steps {
            assert!((angle - previous).abs() <= 1.0 + 1e-4);
            previous = angle;
        }
    }
}

#[tokio::test]
async fn test_silent_clip_keeps_mouth_closed() {
    let recorded = RecordedRig::new();
    let mut speaker = speaker(
        &recorded,
        Arc::new(CountingOutput::default()),
        animation(Duration::from_millis(10), 60.0),
    );

    speaker
        .speak(Arc::new(dc_clip(0.0, 1_600, 16_000)))
        .await
        .unwrap();

    let writes = recorded.mouth.writes();
    assert_eq!(writes.len(), 11);
    assert!(writes.iter().all(|a| *a == 0.0));
}

#[tokio::test]
async fn test_sub_sample_interval_fails_before_playback() {
    let recorded = RecordedRig::new();
    let output = CountingOutput::default();
    let mut speaker = speaker(
        &recorded,
        Arc::new(output.clone()),
        animation(Duration::from_micros(20), 60.0),
    );

    let result = speaker.speak(Arc::new(dc_clip(0.5, 16_000, 16_000))).await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(output.plays(), 0);
    assert!(recorded.mouth.writes().is_empty());
}

#[tokio::test]
async fn test_playback_start_failure_moves_nothing() {
    let recorded = RecordedRig::new();
    let mut speaker = speaker(
        &recorded,
        Arc::new(common::BrokenOutput),
        animation(Duration::from_millis(10), 60.0),
    );

    let result = speaker.speak(Arc::new(dc_clip(0.5, 1_600, 16_000))).await;

    assert!(matches!(result, Err(Error::PlaybackStart(_))));
    assert_eq!(recorded.mouth.attempts(), 0);
    assert!(recorded.arms.iter().all(|arm| arm.attempts() == 0));
}

#[tokio::test]
async fn test_actuator_failures_do_not_abort() {
    let recorded = RecordedRig::with_mouth(RecordingActuator::failing_every(2));
    let mut speaker = speaker(
        &recorded,
        Arc::new(CountingOutput::default()),
        animation(Duration::from_millis(10), 60.0),
    );

    // 20 windows plus the rest write
    speaker
        .speak(Arc::new(dc_clip(0.5, 3_200, 16_000)))
        .await
        .unwrap();

    assert_eq!(recorded.mouth.attempts(), 21);
    assert_eq!(recorded.mouth.writes().len(), 11);
}

#[tokio::test]
async fn test_late_windows_are_still_applied() {
    // Every write outlasts its 10 ms window
    let recorded = RecordedRig::with_mouth(RecordingActuator::slow(Duration::from_millis(15)));
    let animation = AnimationConfig {
        gestures: false,
        ..animation(Duration::from_millis(10), 60.0)
    };
    let mut speaker = speaker(&recorded, Arc::new(CountingOutput::default()), animation);

    let begun = Instant::now();
    speaker
        .speak(Arc::new(dc_clip(0.5, 1_600, 16_000)))
        .await
        .unwrap();

    // Ten windows, none skipped, then the rest write
    let writes = recorded.mouth.writes();
    assert_eq!(writes.len(), 11);
    assert!(writes[..10].iter().all(|a| (a - 60.0).abs() < 1e-4));
    assert!(writes[10].abs() < f32::EPSILON);

    // Writes alone take 150 ms against a 100 ms clip
    assert!(begun.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_pre_roll_delays_without_compressing() {
    let recorded = RecordedRig::new();
    let animation = AnimationConfig {
        pre_roll: Duration::from_millis(200),
        ..animation(Duration::from_millis(50), 60.0)
    };
    let mut speaker = speaker(&recorded, Arc::new(CountingOutput::default()), animation);

    let begun = Instant::now();
    speaker
        .speak(Arc::new(dc_clip(0.5, 8_000, 16_000)))
        .await
        .unwrap();
    let elapsed = begun.elapsed();

    // 0.2 s pre-roll + 0.5 s clip + 0.25 s trailing
    assert!(elapsed >= Duration::from_millis(930), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(1_050), "elapsed {elapsed:?}");
    assert_eq!(recorded.mouth.writes().len(), 11);
}

#[tokio::test]
async fn test_interrupt_stops_early() {
    let recorded = RecordedRig::new();
    let mut speaker = speaker(
        &recorded,
        Arc::new(CountingOutput::default()),
        animation(Duration::from_millis(10), 60.0),
    );
    let interrupt = speaker.interrupt();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        interrupt.trigger();
    });

    let begun = Instant::now();
    let result = speaker.speak(Arc::new(sine_clip(220.0, 5.0, 0.5, 16_000))).await;

    assert!(matches!(result, Err(Error::Interrupted)));
    assert!(begun.elapsed() < Duration::from_secs(2));

    let writes = recorded.mouth.writes();
    assert!(writes.len() < 100, "{} writes", writes.len());
    assert!(writes.last().is_some_and(|a| *a == 0.0));
}

#[tokio::test]
async fn test_back_to_back_calls_reuse_the_rig() {
    let recorded = RecordedRig::new();
    let mut speaker = speaker(
        &recorded,
        Arc::new(CountingOutput::default()),
        animation(Duration::from_millis(50), 45.0),
    );
    let clip = Arc::new(dc_clip(0.5, 1_600, 16_000));

    speaker.speak(Arc::clone(&clip)).await.unwrap();
    speaker.speak(clip).await.unwrap();

    // Two windows per call, each followed by a rest write
    let writes = recorded.mouth.writes();
    assert_eq!(writes, vec![45.0, 45.0, 0.0, 45.0, 45.0, 0.0]);
}

#[allow(dead_code)]
fn assert_outputs_are_shareable() {
    fn shareable<T: Send + Sync>() {}
    shareable::<BrokenOutput>();
    shareable::<CountingOutput>();
}

use super::*;
use crate::camera::ScriptedCamera;
use crate::error::HumancamError;
use crate::frame::{BoundingBox, Frame, ObjectClass};
use crate::render::FrameAnnotator;
use crate::session::{RecordOutcome, SessionLog};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::{self, Write as _};
use std::sync::{Arc, Mutex};

/// Detector that reports a scripted number of people per frame
struct ScriptedDetector {
    counts: VecDeque<usize>,
    fail_at: Option<usize>,
    calls: usize,
}

impl ScriptedDetector {
    fn new(counts: &[usize]) -> Self {
        Self {
            counts: counts.iter().copied().collect(),
            fail_at: None,
            calls: 0,
        }
    }

    fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _image: &RgbImage, _filter: &DetectionFilter) -> Result<Vec<BoundingBox>> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Err(HumancamError::detection("scripted failure"));
        }

        let count = self.counts.pop_front().unwrap_or(0);
        let mut boxes: Vec<BoundingBox> = (0..count)
            .map(|i| BoundingBox {
                x: 2.0 + i as f32 * 10.0,
                y: 2.0,
                width: 8.0,
                height: 8.0,
                confidence: 0.8,
                class: ObjectClass::Person,
            })
            .collect();
        // Noise the pipeline must discard
        boxes.push(BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 4.0,
            height: 4.0,
            confidence: 0.3,
            class: ObjectClass::Person,
        });
        boxes.push(BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 4.0,
            height: 4.0,
            confidence: 0.99,
            class: ObjectClass::Other(2),
        });
        Ok(boxes)
    }
}

/// Shared in-memory stdout
#[derive(Clone, Default)]
struct SharedSink {
    data: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    fn lines(&self) -> Vec<String> {
        let data = self.data.lock().unwrap();
        String::from_utf8(data.clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl io::Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that trips the latch once `after` complete records were flushed,
/// like a consumer sending QUIT after seeing them
struct CancelAfter {
    sink: SharedSink,
    token: CancellationToken,
    after: usize,
}

impl io::Write for CancelAfter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.sink.lines().len() >= self.after {
            self.token.cancel();
        }
        Ok(())
    }
}

fn shaded_frames(count: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            let shade = (i * 40) as u8;
            Frame::new(i as u64, RgbImage::from_pixel(48, 32, Rgb([shade, shade, shade])))
        })
        .collect()
}

fn pipeline<W: io::Write>(detector: ScriptedDetector, writer: W) -> FramePipeline<W> {
    FramePipeline::new(
        Box::new(detector),
        FrameRenderer::with_annotator(FrameAnnotator::without_labels(1), 95),
        FrameEmitter::new(writer),
    )
    .with_frame_interval(Duration::from_millis(1))
}

fn decode_record(line: &str) -> RgbImage {
    let jpeg = STANDARD.decode(line).unwrap();
    image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
        .unwrap()
        .to_rgb8()
}

#[tokio::test]
async fn test_stream_end_is_clean_termination() {
    let sink = SharedSink::default();
    let mut pipeline = pipeline(ScriptedDetector::new(&[0, 0, 0]), sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(3));
    let mut session = Session::start();

    let report = pipeline
        .run(&mut camera, &mut session, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.reason, StopReason::StreamEnded);
    assert_eq!(report.frames_emitted, 3);
    assert_eq!(sink.lines().len(), 3);
}

#[tokio::test]
async fn test_records_follow_capture_order() {
    let sink = SharedSink::default();
    let mut pipeline = pipeline(ScriptedDetector::new(&[]), sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(5));
    let mut session = Session::start();

    pipeline
        .run(&mut camera, &mut session, &CancellationToken::new())
        .await
        .unwrap();

    let shades: Vec<u8> = sink
        .lines()
        .iter()
        .map(|line| decode_record(line).get_pixel(40, 28)[0])
        .collect();
    assert_eq!(shades.len(), 5);
    for (i, shade) in shades.iter().enumerate() {
        let expected = (i * 40) as i32;
        assert!(
            (*shade as i32 - expected).abs() <= 3,
            "record {} has shade {}, expected ~{}",
            i,
            shade,
            expected
        );
    }
}

#[tokio::test]
async fn test_every_record_is_a_complete_line() {
    let sink = SharedSink::default();
    let mut pipeline = pipeline(ScriptedDetector::new(&[1, 2]), sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(2));
    let mut session = Session::start();

    pipeline
        .run(&mut camera, &mut session, &CancellationToken::new())
        .await
        .unwrap();

    let contents = sink.contents();
    assert_eq!(contents.last(), Some(&b'\n'));
    assert_eq!(contents.iter().filter(|b| **b == b'\n').count(), 2);
    for line in sink.lines() {
        assert_eq!(decode_record(&line).dimensions(), (48, 32));
    }
}

#[tokio::test]
async fn test_peak_tracks_maximum_of_filtered_counts() {
    let sink = SharedSink::default();
    let mut pipeline = pipeline(ScriptedDetector::new(&[0, 1, 2, 1, 0]), sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(5));
    let mut session = Session::start();

    pipeline
        .run(&mut camera, &mut session, &CancellationToken::new())
        .await
        .unwrap();

    // Low-confidence and non-person boxes are not counted
    assert_eq!(session.peak_humans(), 2);
    assert_eq!(session.frames_observed(), 5);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log_report.csv");
    let summary = session.summary_after(Duration::from_secs(5));
    assert_eq!(
        SessionLog::new(&path).record(&summary).unwrap(),
        RecordOutcome::Written { header: true }
    );

    let contents = std::fs::read_to_string(&path).unwrap();
    let row = contents.lines().nth(1).unwrap();
    assert!(row.ends_with(",2,0:00:05"), "unexpected row {}", row);
}

#[tokio::test]
async fn test_cancelled_before_start_emits_nothing() {
    let sink = SharedSink::default();
    let mut pipeline = pipeline(ScriptedDetector::new(&[1]), sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(4));
    let mut session = Session::start();
    let token = CancellationToken::new();
    token.cancel();

    let report = pipeline.run(&mut camera, &mut session, &token).await.unwrap();

    assert_eq!(report.reason, StopReason::Cancelled);
    assert_eq!(report.frames_emitted, 0);
    assert!(sink.lines().is_empty());
    assert_eq!(camera.reads(), 0);
}

#[tokio::test]
async fn test_cancellation_after_three_records() {
    let token = CancellationToken::new();
    let sink = SharedSink::default();
    let writer = CancelAfter {
        sink: sink.clone(),
        token: token.clone(),
        after: 3,
    };
    let mut pipeline = pipeline(ScriptedDetector::new(&[1, 1, 1, 1, 1, 1]), writer);
    let mut camera = ScriptedCamera::new(0, shaded_frames(10));
    let mut session = Session::start();

    let report = pipeline.run(&mut camera, &mut session, &token).await.unwrap();

    assert_eq!(report.reason, StopReason::Cancelled);
    assert_eq!(report.frames_emitted, 3);
    assert_eq!(sink.lines().len(), 3);
    // No frame is read once the latch is seen
    assert_eq!(camera.reads(), 3);
}

#[tokio::test]
async fn test_repeated_cancellation_is_idempotent() {
    let token = CancellationToken::new();
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());

    let sink = SharedSink::default();
    let mut pipeline = pipeline(ScriptedDetector::new(&[]), sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(2));
    let mut session = Session::start();

    let report = pipeline.run(&mut camera, &mut session, &token).await.unwrap();
    assert_eq!(report.reason, StopReason::Cancelled);
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn test_detection_failure_stops_without_retry() {
    let sink = SharedSink::default();
    let detector = ScriptedDetector::new(&[1, 1, 1, 1]).failing_at(2);
    let mut pipeline = pipeline(detector, sink.clone());
    let mut camera = ScriptedCamera::new(0, shaded_frames(4));
    let mut session = Session::start();

    let result = pipeline
        .run(&mut camera, &mut session, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(HumancamError::Detection { .. })));
    assert_eq!(sink.lines().len(), 2);
    assert_eq!(camera.reads(), 3);
    assert_eq!(session.peak_humans(), 1);
}

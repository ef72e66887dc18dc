mod support;

use glyphgif::{DecodeSession, InMemorySink, RecordingClock, SliceSource};
use support::{FrameSpec, GifBuilder, noise, raster_opts, rgb_palette};

/// A GIF that exercises every block type: loop extension, comment, local table, transparency
/// and a frame large enough to span several sub-blocks.
fn busy_gif() -> Vec<u8> {
    let palette: Vec<[u8; 3]> = (0..16u8).map(|i| [i * 16, 255 - i * 16, i * 7]).collect();
    let big = noise(48 * 32, 16, 7);
    GifBuilder::new(48, 32, Some(&palette))
        .netscape_loop(0)
        .comment("chunking fixture")
        .frame(&FrameSpec {
            min_code_size: 4,
            ..FrameSpec::full(48, 32, 3, big)
        })
        .frame(&FrameSpec {
            left: 5,
            top: 4,
            width: 10,
            height: 6,
            delay: Some(4),
            transparent: Some(2),
            local_table: Some(rgb_palette()),
            min_code_size: 2,
            indices: noise(60, 4, 99),
        })
        .frame(&FrameSpec {
            min_code_size: 4,
            delay: None,
            ..FrameSpec::full(48, 32, 0, noise(48 * 32, 16, 1234))
        })
        .finish()
}

fn decode_with(bytes: &[u8], pattern: Vec<usize>) -> InMemorySink {
    let mut session =
        DecodeSession::with_clock(raster_opts(), Box::new(RecordingClock::new())).unwrap();
    let mut sink = InMemorySink::new();
    session
        .run(&mut SliceSource::with_pattern(bytes.to_vec(), pattern), &mut sink)
        .unwrap();
    assert!(session.context().queue_balance().is_balanced(3));
    sink
}

#[test]
fn chunk_size_does_not_change_output() {
    let gif = busy_gif();
    let reference = decode_with(&gif, vec![gif.len()]);
    assert_eq!(reference.frames().len(), 3);

    for pattern in [vec![1], vec![7], vec![4096], vec![1, 2, 3, 250, 5]] {
        let sink = decode_with(&gif, pattern.clone());
        assert_eq!(sink.frames(), reference.frames(), "pattern {pattern:?}");
        assert_eq!(sink.summary(), reference.summary(), "pattern {pattern:?}");
        assert_eq!(sink.info(), reference.info(), "pattern {pattern:?}");
    }
}

#[test]
fn frames_without_control_extension_have_zero_delay() {
    let gif = busy_gif();
    let sink = decode_with(&gif, vec![64]);
    assert_eq!(sink.summary().unwrap().delays, vec![3, 4, 0]);
    assert_eq!(sink.summary().unwrap().loop_count, Some(0));
}

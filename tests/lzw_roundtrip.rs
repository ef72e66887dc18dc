mod support;

use glyphgif::{GlyphError, LzwDecoder, compress};
use support::noise;

#[test]
fn roundtrip_across_code_sizes_and_shapes() {
    let mut decoder = LzwDecoder::new();
    for min_code_size in 2..=8u8 {
        let alphabet = if min_code_size == 8 {
            255
        } else {
            1u8 << min_code_size
        };
        let cases = [
            vec![0],
            vec![alphabet - 1; 5000],
            noise(3, alphabet, 11),
            noise(9000, alphabet, 0xDEAD_BEEF),
            (0..12_000).map(|i| (i % usize::from(alphabet)) as u8).collect(),
        ];
        for data in cases {
            let packed = compress(&data, min_code_size).unwrap();
            let unpacked = decoder.decompress(&packed, min_code_size).unwrap();
            assert_eq!(unpacked, data, "N={min_code_size} len={}", data.len());
        }
    }
}

#[test]
fn decoder_state_resets_between_payloads() {
    let mut decoder = LzwDecoder::new();
    let a = noise(20_000, 4, 5);
    let b = noise(300, 4, 6);
    let pa = compress(&a, 2).unwrap();
    let pb = compress(&b, 2).unwrap();
    assert_eq!(decoder.decompress(&pa, 2).unwrap(), a);
    assert_eq!(decoder.decompress(&pb, 2).unwrap(), b);
}

#[test]
fn width_grows_at_next_code_seven_for_two_bit_alphabet() {
    let mut decoder = LzwDecoder::new().with_trace();
    let packed = compress(&[0, 1, 2, 3, 0, 1, 2, 3], 2).unwrap();
    decoder.decompress(&packed, 2).unwrap();

    let trace = decoder.trace();
    let first_wide = trace.iter().position(|t| t.width == 4).unwrap();
    assert!(trace[..first_wide].iter().all(|t| t.width == 3));
    // The code read while next_code sat at 7 is the last one at width 3.
    assert_eq!(trace[first_wide - 2].next_code, 7);
    assert_eq!(trace[first_wide - 1].next_code, 8);
    assert_eq!(trace[first_wide].code, 3);
}

#[test]
fn out_of_range_code_size_is_rejected() {
    let mut decoder = LzwDecoder::new();
    for n in [0u8, 1, 9, 12] {
        assert!(matches!(
            decoder.decompress(&[0], n),
            Err(GlyphError::MalformedContainer(_))
        ));
    }
    assert!(compress(&[4], 2).is_err());
}

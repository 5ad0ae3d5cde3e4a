//! Line framer tests

use lw2_core::LineFramer;

const STREAM: &[u8] = b"(i: LW2 MX8x8DVI v3.1)\r\n(ALL 1 2 0 )\r\n(O2 I5)\r\nERR04\r\n(PNAME#16=Room A)\r\n(ONAME#1=Proj";

/// Feed `chunks` in order and rebuild the stream from the emitted lines
fn reassemble(chunks: &[&[u8]]) -> (Vec<u8>, Vec<u8>) {
    let mut framer = LineFramer::new();
    let mut out = Vec::new();
    for chunk in chunks {
        for line in framer.feed(chunk) {
            out.extend_from_slice(line.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
    }
    (out, framer.pending().to_vec())
}

#[test]
fn test_rechunking_at_every_split_point() {
    let (whole, whole_rest) = reassemble(&[STREAM]);

    for split in 0..=STREAM.len() {
        let (head, tail) = STREAM.split_at(split);
        let (out, rest) = reassemble(&[head, tail]);
        assert_eq!(out, whole, "split at {}", split);
        assert_eq!(rest, whole_rest, "split at {}", split);
    }
}

#[test]
fn test_rechunking_at_every_pair_of_split_points() {
    let (whole, whole_rest) = reassemble(&[STREAM]);

    for a in 0..=STREAM.len() {
        for b in a..=STREAM.len() {
            let (out, rest) = reassemble(&[&STREAM[..a], &STREAM[a..b], &STREAM[b..]]);
            assert_eq!(out, whole, "splits at {} and {}", a, b);
            assert_eq!(rest, whole_rest, "splits at {} and {}", a, b);
        }
    }
}

#[test]
fn test_byte_at_a_time() {
    let chunks: Vec<&[u8]> = STREAM.chunks(1).collect();
    let (out, rest) = reassemble(&chunks);

    let terminated_len = STREAM.len() - b"(ONAME#1=Proj".len();
    assert_eq!(out, &STREAM[..terminated_len]);
    assert_eq!(rest, b"(ONAME#1=Proj");
}

#[test]
fn test_lines_emitted_once_in_order() {
    let mut framer = LineFramer::new();
    let first = framer.feed(b"(O1 I1)\r\n(O2 I2)\r");
    assert_eq!(first, vec!["(O1 I1)"]);

    let second = framer.feed(b"\n(O3 I3)\r\n");
    assert_eq!(second, vec!["(O2 I2)", "(O3 I3)"]);

    assert!(framer.feed(b"").is_empty());
}

use std::cell::Cell;
use std::fs;

use byteorder::{ByteOrder, LittleEndian};
use envi_reader::envi::format::{header, layout};
use envi_reader::{ByteRangeReader, Dimensions, EnviError, EnviImage, HeaderFields, Interleave};

const LINES: u64 = 3;
const SAMPLES: u64 = 4;
const BANDS: u64 = 5;

const INTERLEAVES: [&str; 3] = ["bil", "bip", "bsq"];

/// Every supported (data type code, byte width) pair.
const TYPE_WIDTHS: &[(i64, u64)] = &[
    (1, 1),
    (2, 2),
    (3, 4),
    (4, 4),
    (5, 8),
    (6, 8),
    (9, 16),
    (12, 2),
    (13, 4),
    (14, 8),
    (15, 8),
];

fn header_text(interleave: &str, data_type: i64) -> String {
    format!(
        "ENVI\nlines = {}\nsamples = {}\nbands = {}\ninterleave = {}\ndata type = {}\nbyte order = 0\n",
        LINES, SAMPLES, BANDS, interleave, data_type
    )
}

fn parse(text: &str) -> HeaderFields {
    header::parse(text).unwrap_or_else(|e| panic!("header should parse: {}", e))
}

/// Deterministic byte pattern for the element at (line, sample, band),
/// stable across physical layouts.
fn element_bytes(line: u64, sample: u64, band: u64, width: u64) -> Vec<u8> {
    (0..width)
        .map(|i| ((line * 31 + sample * 17 + band * 13 + i * 7 + 5) % 251) as u8)
        .collect()
}

/// Builds a synthetic data file holding the same logical values in the
/// given physical layout.
fn build_file(interleave: Interleave, width: u64) -> Vec<u8> {
    let dims = Dimensions {
        lines: LINES,
        samples: SAMPLES,
        bands: BANDS,
    };
    let [line_stride, sample_stride, band_stride] = interleave.file_strides(&dims);
    let mut buf = vec![0u8; (LINES * SAMPLES * BANDS * width) as usize];
    for line in 0..LINES {
        for sample in 0..SAMPLES {
            for band in 0..BANDS {
                let off = ((line * line_stride + sample * sample_stride + band * band_stride)
                    * width) as usize;
                buf[off..off + width as usize]
                    .copy_from_slice(&element_bytes(line, sample, band, width));
            }
        }
    }
    buf
}

/// Byte offset of output element (line, sample, slot) for a K-channel request.
fn out_offset(line: u64, sample: u64, slot: u64, selected: u64, width: u64) -> usize {
    ((line * SAMPLES * selected + slot * SAMPLES + sample) * width) as usize
}

/// Source wrapper that counts issued range reads.
struct CountingSource {
    data: Vec<u8>,
    reads: Cell<usize>,
}

impl CountingSource {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            reads: Cell::new(0),
        }
    }
}

impl ByteRangeReader for CountingSource {
    fn size(&self) -> envi_reader::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_range(&self, start: u64, end: u64) -> envi_reader::Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        self.data.as_slice().read_range(start, end)
    }
}

#[test]
fn decoded_shape_matches_for_every_interleave_and_type() {
    for token in INTERLEAVES {
        let interleave = Interleave::try_from(token).expect("interleave token");
        for &(code, width) in TYPE_WIDTHS {
            let fields = parse(&header_text(token, code));
            let file = build_file(interleave, width);
            let out = layout::extract(
                &fields,
                file.len() as u64,
                &[0, (BANDS - 1) as i64],
                file.as_slice(),
            )
            .unwrap_or_else(|e| panic!("extract failed for {} type {}: {}", token, code, e));
            assert_eq!(
                out.len() as u64,
                LINES * SAMPLES * 2 * width,
                "shape mismatch for {} type {}",
                token,
                code
            );
        }
    }
}

#[test]
fn equivalent_files_decode_identically_across_interleaves() {
    let channels = [2i64, 0, 4];
    let width = 2;
    let mut outputs = Vec::new();
    for token in INTERLEAVES {
        let interleave = Interleave::try_from(token).expect("interleave token");
        let fields = parse(&header_text(token, 2));
        let file = build_file(interleave, width);
        let out = layout::extract(&fields, file.len() as u64, &channels, file.as_slice())
            .unwrap_or_else(|e| panic!("extract failed for {}: {}", token, e));
        outputs.push((token, out));
    }
    let (_, reference) = &outputs[0];
    for (token, out) in &outputs[1..] {
        assert_eq!(out, reference, "{} output differs from bil output", token);
    }
}

#[test]
fn identity_selection_reproduces_bil_source() {
    let width = 2;
    let fields = parse(&header_text("bil", 2));
    let file = build_file(Interleave::Bil, width);
    let all: Vec<i64> = (0..BANDS as i64).collect();
    let out = layout::extract(&fields, file.len() as u64, &all, file.as_slice())
        .expect("identity extract");
    assert_eq!(out, file);
}

#[test]
fn every_element_lands_at_its_strided_position() {
    let channels = [4i64, 1];
    let width = 2;
    for token in INTERLEAVES {
        let interleave = Interleave::try_from(token).expect("interleave token");
        let fields = parse(&header_text(token, 2));
        let file = build_file(interleave, width);
        let out = layout::extract(&fields, file.len() as u64, &channels, file.as_slice())
            .unwrap_or_else(|e| panic!("extract failed for {}: {}", token, e));
        for line in 0..LINES {
            for (slot, &channel) in channels.iter().enumerate() {
                for sample in 0..SAMPLES {
                    let off = out_offset(line, sample, slot as u64, channels.len() as u64, width);
                    assert_eq!(
                        &out[off..off + width as usize],
                        element_bytes(line, sample, channel as u64, width).as_slice(),
                        "wrong element at line={} sample={} slot={} in {}",
                        line,
                        sample,
                        slot,
                        token
                    );
                }
            }
        }
    }
}

#[test]
fn duplicate_channels_are_repeated_in_output() {
    let width = 1;
    let fields = parse(&header_text("bsq", 1));
    let file = build_file(Interleave::Bsq, width);
    let out = layout::extract(&fields, file.len() as u64, &[1, 1], file.as_slice())
        .expect("duplicate extract");
    let run = (SAMPLES * width) as usize;
    for line in 0..LINES {
        let first = out_offset(line, 0, 0, 2, width);
        let second = out_offset(line, 0, 1, 2, width);
        assert_eq!(
            &out[first..first + run],
            &out[second..second + run],
            "duplicate channels differ at line {}",
            line
        );
    }
}

#[test]
fn request_order_determines_output_order() {
    let width = 2;
    let fields = parse(&header_text("bil", 2));
    let file = build_file(Interleave::Bil, width);
    let forward = layout::extract(&fields, file.len() as u64, &[0, 2], file.as_slice())
        .expect("forward extract");
    let reversed = layout::extract(&fields, file.len() as u64, &[2, 0], file.as_slice())
        .expect("reversed extract");
    let run = (SAMPLES * width) as usize;
    for line in 0..LINES {
        let slot0 = out_offset(line, 0, 0, 2, width);
        let slot1 = out_offset(line, 0, 1, 2, width);
        assert_eq!(&forward[slot0..slot0 + run], &reversed[slot1..slot1 + run]);
        assert_eq!(&forward[slot1..slot1 + run], &reversed[slot0..slot0 + run]);
    }
}

#[test]
fn out_of_range_channel_fails_without_reads() {
    let fields = parse(&header_text("bil", 1));
    let source = CountingSource::new(build_file(Interleave::Bil, 1));
    for bad in [-1i64, BANDS as i64] {
        let err = layout::extract(&fields, source.size().unwrap(), &[0, bad], &source)
            .expect_err("out-of-range channel must fail");
        match err {
            EnviError::ChannelOutOfRange { index, bands } => {
                assert_eq!(index, bad);
                assert_eq!(bands, BANDS);
            }
            other => panic!("expected ChannelOutOfRange, got {:?}", other),
        }
    }
    assert_eq!(source.reads.get(), 0, "no read may be issued on rejection");
}

#[test]
fn truncated_file_fails_without_reads() {
    let fields = parse(&header_text("bsq", 2));
    let mut data = build_file(Interleave::Bsq, 2);
    data.pop();
    let file_size = data.len() as u64;
    let source = CountingSource::new(data);
    let err = layout::extract(&fields, file_size, &[0], &source)
        .expect_err("truncated file must fail");
    match err {
        EnviError::SizeMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, LINES * SAMPLES * BANDS * 2);
            assert_eq!(found, expected - 1);
        }
        other => panic!("expected SizeMismatch, got {:?}", other),
    }
    assert_eq!(source.reads.get(), 0, "no read may be issued on rejection");
}

#[test]
fn oversized_file_is_rejected() {
    let fields = parse(&header_text("bil", 2));
    let mut data = build_file(Interleave::Bil, 2);
    data.extend_from_slice(&[0, 0]);
    let err = layout::extract(&fields, data.len() as u64, &[0], data.as_slice())
        .expect_err("oversized file must fail");
    assert!(matches!(err, EnviError::SizeMismatch { .. }), "got {:?}", err);
}

#[test]
fn upper_case_interleave_token_is_rejected() {
    let fields = parse(&header_text("BIL", 1));
    let file = build_file(Interleave::Bil, 1);
    let err = layout::extract(&fields, file.len() as u64, &[0], file.as_slice())
        .expect_err("upper-case token must fail");
    match err {
        EnviError::UnsupportedInterleave(token) => assert_eq!(token, "BIL"),
        other => panic!("expected UnsupportedInterleave, got {:?}", other),
    }
}

#[test]
fn unknown_or_missing_data_type_is_rejected() {
    let fields = parse(&header_text("bil", 7));
    let file = build_file(Interleave::Bil, 1);
    let err = layout::extract(&fields, file.len() as u64, &[0], file.as_slice())
        .expect_err("unknown data type must fail");
    assert!(matches!(err, EnviError::UnsupportedDataType(_)), "got {:?}", err);

    let fields = parse(&format!(
        "ENVI\nlines = {}\nsamples = {}\nbands = {}\ninterleave = bil\n",
        LINES, SAMPLES, BANDS
    ));
    let err = layout::extract(&fields, file.len() as u64, &[0], file.as_slice())
        .expect_err("missing data type must fail");
    assert!(matches!(err, EnviError::UnsupportedDataType(_)), "got {:?}", err);
}

#[test]
fn missing_or_malformed_dimensions_are_rejected() {
    let file = build_file(Interleave::Bil, 1);
    let fields = parse("ENVI\nlines = 3\nsamples = 4\ninterleave = bil\ndata type = 1\n");
    let err = layout::extract(&fields, file.len() as u64, &[0], file.as_slice())
        .expect_err("missing bands must fail");
    assert!(matches!(err, EnviError::MissingDimensions(_)), "got {:?}", err);

    let fields = parse("ENVI\nlines = abc\nsamples = 4\nbands = 5\ninterleave = bil\ndata type = 1\n");
    let err = layout::extract(&fields, file.len() as u64, &[0], file.as_slice())
        .expect_err("non-numeric lines must fail");
    assert!(matches!(err, EnviError::MissingDimensions(_)), "got {:?}", err);
}

#[test]
fn read_granularity_matches_the_layout() {
    let width = 2;
    let channels = [0i64, 3];
    let expected_reads = [
        ("bil", (LINES * 2) as usize),
        ("bip", (LINES * 2 * SAMPLES) as usize),
        ("bsq", 2usize),
    ];
    for (token, expected) in expected_reads {
        let interleave = Interleave::try_from(token).expect("interleave token");
        let fields = parse(&header_text(token, 2));
        let source = CountingSource::new(build_file(interleave, width));
        layout::extract(&fields, source.size().unwrap(), &channels, &source)
            .unwrap_or_else(|e| panic!("extract failed for {}: {}", token, e));
        assert_eq!(
            source.reads.get(),
            expected,
            "unexpected read count for {}",
            token
        );
    }
}

#[test]
fn native_byte_order_is_preserved() {
    // Little-endian f32 samples must come back bit-identical.
    let fields = parse(&header_text("bsq", 4));
    let mut file = vec![0u8; (LINES * SAMPLES * BANDS * 4) as usize];
    for band in 0..BANDS {
        for line in 0..LINES {
            for sample in 0..SAMPLES {
                let off = (((band * LINES * SAMPLES) + line * SAMPLES + sample) * 4) as usize;
                let value = (line * 100 + sample * 10 + band) as f32;
                LittleEndian::write_f32(&mut file[off..off + 4], value);
            }
        }
    }
    let out = layout::extract(&fields, file.len() as u64, &[1], file.as_slice())
        .expect("extract band 1");
    for line in 0..LINES {
        for sample in 0..SAMPLES {
            let off = out_offset(line, sample, 0, 1, 4);
            let value = LittleEndian::read_f32(&out[off..off + 4]);
            assert_eq!(value, (line * 100 + sample * 10 + 1) as f32);
        }
    }
}

#[test]
fn open_extracts_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hdr_path = dir.path().join("scene.hdr");
    let data_path = dir.path().join("scene.bil");
    let mut text = header_text("bil", 2);
    text.push_str("description = {Synthetic test scene}\nband names = {b1, b2, b3, b4, b5}\n");
    fs::write(&hdr_path, &text).expect("write header");
    let file = build_file(Interleave::Bil, 2);
    fs::write(&data_path, &file).expect("write data");

    let image = EnviImage::open(&hdr_path, &data_path).expect("open image");
    assert_eq!(
        image.dimensions().expect("dimensions"),
        Dimensions {
            lines: LINES,
            samples: SAMPLES,
            bands: BANDS
        }
    );
    assert_eq!(image.interleave().expect("interleave"), Interleave::Bil);
    assert_eq!(image.data_type().expect("data type").byte_width(), 2);
    assert_eq!(image.description().as_deref(), Some("Synthetic test scene"));
    assert_eq!(image.band_names().map(<[String]>::len), Some(5));

    let from_disk = image.read_bands(&[0, 3]).expect("read bands");
    let fields = parse(&text);
    let in_memory = layout::extract(&fields, file.len() as u64, &[0, 3], file.as_slice())
        .expect("in-memory extract");
    assert_eq!(from_disk, in_memory);

    let single = image.read_band(3).expect("read band");
    assert_eq!(single.len() as u64, LINES * SAMPLES * 2);
}

#[test]
fn naming_convention_is_enforced_before_any_file_access() {
    // Paths need not exist: the naming check runs first.
    let cases = [
        ("scene.hdr", "other.bil", "different base names"),
        ("scene.txt", "scene.bil", "wrong header extension"),
        ("scene.hdr", "scene.bip", "bip is not an accepted data extension"),
        ("scene.hdr", "scene.raw", "unknown data extension"),
    ];
    for (hdr, data, why) in cases {
        let err = EnviImage::open(hdr, data).expect_err(why);
        assert!(
            matches!(err, EnviError::NamingMismatch(_)),
            "{}: got {:?}",
            why,
            err
        );
    }
}

#[test]
fn upper_case_extensions_are_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hdr_path = dir.path().join("scene.HDR");
    let data_path = dir.path().join("scene.BSQ");
    fs::write(&hdr_path, header_text("bsq", 1)).expect("write header");
    fs::write(&data_path, build_file(Interleave::Bsq, 1)).expect("write data");

    let image = EnviImage::open(&hdr_path, &data_path).expect("open image");
    let out = image.read_bands(&[0]).expect("read band");
    assert_eq!(out.len() as u64, LINES * SAMPLES);
}

#[test]
fn find_data_file_probes_sibling_extensions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hdr_path = dir.path().join("scene.hdr");
    let data_path = dir.path().join("scene.bsq");
    fs::write(&hdr_path, header_text("bsq", 1)).expect("write header");
    fs::write(&data_path, build_file(Interleave::Bsq, 1)).expect("write data");

    let found = EnviImage::find_data_file(&hdr_path).expect("probe data file");
    assert_eq!(found, data_path);

    let missing = dir.path().join("absent.hdr");
    let err = EnviImage::find_data_file(&missing).expect_err("no data file present");
    assert!(matches!(err, EnviError::NamingMismatch(_)), "got {:?}", err);
}

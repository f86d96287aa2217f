extern crate pretty_assertions;
extern crate tempfile;
extern crate wave_codec;

use std::fs::File;
use std::io::{BufWriter, Write};

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use wave_codec::{ReadError, WaveReader, WaveWriter, WriterConfig};

fn write_file(config: WriterConfig, write: impl FnOnce(&mut WaveWriter<BufWriter<File>>)) -> NamedTempFile {
	let file = NamedTempFile::new().unwrap();
	let writer = BufWriter::new(file.reopen().unwrap());
	let mut wave_writer = WaveWriter::new(writer, config).unwrap();
	write(&mut wave_writer);
	wave_writer.close().unwrap();
	file
}

#[test]
fn test_round_trip_16bit_mono_8000() {
	let file = write_file(WriterConfig::new(1, 8000, 16), |wave_writer| {
		wave_writer.write_samples_i16(&[100, -100]).unwrap();
	});

	let mut wave_reader = WaveReader::open(file.path()).unwrap();
	assert_eq!(4, wave_reader.data_chunk().size);
	assert_eq!(2, wave_reader.format().block_size);
	assert_eq!(16000, wave_reader.format().bytes_per_sec);
	assert_eq!(48, wave_reader.riff_chunk().size + 8);
	assert_eq!(2, wave_reader.num_samples());

	assert_eq!(Some(vec![100]), wave_reader.read_sample_i16().unwrap());
	assert_eq!(Some(vec![-100]), wave_reader.read_sample_i16().unwrap());
	assert_eq!(None, wave_reader.read_sample_i16().unwrap());
	assert_eq!(2, wave_reader.read_sample_count());
}

#[test]
fn test_round_trip_16bit_stereo_44100() {
	let samples: Vec<i16> = (0..2000).map(|n| ((n * 37) % 65536 - 32768) as i16).collect();
	let file = write_file(WriterConfig::new(2, 44100, 16), |wave_writer| {
		for block in samples.chunks(200) {
			wave_writer.write_samples_i16(block).unwrap();
		}
	});

	let mut wave_reader = WaveReader::open(file.path()).unwrap();
	assert_eq!(2, wave_reader.format().channel_count);
	assert_eq!(44100, wave_reader.format().samples_per_sec);
	assert_eq!(1000, wave_reader.num_samples());
	assert_eq!(0, wave_reader.duration_seconds());

	let mut buf = vec![0i16; 4096];
	let read = wave_reader.read_samples_as_i16(&mut buf).unwrap();
	assert_eq!(samples.len(), read);
	assert_eq!(samples, buf[..read].to_vec());
	assert_eq!(wave_reader.num_samples(), wave_reader.read_sample_count());
}

#[test]
fn test_round_trip_8bit_mono_16000() {
	let samples: Vec<u8> = (0..=255).collect();
	let file = write_file(WriterConfig::new(1, 16000, 8), |wave_writer| {
		wave_writer.write_samples_u8(&samples).unwrap();
	});

	let mut wave_reader = WaveReader::open(file.path()).unwrap();
	let mut read = Vec::new();
	while let Some(sample) = wave_reader.read_sample_u8().unwrap() {
		read.extend(sample);
	}
	assert_eq!(samples, read);

	wave_reader.seek_to_sample(0);
	assert_eq!(Some(vec![-1.0]), wave_reader.read_sample());
	wave_reader.seek_to_sample(128);
	assert_eq!(Some(vec![0.0]), wave_reader.read_sample());
}

#[test]
fn test_duration_of_longer_file() {
	let file = write_file(WriterConfig::new(1, 8000, 8), |wave_writer| {
		wave_writer.write_samples_u8(&vec![128u8; 8000 * 3 + 10]).unwrap();
	});

	let wave_reader = WaveReader::open(file.path()).unwrap();
	assert_eq!(3, wave_reader.duration_seconds());
	assert_eq!(8000 * 3 + 10, wave_reader.num_samples());
}

#[test]
fn test_open_rejects_wrong_riff_size() {
	let mut bytes = WaveWriter::new(Vec::new(), WriterConfig::new(1, 8000, 8))
		.and_then(|mut wave_writer| {
			wave_writer.write_samples_u8(&[1, 2, 3])?;
			wave_writer.finish()
		})
		.unwrap();
	// Trailing garbage that the RIFF size doesn't account for.
	bytes.extend_from_slice(b"junk");

	let mut file = NamedTempFile::new().unwrap();
	file.write_all(&bytes).unwrap();
	file.flush().unwrap();

	match WaveReader::open(file.path()) {
		Err(ReadError::SizeMismatch { chunk, expected, found }) => {
			assert_eq!("RIFF", chunk);
			assert_eq!(bytes.len() as u64 - 8, expected);
			assert_eq!(bytes.len() as u64 - 12, found);
		}
		other => panic!("unexpected result: {:?}", other.map(|wave_reader| wave_reader.num_samples())),
	}
}

#[test]
fn test_open_missing_file() {
	let dir = tempfile::tempdir().unwrap();
	match WaveReader::open(dir.path().join("missing.wav")) {
		Err(ReadError::Io(_)) => {}
		other => panic!("unexpected result: {:?}", other.map(|wave_reader| wave_reader.num_samples())),
	}
}

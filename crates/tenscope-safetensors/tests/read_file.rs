//! On-disk reading of a small safetensors container.

use std::io::Write;

use tenscope_core::Dtype;
use tenscope_safetensors::{decode, SafetensorsContent, TensorData};

/// Write a two-tensor container (one bf16, one f32) to a temp file.
fn write_fixture() -> tempfile::NamedTempFile {
    let bf16_payload: Vec<u8> = [1.0f32, 2.0, 3.0]
        .iter()
        .flat_map(|&v| half::bf16::from_f32(v).to_le_bytes())
        .collect();
    let f32_payload: Vec<u8> = [0.25f32, -0.25]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    let header = format!(
        concat!(
            "{{\"__metadata__\":{{\"format\":\"pt\"}},",
            "\"embed_tokens.weight\":{{\"dtype\":\"BF16\",\"shape\":[3],\"data_offsets\":[0,{}]}},",
            "\"norm.weight\":{{\"dtype\":\"F32\",\"shape\":[2],\"data_offsets\":[{},{}]}}}}"
        ),
        bf16_payload.len(),
        bf16_payload.len(),
        bf16_payload.len() + f32_payload.len(),
    );

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(&(header.len() as u64).to_le_bytes()).unwrap();
    file.write_all(header.as_bytes()).unwrap();
    file.write_all(&bf16_payload).unwrap();
    file.write_all(&f32_payload).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_open_catalog_and_materialize() {
    let fixture = write_fixture();
    let content = SafetensorsContent::from_file(fixture.path()).expect("header parse");

    let catalog = content.catalog(fixture.path());
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.records[0].name, "embed_tokens.weight");
    assert_eq!(catalog.records[0].dtype, Some(Dtype::BF16));
    assert_eq!(catalog.records[1].name, "norm.weight");
    assert_eq!(catalog.metadata, vec![("format".into(), "pt".into())]);
    assert_eq!(catalog.reduced_precision_count(), 1);
    assert_eq!(catalog.file_size, fixture.path().metadata().unwrap().len());

    let mut file = std::fs::File::open(fixture.path()).unwrap();
    let raw = content.read_tensor_data(&mut file, "embed_tokens.weight").unwrap();
    let values = decode(&raw, Dtype::BF16, 3).unwrap();
    assert_eq!(values, TensorData::F32(vec![1.0, 2.0, 3.0]));

    let raw = content.read_tensor_data(&mut file, "norm.weight").unwrap();
    let values = decode(&raw, Dtype::F32, 2).unwrap();
    assert_eq!(values, TensorData::F32(vec![0.25, -0.25]));
}

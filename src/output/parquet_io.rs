// parquet_io.rs - Arrow/Parquet encoding of pretraining instances

use crate::core::pairs::PairInstance;
use arrow::array::{ArrayRef, BinaryArray, Int64Array, StringArray, UInt16Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub const COL_ID: &str = "id";
pub const COL_DOC: &str = "doc";
pub const COL_CODE: &str = "code";
pub const COL_NUM_TOKENS: &str = "num_tokens";
pub const COL_BIN_ID: &str = "bin_id";
pub const COL_MASKED_POSITIONS: &str = "masked_lm_positions";
pub const COL_MASKED_LABELS: &str = "masked_lm_labels";

/// Output schema for the given options
pub fn instance_schema(binned: bool, masked: bool) -> SchemaRef {
    let mut fields = vec![
        Field::new(COL_ID, DataType::Utf8, false),
        Field::new(COL_DOC, DataType::Utf8, false),
        Field::new(COL_CODE, DataType::Utf8, false),
        Field::new(COL_NUM_TOKENS, DataType::UInt16, false),
    ];
    if binned {
        fields.push(Field::new(COL_BIN_ID, DataType::Int64, false));
    }
    if masked {
        fields.push(Field::new(COL_MASKED_POSITIONS, DataType::Binary, false));
        fields.push(Field::new(COL_MASKED_LABELS, DataType::Utf8, false));
    }
    Arc::new(Schema::new(fields))
}

/// Little-endian u16 encoding of masked positions
pub fn encode_positions(positions: &[u16]) -> Vec<u8> {
    positions.iter().flat_map(|p| p.to_le_bytes()).collect()
}

pub fn decode_positions(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Build one record batch; `bin` is required when the schema carries `bin_id`
pub fn instances_to_batch(
    instances: &[&PairInstance],
    schema: &SchemaRef,
    bin: Option<usize>,
) -> Result<RecordBatch, String> {
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(instances.iter().map(|i| i.id.as_str()))),
        Arc::new(StringArray::from_iter_values(instances.iter().map(|i| i.doc.as_str()))),
        Arc::new(StringArray::from_iter_values(instances.iter().map(|i| i.code.as_str()))),
        Arc::new(UInt16Array::from_iter_values(instances.iter().map(|i| i.num_tokens))),
    ];

    if schema.column_with_name(COL_BIN_ID).is_some() {
        let bin = bin.ok_or("bin_id column requested without a bin")? as i64;
        columns.push(Arc::new(Int64Array::from_iter_values(
            std::iter::repeat(bin).take(instances.len()),
        )));
    }

    if schema.column_with_name(COL_MASKED_POSITIONS).is_some() {
        let mut positions = Vec::with_capacity(instances.len());
        let mut labels = Vec::with_capacity(instances.len());
        for instance in instances {
            let masked = instance
                .masked
                .as_ref()
                .ok_or_else(|| format!("Instance '{}' has no masking data", instance.id))?;
            positions.push(encode_positions(&masked.positions));
            labels.push(masked.labels.join(" "));
        }
        columns.push(Arc::new(BinaryArray::from_iter_values(positions.iter())));
        columns.push(Arc::new(StringArray::from_iter_values(labels.iter())));
    }

    RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| format!("Failed to build record batch: {}", e))
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Open a snappy-compressed parquet writer
pub fn create_writer(path: &Path, schema: &SchemaRef) -> Result<ArrowWriter<File>, String> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    ArrowWriter::try_new(file, schema.clone(), Some(writer_properties()))
        .map_err(|e| format!("Failed to open parquet writer for '{}': {}", path.display(), e))
}

/// Write batches into a new parquet file
pub fn write_batches(path: &Path, schema: &SchemaRef, batches: &[RecordBatch]) -> Result<(), String> {
    let mut writer = create_writer(path, schema)?;
    for batch in batches {
        writer
            .write(batch)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    }
    writer
        .close()
        .map_err(|e| format!("Failed to finalize '{}': {}", path.display(), e))?;
    Ok(())
}

/// Row count and schema from the parquet footer
pub fn parquet_metadata(path: &Path) -> Result<(usize, SchemaRef), String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| format!("Failed to read parquet footer of '{}': {}", path.display(), e))?;
    let rows = builder.metadata().file_metadata().num_rows().max(0) as usize;
    Ok((rows, builder.schema().clone()))
}

/// Streaming batch reader over a parquet file
pub fn open_batch_reader(path: &Path) -> Result<ParquetRecordBatchReader, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|b| b.build())
        .map_err(|e| format!("Failed to open parquet reader for '{}': {}", path.display(), e))
}

/// Read all record batches of a parquet file
pub fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, String> {
    open_batch_reader(path)?
        .map(|batch| batch.map_err(|e| format!("Failed to read '{}': {}", path.display(), e)))
        .collect()
}

/// Values of a UInt16 column across batches
pub fn column_u16(batches: &[RecordBatch], name: &str) -> Result<Vec<u16>, String> {
    let mut values = Vec::new();
    for batch in batches {
        let column = batch
            .column_by_name(name)
            .ok_or_else(|| format!("Missing column '{}'", name))?;
        let array = column
            .as_any()
            .downcast_ref::<UInt16Array>()
            .ok_or_else(|| format!("Column '{}' is not UInt16", name))?;
        values.extend(array.values().iter().copied());
    }
    Ok(values)
}

/// Values of a Utf8 column across batches
pub fn column_strings(batches: &[RecordBatch], name: &str) -> Result<Vec<String>, String> {
    let mut values = Vec::new();
    for batch in batches {
        let column = batch
            .column_by_name(name)
            .ok_or_else(|| format!("Missing column '{}'", name))?;
        let array = column
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| format!("Column '{}' is not Utf8", name))?;
        values.extend(array.iter().map(|v| v.unwrap_or_default().to_string()));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::masking::MaskedLm;

    fn instance(id: &str, num_tokens: u16, masked: bool) -> PairInstance {
        PairInstance {
            id: id.to_string(),
            doc: "adds numbers".to_string(),
            code: "def add".to_string(),
            num_tokens,
            masked: masked.then(|| MaskedLm {
                positions: vec![1, 300],
                labels: vec!["adds".into(), "def".into()],
            }),
        }
    }

    #[test]
    fn test_positions_encoding() {
        let bytes = encode_positions(&[1, 300]);
        assert_eq!(bytes, vec![1, 0, 44, 1]);
        assert_eq!(decode_positions(&bytes), vec![1, 300]);
    }

    #[test]
    fn test_schema_columns() {
        let schema = instance_schema(true, true);
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(
            names,
            vec!["id", "doc", "code", "num_tokens", "bin_id", "masked_lm_positions", "masked_lm_labels"]
        );
        assert_eq!(instance_schema(false, false).fields().len(), 4);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.0.parquet");
        let schema = instance_schema(true, true);
        let a = instance("go_0", 12, true);
        let b = instance("go_1", 30, true);
        let batch = instances_to_batch(&[&a, &b], &schema, Some(0)).unwrap();
        write_batches(&path, &schema, &[batch]).unwrap();

        let (rows, read_schema) = parquet_metadata(&path).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(read_schema.fields().len(), schema.fields().len());

        let batches = read_batches(&path).unwrap();
        assert_eq!(column_u16(&batches, COL_NUM_TOKENS).unwrap(), vec![12, 30]);
        assert_eq!(column_strings(&batches, COL_ID).unwrap(), vec!["go_0", "go_1"]);
        assert_eq!(column_strings(&batches, COL_MASKED_LABELS).unwrap()[0], "adds def");
    }

    #[test]
    fn test_masking_column_requires_data() {
        let schema = instance_schema(false, true);
        let a = instance("go_0", 12, false);
        assert!(instances_to_batch(&[&a], &schema, None).is_err());
    }

    #[test]
    fn test_bin_column_requires_bin() {
        let schema = instance_schema(true, false);
        let a = instance("go_0", 12, false);
        assert!(instances_to_batch(&[&a], &schema, None).is_err());
    }
}

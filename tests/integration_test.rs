//! Integration tests for dbf-sql.
//!
//! These tests assemble `.dbf` images byte by byte (independently of
//! `dbf::dbase::write`) and run the full decode pipeline against them.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::Write;
use tempfile::NamedTempFile;

use dbf::dbase::cursor::ByteCursor;
use dbf::dbase::field::read_field_descriptors;
use dbf::dbase::field_types::SemanticType;
use dbf::dbase::header::TableHeader;
use dbf::dbase::record::{DeletionFlagPolicy, RecordDecoder, RecordOutcome, Value};
use dbf::dbase::table::{ConvertOptions, DbfTable, RecordErrorPolicy};
use dbf::DbfError;

const HEADER_SIZE: usize = 68;
const DESCRIPTOR_SIZE: usize = 48;

/// Build a 48-byte field descriptor.
fn descriptor(name: &str, code: u8, length: u8, decimals: u8) -> Vec<u8> {
    let mut d = vec![0u8; DESCRIPTOR_SIZE];
    d[..name.len()].copy_from_slice(name.as_bytes());
    d[32] = code;
    d[33] = length;
    d[34] = decimals;
    d
}

/// Build a complete image: header, descriptors, terminator, then records
/// given as (flag, body) pairs.
fn build_image(fields: &[(&str, u8, u8)], records: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let record_length: usize = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();
    let header_length = HEADER_SIZE + fields.len() * DESCRIPTOR_SIZE + 1;

    let mut data = vec![0u8; HEADER_SIZE];
    data[0] = 0x04;
    data[1] = 125;
    data[2] = 6;
    data[3] = 30;
    LittleEndian::write_u32(&mut data[4..], records.len() as u32);
    LittleEndian::write_u16(&mut data[8..], header_length as u16);
    LittleEndian::write_u16(&mut data[10..], record_length as u16);
    data[32..39].copy_from_slice(b"DBWINUS");

    for (name, code, length) in fields {
        data.extend_from_slice(&descriptor(name, *code, *length, 0));
    }
    data.push(0x0D);

    for (flag, body) in records {
        assert_eq!(body.len(), record_length - 1, "test record body length");
        data.push(*flag);
        data.extend_from_slice(body);
    }
    data.push(0x1A);
    data
}

/// Sign-bit-flagged integer, written without the crate's encoder.
fn encoded_int(value: i32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    BigEndian::write_i32(&mut buf, value.abs());
    if value >= 0 {
        buf[0] |= 0x80;
    }
    buf
}

fn encoded_double(value: f64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_f64(&mut buf, value.abs());
    if value >= 0.0 {
        buf[0] |= 0x80;
    }
    buf
}

fn padded(text: &str, len: usize) -> Vec<u8> {
    let mut v = text.as_bytes().to_vec();
    v.resize(len, b' ');
    v
}

fn body(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    tmp.write_all(data).expect("write temp file");
    tmp.flush().expect("flush");
    tmp
}

fn convert_bytes(data: Vec<u8>) -> Result<dbf::dbase::table::Conversion, DbfError> {
    DbfTable::from_bytes("t", data).convert(&ConvertOptions::default())
}

// ---------------------------------------------------------------------------
// Header and descriptors
// ---------------------------------------------------------------------------

#[test]
fn test_header_fields_decoded_at_fixed_offsets() {
    let mut data = build_image(&[("ID", b'I', 4)], &[]);
    data[12] = 0x11; // reserved
    data[14] = 1; // incomplete transaction
    data[15] = 1; // encrypted
    LittleEndian::write_u32(&mut data[16..], 0xCAFEBABE);
    data[28] = 1; // mdx
    data[29] = 0x57; // language driver
    data[64..68].copy_from_slice(&[9, 9, 9, 9]);

    let mut cur = ByteCursor::from_bytes(data.clone());
    let hdr = TableHeader::read(&mut cur).unwrap();
    assert_eq!(hdr.version, 0x04);
    assert_eq!(hdr.level(), 4);
    assert_eq!(hdr.last_update().unwrap().to_string(), "2025-06-30");
    assert_eq!(hdr.record_count, 0);
    assert_eq!(hdr.header_length as usize, 68 + 48 + 1);
    assert_eq!(hdr.record_length, 5);
    assert_eq!(hdr.reserved_1, [0x11, 0]);
    assert!(hdr.has_incomplete_transaction());
    assert!(hdr.is_encrypted());
    assert_eq!(hdr.free_record_thread, 0xCAFEBABE);
    assert!(hdr.has_mdx());
    assert_eq!(hdr.language_driver, 0x57);
    assert_eq!(hdr.language_name(), "DBWINUS");
    assert_eq!(hdr.reserved_5, [9, 9, 9, 9]);

    // Written back byte-for-byte
    assert_eq!(&hdr.to_bytes()[..], &data[..68]);
}

#[test]
fn test_descriptors_end_one_byte_past_terminator() {
    let fields = [("A", b'C', 3), ("B", b'N', 5), ("C", b'L', 1), ("D", b'D', 8)];
    let data = build_image(&fields, &[]);
    let mut cur = ByteCursor::from_bytes(data);
    TableHeader::read(&mut cur).unwrap();
    let parsed = read_field_descriptors(&mut cur).unwrap();

    assert_eq!(parsed.len(), 4);
    assert_eq!(cur.position() as usize, 68 + 4 * 48 + 1);
    let names: Vec<&str> = parsed.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert_eq!(parsed[1].length, 5);
}

#[test]
fn test_truncated_header_file() {
    let tmp = write_temp(&[0x04; 20]);
    let result = DbfTable::open(tmp.path())
        .unwrap()
        .convert(&ConvertOptions::default());
    assert!(matches!(result, Err(DbfError::TruncatedHeader { .. })));
}

#[test]
fn test_missing_terminator_is_truncated_field_array() {
    let mut data = build_image(&[("ID", b'I', 4)], &[]);
    data.truncate(68 + 48);
    // Keep the header lengths consistent with the shortened file
    LittleEndian::write_u16(&mut data[8..], 68);
    match convert_bytes(data) {
        Err(DbfError::TruncatedFieldArray { offset }) => assert_eq!(offset, 116),
        Err(e) => panic!("expected TruncatedFieldArray, got {}", e),
        Ok(_) => panic!("expected TruncatedFieldArray"),
    }
}

#[test]
fn test_inconsistent_header_lengths() {
    let mut data = build_image(&[("ID", b'I', 4)], &[(0x20, encoded_int(1).to_vec())]);
    LittleEndian::write_u32(&mut data[4..], 50);
    assert!(matches!(
        convert_bytes(data),
        Err(DbfError::InconsistentHeader(_))
    ));

    let mut data = build_image(&[("ID", b'I', 4)], &[]);
    LittleEndian::write_u16(&mut data[10..], 0);
    assert!(matches!(
        convert_bytes(data),
        Err(DbfError::InconsistentHeader(_))
    ));
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[test]
fn test_deleted_record_skipped_and_stream_consumed() {
    let fields = [("ID", b'I', 4), ("NAME", b'C', 6)];
    let records = vec![
        (0x20, body(&[&encoded_int(10), &padded("first", 6)])),
        (0x2A, body(&[&encoded_int(20), &padded("gone", 6)])),
        (0x20, body(&[&encoded_int(-30), &padded("third", 6)])),
    ];
    let data = build_image(&fields, &records);
    let header_length = 68 + 2 * 48 + 1;
    let record_length = 11;

    let conversion = convert_bytes(data).unwrap();
    let mut rows = conversion.rows;
    let collected: Vec<_> = rows.by_ref().map(|r| r.unwrap()).collect();

    assert_eq!(collected.len(), 2);
    assert_eq!(
        collected[0].values,
        vec![Value::Int(10), Value::Text("first".into())]
    );
    assert_eq!(
        collected[1].values,
        vec![Value::Int(-30), Value::Text("third".into())]
    );
    assert_eq!(collected[1].index, 2);
    assert_eq!(rows.stats().deleted, 1);
    assert_eq!(rows.next_record_index(), 3);

    // Decoding consumed exactly the header area plus three records
    let mut cur = ByteCursor::from_bytes(build_image(&fields, &records));
    let hdr = TableHeader::read(&mut cur).unwrap();
    let descriptors = read_field_descriptors(&mut cur).unwrap();
    assert_eq!(cur.position(), header_length as u64);

    let mut decoder = RecordDecoder::new(&hdr, &descriptors, DeletionFlagPolicy::Strict).unwrap();
    let mut outcomes = Vec::new();
    loop {
        match decoder.next_record(&mut cur).unwrap() {
            RecordOutcome::End => break,
            RecordOutcome::Row(row) => outcomes.push(Some(row.index)),
            RecordOutcome::Skipped(index) => {
                assert_eq!(index, 1);
                outcomes.push(None);
            }
        }
    }
    assert_eq!(outcomes, vec![Some(0), None, Some(2)]);
    assert_eq!(cur.position(), (header_length + 3 * record_length) as u64);
    // Only the end-of-file marker is left
    assert_eq!(cur.remaining(), 1);
}

#[test]
fn test_every_supported_type() {
    let fields = [
        ("NAME", b'C', 10),
        ("AMOUNT", b'N', 8),
        ("ACTIVE", b'L', 1),
        ("BORN", b'D', 8),
        ("NOTES", b'M', 10),
        ("ID", b'+', 4),
        ("QTY", b'I', 4),
        ("RATE", b'O', 8),
    ];
    let records = vec![(
        0x20,
        body(&[
            &padded("Ada", 10),
            b"  12.5\0\0",
            b"T",
            b"19791210",
            b"0000000042",
            &encoded_int(1),
            &encoded_int(-7),
            &encoded_double(-0.125),
        ]),
    )];
    let conversion = convert_bytes(build_image(&fields, &records)).unwrap();
    let row = conversion.rows.into_iter().next().unwrap().unwrap();
    assert_eq!(
        row.values,
        vec![
            Value::Text("Ada".into()),
            Value::Text("  12.5".into()),
            Value::Text("T".into()),
            Value::Text("19791210".into()),
            Value::Text("0000000042".into()),
            Value::Int(1),
            Value::Int(-7),
            Value::Double(-0.125),
        ]
    );
}

#[test]
fn test_absent_values_are_null_not_empty() {
    let fields = [("NAME", b'C', 4), ("AMOUNT", b'N', 4), ("BORN", b'D', 8)];
    let records = vec![(0x20, vec![0u8; 16])];
    let conversion = convert_bytes(build_image(&fields, &records)).unwrap();
    let row = conversion.rows.into_iter().next().unwrap().unwrap();
    assert_eq!(row.values, vec![Value::Null, Value::Null, Value::Null]);
}

#[test]
fn test_unsupported_codes_do_not_misalign() {
    for code in [b'F', b'B', b'G', b'P', b'Y', b'@'] {
        let fields = [("SKIPPED", code, 8), ("CITY", b'C', 5), ("N", b'I', 4)];
        let records = vec![(
            0x20,
            body(&[&[0x80, 0xFF, 0x41, 0x20, 0x0D, 0x2A, 0x01, 0x7F], b"Paris", &encoded_int(99)]),
        )];
        let conversion = convert_bytes(build_image(&fields, &records)).unwrap();
        let row = conversion.rows.into_iter().next().unwrap().unwrap();
        assert_eq!(
            row.values,
            vec![Value::Null, Value::Text("Paris".into()), Value::Int(99)],
            "code {}",
            code as char
        );
    }
}

#[test]
fn test_zero_row_table() {
    let fields = [("ID", b'I', 4), ("NAME", b'C', 20)];
    let conversion = convert_bytes(build_image(&fields, &[])).unwrap();
    assert_eq!(conversion.schema.len(), 2);
    assert_eq!(conversion.rows.count(), 0);
}

#[test]
fn test_zero_field_table() {
    let records = vec![(0x20, vec![]), (0x2A, vec![]), (0x20, vec![])];
    let conversion = convert_bytes(build_image(&[], &records)).unwrap();
    assert!(conversion.schema.is_empty());
    let rows: Vec<_> = conversion.rows.map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.values.is_empty()));
}

#[test]
fn test_corrupt_flag_policies() {
    let fields = [("ID", b'I', 4)];
    let records = vec![
        (0x20, encoded_int(1).to_vec()),
        (0x00, encoded_int(2).to_vec()),
        (0x20, encoded_int(3).to_vec()),
    ];

    // Strict + abort: one row, then the error, then nothing
    let rows: Vec<_> = convert_bytes(build_image(&fields, &records))
        .unwrap()
        .rows
        .collect();
    assert_eq!(rows.len(), 2);
    match &rows[1] {
        Err(DbfError::CorruptRecordFlag { record, flag }) => {
            assert_eq!(*record, 1);
            assert_eq!(*flag, 0);
        }
        other => panic!("expected CorruptRecordFlag, got {:?}", other.is_ok()),
    }

    // Lenient: the odd flag counts as deleted
    let options = ConvertOptions {
        deletion_flags: DeletionFlagPolicy::Lenient,
        ..ConvertOptions::default()
    };
    let mut rows = DbfTable::from_bytes("t", build_image(&fields, &records))
        .convert(&options)
        .unwrap()
        .rows;
    assert_eq!(rows.by_ref().filter(|r| r.is_ok()).count(), 2);
    assert_eq!(rows.stats().deleted, 1);

    // Strict + skip: the bad record is counted as skipped
    let options = ConvertOptions {
        on_record_error: RecordErrorPolicy::Skip,
        ..ConvertOptions::default()
    };
    let mut rows = DbfTable::from_bytes("t", build_image(&fields, &records))
        .convert(&options)
        .unwrap()
        .rows;
    let ids: Vec<Value> = rows.by_ref().map(|r| r.unwrap().values[0].clone()).collect();
    assert_eq!(ids, vec![Value::Int(1), Value::Int(3)]);
    assert_eq!(rows.stats().skipped, 1);
    assert_eq!(rows.stats().deleted, 0);
}

#[test]
fn test_field_decode_error_carries_context() {
    // An 'O' field declared 4 bytes wide cannot hold a double
    let fields = [("NAME", b'C', 2), ("RATE", b'O', 4)];
    let records = vec![(0x20, body(&[b"ok", &[0x80, 0, 0, 0]]))];
    let mut rows = convert_bytes(build_image(&fields, &records)).unwrap().rows;
    match rows.next() {
        Some(Err(DbfError::FieldDecode { record, field, .. })) => {
            assert_eq!(record, 0);
            assert_eq!(field, "RATE");
        }
        _ => panic!("expected FieldDecode"),
    }
    assert!(rows.next().is_none());
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[test]
fn test_schema_from_file() {
    let fields = [
        ("CUSTNO", b'+', 4),
        ("Company", b'C', 30),
        ("BALANCE", b'Y', 8),
        ("LASTSEEN", b'@', 8),
        ("RATIO", b'F', 20),
        ("NOTES", b'M', 10),
    ];
    let conversion = convert_bytes(build_image(&fields, &[])).unwrap();
    let schema = &conversion.schema;

    let names: Vec<&str> = schema.column_names().collect();
    assert_eq!(
        names,
        vec!["CUSTNO", "Company", "BALANCE", "LASTSEEN", "RATIO", "NOTES"]
    );
    assert_eq!(schema.columns[0].semantic, SemanticType::Int32);
    assert_eq!(schema.columns[1].max_length, Some(30));
    assert_eq!(
        schema.columns[2].semantic,
        SemanticType::Decimal {
            precision: 12,
            scale: 4
        }
    );
    assert_eq!(schema.columns[3].semantic, SemanticType::Int32);
    assert_eq!(schema.columns[4].semantic, SemanticType::Float64);
    assert_eq!(schema.columns[5].max_length, Some(10));
    assert_eq!(
        schema.create_table_ddl("customer"),
        "CREATE TABLE customer ([CUSTNO] int NULL, [Company] varchar(30) NULL, \
         [BALANCE] decimal(12,4) NULL, [LASTSEEN] int NULL, [RATIO] float NULL, \
         [NOTES] varchar(10) NULL)"
    );
}

#[test]
fn test_duplicate_column_after_trim() {
    let fields = [("ID", b'I', 4), ("ID  ", b'C', 4)];
    match convert_bytes(build_image(&fields, &[])) {
        Err(DbfError::DuplicateColumnName(name)) => assert_eq!(name, "ID"),
        Err(e) => panic!("expected DuplicateColumnName, got {}", e),
        Ok(_) => panic!("expected DuplicateColumnName"),
    }
}

#[test]
fn test_blank_column_name() {
    let fields = [("   ", b'C', 4)];
    assert!(matches!(
        convert_bytes(build_image(&fields, &[])),
        Err(DbfError::InvalidColumnName(0))
    ));
}

// ---------------------------------------------------------------------------
// Files on disk
// ---------------------------------------------------------------------------

#[test]
fn test_open_file_uses_stem_as_table_name() {
    let data = build_image(&[("ID", b'I', 4)], &[(0x20, encoded_int(5).to_vec())]);
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("Orders.DBF");
    std::fs::write(&path, data).unwrap();

    let conversion = DbfTable::open(&path)
        .unwrap()
        .convert(&ConvertOptions::default())
        .unwrap();
    assert_eq!(conversion.table_name, "Orders");
    let values: Vec<Value> = conversion
        .rows
        .map(|r| r.unwrap().values[0].clone())
        .collect();
    assert_eq!(values, vec![Value::Int(5)]);
}

#[cfg(feature = "cli")]
#[test]
fn test_mmap_matches_buffered() {
    let fields = [("ID", b'I', 4), ("NAME", b'C', 5)];
    let records: Vec<(u8, Vec<u8>)> = (0..50)
        .map(|i| {
            let flag = if i % 7 == 3 { 0x2A } else { 0x20 };
            (flag, body(&[&encoded_int(i), &padded(&format!("n{}", i), 5)]))
        })
        .collect();
    let tmp = write_temp(&build_image(&fields, &records));

    let buffered: Vec<_> = DbfTable::open(tmp.path())
        .unwrap()
        .convert(&ConvertOptions::default())
        .unwrap()
        .rows
        .map(|r| r.unwrap())
        .collect();
    let mapped: Vec<_> = DbfTable::open_mmap(tmp.path())
        .unwrap()
        .convert(&ConvertOptions::default())
        .unwrap()
        .rows
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(buffered, mapped);
    assert_eq!(buffered.len(), 43);
}

#[test]
fn test_early_termination_reads_only_pulled_records() {
    let fields = [("ID", b'I', 4)];
    let mut records: Vec<(u8, Vec<u8>)> = (0..10)
        .map(|i| (0x20, encoded_int(i).to_vec()))
        .collect();
    // Never reached when the caller stops after three rows
    records[5].0 = b'#';
    let tmp = write_temp(&build_image(&fields, &records));

    let mut rows = DbfTable::open(tmp.path())
        .unwrap()
        .convert(&ConvertOptions::default())
        .unwrap()
        .rows;
    let first_three: Vec<_> = rows.by_ref().take(3).map(|r| r.unwrap().values).collect();
    assert_eq!(
        first_three,
        vec![vec![Value::Int(0)], vec![Value::Int(1)], vec![Value::Int(2)]]
    );
    assert_eq!(rows.next_record_index(), 3);
    assert_eq!(rows.stats().rows, 3);
}

use super::*;
use crate::config::CodecConfig;
use crate::error::PbTableError;
use crate::types::{Row, RowSelection, Table, Value};

fn id_value_table() -> Table {
    Table::from_json(
        r#"{"header":[{"name":"id","type":"uint"},{"name":"v","type":"float"}],
            "data":[[1,1.5],[2,2.5],[3,3.5]]}"#,
    )
    .unwrap()
}

fn array_row(values: Vec<Value>) -> Row {
    Row::Array(values)
}

mod stateless_tests {
    use super::*;

    #[test]
    fn test_id_value_scenario() -> Result<(), PbTableError> {
        let table = id_value_table();
        let bytes = encode(&table)?;

        assert_eq!(decode(&bytes)?.data, table.data);
        assert_eq!(
            get(&bytes, 1usize)?,
            RowSelection::One(array_row(vec![Value::Int(2), Value::Float(2.5)]))
        );

        let index = get_index(&bytes)?;
        assert_eq!(index.len(), 3);
        assert!(index.windows(2).all(|w| w[0] < w[1]));
        Ok(())
    }

    #[test]
    fn test_row_records_have_the_documented_layout() -> Result<(), PbTableError> {
        let bytes = encode(&id_value_table())?;
        let index = get_index(&bytes)?;

        // [len][0x0A][row len][field 1: varint 2][field 2: float 2.5]
        let second = &bytes[index[1]..index[2]];
        assert_eq!(
            second,
            &[0x09, 0x0A, 0x07, 0x08, 0x02, 0x15, 0x00, 0x00, 0x20, 0x40]
        );
        Ok(())
    }

    #[test]
    fn test_sequence_scenario() -> Result<(), PbTableError> {
        let table = Table::from_json(
            r#"{"header":[{"name":"counter","type":"uint","transform":{"sequence":true}}],
                "data":[[100],[105],[112]]}"#,
        )?;
        let bytes = encode(&table)?;

        // Stored deltas: 100, 5, 7.
        let index = get_index(&bytes)?;
        let stored: Vec<u8> = index.iter().map(|&offset| bytes[offset + 4]).collect();
        assert_eq!(stored, vec![100, 5, 7]);

        assert_eq!(decode(&bytes)?.data, table.data);
        assert!(matches!(
            get(&bytes, 2usize),
            Err(PbTableError::UnsupportedOperation(_))
        ));
        Ok(())
    }

    #[test]
    fn test_append_scenario() -> Result<(), PbTableError> {
        let table = Table::from_json(
            r#"{"header":[{"name":"reading","type":"int","transform":{"offset":500}}],
                "data":[[510],[490]]}"#,
        )?;
        let bytes = encode(&table)?;
        let extended = add(
            &bytes,
            &[array_row(vec![Value::Int(505)]), array_row(vec![Value::Int(480)])],
        )?;

        let decoded = decode(&extended)?;
        assert_eq!(decoded.data.len(), 4);
        assert_eq!(&decoded.data[..2], &table.data[..]);
        assert_eq!(&extended[..bytes.len()], bytes.as_slice());
        Ok(())
    }

    #[test]
    fn test_verbose_accessors() -> Result<(), PbTableError> {
        let bytes = encode(&id_value_table())?;
        let extended = add_verbose(
            &bytes,
            &serde_json::from_str::<Vec<Row>>(r#"[{"id":4,"v":4.5}]"#)?,
        )?;

        let rows = get_verbose(&extended, vec![3usize, 0])?.into_rows();
        assert_eq!(
            rows,
            serde_json::from_str::<Vec<Row>>(r#"[{"id":4,"v":4.5},{"id":1,"v":1.5}]"#)?
        );

        let verbose = decode_verbose(&extended)?;
        assert_eq!(encode_verbose(&verbose)?.len(), encode(&decode(&extended)?)?.len());
        Ok(())
    }

    #[test]
    fn test_out_of_range_get() {
        let bytes = encode(&id_value_table()).unwrap();
        let err = get(&bytes, vec![0usize, 3]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requested row 3 but the buffer only contains 3 rows"
        );
    }

    #[test]
    fn test_corrupt_inputs_fail_cleanly() {
        assert!(decode(&[]).is_err());
        assert!(get_index(&[0x7F]).is_err());

        let mut bytes = encode(&id_value_table()).unwrap();
        let index = get_index(&bytes).unwrap();
        bytes[index[1] + 1] = 0x12;
        assert!(matches!(
            decode(&bytes),
            Err(PbTableError::Format { .. })
        ));
    }
}

mod codec_tests {
    use super::*;

    #[test]
    fn test_config_is_applied() -> Result<(), PbTableError> {
        let codec = TableCodec::new(CodecConfig {
            compute_stats: false,
            ..Default::default()
        });
        let bytes = codec.encode(&id_value_table())?;
        assert!(codec.decode(&bytes)?.header.iter().all(|c| c.stats.is_none()));

        let tight = TableCodec::new(CodecConfig {
            max_record_len: 4,
            ..Default::default()
        });
        assert!(matches!(
            tight.decode(&bytes),
            Err(PbTableError::Format { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_decoded_table_converts_to_arrow() -> Result<(), PbTableError> {
        let decoded = decode(&encode(&id_value_table())?)?;
        let batch = table_to_record_batch(&decoded)?;
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 2);

        let back = record_batch_to_table(&batch)?;
        assert_eq!(back.data, decoded.data);
        assert_eq!(encode(&back)?, encode(&id_value_table())?);
        Ok(())
    }
}

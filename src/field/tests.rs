// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════
mod field_tests {
    use crate::error::CarbonError;
    use crate::field::*;
    use crate::types::*;
    use proptest::prelude::*;

    fn encode(value: &Scalar<'_>) -> Vec<u8> {
        let mut buf = Vec::new();
        write_field_into(&mut buf, value);
        buf
    }

    fn column(ty: ColumnType, count: usize, capacity: usize) -> Vec<u8> {
        let mut buf = vec![ty.marker(ListDerivation::UnsortedMultiset), count as u8, capacity as u8];
        let (null, width) = ty.null_slot();
        for _ in 0..capacity {
            buf.extend_from_slice(&null[..width]);
        }
        buf
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Marker vocabulary
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_every_marker_maps_back() {
        let scalars = [
            FieldType::Null,
            FieldType::True,
            FieldType::False,
            FieldType::U8,
            FieldType::U16,
            FieldType::U32,
            FieldType::U64,
            FieldType::I8,
            FieldType::I16,
            FieldType::I32,
            FieldType::I64,
            FieldType::Float,
            FieldType::String,
            FieldType::Binary,
            FieldType::CustomBinary,
        ];
        for ty in scalars {
            assert_eq!(FieldType::from_marker(ty.marker()).unwrap(), ty);
        }
        for d in ListDerivation::ALL {
            let ty = FieldType::Array(d);
            assert_eq!(FieldType::from_marker(ty.marker()).unwrap(), ty);
            for c in ColumnType::ALL {
                let ty = FieldType::Column(c, d);
                assert_eq!(FieldType::from_marker(ty.marker()).unwrap(), ty);
            }
        }
        for d in MapDerivation::ALL {
            let ty = FieldType::Object(d);
            assert_eq!(FieldType::from_marker(ty.marker()).unwrap(), ty);
        }
    }

    #[test]
    fn test_column_markers_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for row in COLUMN_MARKERS {
            for marker in row {
                assert!(seen.insert(marker), "duplicate column marker {marker}");
                assert!(FieldType::from_marker(marker).unwrap().is_container());
            }
        }
    }

    #[test]
    fn test_terminators_are_not_fields() {
        for marker in [MARKER_ARRAY_END, MARKER_OBJECT_END, 0, b'Z'] {
            assert!(matches!(
                FieldType::from_marker(marker),
                Err(CarbonError::MarkerMapping { .. })
            ));
        }
    }

    #[test]
    fn test_derivation_helpers_reject_other_kinds() {
        assert_eq!(
            list_derivation_of_array(MARKER_ARRAY_SORTED_SET).unwrap(),
            ListDerivation::SortedSet
        );
        assert!(list_derivation_of_array(MARKER_OBJECT_UNSORTED_MAP).is_err());
        assert_eq!(
            map_derivation_of_object(MARKER_OBJECT_SORTED_MULTIMAP).unwrap(),
            MapDerivation::SortedMultimap
        );
        assert!(map_derivation_of_object(MARKER_ARRAY_UNSORTED_MULTISET).is_err());
        let marker = ColumnType::I16.marker(ListDerivation::UnsortedSet);
        assert_eq!(
            column_of_marker(marker).unwrap(),
            (ColumnType::I16, ListDerivation::UnsortedSet)
        );
        assert!(column_of_marker(MARKER_U8).is_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sizes
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_fixed_width_sizes() {
        let cases: [(Scalar<'_>, usize); 12] = [
            (Scalar::Null, 1),
            (Scalar::Bool(true), 1),
            (Scalar::Bool(false), 1),
            (Scalar::U8(1), 2),
            (Scalar::U16(1), 3),
            (Scalar::U32(1), 5),
            (Scalar::U64(1), 9),
            (Scalar::I8(-1), 2),
            (Scalar::I16(-1), 3),
            (Scalar::I32(-1), 5),
            (Scalar::I64(-1), 9),
            (Scalar::Float(1.5), 5),
        ];
        for (value, size) in cases {
            let buf = encode(&value);
            assert_eq!(buf.len(), size, "{value:?}");
            assert_eq!(field_size(&buf, 0).unwrap(), size, "{value:?}");
        }
    }

    #[test]
    fn test_variable_width_sizes() {
        let text = "x".repeat(200);
        let buf = encode(&Scalar::String(&text));
        // marker + 2-byte varuint + payload
        assert_eq!(field_size(&buf, 0).unwrap(), 1 + 2 + 200);

        let buf = encode(&Scalar::Binary {
            data: b"\x89PNG",
            mime: MimeType::from_extension("png"),
        });
        assert_eq!(field_size(&buf, 0).unwrap(), buf.len());

        let buf = encode(&Scalar::CustomBinary {
            data: &[1, 2, 3],
            type_name: "my/type",
        });
        assert_eq!(field_size(&buf, 0).unwrap(), 1 + 1 + 7 + 1 + 3);
    }

    #[test]
    fn test_container_sizes_include_slack() {
        // [ u8 1, slack x3 ]
        let array = [MARKER_ARRAY_UNSORTED_MULTISET, MARKER_U8, 1, 0, 0, 0, MARKER_ARRAY_END];
        assert_eq!(field_size(&array, 0).unwrap(), array.len());

        let mut object = vec![MARKER_OBJECT_UNSORTED_MULTIMAP];
        write_key_into(&mut object, "k");
        write_field_into(&mut object, &Scalar::Null);
        object.extend_from_slice(&[0, 0, MARKER_OBJECT_END]);
        assert_eq!(field_size(&object, 0).unwrap(), object.len());

        let col = column(ColumnType::U32, 0, 4);
        assert_eq!(field_size(&col, 0).unwrap(), 3 + 16);
    }

    #[test]
    fn test_nested_container_size() {
        let mut buf = vec![MARKER_ARRAY_UNSORTED_MULTISET, MARKER_ARRAY_SORTED_SET, MARKER_TRUE];
        buf.push(MARKER_ARRAY_END);
        buf.extend(column(ColumnType::Boolean, 0, 2));
        buf.push(MARKER_ARRAY_END);
        buf.push(MARKER_NULL); // trailing field outside the array
        assert_eq!(field_size(&buf, 0).unwrap(), buf.len() - 1);
        assert_eq!(field_size(&buf, 1).unwrap(), 3);
    }

    #[test]
    fn test_size_of_corrupt_fields() {
        assert!(matches!(
            field_size(&[b'Z'], 0),
            Err(CarbonError::Internal(_))
        ));
        assert!(matches!(
            field_size(&[MARKER_U32, 1, 2], 0),
            Err(CarbonError::Corrupted(_))
        ));
        assert!(matches!(
            field_size(&[MARKER_STRING, 5, b'a'], 0),
            Err(CarbonError::Corrupted(_))
        ));
        assert!(matches!(
            field_size(&[MARKER_ARRAY_UNSORTED_MULTISET, MARKER_NULL], 0),
            Err(CarbonError::Corrupted(_))
        ));
        // slack followed by something other than the terminator
        assert!(matches!(
            field_size(&[MARKER_ARRAY_UNSORTED_MULTISET, 0, MARKER_NULL, MARKER_ARRAY_END], 0),
            Err(CarbonError::Corrupted(_))
        ));
        // count larger than capacity
        let mut col = column(ColumnType::U8, 0, 1);
        col[1] = 2;
        assert!(matches!(field_size(&col, 0), Err(CarbonError::Corrupted(_))));
    }

    #[test]
    fn test_key_size_requires_string_marker() {
        let mut buf = Vec::new();
        write_key_into(&mut buf, "name");
        assert_eq!(key_size(&buf, 0).unwrap(), 6);
        assert!(key_size(&[MARKER_U8, 1], 0).is_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Typed reads
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_field_ref_typed_access() {
        let buf = encode(&Scalar::I16(-300));
        let field = FieldRef::at(&buf, 0).unwrap();
        assert_eq!(field.field_type(), FieldType::I16);
        assert_eq!(field.i16_value().unwrap(), -300);
        assert_eq!(field.signed_value().unwrap(), -300);
        assert_eq!(field.number_as_f64().unwrap(), -300.0);
        assert!(matches!(
            field.u16_value(),
            Err(CarbonError::TypeMismatch { expected: "u16", actual: "i16" })
        ));
        assert!(field.unsigned_value().is_err());
        assert!(field.string_value().is_err());
    }

    #[test]
    fn test_field_ref_string_and_binary() {
        let buf = encode(&Scalar::String("héllo"));
        assert_eq!(FieldRef::at(&buf, 0).unwrap().string_value().unwrap(), "héllo");

        let buf = encode(&Scalar::Binary {
            data: b"{}",
            mime: MimeType::JSON,
        });
        let bin = FieldRef::at(&buf, 0).unwrap().binary_value().unwrap();
        assert_eq!(bin.binary_type, BinaryType::Mime(MimeType::JSON));
        assert_eq!(bin.binary_type.name(), "application/json");
        assert_eq!(bin.data, b"{}");

        let buf = encode(&Scalar::CustomBinary {
            data: &[7],
            type_name: "x-app/blob",
        });
        let bin = FieldRef::at(&buf, 0).unwrap().binary_value().unwrap();
        assert_eq!(bin.binary_type, BinaryType::Custom("x-app/blob"));
        assert_eq!(bin.data, &[7]);
    }

    #[test]
    fn test_field_ref_rejects_invalid_utf8() {
        let buf = [MARKER_STRING, 2, 0xff, 0xfe];
        assert!(FieldRef::at(&buf, 0).unwrap().string_value().is_err());
    }

    #[test]
    fn test_bool_and_null() {
        let buf = [MARKER_TRUE, MARKER_FALSE, MARKER_NULL];
        assert!(FieldRef::at(&buf, 0).unwrap().bool_value().unwrap());
        assert!(!FieldRef::at(&buf, 1).unwrap().bool_value().unwrap());
        assert!(FieldRef::at(&buf, 2).unwrap().is_null());
        assert!(FieldRef::at(&buf, 2).unwrap().bool_value().is_err());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Column slots
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_column_slot_rejects_sentinels_and_range() {
        assert!(column_slot(ColumnType::U8, &Scalar::U8(255)).is_none());
        assert!(column_slot(ColumnType::U8, &Scalar::U16(256)).is_none());
        assert!(column_slot(ColumnType::I8, &Scalar::I8(i8::MIN)).is_none());
        assert!(column_slot(ColumnType::U32, &Scalar::I8(-1)).is_none());
        assert!(column_slot(ColumnType::Float, &Scalar::Float(f32::NAN)).is_none());
        assert!(column_slot(ColumnType::Float, &Scalar::U8(1)).is_none());
        assert!(column_slot(ColumnType::Boolean, &Scalar::U8(1)).is_none());
        assert!(column_slot(ColumnType::U8, &Scalar::String("1")).is_none());
    }

    #[test]
    fn test_column_slot_widens_and_writes_nulls() {
        let (slot, width) = column_slot(ColumnType::I32, &Scalar::U8(7)).unwrap();
        assert_eq!(&slot[..width], &7i32.to_le_bytes());
        let (slot, width) = column_slot(ColumnType::U16, &Scalar::Null).unwrap();
        assert!(ColumnType::U16.is_null_slot(&slot[..width]));
        let (slot, width) = column_slot(ColumnType::Boolean, &Scalar::Bool(true)).unwrap();
        assert_eq!(&slot[..width], &[BOOLEAN_COLUMN_TRUE]);
    }

    #[test]
    fn test_column_header_offsets() {
        let col = column(ColumnType::U16, 1, 3);
        let header = ColumnHeader::parse(&col, 0).unwrap();
        assert_eq!(header.column_type, ColumnType::U16);
        assert_eq!(header.count, 1);
        assert_eq!(header.capacity, 3);
        assert_eq!(header.count_offset, 1);
        assert_eq!(header.capacity_offset, 2);
        assert_eq!(header.slots_offset, 3);
        assert_eq!(header.slot_offset(2), 7);
        assert_eq!(header.end(), col.len());
    }

    #[test]
    fn test_narrowest_scalar() {
        assert_eq!(Scalar::unsigned(255), Scalar::U8(255));
        assert_eq!(Scalar::unsigned(256), Scalar::U16(256));
        assert_eq!(Scalar::unsigned(u64::MAX), Scalar::U64(u64::MAX));
        assert_eq!(Scalar::signed(-129), Scalar::I16(-129));
        assert_eq!(Scalar::signed(i64::MIN), Scalar::I64(i64::MIN));
    }

    proptest! {
        #[test]
        fn prop_string_size_matches_encoding(text in ".{0,300}") {
            let buf = encode(&Scalar::String(&text));
            prop_assert_eq!(field_size(&buf, 0).unwrap(), buf.len());
            prop_assert_eq!(FieldRef::at(&buf, 0).unwrap().string_value().unwrap(), text.as_str());
        }

        #[test]
        fn prop_unsigned_reads_back(value in any::<u64>()) {
            let buf = encode(&Scalar::unsigned(value));
            prop_assert_eq!(FieldRef::at(&buf, 0).unwrap().unsigned_value().unwrap(), value);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════
mod insert_tests {
    use crate::field::{ColumnHeader, ColumnType, ListDerivation, MapDerivation, MimeType, Scalar, field_size};
    use crate::insert::{ArrayInsert, Inserter};
    use crate::memblock::MemBlock;
    use crate::memfile::{AccessMode, MemFile};
    use crate::types::*;
    use crate::value::CarbonValue;

    fn empty_array(slack: usize) -> MemBlock {
        let mut bytes = vec![MARKER_ARRAY_UNSORTED_MULTISET];
        bytes.resize(1 + slack, 0);
        bytes.push(MARKER_ARRAY_END);
        let mut block = MemBlock::create(bytes.len()).unwrap();
        block.write(0, &bytes).unwrap();
        block
    }

    fn build(block: &mut MemBlock, f: impl FnOnce(&mut ArrayInsert<'_>)) {
        let file = MemFile::open_mut(block, AccessMode::ReadWrite);
        let mut ins = ArrayInsert::new(file, 1);
        f(&mut ins);
    }

    fn json(block: &MemBlock) -> String {
        CarbonValue::decode(block.raw_data(), 0)
            .unwrap()
            .to_json()
            .unwrap()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_insert_every_scalar_kind() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            ins.insert_null().unwrap();
            ins.insert_true().unwrap();
            ins.insert_false().unwrap();
            ins.insert_u8(1).unwrap();
            ins.insert_u16(2).unwrap();
            ins.insert_u32(3).unwrap();
            ins.insert_u64(4).unwrap();
            ins.insert_i8(-1).unwrap();
            ins.insert_i16(-2).unwrap();
            ins.insert_i32(-3).unwrap();
            ins.insert_i64(-4).unwrap();
            ins.insert_float(0.5).unwrap();
            ins.insert_string("s").unwrap();
        });
        assert_eq!(json(&block), r#"[null,true,false,1,2,3,4,-1,-2,-3,-4,0.5,"s"]"#);
        assert_eq!(field_size(block.raw_data(), 0).unwrap(), block.raw_data().len());
    }

    #[test]
    fn test_insert_picks_narrowest_integer() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            ins.insert_unsigned(200).unwrap();
            ins.insert_signed(-200).unwrap();
        });
        let data = block.raw_data();
        assert_eq!(data[1], MARKER_U8);
        assert_eq!(data[3], MARKER_I16);
    }

    #[test]
    fn test_insert_binary_kinds() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            ins.insert_binary(b"abc", MimeType::from_extension("txt")).unwrap();
            ins.insert_custom_binary(b"\x00\x01", "x-app/pair").unwrap();
        });
        let value = CarbonValue::decode(block.raw_data(), 0).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(
            items[0],
            CarbonValue::Binary {
                type_name: "text/plain".into(),
                data: b"abc".to_vec()
            }
        );
        assert_eq!(
            items[1],
            CarbonValue::Binary {
                type_name: "x-app/pair".into(),
                data: vec![0, 1]
            }
        );
    }

    #[test]
    fn test_insert_consumes_slack_before_growing() {
        let mut block = empty_array(4);
        let len = block.raw_data().len();
        build(&mut block, |ins| {
            ins.insert_u8(1).unwrap();
            ins.insert_u8(2).unwrap();
        });
        assert_eq!(block.raw_data().len(), len);
        assert_eq!(json(&block), "[1,2]");
        build(&mut block, |ins| {
            // position 1 is occupied now; the builder shifts what follows
            ins.insert_u32(7).unwrap();
        });
        assert_eq!(json(&block), "[7,1,2]");
        assert_eq!(field_size(block.raw_data(), 0).unwrap(), block.raw_data().len());
    }

    #[test]
    fn test_end_reports_position() {
        let mut block = empty_array(0);
        let file = MemFile::open_mut(&mut block, AccessMode::ReadWrite);
        let mut ins = ArrayInsert::new(file, 1);
        ins.insert_u16(9).unwrap();
        assert_eq!(ins.position(), 4);
        assert_eq!(ins.end(), 4);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Nested containers
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_nested_guard_advances_parent() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            {
                let mut nested = ins.insert_array(ListDerivation::SortedSet, 8).unwrap();
                assert_eq!(nested.begin_offset(), 1);
                nested.insert_u8(1).unwrap();
                nested.insert_u8(2).unwrap();
            }
            // nested array: marker, two u8 fields, 4 bytes slack left, end
            assert_eq!(ins.position(), 1 + 1 + 4 + 4 + 1);
            ins.insert_string("after").unwrap();
        });
        assert_eq!(json(&block), r#"[[1,2],"after"]"#);
    }

    #[test]
    fn test_nested_growth_beyond_reserved_capacity() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            let mut nested = ins.insert_array(ListDerivation::UnsortedMultiset, 1).unwrap();
            for i in 0..10 {
                nested.insert_u8(i).unwrap();
            }
            nested.end();
            ins.insert_null().unwrap();
        });
        assert_eq!(json(&block), "[[0,1,2,3,4,5,6,7,8,9],null]");
    }

    #[test]
    fn test_object_builder_writes_keys() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            let mut obj = ins.insert_object(MapDerivation::UnsortedMap, 0).unwrap();
            obj.insert_string("name", "carbon").unwrap();
            obj.insert_signed("delta", -3).unwrap();
            obj.insert_binary("blob", b"{}", MimeType::JSON).unwrap();
            let mut tags = obj.insert_array("tags", ListDerivation::UnsortedMultiset, 0).unwrap();
            tags.insert_string("a").unwrap();
            drop(tags);
            let mut inner = obj.insert_object("inner", MapDerivation::UnsortedMap, 0).unwrap();
            inner.insert_false("flag").unwrap();
        });
        let value = CarbonValue::decode(block.raw_data(), 0).unwrap();
        let obj = &value.as_array().unwrap()[0];
        let keys: Vec<_> = obj.as_object().unwrap().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["name", "delta", "blob", "tags", "inner"]);
        assert_eq!(obj.get("delta").and_then(CarbonValue::as_i64), Some(-3));
        assert_eq!(
            obj.get("inner").and_then(|v| v.get("flag")),
            Some(&CarbonValue::Bool(false))
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Columns
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_column_builder_doubles_capacity() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            let mut col = ins
                .insert_column(ColumnType::U32, ListDerivation::UnsortedMultiset, 1)
                .unwrap();
            for i in 0..5u32 {
                col.insert_u32(i * 1000).unwrap();
            }
            assert_eq!(col.length().unwrap(), 5);
            drop(col);
            ins.insert_true().unwrap();
        });
        let header = ColumnHeader::parse(block.raw_data(), 1).unwrap();
        assert_eq!(header.count, 5);
        assert_eq!(header.capacity, 8);
        assert_eq!(json(&block), "[[0,1000,2000,3000,4000],true]");
    }

    #[test]
    fn test_column_builder_from_zero_capacity() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            let mut col = ins
                .insert_column(ColumnType::Float, ListDerivation::UnsortedMultiset, 0)
                .unwrap();
            col.insert_float(1.5).unwrap();
            col.insert_null().unwrap();
        });
        assert_eq!(json(&block), "[[1.5,null]]");
    }

    #[test]
    fn test_column_builder_rejects_mismatched_values() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            let mut col = ins
                .insert_column(ColumnType::U8, ListDerivation::UnsortedMultiset, 2)
                .unwrap();
            assert!(col.insert(&Scalar::String("1")).is_err());
            assert!(col.insert_u8(u8::MAX).is_err());
            assert!(col.insert_i8(-1).is_err());
            col.insert_u16(17).unwrap();
            assert_eq!(col.length().unwrap(), 1);
        });
        assert_eq!(json(&block), "[[17]]");
    }

    #[test]
    fn test_column_in_object() {
        let mut block = empty_array(0);
        build(&mut block, |ins| {
            let mut obj = ins.insert_object(MapDerivation::UnsortedMultimap, 0).unwrap();
            let mut col = obj
                .insert_column("flags", ColumnType::Boolean, ListDerivation::UnsortedMultiset, 1)
                .unwrap();
            col.insert_bool(true).unwrap();
            col.insert_bool(false).unwrap();
            drop(col);
            obj.insert_u8("n", 2).unwrap();
        });
        assert_eq!(json(&block), r#"[{"flags":[true,false],"n":2}]"#);
    }
}

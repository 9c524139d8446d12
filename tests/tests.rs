use ssz_schema::{
    DecodeError, Hash256, Hasher, Schema, SchemaField, Sha256Hasher, SszHandler, Value,
};

fn handler(schema: &Schema) -> SszHandler {
    SszHandler::from_schema(schema).unwrap()
}

fn u16_list(values: &[u16]) -> Value {
    Value::List(values.iter().map(|x| Value::Uint16(*x)).collect())
}

fn u8_list(values: &[u8]) -> Value {
    Value::List(values.iter().map(|x| Value::Uint8(*x)).collect())
}

mod round_trip {
    use super::*;

    fn round_trip(handler: &SszHandler, values: Vec<Value>) {
        for value in values {
            let encoded = handler.as_ssz_bytes(&value).unwrap();
            assert_eq!(handler.size_of(&value).unwrap(), encoded.len() as u64);
            assert!(handler.min_len() <= encoded.len() as u64);
            assert!(handler.max_len() >= encoded.len() as u64);
            handler.dry_check_bytes(&encoded).unwrap();
            assert_eq!(handler.from_ssz_bytes(&encoded), Ok(value));
        }
    }

    #[test]
    fn bool() {
        let handler = handler(&Schema::Bool);
        round_trip(&handler, vec![Value::Bool(true), Value::Bool(false)]);
    }

    #[test]
    fn uints() {
        round_trip(
            &handler(&Schema::Uint8),
            vec![Value::Uint8(0), Value::Uint8(255)],
        );
        round_trip(
            &handler(&Schema::Uint16),
            vec![Value::Uint16(0), Value::Uint16(65535)],
        );
        round_trip(
            &handler(&Schema::Uint32),
            vec![Value::Uint32(0), Value::Uint32(u32::MAX)],
        );
        round_trip(
            &handler(&Schema::Uint64),
            vec![Value::Uint64(0), Value::Uint64(u64::MAX)],
        );
    }

    #[test]
    fn u8_vector() {
        let handler = handler(&Schema::vector(Schema::Uint8, 4));
        round_trip(
            &handler,
            vec![Value::Vector(vec![
                Value::Uint8(0xaa),
                Value::Uint8(0xbb),
                Value::Uint8(0xcc),
                Value::Uint8(0xdd),
            ])],
        );
    }

    #[test]
    fn u16_lists() {
        let handler = handler(&Schema::list(Schema::Uint16, 1024));
        round_trip(
            &handler,
            vec![
                u16_list(&[]),
                u16_list(&[255]),
                u16_list(&[0, 1, 2]),
                u16_list(&[100; 64]),
                u16_list(&[255, 0, 255]),
            ],
        );
    }

    #[test]
    fn list_of_lists() {
        let handler = handler(&Schema::list(Schema::list(Schema::Uint16, 64), 64));
        let cases: Vec<Vec<Vec<u16>>> = vec![
            vec![],
            vec![vec![]],
            vec![vec![1, 2, 3]],
            vec![vec![], vec![]],
            vec![vec![], vec![1, 2, 3]],
            vec![vec![1, 2, 3], vec![1, 2, 3]],
            vec![vec![1, 2, 3], vec![], vec![1, 2, 3]],
            vec![vec![], vec![1], vec![1, 2, 3]],
        ];
        round_trip(
            &handler,
            cases
                .into_iter()
                .map(|outer| Value::List(outer.iter().map(|inner| u16_list(inner)).collect()))
                .collect(),
        );
    }

    #[test]
    fn vector_of_variable_lists() {
        let handler = handler(&Schema::vector(Schema::list(Schema::Uint8, 16), 2));
        round_trip(
            &handler,
            vec![
                Value::Vector(vec![u8_list(&[]), u8_list(&[])]),
                Value::Vector(vec![u8_list(&[1]), u8_list(&[2, 3])]),
            ],
        );
    }

    #[test]
    fn fixed_container() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::Uint64),
            SchemaField::new("c", Schema::Uint32),
        ]);
        let handler = handler(&schema);
        round_trip(
            &handler,
            vec![
                Value::Container(vec![Value::Uint16(0), Value::Uint64(0), Value::Uint32(0)]),
                Value::Container(vec![Value::Uint16(1), Value::Uint64(1), Value::Uint32(1)]),
            ],
        );
    }

    #[test]
    fn variable_container() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::list(Schema::Uint16, 128)),
            SchemaField::new("c", Schema::Uint32),
        ]);
        let handler = handler(&schema);
        round_trip(
            &handler,
            vec![
                Value::Container(vec![Value::Uint16(0), u16_list(&[]), Value::Uint32(0)]),
                Value::Container(vec![
                    Value::Uint16(255),
                    u16_list(&[0, 1, 2, 3]),
                    Value::Uint32(99),
                ]),
            ],
        );
    }

    #[test]
    fn container_with_three_variable_fields() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::list(Schema::Uint16, 64)),
            SchemaField::new("c", Schema::list(Schema::Uint16, 64)),
            SchemaField::new("d", Schema::list(Schema::Uint16, 64)),
        ]);
        round_trip(
            &handler(&schema),
            vec![Value::Container(vec![
                Value::Uint16(42),
                u16_list(&[0]),
                u16_list(&[1]),
                u16_list(&[2]),
            ])],
        );
    }

    #[test]
    fn pointer_is_wire_transparent() {
        let plain = handler(&Schema::list(Schema::Uint8, 32));
        let pointed = handler(&Schema::pointer(Schema::list(Schema::Uint8, 32)));

        let inner = u8_list(&[1, 2, 3]);
        let boxed = Value::Pointer(Box::new(inner.clone()));

        assert_eq!(
            plain.as_ssz_bytes(&inner).unwrap(),
            pointed.as_ssz_bytes(&boxed).unwrap()
        );
        round_trip(&pointed, vec![boxed]);
    }
}

mod wire_form {
    use super::*;

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn uint64_scenario() {
        let handler = handler(&Schema::Uint64);
        let bytes = handler
            .as_ssz_bytes(&Value::Uint64(0x0102030405060708))
            .unwrap();
        assert_eq!(bytes, vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn u8_vector_scenario() {
        let handler = handler(&Schema::vector(Schema::Uint8, 4));
        let value = Value::Vector(vec![
            Value::Uint8(0xaa),
            Value::Uint8(0xbb),
            Value::Uint8(0xcc),
            Value::Uint8(0xdd),
        ]);
        assert_eq!(
            handler.as_ssz_bytes(&value).unwrap(),
            vec![0xaa, 0xbb, 0xcc, 0xdd]
        );
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn u16_list_scenario() {
        let handler = handler(&Schema::list(Schema::Uint16, 1024));
        let value = u16_list(&[1, 2]);

        let bytes = handler.as_ssz_bytes(&value).unwrap();
        assert_eq!(bytes, vec![01, 00, 02, 00]);
        assert_eq!(handler.from_ssz_bytes(&bytes), Ok(value));
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn container_with_list_scenario() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint32),
            SchemaField::new("b", Schema::list(Schema::Uint8, 256)),
        ]);
        let handler = handler(&schema);
        let value = Value::Container(vec![Value::Uint32(42), u8_list(&[7, 8, 9])]);

        let bytes = handler.as_ssz_bytes(&value).unwrap();
        //                 | a=42 ------- | offset=8 ---- | b payload|
        assert_eq!(bytes, vec![0x2a, 00, 00, 00, 08, 00, 00, 00, 07, 08, 09]);
        assert_eq!(bytes.len(), 11);
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn nested_container_scenario() {
        let inner = Schema::container(vec![
            SchemaField::new("p", Schema::Uint16),
            SchemaField::new("q", Schema::list(Schema::Uint8, 16)),
        ]);
        let outer = Schema::container(vec![
            SchemaField::new("x", inner),
            SchemaField::new("y", Schema::Uint8),
        ]);
        let handler = handler(&outer);

        let value = Value::Container(vec![
            Value::Container(vec![Value::Uint16(300), u8_list(&[1])]),
            Value::Uint8(5),
        ]);

        let bytes = handler.as_ssz_bytes(&value).unwrap();
        //                 | offset=5 ---- | y | p=300 -| offset=6 ---- | q |
        assert_eq!(
            bytes,
            vec![05, 00, 00, 00, 05, 0x2c, 01, 06, 00, 00, 00, 01]
        );
        assert_eq!(handler.from_ssz_bytes(&bytes), Ok(value));
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn single_element_list_first_offset_is_four() {
        let handler = handler(&Schema::list(Schema::list(Schema::Uint8, 8), 8));
        let value = Value::List(vec![u8_list(&[0xab])]);

        assert_eq!(
            handler.as_ssz_bytes(&value).unwrap(),
            vec![04, 00, 00, 00, 0xab]
        );
    }

    #[test]
    fn empty_list_encodes_to_zero_bytes() {
        let handler = handler(&Schema::list(Schema::Uint16, 1024));
        let value = u16_list(&[]);

        assert_eq!(handler.as_ssz_bytes(&value).unwrap(), Vec::<u8>::new());
        assert_eq!(handler.size_of(&value).unwrap(), 0);
    }

    #[test]
    fn write_to_matches_buffered_encoding() {
        let handler = handler(&Schema::list(Schema::Uint16, 64));
        let value = u16_list(&[9, 8, 7]);

        let mut sink = vec![];
        let written = handler.write_to(&value, &mut sink).unwrap();

        assert_eq!(sink, handler.as_ssz_bytes(&value).unwrap());
        assert_eq!(written, sink.len() as u64);
    }
}

mod invalid_input {
    use super::*;

    #[test]
    fn bool_two_is_invalid() {
        let handler = handler(&Schema::Bool);
        assert_eq!(
            handler.from_ssz_bytes(&[0x02]),
            Err(DecodeError::InvalidBool(0x02))
        );
    }

    #[test]
    fn u16_list_with_three_bytes_is_a_length_mismatch() {
        let handler = handler(&Schema::list(Schema::Uint16, 1024));
        assert_eq!(
            handler.from_ssz_bytes(&[1, 0, 2]),
            Err(DecodeError::LengthMismatch {
                len: 3,
                elem_len: 2
            })
        );
    }

    #[test]
    fn exactly_limit_decodes_and_one_over_fails() {
        let handler = handler(&Schema::list(Schema::Uint8, 4));

        assert_eq!(
            handler.from_ssz_bytes(&[1, 2, 3, 4]),
            Ok(u8_list(&[1, 2, 3, 4]))
        );
        assert_eq!(
            handler.from_ssz_bytes(&[1, 2, 3, 4, 5]),
            Err(DecodeError::LimitExceeded { len: 5, limit: 4 })
        );
    }

    #[test]
    fn fixed_container_rejects_excess_bytes() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::Uint64),
            SchemaField::new("c", Schema::Uint32),
        ]);
        let handler = handler(&schema);

        let mut bytes = handler
            .as_ssz_bytes(&Value::Container(vec![
                Value::Uint16(1),
                Value::Uint64(2),
                Value::Uint32(3),
            ]))
            .unwrap();
        bytes.push(0);

        assert_eq!(
            handler.from_ssz_bytes(&bytes),
            Err(DecodeError::InvalidByteLength {
                len: 15,
                expected: 14
            })
        );
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn decreasing_offsets_are_rejected() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::list(Schema::Uint8, 64)),
            SchemaField::new("c", Schema::list(Schema::Uint8, 64)),
            SchemaField::new("d", Schema::list(Schema::Uint8, 64)),
        ]);
        let handler = handler(&schema);

        let bytes = vec![
            //      | offset        | offset        | offset        | variable
            01, 00, 14, 00, 00, 00, 15, 00, 00, 00, 14, 00, 00, 00, 00, 00,
        ];

        assert_eq!(
            handler.from_ssz_bytes(&bytes),
            Err(DecodeError::OffsetsAreDecreasing(14))
        );
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn offset_into_fixed_portion_is_rejected() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::list(Schema::Uint16, 64)),
            SchemaField::new("c", Schema::Uint32),
        ]);
        let handler = handler(&schema);

        let bytes = vec![
            //      | offset        | u32           | variable
            01, 00, 09, 00, 00, 00, 01, 00, 00, 00, 00, 00, 01, 00, 02, 00,
        ];

        assert_eq!(
            handler.from_ssz_bytes(&bytes),
            Err(DecodeError::OffsetMismatch {
                expected: 9,
                actual: 10
            })
        );
    }

    #[test]
    #[allow(clippy::zero_prefixed_literal)]
    fn offset_skipping_variable_bytes_is_rejected() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::list(Schema::Uint16, 64)),
            SchemaField::new("c", Schema::Uint32),
        ]);
        let handler = handler(&schema);

        let bytes = vec![
            01, 00, 11, 00, 00, 00, 01, 00, 00, 00, 00, 00, 01, 00, 02, 00,
        ];

        assert_eq!(
            handler.from_ssz_bytes(&bytes),
            Err(DecodeError::OffsetMismatch {
                expected: 11,
                actual: 10
            })
        );
    }

    #[test]
    fn vector_first_offset_must_match_length() {
        let handler = handler(&Schema::vector(Schema::list(Schema::Uint8, 8), 2));

        // One offset where two are required.
        let bytes = vec![4, 0, 0, 0, 0xaa];
        assert_eq!(
            handler.from_ssz_bytes(&bytes),
            Err(DecodeError::InvalidFirstOffset(4))
        );
    }

    #[test]
    fn list_first_offset_must_be_a_multiple_of_four() {
        let handler = handler(&Schema::list(Schema::list(Schema::Uint8, 8), 8));

        let bytes = vec![5, 0, 0, 0, 0xaa, 0xbb];
        assert_eq!(
            handler.from_ssz_bytes(&bytes),
            Err(DecodeError::InvalidFirstOffset(5))
        );
    }

    #[test]
    fn truncated_fixed_input_is_rejected() {
        let handler = handler(&Schema::Uint64);
        assert_eq!(
            handler.from_ssz_bytes(&[1, 2, 3]),
            Err(DecodeError::InvalidByteLength { len: 3, expected: 8 })
        );
    }

    #[test]
    fn dry_check_rejects_what_decode_rejects() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint32),
            SchemaField::new("b", Schema::list(Schema::Uint8, 256)),
        ]);
        let handler = handler(&schema);
        let good = handler
            .as_ssz_bytes(&Value::Container(vec![Value::Uint32(42), u8_list(&[7, 8])]))
            .unwrap();

        handler.dry_check_bytes(&good).unwrap();
        assert!(handler.dry_check_bytes(&good[..good.len() - 1]).is_err());
        assert!(handler.dry_check_bytes(&[]).is_err());
    }
}

mod hashing {
    use super::*;

    fn padded_chunk(bytes: &[u8]) -> [u8; 32] {
        let mut chunk = [0u8; 32];
        chunk[..bytes.len()].copy_from_slice(bytes);
        chunk
    }

    #[test]
    fn uint64_root_is_the_padded_value() {
        let handler = handler(&Schema::Uint64);
        let mut hasher = Sha256Hasher;

        let root = handler
            .hash_tree_root(&mut hasher, &Value::Uint64(0x0102030405060708))
            .unwrap();

        let expected = padded_chunk(&[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(root, Hash256::from(expected));
    }

    #[test]
    fn u8_vector_root_is_one_padded_chunk() {
        let handler = handler(&Schema::vector(Schema::Uint8, 4));
        let mut hasher = Sha256Hasher;

        let value = Value::Vector(vec![
            Value::Uint8(0xaa),
            Value::Uint8(0xbb),
            Value::Uint8(0xcc),
            Value::Uint8(0xdd),
        ]);
        let root = handler.hash_tree_root(&mut hasher, &value).unwrap();

        assert_eq!(root, Hash256::from(padded_chunk(&[0xaa, 0xbb, 0xcc, 0xdd])));
    }

    #[test]
    fn empty_list_root_is_the_zero_hash_at_limit_depth() {
        // 1024 u16 elements pack into 64 chunks, a depth-6 tree.
        let handler = handler(&Schema::list(Schema::Uint16, 1024));
        let mut hasher = Sha256Hasher;

        let root = handler.hash_tree_root(&mut hasher, &u16_list(&[])).unwrap();
        assert_eq!(root, Hash256::from(hasher.zero_hash(6)));
    }

    #[test]
    fn container_root_pads_field_roots_to_a_power_of_two() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint64),
            SchemaField::new("b", Schema::Uint64),
            SchemaField::new("c", Schema::Uint64),
        ]);
        let handler = handler(&schema);
        let mut hasher = Sha256Hasher;

        let value = Value::Container(vec![
            Value::Uint64(1),
            Value::Uint64(2),
            Value::Uint64(3),
        ]);
        let root = handler.hash_tree_root(&mut hasher, &value).unwrap();

        let r1 = padded_chunk(&1u64.to_le_bytes());
        let r2 = padded_chunk(&2u64.to_le_bytes());
        let r3 = padded_chunk(&3u64.to_le_bytes());
        let left = hasher.hash32_concat(&r1, &r2);
        let right = hasher.hash32_concat(&r3, &[0u8; 32]);
        let expected = hasher.hash32_concat(&left, &right);

        assert_eq!(root, Hash256::from(expected));
    }

    #[test]
    fn signing_root_drops_the_last_field() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint64),
            SchemaField::new("b", Schema::Uint64),
            SchemaField::new("c", Schema::Uint64),
        ]);
        let handler = handler(&schema);
        let mut hasher = Sha256Hasher;

        let value = Value::Container(vec![
            Value::Uint64(1),
            Value::Uint64(2),
            Value::Uint64(3),
        ]);
        let root = handler.signing_root(&mut hasher, &value).unwrap();

        let r1 = padded_chunk(&1u64.to_le_bytes());
        let r2 = padded_chunk(&2u64.to_le_bytes());
        assert_eq!(root, Hash256::from(hasher.hash32_concat(&r1, &r2)));
    }

    #[test]
    fn root_is_stable_across_calls_and_allocation_patterns() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint32),
            SchemaField::new("b", Schema::list(Schema::Uint8, 256)),
        ]);
        let handler = handler(&schema);
        let mut hasher = Sha256Hasher;

        let value = Value::Container(vec![Value::Uint32(42), u8_list(&[7, 8, 9])]);
        let first = handler.hash_tree_root(&mut hasher, &value).unwrap();
        let second = handler.hash_tree_root(&mut hasher, &value).unwrap();

        // A decoded copy has fresh allocations but the same root.
        let reencoded = handler
            .from_ssz_bytes(&handler.as_ssz_bytes(&value).unwrap())
            .unwrap();
        let third = handler.hash_tree_root(&mut hasher, &reencoded).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn pointer_root_matches_the_inner_root() {
        let plain = handler(&Schema::list(Schema::Uint8, 32));
        let pointed = handler(&Schema::pointer(Schema::list(Schema::Uint8, 32)));
        let mut hasher = Sha256Hasher;

        let inner = u8_list(&[1, 2, 3]);
        let boxed = Value::Pointer(Box::new(inner.clone()));

        assert_eq!(
            plain.hash_tree_root(&mut hasher, &inner).unwrap(),
            pointed.hash_tree_root(&mut hasher, &boxed).unwrap()
        );
    }
}

mod squash {
    use super::*;

    fn inner_schema() -> Schema {
        Schema::container(vec![
            SchemaField::new("b", Schema::Uint8),
            SchemaField::new("c", Schema::Uint16),
        ])
    }

    #[test]
    fn squashed_members_flatten_onto_the_wire() {
        let squashed = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::squashed("s", inner_schema()),
        ]);
        let flat = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::new("b", Schema::Uint8),
            SchemaField::new("c", Schema::Uint16),
        ]);

        let squashed_handler = handler(&squashed);
        let flat_handler = handler(&flat);

        let nested_value = Value::Container(vec![
            Value::Uint16(1),
            Value::Container(vec![Value::Uint8(2), Value::Uint16(3)]),
        ]);
        let flat_value = Value::Container(vec![
            Value::Uint16(1),
            Value::Uint8(2),
            Value::Uint16(3),
        ]);

        let squashed_bytes = squashed_handler.as_ssz_bytes(&nested_value).unwrap();
        assert_eq!(squashed_bytes, flat_handler.as_ssz_bytes(&flat_value).unwrap());

        // Decoding restores the nested shape.
        assert_eq!(
            squashed_handler.from_ssz_bytes(&squashed_bytes),
            Ok(nested_value.clone())
        );

        // Roots flatten identically: the squashed fields are leaves of the
        // outer container.
        let mut hasher = Sha256Hasher;
        assert_eq!(
            squashed_handler
                .hash_tree_root(&mut hasher, &nested_value)
                .unwrap(),
            flat_handler.hash_tree_root(&mut hasher, &flat_value).unwrap()
        );
    }

    #[test]
    fn anonymous_members_squash_implicitly() {
        let anonymous = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::anonymous("s", inner_schema()),
        ]);
        let squashed = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::squashed("s", inner_schema()),
        ]);

        let value = Value::Container(vec![
            Value::Uint16(1),
            Value::Container(vec![Value::Uint8(2), Value::Uint16(3)]),
        ]);

        assert_eq!(
            handler(&anonymous).as_ssz_bytes(&value).unwrap(),
            handler(&squashed).as_ssz_bytes(&value).unwrap()
        );
    }

    #[test]
    fn omitted_members_leave_the_wire() {
        let schema = Schema::container(vec![
            SchemaField::new("a", Schema::Uint16),
            SchemaField::omitted("skipped", Schema::Uint64),
            SchemaField::new("b", Schema::Uint8),
        ]);
        let handler = handler(&schema);

        // Omitted members have no value slot at all.
        let value = Value::Container(vec![Value::Uint16(0x0102), Value::Uint8(9)]);
        let bytes = handler.as_ssz_bytes(&value).unwrap();

        assert_eq!(bytes, vec![0x02, 0x01, 9]);
        assert_eq!(handler.from_ssz_bytes(&bytes), Ok(value));
    }
}

mod relaxed_decode {
    use super::*;

    fn fuzz_schema() -> Schema {
        Schema::container(vec![
            SchemaField::new("a", Schema::Uint64),
            SchemaField::new("b", Schema::list(Schema::Uint8, 16)),
        ])
    }

    #[test]
    fn relaxed_decode_accepts_arbitrary_bytes_above_the_minimum() {
        let handler = handler(&fuzz_schema());

        let bytes = [0x11u8; 20];
        let value = handler.decode_relaxed(&bytes).unwrap();

        let members = match value {
            Value::Container(members) => members,
            other => panic!("expected container, got {:?}", other),
        };
        assert_eq!(members[0], Value::Uint64(0x1111111111111111));
        match &members[1] {
            Value::List(elements) => assert!(elements.len() <= 16),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn relaxed_decode_underbudget_input_fails() {
        let handler = handler(&fuzz_schema());

        // fuzz minimum: 8 bytes for the uint64, 4 for the list length.
        assert_eq!(handler.fuzz_min_len(), 12);
        assert_eq!(
            handler.decode_relaxed(&[0u8; 11]),
            Err(DecodeError::Underbudget {
                span: 11,
                required: 12
            })
        );
    }
}

mod storage_reuse {
    use super::*;

    #[test]
    fn decode_into_reuses_list_storage() {
        let handler = handler(&Schema::list(Schema::Uint16, 1024));

        let mut slot = handler
            .from_ssz_bytes(&handler.as_ssz_bytes(&u16_list(&[1, 2, 3, 4])).unwrap())
            .unwrap();
        let data_ptr = match &slot {
            Value::List(elements) => elements.as_ptr(),
            other => panic!("expected list, got {:?}", other),
        };

        let smaller = handler.as_ssz_bytes(&u16_list(&[9, 8])).unwrap();
        handler.decode_into(&smaller, &mut slot).unwrap();

        assert_eq!(slot, u16_list(&[9, 8]));
        match &slot {
            Value::List(elements) => assert_eq!(elements.as_ptr(), data_ptr),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn decode_into_replaces_a_mismatched_slot() {
        let handler = handler(&Schema::list(Schema::Uint16, 1024));

        let mut slot = Value::Uint8(7);
        handler
            .decode_into(&handler.as_ssz_bytes(&u16_list(&[5])).unwrap(), &mut slot)
            .unwrap();

        assert_eq!(slot, u16_list(&[5]));
    }
}

mod streaming {
    use super::*;
    use ssz_schema::{IoSource, SeekSource, SszReader};
    use std::io::Cursor;

    #[test]
    fn reads_from_an_io_source() {
        let bytes = vec![1u8, 0, 0, 0, 2, 0, 0, 0];
        let mut source = IoSource::new(Cursor::new(bytes));
        let mut reader = SszReader::new(&mut source);

        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 2);
    }

    #[test]
    fn seekable_sources_skip_without_draining() {
        let bytes = vec![0u8, 0, 0, 0, 0, 0, 9, 0];
        let mut source = SeekSource::new(Cursor::new(bytes));
        let mut reader = SszReader::new(&mut source);

        reader.skip(6).unwrap();
        assert_eq!(reader.read_u16().unwrap(), 9);
        assert_eq!(reader.index(), 8);
    }
}

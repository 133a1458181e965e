use bytes::Bytes;
use photon16_core::photon::write_i16_be;
use photon16_core::{
    walk, write_i32_be, ByteCursor, Decoder, Dictionary, Error, EventData, OperationResponse,
    ParamTable, StatsVisitor, Value, WireType,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

fn decode(bytes: &[u8]) -> Result<Value, Error> {
    Decoder::new().decode_slice(bytes)
}

/// A login-style response carrying a few parameters of mixed types
fn sample_response() -> Vec<u8> {
    let mut cursor = ByteCursor::new();
    cursor.write(&[WireType::OperationResponse.as_u8(), 230]);
    write_i16_be(0, &mut cursor);
    write_i16_be(2, &mut cursor);
    cursor.write(b"ok");

    write_i16_be(3, &mut cursor);

    cursor.write(&[1, b'i']);
    write_i32_be(0x00C0_FFEE, &mut cursor);

    cursor.write(&[2, b'a']);
    write_i16_be(2, &mut cursor);
    write_i16_be(3, &mut cursor);
    cursor.write(b"one");
    write_i16_be(3, &mut cursor);
    cursor.write(b"two");

    cursor.write(&[3, b'D', b'b', 0]);
    write_i16_be(1, &mut cursor);
    cursor.write(&[4, b'o', 1]);

    cursor.as_slice().to_vec()
}

#[test]
fn short_scenario() {
    assert_eq!(decode(&[0x6B, 0x00, 0x05]).unwrap(), Value::Short(5));
}

#[test]
fn empty_string_scenario() {
    assert_eq!(decode(&[0x73, 0x00, 0x00]).unwrap(), Value::String(String::new()));
}

#[test]
fn byte_array_of_two_scenario() {
    assert_eq!(
        decode(&[0x79, 0x00, 0x02, 0x62, 0x01, 0x02]).unwrap(),
        Value::Array(vec![Value::Byte(1), Value::Byte(2)])
    );
}

#[test]
fn typed_dictionary_scenario() {
    let bytes = [
        0x44, 0x73, 0x69, 0x00, 0x01, 0x00, 0x01, b'A', 0x00, 0x00, 0x00, 0x07,
    ];
    let expected: Dictionary = [(Value::from("A"), Value::Int(7))].into_iter().collect();
    assert_eq!(decode(&bytes).unwrap(), Value::Dictionary(expected));
}

#[test]
fn truncated_byte_array_scenario() {
    let mut bytes = vec![0x78, 0x00, 0x00, 0x00, 100];
    bytes.extend(std::iter::repeat(0x55).take(10));
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { needed: 100, .. }));
}

#[test]
fn integer_round_trip() {
    for value in [0, 1, -1, i32::MIN, i32::MAX, 0x1234_5678, -98_765] {
        let mut cursor = ByteCursor::new();
        cursor.write(&[WireType::Integer.as_u8()]);
        write_i32_be(value, &mut cursor);
        cursor.set_position(0).unwrap();
        assert_eq!(
            Decoder::new().decode_tagged(&mut cursor).unwrap(),
            Value::Int(value)
        );
    }
}

#[test]
fn reference_float_bytes() {
    // Encodings produced by a big-endian reference encoder.
    assert_eq!(
        decode(&[b'f', 0x40, 0x49, 0x0F, 0xDB]).unwrap(),
        Value::Float(std::f32::consts::PI)
    );
    assert_eq!(
        decode(&[b'd', 0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18]).unwrap(),
        Value::Double(std::f64::consts::PI)
    );
    assert_eq!(
        decode(&[b'l', 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]).unwrap(),
        Value::Long(-2)
    );
}

#[test]
fn declared_lengths_are_honoured() {
    for n in [0usize, 1, 7, 300] {
        let mut cursor = ByteCursor::new();
        cursor.write(&[b'x']);
        write_i32_be(n as i32, &mut cursor);
        cursor.write(&vec![0xAB; n]);
        let value = decode(cursor.as_slice()).unwrap();
        assert_eq!(value.as_bytes().map(<[u8]>::len), Some(n));

        let mut cursor = ByteCursor::new();
        cursor.write(&[b'y']);
        write_i16_be(n as i16, &mut cursor);
        cursor.write(&[b'b']);
        cursor.write(&vec![1; n]);
        let value = decode(cursor.as_slice()).unwrap();
        assert_eq!(value.as_array().map(<[Value]>::len), Some(n));
    }
}

#[test]
fn every_strict_prefix_fails() {
    let payload = sample_response();
    assert!(decode(&payload).is_ok());

    for end in 0..payload.len() {
        let result = decode(&payload[..end]);
        assert!(result.is_err(), "prefix of {} bytes decoded", end);
    }
}

#[test]
fn response_with_params() {
    let decoder = Decoder::new();
    let mut cursor = ByteCursor::from(sample_response());
    let response = decoder.decode_response(&mut cursor).unwrap();

    let mut nested = Dictionary::new();
    nested.insert(Value::Byte(4), Value::Bool(true));

    let mut params = ParamTable::new();
    params.insert(1, Value::Int(0x00C0_FFEE));
    params.insert(
        2,
        Value::StringArray(vec!["one".to_string(), "two".to_string()]),
    );
    params.insert(3, Value::Dictionary(nested));

    assert_eq!(
        response,
        OperationResponse {
            code: 230,
            return_code: 0,
            debug_message: "ok".into(),
            params,
        }
    );
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn nested_arrays_differ_from_flat_arrays() {
    // Shared tag 'x': each element is a length-prefixed byte array.
    let nested = decode(&[b'y', 0, 1, b'x', 0, 0, 0, 2, 7, 8]).unwrap();
    assert_eq!(
        nested,
        Value::Array(vec![Value::ByteArray(Bytes::from_static(&[7, 8]))])
    );

    // Shared tag 'b': each element is a single byte.
    let flat = decode(&[b'y', 0, 2, b'b', 7, 8]).unwrap();
    assert_eq!(flat, Value::Array(vec![Value::Byte(7), Value::Byte(8)]));
}

#[test]
fn huge_declared_count_is_rejected_early() {
    let bytes = [b'z', 0x7F, 0xFF, b'b', 1];
    assert!(matches!(
        decode(&bytes).unwrap_err(),
        Error::MalformedLength {
            offset: 1,
            length: 32767,
            ..
        }
    ));
}

#[test]
fn event_tree_statistics() {
    let bytes = [
        b'e', 1, 0, 2, //
        0, b'z', 0, 2, b'i', 0, 0, 0, 1, b'*', //
        1, b'x', 0, 0, 0, 3, 1, 2, 3,
    ];
    let value = decode(&bytes).unwrap();
    assert!(matches!(value, Value::EventData(EventData { code: 1, .. })));

    let mut stats = StatsVisitor::default();
    walk(&value, &mut stats);
    assert_eq!(stats.records, 1);
    assert_eq!(stats.arrays, 1);
    assert_eq!(stats.scalars, 2);
    assert_eq!(stats.byte_arrays, 1);
    assert_eq!(stats.byte_array_bytes, 3);
    assert_eq!(stats.max_depth, 2);
}

#[test]
fn concurrent_decoders_share_one_instance() {
    let decoder = Arc::new(Decoder::new());
    let payload = Arc::new(sample_response());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let decoder = Arc::clone(&decoder);
            let payload = Arc::clone(&payload);
            thread::spawn(move || {
                for _ in 0..200 {
                    let mut cursor = ByteCursor::from(payload.as_slice());
                    let response = decoder.decode_response(&mut cursor).unwrap();
                    assert_eq!(response.params.len(), 3);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(decoder.pool().outstanding(), 0);
}

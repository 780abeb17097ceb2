// Parser behaviour seen from a driver constructor's point of view
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sensekit_core::error::InitStringError;
use sensekit_core::init_string::{
    parse, Descriptor, Direction, GpioDescriptor, ParseResult, ResourceKind, UartPort,
};

/// Build a random but valid descriptor
fn random_descriptor(rng: &mut StdRng) -> Descriptor {
    match rng.gen_range(0..6) {
        0 => Descriptor::Gpio(GpioDescriptor {
            pin: rng.gen(),
            direction: if rng.gen_bool(0.5) {
                Direction::In
            } else {
                Direction::Out
            },
        }),
        1 => Descriptor::i2c(rng.gen(), rng.gen_range(0..=0x7F)),
        2 => Descriptor::spi(rng.gen(), rng.gen_range(0..4)),
        3 => {
            let port = if rng.gen_bool(0.5) {
                UartPort::Index(rng.gen_range(0..8))
            } else {
                random_uart_path(rng)
            };
            Descriptor::uart(port, [9600, 57600, 115200][rng.gen_range(0..3)])
        }
        4 => Descriptor::adc(rng.gen()),
        _ => {
            let duty = if rng.gen_bool(0.5) {
                Some(rng.gen_range(0.0..=1.0))
            } else {
                None
            };
            Descriptor::pwm(rng.gen(), duty)
        }
    }
}

/// Random device path, redrawn until it is one the parser reads back as a path
fn random_uart_path(rng: &mut StdRng) -> UartPort {
    const ALPHABET: &[u8] = b"abcXYZ019-_./: ";
    loop {
        let len = rng.gen_range(1..12);
        let path: String = (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        if let Some(port) = UartPort::path(path) {
            return port;
        }
    }
}

#[test]
fn test_reference_string() {
    let result = parse("gpio,25;i2c,0,0x3C").unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.descriptors()[0], Descriptor::gpio(25));
    assert_eq!(result.descriptors()[1], Descriptor::i2c(0, 60));
}

#[test]
fn test_reference_failures() {
    assert!(matches!(
        parse("gpio,-1"),
        Err(InitStringError::NegativeIndexNotAllowed { .. })
    ));
    match parse("foo,1") {
        Err(InitStringError::UnknownResourceKind { token, clause }) => {
            assert_eq!(token, "foo");
            assert_eq!(clause, 0);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        parse("gpio,1,2,3"),
        Err(InitStringError::ArityMismatch {
            kind: ResourceKind::Gpio,
            actual: 3,
            ..
        })
    ));
    assert!(matches!(
        parse("gpio,"),
        Err(InitStringError::EmptyToken { .. })
    ));
}

#[test]
fn test_n_clauses_give_n_descriptors_in_order() {
    let mut rng = StdRng::seed_from_u64(0x5e45e);
    for n in 0..20 {
        let expected: Vec<Descriptor> = (0..n).map(|_| random_descriptor(&mut rng)).collect();
        let raw = ParseResult::new(expected.clone()).to_string();
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.len(), n);
        assert_eq!(parsed.descriptors(), expected.as_slice(), "input: {}", raw);
    }
}

#[test]
fn test_descriptor_reserializes_to_equal_descriptor() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let descriptor = random_descriptor(&mut rng);
        let clause = descriptor.to_string();
        let reparsed = parse(&clause).unwrap();
        assert_eq!(reparsed.descriptors(), &[descriptor], "clause: {}", clause);
    }
}

#[test]
fn test_accepted_uart_paths_round_trip() {
    for path in ["/dev/ttyUSB0", "COM3", "/dev/serial/by-id/usb-FTDI 1", "tty-9", ".0"] {
        let descriptor = Descriptor::uart(UartPort::path(path).unwrap(), 9600);
        let reparsed = parse(&descriptor.to_string()).unwrap();
        assert_eq!(reparsed.descriptors(), &[descriptor]);
    }

    // These would come back as an index, a parse error or a trimmed path
    for path in ["0tty", "-dev", "", "a,b", "a;b", " x"] {
        assert!(UartPort::path(path).is_none(), "{:?} accepted", path);
    }
}

#[test]
fn test_parsing_is_idempotent() {
    let raw = "gpio,4,out;spi,0,1;uart,/dev/ttyAMA0,115200;pwm,12,0.125";
    assert_eq!(parse(raw).unwrap(), parse(raw).unwrap());

    let err = "gpio,4;i2c,1";
    assert_eq!(parse(err).unwrap_err(), parse(err).unwrap_err());
}

#[test]
fn test_concurrent_parsing() {
    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            std::thread::spawn(move || {
                let raw = format!("gpio,{};i2c,{},0x40", i, i);
                parse(&raw).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        assert_eq!(result.gpio(0).unwrap().pin, i as u32);
        assert_eq!(result.i2c(0).unwrap().bus, i as u32);
    }
}

#[test]
fn test_no_partial_results() {
    // The bad clause comes last; nothing before it is returned
    let result: Result<ParseResult, _> = "gpio,1;gpio,2;adc,x".parse();
    let err = result.unwrap_err();
    assert_eq!(err.clause_index(), 2);
}

#[test]
fn test_json_output() {
    let result = parse("gpio,25;i2c,0,0x3C").unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(
        json,
        r#"[{"kind":"gpio","pin":25,"direction":"in"},{"kind":"i2c","bus":0,"address":60}]"#
    );
}

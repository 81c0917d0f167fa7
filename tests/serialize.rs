use rescan::{
    Absolute, CountingScanner, Fsm, MultiScanner, Scan, Shifted,
    SimpleScanner, SlowScanner,
};

use crate::util::{accepted_after, run_to_state, strings_over};

fn glued() -> MultiScanner<Shifted> {
    let a: MultiScanner<Shifted> =
        MultiScanner::new(Fsm::literal("ab").surround()).unwrap();
    let b: MultiScanner<Shifted> =
        MultiScanner::new(Fsm::literal("bc").surround()).unwrap();
    MultiScanner::glue(&a, &b, 0).unwrap()
}

#[test]
fn multi_round_trip_preserves_behavior() {
    let sc = glued();
    let copy =
        MultiScanner::<Shifted>::from_bytes(&sc.to_bytes_native_endian())
            .unwrap();
    for input in strings_over(b"abc", 4) {
        assert_eq!(
            accepted_after(&sc, &input),
            accepted_after(&copy, &input),
            "input {:?}",
            input
        );
    }
}

#[test]
fn round_trips_are_bit_exact() {
    let sc = glued();
    let bytes = sc.to_bytes_native_endian();
    let copy = MultiScanner::<Shifted>::from_bytes(&bytes).unwrap();
    assert_eq!(bytes, copy.to_bytes_native_endian());
}

#[test]
fn absolute_round_trip() {
    let sc: MultiScanner<Absolute> =
        MultiScanner::new(Fsm::literal("ab").surround()).unwrap();
    let copy =
        MultiScanner::<Absolute>::from_bytes(&sc.to_bytes_native_endian())
            .unwrap();
    assert_eq!(accepted_after(&copy, b"xxabyy"), vec![0]);
}

#[test]
fn counting_round_trip() {
    let sc = CountingScanner::new(
        Fsm::atom_byte(b'a').plus(),
        Fsm::atom_byte(b'b').plus(),
    )
    .unwrap();
    let copy =
        CountingScanner::from_bytes(&sc.to_bytes_native_endian()).unwrap();
    for input in &[&b"aabaaabaabbba"[..], b"", b"bbb", b"aaaa"] {
        assert_eq!(
            run_to_state(&sc, input).result(0),
            run_to_state(&copy, input).result(0),
            "input {:?}",
            input
        );
    }
}

#[test]
fn slow_round_trip() {
    let sc = SlowScanner::new(Fsm::literal("ab").surround());
    let copy =
        SlowScanner::from_bytes(&sc.to_bytes_native_endian()).unwrap();
    for input in strings_over(b"ab", 4) {
        let a = run_to_state(&sc, &input);
        let b = run_to_state(&copy, &input);
        assert_eq!(sc.is_final(&a), copy.is_final(&b), "{:?}", input);
    }
}

#[test]
fn kind_tags_do_not_interchange() {
    let simple = SimpleScanner::new(Fsm::literal("ab")).unwrap();
    let counting = CountingScanner::new(
        Fsm::atom_byte(b'a').plus(),
        Fsm::atom_byte(b'b').plus(),
    )
    .unwrap();

    let simple_bytes = simple.to_bytes_native_endian();
    let counting_bytes = counting.to_bytes_native_endian();

    assert!(CountingScanner::from_bytes(&simple_bytes).is_err());
    assert!(SimpleScanner::from_bytes(&counting_bytes).is_err());
    assert!(MultiScanner::<Shifted>::from_bytes(&simple_bytes).is_err());
    assert!(SlowScanner::from_bytes(&counting_bytes).is_err());
}

#[test]
fn foreign_endianness_is_rejected() {
    let sc = glued();
    let foreign = if cfg!(target_endian = "little") {
        sc.to_bytes_big_endian()
    } else {
        sc.to_bytes_little_endian()
    };
    assert!(MultiScanner::<Shifted>::from_bytes(&foreign).is_err());
}

#[test]
fn corrupted_buffers_are_rejected() {
    let sc = glued();
    let good = sc.to_bytes_native_endian();

    assert!(MultiScanner::<Shifted>::from_bytes(&[]).is_err());
    assert!(
        MultiScanner::<Shifted>::from_bytes(&good[..good.len() / 2])
            .is_err()
    );

    let mut bad_magic = good.clone();
    bad_magic[0] ^= 0xFF;
    assert!(MultiScanner::<Shifted>::from_bytes(&bad_magic).is_err());
}

use super::*;

#[test]
fn fnv_split_writes_match_one_write() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"outer| cat");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"o");
    b.write_bytes(b"uter| cat");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_empty_input_is_offset_basis() {
    assert_eq!(Fnv1a64::new_default().finish(), Fnv1a64::OFFSET_BASIS);
}

#[test]
fn splitmix_is_deterministic_and_bounded() {
    let mut a = SplitMix64::new(123);
    let mut b = SplitMix64::new(123);
    for _ in 0..64 {
        let v = a.next_f64_01();
        assert_eq!(v.to_bits(), b.next_f64_01().to_bits());
        assert!((0.0..1.0).contains(&v));
    }
}

#[test]
fn splitmix_known_first_output() {
    // Reference value of SplitMix64 seeded with 0.
    let mut rng = SplitMix64::new(0);
    assert_eq!(rng.next_u64(), 0xE220_A839_7B1D_CDAF);
}

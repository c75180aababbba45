mod bench;

use bench::*;

#[test]
fn show_prints_all_twelve() {
    let bench = Bench::new();
    bench.session(b"C\r\x03");

    assert_eq!(
        bench.after_banner(),
        format!("C\r\nFUSES: {}\r\n\r\n>", "A5 ".repeat(12))
    );
    let world = bench.world.borrow();
    let reads = world.target.frames_with(OP_READ_FUSES);
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0][..5], [0xAA, 0x55, 0x61, 0x00, 0x00]);
    assert_eq!(reads[0].len(), 5 + 12);
}

#[test]
fn ones_set_every_fuse() {
    let bench = Bench::new();
    bench.session(b"F111111111111\r\x03");

    assert_eq!(bench.after_banner(), "F111111111111\r\nFUSES SET.\r\n\r\n>");
    let world = bench.world.borrow();
    assert_eq!(world.target.fuses, [0xFF; 12]);
    let mut expected = vec![0xAA, 0x55, 0xF1, 0x00, 0x00];
    expected.extend([0xFF; 12]);
    assert_eq!(world.target.frames_with(OP_WRITE_FUSES), [&expected]);
}

#[test]
fn keep_writes_back_current_values() {
    let bench = Bench::new();
    bench.world.borrow_mut().target.fuses = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
    bench.session(b"Fxxxxxxxxxxxx\r\x03");

    let world = bench.world.borrow();
    assert_eq!(world.target.fuses, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    assert_eq!(world.target.frames_with(OP_WRITE_FUSES).len(), 1);
}

#[test]
fn short_flag_string_keeps_the_tail() {
    let bench = Bench::new();
    bench.session(b"F10\r\x03");

    let mut expected = [0xA5; 12];
    expected[0] = 0xFF;
    expected[1] = 0x00;
    assert_eq!(bench.world.borrow().target.fuses, expected);
}

#[test]
fn bad_flag_touches_nothing() {
    let bench = Bench::new();
    bench.session(b"F12\r\x03");

    assert_eq!(
        bench.after_banner(),
        "F12\r\nVALID FLAGS ARE 1, 0, AND X. BAD FLAG AT 1\r\n>"
    );
    let world = bench.world.borrow();
    assert!(world.target.frames_with(OP_READ_FUSES).is_empty());
    assert!(world.target.frames_with(OP_WRITE_FUSES).is_empty());
}

#[test]
fn thirteen_flags_are_refused() {
    let bench = Bench::new();
    bench.session(b"F1111111111111\r\x03");

    assert_eq!(
        bench.after_banner(),
        "F1111111111111\r\nTOO MANY FUSES. MAX IS 12.\r\n>"
    );
    assert!(bench.world.borrow().target.frames_with(OP_WRITE_FUSES).is_empty());
}

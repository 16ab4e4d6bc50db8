//! Controller tests against emulated chips

#![allow(clippy::expect_used, clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use saveport_cart::emulated::{EmulatedChip, Operation};
use saveport_cart::{CartController, CartError, SaveChip};

#[test]
fn test_detect_flash_by_jedec_id() {
    let cases = [
        ([0xC2, 0x20, 0x10], SaveChip::Flash256K),
        ([0xC2, 0x20, 0x12], SaveChip::Flash256K),
        ([0x20, 0x20, 0x13], SaveChip::Flash512K),
        ([0x62, 0x20, 0x14], SaveChip::Flash1M),
        ([0xBF, 0x20, 0x17], SaveChip::Flash8M),
        // Unknown capacity byte from a known vendor falls back to 256K
        ([0x1C, 0x20, 0x42], SaveChip::Flash256K),
    ];

    for (jedec, expected) in cases {
        let mut controller = CartController::new(EmulatedChip::flash(expected, jedec));
        assert_eq!(controller.detect().expect("flash detects"), expected);
    }
}

#[test]
fn test_detect_absent_cartridge() {
    let mut controller = CartController::new(EmulatedChip::absent());
    assert_eq!(controller.detect(), Err(CartError::NoCartridge));
}

#[test]
fn test_detect_blank_chip_defaults_to_eeprom_64k() {
    // Fresh chips read back uniform 0xFF and cannot be wrap-probed
    let mut controller = CartController::new(EmulatedChip::eeprom(SaveChip::Eeprom64K));
    assert_eq!(controller.detect().expect("detects"), SaveChip::Eeprom64K);
}

#[test]
fn test_detect_eeprom_8k_by_address_wrap() {
    let chip = EmulatedChip::eeprom(SaveChip::Eeprom8K).with_probe_pattern();
    let mut controller = CartController::new(chip);
    assert_eq!(controller.detect().expect("detects"), SaveChip::Eeprom8K);
}

#[test]
fn test_detect_fram_32k_by_address_wrap() {
    let chip = EmulatedChip::eeprom(SaveChip::Fram32K).with_probe_pattern();
    let mut controller = CartController::new(chip);
    assert_eq!(controller.detect().expect("detects"), SaveChip::Fram32K);
}

#[test]
fn test_detect_eeprom_64k_with_content() {
    let chip = EmulatedChip::eeprom(SaveChip::Eeprom64K).with_probe_pattern();
    let mut controller = CartController::new(chip);
    assert_eq!(controller.detect().expect("detects"), SaveChip::Eeprom64K);
}

#[test]
fn test_detect_eeprom_128k_by_upper_bank() {
    let chip = EmulatedChip::eeprom(SaveChip::Eeprom128K).with_probe_pattern();
    let mut controller = CartController::new(chip);
    assert_eq!(controller.detect().expect("detects"), SaveChip::Eeprom128K);
}

#[test]
fn test_write_then_read_round_trips_with_padding() {
    for chip in [
        SaveChip::Eeprom512B,
        SaveChip::Eeprom8K,
        SaveChip::Eeprom64K,
        SaveChip::Eeprom128K,
        SaveChip::Fram32K,
    ] {
        let mut controller = CartController::new(EmulatedChip::eeprom(chip));
        let payload: Vec<u8> = (0..100u32).map(|i| (i % 251) as u8).collect();

        controller.write_full(chip, &payload).expect("write");
        let image = controller.read_full(chip).expect("read");

        assert_eq!(image.len(), chip.capacity(), "{chip}");
        assert_eq!(&image[..payload.len()], payload.as_slice(), "{chip}");
        assert!(
            image[payload.len()..].iter().all(|&b| b == 0xFF),
            "{chip}: padding must read back 0xFF"
        );
    }
}

#[test]
fn test_flash_write_erases_before_programming() {
    let chip = SaveChip::Flash256K;
    // Start from an all-zero array: without a prior erase, NOR
    // programming could never raise bits back to 0xFF
    let bus = EmulatedChip::flash(chip, [0xC2, 0x20, 0x12]).with_content(&vec![0u8; 262_144]);
    let mut controller = CartController::new(bus);

    let payload = vec![0xABu8; 100];
    controller.write_full(chip, &payload).expect("write");

    let image = controller.read_full(chip).expect("read");
    assert_eq!(&image[..100], payload.as_slice());
    assert!(image[100..].iter().all(|&b| b == 0xFF));

    // Every sector erase must precede the first page program
    let ops = controller.into_bus();
    let erases: Vec<usize> = ops
        .ops()
        .iter()
        .enumerate()
        .filter_map(|(i, op)| matches!(op, Operation::Erase { .. }).then_some(i))
        .collect();
    let first_program = ops
        .ops()
        .iter()
        .position(|op| matches!(op, Operation::Program { .. }))
        .expect("programs happened");

    assert_eq!(erases.len(), 262_144 / (64 * 1024));
    assert!(erases.iter().all(|&i| i < first_program));
}

#[test]
fn test_write_full_rejects_oversized_payload() {
    let chip = SaveChip::Eeprom512B;
    let mut controller = CartController::new(EmulatedChip::eeprom(chip));
    let result = controller.write_full(chip, &[0u8; 513]);
    assert_eq!(
        result,
        Err(CartError::BufferTooLarge {
            len: 513,
            capacity: 512
        })
    );
}

#[test]
fn test_unknown_chip_is_rejected() {
    let mut controller = CartController::new(EmulatedChip::eeprom(SaveChip::Eeprom8K));
    assert!(matches!(
        controller.read_full(SaveChip::Unknown),
        Err(CartError::UnsupportedChip(SaveChip::Unknown))
    ));
    assert!(matches!(
        controller.write_full(SaveChip::Unknown, &[]),
        Err(CartError::UnsupportedChip(SaveChip::Unknown))
    ));
}

#[test]
fn test_stuck_busy_write_times_out() {
    let chip = SaveChip::Eeprom8K;
    let bus = EmulatedChip::eeprom(chip).with_stuck_busy();
    let mut controller = CartController::new(bus);

    let result = controller.write_full(chip, &[1, 2, 3]);
    assert_eq!(
        result,
        Err(CartError::Timeout {
            op: "page write",
            ms: 50
        })
    );

    // The deadline was enforced through 1 ms polls
    let bus = controller.into_bus();
    assert_eq!(bus.waited_ms(), 50);
}

#[test]
fn test_reads_are_chunked() {
    let chip = SaveChip::Eeprom64K;
    let mut controller = CartController::new(EmulatedChip::eeprom(chip));
    controller.read_full(chip).expect("read");

    let bus = controller.into_bus();
    let reads: Vec<_> = bus
        .ops()
        .iter()
        .filter(|op| matches!(op, Operation::Read { .. }))
        .collect();
    assert_eq!(reads.len(), chip.capacity() / 256);
    assert!(
        bus.ops()
            .iter()
            .all(|op| !matches!(op, Operation::Read { len, .. } if *len > 256))
    );
}

#[test]
fn test_page_writes_respect_page_size() {
    let chip = SaveChip::Eeprom8K;
    let mut controller = CartController::new(EmulatedChip::eeprom(chip));
    controller.write_full(chip, &[0x55; 64]).expect("write");

    let bus = controller.into_bus();
    let programs: Vec<_> = bus
        .ops()
        .iter()
        .filter_map(|op| match op {
            Operation::Program { addr, len } => Some((*addr, *len)),
            _ => None,
        })
        .collect();

    assert_eq!(programs.len(), chip.capacity() / chip.page_size());
    for (i, (addr, len)) in programs.iter().enumerate() {
        assert_eq!(*addr as usize, i * chip.page_size());
        assert_eq!(*len, chip.page_size());
    }
}

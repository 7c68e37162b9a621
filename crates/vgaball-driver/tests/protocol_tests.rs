// SPDX-License-Identifier: AGPL-3.0-only

//! Raw request handling: request codes and 7-byte records in, shadow out

use vgaball_driver::protocol::{dispatch, handle_request, Command, WirePayload};
use vgaball_driver::{
    attach_simulated, AxisWidth, BallController, BallError, Color, PlatformResource, Position,
};

#[test]
fn write_then_read_background_through_requests() {
    let (ball, bus) =
        attach_simulated(&PlatformResource::new("proto", 0x9000_0000, 8), AxisWidth::Bits10)
            .unwrap();

    let mut buf = [0x12, 0x34, 0x56, 0xEE, 0xEE, 0xEE, 0xEE];
    handle_request(&ball, Command::WriteBackground.request_code(), &mut buf).unwrap();
    assert_eq!(bus.visible_background(), Color::new(0x12, 0x34, 0x56));
    // Position fields of a background write are ignored
    assert_eq!(ball.position(), Position::HOME);

    let mut out = [0u8; WirePayload::SIZE];
    handle_request(&ball, Command::ReadBackground.request_code(), &mut out).unwrap();
    assert_eq!(out, [0x12, 0x34, 0x56, 0, 0, 0, 0]);
}

#[test]
fn write_then_read_position_through_requests() {
    let (ball, _bus) =
        attach_simulated(&PlatformResource::new("proto", 0x9000_1000, 8), AxisWidth::Bits10)
            .unwrap();

    let mut buf = [0u8; WirePayload::SIZE];
    buf.copy_from_slice(WirePayload::from_position(Position::new(300, 10)).as_bytes());
    handle_request(&ball, Command::WritePosition.request_code(), &mut buf).unwrap();

    let mut out = [0xAAu8; 7];
    handle_request(&ball, Command::ReadPosition.request_code(), &mut out).unwrap();
    // Color fields of a position read pass through untouched
    assert_eq!(out, [0xAA, 0xAA, 0xAA, 0x2C, 0x01, 0x0A, 0x00]);
}

#[test]
fn out_of_range_request_is_reported() {
    let (ball, _bus) =
        attach_simulated(&PlatformResource::new("proto", 0x9000_2000, 8), AxisWidth::Bits10)
            .unwrap();

    let mut payload = WirePayload::from_position(Position::new(5, 2000));
    let err = dispatch(&ball, Command::WritePosition, &mut payload).unwrap_err();
    assert!(matches!(err, BallError::OutOfRange { axis: "y", value: 2000, .. }));
}

#[test]
fn malformed_requests_are_rejected_before_dispatch() {
    let ball = BallController::<vgaball_driver::SoftwareBus>::unattached(AxisWidth::Bits10);

    let mut buf = [0u8; 7];
    assert!(matches!(
        handle_request(&ball, 0xDEAD_BEEF, &mut buf),
        Err(BallError::InvalidCommand { code: 0xDEAD_BEEF })
    ));

    let mut short = [0u8; 3];
    assert!(matches!(
        handle_request(&ball, Command::ReadBackground.request_code(), &mut short),
        Err(BallError::InvalidPayload { len: 3, .. })
    ));
}

#[test]
fn never_attached_device_reads_defaults_and_refuses_writes() {
    let ball = BallController::<vgaball_driver::SoftwareBus>::unattached(AxisWidth::Bits10);

    let mut payload = WirePayload::default();
    dispatch(&ball, Command::ReadBackground, &mut payload).unwrap();
    dispatch(&ball, Command::ReadPosition, &mut payload).unwrap();
    assert_eq!(payload.color(), Color::BEIGE);
    assert_eq!(payload.position(), Position::HOME);

    assert!(matches!(
        dispatch(&ball, Command::WriteBackground, &mut payload),
        Err(BallError::NotAttached)
    ));
}

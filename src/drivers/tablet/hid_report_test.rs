use std::error::Error;

use packed_struct::{types::SizedInteger, PackedStruct};

use crate::drivers::tablet::hid_report::{
    HuionPenDataReport, PenDataReport, PointerReport, POINTER_TAP, STATE_IN_RANGE, STATE_TIP,
};

#[tokio::test]
async fn test_pen_data_report() -> Result<(), Box<dyn Error>> {
    let buf = [0x02, 0xa1, 0x64, 0x00, 0xc8, 0x00, 0x00, 0x20, 0x05, 0xfb];
    let report = PenDataReport::unpack(&buf)?;
    assert_eq!(report.report_id, 0x02);
    assert_eq!(report.state, STATE_IN_RANGE | STATE_TIP | 0x80);
    assert_eq!(report.x.to_primitive(), 100);
    assert_eq!(report.y.to_primitive(), 200);
    assert_eq!(report.pressure.to_primitive(), 8192);
    assert_eq!(report.tilt_x as i8, 5);
    assert_eq!(report.tilt_y as i8, -5);

    let default = PenDataReport::default();
    assert_eq!(default.pack()?, [0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    Ok(())
}

#[tokio::test]
async fn test_huion_pen_data_report() -> Result<(), Box<dyn Error>> {
    let buf = [
        0x08, 0x81, 0x45, 0x23, 0xc8, 0x00, 0x00, 0x04, 0x01, 0x00, 0xfd, 0x07,
    ];
    let report = HuionPenDataReport::unpack(&buf)?;
    assert_eq!(report.report_id, 0x08);
    assert_eq!(report.state, 0x81);
    assert_eq!(report.x.to_primitive(), 0x2345);
    assert_eq!(report.x_high, 0x01);
    assert_eq!(report.y.to_primitive(), 200);
    assert_eq!(report.pressure.to_primitive(), 1024);
    assert_eq!(report.tilt_x as i8, -3);
    assert_eq!(report.tilt_y as i8, 7);

    let default = HuionPenDataReport::default();
    assert_eq!(default.pack()?[..2], [0x08, 0x80]);

    Ok(())
}

#[tokio::test]
async fn test_pointer_report() -> Result<(), Box<dyn Error>> {
    let buf = [0x01, 0x01, 0x03, 0x00, 0x00, 0x02, 0xff];
    let report = PointerReport::unpack(&buf)?;
    assert_eq!(report.report_id, 0x01);
    assert_eq!(report.state & POINTER_TAP, POINTER_TAP);
    assert_eq!(report.x_positive, 3);
    assert_eq!(report.x_negative, 0);
    assert_eq!(report.y_positive, 0);
    assert_eq!(report.y_negative, 2);
    assert_eq!(report.wheel as i8, -1);

    let default = PointerReport::default();
    assert_eq!(default.pack()?, [0x01, 0, 0, 0, 0, 0, 0]);

    Ok(())
}

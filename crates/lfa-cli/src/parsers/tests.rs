use super::*;
use lfa_core::{ConcentrationLabel, PixelRect, Point};

// ========================================================================
// Region parsing
// ========================================================================

#[test]
fn test_parse_roi() {
    assert_eq!(
        parse_roi("10, 20,30,40").unwrap(),
        PixelRect::new(10, 20, 30, 40)
    );
    assert!(parse_roi("10,20,30").is_err());
    assert!(parse_roi("10,20,-3,40").is_err());
}

#[test]
fn test_parse_drag_any_direction() {
    let (start, end) = parse_drag("100,100:50.5,50").unwrap();
    assert_eq!(start, Point::new(100.0, 100.0));
    assert_eq!(end, Point::new(50.5, 50.0));

    assert!(parse_drag("100,100").is_err());
    assert!(parse_drag("100,100:abc,5").is_err());
}

#[test]
fn test_parse_display() {
    assert_eq!(parse_display("400x300").unwrap(), (400.0, 300.0));
    assert_eq!(parse_display("400X300").unwrap(), (400.0, 300.0));
    assert!(parse_display("0x300").is_err());
    assert!(parse_display("400").is_err());
}

// ========================================================================
// Classification parsing
// ========================================================================

#[test]
fn test_parse_scores() {
    assert_eq!(
        parse_scores("0.1, 0.2,0.3,0.4").unwrap(),
        vec![0.1, 0.2, 0.3, 0.4]
    );
    // count is validated later by the session
    assert_eq!(parse_scores("1,2").unwrap().len(), 2);
    assert!(parse_scores("0.1,x").is_err());
}

#[test]
fn test_parse_label() {
    assert_eq!(
        parse_label("10_nanogram").unwrap(),
        ConcentrationLabel::TenNanogram
    );
    let err = parse_label("5_Nanogram").unwrap_err();
    assert!(err.contains("1_Microgram"));
}

#[test]
fn test_parse_floor() {
    assert_eq!(parse_floor("0.6").unwrap(), 0.6);
    assert!(parse_floor("1.5").is_err());
    assert!(parse_floor("nope").is_err());
}

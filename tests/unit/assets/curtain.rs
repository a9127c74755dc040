use super::*;

const SAMPLE: &str = "3 2\nabc\nde\n1, 2, 3\n4,5,0\n";

#[test]
fn parse_reads_grid_and_frame_count() {
    let c = TextCurtain::parse(SAMPLE).unwrap();
    assert_eq!(c.rows(), 2);
    assert_eq!(c.frame_count(), 5);
}

#[test]
fn full_range_reveals_everything_but_the_last_encounter() {
    let c = TextCurtain::parse(SAMPLE).unwrap();
    // Encounter 5 == frame count sits outside the half-open range.
    assert_eq!(c.reveal(0.0, 1.0), vec!["abc".to_string(), "d  ".to_string()]);
}

#[test]
fn partial_range_blanks_outside_cells() {
    let c = TextCurtain::parse(SAMPLE).unwrap();
    // frames [2, 4): encounters 2 and 3.
    assert_eq!(c.reveal(0.4, 0.8), vec![" bc".to_string(), "   ".to_string()]);
}

#[test]
fn short_rows_are_padded() {
    let c = TextCurtain::parse("4 1\nab\n1,1,1,1\n").unwrap();
    assert_eq!(c.reveal(0.0, 2.0), vec!["ab  ".to_string()]);
}

#[test]
fn malformed_files_are_rejected() {
    assert!(TextCurtain::parse("").is_err());
    assert!(TextCurtain::parse("3\nabc\n").is_err());
    assert!(TextCurtain::parse("3 2\nabc\n").is_err());
    assert!(TextCurtain::parse("1 1\na\nx\n").is_err());
    assert!(TextCurtain::parse("1 1\na\n").is_err());
}

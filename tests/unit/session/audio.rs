use super::*;

#[test]
fn paused_clock_holds_its_position() {
    let mut clock = ClockChannel::paused();
    assert!(clock.is_paused());
    clock.set_position(12.5);
    assert_eq!(clock.position(), 12.5);
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert_eq!(clock.position(), 12.5);
}

#[test]
fn running_clock_advances_from_the_seek_point() {
    let mut clock = ClockChannel::new();
    clock.set_position(3.0);
    std::thread::sleep(std::time::Duration::from_millis(5));
    let p = clock.position();
    assert!(p > 3.0 && p < 10.0, "{p}");

    clock.pause();
    let frozen = clock.position();
    assert!(frozen >= p);
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert_eq!(clock.position(), frozen);

    clock.resume();
    assert!(!clock.is_paused());
    assert!(clock.position() >= frozen);
}

#[test]
fn negative_seeks_clamp_to_zero() {
    let mut clock = ClockChannel::paused();
    clock.set_position(-4.0);
    assert_eq!(clock.position(), 0.0);
}

#[test]
fn frame_clock_positions_are_frame_over_fps() {
    let mut clock = FrameClock::new(Fps::new(30, 1).unwrap());
    assert_eq!(clock.position(), 0.0);
    clock.step();
    clock.step();
    clock.step();
    assert_eq!(clock.frame(), 3);
    assert!((clock.position() - 0.1).abs() < 1e-12);

    clock.set_position(0.7);
    assert_eq!(clock.frame(), 21);

    clock.pause();
    clock.step();
    assert_eq!(clock.frame(), 21);
    clock.resume();
    clock.step();
    assert_eq!(clock.frame(), 22);
}

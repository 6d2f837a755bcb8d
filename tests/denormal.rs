//! Scoped denormal control.

use std::hint::black_box;

use laneflow::prelude::*;
use laneflow::{DenormalGuard, DenormalMode};

fn halve_smallest_normal() -> f32 {
    black_box(f32::MIN_POSITIVE) * black_box(0.5)
}

#[test_log::test]
fn guard_flushes_and_restores() {
    let before = DenormalGuard::current_mode();
    assert!(halve_smallest_normal() > 0.0 || before.contains(DenormalMode::FLUSH_TO_ZERO));

    {
        let _guard = DenormalGuard::new();
        if DenormalGuard::is_supported() {
            assert_eq!(halve_smallest_normal(), 0.0);
            let v = F32x4::splat(black_box(f32::MIN_POSITIVE)) * F32x4::splat(0.5);
            assert_eq!(v.to_array(), [0.0; 4]);
        }
    }

    assert_eq!(DenormalGuard::current_mode(), before);
}

#[test_log::test]
fn nested_guards_restore_outer_state() {
    let before = DenormalGuard::current_mode();
    let outer = DenormalGuard::with_mode(DenormalMode::FLUSH_TO_ZERO);
    let outer_mode = DenormalGuard::current_mode();
    {
        let _inner = DenormalGuard::new();
        assert_eq!(DenormalGuard::nesting_depth(), 2);
    }
    assert_eq!(DenormalGuard::current_mode(), outer_mode);
    drop(outer);
    assert_eq!(DenormalGuard::current_mode(), before);
}

#[test_log::test]
fn guards_are_per_thread() {
    let main_mode = DenormalGuard::current_mode();

    let depth_in_thread = std::thread::spawn(|| {
        let _guard = DenormalGuard::new();
        DenormalGuard::nesting_depth()
    })
    .join()
    .unwrap();

    assert_eq!(depth_in_thread, 1);
    assert_eq!(DenormalGuard::nesting_depth(), 0);
    assert_eq!(DenormalGuard::current_mode(), main_mode);
}

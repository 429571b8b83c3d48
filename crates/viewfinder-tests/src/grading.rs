//! LUT loading through to the CPU develop path.

use viewfinder_color::{develop_rgba8, Grading, LutLoader};
use viewfinder_core::FrameBuffer;

fn inverting_cube() -> String {
    let mut text = String::from("# invert\nTITLE \"invert\"\nLUT_3D_SIZE 2\n");
    for b in 0..2 {
        for g in 0..2 {
            for r in 0..2 {
                text.push_str(&format!("{} {} {}\n", 1 - r, 1 - g, 1 - b));
            }
        }
    }
    text
}

#[test]
fn lut_file_grades_developed_frame() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let path = tmp.path().join("invert.cube");
    std::fs::write(&path, inverting_cube()).unwrap();

    let grading: Grading = LutLoader::load(&path).into();
    assert_eq!(grading.lut().map(|l| l.size()), Some(2));

    let frame = FrameBuffer::test_pattern(16, 4);
    let graded = develop_rgba8(&frame, &grading).unwrap();
    let plain = develop_rgba8(&frame, &Grading::Identity).unwrap();

    // White bar turns black, black bar turns white.
    assert!(plain[0] > 250 && graded[0] < 5);
    let last = graded.len() - 4;
    assert!(plain[last] < 5 && graded[last] > 250);
}

#[test]
fn missing_lut_file_previews_ungraded() {
    let tmp = tempfile::tempdir().expect("failed to create tempdir");
    let grading: Grading = LutLoader::load(&tmp.path().join("absent.cube")).into();
    assert!(grading.lut().is_none());

    let frame = FrameBuffer::test_pattern(8, 2);
    assert_eq!(
        develop_rgba8(&frame, &grading).unwrap(),
        develop_rgba8(&frame, &Grading::Identity).unwrap()
    );
}

#[test]
fn truncated_lut_degrades_to_identity() {
    let cube = inverting_cube();
    let truncated: String = cube.lines().take(6).collect::<Vec<_>>().join("\n");
    assert!(Grading::from_cube(&truncated).lut().is_none());
}
